//! Masterclass browsing, enrollment, and admin catalog maintenance.

use crate::catalog::MasterclassRecord;
use crate::engine::action::{Choice, Keyboard, OutboundAction};
use crate::engine::event::{Callback, Sender};
use crate::engine::session::{AdminAddState, AdminDeleteState, EnrollState, FlowState};
use crate::engine::{ConversationEngine, menu, prepend_ack};

const LIST_PROMPT: &str = "Наши мастер-классы:";
const LIST_EMPTY: &str = "Мастер-классов пока нет, загляните позже!";
const ENROLL_NAME_PROMPT: &str = "Записываю! Как вас зовут?";
const NAME_INVALID: &str = "Напишите, пожалуйста, ваше имя.";
const PHONE_PROMPT: &str = "И номер телефона для связи:";
const PHONE_INVALID: &str = "Напишите, пожалуйста, номер телефона.";
const ADMIN_PANEL: &str = "Вы в админ-панели. Что хотите сделать?";
const DELETE_PROMPT: &str = "Какой мастер-класс удалить?";
const DELETE_EMPTY: &str = "Удалять нечего — список пуст.";
const DELETE_RACED: &str = "Список уже изменился, удаление отменено.";

// ── Visitor side: browse and enroll ─────────────────────────────────

impl ConversationEngine {
    /// List the catalog. Browsing is stateless: the list and the cards
    /// are rendered from a fresh read every time.
    pub(crate) async fn browse_masterclasses(&self, sender: &Sender) -> Vec<OutboundAction> {
        self.sessions().clear(sender.id).await;
        let records = match self.store.list_masterclasses().await {
            Ok(records) => records,
            Err(e) => return vec![self.store_failure(sender, &e)],
        };
        if records.is_empty() {
            return vec![OutboundAction::with_keyboard(
                sender.id,
                LIST_EMPTY,
                menu::main_menu(self.is_admin(sender.id)),
            )];
        }

        let kb = Keyboard::new()
            .column(
                records
                    .iter()
                    .enumerate()
                    .map(|(i, r)| Choice::new(r.title.clone(), Callback::Masterclass(i))),
            )
            .with_home();
        vec![OutboundAction::with_keyboard(sender.id, LIST_PROMPT, kb)]
    }

    /// Detail card with an enroll button.
    pub(crate) async fn show_masterclass(
        &self,
        sender: &Sender,
        callback_id: &str,
        index: usize,
    ) -> Vec<OutboundAction> {
        let records = match self.store.list_masterclasses().await {
            Ok(records) => records,
            Err(e) => {
                return vec![
                    OutboundAction::ack(callback_id),
                    self.store_failure(sender, &e),
                ];
            }
        };
        let Some(record) = records.get(index) else {
            return self.stale_choice(sender, callback_id).await;
        };

        let kb = Keyboard::new()
            .row(vec![Choice::new("✍️ Записаться", Callback::Enroll(index))])
            .with_home();
        prepend_ack(
            callback_id.to_string(),
            vec![OutboundAction::with_keyboard(sender.id, record.card(), kb)],
        )
    }

    /// Enroll button: snapshot the chosen record into the session and
    /// start the name/phone sub-flow.
    pub(crate) async fn start_enroll(
        &self,
        sender: &Sender,
        callback_id: &str,
        index: usize,
    ) -> Vec<OutboundAction> {
        let records = match self.store.list_masterclasses().await {
            Ok(records) => records,
            Err(e) => {
                return vec![
                    OutboundAction::ack(callback_id),
                    self.store_failure(sender, &e),
                ];
            }
        };
        let Some(record) = records.get(index) else {
            return self.stale_choice(sender, callback_id).await;
        };

        self.sessions()
            .set(
                sender.id,
                FlowState::Enroll(EnrollState::AwaitingName {
                    masterclass: record.clone(),
                }),
            )
            .await;
        prepend_ack(
            callback_id.to_string(),
            vec![OutboundAction::text(sender.id, ENROLL_NAME_PROMPT)],
        )
    }

    /// Free-text steps of the enrollment flow.
    pub(crate) async fn enroll_text_input(
        &self,
        sender: &Sender,
        state: EnrollState,
        text: &str,
    ) -> Vec<OutboundAction> {
        match state {
            EnrollState::AwaitingName { masterclass } => {
                if text.is_empty() {
                    return vec![OutboundAction::text(sender.id, NAME_INVALID)];
                }
                self.sessions()
                    .set(
                        sender.id,
                        FlowState::Enroll(EnrollState::AwaitingPhone {
                            masterclass,
                            name: text.to_string(),
                        }),
                    )
                    .await;
                vec![OutboundAction::text(sender.id, PHONE_PROMPT)]
            }
            EnrollState::AwaitingPhone { masterclass, name } => {
                if text.is_empty() {
                    return vec![OutboundAction::text(sender.id, PHONE_INVALID)];
                }

                let admin_note = format!(
                    "Новая запись на мастер-класс «{}»!\nИмя: {name}\nТелефон: {text}\nОт: {} (id {})",
                    masterclass.title, sender.name, sender.id
                );
                let confirmation = format!(
                    "Спасибо, {name}! Вы записаны на «{}» ({}). Мы свяжемся с вами.",
                    masterclass.title, masterclass.date
                );

                tracing::info!(user = sender.id, title = %masterclass.title, "Enrollment completed");
                self.sessions().clear(sender.id).await;
                vec![
                    OutboundAction::text(self.config.admin_id, admin_note),
                    OutboundAction::with_keyboard(
                        sender.id,
                        confirmation,
                        menu::main_menu(self.is_admin(sender.id)),
                    ),
                ]
            }
        }
    }
}

// ── Admin side: panel, add, delete ──────────────────────────────────

impl ConversationEngine {
    /// `/admin` entry point.
    pub(crate) async fn admin_panel(&self, sender: &Sender) -> Vec<OutboundAction> {
        if !self.is_admin(sender.id) {
            tracing::warn!(user = sender.id, "Non-admin tried /admin");
            return vec![OutboundAction::text(sender.id, menu::NOT_ADMIN)];
        }
        let kb = Keyboard::new()
            .row(vec![Choice::new(
                "➕ Добавить мастер-класс",
                Callback::AdminAdd,
            )])
            .row(vec![Choice::new(
                "🗑 Удалить мастер-класс",
                Callback::AdminDelete,
            )])
            .with_home();
        vec![OutboundAction::with_keyboard(sender.id, ADMIN_PANEL, kb)]
    }

    pub(crate) async fn admin_add_start(
        &self,
        sender: &Sender,
        callback_id: &str,
    ) -> Vec<OutboundAction> {
        if !self.is_admin(sender.id) {
            tracing::warn!(user = sender.id, "Non-admin tried to add a masterclass");
            return vec![OutboundAction::alert(callback_id, menu::NOT_ADMIN)];
        }
        self.sessions()
            .set(sender.id, FlowState::AdminAdd(AdminAddState::AwaitingTitle))
            .await;
        prepend_ack(
            callback_id.to_string(),
            vec![OutboundAction::text(
                sender.id,
                "Введите название мастер-класса:",
            )],
        )
    }

    /// Sequential single-field capture for the new masterclass record.
    /// Empty input re-prompts the same field.
    pub(crate) async fn admin_add_input(
        &self,
        sender: &Sender,
        state: AdminAddState,
        text: &str,
    ) -> Vec<OutboundAction> {
        if text.is_empty() {
            return vec![OutboundAction::text(sender.id, "Поле не может быть пустым.")];
        }
        let text = text.to_string();

        let (next, prompt) = match state {
            AdminAddState::AwaitingTitle => (
                AdminAddState::AwaitingDescription { title: text },
                "Описание:",
            ),
            AdminAddState::AwaitingDescription { title } => (
                AdminAddState::AwaitingDate {
                    title,
                    description: text,
                },
                "Дата проведения:",
            ),
            AdminAddState::AwaitingDate { title, description } => (
                AdminAddState::AwaitingPrice {
                    title,
                    description,
                    date: text,
                },
                "Стоимость:",
            ),
            AdminAddState::AwaitingPrice {
                title,
                description,
                date,
            } => (
                AdminAddState::AwaitingTeacher {
                    title,
                    description,
                    date,
                    price: text,
                },
                "Ведущий:",
            ),
            AdminAddState::AwaitingTeacher {
                title,
                description,
                date,
                price,
            } => (
                AdminAddState::AwaitingLink {
                    title,
                    description,
                    date,
                    price,
                    teacher: text,
                },
                "Ссылка:",
            ),
            AdminAddState::AwaitingLink {
                title,
                description,
                date,
                price,
                teacher,
            } => {
                let record = MasterclassRecord {
                    title,
                    description,
                    date,
                    price,
                    teacher,
                    link: text,
                };
                return self.admin_add_commit(sender, record).await;
            }
        };

        self.sessions()
            .set(sender.id, FlowState::AdminAdd(next))
            .await;
        vec![OutboundAction::text(sender.id, prompt)]
    }

    async fn admin_add_commit(
        &self,
        sender: &Sender,
        record: MasterclassRecord,
    ) -> Vec<OutboundAction> {
        let title = record.title.clone();
        if let Err(e) = self.store.append_masterclass(record).await {
            // Session stays on the last step so the admin can resend the
            // link and retry the append.
            return vec![self.store_failure(sender, &e)];
        }

        tracing::info!(user = sender.id, %title, "Masterclass added");
        self.sessions().clear(sender.id).await;
        vec![OutboundAction::with_keyboard(
            sender.id,
            format!("Мастер-класс «{title}» добавлен."),
            menu::main_menu(true),
        )]
    }

    pub(crate) async fn admin_delete_start(
        &self,
        sender: &Sender,
        callback_id: &str,
    ) -> Vec<OutboundAction> {
        if !self.is_admin(sender.id) {
            tracing::warn!(user = sender.id, "Non-admin tried to delete a masterclass");
            return vec![OutboundAction::alert(callback_id, menu::NOT_ADMIN)];
        }
        let records = match self.store.list_masterclasses().await {
            Ok(records) => records,
            Err(e) => {
                return vec![
                    OutboundAction::ack(callback_id),
                    self.store_failure(sender, &e),
                ];
            }
        };
        if records.is_empty() {
            self.sessions().clear(sender.id).await;
            return prepend_ack(
                callback_id.to_string(),
                vec![OutboundAction::with_keyboard(
                    sender.id,
                    DELETE_EMPTY,
                    menu::main_menu(true),
                )],
            );
        }

        let kb = Keyboard::new()
            .column(records.iter().enumerate().map(|(i, r)| {
                Choice::new(format!("{}. {}", i + 1, r.title), Callback::Delete(i))
            }))
            .with_home();
        self.sessions()
            .set(
                sender.id,
                FlowState::AdminDelete(AdminDeleteState::AwaitingChoice),
            )
            .await;
        prepend_ack(
            callback_id.to_string(),
            vec![OutboundAction::with_keyboard(sender.id, DELETE_PROMPT, kb)],
        )
    }

    pub(crate) async fn admin_delete_pick(
        &self,
        sender: &Sender,
        callback_id: &str,
        index: usize,
    ) -> Vec<OutboundAction> {
        if !self.is_admin(sender.id) {
            return vec![OutboundAction::alert(callback_id, menu::NOT_ADMIN)];
        }
        let FlowState::AdminDelete(AdminDeleteState::AwaitingChoice) =
            self.sessions().get(sender.id).await
        else {
            return self.stale_choice(sender, callback_id).await;
        };
        let records = match self.store.list_masterclasses().await {
            Ok(records) => records,
            Err(e) => {
                return vec![
                    OutboundAction::ack(callback_id),
                    self.store_failure(sender, &e),
                ];
            }
        };
        let Some(record) = records.get(index) else {
            return self.stale_choice(sender, callback_id).await;
        };

        let kb = Keyboard::new()
            .row(vec![Choice::new(
                "Да, удалить",
                Callback::ConfirmDelete(index),
            )])
            .row(vec![Choice::new("Отмена", Callback::MainMenu)]);
        self.sessions()
            .set(
                sender.id,
                FlowState::AdminDelete(AdminDeleteState::AwaitingConfirm {
                    index,
                    title: record.title.clone(),
                }),
            )
            .await;
        prepend_ack(
            callback_id.to_string(),
            vec![OutboundAction::with_keyboard(
                sender.id,
                format!("Удалить «{}»?", record.title),
                kb,
            )],
        )
    }

    pub(crate) async fn admin_delete_confirm(
        &self,
        sender: &Sender,
        callback_id: &str,
        index: usize,
    ) -> Vec<OutboundAction> {
        if !self.is_admin(sender.id) {
            return vec![OutboundAction::alert(callback_id, menu::NOT_ADMIN)];
        }
        let FlowState::AdminDelete(AdminDeleteState::AwaitingConfirm {
            index: confirmed,
            title,
        }) = self.sessions().get(sender.id).await
        else {
            return self.stale_choice(sender, callback_id).await;
        };
        if confirmed != index {
            return self.stale_choice(sender, callback_id).await;
        }

        // Re-list and verify the index still names the record the admin
        // confirmed; a concurrent write may have shifted the collection.
        let records = match self.store.list_masterclasses().await {
            Ok(records) => records,
            Err(e) => {
                return vec![
                    OutboundAction::ack(callback_id),
                    self.store_failure(sender, &e),
                ];
            }
        };
        if records.get(index).map(|r| r.title.as_str()) != Some(title.as_str()) {
            self.sessions().clear(sender.id).await;
            return prepend_ack(
                callback_id.to_string(),
                vec![OutboundAction::with_keyboard(
                    sender.id,
                    DELETE_RACED,
                    menu::main_menu(true),
                )],
            );
        }

        match self.store.delete_masterclass(index).await {
            Ok(removed) => {
                tracing::info!(user = sender.id, title = %removed.title, "Masterclass deleted");
                self.sessions().clear(sender.id).await;
                prepend_ack(
                    callback_id.to_string(),
                    vec![OutboundAction::with_keyboard(
                        sender.id,
                        format!("Мастер-класс «{}» удалён.", removed.title),
                        menu::main_menu(true),
                    )],
                )
            }
            Err(crate::error::StoreError::IndexOutOfRange { .. }) => {
                // Another write shrank the collection between confirm
                // render and press.
                self.sessions().clear(sender.id).await;
                prepend_ack(
                    callback_id.to_string(),
                    vec![OutboundAction::with_keyboard(
                        sender.id,
                        DELETE_RACED,
                        menu::main_menu(true),
                    )],
                )
            }
            Err(e) => vec![
                OutboundAction::ack(callback_id),
                self.store_failure(sender, &e),
            ],
        }
    }
}
