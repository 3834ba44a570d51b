//! Package-booking flow: group size → activity selection → contact → quote.

use crate::catalog::{ACTIVITIES, MAX_PACKAGE_ACTIVITIES, MIN_PACKAGE_PEOPLE, quote};
use crate::engine::action::{Choice, Keyboard, OutboundAction};
use crate::engine::event::{Callback, Sender};
use crate::engine::session::{FlowState, PackageState};
use crate::engine::{ConversationEngine, menu, prepend_ack};

const PEOPLE_PROMPT: &str =
    "Собираем пакетный тур! Группа — от 5 человек. Сколько человек будет?";
const PEOPLE_INVALID: &str =
    "Нужно целое число не меньше 5. Сколько человек будет в группе?";
const ACTIVITIES_PROMPT: &str =
    "Выберите от 1 до 3 активностей. Чем больше активностей, тем ниже цена каждой.";
const LIMIT_ALERT: &str = "Можно выбрать не более 3 активностей.";
const EMPTY_ALERT: &str = "Выберите хотя бы одну активность.";
const NAME_PROMPT: &str = "Почти готово! Как вас зовут?";
const NAME_INVALID: &str = "Напишите, пожалуйста, ваше имя.";
const PHONE_PROMPT: &str = "И последний шаг — номер телефона для связи:";
const PHONE_INVALID: &str = "Напишите, пожалуйста, номер телефона.";

impl ConversationEngine {
    pub(crate) async fn start_package(&self, sender: &Sender) -> Vec<OutboundAction> {
        self.sessions()
            .set(sender.id, FlowState::Package(PackageState::AwaitingPeopleCount))
            .await;
        vec![OutboundAction::text(sender.id, PEOPLE_PROMPT)]
    }

    /// Free-text steps of the package flow (people count, name, phone).
    pub(crate) async fn package_text_input(
        &self,
        sender: &Sender,
        state: PackageState,
        text: &str,
    ) -> Vec<OutboundAction> {
        match state {
            PackageState::AwaitingPeopleCount => {
                let people = match text.parse::<u32>() {
                    Ok(n) if n >= MIN_PACKAGE_PEOPLE => n,
                    _ => return vec![OutboundAction::text(sender.id, PEOPLE_INVALID)],
                };
                self.sessions()
                    .set(
                        sender.id,
                        FlowState::Package(PackageState::AwaitingActivities {
                            people,
                            selected: Vec::new(),
                        }),
                    )
                    .await;
                vec![OutboundAction::with_keyboard(
                    sender.id,
                    ACTIVITIES_PROMPT,
                    activities_keyboard(&[]),
                )]
            }
            // Keyboard-driven step; reached only via choice events.
            PackageState::AwaitingActivities { .. } => {
                vec![OutboundAction::text(sender.id, menu::USE_BUTTONS)]
            }
            PackageState::AwaitingName { people, selected } => {
                if text.is_empty() {
                    return vec![OutboundAction::text(sender.id, NAME_INVALID)];
                }
                self.sessions()
                    .set(
                        sender.id,
                        FlowState::Package(PackageState::AwaitingPhone {
                            people,
                            selected,
                            name: text.to_string(),
                        }),
                    )
                    .await;
                vec![OutboundAction::text(sender.id, PHONE_PROMPT)]
            }
            PackageState::AwaitingPhone {
                people,
                selected,
                name,
            } => {
                if text.is_empty() {
                    return vec![OutboundAction::text(sender.id, PHONE_INVALID)];
                }
                self.finish_package(sender, people, &selected, &name, text)
                    .await
            }
        }
    }

    /// Toggle one activity: add if absent (and under the limit), remove if
    /// present. A rejected fourth selection leaves the state untouched.
    pub(crate) async fn toggle_activity(
        &self,
        sender: &Sender,
        callback_id: &str,
        message_id: i64,
        index: usize,
    ) -> Vec<OutboundAction> {
        let FlowState::Package(PackageState::AwaitingActivities {
            people,
            mut selected,
        }) = self.sessions().get(sender.id).await
        else {
            return self.stale_choice(sender, callback_id).await;
        };
        if index >= ACTIVITIES.len() {
            return self.stale_choice(sender, callback_id).await;
        }

        if let Some(pos) = selected.iter().position(|&i| i == index) {
            selected.remove(pos);
        } else if selected.len() < MAX_PACKAGE_ACTIVITIES {
            selected.push(index);
        } else {
            return vec![OutboundAction::alert(callback_id, LIMIT_ALERT)];
        }

        let kb = activities_keyboard(&selected);
        self.sessions()
            .set(
                sender.id,
                FlowState::Package(PackageState::AwaitingActivities { people, selected }),
            )
            .await;
        vec![
            OutboundAction::ack(callback_id),
            OutboundAction::EditChoices {
                chat_id: sender.id,
                message_id,
                keyboard: kb,
            },
        ]
    }

    /// "Done" on the activity keyboard: requires 1..=3 selected, otherwise
    /// stays put with an inline error and the selection preserved.
    pub(crate) async fn finish_activities(
        &self,
        sender: &Sender,
        callback_id: &str,
    ) -> Vec<OutboundAction> {
        let FlowState::Package(PackageState::AwaitingActivities { people, selected }) =
            self.sessions().get(sender.id).await
        else {
            return self.stale_choice(sender, callback_id).await;
        };
        if selected.is_empty() {
            return vec![OutboundAction::alert(callback_id, EMPTY_ALERT)];
        }

        self.sessions()
            .set(
                sender.id,
                FlowState::Package(PackageState::AwaitingName { people, selected }),
            )
            .await;
        prepend_ack(
            callback_id.to_string(),
            vec![OutboundAction::text(sender.id, NAME_PROMPT)],
        )
    }

    /// Terminal step: price the package, notify the administrator, confirm
    /// to the user, clear the session.
    async fn finish_package(
        &self,
        sender: &Sender,
        people: u32,
        selected: &[usize],
        name: &str,
        phone: &str,
    ) -> Vec<OutboundAction> {
        let price = quote(selected, people);
        let activities = activity_names(selected);

        let admin_note = format!(
            "Новая заявка на пакетный тур!\nИмя: {name}\nТелефон: {phone}\nОт: {} (id {})\n\
             Человек: {people}\nАктивности: {activities}\n\
             На человека: {} ₽\nИтого: {} ₽",
            sender.name, sender.id, price.per_person, price.total
        );
        let confirmation = format!(
            "Спасибо, {name}! Заявка принята.\nАктивности: {activities}\nЧеловек: {people}\n\
             На человека: {} ₽\nИтого: {} ₽\nМы свяжемся с вами для подтверждения.",
            price.per_person, price.total
        );

        tracing::info!(user = sender.id, people, ?selected, "Package booking completed");
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

/// The activity keyboard: selected entries get a check mark, plus a
/// "done" row. Re-rendered in place after every toggle.
fn activities_keyboard(selected: &[usize]) -> Keyboard {
    let mut kb = Keyboard::new();
    for (i, activity) in ACTIVITIES.iter().enumerate() {
        let label = if selected.contains(&i) {
            format!("✅ {}", activity.name)
        } else {
            activity.name.to_string()
        };
        kb = kb.row(vec![Choice::new(label, Callback::Activity(i))]);
    }
    kb.row(vec![Choice::new("🟢 Готово", Callback::ActivitiesDone)])
        .with_home()
}

fn activity_names(selected: &[usize]) -> String {
    selected
        .iter()
        .filter_map(|&i| ACTIVITIES.get(i))
        .map(|a| a.name)
        .collect::<Vec<_>>()
        .join(", ")
}
