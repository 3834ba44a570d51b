//! Conversation engine — one finite-state machine per active user.
//!
//! The engine consumes typed inbound events and returns the outbound
//! actions the messaging channel should perform. It owns the session
//! store and the catalog handle; the channel is driven by the caller, so
//! there is no process-wide state.

pub mod action;
pub mod clubs;
pub mod event;
pub mod masterclasses;
pub mod menu;
pub mod packages;
pub mod session;
pub mod support;

pub use action::{Choice, Keyboard, OutboundAction};
pub use event::{Callback, InboundEvent, MenuItem, Sender};
pub use session::{FlowState, SessionStore};

use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::config::EngineConfig;

pub struct ConversationEngine {
    store: Arc<dyn CatalogStore>,
    sessions: SessionStore,
    config: EngineConfig,
}

impl ConversationEngine {
    pub fn new(store: Arc<dyn CatalogStore>, config: EngineConfig) -> Self {
        Self {
            store,
            sessions: SessionStore::new(),
            config,
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.config.admin_id
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Drop sessions idle longer than the configured timeout.
    pub async fn prune_idle_sessions(&self) -> usize {
        let pruned = self
            .sessions
            .prune_idle(self.config.session_idle_timeout)
            .await;
        if pruned > 0 {
            tracing::info!(pruned, "Pruned idle sessions");
        }
        pruned
    }

    /// Route one inbound event through the sender's state machine and
    /// return the actions to perform. User-facing failures (bad input,
    /// stale choices, unavailable catalog) are folded into the returned
    /// actions; they never escape as errors.
    pub async fn handle_event(&self, event: InboundEvent) -> Vec<OutboundAction> {
        match event {
            InboundEvent::Text { sender, text } => self.handle_text(sender, text).await,
            InboundEvent::Choice {
                sender,
                callback_id,
                message_id,
                token,
            } => {
                self.handle_choice(sender, callback_id, message_id, token)
                    .await
            }
        }
    }

    async fn handle_text(&self, sender: Sender, text: String) -> Vec<OutboundAction> {
        let text = text.trim();
        tracing::debug!(user = sender.id, "Text message");

        // Global triggers work from any state and restart the conversation.
        if text == "/start" {
            self.sessions.clear(sender.id).await;
            return vec![OutboundAction::with_keyboard(
                sender.id,
                menu::GREETING,
                menu::main_menu(self.is_admin(sender.id)),
            )];
        }
        if text == "/admin" {
            return self.admin_panel(&sender).await;
        }
        if text == menu::SUPPORT_BUTTON {
            return self.start_support(&sender).await;
        }

        use session::{ClubSearchState, PackageState};
        match self.sessions.get(sender.id).await {
            FlowState::Idle => vec![OutboundAction::with_keyboard(
                sender.id,
                menu::MENU_PROMPT,
                menu::main_menu(self.is_admin(sender.id)),
            )],
            FlowState::ClubSearch(ClubSearchState::AwaitingAge) => {
                self.club_age_input(&sender, text).await
            }
            FlowState::ClubSearch(_) => vec![OutboundAction::text(sender.id, menu::USE_BUTTONS)],
            FlowState::Package(PackageState::AwaitingActivities { .. }) => {
                vec![OutboundAction::text(sender.id, menu::USE_BUTTONS)]
            }
            FlowState::Package(state) => self.package_text_input(&sender, state, text).await,
            FlowState::Enroll(state) => self.enroll_text_input(&sender, state, text).await,
            FlowState::Support => self.support_message(&sender, text).await,
            FlowState::AdminAdd(state) => self.admin_add_input(&sender, state, text).await,
            FlowState::AdminDelete(_) => vec![OutboundAction::text(sender.id, menu::USE_BUTTONS)],
        }
    }

    async fn handle_choice(
        &self,
        sender: Sender,
        callback_id: String,
        message_id: i64,
        token: Callback,
    ) -> Vec<OutboundAction> {
        tracing::debug!(user = sender.id, ?token, "Choice event");
        match token {
            Callback::MainMenu => {
                self.sessions.clear(sender.id).await;
                vec![
                    OutboundAction::ack(callback_id),
                    OutboundAction::with_keyboard(
                        sender.id,
                        menu::MENU_PROMPT,
                        menu::main_menu(self.is_admin(sender.id)),
                    ),
                ]
            }
            Callback::Menu(item) => {
                let flow = match item {
                    MenuItem::Clubs => self.start_club_search(&sender).await,
                    MenuItem::Packages => self.start_package(&sender).await,
                    MenuItem::Masterclasses => self.browse_masterclasses(&sender).await,
                    MenuItem::Support => self.start_support(&sender).await,
                };
                prepend_ack(callback_id, flow)
            }
            Callback::Branch(branch) => self.club_choose_branch(&sender, &callback_id, branch).await,
            Callback::Direction(i) => {
                self.club_choose_direction(&sender, &callback_id, i).await
            }
            Callback::Club(i) => self.club_choose_club(&sender, &callback_id, i).await,
            Callback::Activity(i) => {
                self.toggle_activity(&sender, &callback_id, message_id, i)
                    .await
            }
            Callback::ActivitiesDone => self.finish_activities(&sender, &callback_id).await,
            Callback::Masterclass(i) => self.show_masterclass(&sender, &callback_id, i).await,
            Callback::Enroll(i) => self.start_enroll(&sender, &callback_id, i).await,
            Callback::AdminAdd => self.admin_add_start(&sender, &callback_id).await,
            Callback::AdminDelete => self.admin_delete_start(&sender, &callback_id).await,
            Callback::Delete(i) => self.admin_delete_pick(&sender, &callback_id, i).await,
            Callback::ConfirmDelete(i) => {
                self.admin_delete_confirm(&sender, &callback_id, i).await
            }
        }
    }

    // ── Shared failure paths ────────────────────────────────────────

    /// A choice referencing state the session no longer holds: apologize,
    /// reset to idle, re-render the menu.
    pub(crate) async fn stale_choice(
        &self,
        sender: &Sender,
        callback_id: &str,
    ) -> Vec<OutboundAction> {
        tracing::debug!(user = sender.id, "Stale choice, resetting to menu");
        self.sessions.clear(sender.id).await;
        vec![
            OutboundAction::ack(callback_id),
            OutboundAction::with_keyboard(
                sender.id,
                menu::STALE_CHOICE,
                menu::main_menu(self.is_admin(sender.id)),
            ),
        ]
    }

    /// Catalog store failure: report a generic error, leave the session
    /// exactly where it was.
    pub(crate) fn store_failure(
        &self,
        sender: &Sender,
        err: &crate::error::StoreError,
    ) -> OutboundAction {
        tracing::error!(user = sender.id, error = %err, "Catalog store failure");
        OutboundAction::text(sender.id, menu::STORE_FAILURE)
    }
}

pub(crate) fn prepend_ack(
    callback_id: String,
    actions: Vec<OutboundAction>,
) -> Vec<OutboundAction> {
    let mut result = Vec::with_capacity(actions.len() + 1);
    result.push(OutboundAction::ack(callback_id));
    result.extend(actions);
    result
}
