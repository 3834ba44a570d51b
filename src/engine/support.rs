//! Support flow: single free-text capture forwarded to the administrator.

use crate::engine::action::OutboundAction;
use crate::engine::event::Sender;
use crate::engine::session::FlowState;
use crate::engine::{ConversationEngine, menu};

const PROMPT: &str = "Напишите ваше сообщение — я передам его в поддержку.";
const CONFIRMATION: &str = "Ваш запрос отправлен в поддержку. Мы скоро с вами свяжемся.";

impl ConversationEngine {
    pub(crate) async fn start_support(&self, sender: &Sender) -> Vec<OutboundAction> {
        self.sessions().set(sender.id, FlowState::Support).await;
        vec![OutboundAction::text(sender.id, PROMPT)]
    }

    /// Forward the message verbatim with the sender's identity, confirm,
    /// clear the session.
    pub(crate) async fn support_message(&self, sender: &Sender, text: &str) -> Vec<OutboundAction> {
        let forwarded = format!(
            "Сообщение в поддержку от {} (id {}):\n{text}",
            sender.name, sender.id
        );
        tracing::info!(user = sender.id, "Support message forwarded");
        self.sessions().clear(sender.id).await;
        vec![
            OutboundAction::text(self.config.admin_id, forwarded),
            OutboundAction::with_keyboard(
                sender.id,
                CONFIRMATION,
                menu::main_menu(self.is_admin(sender.id)),
            ),
        ]
    }
}
