//! Outbound actions and keyboard types.

use crate::engine::event::Callback;

/// One pressable choice on a rendered keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub token: Callback,
}

impl Choice {
    pub fn new(label: impl Into<String>, token: Callback) -> Self {
        Self {
            label: label.into(),
            token,
        }
    }
}

/// Rows of choices presented under a message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Choice>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row of choices.
    pub fn row(mut self, choices: Vec<Choice>) -> Self {
        self.rows.push(choices);
        self
    }

    /// Append choices one per row.
    pub fn column(mut self, choices: impl IntoIterator<Item = Choice>) -> Self {
        for choice in choices {
            self.rows.push(vec![choice]);
        }
        self
    }

    /// Append the "back to main menu" row.
    pub fn with_home(self) -> Self {
        self.row(vec![Choice::new("⬅️ В главное меню", Callback::MainMenu)])
    }
}

/// Actions the engine asks the messaging channel to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    /// Send a text message, optionally with a keyboard attached.
    SendText {
        chat_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    },
    /// Replace the keyboard of an already-sent message.
    EditChoices {
        chat_id: i64,
        message_id: i64,
        keyboard: Keyboard,
    },
    /// Acknowledge a choice event, optionally with an alert popup.
    Acknowledge {
        callback_id: String,
        alert: Option<String>,
    },
}

impl OutboundAction {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self::SendText {
            chat_id,
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(chat_id: i64, text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self::SendText {
            chat_id,
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }

    pub fn ack(callback_id: impl Into<String>) -> Self {
        Self::Acknowledge {
            callback_id: callback_id.into(),
            alert: None,
        }
    }

    pub fn alert(callback_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Acknowledge {
            callback_id: callback_id.into(),
            alert: Some(text.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_builders() {
        let kb = Keyboard::new()
            .row(vec![
                Choice::new("A", Callback::Direction(0)),
                Choice::new("B", Callback::Direction(1)),
            ])
            .column([Choice::new("C", Callback::ActivitiesDone)])
            .with_home();

        assert_eq!(kb.rows.len(), 3);
        assert_eq!(kb.rows[0].len(), 2);
        assert_eq!(kb.rows[2][0].token, Callback::MainMenu);
    }

    #[test]
    fn alert_carries_text() {
        let action = OutboundAction::alert("cb1", "Нельзя");
        assert_eq!(
            action,
            OutboundAction::Acknowledge {
                callback_id: "cb1".into(),
                alert: Some("Нельзя".into()),
            }
        );
    }
}
