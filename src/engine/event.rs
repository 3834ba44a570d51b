//! Inbound events and typed callback tokens.
//!
//! Callback tokens are decoded from their opaque wire strings once, at the
//! transport boundary; the state machine only ever sees the typed form.
//! Malformed wire strings are rejected before they reach the engine.

use crate::catalog::Branch;

/// The identity attached to every inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    /// Numeric user identity; doubles as the chat id in private chats.
    pub id: i64,
    /// Display name, used when forwarding to the administrator.
    pub name: String,
}

impl Sender {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Events the conversation engine consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A free-text message.
    Text { sender: Sender, text: String },
    /// A keyboard choice. `callback_id` is acknowledged back to the
    /// transport; `message_id` identifies the message hosting the keyboard
    /// so the engine can edit it in place.
    Choice {
        sender: Sender,
        callback_id: String,
        message_id: i64,
        token: Callback,
    },
}

impl InboundEvent {
    pub fn sender(&self) -> &Sender {
        match self {
            Self::Text { sender, .. } | Self::Choice { sender, .. } => sender,
        }
    }
}

/// Top-level menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Clubs,
    Packages,
    Masterclasses,
    Support,
}

impl MenuItem {
    const ALL: [MenuItem; 4] = [
        MenuItem::Clubs,
        MenuItem::Packages,
        MenuItem::Masterclasses,
        MenuItem::Support,
    ];

    fn key(self) -> &'static str {
        match self {
            Self::Clubs => "clubs",
            Self::Packages => "packages",
            Self::Masterclasses => "masterclasses",
            Self::Support => "support",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }
}

/// Typed callback tokens round-tripped through rendered keyboards.
///
/// Index-carrying variants refer either to the snapshot held in the
/// sender's session (directions, clubs) or to a freshly listed collection
/// (masterclasses); stale indices take the not-found path in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    /// Enter a top-level flow.
    Menu(MenuItem),
    /// Branch choice in the club search.
    Branch(Branch),
    /// Direction choice, index into the session's direction list.
    Direction(usize),
    /// Club choice, index into the session's match snapshot.
    Club(usize),
    /// Toggle an activity, index into the static activity catalog.
    Activity(usize),
    /// Finish activity selection.
    ActivitiesDone,
    /// Show a masterclass card, index into the freshly listed catalog.
    Masterclass(usize),
    /// Start enrollment for a masterclass.
    Enroll(usize),
    /// Admin: start the add-masterclass flow.
    AdminAdd,
    /// Admin: list masterclasses for deletion.
    AdminDelete,
    /// Admin: pick a masterclass to delete.
    Delete(usize),
    /// Admin: confirm deletion of the given index.
    ConfirmDelete(usize),
    /// Return to the main menu, clearing the session.
    MainMenu,
}

impl Callback {
    /// Encode to the wire string placed in `callback_data`.
    pub fn encode(self) -> String {
        match self {
            Self::Menu(item) => format!("menu:{}", item.key()),
            Self::Branch(branch) => format!("branch:{}", branch.key()),
            Self::Direction(i) => format!("dir:{i}"),
            Self::Club(i) => format!("club:{i}"),
            Self::Activity(i) => format!("act:{i}"),
            Self::ActivitiesDone => "act:done".to_string(),
            Self::Masterclass(i) => format!("mc:{i}"),
            Self::Enroll(i) => format!("enroll:{i}"),
            Self::AdminAdd => "admin:add".to_string(),
            Self::AdminDelete => "admin:del".to_string(),
            Self::Delete(i) => format!("del:{i}"),
            Self::ConfirmDelete(i) => format!("del-yes:{i}"),
            Self::MainMenu => "home".to_string(),
        }
    }

    /// Decode a wire string. Returns `None` for anything malformed.
    pub fn decode(raw: &str) -> Option<Self> {
        if raw == "home" {
            return Some(Self::MainMenu);
        }
        let (kind, rest) = raw.split_once(':')?;
        match kind {
            "menu" => MenuItem::from_key(rest).map(Self::Menu),
            "branch" => Branch::from_key(rest).map(Self::Branch),
            "dir" => parse_index(rest).map(Self::Direction),
            "club" => parse_index(rest).map(Self::Club),
            "act" if rest == "done" => Some(Self::ActivitiesDone),
            "act" => parse_index(rest).map(Self::Activity),
            "mc" => parse_index(rest).map(Self::Masterclass),
            "enroll" => parse_index(rest).map(Self::Enroll),
            "admin" if rest == "add" => Some(Self::AdminAdd),
            "admin" if rest == "del" => Some(Self::AdminDelete),
            "del" => parse_index(rest).map(Self::Delete),
            "del-yes" => parse_index(rest).map(Self::ConfirmDelete),
            _ => None,
        }
    }
}

fn parse_index(raw: &str) -> Option<usize> {
    // Strict: no sign, no whitespace, no empty string.
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let tokens = [
            Callback::Menu(MenuItem::Clubs),
            Callback::Menu(MenuItem::Support),
            Callback::Branch(Branch::Online),
            Callback::Direction(2),
            Callback::Club(0),
            Callback::Activity(4),
            Callback::ActivitiesDone,
            Callback::Masterclass(7),
            Callback::Enroll(1),
            Callback::AdminAdd,
            Callback::AdminDelete,
            Callback::Delete(3),
            Callback::ConfirmDelete(3),
            Callback::MainMenu,
        ];
        for token in tokens {
            assert_eq!(Callback::decode(&token.encode()), Some(token));
        }
    }

    #[test]
    fn malformed_tokens_rejected() {
        for raw in [
            "", "menu", "menu:", "menu:bogus", "branch:moon", "dir:", "dir:x", "dir:-1",
            "dir: 1", "club:1.5", "act:", "admin:drop", "del-yes:", "addr_1", "home:1",
        ] {
            assert_eq!(Callback::decode(raw), None, "{raw:?} should not decode");
        }
    }

    #[test]
    fn done_is_not_an_activity_index() {
        assert_eq!(Callback::decode("act:done"), Some(Callback::ActivitiesDone));
        assert_eq!(Callback::decode("act:3"), Some(Callback::Activity(3)));
    }
}
