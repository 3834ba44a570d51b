//! Main menu rendering and shared user-facing texts.

use crate::engine::action::{Choice, Keyboard};
use crate::engine::event::{Callback, MenuItem};

pub const GREETING: &str = "Привет! Я Бот Виктор! Чем могу помочь?";
pub const MENU_PROMPT: &str = "Выберите, что вас интересует:";
/// Label of the legacy reply-keyboard support button; still accepted as a
/// plain-text trigger.
pub const SUPPORT_BUTTON: &str = "Написать в поддержку";
pub const NOT_ADMIN: &str = "Вы не администратор!";
pub const STALE_CHOICE: &str = "Эта кнопка уже неактуальна. Возвращаю в главное меню.";
pub const STORE_FAILURE: &str = "Что-то пошло не так. Попробуйте ещё раз чуть позже.";
pub const USE_BUTTONS: &str = "Пожалуйста, воспользуйтесь кнопками под сообщением.";

/// The top-level option list, scoped by identity: administrators get the
/// catalog-maintenance row.
pub fn main_menu(is_admin: bool) -> Keyboard {
    let mut kb = Keyboard::new()
        .row(vec![Choice::new(
            "🎨 Подобрать кружок",
            Callback::Menu(MenuItem::Clubs),
        )])
        .row(vec![Choice::new(
            "🎒 Пакетный тур",
            Callback::Menu(MenuItem::Packages),
        )])
        .row(vec![Choice::new(
            "🏺 Мастер-классы",
            Callback::Menu(MenuItem::Masterclasses),
        )])
        .row(vec![Choice::new(
            "💬 Написать в поддержку",
            Callback::Menu(MenuItem::Support),
        )]);
    if is_admin {
        kb = kb.row(vec![
            Choice::new("➕ Мастер-класс", Callback::AdminAdd),
            Choice::new("🗑 Мастер-класс", Callback::AdminDelete),
        ]);
    }
    kb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visitor_menu_has_no_admin_row() {
        assert_eq!(main_menu(false).rows.len(), 4);
    }

    #[test]
    fn admin_menu_has_admin_row() {
        let kb = main_menu(true);
        assert_eq!(kb.rows.len(), 5);
        assert_eq!(kb.rows[4][0].token, Callback::AdminAdd);
        assert_eq!(kb.rows[4][1].token, Callback::AdminDelete);
    }
}
