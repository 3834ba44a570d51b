//! Masterclass catalog records.

use serde::{Deserialize, Serialize};

/// A masterclass entry. The collection is mutated only through the admin
/// flows and persisted by the catalog store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterclassRecord {
    pub title: String,
    pub description: String,
    /// Free-form date string as entered by the administrator.
    pub date: String,
    /// Free-form price string as entered by the administrator.
    pub price: String,
    pub teacher: String,
    pub link: String,
}

impl MasterclassRecord {
    /// Render the user-facing detail card.
    pub fn card(&self) -> String {
        format!(
            "«{}»\n{}\n\nДата: {}\nСтоимость: {}\nВедущий: {}\nСсылка: {}",
            self.title, self.description, self.date, self.price, self.teacher, self.link
        )
    }
}
