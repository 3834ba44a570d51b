//! Catalog data — clubs, masterclasses, and the priced-activity list.

pub mod activities;
pub mod club;
pub mod masterclass;
pub mod store;

pub use activities::{ACTIVITIES, Activity, MAX_PACKAGE_ACTIVITIES, MIN_PACKAGE_PEOPLE, PackageQuote, quote};
pub use club::{Branch, ClubRecord, distinct_directions, filter_clubs, parse_age_range};
pub use masterclass::MasterclassRecord;
pub use store::{CatalogStore, JsonCatalogStore, MemoryCatalogStore};
