//! Club catalog records, age-range parsing, and branch filtering.

use serde::{Deserialize, Serialize};

/// Upper bound substituted for open-ended age ranges like `"7+"`.
const OPEN_ENDED_MAX_AGE: u32 = 99;

/// A single row of the read-only club catalog.
///
/// The age range stays a raw string and is parsed lazily at filter time,
/// because the upstream catalog is hand-maintained and rows with prose in
/// the age column do occur.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubRecord {
    pub direction: String,
    pub name: String,
    /// Raw age range as entered in the catalog: `"6-8"`, `"7+"`, `"5"`.
    pub age_range: String,
    /// Street address; blank for online clubs.
    pub address: String,
    pub teacher: String,
    pub link: String,
}

impl ClubRecord {
    /// Whether this club accepts a child of the given age.
    ///
    /// Records whose age range cannot be parsed are excluded.
    pub fn accepts_age(&self, age: u32) -> bool {
        match parse_age_range(&self.age_range) {
            Some((min, max)) => (min..=max).contains(&age),
            None => false,
        }
    }

    /// Whether this club runs at the given branch.
    pub fn at_branch(&self, branch: Branch) -> bool {
        match branch.address_keyword() {
            Some(keyword) => self.address.contains(keyword),
            // Online clubs have no street address.
            None => self.address.trim().is_empty(),
        }
    }
}

/// Parse an age-range string into inclusive `(min, max)` bounds.
///
/// Supported shapes: `"N-M"`, `"N+"` (open-ended, capped at 99) and bare
/// `"N"`. Anything else — including prose like `"от 6 до 8"` — yields
/// `None` rather than an error.
pub fn parse_age_range(raw: &str) -> Option<(u32, u32)> {
    let raw = raw.trim();
    if let Some((lo, hi)) = raw.split_once('-') {
        let min = lo.trim().parse().ok()?;
        let max = hi.trim().parse().ok()?;
        return Some((min, max));
    }
    if let Some(lo) = raw.strip_suffix('+') {
        let min = lo.trim().parse().ok()?;
        return Some((min, OPEN_ENDED_MAX_AGE));
    }
    raw.parse().ok().map(|n| (n, n))
}

/// The center's branches. A club belongs to a branch when its address
/// contains the branch keyword; online clubs have a blank address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Sadovaya,
    Parkovaya,
    Online,
}

impl Branch {
    pub const ALL: [Branch; 3] = [Branch::Sadovaya, Branch::Parkovaya, Branch::Online];

    /// Stable wire key, round-tripped through keyboard callbacks.
    pub fn key(self) -> &'static str {
        match self {
            Self::Sadovaya => "sadovaya",
            Self::Parkovaya => "parkovaya",
            Self::Online => "online",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.key() == key)
    }

    /// Keyword looked for in a club's address; `None` means online.
    pub fn address_keyword(self) -> Option<&'static str> {
        match self {
            Self::Sadovaya => Some("Садовая"),
            Self::Parkovaya => Some("Парковая"),
            Self::Online => None,
        }
    }

    /// Human-readable button label.
    pub fn title(self) -> &'static str {
        match self {
            Self::Sadovaya => "Филиал на Садовой",
            Self::Parkovaya => "Филиал на Парковой",
            Self::Online => "Онлайн",
        }
    }
}

/// First two filter stages of the club search: by age, then by branch.
pub fn filter_clubs(clubs: &[ClubRecord], age: u32, branch: Branch) -> Vec<ClubRecord> {
    clubs
        .iter()
        .filter(|c| c.accepts_age(age) && c.at_branch(branch))
        .cloned()
        .collect()
}

/// Distinct `direction` values of a filtered set, lexically sorted
/// (case-sensitive, stable presentation order for the keyboard).
pub fn distinct_directions(clubs: &[ClubRecord]) -> Vec<String> {
    let mut directions: Vec<String> = clubs.iter().map(|c| c.direction.clone()).collect();
    directions.sort();
    directions.dedup();
    directions
}
