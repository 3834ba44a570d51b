//! Fixed priced-activity catalog for package tours, and package pricing.

/// Minimum group size for a package tour.
pub const MIN_PACKAGE_PEOPLE: u32 = 5;

/// Maximum number of activities in one package.
pub const MAX_PACKAGE_ACTIVITIES: usize = 3;

/// One bookable activity with volume-tiered pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activity {
    pub name: &'static str,
    /// Per-person unit price when 1, 2 or 3 activities are in the package.
    /// More activities in the package means a lower unit price.
    pub tier_prices: [u32; 3],
}

/// The activity list offered in package tours. Indices into this slice are
/// stable and are used as callback tokens.
pub const ACTIVITIES: &[Activity] = &[
    Activity {
        name: "Мастер-класс по керамике",
        tier_prices: [2200, 2100, 2000],
    },
    Activity {
        name: "Кулинарный мастер-класс",
        tier_prices: [2000, 1900, 1800],
    },
    Activity {
        name: "Скалодром",
        tier_prices: [1800, 1700, 1600],
    },
    Activity {
        name: "Верёвочный парк",
        tier_prices: [1500, 1400, 1300],
    },
    Activity {
        name: "Квест «Форт»",
        tier_prices: [1700, 1600, 1500],
    },
];

/// Computed price for a package selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageQuote {
    /// Sum of unit prices across the selected activities.
    pub per_person: u32,
    /// Per-person subtotal multiplied by the group size. Wide enough that
    /// no accepted group size can overflow it.
    pub total: u64,
}

/// Price a selection of activity indices for a group.
///
/// Each activity's unit price comes from the tier for the number of
/// selected activities (`selected.len() - 1`). Out-of-range indices are
/// skipped; the caller validates the selection before quoting.
pub fn quote(selected: &[usize], people: u32) -> PackageQuote {
    let tier = selected.len().saturating_sub(1).min(MAX_PACKAGE_ACTIVITIES - 1);
    let per_person: u32 = selected
        .iter()
        .filter_map(|&i| ACTIVITIES.get(i))
        .map(|a| a.tier_prices[tier])
        .sum();
    PackageQuote {
        per_person,
        total: u64::from(per_person) * u64::from(people),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_activity_five_people() {
        // Керамика: [2200, 2100, 2000], tier 0 for one activity.
        let q = quote(&[0], 5);
        assert_eq!(q.per_person, 2200);
        assert_eq!(q.total, 11_000);
    }

    #[test]
    fn two_activities_use_second_tier() {
        let q = quote(&[0, 1], 6);
        assert_eq!(q.per_person, 2100 + 1900);
        assert_eq!(q.total, (2100 + 1900) * 6);
    }

    #[test]
    fn three_activities_use_third_tier() {
        let q = quote(&[0, 1, 2], 5);
        assert_eq!(q.per_person, 2000 + 1800 + 1600);
    }

    #[test]
    fn volume_discount_lowers_unit_price() {
        for activity in ACTIVITIES {
            assert!(activity.tier_prices[0] > activity.tier_prices[1]);
            assert!(activity.tier_prices[1] > activity.tier_prices[2]);
        }
    }

    #[test]
    fn out_of_range_index_is_skipped() {
        let q = quote(&[999], 5);
        assert_eq!(q.per_person, 0);
        assert_eq!(q.total, 0);
    }

    #[test]
    fn huge_group_does_not_overflow() {
        let q = quote(&[0], 2_000_000);
        assert_eq!(q.total, 2200 * 2_000_000u64);
    }
}
