//! Per-user session state.
//!
//! A session holds the user's position within the single active flow as a
//! sum type: each variant carries exactly the fields collected so far, so
//! an out-of-state field access is a compile error rather than a missing
//! map key at runtime.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::catalog::{Branch, ClubRecord, MasterclassRecord};

/// Position within the club-search flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClubSearchState {
    AwaitingAge,
    AwaitingBranch {
        age: u32,
    },
    /// `matches` is the age+branch snapshot; direction and club indices
    /// refer to it, so tokens stay stable for the rest of the flow even
    /// if the upstream catalog changes.
    AwaitingDirection {
        age: u32,
        branch: Branch,
        matches: Vec<ClubRecord>,
        directions: Vec<String>,
    },
    AwaitingClub {
        matches: Vec<ClubRecord>,
    },
}

/// Position within the package-booking flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageState {
    AwaitingPeopleCount,
    AwaitingActivities {
        people: u32,
        /// Indices into the static activity catalog, in selection order.
        selected: Vec<usize>,
    },
    AwaitingName {
        people: u32,
        selected: Vec<usize>,
    },
    AwaitingPhone {
        people: u32,
        selected: Vec<usize>,
        name: String,
    },
}

/// Position within the masterclass-enrollment flow. Carries a snapshot of
/// the chosen record so a concurrent admin delete cannot redirect the
/// enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollState {
    AwaitingName {
        masterclass: MasterclassRecord,
    },
    AwaitingPhone {
        masterclass: MasterclassRecord,
        name: String,
    },
}

/// Position within the admin add-masterclass flow (sequential capture).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAddState {
    AwaitingTitle,
    AwaitingDescription {
        title: String,
    },
    AwaitingDate {
        title: String,
        description: String,
    },
    AwaitingPrice {
        title: String,
        description: String,
        date: String,
    },
    AwaitingTeacher {
        title: String,
        description: String,
        date: String,
        price: String,
    },
    AwaitingLink {
        title: String,
        description: String,
        date: String,
        price: String,
        teacher: String,
    },
}

/// Position within the admin delete-masterclass flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminDeleteState {
    AwaitingChoice,
    AwaitingConfirm { index: usize, title: String },
}

/// Where a user currently is in the conversation. At most one flow is
/// active; entering a new flow replaces this wholesale, discarding any
/// uncommitted fields of the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    ClubSearch(ClubSearchState),
    Package(PackageState),
    Enroll(EnrollState),
    Support,
    AdminAdd(AdminAddState),
    AdminDelete(AdminDeleteState),
}

struct Session {
    state: FlowState,
    last_activity: Instant,
}

/// In-memory session store, one entry per user mid-flow. Idle users have
/// no entry; `get` reports them as `FlowState::Idle`.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<i64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current flow state for a user.
    pub async fn get(&self, user_id: i64) -> FlowState {
        self.inner
            .read()
            .await
            .get(&user_id)
            .map(|s| s.state.clone())
            .unwrap_or_default()
    }

    /// Replace a user's flow state and refresh the activity timestamp.
    /// Setting `Idle` removes the entry.
    pub async fn set(&self, user_id: i64, state: FlowState) {
        let mut inner = self.inner.write().await;
        if state == FlowState::Idle {
            inner.remove(&user_id);
        } else {
            inner.insert(
                user_id,
                Session {
                    state,
                    last_activity: Instant::now(),
                },
            );
        }
    }

    /// Clear a user's session unconditionally.
    pub async fn clear(&self, user_id: i64) {
        self.inner.write().await.remove(&user_id);
    }

    /// Drop sessions idle for at least `timeout`. Returns how many were
    /// removed.
    pub async fn prune_idle(&self, timeout: Duration) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.len();
        inner.retain(|_, s| s.last_activity.elapsed() < timeout);
        before - inner.len()
    }

    /// Number of users currently mid-flow.
    pub async fn active_count(&self) -> usize {
        self.inner.read().await.len()
    }
}
