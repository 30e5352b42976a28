//! Local usage counters mirroring the source's metered usage

use crate::features::FeatureKey;
use crate::snapshot::EntitlementSnapshot;
use serde::Serialize;

/// Tasks created this hour and overall.
///
/// Seeding replaces the counters; nothing ever decrements them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageLedger {
    pub hourly_count: u64,
    pub lifetime_count: u64,
}

impl UsageLedger {
    /// Ledger matching the usage reported in `snapshot`
    pub fn seed(snapshot: &EntitlementSnapshot) -> Self {
        Self {
            hourly_count: snapshot.hourly_quota().current_usage,
            lifetime_count: snapshot.lifetime_quota().current_usage,
        }
    }

    /// Re-seed after a refresh.
    ///
    /// Every counter the source reported is replaced. A quota carried over
    /// from the previous snapshot keeps the local count, which already
    /// includes creations the stale usage figure does not.
    #[must_use]
    pub fn reseed(self, snapshot: &EntitlementSnapshot) -> Self {
        let fresh = Self::seed(snapshot);
        Self {
            hourly_count: if snapshot.is_carried_forward(FeatureKey::HourlyQuota) {
                self.hourly_count
            } else {
                fresh.hourly_count
            },
            lifetime_count: if snapshot.is_carried_forward(FeatureKey::LifetimeQuota) {
                self.lifetime_count
            } else {
                fresh.lifetime_count
            },
        }
    }

    /// Count one confirmed task creation
    #[must_use]
    pub fn record_creation(self) -> Self {
        Self {
            hourly_count: self.hourly_count.saturating_add(1),
            lifetime_count: self.lifetime_count.saturating_add(1),
        }
    }
}
