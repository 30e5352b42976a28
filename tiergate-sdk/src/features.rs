//! The four tracked features, their identifiers and static fallbacks

use crate::grant::{AccessDeniedReason, BooleanGrant, MeteredGrant, NumericGrant, UsageLimit};
use std::fmt;

/// One of the features a session resolves grants for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKey {
    /// Maximum description length (numeric)
    DescriptionLimit,
    /// Display preference toggle (boolean)
    DisplayToggle,
    /// Task creations per hour (metered)
    HourlyQuota,
    /// Task creations ever (metered)
    LifetimeQuota,
}

impl FeatureKey {
    pub const ALL: [FeatureKey; 4] = [
        FeatureKey::DescriptionLimit,
        FeatureKey::DisplayToggle,
        FeatureKey::HourlyQuota,
        FeatureKey::LifetimeQuota,
    ];
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeatureKey::DescriptionLimit => "description_limit",
            FeatureKey::DisplayToggle => "display_toggle",
            FeatureKey::HourlyQuota => "hourly_quota",
            FeatureKey::LifetimeQuota => "lifetime_quota",
        };
        f.write_str(name)
    }
}

/// Feature identifiers as known to the entitlement source.
///
/// Configured once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureIds {
    pub description_limit: String,
    pub display_toggle: String,
    pub hourly_quota: String,
    pub lifetime_quota: String,
}

impl FeatureIds {
    pub fn id(&self, key: FeatureKey) -> &str {
        match key {
            FeatureKey::DescriptionLimit => &self.description_limit,
            FeatureKey::DisplayToggle => &self.display_toggle,
            FeatureKey::HourlyQuota => &self.hourly_quota,
            FeatureKey::LifetimeQuota => &self.lifetime_quota,
        }
    }
}

impl Default for FeatureIds {
    fn default() -> Self {
        Self {
            description_limit: "feature-description-char-limit".to_string(),
            display_toggle: "feature-dark-mode".to_string(),
            hourly_quota: "feature-task-hourly-limit".to_string(),
            lifetime_quota: "feature-task-total-limit-3".to_string(),
        }
    }
}

/// Grants used when the source has no answer for a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fallbacks {
    pub description_limit: NumericGrant,
    pub display_toggle: BooleanGrant,
    pub hourly_quota: MeteredGrant,
    pub lifetime_quota: MeteredGrant,
}

impl Fallbacks {
    pub const DESCRIPTION_LIMIT: u64 = 50;
    pub const HOURLY_LIMIT: u64 = 5;
    pub const LIFETIME_LIMIT: u64 = 10;

    /// Built-in fallbacks
    pub const STATIC: Fallbacks = Fallbacks {
        description_limit: NumericGrant {
            value: Self::DESCRIPTION_LIMIT,
        },
        display_toggle: BooleanGrant { has_access: false },
        hourly_quota: MeteredGrant {
            has_access: true,
            usage_limit: UsageLimit::Limited(Self::HOURLY_LIMIT),
            current_usage: 0,
            usage_period_end: None,
            access_denied_reason: AccessDeniedReason::None,
        },
        lifetime_quota: MeteredGrant {
            has_access: true,
            usage_limit: UsageLimit::Limited(Self::LIFETIME_LIMIT),
            current_usage: 0,
            usage_period_end: None,
            access_denied_reason: AccessDeniedReason::None,
        },
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_by_key() {
        let ids = FeatureIds::default();
        assert_eq!(ids.id(FeatureKey::HourlyQuota), "feature-task-hourly-limit");
        assert_eq!(ids.id(FeatureKey::LifetimeQuota), "feature-task-total-limit-3");
    }
}
