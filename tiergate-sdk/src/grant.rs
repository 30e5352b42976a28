//! Feature grants
//!
//! A grant comes in two forms. The *raw* form is what the entitlement source
//! said, with every field wrapped in [`Reported`] because the source may stay
//! silent on any of them. The *resolved* form is what the rest of the crate
//! works with: every field set, either from the source or from the static
//! fallback for that feature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value the entitlement source may or may not have supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reported<T> {
    Present(T),
    Absent,
}

impl<T> Reported<T> {
    /// Resolve against a fallback
    pub fn or(self, fallback: T) -> T {
        match self {
            Reported::Present(value) => value,
            Reported::Absent => fallback,
        }
    }

    pub fn present(self) -> Option<T> {
        match self {
            Reported::Present(value) => Some(value),
            Reported::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Reported::Present(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reported<U> {
        match self {
            Reported::Present(value) => Reported::Present(f(value)),
            Reported::Absent => Reported::Absent,
        }
    }
}

impl<T> Default for Reported<T> {
    fn default() -> Self {
        Reported::Absent
    }
}

impl<T> From<Option<T>> for Reported<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Reported::Present(value),
            None => Reported::Absent,
        }
    }
}

/// Cap on a metered feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageLimit {
    Limited(u64),
    Unlimited,
}

impl UsageLimit {
    /// Whether `count` uses up the quota
    pub fn is_exhausted_by(&self, count: u64) -> bool {
        match self {
            UsageLimit::Limited(limit) => count >= *limit,
            UsageLimit::Unlimited => false,
        }
    }
}

impl fmt::Display for UsageLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageLimit::Limited(limit) => write!(f, "{}", limit),
            UsageLimit::Unlimited => f.write_str("unlimited"),
        }
    }
}

/// Why the source withheld a metered feature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDeniedReason {
    #[default]
    None,
    SoftLimitExceeded,
    Revoked,
}

impl AccessDeniedReason {
    /// Map the source's free-form reason string.
    ///
    /// Only an explicit revocation is treated as hard; any other non-empty
    /// reason is a soft limit.
    pub fn from_wire(reason: &str) -> Self {
        let reason = reason.trim();
        if reason.is_empty() || reason.eq_ignore_ascii_case("none") {
            AccessDeniedReason::None
        } else if reason.eq_ignore_ascii_case("revoked") {
            AccessDeniedReason::Revoked
        } else {
            AccessDeniedReason::SoftLimitExceeded
        }
    }
}

// ==================== Resolved grants ====================

/// Numeric configuration value (the description character limit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericGrant {
    pub value: u64,
}

/// On/off privilege (the display toggle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanGrant {
    pub has_access: bool,
}

/// Consumable quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeteredGrant {
    pub has_access: bool,
    pub usage_limit: UsageLimit,
    pub current_usage: u64,
    /// End of the current usage period, when the quota resets
    pub usage_period_end: Option<DateTime<Utc>>,
    pub access_denied_reason: AccessDeniedReason,
}

impl MeteredGrant {
    pub fn is_revoked(&self) -> bool {
        self.access_denied_reason == AccessDeniedReason::Revoked
    }
}

/// A resolved grant of any kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureGrant {
    Numeric(NumericGrant),
    Boolean(BooleanGrant),
    Metered(MeteredGrant),
}

// ==================== Raw grants ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawNumericGrant {
    pub value: Reported<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawBooleanGrant {
    pub has_access: Reported<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawMeteredGrant {
    pub has_access: Reported<bool>,
    pub usage_limit: Reported<u64>,
    pub is_unlimited: Reported<bool>,
    pub current_usage: Reported<u64>,
    pub usage_period_end: Reported<DateTime<Utc>>,
    pub access_denied_reason: Reported<AccessDeniedReason>,
}

impl RawMeteredGrant {
    /// A granted quota with a limit and the usage so far
    pub fn limited(limit: u64, current_usage: u64) -> Self {
        Self {
            has_access: Reported::Present(true),
            usage_limit: Reported::Present(limit),
            current_usage: Reported::Present(current_usage),
            ..Default::default()
        }
    }

    /// Set the usage period end
    pub fn with_period_end(mut self, end: DateTime<Utc>) -> Self {
        self.usage_period_end = Reported::Present(end);
        self
    }

    /// Withdraw access for the given reason
    pub fn denied(mut self, reason: AccessDeniedReason) -> Self {
        self.has_access = Reported::Present(false);
        self.access_denied_reason = Reported::Present(reason);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_resolution() {
        assert_eq!(Reported::Present(7).or(50), 7);
        assert_eq!(Reported::<u64>::Absent.or(50), 50);
        assert_eq!(Reported::from(Some(true)), Reported::Present(true));
        assert_eq!(Reported::<bool>::from(None), Reported::Absent);
    }

    #[test]
    fn test_reason_from_wire() {
        assert_eq!(AccessDeniedReason::from_wire("REVOKED"), AccessDeniedReason::Revoked);
        assert_eq!(AccessDeniedReason::from_wire(""), AccessDeniedReason::None);
        assert_eq!(AccessDeniedReason::from_wire("none"), AccessDeniedReason::None);
        assert_eq!(
            AccessDeniedReason::from_wire("usage_limit_exceeded"),
            AccessDeniedReason::SoftLimitExceeded
        );
    }

    #[test]
    fn test_unlimited_never_exhausted() {
        assert!(UsageLimit::Limited(5).is_exhausted_by(5));
        assert!(!UsageLimit::Limited(5).is_exhausted_by(4));
        assert!(!UsageLimit::Unlimited.is_exhausted_by(u64::MAX));
        assert_eq!(UsageLimit::Unlimited.to_string(), "unlimited");
    }
}
