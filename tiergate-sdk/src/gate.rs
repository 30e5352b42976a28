//! Gate engine
//!
//! Pure decisions over a snapshot and a ledger. Nothing here performs I/O or
//! keeps state, so the same inputs always give the same answer.

use crate::error::{Result, SessionError};
use crate::grant::MeteredGrant;
use crate::ledger::UsageLedger;
use crate::snapshot::EntitlementSnapshot;
use serde::Serialize;
use std::fmt;

/// A quota-governed action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateTask,
    ToggleDisplay,
}

/// Which metered quota a denial came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    Hourly,
    Lifetime,
}

impl fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaKind::Hourly => f.write_str("hourly"),
            QuotaKind::Lifetime => f.write_str("total"),
        }
    }
}

/// Why task creation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDenial {
    /// Hourly quota used up or withheld; resets with the usage period
    Hourly,
    /// Lifetime quota used up or withheld; never resets
    Total,
    /// The source revoked the quota outright
    Revoked { quota: QuotaKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Quota(QuotaDenial),
    /// Boolean feature not granted
    NotEntitled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decide whether `action` may proceed.
pub fn evaluate(snapshot: &EntitlementSnapshot, ledger: &UsageLedger, action: Action) -> Decision {
    match action {
        Action::CreateTask => match check_creation(snapshot, ledger) {
            Some(denial) => Decision::Deny(DenyReason::Quota(denial)),
            None => Decision::Allow,
        },
        Action::ToggleDisplay => {
            if snapshot.display_toggle().has_access {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotEntitled)
            }
        }
    }
}

/// Quota check for one task creation.
///
/// The hourly quota is checked strictly before the lifetime one, and within
/// each quota a withheld grant before the count.
pub fn check_creation(snapshot: &EntitlementSnapshot, ledger: &UsageLedger) -> Option<QuotaDenial> {
    check_quota(
        snapshot.hourly_quota(),
        ledger.hourly_count,
        QuotaKind::Hourly,
        QuotaDenial::Hourly,
    )
    .or_else(|| {
        check_quota(
            snapshot.lifetime_quota(),
            ledger.lifetime_count,
            QuotaKind::Lifetime,
            QuotaDenial::Total,
        )
    })
}

fn check_quota(
    grant: &MeteredGrant,
    count: u64,
    quota: QuotaKind,
    exhausted: QuotaDenial,
) -> Option<QuotaDenial> {
    if !grant.has_access {
        if grant.is_revoked() {
            return Some(QuotaDenial::Revoked { quota });
        }
        return Some(exhausted);
    }
    if grant.usage_limit.is_exhausted_by(count) {
        return Some(exhausted);
    }
    None
}

/// Hard stop on description length, measured in characters.
pub fn check_description(description: &str, snapshot: &EntitlementSnapshot) -> Result<()> {
    let len = description.chars().count() as u64;
    let max = snapshot.description_limit().value;

    if len > max {
        return Err(SessionError::DescriptionTooLong { len, max });
    }
    Ok(())
}
