//! Paywall state machine
//!
//! At most one notice is visible. A new denial replaces whatever is showing;
//! closing hides it without touching the quota behind it.

use crate::gate::{QuotaDenial, QuotaKind};
use crate::grant::UsageLimit;
use crate::ledger::UsageLedger;
use crate::snapshot::EntitlementSnapshot;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// What a denial notice shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaywallNotice {
    Hourly {
        current: u64,
        limit: UsageLimit,
        /// When the hourly quota resets, if the source said
        resets_at: Option<DateTime<Utc>>,
    },
    Total {
        current: u64,
        limit: UsageLimit,
    },
    Revoked {
        quota: QuotaKind,
        current: u64,
        limit: UsageLimit,
    },
}

impl PaywallNotice {
    /// Notice for a refused task creation, with the counts it renders
    pub fn for_denial(
        denial: QuotaDenial,
        snapshot: &EntitlementSnapshot,
        ledger: &UsageLedger,
    ) -> Self {
        match denial {
            QuotaDenial::Hourly => PaywallNotice::Hourly {
                current: ledger.hourly_count,
                limit: snapshot.hourly_quota().usage_limit,
                resets_at: snapshot.hourly_quota().usage_period_end,
            },
            QuotaDenial::Total => PaywallNotice::Total {
                current: ledger.lifetime_count,
                limit: snapshot.lifetime_quota().usage_limit,
            },
            QuotaDenial::Revoked {
                quota: QuotaKind::Hourly,
            } => PaywallNotice::Revoked {
                quota: QuotaKind::Hourly,
                current: ledger.hourly_count,
                limit: snapshot.hourly_quota().usage_limit,
            },
            QuotaDenial::Revoked {
                quota: QuotaKind::Lifetime,
            } => PaywallNotice::Revoked {
                quota: QuotaKind::Lifetime,
                current: ledger.lifetime_count,
                limit: snapshot.lifetime_quota().usage_limit,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PaywallState {
    #[default]
    Hidden,
    Visible(PaywallNotice),
}

#[derive(Debug, Default)]
pub struct Paywall {
    state: PaywallState,
}

impl Paywall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `notice`, replacing any visible one
    pub fn show(&mut self, notice: PaywallNotice) {
        debug!(notice = ?notice, replaced = self.is_visible(), "Paywall shown");
        self.state = PaywallState::Visible(notice);
    }

    pub fn close(&mut self) {
        if self.is_visible() {
            debug!("Paywall closed");
        }
        self.state = PaywallState::Hidden;
    }

    pub fn state(&self) -> &PaywallState {
        &self.state
    }

    pub fn notice(&self) -> Option<&PaywallNotice> {
        match &self.state {
            PaywallState::Visible(notice) => Some(notice),
            PaywallState::Hidden => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, PaywallState::Visible(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Fallbacks;

    #[test]
    fn test_starts_hidden() {
        assert_eq!(Paywall::new().state(), &PaywallState::Hidden);
    }

    #[test]
    fn test_new_notice_overwrites() {
        let mut paywall = Paywall::new();
        paywall.show(PaywallNotice::Total {
            current: 10,
            limit: UsageLimit::Limited(10),
        });
        let revoked = PaywallNotice::Revoked {
            quota: QuotaKind::Hourly,
            current: 2,
            limit: UsageLimit::Limited(5),
        };
        paywall.show(revoked.clone());

        assert_eq!(paywall.notice(), Some(&revoked));

        paywall.close();
        assert!(!paywall.is_visible());
    }

    #[test]
    fn test_notice_carries_counts() {
        let snapshot = EntitlementSnapshot::fallback(&Fallbacks::STATIC);
        let ledger = UsageLedger {
            hourly_count: 5,
            lifetime_count: 6,
        };

        let notice = PaywallNotice::for_denial(QuotaDenial::Hourly, &snapshot, &ledger);
        assert_eq!(
            notice,
            PaywallNotice::Hourly {
                current: 5,
                limit: UsageLimit::Limited(5),
                resets_at: None,
            }
        );
    }

    #[test]
    fn test_revoked_notice_carries_counts_of_its_quota() {
        let snapshot = EntitlementSnapshot::fallback(&Fallbacks::STATIC);
        let ledger = UsageLedger {
            hourly_count: 2,
            lifetime_count: 7,
        };

        let notice = PaywallNotice::for_denial(
            QuotaDenial::Revoked {
                quota: QuotaKind::Lifetime,
            },
            &snapshot,
            &ledger,
        );
        assert_eq!(
            notice,
            PaywallNotice::Revoked {
                quota: QuotaKind::Lifetime,
                current: 7,
                limit: UsageLimit::Limited(Fallbacks::LIFETIME_LIMIT),
            }
        );
    }
}
