//! Entitlement snapshot
//!
//! One fully resolved set of grants. A snapshot is never edited: a refresh
//! builds a new one and the session swaps it in.

use crate::features::{Fallbacks, FeatureKey};
use crate::grant::*;
use serde::Serialize;

/// How the source answered one feature query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Answer<T> {
    Granted(T),
    /// The source holds no grant for the feature
    #[default]
    NoGrant,
    /// The query itself failed; the source said nothing either way
    Failed,
}

impl<T> Answer<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, Answer::Failed)
    }
}

/// Whatever the source answered for each feature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGrants {
    pub description_limit: Answer<RawNumericGrant>,
    pub display_toggle: Answer<RawBooleanGrant>,
    pub hourly_quota: Answer<RawMeteredGrant>,
    pub lifetime_quota: Answer<RawMeteredGrant>,
}

impl RawGrants {
    /// True when every feature query failed
    pub fn all_failed(&self) -> bool {
        FeatureKey::ALL.into_iter().all(|key| self.is_failed(key))
    }

    pub fn is_failed(&self, key: FeatureKey) -> bool {
        match key {
            FeatureKey::DescriptionLimit => self.description_limit.is_failed(),
            FeatureKey::DisplayToggle => self.display_toggle.is_failed(),
            FeatureKey::HourlyQuota => self.hourly_quota.is_failed(),
            FeatureKey::LifetimeQuota => self.lifetime_quota.is_failed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitlementSnapshot {
    description_limit: NumericGrant,
    display_toggle: BooleanGrant,
    hourly_quota: MeteredGrant,
    lifetime_quota: MeteredGrant,
    #[serde(skip)]
    carried_forward: Vec<FeatureKey>,
}

impl EntitlementSnapshot {
    /// Resolve raw grants field by field against the fallbacks.
    ///
    /// Never fails: anything missing or unreadable takes the fallback value
    /// for that field alone. A failed query counts as no grant.
    pub fn build(raw: RawGrants, fallbacks: &Fallbacks) -> Self {
        Self::assemble(raw, fallbacks, None)
    }

    /// Like [`build`](Self::build), except a feature whose query failed
    /// keeps its grant from `previous`.
    pub fn rebuild(raw: RawGrants, previous: &EntitlementSnapshot, fallbacks: &Fallbacks) -> Self {
        Self::assemble(raw, fallbacks, Some(previous))
    }

    fn assemble(raw: RawGrants, fallbacks: &Fallbacks, previous: Option<&Self>) -> Self {
        let carried_forward: Vec<FeatureKey> = match previous {
            Some(_) => FeatureKey::ALL
                .into_iter()
                .filter(|key| raw.is_failed(*key))
                .collect(),
            None => Vec::new(),
        };
        let carried = |key: FeatureKey| previous.filter(|_| carried_forward.contains(&key));

        let description_limit = match carried(FeatureKey::DescriptionLimit) {
            Some(previous) => previous.description_limit,
            None => NumericGrant {
                value: granted(raw.description_limit)
                    .value
                    .or(fallbacks.description_limit.value),
            },
        };

        let display_toggle = match carried(FeatureKey::DisplayToggle) {
            Some(previous) => previous.display_toggle,
            None => BooleanGrant {
                has_access: granted(raw.display_toggle)
                    .has_access
                    .or(fallbacks.display_toggle.has_access),
            },
        };

        let hourly_quota = match carried(FeatureKey::HourlyQuota) {
            Some(previous) => previous.hourly_quota,
            None => resolve_metered(granted(raw.hourly_quota), &fallbacks.hourly_quota),
        };

        let lifetime_quota = match carried(FeatureKey::LifetimeQuota) {
            Some(previous) => previous.lifetime_quota,
            None => resolve_metered(granted(raw.lifetime_quota), &fallbacks.lifetime_quota),
        };

        Self {
            description_limit,
            display_toggle,
            hourly_quota,
            lifetime_quota,
            carried_forward,
        }
    }

    /// Snapshot made only of fallbacks
    pub fn fallback(fallbacks: &Fallbacks) -> Self {
        Self::build(RawGrants::default(), fallbacks)
    }

    pub fn description_limit(&self) -> &NumericGrant {
        &self.description_limit
    }

    pub fn display_toggle(&self) -> &BooleanGrant {
        &self.display_toggle
    }

    pub fn hourly_quota(&self) -> &MeteredGrant {
        &self.hourly_quota
    }

    pub fn lifetime_quota(&self) -> &MeteredGrant {
        &self.lifetime_quota
    }

    /// Whether `key` was kept from the previous snapshot because its
    /// query failed
    pub fn is_carried_forward(&self, key: FeatureKey) -> bool {
        self.carried_forward.contains(&key)
    }

    pub fn grant(&self, key: FeatureKey) -> FeatureGrant {
        match key {
            FeatureKey::DescriptionLimit => FeatureGrant::Numeric(self.description_limit),
            FeatureKey::DisplayToggle => FeatureGrant::Boolean(self.display_toggle),
            FeatureKey::HourlyQuota => FeatureGrant::Metered(self.hourly_quota),
            FeatureKey::LifetimeQuota => FeatureGrant::Metered(self.lifetime_quota),
        }
    }
}

fn granted<T: Default>(answer: Answer<T>) -> T {
    match answer {
        Answer::Granted(grant) => grant,
        Answer::NoGrant | Answer::Failed => T::default(),
    }
}

fn resolve_metered(raw: RawMeteredGrant, fallback: &MeteredGrant) -> MeteredGrant {
    // An explicit unlimited flag wins over any reported number
    let usage_limit = match (raw.is_unlimited, raw.usage_limit) {
        (Reported::Present(true), _) => UsageLimit::Unlimited,
        (_, Reported::Present(limit)) => UsageLimit::Limited(limit),
        _ => fallback.usage_limit,
    };

    MeteredGrant {
        has_access: raw.has_access.or(fallback.has_access),
        usage_limit,
        current_usage: raw.current_usage.or(fallback.current_usage),
        usage_period_end: raw.usage_period_end.present().or(fallback.usage_period_end),
        access_denied_reason: raw.access_denied_reason.or(fallback.access_denied_reason),
    }
}
