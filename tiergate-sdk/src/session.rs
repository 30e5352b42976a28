//! Session orchestrator
//!
//! Owns the snapshot, the ledger, the paywall and the task list for one
//! signed-in customer, and sequences the remote calls around them.

use std::sync::Arc;
use std::time::Duration;
use tiergate_client::{Task, TaskCreate, TaskUpdate};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{BackendError, EntitlementSource, TaskStore};
use crate::error::{Result, SessionError};
use crate::features::{Fallbacks, FeatureIds, FeatureKey};
use crate::gate::{self, Action, Decision};
use crate::ledger::UsageLedger;
use crate::paywall::{Paywall, PaywallNotice};
use crate::snapshot::{Answer, EntitlementSnapshot, RawGrants};

/// Configuration for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Feature identifiers at the entitlement source
    pub features: FeatureIds,
    /// Grants used when the source has no answer
    pub fallbacks: &'static Fallbacks,
    /// How long startup waits for the source to become ready
    pub ready_timeout: Duration,
    /// Budget for one refresh plus the four grant queries
    pub refresh_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            features: FeatureIds::default(),
            fallbacks: &Fallbacks::STATIC,
            ready_timeout: Duration::from_secs(10),
            refresh_timeout: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot replaced the old one and the ledger was re-seeded
    Refreshed,
    /// The source could not be reached in time; nothing changed
    KeptPrevious,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Task),
    /// The gate said no; the notice is now visible
    Denied(PaywallNotice),
}

/// Permission to flip the display preference.
///
/// Only handed out while the display toggle is granted.
pub struct DisplayToggle<'a> {
    dark_mode: &'a mut bool,
}

impl DisplayToggle<'_> {
    /// Flip the preference and return the new value
    pub fn flip(self) -> bool {
        *self.dark_mode = !*self.dark_mode;
        *self.dark_mode
    }

    pub fn is_on(&self) -> bool {
        *self.dark_mode
    }
}

pub struct Session {
    id: Uuid,
    config: SessionConfig,
    entitlements: Arc<dyn EntitlementSource>,
    store: Arc<dyn TaskStore>,
    snapshot: EntitlementSnapshot,
    ledger: UsageLedger,
    paywall: Paywall,
    tasks: Vec<Task>,
    dark_mode: bool,
}

impl Session {
    /// Start a session.
    ///
    /// Waits for the entitlement source, then builds the snapshot and loads
    /// the task list side by side. Never fails: an unreachable source leaves
    /// the session on fallback grants and an unreachable store leaves the
    /// list empty.
    pub async fn start(
        config: SessionConfig,
        entitlements: Arc<dyn EntitlementSource>,
        store: Arc<dyn TaskStore>,
    ) -> Self {
        let id = Uuid::new_v4();
        info!(session_id = %id, "Starting session");

        let ready = match timeout(config.ready_timeout, entitlements.wait_for_ready()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(session_id = %id, error = %e, "Entitlement source not ready, using fallback grants");
                false
            }
            Err(_) => {
                warn!(
                    session_id = %id,
                    timeout_ms = config.ready_timeout.as_millis() as u64,
                    "Entitlement source readiness timed out, using fallback grants"
                );
                false
            }
        };

        let grants_fetch = async {
            if ready {
                fetch_grants(entitlements.as_ref(), &config, None).await
            } else {
                None
            }
        };
        let (raw, tasks) = tokio::join!(grants_fetch, store.list());

        let snapshot = match raw {
            Some(raw) => EntitlementSnapshot::build(raw, config.fallbacks),
            None => EntitlementSnapshot::fallback(config.fallbacks),
        };
        let tasks = tasks.unwrap_or_else(|e| {
            warn!(session_id = %id, error = %e, "Failed to load tasks");
            Vec::new()
        });
        let ledger = UsageLedger::seed(&snapshot);

        info!(
            session_id = %id,
            tasks = tasks.len(),
            hourly = ledger.hourly_count,
            lifetime = ledger.lifetime_count,
            "Session ready"
        );

        Self {
            id,
            config,
            entitlements,
            store,
            snapshot,
            ledger,
            paywall: Paywall::new(),
            tasks,
            dark_mode: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &EntitlementSnapshot {
        &self.snapshot
    }

    pub fn ledger(&self) -> UsageLedger {
        self.ledger
    }

    pub fn paywall(&self) -> &Paywall {
        &self.paywall
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Effective display preference; off whenever the toggle is not granted
    pub fn dark_mode(&self) -> bool {
        self.dark_mode && self.snapshot.display_toggle().has_access
    }

    /// Gate decision for `action` against the current state
    pub fn evaluate(&self, action: Action) -> Decision {
        gate::evaluate(&self.snapshot, &self.ledger, action)
    }

    /// Force a refresh, replace the snapshot and re-seed the ledger.
    ///
    /// On timeout or failure the previous snapshot and ledger stay in place.
    /// A single feature whose query failed keeps its previous grant, and a
    /// quota kept that way keeps its local counter.
    pub async fn refresh_entitlements(&mut self) -> RefreshOutcome {
        self.refresh_with(None).await
    }

    async fn refresh_with(&mut self, requested_usage: Option<u64>) -> RefreshOutcome {
        match fetch_grants(self.entitlements.as_ref(), &self.config, requested_usage).await {
            Some(raw) => {
                let snapshot = EntitlementSnapshot::rebuild(raw, &self.snapshot, self.config.fallbacks);
                self.ledger = self.ledger.reseed(&snapshot);
                self.snapshot = snapshot;
                debug!(
                    session_id = %self.id,
                    hourly = self.ledger.hourly_count,
                    lifetime = self.ledger.lifetime_count,
                    "Entitlements refreshed"
                );
                RefreshOutcome::Refreshed
            }
            None => RefreshOutcome::KeptPrevious,
        }
    }

    /// Create a task, subject to the gate.
    ///
    /// Refreshes entitlements first. A denial shows the paywall and returns
    /// [`CreateOutcome::Denied`]; a store failure is an error and leaves the
    /// ledger untouched.
    pub async fn create_task(&mut self, title: &str, description: &str) -> Result<CreateOutcome> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SessionError::EmptyTitle);
        }
        let description = description.trim();

        self.refresh_with(Some(1)).await;

        gate::check_description(description, &self.snapshot)?;

        if let Some(denial) = gate::check_creation(&self.snapshot, &self.ledger) {
            debug!(session_id = %self.id, denial = ?denial, "Task creation denied");
            let notice = PaywallNotice::for_denial(denial, &self.snapshot, &self.ledger);
            self.paywall.show(notice.clone());
            return Ok(CreateOutcome::Denied(notice));
        }

        let input = TaskCreate {
            title: title.to_string(),
            description: description.to_string(),
        };
        let task = match self.store.create(input).await {
            Ok(task) => task,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Task creation failed");
                return Err(e.into());
            }
        };

        self.ledger = self.ledger.record_creation();
        self.tasks.push(task.clone());
        self.report_creation().await;

        info!(
            session_id = %self.id,
            task_id = task.id,
            hourly = self.ledger.hourly_count,
            lifetime = self.ledger.lifetime_count,
            "Task created"
        );
        Ok(CreateOutcome::Created(task))
    }

    /// Report one unit against both quotas; failures are only logged
    async fn report_creation(&self) {
        let ids = &self.config.features;
        let (hourly, lifetime) = tokio::join!(
            self.entitlements.report_usage(&ids.hourly_quota, 1),
            self.entitlements.report_usage(&ids.lifetime_quota, 1),
        );

        for (feature, result) in [(&ids.hourly_quota, hourly), (&ids.lifetime_quota, lifetime)] {
            if let Err(e) = result {
                warn!(session_id = %self.id, feature = %feature, error = %e, "Failed to report usage");
            }
        }
    }

    /// Flip a task's completion flag
    pub async fn toggle_task(&mut self, id: u64) -> Result<Task> {
        let index = self.task_index(id)?;
        let completed = !self.tasks[index].completed;

        let task = self.store.update(id, TaskUpdate::completed(completed)).await?;
        self.tasks[index] = task.clone();
        Ok(task)
    }

    /// Delete a task. Quota already used stays used.
    pub async fn delete_task(&mut self, id: u64) -> Result<()> {
        let index = self.task_index(id)?;

        self.store.delete(id).await?;
        self.tasks.remove(index);
        debug!(session_id = %self.id, task_id = id, "Task deleted");
        Ok(())
    }

    /// Re-fetch the task list from the store
    pub async fn reload_tasks(&mut self) -> Result<()> {
        self.tasks = self.store.list().await?;
        Ok(())
    }

    pub fn close_paywall(&mut self) {
        self.paywall.close();
    }

    /// Access to the display preference, or `None` without the grant
    pub fn display_toggle(&mut self) -> Option<DisplayToggle<'_>> {
        match self.evaluate(Action::ToggleDisplay) {
            Decision::Allow => Some(DisplayToggle {
                dark_mode: &mut self.dark_mode,
            }),
            Decision::Deny(_) => None,
        }
    }

    fn task_index(&self, id: u64) -> Result<usize> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(SessionError::UnknownTask(id))
    }
}

/// Refresh the source and query all four features.
///
/// `None` means the previous snapshot should stay: the refresh failed or
/// timed out, or every feature query failed.
async fn fetch_grants(
    source: &dyn EntitlementSource,
    config: &SessionConfig,
    requested_usage: Option<u64>,
) -> Option<RawGrants> {
    let ids = &config.features;

    let fetch = async {
        source.refresh().await?;

        let (description_limit, display_toggle, hourly_quota, lifetime_quota) = tokio::join!(
            source.get_numeric(&ids.description_limit),
            source.get_boolean(&ids.display_toggle),
            source.get_metered(&ids.hourly_quota, requested_usage),
            source.get_metered(&ids.lifetime_quota, requested_usage),
        );

        Ok::<_, BackendError>(RawGrants {
            description_limit: answered(FeatureKey::DescriptionLimit, description_limit),
            display_toggle: answered(FeatureKey::DisplayToggle, display_toggle),
            hourly_quota: answered(FeatureKey::HourlyQuota, hourly_quota),
            lifetime_quota: answered(FeatureKey::LifetimeQuota, lifetime_quota),
        })
    };

    match timeout(config.refresh_timeout, fetch).await {
        Ok(Ok(raw)) if raw.all_failed() => {
            warn!("No feature answered, keeping previous entitlements");
            None
        }
        Ok(Ok(raw)) => Some(raw),
        Ok(Err(e)) => {
            warn!(error = %e, "Entitlement refresh failed, keeping previous entitlements");
            None
        }
        Err(_) => {
            warn!(
                timeout_ms = config.refresh_timeout.as_millis() as u64,
                "Entitlement refresh timed out, keeping previous entitlements"
            );
            None
        }
    }
}

fn answered<T>(key: FeatureKey, result: std::result::Result<T, BackendError>) -> Answer<T> {
    match result {
        Ok(grant) => Answer::Granted(grant),
        Err(e) if e.is_not_found() => {
            debug!(feature = %key, "No grant for feature, falling back");
            Answer::NoGrant
        }
        Err(e) => {
            warn!(feature = %key, error = %e, "Feature query failed");
            Answer::Failed
        }
    }
}
