//! Mock backends for testing.

use async_trait::async_trait;
use chrono::Local;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tiergate_client::{Task, TaskCreate, TaskUpdate};
use tokio::sync::Semaphore;

use super::traits::*;
use crate::grant::{RawBooleanGrant, RawMeteredGrant, RawNumericGrant, Reported};

#[derive(Default)]
struct EntitlementState {
    numeric: HashMap<String, RawNumericGrant>,
    boolean: HashMap<String, RawBooleanGrant>,
    metered: HashMap<String, RawMeteredGrant>,
    failing: HashSet<String>,
    refresh_delay: Duration,
    usage_reports: Vec<(String, u64)>,
}

/// Mock entitlement source.
///
/// Features without a configured grant answer `NotFound`, which a session
/// resolves to the fallback grant. Features marked with
/// [`fail_feature`](Self::fail_feature) answer a network error instead.
pub struct MockEntitlementSource {
    state: Mutex<EntitlementState>,
    available: AtomicBool,
    refresh_count: AtomicU32,
}

impl MockEntitlementSource {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(EntitlementState::default()),
            available: AtomicBool::new(true),
            refresh_count: AtomicU32::new(0),
        }
    }

    /// Set a numeric grant.
    pub fn with_numeric(self, feature_id: impl Into<String>, value: u64) -> Self {
        self.state().numeric.insert(
            feature_id.into(),
            RawNumericGrant {
                value: Reported::Present(value),
            },
        );
        self
    }

    /// Set a boolean grant.
    pub fn with_boolean(self, feature_id: impl Into<String>, has_access: bool) -> Self {
        self.state().boolean.insert(
            feature_id.into(),
            RawBooleanGrant {
                has_access: Reported::Present(has_access),
            },
        );
        self
    }

    /// Set a metered grant.
    pub fn with_metered(self, feature_id: impl Into<String>, grant: RawMeteredGrant) -> Self {
        self.set_metered(feature_id, grant);
        self
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.set_available(available);
        self
    }

    /// Replace a metered grant while a session is running.
    pub fn set_metered(&self, feature_id: impl Into<String>, grant: RawMeteredGrant) {
        self.state().metered.insert(feature_id.into(), grant);
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make every query for `feature_id` fail.
    pub fn fail_feature(&self, feature_id: impl Into<String>) {
        self.state().failing.insert(feature_id.into());
    }

    /// Delay applied to each refresh.
    pub fn set_refresh_delay(&self, delay: Duration) {
        self.state().refresh_delay = delay;
    }

    /// Get the number of times refresh was called.
    pub fn refresh_count(&self) -> u32 {
        self.refresh_count.load(Ordering::SeqCst)
    }

    /// Usage reports received so far, in order.
    pub fn usage_reports(&self) -> Vec<(String, u64)> {
        self.state().usage_reports.clone()
    }

    fn state(&self) -> MutexGuard<'_, EntitlementState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, feature_id: &str) -> Result<(), BackendError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("Mock source disabled".to_string()));
        }
        if self.state().failing.contains(feature_id) {
            return Err(BackendError::Network(format!("{} failed", feature_id)));
        }
        Ok(())
    }
}

impl Default for MockEntitlementSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntitlementSource for MockEntitlementSource {
    async fn wait_for_ready(&self) -> Result<(), BackendError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("Mock source disabled".to_string()));
        }
        Ok(())
    }

    async fn refresh(&self) -> Result<(), BackendError> {
        self.refresh_count.fetch_add(1, Ordering::SeqCst);

        let delay = self.state().refresh_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("Mock source disabled".to_string()));
        }
        Ok(())
    }

    async fn get_numeric(&self, feature_id: &str) -> Result<RawNumericGrant, BackendError> {
        self.check(feature_id)?;
        self.state()
            .numeric
            .get(feature_id)
            .copied()
            .ok_or_else(|| BackendError::NotFound(feature_id.to_string()))
    }

    async fn get_boolean(&self, feature_id: &str) -> Result<RawBooleanGrant, BackendError> {
        self.check(feature_id)?;
        self.state()
            .boolean
            .get(feature_id)
            .copied()
            .ok_or_else(|| BackendError::NotFound(feature_id.to_string()))
    }

    async fn get_metered(
        &self,
        feature_id: &str,
        _requested_usage: Option<u64>,
    ) -> Result<RawMeteredGrant, BackendError> {
        self.check(feature_id)?;
        self.state()
            .metered
            .get(feature_id)
            .copied()
            .ok_or_else(|| BackendError::NotFound(feature_id.to_string()))
    }

    async fn report_usage(&self, feature_id: &str, value: u64) -> Result<(), BackendError> {
        self.check(feature_id)?;

        let mut state = self.state();
        state.usage_reports.push((feature_id.to_string(), value));
        if let Some(grant) = state.metered.get_mut(feature_id) {
            grant.current_usage = grant.current_usage.map(|usage| usage + value);
        }
        Ok(())
    }
}

/// Mock task store.
///
/// Keeps tasks in memory and assigns increasing ids.
pub struct MockTaskStore {
    tasks: Mutex<Vec<Task>>,
    next_id: AtomicU64,
    fail_creates: AtomicBool,
    fail_lists: AtomicBool,
    create_calls: AtomicU32,
    create_gate: Option<Semaphore>,
}

impl MockTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            fail_creates: AtomicBool::new(false),
            fail_lists: AtomicBool::new(false),
            create_calls: AtomicU32::new(0),
            create_gate: None,
        }
    }

    /// Seed the store with a task.
    pub fn with_task(self, title: impl Into<String>, description: impl Into<String>) -> Self {
        let task = self.new_task(title.into(), description.into());
        self.tasks().push(task);
        self
    }

    /// Hold every create until [`release_create`](Self::release_create) is
    /// called.
    pub fn with_gated_creates(mut self) -> Self {
        self.create_gate = Some(Semaphore::new(0));
        self
    }

    /// Let one held create through.
    pub fn release_create(&self) {
        if let Some(gate) = &self.create_gate {
            gate.add_permits(1);
        }
    }

    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Make `list` fail until switched back.
    pub fn set_fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    /// Get the number of times create was called.
    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Tasks currently stored.
    pub fn stored(&self) -> Vec<Task> {
        self.tasks().clone()
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_task(&self, title: String, description: String) -> Task {
        Task {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title,
            description,
            completed: false,
            created_at: Local::now().naive_local(),
        }
    }
}

impl Default for MockTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MockTaskStore {
    async fn list(&self) -> Result<Vec<Task>, BackendError> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(BackendError::Network("Mock store rejected list".to_string()));
        }
        Ok(self.stored())
    }

    async fn create(&self, input: TaskCreate) -> Result<Task, BackendError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.create_gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(BackendError::Network("Mock store rejected create".to_string()));
        }

        let task = self.new_task(input.title, input.description);
        self.tasks().push(task.clone());
        Ok(task)
    }

    async fn update(&self, id: u64, update: TaskUpdate) -> Result<Task, BackendError> {
        let mut tasks = self.tasks();
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| BackendError::NotFound(format!("task {}", id)))?;

        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(completed) = update.completed {
            task.completed = completed;
        }
        Ok(task.clone())
    }

    async fn delete(&self, id: u64) -> Result<(), BackendError> {
        let mut tasks = self.tasks();
        let before = tasks.len();
        tasks.retain(|task| task.id != id);

        if tasks.len() == before {
            return Err(BackendError::NotFound(format!("task {}", id)));
        }
        Ok(())
    }
}
