//! Shared session handle with serialized task creation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::{Result, SessionError};
use crate::session::{CreateOutcome, Session};

/// Cloneable handle to one session.
///
/// At most one task creation runs at a time; a second submission while the
/// first is unresolved is refused rather than queued.
#[derive(Clone)]
pub struct SessionHandle {
    session: Arc<Mutex<Session>>,
    submitting: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            submitting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a creation is in flight; the submit affordance is disabled
    /// while this is true.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    /// Submit a task creation.
    pub async fn submit(&self, title: &str, description: &str) -> Result<CreateOutcome> {
        if self
            .submitting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Submission refused, another creation is in flight");
            return Err(SessionError::SubmissionInFlight);
        }
        let _in_flight = InFlight(&self.submitting);

        let mut session = self.session.lock().await;
        session.create_task(title, description).await
    }

    /// Exclusive access for everything other than creation
    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().await
    }

    /// Exclusive access if nothing holds the session right now.
    ///
    /// `None` while a creation is running.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Session>> {
        self.session.try_lock().ok()
    }
}

/// Clears the in-flight flag however the submission ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockEntitlementSource, MockTaskStore};
    use crate::grant::RawMeteredGrant;
    use crate::session::SessionConfig;

    #[tokio::test]
    async fn test_second_submission_refused_while_first_in_flight() {
        let source = Arc::new(
            MockEntitlementSource::new()
                .with_metered("feature-task-hourly-limit", RawMeteredGrant::limited(5, 0))
                .with_metered("feature-task-total-limit-3", RawMeteredGrant::limited(10, 0)),
        );
        let store = Arc::new(MockTaskStore::new().with_gated_creates());
        let session = Session::start(SessionConfig::default(), source, store.clone()).await;
        let handle = SessionHandle::new(session);

        let first = tokio::spawn({
            let handle = handle.clone();
            async move { handle.submit("first", "").await }
        });

        while store.create_calls() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(handle.is_submitting());
        assert!(handle.try_lock().is_none());

        let second = handle.submit("second", "").await;
        assert!(matches!(second, Err(SessionError::SubmissionInFlight)));

        store.release_create();
        let first = first.await.unwrap().unwrap();
        assert!(matches!(first, CreateOutcome::Created(_)));
        assert!(!handle.is_submitting());

        let session = handle.try_lock().expect("session free after creation");
        assert_eq!(session.ledger().hourly_count, 1);
        assert_eq!(session.tasks().len(), 1);
        assert_eq!(store.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_flag_cleared_after_failure() {
        let source = Arc::new(MockEntitlementSource::new());
        let store = Arc::new(MockTaskStore::new());
        store.set_fail_creates(true);
        let session = Session::start(SessionConfig::default(), source, store).await;
        let handle = SessionHandle::new(session);

        assert!(handle.submit("task", "").await.is_err());
        assert!(!handle.is_submitting());
    }
}
