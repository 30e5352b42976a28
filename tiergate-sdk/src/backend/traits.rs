//! Seams to the two remote collaborators.
//!
//! The session only ever talks to `dyn EntitlementSource` and
//! `dyn TaskStore`, handed in at construction.

use async_trait::async_trait;
use tiergate_client::{Task, TaskCreate, TaskUpdate};

use crate::grant::{RawBooleanGrant, RawMeteredGrant, RawNumericGrant};

/// Error types for backend calls.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Collaborator is not ready or not configured
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Collaborator answered with a failure status
    #[error("Rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Parsing error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl BackendError {
    /// The collaborator answered, and there is nothing under that name.
    ///
    /// Every other variant means the call itself went wrong.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound(_))
    }
}

/// Source of per-customer feature grants.
///
/// Grants come back raw; fallbacks are applied by the snapshot builder.
#[async_trait]
pub trait EntitlementSource: Send + Sync {
    /// Wait until the source can answer queries.
    async fn wait_for_ready(&self) -> Result<(), BackendError>;

    /// Drop anything the source cached for this customer.
    async fn refresh(&self) -> Result<(), BackendError>;

    async fn get_numeric(&self, feature_id: &str) -> Result<RawNumericGrant, BackendError>;

    async fn get_boolean(&self, feature_id: &str) -> Result<RawBooleanGrant, BackendError>;

    /// Get a metered grant, optionally asking whether `requested_usage` more
    /// units would still be granted.
    async fn get_metered(
        &self,
        feature_id: &str,
        requested_usage: Option<u64>,
    ) -> Result<RawMeteredGrant, BackendError>;

    /// Report consumed units of a metered feature.
    async fn report_usage(&self, feature_id: &str, value: u64) -> Result<(), BackendError>;
}

/// Remote task persistence.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>, BackendError>;

    async fn create(&self, input: TaskCreate) -> Result<Task, BackendError>;

    async fn update(&self, id: u64, update: TaskUpdate) -> Result<Task, BackendError>;

    async fn delete(&self, id: u64) -> Result<(), BackendError>;
}
