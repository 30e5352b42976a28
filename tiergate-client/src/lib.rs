//! HTTP clients for the two remote collaborators of a tiergate session
//!
//! - [`TaskStoreClient`]: CRUD over the task list (`/tasks`)
//! - [`EntitlementClient`]: per-customer feature grants, refresh and usage
//!   reporting (`/v1/...`)
//!
//! # Example
//!
//! ```rust,no_run
//! use tiergate_client::{EntitlementClient, EntitlementConfig, TaskStoreClient, TaskStoreConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tasks = TaskStoreClient::new(TaskStoreConfig::default())?;
//! let all = tasks.list_tasks().await?;
//!
//! let entitlements = EntitlementClient::new(EntitlementConfig {
//!     customer_id: "customer-42".into(),
//!     ..Default::default()
//! })?;
//! entitlements.wait_for_ready().await?;
//! let grant = entitlements
//!     .get_entitlement("feature-task-hourly-limit", Some(1))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod entitlements;
pub mod error;
pub mod tasks;
pub mod types;

pub use entitlements::EntitlementClient;
pub use error::{ClientError, Result};
pub use tasks::TaskStoreClient;
pub use types::*;
