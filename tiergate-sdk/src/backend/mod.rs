//! Backend abstraction layer.
//!
//! Trait seams to the entitlement source and the task store:
//! - HTTP implementations over `tiergate-client`
//! - In-memory mocks for testing

pub mod http;
pub mod mock;
pub mod traits;

pub use mock::{MockEntitlementSource, MockTaskStore};
pub use traits::{BackendError, EntitlementSource, TaskStore};
