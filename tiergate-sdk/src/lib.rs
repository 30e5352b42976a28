//! Tiergate SDK - entitlement resolution and usage gating
//!
//! A session for one signed-in customer resolves that customer's feature
//! grants from a remote entitlement source, keeps local usage counters in
//! step with it, and decides before every task creation whether the
//! customer may proceed or must see a paywall notice.
//!
//! ## Pieces
//!
//! - [`EntitlementSnapshot`]: the four resolved grants, each falling back to
//!   a static default field by field
//! - [`UsageLedger`]: hourly and lifetime creation counters
//! - [`gate::evaluate`]: pure Allow/Deny decision
//! - [`Paywall`]: which denial notice is visible
//! - [`Session`]: sequences the above around the remote calls
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tiergate_client::{EntitlementClient, EntitlementConfig, TaskStoreClient, TaskStoreConfig};
//! use tiergate_sdk::{CreateOutcome, Session, SessionConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let entitlements = EntitlementClient::new(EntitlementConfig {
//!     customer_id: "customer-42".into(),
//!     ..Default::default()
//! })?;
//! let store = TaskStoreClient::new(TaskStoreConfig::default())?;
//!
//! let mut session = Session::start(
//!     SessionConfig::default(),
//!     Arc::new(entitlements),
//!     Arc::new(store),
//! )
//! .await;
//!
//! match session.create_task("Buy milk", "Oat").await? {
//!     CreateOutcome::Created(task) => println!("created {}", task.id),
//!     CreateOutcome::Denied(notice) => println!("paywall: {:?}", notice),
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod features;
pub mod gate;
pub mod grant;
pub mod ledger;
pub mod paywall;
pub mod session;
pub mod snapshot;
pub mod submit;
pub mod view;

pub use backend::{BackendError, EntitlementSource, TaskStore};
pub use error::{Result, SessionError};
pub use features::{Fallbacks, FeatureIds, FeatureKey};
pub use gate::{Action, Decision, DenyReason, QuotaDenial, QuotaKind};
pub use grant::{
    AccessDeniedReason, BooleanGrant, FeatureGrant, MeteredGrant, NumericGrant, Reported,
    UsageLimit,
};
pub use ledger::UsageLedger;
pub use paywall::{Paywall, PaywallNotice, PaywallState};
pub use session::{CreateOutcome, DisplayToggle, RefreshOutcome, Session, SessionConfig};
pub use snapshot::{Answer, EntitlementSnapshot, RawGrants};
pub use submit::SessionHandle;
pub use view::{clamp_description, DescriptionCounter, NoticeText, SessionView};
