//! Configuration for Tiergate
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Args as ClapArgs, Parser};
use std::time::Duration;
use tiergate_client::{EntitlementConfig, TaskStoreConfig};
use tiergate_sdk::{Fallbacks, FeatureIds, SessionConfig};

/// Tiergate - task list session with tiered entitlements
#[derive(Parser, Debug, Clone)]
#[command(name = "tiergate")]
#[command(about = "Task list session gated by per-customer entitlements")]
pub struct Args {
    /// Signed-in customer the session resolves grants for
    #[arg(long, env = "CUSTOMER_ID")]
    pub customer_id: String,

    /// Task store base URL
    #[arg(long, env = "TASK_STORE_URL", default_value = "http://localhost:8000")]
    pub task_store_url: String,

    /// Entitlement source base URL
    #[arg(long, env = "ENTITLEMENTS_URL", default_value = "http://localhost:8100")]
    pub entitlements_url: String,

    /// API key for the entitlement source (sent as a bearer token)
    #[arg(long, env = "ENTITLEMENTS_API_KEY")]
    pub entitlements_api_key: Option<String>,

    /// Feature identifiers
    #[command(flatten)]
    pub features: FeatureArgs,

    /// Budget for one entitlement refresh in milliseconds; past it the
    /// previous grants are kept
    #[arg(long, env = "REFRESH_TIMEOUT_MS", default_value = "3000")]
    pub refresh_timeout_ms: u64,

    /// How long startup waits for the entitlement source in milliseconds
    #[arg(long, env = "READY_TIMEOUT_MS", default_value = "10000")]
    pub ready_timeout_ms: u64,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Feature identifiers at the entitlement source
#[derive(ClapArgs, Debug, Clone)]
pub struct FeatureArgs {
    #[arg(
        long = "feature-description-limit",
        env = "FEATURE_DESCRIPTION_LIMIT",
        default_value = "feature-description-char-limit"
    )]
    pub description_limit: String,

    #[arg(
        long = "feature-display-toggle",
        env = "FEATURE_DISPLAY_TOGGLE",
        default_value = "feature-dark-mode"
    )]
    pub display_toggle: String,

    #[arg(
        long = "feature-hourly-quota",
        env = "FEATURE_HOURLY_QUOTA",
        default_value = "feature-task-hourly-limit"
    )]
    pub hourly_quota: String,

    #[arg(
        long = "feature-lifetime-quota",
        env = "FEATURE_LIFETIME_QUOTA",
        default_value = "feature-task-total-limit-3"
    )]
    pub lifetime_quota: String,
}

impl FeatureArgs {
    fn ids(&self) -> FeatureIds {
        FeatureIds {
            description_limit: self.description_limit.clone(),
            display_toggle: self.display_toggle.clone(),
            hourly_quota: self.hourly_quota.clone(),
            lifetime_quota: self.lifetime_quota.clone(),
        }
    }
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.customer_id.trim().is_empty() {
            return Err("CUSTOMER_ID must not be empty".to_string());
        }

        for (name, url) in [
            ("TASK_STORE_URL", &self.task_store_url),
            ("ENTITLEMENTS_URL", &self.entitlements_url),
        ] {
            let parsed =
                reqwest::Url::parse(url).map_err(|e| format!("{} is not a valid URL: {}", name, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(format!("{} must use http or https", name));
            }
        }

        let ids = self.features.ids();
        if [
            &ids.description_limit,
            &ids.display_toggle,
            &ids.hourly_quota,
            &ids.lifetime_quota,
        ]
        .iter()
        .any(|id| id.trim().is_empty())
        {
            return Err("Feature identifiers must not be empty".to_string());
        }

        if self.refresh_timeout_ms == 0 {
            return Err("REFRESH_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn task_store_config(&self) -> TaskStoreConfig {
        TaskStoreConfig {
            base_url: self.task_store_url.trim_end_matches('/').to_string(),
            timeout_secs: self.request_timeout_secs,
        }
    }

    pub fn entitlement_config(&self) -> EntitlementConfig {
        EntitlementConfig {
            base_url: self.entitlements_url.trim_end_matches('/').to_string(),
            customer_id: self.customer_id.trim().to_string(),
            api_key: self.entitlements_api_key.clone(),
            timeout_secs: self.request_timeout_secs,
            ..Default::default()
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            features: self.features.ids(),
            fallbacks: &Fallbacks::STATIC,
            ready_timeout: Duration::from_millis(self.ready_timeout_ms),
            refresh_timeout: Duration::from_millis(self.refresh_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["tiergate", "--customer-id", "customer-42"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);

        assert!(args.validate().is_ok());
        assert_eq!(args.session_config().features, FeatureIds::default());
        assert_eq!(args.session_config().refresh_timeout, Duration::from_secs(3));
        assert_eq!(args.task_store_config().base_url, "http://localhost:8000");
    }

    #[test]
    fn test_rejects_blank_customer() {
        let args = Args::parse_from(["tiergate", "--customer-id", "  "]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_url() {
        let args = parse(&["--task-store-url", "localhost:8000/tasks"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let args = parse(&["--entitlements-url", "http://entitlements.local/"]);
        assert_eq!(args.entitlement_config().base_url, "http://entitlements.local");
    }
}
