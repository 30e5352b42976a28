//! HTTP client for the entitlement source API

use crate::error::{ClientError, Result};
use crate::tasks::handle_response;
use crate::types::*;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::debug;

/// HTTP client for the entitlement source
///
/// Bound to a single customer for its whole lifetime.
pub struct EntitlementClient {
    config: EntitlementConfig,
    client: Client,
}

impl EntitlementClient {
    /// Create a new entitlement client
    pub fn new(config: EntitlementConfig) -> Result<Self> {
        if config.customer_id.trim().is_empty() {
            return Err(ClientError::Config("customer_id must not be empty".into()));
        }

        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| ClientError::Config("API key is not a valid header value".into()))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Customer this client resolves grants for
    pub fn customer_id(&self) -> &str {
        &self.config.customer_id
    }

    /// Poll the health probe until the source answers, or give up after
    /// `ready_attempts` probes.
    pub async fn wait_for_ready(&self) -> Result<()> {
        let url = format!("{}/v1/health", self.config.base_url);
        let attempts = self.config.ready_attempts.max(1);

        for attempt in 1..=attempts {
            match self.client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(attempt, "Entitlement source ready");
                    return Ok(());
                }
                Ok(response) => {
                    debug!(attempt, status = response.status().as_u16(), "Entitlement source not ready");
                }
                Err(e) => {
                    debug!(attempt, error = %e, "Entitlement source unreachable");
                }
            }

            if attempt < attempts {
                tokio::time::sleep(Duration::from_millis(self.config.ready_backoff_ms)).await;
            }
        }

        Err(ClientError::NotReady { attempts })
    }

    /// Ask the source to drop anything cached for this customer
    pub async fn refresh(&self) -> Result<()> {
        let url = format!(
            "{}/v1/customers/{}/refresh",
            self.config.base_url,
            urlencoding::encode(&self.config.customer_id)
        );

        let response = self.client.post(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status,
                message: body,
            });
        }
        Ok(())
    }

    /// Get the entitlement for one feature
    ///
    /// `requested_usage` asks a metered feature whether that much more usage
    /// would still be granted.
    pub async fn get_entitlement(
        &self,
        feature_id: &str,
        requested_usage: Option<u64>,
    ) -> Result<EntitlementResponse> {
        let mut url = format!(
            "{}/v1/customers/{}/entitlements/{}",
            self.config.base_url,
            urlencoding::encode(&self.config.customer_id),
            urlencoding::encode(feature_id)
        );

        if let Some(requested) = requested_usage {
            url.push_str(&format!("?requestedUsage={}", requested));
        }

        let response = self.client.get(&url).send().await?;
        handle_response(response).await
    }

    /// Report consumed usage for a metered feature
    pub async fn report_usage(&self, feature_id: &str, value: u64) -> Result<()> {
        let url = format!("{}/v1/usage", self.config.base_url);
        let body = UsageReport {
            customer_id: self.config.customer_id.clone(),
            feature_id: feature_id.to_string(),
            value,
        };

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status,
                message: body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_customer_rejected() {
        let result = EntitlementClient::new(EntitlementConfig::default());
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_customer_id_kept() {
        let client = EntitlementClient::new(EntitlementConfig {
            customer_id: "customer-42".into(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(client.customer_id(), "customer-42");
    }
}
