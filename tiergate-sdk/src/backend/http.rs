//! Backends over the HTTP clients

use async_trait::async_trait;
use tiergate_client::{
    ClientError, EntitlementClient, EntitlementResponse, Task, TaskCreate, TaskStoreClient,
    TaskUpdate,
};

use super::traits::*;
use crate::grant::{AccessDeniedReason, RawBooleanGrant, RawMeteredGrant, RawNumericGrant};

impl From<ClientError> for BackendError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) => BackendError::Network(e.to_string()),
            ClientError::Json(e) => BackendError::Parse(e.to_string()),
            ClientError::Server { status, message } => BackendError::Rejected { status, message },
            ClientError::NotFound(what) => BackendError::NotFound(what),
            ClientError::NotReady { attempts } => {
                BackendError::Unavailable(format!("not ready after {} attempts", attempts))
            }
            ClientError::Config(message) => BackendError::Unavailable(message),
        }
    }
}

fn metered_from_response(response: EntitlementResponse) -> RawMeteredGrant {
    RawMeteredGrant {
        has_access: response.has_access.into(),
        usage_limit: response.usage_limit.into(),
        is_unlimited: response.is_unlimited.into(),
        current_usage: response.current_usage.into(),
        usage_period_end: response.usage_period_end.into(),
        access_denied_reason: response
            .access_denied_reason
            .as_deref()
            .map(AccessDeniedReason::from_wire)
            .into(),
    }
}

#[async_trait]
impl EntitlementSource for EntitlementClient {
    async fn wait_for_ready(&self) -> Result<(), BackendError> {
        Ok(EntitlementClient::wait_for_ready(self).await?)
    }

    async fn refresh(&self) -> Result<(), BackendError> {
        Ok(EntitlementClient::refresh(self).await?)
    }

    async fn get_numeric(&self, feature_id: &str) -> Result<RawNumericGrant, BackendError> {
        let response = self.get_entitlement(feature_id, None).await?;
        Ok(RawNumericGrant {
            value: response.value.into(),
        })
    }

    async fn get_boolean(&self, feature_id: &str) -> Result<RawBooleanGrant, BackendError> {
        let response = self.get_entitlement(feature_id, None).await?;
        Ok(RawBooleanGrant {
            has_access: response.has_access.into(),
        })
    }

    async fn get_metered(
        &self,
        feature_id: &str,
        requested_usage: Option<u64>,
    ) -> Result<RawMeteredGrant, BackendError> {
        let response = self.get_entitlement(feature_id, requested_usage).await?;
        Ok(metered_from_response(response))
    }

    async fn report_usage(&self, feature_id: &str, value: u64) -> Result<(), BackendError> {
        Ok(EntitlementClient::report_usage(self, feature_id, value).await?)
    }
}

#[async_trait]
impl TaskStore for TaskStoreClient {
    async fn list(&self) -> Result<Vec<Task>, BackendError> {
        Ok(self.list_tasks().await?)
    }

    async fn create(&self, input: TaskCreate) -> Result<Task, BackendError> {
        Ok(self.create_task(&input).await?)
    }

    async fn update(&self, id: u64, update: TaskUpdate) -> Result<Task, BackendError> {
        Ok(self.update_task(id, &update).await?)
    }

    async fn delete(&self, id: u64) -> Result<(), BackendError> {
        Ok(self.delete_task(id).await?)
    }
}
