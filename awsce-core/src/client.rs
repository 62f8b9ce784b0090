//! The Cost Explorer client seam
//!
//! The node never talks to AWS directly. It hands each built request to a
//! [`CostExplorerApi`] and passes the raw JSON response through unchanged.
//! Credentials, signing, transport and connection reuse are the client's
//! business.

use serde_json::Value;
use std::sync::Arc;

use crate::error::ApiError;
use crate::request::{CostExplorerRequest, GetCostAndUsageRequest, GetCostForecastRequest};

/// Trait for Cost Explorer clients
///
/// Implementations must be usable from a shared handle; the node holds one
/// `Arc<dyn CostExplorerApi>` for the whole run.
#[async_trait::async_trait]
pub trait CostExplorerApi: Send + Sync {
    /// Retrieve historical cost and usage
    async fn get_cost_and_usage(&self, request: &GetCostAndUsageRequest)
        -> Result<Value, ApiError>;

    /// Retrieve a cost forecast
    async fn get_cost_forecast(&self, request: &GetCostForecastRequest)
        -> Result<Value, ApiError>;

    /// Send any supported request
    async fn send(&self, request: &CostExplorerRequest) -> Result<Value, ApiError> {
        match request {
            CostExplorerRequest::CostAndUsage(req) => self.get_cost_and_usage(req).await,
            CostExplorerRequest::CostForecast(req) => self.get_cost_forecast(req).await,
        }
    }
}

// Implement CostExplorerApi for Arc<dyn CostExplorerApi> so shared handles can be passed
// wherever a client is expected
#[async_trait::async_trait]
impl CostExplorerApi for Arc<dyn CostExplorerApi> {
    async fn get_cost_and_usage(
        &self,
        request: &GetCostAndUsageRequest,
    ) -> Result<Value, ApiError> {
        (**self).get_cost_and_usage(request).await
    }

    async fn get_cost_forecast(
        &self,
        request: &GetCostForecastRequest,
    ) -> Result<Value, ApiError> {
        (**self).get_cost_forecast(request).await
    }
}
