//! Test utilities for awsce-core.
//!
//! Enable with the `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! awsce-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust
//! use awsce_core::test_utils::MockCostExplorer;
//! use awsce_core::ApiError;
//! use serde_json::json;
//!
//! let client = MockCostExplorer::new()
//!     .with_response(json!({"ResultsByTime": []}))
//!     .with_error(ApiError::Throttled("Rate exceeded".into()));
//! assert_eq!(client.call_count(), 0);
//! ```

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::client::CostExplorerApi;
use crate::error::ApiError;
use crate::request::{CostExplorerRequest, GetCostAndUsageRequest, GetCostForecastRequest};

/// A mock Cost Explorer client.
///
/// Returns pre-programmed outcomes in order and records every request it
/// receives. Clones share the same queue and log.
#[derive(Clone, Default)]
pub struct MockCostExplorer {
    outcomes: Arc<Mutex<VecDeque<Result<Value, ApiError>>>>,
    requests: Arc<Mutex<Vec<CostExplorerRequest>>>,
}

impl MockCostExplorer {
    /// Create a mock with no programmed outcomes
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    pub fn with_response(self, response: Value) -> Self {
        self.outcomes.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Queue a failure
    pub fn with_error(self, error: ApiError) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<CostExplorerRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of calls made
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next(&self, request: CostExplorerRequest) -> Result<Value, ApiError> {
        self.requests.lock().unwrap().push(request);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ApiError::Other(
                    "MockCostExplorer: No more responses configured".to_string(),
                ))
            })
    }
}

#[async_trait::async_trait]
impl CostExplorerApi for MockCostExplorer {
    async fn get_cost_and_usage(
        &self,
        request: &GetCostAndUsageRequest,
    ) -> Result<Value, ApiError> {
        self.next(CostExplorerRequest::CostAndUsage(request.clone()))
    }

    async fn get_cost_forecast(
        &self,
        request: &GetCostForecastRequest,
    ) -> Result<Value, ApiError> {
        self.next(CostExplorerRequest::CostForecast(request.clone()))
    }
}

/// Sample `GetCostAndUsage` response body
pub fn sample_cost_and_usage_response() -> Value {
    serde_json::json!({
        "GroupDefinitions": [],
        "ResultsByTime": [{
            "TimePeriod": {"Start": "2023-01-01", "End": "2023-02-01"},
            "Total": {"BlendedCost": {"Amount": "123.45", "Unit": "USD"}},
            "Groups": [],
            "Estimated": false
        }],
        "DimensionValueAttributes": []
    })
}

/// Sample `GetCostForecast` response body
pub fn sample_forecast_response() -> Value {
    serde_json::json!({
        "Total": {"Amount": "456.78", "Unit": "USD"},
        "ForecastResultsByTime": [{
            "TimePeriod": {"Start": "2023-01-01", "End": "2023-02-01"},
            "MeanValue": "456.78"
        }]
    })
}
