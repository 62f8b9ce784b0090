//! Cost Explorer request payloads
//!
//! Each item gets its own freshly built request. Field names serialize in the
//! Cost Explorer wire format (`TimePeriod`, `Granularity`, `Metrics`/`Metric`).

use serde::{Deserialize, Serialize};

use crate::error::ItemError;
use crate::parameters::ResolvedParameters;
use crate::types::{Granularity, Operation, TimeWindow};

/// Payload for `GetCostAndUsage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetCostAndUsageRequest {
    pub time_period: TimeWindow,
    pub granularity: Granularity,
    pub metrics: Vec<String>,
}

/// Payload for `GetCostForecast`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetCostForecastRequest {
    pub time_period: TimeWindow,
    pub granularity: Granularity,
    /// First configured metric. Left unset when no metric was configured so
    /// the service reports the problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
}

/// A request for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostExplorerRequest {
    CostAndUsage(GetCostAndUsageRequest),
    CostForecast(GetCostForecastRequest),
}

impl CostExplorerRequest {
    /// Build the request for item `item_index` from its resolved parameters.
    ///
    /// Fails with [`ItemError::UnsupportedOperation`] when the operation
    /// selector is not a supported [`Operation`]. Forecasts use only the first
    /// metric; any further metrics are ignored.
    pub fn build(params: &ResolvedParameters, item_index: usize) -> Result<Self, ItemError> {
        let operation: Operation =
            params
                .operation
                .parse()
                .map_err(|operation| ItemError::UnsupportedOperation {
                    operation,
                    item_index,
                })?;

        let request = match operation {
            Operation::GetCostAndUsage => Self::CostAndUsage(GetCostAndUsageRequest {
                time_period: params.time_window.clone(),
                granularity: params.granularity,
                metrics: params.metrics.as_slice().to_vec(),
            }),
            Operation::GetCostForecast => Self::CostForecast(GetCostForecastRequest {
                time_period: params.time_window.clone(),
                granularity: params.granularity,
                metric: params.metrics.first().map(str::to_string),
            }),
        };

        Ok(request)
    }

    /// Operation this request targets
    pub fn operation(&self) -> Operation {
        match self {
            Self::CostAndUsage(_) => Operation::GetCostAndUsage,
            Self::CostForecast(_) => Operation::GetCostForecast,
        }
    }

    /// Wire body of the request
    pub fn to_body(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::CostAndUsage(req) => serde_json::to_value(req),
            Self::CostForecast(req) => serde_json::to_value(req),
        }
    }
}
