//! # awsce-core
//!
//! Per-item AWS Cost Explorer queries for workflow pipelines.
//!
//! A workflow host hands the node an ordered batch of items and a way to look
//! up node parameters per item. For each item the node resolves the time
//! window, granularity, metrics and operation, builds a Cost Explorer request,
//! sends it through a [`CostExplorerApi`] client and writes the raw response
//! back onto the item.
//!
//! ## Quick Start
//!
//! ```ignore
//! use awsce_core::{CostExplorerNode, ExecuteOptions, ExecutionItem, NodeParameters};
//! use awsce_client::CostExplorerClient;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let node = CostExplorerNode::new(CostExplorerClient::new().await?);
//!
//!     let params = NodeParameters::new()
//!         .with("operation", "GetCostForecast")
//!         .with("timeStart", "={{ $json.from }}")
//!         .with("timeEnd", "={{ $json.to }}")
//!         .with("granularity", "MONTHLY")
//!         .with("metrics", json!(["UNBLENDED_COST"]));
//!
//!     let items = ExecutionItem::from_payloads(vec![
//!         json!({"from": "2024-01-01", "to": "2024-04-01"}),
//!     ]);
//!
//!     let output = node
//!         .execute(items, &params, ExecuteOptions::continue_on_fail())
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&output)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `test-utils` - [`test_utils::MockCostExplorer`] for testing without AWS

pub mod client;
pub mod error;
pub mod expression;
pub mod item;
pub mod node;
pub mod parameters;
pub mod request;
pub mod types;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use client::CostExplorerApi;
pub use error::{ApiError, ItemError, ParameterError, RunError};
pub use item::{ErrorDescriptor, ExecutionItem};
pub use node::{CostExplorerNode, ExecuteOptions, ItemOutcome};
pub use parameters::{
    metrics_from_value, names, resolve_operation, resolve_parameters, ItemParameters, NodeParameters,
    ParameterSource, ResolvedParameters,
};
pub use request::{CostExplorerRequest, GetCostAndUsageRequest, GetCostForecastRequest};
pub use types::{Granularity, MetricList, Operation, TimeWindow};
