//! # awsce-client
//!
//! SigV4-signed HTTP client for the AWS Cost Explorer API, implementing
//! [`awsce_core::CostExplorerApi`].
//!
//! ```no_run
//! use awsce_client::{load_config_file, CostExplorerClient};
//! use awsce_core::{CostExplorerNode, ExecuteOptions, ExecutionItem, NodeParameters};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = load_config_file("~/.config/awsce.json")
//!         .await?
//!         .into_builder()
//!         .build()
//!         .await?;
//!
//!     let node = CostExplorerNode::new(client);
//!     let params = NodeParameters::new()
//!         .with("timeStart", "2024-01-01")
//!         .with("timeEnd", "2024-02-01")
//!         .with("metrics", json!(["BlendedCost"]));
//!
//!     let output = node
//!         .execute(
//!             ExecutionItem::from_payloads(vec![json!({})]),
//!             &params,
//!             ExecuteOptions::default(),
//!         )
//!         .await?;
//!     println!("{}", output[0].json);
//!     Ok(())
//! }
//! ```

pub mod aws_error;
pub mod client;
pub mod config;

pub use client::{CostExplorerClient, CostExplorerClientBuilder};
pub use config::{load_config_file, ClientConfig, ConfigError};
