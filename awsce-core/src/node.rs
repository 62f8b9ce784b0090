//! The Cost Explorer node: per-item dispatch loop
//!
//! Items are processed strictly in order. For each item the node resolves its
//! parameters, builds a request, awaits the client and folds the outcome back
//! into the item before moving on. Nothing is retried.
//!
//! ```text
//! Pending -> Resolving -> Dispatching -> Succeeded
//!                                     -> Failed (recorded)   continue-on-failure
//!                                     -> Failed (fatal)      otherwise; run stops
//! ```
//!
//! Dropping the future returned by [`CostExplorerNode::execute`] cancels the
//! run; items that were not yet dispatched are never started.

use serde_json::Value;
use std::sync::Arc;

use crate::client::CostExplorerApi;
use crate::error::{ItemError, RunError};
use crate::item::{ErrorDescriptor, ExecutionItem};
use crate::parameters::{resolve_operation, resolve_parameters, NodeParameters, ParameterSource};
use crate::request::CostExplorerRequest;
use crate::types::Operation;

/// Run-level settings supplied by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Record per-item failures on the item and keep going instead of
    /// aborting the run
    pub continue_on_fail: bool,
}

impl ExecuteOptions {
    /// Abort on the first failing item (the default)
    pub fn stop_on_fail() -> Self {
        Self {
            continue_on_fail: false,
        }
    }

    /// Record failures and process every item
    pub fn continue_on_fail() -> Self {
        Self {
            continue_on_fail: true,
        }
    }
}

/// Result of processing one item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Raw Cost Explorer response
    Succeeded(Value),
    /// The item failed
    Failed { error: ItemError, item_index: usize },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// Node that answers Cost Explorer queries for each input item.
///
/// ```ignore
/// use awsce_core::{CostExplorerNode, ExecuteOptions, ExecutionItem, NodeParameters};
/// use serde_json::json;
///
/// let node = CostExplorerNode::new(client);
/// let params = NodeParameters::new()
///     .with("operation", "GetCostAndUsage")
///     .with("timeStart", "2023-01-01")
///     .with("timeEnd", "2023-02-01")
///     .with("granularity", "MONTHLY")
///     .with("metrics", json!(["BlendedCost"]));
///
/// let items = ExecutionItem::from_payloads(vec![json!({})]);
/// let output = node.execute(items, &params, ExecuteOptions::default()).await?;
/// ```
#[derive(Clone)]
pub struct CostExplorerNode {
    client: Arc<dyn CostExplorerApi>,
}

impl CostExplorerNode {
    /// Create a node around a client
    pub fn new(client: impl CostExplorerApi + 'static) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Create a node around an already shared client handle
    pub fn from_shared(client: Arc<dyn CostExplorerApi>) -> Self {
        Self { client }
    }

    /// Process a batch of items using JSON node parameters.
    ///
    /// Expressions in `params` are evaluated against the input payloads.
    /// Returns every item in order. On a fatal failure the returned
    /// [`RunError`] names the item and carries the items processed before it
    /// in [`RunError::completed`].
    pub async fn execute(
        &self,
        mut items: Vec<ExecutionItem>,
        params: &NodeParameters,
        options: ExecuteOptions,
    ) -> Result<Vec<ExecutionItem>, RunError> {
        let source = params.for_items(&items);
        match self.run(&mut items, &source, options).await {
            Ok(()) => Ok(items),
            Err((position, error)) => {
                items.truncate(position);
                Err(error.with_completed(items))
            }
        }
    }

    /// Process items in place.
    ///
    /// Each item is looked up and reported by its own `index`. Successful
    /// items have their payload replaced by the response. In
    /// continue-on-failure mode failed items get an [`ErrorDescriptor`] and
    /// keep their payload. Otherwise the first failure is returned and the
    /// remaining items are left untouched and unattempted.
    pub async fn execute_in_place(
        &self,
        items: &mut [ExecutionItem],
        params: &dyn ParameterSource,
        options: ExecuteOptions,
    ) -> Result<(), RunError> {
        self.run(items, params, options)
            .await
            .map_err(|(_, error)| error)
    }

    /// Dispatch loop. A fatal failure comes back with the slice position of
    /// the failing item.
    async fn run(
        &self,
        items: &mut [ExecutionItem],
        params: &dyn ParameterSource,
        options: ExecuteOptions,
    ) -> Result<(), (usize, RunError)> {
        log::debug!(
            "cost explorer run: {} item(s), continue_on_fail={}",
            items.len(),
            options.continue_on_fail
        );

        for (position, item) in items.iter_mut().enumerate() {
            match self.process_item(params, item.index).await {
                ItemOutcome::Succeeded(payload) => {
                    log::debug!("item {}: succeeded", item.index);
                    item.set_result(payload);
                }
                ItemOutcome::Failed { error, item_index } if options.continue_on_fail => {
                    log::warn!("item {}: failed, recorded: {}", item_index, error);
                    item.set_error(ErrorDescriptor::from_item_error(&error, item_index));
                }
                ItemOutcome::Failed { error, item_index } => {
                    log::error!("item {}: failed, aborting run: {}", item_index, error);
                    return Err((position, RunError::new(item_index, error)));
                }
            }
        }

        Ok(())
    }

    /// Resolve, build and dispatch the request for a single item
    pub async fn process_item(
        &self,
        params: &dyn ParameterSource,
        item_index: usize,
    ) -> ItemOutcome {
        match self.try_process_item(params, item_index).await {
            Ok(payload) => ItemOutcome::Succeeded(payload),
            Err(error) => ItemOutcome::Failed { error, item_index },
        }
    }

    async fn try_process_item(
        &self,
        params: &dyn ParameterSource,
        item_index: usize,
    ) -> Result<Value, ItemError> {
        log::trace!("item {}: resolving parameters", item_index);

        // An unsupported operation wins over any other parameter problem
        let operation = resolve_operation(params, item_index)?;
        if let Err(operation) = operation.parse::<Operation>() {
            return Err(ItemError::UnsupportedOperation {
                operation,
                item_index,
            });
        }

        let resolved = resolve_parameters(params, item_index)?;
        let request = CostExplorerRequest::build(&resolved, item_index)?;

        log::debug!(
            "item {}: dispatching {} ({} to {}, {})",
            item_index,
            request.operation(),
            resolved.time_window.start,
            resolved.time_window.end,
            resolved.granularity
        );
        let response = self.client.send(&request).await?;

        Ok(response)
    }
}

impl std::fmt::Debug for CostExplorerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostExplorerNode").finish_non_exhaustive()
    }
}
