//! Execution items flowing through the node

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ItemError;

/// Error annotation attached to an item whose processing failed in
/// continue-on-failure mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDescriptor {
    /// Human-readable failure message
    pub message: String,
    /// Index of the item that failed
    pub item_index: usize,
}

impl ErrorDescriptor {
    pub fn new(message: impl Into<String>, item_index: usize) -> Self {
        Self {
            message: message.into(),
            item_index,
        }
    }

    /// Build a descriptor from an item failure
    pub fn from_item_error(error: &ItemError, item_index: usize) -> Self {
        Self::new(error.to_string(), item_index)
    }
}

/// One unit of data in the pipeline: a JSON payload plus its position.
///
/// Items are owned by the host runtime. The node replaces `json` with the
/// Cost Explorer response on success, or attaches `error` on a recorded
/// failure, leaving `json` and `index` untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionItem {
    /// Item payload
    pub json: Value,

    /// Index of the item in the host's input sequence. Parameter lookups
    /// and error descriptors use this index.
    pub index: usize,

    /// Set when processing this item failed and the run continued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDescriptor>,
}

impl ExecutionItem {
    /// Create an item with the given position and payload
    pub fn new(index: usize, json: Value) -> Self {
        Self {
            json,
            index,
            error: None,
        }
    }

    /// Wrap a sequence of payloads into items indexed by position
    pub fn from_payloads(payloads: impl IntoIterator<Item = Value>) -> Vec<Self> {
        payloads
            .into_iter()
            .enumerate()
            .map(|(index, json)| Self::new(index, json))
            .collect()
    }

    /// Returns true if a failure was recorded on this item
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Replace the payload with a successful result
    pub(crate) fn set_result(&mut self, payload: Value) {
        self.json = payload;
        self.error = None;
    }

    /// Attach a failure, keeping the original payload
    pub(crate) fn set_error(&mut self, descriptor: ErrorDescriptor) {
        self.error = Some(descriptor);
    }
}
