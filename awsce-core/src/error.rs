//! Error types for Cost Explorer node execution
//!
//! Errors are layered the same way the execution loop is:
//!
//! - [`ParameterError`] - a node parameter could not be resolved for an item
//! - [`ApiError`] - the Cost Explorer client reported a failure
//! - [`ItemError`] - everything that can go wrong while processing one item
//! - [`RunError`] - an [`ItemError`] that aborted the whole run, tagged with
//!   the index of the item that produced it

use thiserror::Error;

use crate::item::ExecutionItem;

/// Errors raised while resolving node parameters for a single item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// A required parameter has no value for this item
    #[error("missing required parameter '{name}'")]
    Missing { name: String },

    /// The parameter resolved to a JSON value of the wrong type
    #[error("parameter '{name}' must be {expected}, got {actual}")]
    WrongType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// The parameter has the right type but an unaccepted value
    #[error("invalid value '{value}' for parameter '{name}': {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    /// An expression in the parameter could not be evaluated
    #[error("expression error in parameter '{name}': {message}")]
    Expression { name: String, message: String },
}

impl ParameterError {
    /// Name of the parameter this error refers to
    pub fn parameter_name(&self) -> &str {
        match self {
            Self::Missing { name }
            | Self::WrongType { name, .. }
            | Self::InvalidValue { name, .. }
            | Self::Expression { name, .. } => name,
        }
    }
}

/// Errors reported by a Cost Explorer client.
///
/// Categories follow how a caller would react to them:
///
/// - [`ApiError::Authentication`] - fix credentials
/// - [`ApiError::Throttled`] - back off (the node itself never retries)
/// - [`ApiError::Validation`] - fix the request (bad dates, empty metrics, ...)
/// - [`ApiError::Unavailable`] - service-side failure
/// - [`ApiError::Network`] - transport failure before a response arrived
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Credentials were rejected or missing
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Request rate or quota exceeded
    #[error("throttled: {0}")]
    Throttled(String),

    /// The service rejected the request parameters
    #[error("validation error: {0}")]
    Validation(String),

    /// The service failed to process the request
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Connectivity or transport failure
    #[error("network error: {0}")]
    Network(String),

    /// The request or response body could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Returns true if this is an authentication error
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// Returns true if the request was throttled
    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled(_))
    }

    /// Returns true if the service rejected the request parameters
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if the service was unavailable
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Returns true if this is a network error
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Returns true if a later attempt could succeed without changes.
    ///
    /// The node never retries; this is information for the host.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Throttled(_) | Self::Unavailable(_) | Self::Network(_)
        )
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Everything that can fail while processing one item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    /// Parameter resolution failed
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// The operation selector is not one the node supports
    #[error("unsupported operation '{operation}' for item {item_index}")]
    UnsupportedOperation { operation: String, item_index: usize },

    /// The Cost Explorer call failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ItemError {
    /// Returns true if this is an unsupported operation error
    pub fn is_unsupported_operation(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }

    /// Returns true if this error came from the Cost Explorer client
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api(_))
    }

    /// Returns true if this error came from parameter resolution
    pub fn is_parameter(&self) -> bool {
        matches!(self, Self::Parameter(_))
    }
}

/// A per-item failure that stopped the run.
///
/// Only produced when continue-on-failure is off. Items before the failing
/// one keep whatever outcome they already had; items after it were never
/// attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("item {item_index}: {source}")]
pub struct RunError {
    /// Index of the item that failed
    pub item_index: usize,
    /// The underlying failure
    #[source]
    pub source: ItemError,
    /// Items processed before the failure, with their results.
    ///
    /// Filled by [`CostExplorerNode::execute`](crate::CostExplorerNode::execute),
    /// which owns the batch. Empty when the caller owns the items.
    pub completed: Vec<ExecutionItem>,
}

impl RunError {
    pub fn new(item_index: usize, source: ItemError) -> Self {
        Self {
            item_index,
            source,
            completed: Vec::new(),
        }
    }

    /// Attach the items that completed before the failure
    pub fn with_completed(mut self, completed: Vec<ExecutionItem>) -> Self {
        self.completed = completed;
        self
    }
}
