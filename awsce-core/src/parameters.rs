//! Per-item parameter resolution
//!
//! The host exposes node parameters through [`ParameterSource`], keyed by
//! parameter name and item index. [`resolve_parameters`] reads the five
//! parameters the node needs and turns them into typed values.
//!
//! [`NodeParameters`] is a JSON-backed source: a map of parameter values where
//! any value may be an [expression](crate::expression) evaluated against the
//! item's input payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::ParameterError;
use crate::expression::{self, ExpressionContext};
use crate::item::ExecutionItem;
use crate::types::{Granularity, MetricList, Operation, TimeWindow};

/// Parameter names as configured on the node
pub mod names {
    pub const OPERATION: &str = "operation";
    pub const TIME_START: &str = "timeStart";
    pub const TIME_END: &str = "timeEnd";
    pub const GRANULARITY: &str = "granularity";
    pub const METRICS: &str = "metrics";
}

/// Typed lookup of node parameters for one item.
///
/// Returning `Ok(None)` (or `Ok(Some(Value::Null))`) means the parameter is
/// not set for that item.
pub trait ParameterSource: Send + Sync {
    fn parameter(&self, name: &str, item_index: usize) -> Result<Option<Value>, ParameterError>;
}

impl<F> ParameterSource for F
where
    F: Fn(&str, usize) -> Result<Option<Value>, ParameterError> + Send + Sync,
{
    fn parameter(&self, name: &str, item_index: usize) -> Result<Option<Value>, ParameterError> {
        self(name, item_index)
    }
}

/// Parameters resolved for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParameters {
    /// Raw operation selector. Checked against [`Operation`] when the request
    /// is built so the failure can name the item.
    pub operation: String,
    pub time_window: TimeWindow,
    pub granularity: Granularity,
    pub metrics: MetricList,
}

/// Read the raw operation selector for item `item_index`.
///
/// Defaults to `GetCostAndUsage` when unset. The value is not checked against
/// [`Operation`] here.
pub fn resolve_operation(
    source: &dyn ParameterSource,
    item_index: usize,
) -> Result<String, ParameterError> {
    Ok(optional_string(source, names::OPERATION, item_index)?
        .unwrap_or_else(|| Operation::GetCostAndUsage.as_str().to_string()))
}

/// Resolve every node parameter for item `item_index`
pub fn resolve_parameters(
    source: &dyn ParameterSource,
    item_index: usize,
) -> Result<ResolvedParameters, ParameterError> {
    let operation = resolve_operation(source, item_index)?;

    let start = required_string(source, names::TIME_START, item_index)?;
    let end = required_string(source, names::TIME_END, item_index)?;

    let granularity = match optional_string(source, names::GRANULARITY, item_index)? {
        Some(value) => value
            .parse::<Granularity>()
            .map_err(|reason| ParameterError::InvalidValue {
                name: names::GRANULARITY.to_string(),
                value,
                reason,
            })?,
        None => Granularity::default(),
    };

    let metrics = match lookup(source, names::METRICS, item_index)? {
        Some(value) => metrics_from_value(&value)?,
        None => MetricList::default(),
    };

    Ok(ResolvedParameters {
        operation,
        time_window: TimeWindow::new(start, end),
        granularity,
        metrics,
    })
}

/// Look up a parameter, folding `null` into "not set"
fn lookup(
    source: &dyn ParameterSource,
    name: &str,
    item_index: usize,
) -> Result<Option<Value>, ParameterError> {
    Ok(source
        .parameter(name, item_index)?
        .filter(|value| !value.is_null()))
}

fn optional_string(
    source: &dyn ParameterSource,
    name: &str,
    item_index: usize,
) -> Result<Option<String>, ParameterError> {
    match lookup(source, name, item_index)? {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ParameterError::WrongType {
            name: name.to_string(),
            expected: "a string",
            actual: json_type_name(&other),
        }),
    }
}

fn required_string(
    source: &dyn ParameterSource,
    name: &str,
    item_index: usize,
) -> Result<String, ParameterError> {
    optional_string(source, name, item_index)?
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ParameterError::Missing {
            name: name.to_string(),
        })
}

/// Flatten the metrics sub-form into an ordered list.
///
/// Accepts a single string, a list of strings, a list of `{ "name": .. }`
/// entries, or the collection form `{ "metric": [ { "name": .. } ] }`.
pub fn metrics_from_value(value: &Value) -> Result<MetricList, ParameterError> {
    let wrong_type = |actual: &Value| ParameterError::WrongType {
        name: names::METRICS.to_string(),
        expected: "a metric name or list of metric names",
        actual: json_type_name(actual),
    };

    match value {
        Value::Null => Ok(MetricList::default()),
        Value::String(s) => Ok(MetricList::new(vec![s.clone()])),
        Value::Array(entries) => entries
            .iter()
            .map(|entry| match entry {
                Value::String(s) => Ok(s.clone()),
                Value::Object(obj) => match obj.get("name") {
                    Some(Value::String(s)) => Ok(s.clone()),
                    Some(other) => Err(wrong_type(other)),
                    None => Err(ParameterError::InvalidValue {
                        name: names::METRICS.to_string(),
                        value: entry.to_string(),
                        reason: "metric entry has no 'name'".to_string(),
                    }),
                },
                other => Err(wrong_type(other)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(MetricList::new),
        Value::Object(obj) => match obj.get("metric") {
            Some(inner) => metrics_from_value(inner),
            None if obj.is_empty() => Ok(MetricList::default()),
            None => Err(ParameterError::InvalidValue {
                name: names::METRICS.to_string(),
                value: value.to_string(),
                reason: "expected a 'metric' collection".to_string(),
            }),
        },
        other => Err(wrong_type(other)),
    }
}

/// Name of a JSON value's type, for error messages
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON map of node parameter values.
///
/// ```
/// use awsce_core::NodeParameters;
/// use serde_json::json;
///
/// let params = NodeParameters::new()
///     .with("operation", "GetCostAndUsage")
///     .with("timeStart", "={{ $json.start }}")
///     .with("timeEnd", "2023-02-01")
///     .with("metrics", json!(["BlendedCost"]));
/// assert_eq!(params.get("timeEnd"), Some(&json!("2023-02-01")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeParameters {
    values: Map<String, Value>,
}

impl NodeParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter value
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Build from a JSON object
    pub fn from_value(value: Value) -> Result<Self, ParameterError> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(ParameterError::WrongType {
                name: "parameters".to_string(),
                expected: "an object",
                actual: json_type_name(&other),
            }),
        }
    }

    /// Raw (unevaluated) value of a parameter
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Bind the parameters to a run's input items so expressions can be
    /// evaluated per item.
    ///
    /// The input payloads are captured up front, keyed by each item's
    /// `index`; results written back to the items during the run do not
    /// affect later evaluations.
    pub fn for_items(&self, items: &[ExecutionItem]) -> ItemParameters {
        ItemParameters {
            values: self.values.clone(),
            inputs: items
                .iter()
                .map(|item| (item.index, item.json.clone()))
                .collect(),
        }
    }
}

/// [`NodeParameters`] bound to the input payloads of one run
#[derive(Debug, Clone)]
pub struct ItemParameters {
    values: Map<String, Value>,
    inputs: BTreeMap<usize, Value>,
}

impl ParameterSource for ItemParameters {
    fn parameter(&self, name: &str, item_index: usize) -> Result<Option<Value>, ParameterError> {
        let Some(raw) = self.values.get(name) else {
            return Ok(None);
        };

        if !expression::is_expression(raw) {
            return Ok(Some(raw.clone()));
        }

        let empty = Value::Object(Map::new());
        let json = self.inputs.get(&item_index).unwrap_or(&empty);
        expression::evaluate(raw, ExpressionContext::new(json, item_index))
            .map(Some)
            .map_err(|e| ParameterError::Expression {
                name: name.to_string(),
                message: e.to_string(),
            })
    }
}
