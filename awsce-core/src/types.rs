//! Core value types shared by the resolver, request builder and clients

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cost Explorer operations the node can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Historical cost and usage
    GetCostAndUsage,
    /// Forecast of future cost
    GetCostForecast,
}

impl Operation {
    /// All supported operations
    pub const ALL: [Operation; 2] = [Operation::GetCostAndUsage, Operation::GetCostForecast];

    /// Operation name as used in the `X-Amz-Target` header and node parameters
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetCostAndUsage => "GetCostAndUsage",
            Operation::GetCostForecast => "GetCostForecast",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Time-bucket size for aggregated results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Granularity {
    Daily,
    #[default]
    Monthly,
    Hourly,
}

impl Granularity {
    /// Wire value (`DAILY`, `MONTHLY`, `HOURLY`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "DAILY",
            Granularity::Monthly => "MONTHLY",
            Granularity::Hourly => "HOURLY",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DAILY" => Ok(Granularity::Daily),
            "MONTHLY" => Ok(Granularity::Monthly),
            "HOURLY" => Ok(Granularity::Hourly),
            other => Err(format!(
                "expected one of DAILY, MONTHLY, HOURLY, got '{}'",
                other
            )),
        }
    }
}

/// Query window. `start` is inclusive, `end` exclusive.
///
/// Dates are passed through untouched; the service validates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

impl TimeWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Ordered list of metric names (e.g. `BlendedCost`, `UsageQuantity`)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricList(Vec<String>);

impl MetricList {
    pub fn new(metrics: Vec<String>) -> Self {
        Self(metrics)
    }

    /// First metric, used by forecasts
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: Into<String>> FromIterator<S> for MetricList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
