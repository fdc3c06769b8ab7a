//! Test types, comparison operators and service resource names

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shared collection that serves every test type
pub const SHARED_RESOURCE: &str = "nanopi";

/// Parameter key suffix for a "less than" bound
pub const LT_SUFFIX: &str = "_lt";

/// Parameter key suffix for a "greater than" bound
pub const GT_SUFFIX: &str = "_gt";

/// Kind of performance test collected from the field devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    /// iperf3 throughput runs
    #[default]
    Bandwidth,

    /// UDP jitter runs
    Jitter,

    /// One-way latency (sockperf) runs
    Latency,

    /// Reachability pings
    Ping,
}

impl TestType {
    pub const ALL: [TestType; 4] = [
        TestType::Bandwidth,
        TestType::Jitter,
        TestType::Latency,
        TestType::Ping,
    ];

    /// Name used on the command line and in logs
    pub fn as_str(self) -> &'static str {
        match self {
            TestType::Bandwidth => "bandwidth",
            TestType::Jitter => "jitter",
            TestType::Latency => "latency",
            TestType::Ping => "ping",
        }
    }

    /// Human-readable label, as shown in the type picker
    pub fn label(self) -> &'static str {
        match self {
            TestType::Bandwidth => "Bandwidth",
            TestType::Jitter => "Jitter",
            TestType::Latency => "One-Way Latency",
            TestType::Ping => "Ping",
        }
    }

    /// Per-type collection on the results service
    pub fn resource(self) -> &'static str {
        match self {
            TestType::Bandwidth => "iperf3",
            TestType::Jitter => "jitter",
            TestType::Latency => "sockperf",
            TestType::Ping => "ping",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bandwidth" | "iperf3" => Ok(TestType::Bandwidth),
            "jitter" => Ok(TestType::Jitter),
            "latency" | "sockperf" => Ok(TestType::Latency),
            "ping" => Ok(TestType::Ping),
            other => Err(ValidationError::UnknownTestType(other.to_string())),
        }
    }
}

/// Comparison applied by a single constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Exact match
    Eq,

    /// Strictly greater than
    Gt,

    /// Strictly less than
    Lt,
}

impl Operator {
    pub const ALL: [Operator; 3] = [Operator::Eq, Operator::Gt, Operator::Lt];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
        }
    }

    /// Suffix appended to the field name to form the query key
    pub fn key_suffix(self) -> &'static str {
        match self {
            Operator::Eq => "",
            Operator::Gt => GT_SUFFIX,
            Operator::Lt => LT_SUFFIX,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eq" | "=" => Ok(Operator::Eq),
            "gt" | ">" => Ok(Operator::Gt),
            "lt" | "<" => Ok(Operator::Lt),
            other => Err(ValidationError::UnknownOperator(other.to_string())),
        }
    }
}
