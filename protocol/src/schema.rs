//! Per-test-type field schema
//!
//! Every test type shares the device identifier and the upload timestamp
//! components. Bandwidth, jitter and latency add their own numeric metric,
//! ping adds a tri-state result instead.

use crate::constants::{Operator, TestType};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    DeviceId,
    Month,
    Day,
    Hour,
    Minute,
    Bandwidth,
    Jitter,
    Latency,
    Result,
}

/// How a field may be compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Equality only
    Exact,
    /// `eq`, `lt` and `gt`, independently and at the same time
    Range,
    /// Equality against `any`, `up` or `down`
    PingResult,
}

impl FieldKind {
    pub fn operators(self) -> &'static [Operator] {
        match self {
            FieldKind::Exact | FieldKind::PingResult => &[Operator::Eq],
            FieldKind::Range => &Operator::ALL,
        }
    }
}

const COMMON_FIELDS: [Field; 5] = [
    Field::DeviceId,
    Field::Month,
    Field::Day,
    Field::Hour,
    Field::Minute,
];

const BANDWIDTH_FIELDS: [Field; 6] = [
    Field::DeviceId,
    Field::Month,
    Field::Day,
    Field::Hour,
    Field::Minute,
    Field::Bandwidth,
];

const JITTER_FIELDS: [Field; 6] = [
    Field::DeviceId,
    Field::Month,
    Field::Day,
    Field::Hour,
    Field::Minute,
    Field::Jitter,
];

const LATENCY_FIELDS: [Field; 6] = [
    Field::DeviceId,
    Field::Month,
    Field::Day,
    Field::Hour,
    Field::Minute,
    Field::Latency,
];

const PING_FIELDS: [Field; 6] = [
    Field::DeviceId,
    Field::Result,
    Field::Month,
    Field::Day,
    Field::Hour,
    Field::Minute,
];

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::DeviceId => "device_id",
            Field::Month => "month",
            Field::Day => "day",
            Field::Hour => "hour",
            Field::Minute => "minute",
            Field::Bandwidth => "bandwidth",
            Field::Jitter => "jitter",
            Field::Latency => "latency",
            Field::Result => "result",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::DeviceId => FieldKind::Exact,
            Field::Result => FieldKind::PingResult,
            _ => FieldKind::Range,
        }
    }

    /// Input label for the field
    pub fn label(self) -> &'static str {
        match self {
            Field::DeviceId => "NanoPi ID",
            Field::Month => "Upload Date Month",
            Field::Day => "Upload Date Day",
            Field::Hour => "Upload Date Hour",
            Field::Minute => "Upload Date Minute",
            Field::Bandwidth => "Bandwidth",
            Field::Jitter => "Jitter",
            Field::Latency => "Latency",
            Field::Result => "Ping Result",
        }
    }

    /// True for the upload timestamp components shared by every test type
    pub fn is_timestamp(self) -> bool {
        COMMON_FIELDS[1..].contains(&self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "device_id" => Ok(Field::DeviceId),
            "month" => Ok(Field::Month),
            "day" => Ok(Field::Day),
            "hour" => Ok(Field::Hour),
            "minute" => Ok(Field::Minute),
            "bandwidth" => Ok(Field::Bandwidth),
            "jitter" => Ok(Field::Jitter),
            "latency" => Ok(Field::Latency),
            "result" => Ok(Field::Result),
            other => Err(ValidationError::UnknownField(other.to_string())),
        }
    }
}

impl TestType {
    /// Legal fields for this test type, in input order
    pub fn fields(self) -> &'static [Field] {
        match self {
            TestType::Bandwidth => &BANDWIDTH_FIELDS,
            TestType::Jitter => &JITTER_FIELDS,
            TestType::Latency => &LATENCY_FIELDS,
            TestType::Ping => &PING_FIELDS,
        }
    }

    /// Numeric measurement the test produces; ping has none
    pub fn metric(self) -> Option<Field> {
        match self {
            TestType::Bandwidth => Some(Field::Bandwidth),
            TestType::Jitter => Some(Field::Jitter),
            TestType::Latency => Some(Field::Latency),
            TestType::Ping => None,
        }
    }

    pub fn has_field(self, field: Field) -> bool {
        self.fields().contains(&field)
    }

    /// Check that `field` with `operator` is legal for this test type
    pub fn check(self, field: Field, operator: Operator) -> Result<(), ValidationError> {
        if !self.has_field(field) {
            return Err(ValidationError::FieldNotInSchema {
                field: field.as_str().to_string(),
                test_type: self,
            });
        }

        if !field.kind().operators().contains(&operator) {
            return Err(ValidationError::OperatorNotAllowed {
                field: field.as_str().to_string(),
                operator,
            });
        }

        Ok(())
    }
}

/// Tri-state ping outcome filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PingResult {
    /// Either outcome; contributes nothing to the query
    #[default]
    Any,
    Up,
    Down,
}

impl PingResult {
    pub fn as_str(self) -> &'static str {
        match self {
            PingResult::Any => "any",
            PingResult::Up => "up",
            PingResult::Down => "down",
        }
    }

    /// Value sent to the service, `None` for `Any`
    pub fn query_value(self) -> Option<&'static str> {
        match self {
            PingResult::Any => None,
            PingResult::Up => Some("up"),
            PingResult::Down => Some("down"),
        }
    }
}

impl fmt::Display for PingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PingResult {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "any" | "either" => Ok(PingResult::Any),
            "up" => Ok(PingResult::Up),
            "down" => Ok(PingResult::Down),
            _ => Err(ValidationError::InvalidPingResult(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_fields_present_everywhere() {
        for test_type in TestType::ALL {
            for field in COMMON_FIELDS {
                assert!(test_type.has_field(field), "{} missing {}", test_type, field);
            }
        }
    }

    #[test]
    fn test_metric_fields_are_type_specific() {
        assert!(TestType::Bandwidth.has_field(Field::Bandwidth));
        assert!(!TestType::Bandwidth.has_field(Field::Jitter));
        assert!(TestType::Jitter.has_field(Field::Jitter));
        assert!(!TestType::Jitter.has_field(Field::Latency));
        assert!(TestType::Latency.has_field(Field::Latency));
        assert!(!TestType::Latency.has_field(Field::Result));

        let ping = TestType::Ping;
        assert!(ping.has_field(Field::Result));
        assert!(!ping.has_field(Field::Bandwidth));
        assert!(!ping.has_field(Field::Jitter));
        assert!(!ping.has_field(Field::Latency));
    }

    #[test]
    fn test_check_operators() {
        assert!(TestType::Bandwidth.check(Field::Month, Operator::Gt).is_ok());
        assert!(TestType::Bandwidth.check(Field::Bandwidth, Operator::Lt).is_ok());
        assert_eq!(
            TestType::Bandwidth.check(Field::DeviceId, Operator::Lt),
            Err(ValidationError::OperatorNotAllowed {
                field: "device_id".to_string(),
                operator: Operator::Lt,
            })
        );
        assert!(TestType::Ping.check(Field::Result, Operator::Gt).is_err());
        assert!(matches!(
            TestType::Ping.check(Field::Bandwidth, Operator::Eq),
            Err(ValidationError::FieldNotInSchema { .. })
        ));
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in PING_FIELDS.iter().chain(BANDWIDTH_FIELDS.iter()) {
            assert_eq!(field.as_str().parse::<Field>().unwrap(), *field);
        }
        assert!("upload_time".parse::<Field>().is_err());
    }

    #[test]
    fn test_parse_ping_result() {
        assert_eq!("".parse::<PingResult>().unwrap(), PingResult::Any);
        assert_eq!("Either".parse::<PingResult>().unwrap(), PingResult::Any);
        assert_eq!("UP".parse::<PingResult>().unwrap(), PingResult::Up);
        assert_eq!("down".parse::<PingResult>().unwrap(), PingResult::Down);
        assert!("sideways".parse::<PingResult>().is_err());
        assert_eq!(PingResult::Any.query_value(), None);
    }

    #[test]
    fn test_metric_is_in_schema() {
        for test_type in TestType::ALL {
            if let Some(metric) = test_type.metric() {
                assert!(test_type.has_field(metric));
                assert_eq!(metric.kind(), FieldKind::Range);
            }
        }
        assert_eq!(TestType::Ping.metric(), None);
    }

    #[test]
    fn test_timestamp_fields() {
        assert!(Field::Minute.is_timestamp());
        assert!(!Field::DeviceId.is_timestamp());
        assert!(!Field::Bandwidth.is_timestamp());
    }
}
