//! Per-device statistics over a result set

use crate::fetch::{cell_text, TestRecord};
use protocol::TestType;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Record fields that identify the device, in lookup order
const DEVICE_KEYS: [&str; 2] = ["nanopi", "device_id"];

/// Label used for records that carry no device
pub const UNKNOWN_DEVICE: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSummary {
    pub device: String,
    pub records: usize,
    /// Over the test type's metric; `None` for ping or when no value is numeric
    pub metric: Option<Statistics>,
    /// Ping runs reporting the device as down
    pub down: usize,
}

/// Group `records` by device and summarise each group, ordered by device
pub fn summarize(test_type: TestType, records: &[TestRecord]) -> Vec<DeviceSummary> {
    let mut groups: BTreeMap<String, Vec<&TestRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(device_of(record)).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(device, group)| {
            let values: Vec<f64> = match test_type.metric() {
                Some(metric) => group
                    .iter()
                    .filter_map(|r| number(r.get(metric.as_str())))
                    .collect(),
                None => Vec::new(),
            };

            DeviceSummary {
                device,
                records: group.len(),
                metric: calculate_statistics(&values),
                down: group.iter().filter(|r| is_down(r)).count(),
            }
        })
        .collect()
}

fn device_of(record: &TestRecord) -> String {
    let value = DEVICE_KEYS
        .iter()
        .filter_map(|key| record.get(key))
        .find(|value| !value.is_null());

    let label = match value {
        Some(Value::Object(device)) => cell_text(device.get("name").or_else(|| device.get("id"))),
        other => cell_text(other),
    };

    if label.is_empty() {
        UNKNOWN_DEVICE.to_string()
    } else {
        label
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// A ping run is down when `result` says so or `up` is false/0
fn is_down(record: &TestRecord) -> bool {
    match (record.get("result"), record.get("up")) {
        (Some(Value::String(result)), _) => result.eq_ignore_ascii_case("down"),
        (_, Some(Value::Bool(up))) => !up,
        (_, Some(Value::Number(up))) => up.as_f64() == Some(0.0),
        _ => false,
    }
}

fn calculate_statistics(values: &[f64]) -> Option<Statistics> {
    if values.is_empty() {
        return None;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = values.iter().sum::<f64>() / values.len() as f64;

    Some(Statistics { min, max, avg })
}
