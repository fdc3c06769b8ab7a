//! Translation of a constraint set into request parameters

use crate::constants::{Operator, TestType, GT_SUFFIX, LT_SUFFIX};
use crate::error::ValidationError;
use crate::filter::{ConstraintSet, Filter};
use crate::schema::{Field, FieldKind, PingResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// Query-string parameters, keyed and iterated in lexicographic order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParameterMap(BTreeMap<String, String>);

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn insert(&mut self, key: String, value: String) {
        self.0.insert(key, value);
    }
}

impl<'a> IntoIterator for &'a ParameterMap {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Parameter key for a field/operator pair: `month`, `month_lt`, `month_gt`
pub fn parameter_key(field: Field, operator: Operator) -> String {
    format!("{}{}", field.as_str(), operator.key_suffix())
}

/// Inverse of [`parameter_key`], checked against the schema of `test_type`
pub fn parse_parameter_key(
    test_type: TestType,
    key: &str,
) -> Result<(Field, Operator), ValidationError> {
    let key = key.trim();
    let (name, operator) = if let Some(name) = key.strip_suffix(LT_SUFFIX) {
        (name, Operator::Lt)
    } else if let Some(name) = key.strip_suffix(GT_SUFFIX) {
        (name, Operator::Gt)
    } else {
        (key, Operator::Eq)
    };

    let field = name.parse::<Field>()?;
    test_type.check(field, operator)?;
    Ok((field, operator))
}

/// Build the request parameters for `test_type` from `constraints`
///
/// Purely structural: blank values are dropped, the ping result contributes
/// only `up` or `down`, and anything outside the schema of `test_type` never
/// produces a key. Contradictory bounds are passed through untouched.
pub fn build(test_type: TestType, constraints: &ConstraintSet) -> ParameterMap {
    let mut params = ParameterMap::new();

    for (field, operator, value) in constraints.iter() {
        if value.trim().is_empty() || test_type.check(field, operator).is_err() {
            continue;
        }

        let value = match field.kind() {
            FieldKind::PingResult => {
                match value.parse::<PingResult>().ok().and_then(PingResult::query_value) {
                    Some(v) => v.to_string(),
                    None => continue,
                }
            }
            FieldKind::Exact | FieldKind::Range => value.to_string(),
        };

        params.insert(parameter_key(field, operator), value);
    }

    params
}

impl Filter {
    /// Parameters for the active test type and its constraints
    pub fn query(&self) -> ParameterMap {
        build(self.test_type(), self.constraints())
    }
}

/// A range whose lower bound is not below its upper bound
#[derive(Debug, Clone, PartialEq)]
pub struct RangeConflict {
    pub field: Field,
    pub greater_than: f64,
    pub less_than: f64,
}

/// Numeric ranges that can never match (`gt >= lt`)
///
/// Values that do not parse as numbers are ignored.
pub fn range_conflicts(constraints: &ConstraintSet) -> Vec<RangeConflict> {
    constraints
        .test_type()
        .fields()
        .iter()
        .filter(|field| field.kind() == FieldKind::Range)
        .filter_map(|&field| {
            let greater_than = constraints.get(field, Operator::Gt)?.trim().parse::<f64>().ok()?;
            let less_than = constraints.get(field, Operator::Lt)?.trim().parse::<f64>().ok()?;
            (greater_than >= less_than).then_some(RangeConflict {
                field,
                greater_than,
                less_than,
            })
        })
        .collect()
}
