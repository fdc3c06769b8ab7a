//! Generators shared by the property tests

use crate::constants::{Operator, TestType};
use crate::schema::Field;
use proptest::prelude::*;

pub const ALL_FIELDS: [Field; 9] = [
    Field::DeviceId,
    Field::Month,
    Field::Day,
    Field::Hour,
    Field::Minute,
    Field::Bandwidth,
    Field::Jitter,
    Field::Latency,
    Field::Result,
];

pub fn test_type() -> impl Strategy<Value = TestType> {
    prop::sample::select(TestType::ALL.to_vec())
}

pub fn field() -> impl Strategy<Value = Field> {
    prop::sample::select(ALL_FIELDS.to_vec())
}

pub fn operator() -> impl Strategy<Value = Operator> {
    prop::sample::select(Operator::ALL.to_vec())
}

/// Blank, ping-result-like, numeric and free-text values
pub fn value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        prop::sample::select(vec!["any", "up", "down", "Up", "DOWN", "either", "maybe"])
            .prop_map(str::to_string),
        "-?[0-9]{1,3}(\\.[0-9]{1,2})?",
        "[a-z0-9._-]{1,6}",
    ]
}

pub fn edits() -> impl Strategy<Value = Vec<(Field, Operator, String)>> {
    prop::collection::vec((field(), operator(), value()), 0..24)
}
