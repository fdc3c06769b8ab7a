//! Test type selection and the constraint set bound to it

use crate::constants::{Operator, TestType};
use crate::error::ValidationError;
use crate::schema::{Field, FieldKind, PingResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single filter rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConstraint {
    pub field: Field,
    pub operator: Operator,
    pub value: String,
}

/// Constraints entered for one test type, unique per `(field, operator)`
///
/// The set is created for a test type and only ever holds fields from that
/// type's schema. Blank values are never stored: setting one removes the
/// constraint instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSet {
    test_type: TestType,
    entries: BTreeMap<(Field, Operator), String>,
}

impl ConstraintSet {
    pub fn new(test_type: TestType) -> Self {
        Self {
            test_type,
            entries: BTreeMap::new(),
        }
    }

    pub fn test_type(&self) -> TestType {
        self.test_type
    }

    /// Insert or replace the constraint identified by `(field, operator)`
    ///
    /// Returns whether the set changed.
    pub fn set(
        &mut self,
        field: Field,
        operator: Operator,
        value: impl Into<String>,
    ) -> Result<bool, ValidationError> {
        self.test_type.check(field, operator)?;

        let value = value.into();
        let value = match field.kind() {
            FieldKind::PingResult => match value.parse::<PingResult>()?.query_value() {
                Some(v) => v.to_string(),
                None => String::new(),
            },
            FieldKind::Exact | FieldKind::Range => value,
        };

        if value.trim().is_empty() {
            return Ok(self.entries.remove(&(field, operator)).is_some());
        }

        match self.entries.insert((field, operator), value.clone()) {
            Some(previous) => Ok(previous != value),
            None => Ok(true),
        }
    }

    /// Same as [`ConstraintSet::set`], with the field given by name
    pub fn set_named(
        &mut self,
        field: &str,
        operator: Operator,
        value: impl Into<String>,
    ) -> Result<bool, ValidationError> {
        let field = field.parse::<Field>()?;
        self.set(field, operator, value)
    }

    /// Set the ping result filter; `Any` clears it
    pub fn set_ping_result(&mut self, result: PingResult) -> Result<bool, ValidationError> {
        self.set(Field::Result, Operator::Eq, result.as_str())
    }

    /// Remove one constraint, returning whether it was present
    ///
    /// Clearing a combination the schema does not allow is still a caller
    /// error.
    pub fn clear_constraint(
        &mut self,
        field: Field,
        operator: Operator,
    ) -> Result<bool, ValidationError> {
        self.test_type.check(field, operator)?;
        Ok(self.entries.remove(&(field, operator)).is_some())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, field: Field, operator: Operator) -> Option<&str> {
        self.entries.get(&(field, operator)).map(String::as_str)
    }

    pub fn ping_result(&self) -> PingResult {
        match self.get(Field::Result, Operator::Eq) {
            Some("up") => PingResult::Up,
            Some("down") => PingResult::Down,
            _ => PingResult::Any,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Constraints ordered by field, then operator
    pub fn iter(&self) -> impl Iterator<Item = (Field, Operator, &str)> {
        self.entries
            .iter()
            .map(|((field, operator), value)| (*field, *operator, value.as_str()))
    }

    pub fn constraints(&self) -> Vec<FieldConstraint> {
        self.iter()
            .map(|(field, operator, value)| FieldConstraint {
                field,
                operator,
                value: value.to_string(),
            })
            .collect()
    }
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self::new(TestType::default())
    }
}

/// The active test type together with its constraint set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    constraints: ConstraintSet,
}

impl Filter {
    pub fn new(test_type: TestType) -> Self {
        Self {
            constraints: ConstraintSet::new(test_type),
        }
    }

    pub fn test_type(&self) -> TestType {
        self.constraints.test_type()
    }

    /// Switch test type, discarding every constraint of the previous one
    ///
    /// Returns whether the type changed. Selecting the current type is a no-op.
    pub fn select(&mut self, test_type: TestType) -> bool {
        if test_type == self.test_type() {
            return false;
        }
        self.constraints = ConstraintSet::new(test_type);
        true
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut ConstraintSet {
        &mut self.constraints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies;
    use proptest::prelude::*;

    #[test]
    fn test_set_replaces_same_field_and_operator() {
        let mut set = ConstraintSet::new(TestType::Bandwidth);
        assert!(set.set(Field::Month, Operator::Gt, "3").unwrap());
        assert!(set.set(Field::Month, Operator::Lt, "9").unwrap());
        assert!(set.set(Field::Month, Operator::Gt, "4").unwrap());
        assert!(!set.set(Field::Month, Operator::Gt, "4").unwrap());

        assert_eq!(set.len(), 2);
        assert_eq!(set.get(Field::Month, Operator::Gt), Some("4"));
        assert_eq!(set.get(Field::Month, Operator::Lt), Some("9"));
    }

    #[test]
    fn test_blank_value_unsets() {
        let mut set = ConstraintSet::new(TestType::Jitter);
        set.set(Field::Jitter, Operator::Eq, "2.5").unwrap();
        assert!(set.set(Field::Jitter, Operator::Eq, "").unwrap());
        assert!(set.is_empty());
        assert!(!set.set(Field::Hour, Operator::Lt, "   ").unwrap());
        assert!(set.is_empty());
    }

    #[test]
    fn test_rejects_fields_outside_schema() {
        let mut set = ConstraintSet::new(TestType::Ping);
        let err = set.set(Field::Bandwidth, Operator::Eq, "50").unwrap_err();
        assert!(matches!(err, ValidationError::FieldNotInSchema { .. }));

        let err = set.set_named("throughput", Operator::Eq, "50").unwrap_err();
        assert_eq!(err, ValidationError::UnknownField("throughput".to_string()));

        let err = set.set(Field::DeviceId, Operator::Gt, "np-1").unwrap_err();
        assert!(matches!(err, ValidationError::OperatorNotAllowed { .. }));
        assert!(set.is_empty());
    }

    #[test]
    fn test_ping_result_normalised() {
        let mut set = ConstraintSet::new(TestType::Ping);
        set.set_named("result", Operator::Eq, "Down").unwrap();
        assert_eq!(set.get(Field::Result, Operator::Eq), Some("down"));
        assert_eq!(set.ping_result(), PingResult::Down);

        assert!(set.set_ping_result(PingResult::Any).unwrap());
        assert!(set.is_empty());

        let err = set.set(Field::Result, Operator::Eq, "maybe").unwrap_err();
        assert_eq!(err, ValidationError::InvalidPingResult("maybe".to_string()));
    }

    #[test]
    fn test_clear_constraint() {
        let mut set = ConstraintSet::new(TestType::Latency);
        set.set(Field::Latency, Operator::Lt, "20").unwrap();
        assert!(set.clear_constraint(Field::Latency, Operator::Lt).unwrap());
        assert!(!set.clear_constraint(Field::Latency, Operator::Lt).unwrap());
        assert!(set.clear_constraint(Field::Bandwidth, Operator::Lt).is_err());

        set.set(Field::Day, Operator::Eq, "12").unwrap();
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_select_discards_constraints() {
        let mut filter = Filter::default();
        assert_eq!(filter.test_type(), TestType::Bandwidth);
        filter
            .constraints_mut()
            .set(Field::Bandwidth, Operator::Gt, "10")
            .unwrap();
        filter.constraints_mut().set(Field::Month, Operator::Eq, "5").unwrap();

        assert!(!filter.select(TestType::Bandwidth));
        assert_eq!(filter.constraints().len(), 2);

        assert!(filter.select(TestType::Ping));
        assert!(filter.constraints().is_empty());

        // switching back does not restore the old constraints
        assert!(filter.select(TestType::Bandwidth));
        assert!(filter.constraints().is_empty());
    }

    #[test]
    fn test_iteration_order_is_stable() {
        let mut set = ConstraintSet::new(TestType::Bandwidth);
        set.set(Field::Minute, Operator::Lt, "30").unwrap();
        set.set(Field::DeviceId, Operator::Eq, "np-2").unwrap();
        set.set(Field::Minute, Operator::Gt, "10").unwrap();

        let order: Vec<(Field, Operator)> = set.iter().map(|(f, o, _)| (f, o)).collect();
        assert_eq!(
            order,
            vec![
                (Field::DeviceId, Operator::Eq),
                (Field::Minute, Operator::Gt),
                (Field::Minute, Operator::Lt),
            ]
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn rejected_edit_leaves_set_unchanged(
            test_type in strategies::test_type(),
            edits in strategies::edits(),
            field in strategies::field(),
            operator in strategies::operator(),
            value in strategies::value(),
        ) {
            let mut set = ConstraintSet::new(test_type);
            for (f, o, v) in &edits {
                let _ = set.set(*f, *o, v.as_str());
            }
            let before = set.clone();

            if set.set(field, operator, value).is_err() {
                prop_assert_eq!(set, before);
            }
        }

        #[test]
        fn switching_away_and_back_leaves_set_empty(
            from in strategies::test_type(),
            to in strategies::test_type(),
            edits in strategies::edits(),
        ) {
            prop_assume!(from != to);

            let mut filter = Filter::new(from);
            for (field, operator, value) in &edits {
                let _ = filter.constraints_mut().set(*field, *operator, value.as_str());
            }

            prop_assert!(filter.select(to));
            prop_assert!(filter.constraints().is_empty());
            prop_assert!(filter.select(from));
            prop_assert!(filter.constraints().is_empty());
            prop_assert_eq!(filter.test_type(), from);
        }
    }
}
