//! Livelab Protocol Library
//!
//! Shared definitions for querying the living-lab test results service:
//! test types and their field schemas, the constraint set an operator edits,
//! and the pure translation of that set into request parameters.

pub mod constants;
pub mod error;
pub mod filter;
pub mod query;
pub mod schema;

#[cfg(test)]
mod strategies;

pub use constants::*;
pub use error::ValidationError;
pub use filter::{ConstraintSet, FieldConstraint, Filter};
pub use query::{
    build, parameter_key, parse_parameter_key, range_conflicts, ParameterMap, RangeConflict,
};
pub use schema::{Field, FieldKind, PingResult};
