//! Validation error types.
//!
//! Validation accumulates these instead of failing fast: one call
//! returns every violation found across the (sub)tree. Each variant
//! carries enough context (data path, names, offending value) to
//! localize the problem without a debugger.

use thiserror::Error;
use ytree_value::DataPath;

use crate::path::PathSyntaxError;

/// A violation found while validating a data tree against its schema.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// The schema node itself is malformed or inconsistent; the subtree
    /// under it is skipped.
    #[error("invalid schema node '{node}' at {path}: {reason}")]
    SchemaInvalid {
        node: String,
        reason: String,
        path: DataPath,
    },

    #[error("type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: String,
        actual: String,
        path: DataPath,
    },

    /// A numeric value outside its kind's bit width or declared range,
    /// or a string/binary length outside the declared length ranges.
    #[error("value {value} out of range for {type_name} at {path}")]
    Range {
        value: String,
        type_name: String,
        path: DataPath,
    },

    #[error("string '{value}' does not match pattern '{pattern}' at {path}")]
    PatternMismatch {
        value: String,
        pattern: String,
        path: DataPath,
    },

    #[error("'{value}' is not a value of {set} at {path}")]
    UnknownEnumValue {
        value: String,
        set: String,
        path: DataPath,
    },

    /// No union alternative structurally or semantically matched.
    /// `errors` aggregates the per-alternative failures when at least
    /// one alternative matched structurally.
    #[error("no union alternative matched value '{value}' at {path} ({tried} tried)")]
    NoMatch {
        value: String,
        tried: usize,
        errors: Vec<ValidationError>,
        path: DataPath,
    },

    /// A union wrapper whose recorded alternative disagrees with its
    /// payload. Only reachable for wrappers constructed outside this
    /// library, across a serialization boundary.
    #[error("union wrapper at {path} records {recorded} but holds {actual}")]
    Structural {
        recorded: String,
        actual: String,
        path: DataPath,
    },

    #[error("list entry key {key} disagrees with field '{field}' value {value} at {path}")]
    KeyConsistency {
        key: String,
        field: String,
        value: String,
        path: DataPath,
    },

    #[error("list entry at {path} is missing key field '{field}'")]
    MissingKeyField { field: String, path: DataPath },

    #[error("field '{field}' at {path} has no schema counterpart")]
    UnexpectedField { field: String, path: DataPath },

    /// A leafref whose target resolves to no populated value anywhere
    /// in the data tree. Suppressed by the ignore-missing-data option.
    #[error("leafref at {path} points to '{target}' which holds no value")]
    UnresolvedPath { target: String, path: DataPath },

    /// A leafref whose target holds values, none equal to the
    /// reference. Never suppressed.
    #[error("leafref at {path} holds '{value}' not found at '{target}'")]
    DanglingReference {
        value: String,
        target: String,
        path: DataPath,
    },

    #[error("invalid path expression at {path}: {source}")]
    PathSyntax {
        #[source]
        source: PathSyntaxError,
        path: DataPath,
    },

    #[error("list at {path} has {actual} entries, fewer than min-elements {min}")]
    TooFewElements {
        actual: u64,
        min: u64,
        path: DataPath,
    },

    #[error("list at {path} has {actual} entries, more than max-elements {max}")]
    TooManyElements {
        actual: u64,
        max: u64,
        path: DataPath,
    },

    #[error("choice '{choice}' at {path} has {} cases populated: {cases:?}", cases.len())]
    ChoiceMultipleCases {
        choice: String,
        cases: Vec<String>,
        path: DataPath,
    },
}
