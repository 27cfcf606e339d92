use thiserror::Error;
use ytree_schema::PathSyntaxError;
use ytree_value::TreeError;

/// Errors aborting an unmarshal operation.
///
/// Unlike validation, decoding fails fast: the first error is returned
/// and the destination tree is left partially filled.
#[derive(Debug, Error)]
pub enum UnmarshalError {
    #[error("schema error at '{field}': {reason}")]
    SchemaInvalid { field: String, reason: String },

    #[error("type mismatch for '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("value {value} out of range for {type_name} in '{field}'")]
    Range {
        field: String,
        value: String,
        type_name: String,
    },

    #[error("'{value}' is not a value of {set} in '{field}'")]
    UnknownEnumValue {
        field: String,
        value: String,
        set: String,
    },

    #[error("invalid base64 in '{field}': {source}")]
    Base64 {
        field: String,
        #[source]
        source: base64::DecodeError,
    },

    /// No union alternative decoded the value. Carries the raw value,
    /// its external type and the destination field for diagnostics.
    #[error("no suitable union type for {value_type} value {value} in '{field}'")]
    NoSuitableUnionType {
        field: String,
        value: String,
        value_type: String,
    },

    #[error("field '{field}' in '{parent}' has no schema counterpart")]
    UnexpectedField { parent: String, field: String },

    #[error("list entry in '{field}' is missing key field '{key}'")]
    MissingKey { field: String, key: String },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error(transparent)]
    PathSyntax(#[from] PathSyntaxError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}
