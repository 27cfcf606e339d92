//! Schema representation and validation for YANG-modeled data trees.
//!
//! The schema tree mirrors a compiled YANG model: containers, lists,
//! leaves, leaf-lists, choices and cases, each leaf carrying a type
//! descriptor. Validation walks a [`ytree_value::DataTree`] against the
//! schema, accumulating every violation instead of stopping at the
//! first, and runs a single global pass for leafref referential
//! integrity.

/// Path grammar: parsing, predicate handling and schema-tree resolution.
pub mod path;

/// Schema tree and nodes.
pub mod schema;

/// Type descriptors and the closed set of type kinds.
pub mod types;

/// Validation options.
pub mod options;

/// Validation entry points and per-kind validators.
pub mod validate;

pub use options::ValidationOptions;
pub use path::{ParsedPath, PathResolveError, PathStep, PathSyntaxError, Predicate, PredicateValue};
pub use schema::{NodeKind, SchemaDefect, SchemaNode, SchemaNodeId, SchemaTree, TypeResolveError};
pub use types::{EnumType, Range, TypeDescriptor, TypeKind};
pub use validate::{ValidationError, ValidationOutput, validate, validate_node};
