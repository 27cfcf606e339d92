//! Data-tree validation.
//!
//! # Architecture
//!
//! - `validate`/`validate_node`: entry points dispatching on the schema
//!   node kind
//! - `container`: structural traversal (containers, lists, choices,
//!   leaves) with key-consistency and choice-exclusivity checks
//! - `union`: union alternative dispatch (declaration order,
//!   first-match-wins)
//! - `leafref`: global referential-integrity pass, run once from the
//!   root
//! - `context`: shared state (current path, accumulated errors)
//!
//! # Error Handling
//!
//! Violations are accumulated, not short-circuited: one call returns
//! every problem found across the (sub)tree. A malformed schema node
//! records a `SchemaInvalid` error and its subtree is skipped.

mod container;
mod context;
mod error;
mod leaf;
mod leafref;
mod union;

pub use context::{ValidationContext, ValidationOutput, ValidationState};
pub use error::ValidationError;
pub use leaf::check_scalar;

use tracing::debug;
use ytree_value::{DataNodeId, DataTree};

use crate::options::ValidationOptions;
use crate::schema::{NodeKind, SchemaNodeId, SchemaTree};

/// Validate a data tree against a schema tree, from their roots.
///
/// Returns every violation found anywhere in the tree. The data tree is
/// never mutated; validating twice yields identical outputs.
pub fn validate(
    schema: &SchemaTree,
    data: &DataTree,
    options: &ValidationOptions,
) -> ValidationOutput {
    validate_node(schema, schema.root_id(), data, data.root_id(), options)
}

/// Validate the data subtree at `data_id` against the schema node
/// `schema_id`.
///
/// The global leafref pass only runs when `schema_id` is the schema
/// root, since leafref targets may live anywhere in the tree.
pub fn validate_node(
    schema: &SchemaTree,
    schema_id: SchemaNodeId,
    data: &DataTree,
    data_id: DataNodeId,
    options: &ValidationOptions,
) -> ValidationOutput {
    let ctx = ValidationContext::new(schema, data, options);
    let node = schema.node(schema_id);
    debug!(node = %node.name, kind = %node.kind, "validating");

    // Choices are inlined into their container; they are not a valid
    // root for direct invocation.
    if node.kind == NodeKind::Choice {
        ctx.record_error(ValidationError::SchemaInvalid {
            node: node.name.clone(),
            reason: "choice nodes cannot be validated directly".to_string(),
            path: ctx.path(),
        });
        return ctx.finish();
    }

    container::validate_subtree(&ctx, schema_id, data_id, 0);

    if schema.is_root(schema_id) {
        debug!("running global leafref pass");
        leafref::validate_leafrefs(&ctx, schema_id, data_id);
    }

    ctx.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TypeDescriptor, TypeKind};
    use ytree_value::{DataNodeValue, KeyValue, LeafValue, ScalarValue};

    fn keyed_list_schema() -> SchemaTree {
        let mut schema = SchemaTree::new();
        let root = schema.root_id();
        let list = schema.add_list(root, "interface", Some("name"));
        schema.add_leaf(list, "name", TypeDescriptor::of(TypeKind::String));
        schema.add_leaf(list, "mtu", TypeDescriptor::of(TypeKind::Uint16));
        schema
    }

    fn keyed_list_data(name_field: &str) -> DataTree {
        let mut data = DataTree::new();
        let root = data.root_id();
        let list = data
            .add_child(
                root,
                "interface",
                DataNodeValue::KeyedList {
                    entries: Default::default(),
                },
            )
            .unwrap();
        let entry = data.ensure_entry(list, KeyValue::String("x".into())).unwrap();
        data.set_leaf(
            entry,
            "name",
            LeafValue::Scalar(ScalarValue::String(name_field.into())),
        )
        .unwrap();
        data.set_leaf(entry, "mtu", LeafValue::Scalar(ScalarValue::Uint16(1500)))
            .unwrap();
        data
    }

    #[test]
    fn consistent_key_passes() {
        let schema = keyed_list_schema();
        let data = keyed_list_data("x");
        let output = validate(&schema, &data, &ValidationOptions::default());
        assert!(output.is_valid, "{:?}", output.errors);
    }

    #[test]
    fn key_mismatch_reported() {
        let schema = keyed_list_schema();
        let data = keyed_list_data("y");
        let output = validate(&schema, &data, &ValidationOptions::default());
        assert!(!output.is_valid);
        assert!(matches!(
            output.errors.as_slice(),
            [ValidationError::KeyConsistency { .. }]
        ));
    }

    #[test]
    fn unknown_field_reported_unless_allowed() {
        let schema = keyed_list_schema();
        let mut data = DataTree::new();
        let root = data.root_id();
        data.set_leaf(root, "bogus", LeafValue::Scalar(ScalarValue::Bool(true)))
            .unwrap();

        let output = validate(&schema, &data, &ValidationOptions::default());
        assert!(matches!(
            output.errors.as_slice(),
            [ValidationError::UnexpectedField { .. }]
        ));

        let lenient = ValidationOptions::new().allow_unknown_fields(true);
        assert!(validate(&schema, &data, &lenient).is_valid);
    }

    #[test]
    fn annotation_fields_are_skipped() {
        let schema = keyed_list_schema();
        let mut data = DataTree::new();
        let root = data.root_id();
        data.set_leaf(
            root,
            "@timestamp",
            LeafValue::Scalar(ScalarValue::Uint64(1)),
        )
        .unwrap();
        let output = validate(&schema, &data, &ValidationOptions::default());
        assert!(output.is_valid);
    }

    #[test]
    fn choice_root_is_fatal() {
        let mut schema = SchemaTree::new();
        let root = schema.root_id();
        let choice = schema.add_choice(root, "endpoint");
        let data = DataTree::new();
        let output = validate_node(
            &schema,
            choice,
            &data,
            data.root_id(),
            &ValidationOptions::default(),
        );
        assert!(matches!(
            output.errors.as_slice(),
            [ValidationError::SchemaInvalid { .. }]
        ));
    }

    #[test]
    fn validate_is_pure() {
        let schema = keyed_list_schema();
        let data = keyed_list_data("x");
        let before = data.clone();
        let first = validate(&schema, &data, &ValidationOptions::default());
        let second = validate(&schema, &data, &ValidationOptions::default());
        assert_eq!(data, before);
        assert_eq!(first.errors, second.errors);
    }
}
