//! Structural traversal: containers, lists, choices and leaves.
//!
//! Matches each data field against its schema counterpart and
//! dispatches per schema kind. Choice cases are flattened into the
//! containing record, so exclusivity is enforced by mapping populated
//! fields back to their owning (choice, case) pairs.

use ahash::AHashSet;
use indexmap::IndexMap;
use ytree_value::{DataNodeId, DataNodeValue, KeyValue, LeafValue};

use crate::schema::{NodeKind, SchemaNodeId};
use crate::types::{TypeDescriptor, TypeKind};

use super::context::ValidationContext;
use super::error::ValidationError;
use super::leaf::check_scalar;
use super::union::validate_union;

/// Defensive bound on schema recursion. The schema format does not
/// itself prevent accidental self-reference.
pub(crate) const MAX_SCHEMA_DEPTH: usize = 256;

/// Validate the subtree rooted at `data_id` against `schema_id`.
pub fn validate_subtree(
    ctx: &ValidationContext<'_>,
    schema_id: SchemaNodeId,
    data_id: DataNodeId,
    depth: usize,
) {
    if depth > MAX_SCHEMA_DEPTH {
        let schema_node = ctx.schema.node(schema_id);
        ctx.record_error(ValidationError::SchemaInvalid {
            node: schema_node.name.clone(),
            reason: format!("schema nesting exceeds {MAX_SCHEMA_DEPTH} levels"),
            path: ctx.path(),
        });
        return;
    }
    if let Err(defect) = ctx.schema.verify_node(schema_id) {
        ctx.record_error(ValidationError::SchemaInvalid {
            node: ctx.schema.node(schema_id).name.clone(),
            reason: defect.to_string(),
            path: ctx.path(),
        });
        return;
    }

    let schema_node = ctx.schema.node(schema_id);
    let content = &ctx.data.node(data_id).content;

    match (schema_node.kind, content) {
        (NodeKind::Container | NodeKind::Case, DataNodeValue::Container { .. }) => {
            validate_fields(ctx, schema_id, data_id, depth);
        }
        (NodeKind::List, DataNodeValue::KeyedList { entries }) => {
            check_element_count(ctx, schema_id, entries.len() as u64);
            for (key, &entry_id) in entries {
                ctx.push_key(key.clone());
                check_entry_key(ctx, schema_id, key, entry_id);
                validate_fields(ctx, schema_id, entry_id, depth);
                ctx.pop_path();
            }
        }
        (NodeKind::List, DataNodeValue::UnkeyedList { entries }) => {
            check_element_count(ctx, schema_id, entries.len() as u64);
            for (index, &entry_id) in entries.iter().enumerate() {
                ctx.push_index(index);
                validate_fields(ctx, schema_id, entry_id, depth);
                ctx.pop_path();
            }
        }
        // A single entry validated through its list schema.
        (NodeKind::List, DataNodeValue::Container { .. }) => {
            validate_fields(ctx, schema_id, data_id, depth);
        }
        (NodeKind::Leaf, DataNodeValue::Leaf(value)) => {
            // verify_node guarantees the descriptor is present.
            if let Some(desc) = &schema_node.type_desc {
                validate_leaf_value(ctx, schema_id, desc, value);
            }
        }
        (NodeKind::LeafList, DataNodeValue::LeafList(values)) => {
            check_element_count(ctx, schema_id, values.len() as u64);
            if let Some(desc) = &schema_node.type_desc {
                for (index, value) in values.iter().enumerate() {
                    ctx.push_index(index);
                    validate_leaf_value(ctx, schema_id, desc, value);
                    ctx.pop_path();
                }
            }
        }
        (NodeKind::Choice, _) => {
            ctx.record_error(ValidationError::SchemaInvalid {
                node: schema_node.name.clone(),
                reason: "choice nodes have no data counterpart".to_string(),
                path: ctx.path(),
            });
        }
        (expected, actual) => {
            ctx.record_error(ValidationError::TypeMismatch {
                expected: expected.name().to_string(),
                actual: actual.type_name().to_string(),
                path: ctx.path(),
            });
        }
    }
}

/// Validate the fields of a container-shaped data node (a container, a
/// case, or a list entry) against the children of `schema_id`.
fn validate_fields(
    ctx: &ValidationContext<'_>,
    schema_id: SchemaNodeId,
    data_id: DataNodeId,
    depth: usize,
) {
    let DataNodeValue::Container { children } = &ctx.data.node(data_id).content else {
        return;
    };

    for (name, &child_id) in children {
        // Annotation fields have no schema counterpart.
        if name.starts_with('@') {
            continue;
        }
        match ctx.schema.data_child(schema_id, name) {
            Some(child_schema) => {
                ctx.push_field(name);
                validate_subtree(ctx, child_schema, child_id, depth + 1);
                ctx.pop_path();
            }
            None => {
                if !ctx.options.allow_unknown_fields {
                    ctx.record_error(ValidationError::UnexpectedField {
                        field: name.clone(),
                        path: ctx.path(),
                    });
                }
            }
        }
    }

    check_choices(ctx, schema_id, children);
}

/// Enforce the at-most-one-case-selected invariant for every choice
/// reachable from this container's fields.
fn check_choices(
    ctx: &ValidationContext<'_>,
    schema_id: SchemaNodeId,
    children: &IndexMap<String, DataNodeId>,
) {
    let mut selected: IndexMap<SchemaNodeId, Vec<SchemaNodeId>> = IndexMap::new();
    let mut seen: AHashSet<(SchemaNodeId, SchemaNodeId)> = AHashSet::new();

    for name in children.keys() {
        if name.starts_with('@') {
            continue;
        }
        let Some(child_schema) = ctx.schema.data_child(schema_id, name) else {
            continue;
        };
        for (choice, case) in ctx.schema.owning_cases(schema_id, child_schema) {
            if seen.insert((choice, case)) {
                selected.entry(choice).or_default().push(case);
            }
        }
    }

    for (choice, cases) in selected {
        if cases.len() > 1 {
            ctx.record_error(ValidationError::ChoiceMultipleCases {
                choice: ctx.schema.node(choice).name.clone(),
                cases: cases
                    .iter()
                    .map(|c| ctx.schema.node(*c).name.clone())
                    .collect(),
                path: ctx.path(),
            });
        }
    }
}

fn check_element_count(ctx: &ValidationContext<'_>, schema_id: SchemaNodeId, actual: u64) {
    let schema_node = ctx.schema.node(schema_id);
    if let Some(min) = schema_node.min_elements
        && actual < min
    {
        ctx.record_error(ValidationError::TooFewElements {
            actual,
            min,
            path: ctx.path(),
        });
    }
    if let Some(max) = schema_node.max_elements
        && actual > max
    {
        ctx.record_error(ValidationError::TooManyElements {
            actual,
            max,
            path: ctx.path(),
        });
    }
}

/// Verify that a keyed-list entry's map key equals the value(s) of the
/// schema-declared key field(s) inside the entry.
fn check_entry_key(
    ctx: &ValidationContext<'_>,
    schema_id: SchemaNodeId,
    key: &KeyValue,
    entry_id: DataNodeId,
) {
    let schema_node = ctx.schema.node(schema_id);
    let fields = schema_node.key_fields();
    match fields.as_slice() {
        [] => {}
        [field] => check_key_component(ctx, entry_id, field, key),
        composite => match key {
            KeyValue::Tuple(parts) if parts.len() == composite.len() => {
                for (field, part) in composite.iter().zip(parts) {
                    check_key_component(ctx, entry_id, field, part);
                }
            }
            other => {
                ctx.record_error(ValidationError::KeyConsistency {
                    key: other.to_string(),
                    field: composite.join(" "),
                    value: format!("composite key of {} fields", composite.len()),
                    path: ctx.path(),
                });
            }
        },
    }
}

fn check_key_component(
    ctx: &ValidationContext<'_>,
    entry_id: DataNodeId,
    field: &str,
    expected: &KeyValue,
) {
    let Some(leaf_id) = ctx.data.child(entry_id, field) else {
        ctx.record_error(ValidationError::MissingKeyField {
            field: field.to_string(),
            path: ctx.path(),
        });
        return;
    };
    let actual = match &ctx.data.node(leaf_id).content {
        DataNodeValue::Leaf(value) => value.scalar().to_key(),
        _ => None,
    };
    match actual {
        Some(actual) if &actual == expected => {}
        Some(actual) => {
            ctx.record_error(ValidationError::KeyConsistency {
                key: expected.to_string(),
                field: field.to_string(),
                value: actual.to_string(),
                path: ctx.path(),
            });
        }
        None => {
            ctx.record_error(ValidationError::KeyConsistency {
                key: expected.to_string(),
                field: field.to_string(),
                value: "a value unusable as a key".to_string(),
                path: ctx.path(),
            });
        }
    }
}

/// Validate one leaf (or leaf-list element) value against its type.
pub(crate) fn validate_leaf_value(
    ctx: &ValidationContext<'_>,
    schema_id: SchemaNodeId,
    desc: &TypeDescriptor,
    value: &LeafValue,
) {
    match desc.kind {
        TypeKind::Union => validate_union(ctx, schema_id, desc, value),
        TypeKind::Leafref => {
            // The value must conform to the target's type; referential
            // integrity is checked in the global leafref pass.
            match ctx.schema.resolve_leafref_type(schema_id, desc) {
                Ok((target_id, target_desc)) => {
                    if target_desc.kind == TypeKind::Union {
                        validate_union(ctx, target_id, target_desc, value);
                    } else {
                        check_concrete(ctx, target_desc, value);
                    }
                }
                Err(e) => {
                    ctx.record_error(ValidationError::SchemaInvalid {
                        node: ctx.schema.node(schema_id).name.clone(),
                        reason: e.to_string(),
                        path: ctx.path(),
                    });
                }
            }
        }
        _ => check_concrete(ctx, desc, value),
    }
}

fn check_concrete(ctx: &ValidationContext<'_>, desc: &TypeDescriptor, value: &LeafValue) {
    if let LeafValue::Union(wrapper) = value
        && !wrapper.is_consistent()
    {
        ctx.record_error(ValidationError::Structural {
            recorded: wrapper.kind.name().to_string(),
            actual: wrapper.value.kind().name().to_string(),
            path: ctx.path(),
        });
        return;
    }
    let path = ctx.path();
    for error in check_scalar(desc, value.scalar(), &path) {
        ctx.record_error(error);
    }
}
