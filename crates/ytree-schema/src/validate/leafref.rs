//! Global leafref referential-integrity pass.
//!
//! One top-to-bottom walk of the data tree, driven by the schema,
//! visiting every populated leafref leaf. Each frame threads the
//! current data-node id explicitly, because `current()` in a predicate
//! re-anchors at the data position of the node instantiating the
//! reference: the same schema leafref, instantiated once per list
//! entry, resolves independently per entry. Resolutions are never
//! cached across anchors.

use tracing::trace;
use ytree_value::{DataNodeId, DataNodeValue, LeafValue, ScalarValue};

use crate::path::{
    CurrentStep, ParsedPath, PathStep, Predicate, PredicateValue, parse_path, resolve_parsed,
};
use crate::schema::SchemaNodeId;
use crate::types::TypeKind;

use super::container::MAX_SCHEMA_DEPTH;
use super::context::ValidationContext;
use super::error::ValidationError;

/// Walk the whole tree from the root, checking every leafref.
///
/// Only invoked when validation starts at the schema root, since
/// targets may be anywhere in the tree, not just under the subtree
/// otherwise being validated.
pub fn validate_leafrefs(
    ctx: &ValidationContext<'_>,
    schema_id: SchemaNodeId,
    data_id: DataNodeId,
) {
    visit(ctx, schema_id, data_id, 0);
}

fn visit(ctx: &ValidationContext<'_>, schema_id: SchemaNodeId, data_id: DataNodeId, depth: usize) {
    if depth > MAX_SCHEMA_DEPTH {
        return;
    }
    match &ctx.data.node(data_id).content {
        DataNodeValue::Container { children } => {
            for (name, &child_id) in children {
                if name.starts_with('@') {
                    continue;
                }
                if let Some(child_schema) = ctx.schema.data_child(schema_id, name) {
                    ctx.push_field(name);
                    visit(ctx, child_schema, child_id, depth + 1);
                    ctx.pop_path();
                }
            }
        }
        DataNodeValue::KeyedList { entries } => {
            for (key, &entry_id) in entries {
                ctx.push_key(key.clone());
                visit_entry_fields(ctx, schema_id, entry_id, depth);
                ctx.pop_path();
            }
        }
        DataNodeValue::UnkeyedList { entries } => {
            for (index, &entry_id) in entries.iter().enumerate() {
                ctx.push_index(index);
                visit_entry_fields(ctx, schema_id, entry_id, depth);
                ctx.pop_path();
            }
        }
        DataNodeValue::Leaf(value) => {
            if let Some(path_expr) = leafref_path(ctx, schema_id) {
                check_leafref(ctx, schema_id, path_expr, data_id, std::slice::from_ref(value));
            }
        }
        DataNodeValue::LeafList(values) => {
            if let Some(path_expr) = leafref_path(ctx, schema_id)
                && !values.is_empty()
            {
                check_leafref(ctx, schema_id, path_expr, data_id, values);
            }
        }
    }
}

fn visit_entry_fields(
    ctx: &ValidationContext<'_>,
    schema_id: SchemaNodeId,
    entry_id: DataNodeId,
    depth: usize,
) {
    if let DataNodeValue::Container { children } = &ctx.data.node(entry_id).content {
        for (name, &child_id) in children {
            if name.starts_with('@') {
                continue;
            }
            if let Some(child_schema) = ctx.schema.data_child(schema_id, name) {
                ctx.push_field(name);
                visit(ctx, child_schema, child_id, depth + 1);
                ctx.pop_path();
            }
        }
    }
}

fn leafref_path<'a>(ctx: &ValidationContext<'a>, schema_id: SchemaNodeId) -> Option<&'a str> {
    let desc = ctx.schema.node(schema_id).type_desc.as_ref()?;
    if desc.kind == TypeKind::Leafref {
        desc.path.as_deref()
    } else {
        None
    }
}

/// Check one leafref instantiation: all of `values` must be present in
/// the target value set (a single leaf passes one value; a leaf-list
/// passes all its elements, interpreted as a subset requirement).
fn check_leafref(
    ctx: &ValidationContext<'_>,
    schema_id: SchemaNodeId,
    path_expr: &str,
    anchor: DataNodeId,
    values: &[LeafValue],
) {
    trace!(path = path_expr, "checking leafref");

    let parsed = match parse_path(path_expr) {
        Ok(parsed) => parsed,
        Err(source) => {
            ctx.record_error(ValidationError::PathSyntax {
                source,
                path: ctx.path(),
            });
            return;
        }
    };

    // The schema-side address must resolve; failure here is a schema
    // defect, not missing data.
    if let Err(e) = resolve_parsed(ctx.schema, schema_id, &parsed) {
        ctx.record_error(ValidationError::SchemaInvalid {
            node: ctx.schema.node(schema_id).name.clone(),
            reason: e.to_string(),
            path: ctx.path(),
        });
        return;
    }

    let targets = eval_data_path(ctx, &parsed, anchor);

    if targets.is_empty() {
        if !ctx.options.ignore_missing_data {
            ctx.record_error(ValidationError::UnresolvedPath {
                target: path_expr.to_string(),
                path: ctx.path(),
            });
        }
        return;
    }

    for value in values {
        let scalar = value.scalar();
        if !targets.iter().any(|t| scalar_eq(t, scalar)) {
            ctx.record_error(ValidationError::DanglingReference {
                value: scalar.to_string(),
                target: path_expr.to_string(),
                path: ctx.path(),
            });
        }
    }
}

/// Evaluate a parsed path against the data tree from `anchor`,
/// collecting every scalar present at the target location. A path
/// descending through a list fans out to every entry, or to the
/// entries selected by its predicates.
fn eval_data_path(
    ctx: &ValidationContext<'_>,
    parsed: &ParsedPath,
    anchor: DataNodeId,
) -> Vec<ScalarValue> {
    let mut nodes: Vec<DataNodeId> = if parsed.absolute {
        vec![ctx.data.root_id()]
    } else {
        vec![anchor]
    };

    for step in &parsed.steps {
        let mut next = Vec::new();
        match step {
            PathStep::Up => {
                for node in nodes {
                    if let Some(parent) = ctx.data.structural_parent(node) {
                        next.push(parent);
                    }
                }
            }
            PathStep::Named { name, predicates } => {
                for node in nodes {
                    let Some(child) = ctx.data.child(node, name) else {
                        continue;
                    };
                    match &ctx.data.node(child).content {
                        DataNodeValue::KeyedList { entries } => {
                            for &entry_id in entries.values() {
                                if predicates_match(ctx, entry_id, predicates, anchor) {
                                    next.push(entry_id);
                                }
                            }
                        }
                        DataNodeValue::UnkeyedList { entries } => {
                            for &entry_id in entries {
                                if predicates_match(ctx, entry_id, predicates, anchor) {
                                    next.push(entry_id);
                                }
                            }
                        }
                        _ => {
                            if predicates.is_empty() {
                                next.push(child);
                            }
                        }
                    }
                }
            }
        }
        nodes = next;
        if nodes.is_empty() {
            break;
        }
    }

    let mut out = Vec::new();
    for node in nodes {
        match &ctx.data.node(node).content {
            DataNodeValue::Leaf(value) => out.push(value.scalar().clone()),
            DataNodeValue::LeafList(values) => {
                out.extend(values.iter().map(|v| v.scalar().clone()));
            }
            _ => {}
        }
    }
    out
}

/// Whether a list entry satisfies every predicate of a path segment.
/// `current()` re-anchors at the referencing node's own data position,
/// recomputed per instantiation.
fn predicates_match(
    ctx: &ValidationContext<'_>,
    entry_id: DataNodeId,
    predicates: &[Predicate],
    anchor: DataNodeId,
) -> bool {
    for predicate in predicates {
        let Some(key_id) = ctx.data.child(entry_id, &predicate.key) else {
            return false;
        };
        let DataNodeValue::Leaf(key_value) = &ctx.data.node(key_id).content else {
            return false;
        };
        let key_scalar = key_value.scalar();

        let matched = match &predicate.value {
            PredicateValue::Literal(expected) => key_scalar.to_string() == *expected,
            PredicateValue::Current(steps) => match eval_current(ctx, anchor, steps) {
                Some(expected) => scalar_eq(key_scalar, &expected),
                None => false,
            },
        };
        if !matched {
            return false;
        }
    }
    true
}

/// Evaluate the steps following `current()` from the referencing node.
fn eval_current(
    ctx: &ValidationContext<'_>,
    anchor: DataNodeId,
    steps: &[CurrentStep],
) -> Option<ScalarValue> {
    let mut cur = anchor;
    for step in steps {
        cur = match step {
            CurrentStep::Up => ctx.data.structural_parent(cur)?,
            CurrentStep::Child(name) => ctx.data.child(cur, name)?,
        };
    }
    match &ctx.data.node(cur).content {
        DataNodeValue::Leaf(value) => Some(value.scalar().clone()),
        _ => None,
    }
}

/// Equality across integer widths: a uint8 leaf equals a uint64 target
/// holding the same number. Non-integer kinds compare directly.
fn scalar_eq(a: &ScalarValue, b: &ScalarValue) -> bool {
    match (a.as_int(), b.as_int()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
