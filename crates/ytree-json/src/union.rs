//! Union decode dispatch.
//!
//! Alternatives are flattened through the schema (nested unions
//! entered, leafref alternatives dereferenced to their target types)
//! and tried in declaration order; the first successful decode wins.
//! Enumeration alternatives are tried before everything else, since a
//! string must resolve as an enum symbol before falling back to a
//! literal string. When every alternative maps to one representation
//! the value decodes directly, without a wrapper.

use serde_json::Value;
use ytree_schema::{SchemaNodeId, SchemaTree, TypeDescriptor, TypeKind};
use ytree_value::{LeafValue, UnionScalar};

use crate::coder::{decode_json, decode_typed, json_type_name};
use crate::config::EnumLookup;
use crate::error::UnmarshalError;
use crate::wire::TypedValue;

fn is_enum_kind(kind: TypeKind) -> bool {
    matches!(kind, TypeKind::Enumeration | TypeKind::Identityref)
}

/// Whether the union collapses to one native representation: a single
/// alternative, or several alternatives of one identical scalar kind.
/// Enumeration and identityref alternatives each count as their own
/// representation, since each carries its own value table.
fn single_representation(alternatives: &[&TypeDescriptor]) -> bool {
    if alternatives.len() == 1 {
        return true;
    }
    let first = alternatives[0].kind;
    if is_enum_kind(first) {
        return false;
    }
    alternatives.iter().all(|a| a.kind == first)
}

fn alternatives<'a>(
    schema: &'a SchemaTree,
    at: SchemaNodeId,
    desc: &'a TypeDescriptor,
    field: &str,
) -> Result<Vec<&'a TypeDescriptor>, UnmarshalError> {
    let alts = schema
        .concrete_alternatives(at, desc)
        .map_err(|e| UnmarshalError::SchemaInvalid {
            field: field.to_string(),
            reason: e.to_string(),
        })?;
    if alts.is_empty() {
        return Err(UnmarshalError::SchemaInvalid {
            field: field.to_string(),
            reason: "union has no alternatives".to_string(),
        });
    }
    Ok(alts)
}

/// Decode a JSON value against a union type.
pub(crate) fn decode_union_json(
    schema: &SchemaTree,
    at: SchemaNodeId,
    desc: &TypeDescriptor,
    field: &str,
    value: &Value,
    enums: &dyn EnumLookup,
) -> Result<LeafValue, UnmarshalError> {
    let alts = alternatives(schema, at, desc, field)?;

    if single_representation(&alts) {
        return decode_json(alts[0], field, value, enums).map(LeafValue::Scalar);
    }

    for alt in alts.iter().filter(|a| is_enum_kind(a.kind)) {
        if let Ok(v) = decode_json(alt, field, value, enums) {
            return Ok(LeafValue::Union(UnionScalar::new(v)));
        }
    }
    for alt in alts.iter().filter(|a| !is_enum_kind(a.kind)) {
        if let Ok(v) = decode_json(alt, field, value, enums) {
            return Ok(LeafValue::Union(UnionScalar::new(v)));
        }
    }

    Err(UnmarshalError::NoSuitableUnionType {
        field: field.to_string(),
        value: value.to_string(),
        value_type: json_type_name(value).to_string(),
    })
}

/// Decode a wire typed-value against a union type.
pub(crate) fn decode_union_typed(
    schema: &SchemaTree,
    at: SchemaNodeId,
    desc: &TypeDescriptor,
    field: &str,
    value: &TypedValue,
    enums: &dyn EnumLookup,
) -> Result<LeafValue, UnmarshalError> {
    let alts = alternatives(schema, at, desc, field)?;

    if single_representation(&alts) {
        return decode_typed(alts[0], field, value, enums).map(LeafValue::Scalar);
    }

    for alt in alts.iter().filter(|a| is_enum_kind(a.kind)) {
        if let Ok(v) = decode_typed(alt, field, value, enums) {
            return Ok(LeafValue::Union(UnionScalar::new(v)));
        }
    }
    for alt in alts.iter().filter(|a| !is_enum_kind(a.kind)) {
        if let Ok(v) = decode_typed(alt, field, value, enums) {
            return Ok(LeafValue::Union(UnionScalar::new(v)));
        }
    }

    Err(UnmarshalError::NoSuitableUnionType {
        field: field.to_string(),
        value: format!("{value:?}"),
        value_type: value.type_name().to_string(),
    })
}
