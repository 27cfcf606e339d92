//! Schema-driven unmarshal traversal.
//!
//! Recursively matches decoded-JSON fields against schema children and
//! fills the destination arena in place, depth-first. Decoding is
//! fail-fast: the first error aborts the operation. Keyed-list entries
//! derive their map key from the schema-declared key fields of each
//! element, so key consistency holds by construction.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;
use ytree_schema::path::strip_module_prefix;
use ytree_schema::{NodeKind, SchemaNodeId, SchemaTree, TypeKind};
use ytree_value::{DataNodeId, DataNodeValue, DataTree, KeyValue, LeafValue};

use crate::coder::{decode_json, decode_typed, json_type_name};
use crate::config::{EnumLookup, NoEnums, UnmarshalOptions};
use crate::error::UnmarshalError;
use crate::union::{decode_union_json, decode_union_typed};
use crate::wire::TypedValue;

struct UnmarshalContext<'a> {
    schema: &'a SchemaTree,
    options: &'a UnmarshalOptions,
    enums: &'a dyn EnumLookup,
}

/// Unmarshal a decoded JSON value into the data node `data_id`, which
/// must correspond to the schema node `schema_id`.
pub fn unmarshal(
    schema: &SchemaTree,
    schema_id: SchemaNodeId,
    data: &mut DataTree,
    data_id: DataNodeId,
    value: &Value,
    options: &UnmarshalOptions,
) -> Result<(), UnmarshalError> {
    unmarshal_with_enums(schema, schema_id, data, data_id, value, options, &NoEnums)
}

/// Like [`unmarshal`], with an external enum-table capability.
pub fn unmarshal_with_enums(
    schema: &SchemaTree,
    schema_id: SchemaNodeId,
    data: &mut DataTree,
    data_id: DataNodeId,
    value: &Value,
    options: &UnmarshalOptions,
    enums: &dyn EnumLookup,
) -> Result<(), UnmarshalError> {
    let ctx = UnmarshalContext {
        schema,
        options,
        enums,
    };
    let node = schema.node(schema_id);
    debug!(node = %node.name, kind = %node.kind, "unmarshaling");

    if node.kind == NodeKind::Choice {
        return Err(UnmarshalError::SchemaInvalid {
            field: node.name.clone(),
            reason: "choice nodes cannot be unmarshaled directly".to_string(),
        });
    }
    schema
        .verify_node(schema_id)
        .map_err(|defect| UnmarshalError::SchemaInvalid {
            field: node.name.clone(),
            reason: defect.to_string(),
        })?;

    match node.kind {
        NodeKind::Container | NodeKind::Case => {
            fill_container(&ctx, schema_id, data, data_id, value)
        }
        NodeKind::List => fill_list(&ctx, schema_id, data, data_id, value),
        NodeKind::Leaf => {
            let decoded = decode_leaf(&ctx, schema_id, &node.name, value)?;
            data.node_mut(data_id).content = DataNodeValue::Leaf(decoded);
            Ok(())
        }
        NodeKind::LeafList => {
            let decoded = decode_leaf_list(&ctx, schema_id, &node.name, value)?;
            data.node_mut(data_id).content = DataNodeValue::LeafList(decoded);
            Ok(())
        }
        NodeKind::Choice => unreachable!("rejected above"),
    }
}

/// Unmarshal a wire typed-value into the leaf or leaf-list node
/// `data_id`. Wire values carry scalars only; containers and lists
/// arrive as JSON.
pub fn unmarshal_typed(
    schema: &SchemaTree,
    schema_id: SchemaNodeId,
    data: &mut DataTree,
    data_id: DataNodeId,
    value: &TypedValue,
    options: &UnmarshalOptions,
) -> Result<(), UnmarshalError> {
    unmarshal_typed_with_enums(schema, schema_id, data, data_id, value, options, &NoEnums)
}

/// Like [`unmarshal_typed`], with an external enum-table capability.
pub fn unmarshal_typed_with_enums(
    schema: &SchemaTree,
    schema_id: SchemaNodeId,
    data: &mut DataTree,
    data_id: DataNodeId,
    value: &TypedValue,
    options: &UnmarshalOptions,
    enums: &dyn EnumLookup,
) -> Result<(), UnmarshalError> {
    let ctx = UnmarshalContext {
        schema,
        options,
        enums,
    };
    let node = schema.node(schema_id);
    debug!(node = %node.name, kind = %node.kind, "unmarshaling typed value");

    schema
        .verify_node(schema_id)
        .map_err(|defect| UnmarshalError::SchemaInvalid {
            field: node.name.clone(),
            reason: defect.to_string(),
        })?;

    match node.kind {
        NodeKind::Leaf => {
            let decoded = decode_leaf_typed(&ctx, schema_id, &node.name, value)?;
            data.node_mut(data_id).content = DataNodeValue::Leaf(decoded);
            Ok(())
        }
        NodeKind::LeafList => match value {
            TypedValue::LeafList(items) => {
                let mut decoded = Vec::with_capacity(items.len());
                for item in items {
                    decoded.push(decode_leaf_typed(&ctx, schema_id, &node.name, item)?);
                }
                data.node_mut(data_id).content = DataNodeValue::LeafList(decoded);
                Ok(())
            }
            other => Err(UnmarshalError::TypeMismatch {
                field: node.name.clone(),
                expected: "leaf-list".to_string(),
                actual: other.type_name().to_string(),
            }),
        },
        other => Err(UnmarshalError::SchemaInvalid {
            field: node.name.clone(),
            reason: format!("wire typed-values decode into leaves, not {other}"),
        }),
    }
}

fn fill_container(
    ctx: &UnmarshalContext<'_>,
    schema_id: SchemaNodeId,
    data: &mut DataTree,
    data_id: DataNodeId,
    value: &Value,
) -> Result<(), UnmarshalError> {
    let parent_name = &ctx.schema.node(schema_id).name;
    let Value::Object(fields) = value else {
        return Err(UnmarshalError::TypeMismatch {
            field: parent_name.clone(),
            expected: "object".to_string(),
            actual: json_type_name(value).to_string(),
        });
    };

    for (raw_name, field_value) in fields {
        // Annotation fields have no schema counterpart and are skipped.
        if raw_name.starts_with('@') {
            continue;
        }
        let name = strip_module_prefix(raw_name)?;

        let Some(child_id) = ctx.schema.data_child(schema_id, name) else {
            if ctx.options.ignore_unknown_fields {
                continue;
            }
            return Err(UnmarshalError::UnexpectedField {
                parent: parent_name.clone(),
                field: raw_name.clone(),
            });
        };

        match ctx.schema.node(child_id).kind {
            NodeKind::Leaf => {
                let decoded = decode_leaf(ctx, child_id, name, field_value)?;
                data.set_leaf(data_id, name, decoded)?;
            }
            NodeKind::LeafList => {
                let decoded = decode_leaf_list(ctx, child_id, name, field_value)?;
                append_leaf_list(data, data_id, name, decoded)?;
            }
            NodeKind::Container => {
                let child_data = data.ensure_container(data_id, name)?;
                fill_container(ctx, child_id, data, child_data, field_value)?;
            }
            NodeKind::List => {
                let keyed = ctx.schema.node(child_id).key.is_some();
                let list_data = match data.child(data_id, name) {
                    Some(existing) => existing,
                    None => {
                        let content = if keyed {
                            DataNodeValue::KeyedList {
                                entries: IndexMap::new(),
                            }
                        } else {
                            DataNodeValue::UnkeyedList {
                                entries: Vec::new(),
                            }
                        };
                        data.add_child(data_id, name, content)?
                    }
                };
                fill_list(ctx, child_id, data, list_data, field_value)?;
            }
            // data_child never yields choice or case nodes.
            NodeKind::Choice | NodeKind::Case => unreachable!(),
        }
    }
    Ok(())
}

fn fill_list(
    ctx: &UnmarshalContext<'_>,
    schema_id: SchemaNodeId,
    data: &mut DataTree,
    list_data: DataNodeId,
    value: &Value,
) -> Result<(), UnmarshalError> {
    let node = ctx.schema.node(schema_id);
    let Value::Array(items) = value else {
        return Err(UnmarshalError::TypeMismatch {
            field: node.name.clone(),
            expected: "array".to_string(),
            actual: json_type_name(value).to_string(),
        });
    };

    let key_fields = node.key_fields();
    for item in items {
        let entry_id = if key_fields.is_empty() {
            data.push_entry(list_data)?
        } else {
            let key = derive_key(ctx, schema_id, &key_fields, item)?;
            data.ensure_entry(list_data, key)?
        };
        fill_container(ctx, schema_id, data, entry_id, item)?;
    }
    Ok(())
}

/// Build the map key of a keyed-list entry from its key fields, in
/// declaration order. Composite keys become a tuple.
fn derive_key(
    ctx: &UnmarshalContext<'_>,
    schema_id: SchemaNodeId,
    key_fields: &[&str],
    item: &Value,
) -> Result<KeyValue, UnmarshalError> {
    let list_name = &ctx.schema.node(schema_id).name;
    let Value::Object(fields) = item else {
        return Err(UnmarshalError::TypeMismatch {
            field: list_name.clone(),
            expected: "object".to_string(),
            actual: json_type_name(item).to_string(),
        });
    };

    let mut parts = Vec::with_capacity(key_fields.len());
    for field in key_fields {
        let raw = fields.get(*field).or_else(|| {
            fields.iter().find_map(|(k, v)| {
                (strip_module_prefix(k) == Ok(*field)).then_some(v)
            })
        });
        let Some(raw) = raw else {
            return Err(UnmarshalError::MissingKey {
                field: list_name.clone(),
                key: field.to_string(),
            });
        };
        let leaf_id = ctx.schema.child(schema_id, field).ok_or_else(|| {
            UnmarshalError::SchemaInvalid {
                field: list_name.clone(),
                reason: format!("list declares key field '{field}' but has no such child"),
            }
        })?;
        let decoded = decode_leaf(ctx, leaf_id, field, raw)?;
        let part = decoded
            .scalar()
            .to_key()
            .ok_or_else(|| UnmarshalError::InvalidValue {
                field: field.to_string(),
                reason: format!("{} cannot key a list entry", decoded.kind().name()),
            })?;
        parts.push(part);
    }

    Ok(if parts.len() == 1 {
        parts.remove(0)
    } else {
        KeyValue::Tuple(parts)
    })
}

fn append_leaf_list(
    data: &mut DataTree,
    parent: DataNodeId,
    name: &str,
    values: Vec<LeafValue>,
) -> Result<(), UnmarshalError> {
    if let Some(existing) = data.child(parent, name) {
        if let DataNodeValue::LeafList(list) = &mut data.node_mut(existing).content {
            list.extend(values);
            return Ok(());
        }
        data.node_mut(existing).content = DataNodeValue::LeafList(values);
        return Ok(());
    }
    data.add_child(parent, name, DataNodeValue::LeafList(values))?;
    Ok(())
}

fn decode_leaf(
    ctx: &UnmarshalContext<'_>,
    schema_id: SchemaNodeId,
    field: &str,
    value: &Value,
) -> Result<LeafValue, UnmarshalError> {
    let desc = ctx.schema.node(schema_id).type_desc.as_ref().ok_or_else(|| {
        UnmarshalError::SchemaInvalid {
            field: field.to_string(),
            reason: "leaf has no type descriptor".to_string(),
        }
    })?;
    match desc.kind {
        TypeKind::Union => decode_union_json(ctx.schema, schema_id, desc, field, value, ctx.enums),
        TypeKind::Leafref => {
            let (target_id, target_desc) = ctx
                .schema
                .resolve_leafref_type(schema_id, desc)
                .map_err(|e| UnmarshalError::SchemaInvalid {
                    field: field.to_string(),
                    reason: e.to_string(),
                })?;
            if target_desc.kind == TypeKind::Union {
                decode_union_json(ctx.schema, target_id, target_desc, field, value, ctx.enums)
            } else {
                decode_json(target_desc, field, value, ctx.enums).map(LeafValue::Scalar)
            }
        }
        _ => decode_json(desc, field, value, ctx.enums).map(LeafValue::Scalar),
    }
}

fn decode_leaf_list(
    ctx: &UnmarshalContext<'_>,
    schema_id: SchemaNodeId,
    field: &str,
    value: &Value,
) -> Result<Vec<LeafValue>, UnmarshalError> {
    let Value::Array(items) = value else {
        return Err(UnmarshalError::TypeMismatch {
            field: field.to_string(),
            expected: "array".to_string(),
            actual: json_type_name(value).to_string(),
        });
    };
    let mut decoded = Vec::with_capacity(items.len());
    for item in items {
        decoded.push(decode_leaf(ctx, schema_id, field, item)?);
    }
    Ok(decoded)
}

fn decode_leaf_typed(
    ctx: &UnmarshalContext<'_>,
    schema_id: SchemaNodeId,
    field: &str,
    value: &TypedValue,
) -> Result<LeafValue, UnmarshalError> {
    let desc = ctx.schema.node(schema_id).type_desc.as_ref().ok_or_else(|| {
        UnmarshalError::SchemaInvalid {
            field: field.to_string(),
            reason: "leaf has no type descriptor".to_string(),
        }
    })?;
    match desc.kind {
        TypeKind::Union => decode_union_typed(ctx.schema, schema_id, desc, field, value, ctx.enums),
        TypeKind::Leafref => {
            let (target_id, target_desc) = ctx
                .schema
                .resolve_leafref_type(schema_id, desc)
                .map_err(|e| UnmarshalError::SchemaInvalid {
                    field: field.to_string(),
                    reason: e.to_string(),
                })?;
            if target_desc.kind == TypeKind::Union {
                decode_union_typed(ctx.schema, target_id, target_desc, field, value, ctx.enums)
            } else {
                decode_typed(target_desc, field, value, ctx.enums).map(LeafValue::Scalar)
            }
        }
        _ => decode_typed(desc, field, value, ctx.enums).map(LeafValue::Scalar),
    }
}
