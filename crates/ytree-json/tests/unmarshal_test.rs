//! Schema-driven unmarshal tests: container/list traversal, union
//! decode ordering, and the decode-then-validate round trip.

use serde_json::json;
use ytree_json::{UnmarshalError, UnmarshalOptions, unmarshal, unmarshal_typed};
use ytree_json::TypedValue;
use ytree_schema::{
    EnumType, SchemaTree, TypeDescriptor, TypeKind, ValidationOptions, validate,
};
use ytree_value::{
    DataNodeValue, DataTree, KeyValue, LeafValue, ScalarKind, ScalarValue,
};

/// root
///   system { hostname: string, timeout: union(enum never | uint32),
///            tags: leaf-list string, debug: empty, counter: int64 }
///   interface[name] { name: string, enabled: bool }
///   route[prefix next-hop] { prefix, next-hop: string, metric: uint32 }
fn device_schema() -> SchemaTree {
    let mut schema = SchemaTree::new();
    let root = schema.root_id();

    let system = schema.add_container(root, "system");
    schema.add_leaf(system, "hostname", TypeDescriptor::of(TypeKind::String));
    schema.add_leaf(
        system,
        "timeout",
        TypeDescriptor::union(vec![
            TypeDescriptor::enumeration(EnumType::new("never", [("NEVER".to_string(), 0)])),
            TypeDescriptor::of(TypeKind::Uint32),
        ]),
    );
    schema.add_leaf_list(system, "tags", TypeDescriptor::of(TypeKind::String));
    schema.add_leaf(system, "debug", TypeDescriptor::of(TypeKind::Empty));
    schema.add_leaf(system, "counter", TypeDescriptor::of(TypeKind::Int64));

    let interface = schema.add_list(root, "interface", Some("name"));
    schema.add_leaf(interface, "name", TypeDescriptor::of(TypeKind::String));
    schema.add_leaf(interface, "enabled", TypeDescriptor::of(TypeKind::Bool));

    let route = schema.add_list(root, "route", Some("prefix next-hop"));
    schema.add_leaf(route, "prefix", TypeDescriptor::of(TypeKind::String));
    schema.add_leaf(route, "next-hop", TypeDescriptor::of(TypeKind::String));
    schema.add_leaf(route, "metric", TypeDescriptor::of(TypeKind::Uint32));

    schema
}

fn unmarshal_root(
    schema: &SchemaTree,
    value: &serde_json::Value,
    options: &UnmarshalOptions,
) -> Result<DataTree, UnmarshalError> {
    let mut data = DataTree::new();
    let root = data.root_id();
    unmarshal(schema, schema.root_id(), &mut data, root, value, options)?;
    Ok(data)
}

#[test]
fn container_and_list_traversal() {
    let schema = device_schema();
    let input = json!({
        "system": {
            "hostname": "rtr0",
            "tags": ["core", "edge"],
            "debug": [null],
            "counter": "9007199254740993"
        },
        "interface": [
            {"name": "eth0", "enabled": true},
            {"name": "eth1", "enabled": false}
        ],
        "route": [
            {"prefix": "10.0.0.0/8", "next-hop": "192.0.2.1", "metric": 5}
        ]
    });
    let data = unmarshal_root(&schema, &input, &UnmarshalOptions::default()).unwrap();

    let root = data.root_id();
    let system = data.child(root, "system").unwrap();
    let hostname = data.child(system, "hostname").unwrap();
    assert_eq!(
        data.node(hostname).content,
        DataNodeValue::Leaf(LeafValue::Scalar(ScalarValue::String("rtr0".into())))
    );

    // 64-bit integers decode from their string form.
    let counter = data.child(system, "counter").unwrap();
    assert_eq!(
        data.node(counter).content,
        DataNodeValue::Leaf(LeafValue::Scalar(ScalarValue::Int64(9007199254740993)))
    );

    let debug = data.child(system, "debug").unwrap();
    assert_eq!(
        data.node(debug).content,
        DataNodeValue::Leaf(LeafValue::Scalar(ScalarValue::Empty))
    );

    // Keyed entries are indexed by their key field.
    let interface = data.child(root, "interface").unwrap();
    let DataNodeValue::KeyedList { entries } = &data.node(interface).content else {
        panic!("expected keyed list");
    };
    assert_eq!(entries.len(), 2);
    assert!(entries.contains_key(&KeyValue::String("eth0".into())));

    // Composite keys become tuples in field declaration order.
    let route = data.child(root, "route").unwrap();
    let DataNodeValue::KeyedList { entries } = &data.node(route).content else {
        panic!("expected keyed list");
    };
    assert!(entries.contains_key(&KeyValue::Tuple(vec![
        KeyValue::String("10.0.0.0/8".into()),
        KeyValue::String("192.0.2.1".into()),
    ])));

    // The decoded tree validates, including derived list keys.
    let output = validate(&schema, &data, &ValidationOptions::default());
    assert!(output.is_valid, "{:?}", output.errors);
}

#[test]
fn missing_key_field_fails() {
    let schema = device_schema();
    let input = json!({"interface": [{"enabled": true}]});
    let err = unmarshal_root(&schema, &input, &UnmarshalOptions::default()).unwrap_err();
    assert!(matches!(err, UnmarshalError::MissingKey { .. }));
}

#[test]
fn unknown_field_is_fatal_unless_ignored() {
    let schema = device_schema();
    let input = json!({"system": {"hostname": "rtr0", "bogus": 1}});

    let err = unmarshal_root(&schema, &input, &UnmarshalOptions::default()).unwrap_err();
    assert!(matches!(err, UnmarshalError::UnexpectedField { .. }));

    let lenient = UnmarshalOptions::new().ignore_unknown_fields(true);
    let data = unmarshal_root(&schema, &input, &lenient).unwrap();
    let system = data.child(data.root_id(), "system").unwrap();
    assert!(data.child(system, "hostname").is_some());
    assert!(data.child(system, "bogus").is_none());
}

#[test]
fn annotation_fields_are_skipped() {
    let schema = device_schema();
    let input = json!({"system": {"hostname": "rtr0", "@lastmod": "2024-01-01"}});
    let data = unmarshal_root(&schema, &input, &UnmarshalOptions::default()).unwrap();
    let system = data.child(data.root_id(), "system").unwrap();
    assert!(data.child(system, "@lastmod").is_none());
}

#[test]
fn module_prefixed_field_names_resolve() {
    let schema = device_schema();
    let input = json!({"example:system": {"example:hostname": "rtr0"}});
    let data = unmarshal_root(&schema, &input, &UnmarshalOptions::default()).unwrap();
    let system = data.child(data.root_id(), "system").unwrap();
    assert!(data.child(system, "hostname").is_some());
}

#[test]
fn enum_alternative_tried_before_string() {
    let mut schema = SchemaTree::new();
    let root = schema.root_id();
    // String is declared first; the enum alternative still wins for a
    // string that resolves as an enum symbol.
    schema.add_leaf(
        root,
        "union-leaf",
        TypeDescriptor::union(vec![
            TypeDescriptor::of(TypeKind::String),
            TypeDescriptor::enumeration(EnumType::new(
                "values",
                [("E_VALUE_FORTY_TWO".to_string(), 42)],
            )),
        ]),
    );

    let input = json!({"union-leaf": "E_VALUE_FORTY_TWO"});
    let mut data = DataTree::new();
    let data_root = data.root_id();
    unmarshal(
        &schema,
        schema.root_id(),
        &mut data,
        data_root,
        &input,
        &UnmarshalOptions::default(),
    )
    .unwrap();

    let leaf = data.child(data_root, "union-leaf").unwrap();
    match &data.node(leaf).content {
        DataNodeValue::Leaf(LeafValue::Union(wrapper)) => {
            assert_eq!(wrapper.kind, ScalarKind::Enum);
        }
        other => panic!("expected enum-tagged wrapper, got {other:?}"),
    }

    // A string that is not an enum symbol falls through to the string
    // alternative.
    let input = json!({"union-leaf": "plain text"});
    let mut data = DataTree::new();
    let data_root = data.root_id();
    unmarshal(
        &schema,
        schema.root_id(),
        &mut data,
        data_root,
        &input,
        &UnmarshalOptions::default(),
    )
    .unwrap();
    let leaf = data.child(data_root, "union-leaf").unwrap();
    match &data.node(leaf).content {
        DataNodeValue::Leaf(LeafValue::Union(wrapper)) => {
            assert_eq!(wrapper.kind, ScalarKind::String);
        }
        other => panic!("expected string-tagged wrapper, got {other:?}"),
    }
}

#[test]
fn union_decode_round_trips_through_validation() {
    let schema = device_schema();
    for input in [
        json!({"system": {"timeout": "NEVER"}}),
        json!({"system": {"timeout": 300}}),
    ] {
        let data = unmarshal_root(&schema, &input, &UnmarshalOptions::default()).unwrap();
        let output = validate(&schema, &data, &ValidationOptions::default());
        assert!(output.is_valid, "{input}: {:?}", output.errors);
    }
}

#[test]
fn union_decode_is_deterministic() {
    let schema = device_schema();
    let input = json!({"system": {"timeout": 300}});
    let first = unmarshal_root(&schema, &input, &UnmarshalOptions::default()).unwrap();
    let second = unmarshal_root(&schema, &input, &UnmarshalOptions::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn no_alternative_matching_is_reported_with_context() {
    let schema = device_schema();
    let input = json!({"system": {"timeout": true}});
    let err = unmarshal_root(&schema, &input, &UnmarshalOptions::default()).unwrap_err();
    match err {
        UnmarshalError::NoSuitableUnionType {
            field, value_type, ..
        } => {
            assert_eq!(field, "timeout");
            assert_eq!(value_type, "boolean");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn single_representation_union_stays_unwrapped() {
    let mut schema = SchemaTree::new();
    let root = schema.root_id();
    schema.add_leaf(
        root,
        "id",
        TypeDescriptor::union(vec![
            TypeDescriptor::of(TypeKind::String).with_pattern("[a-z]+"),
            TypeDescriptor::of(TypeKind::String).with_pattern("[0-9]+"),
        ]),
    );

    let input = json!({"id": "abc"});
    let mut data = DataTree::new();
    let data_root = data.root_id();
    unmarshal(
        &schema,
        schema.root_id(),
        &mut data,
        data_root,
        &input,
        &UnmarshalOptions::default(),
    )
    .unwrap();
    let leaf = data.child(data_root, "id").unwrap();
    assert_eq!(
        data.node(leaf).content,
        DataNodeValue::Leaf(LeafValue::Scalar(ScalarValue::String("abc".into())))
    );
}

#[test]
fn leafref_leaf_decodes_as_target_type() {
    let mut schema = SchemaTree::new();
    let root = schema.root_id();
    schema.add_leaf(root, "mtu", TypeDescriptor::of(TypeKind::Uint16));
    schema.add_leaf(root, "mtu-ref", TypeDescriptor::leafref("../mtu"));

    let input = json!({"mtu": 1500, "mtu-ref": 1500});
    let mut data = DataTree::new();
    let data_root = data.root_id();
    unmarshal(
        &schema,
        schema.root_id(),
        &mut data,
        data_root,
        &input,
        &UnmarshalOptions::default(),
    )
    .unwrap();
    let leaf = data.child(data_root, "mtu-ref").unwrap();
    assert_eq!(
        data.node(leaf).content,
        DataNodeValue::Leaf(LeafValue::Scalar(ScalarValue::Uint16(1500)))
    );
}

#[test]
fn typed_values_decode_into_leaves() {
    let schema = device_schema();
    let root = schema.root_id();
    let system_schema = {
        let mut tree = DataTree::new();
        let data_root = tree.root_id();
        let system = tree.ensure_container(data_root, "system").unwrap();
        let counter = tree
            .set_leaf(system, "counter", LeafValue::Scalar(ScalarValue::Int64(0)))
            .unwrap();
        (tree, counter)
    };
    let (mut data, counter_node) = system_schema;

    let system_id = schema.child(root, "system").unwrap();
    let counter_id = schema.child(system_id, "counter").unwrap();
    unmarshal_typed(
        &schema,
        counter_id,
        &mut data,
        counter_node,
        &TypedValue::Int(-7),
        &UnmarshalOptions::default(),
    )
    .unwrap();
    assert_eq!(
        data.node(counter_node).content,
        DataNodeValue::Leaf(LeafValue::Scalar(ScalarValue::Int64(-7)))
    );

    // A leaf-list payload fans out element-wise.
    let tags_id = schema.child(system_id, "tags").unwrap();
    let system_node = data.child(data.root_id(), "system").unwrap();
    let tags_node = data
        .add_child(system_node, "tags", DataNodeValue::LeafList(vec![]))
        .unwrap();
    unmarshal_typed(
        &schema,
        tags_id,
        &mut data,
        tags_node,
        &TypedValue::LeafList(vec![
            TypedValue::String("core".into()),
            TypedValue::String("edge".into()),
        ]),
        &UnmarshalOptions::default(),
    )
    .unwrap();
    assert_eq!(
        data.node(tags_node).content,
        DataNodeValue::LeafList(vec![
            LeafValue::Scalar(ScalarValue::String("core".into())),
            LeafValue::Scalar(ScalarValue::String("edge".into())),
        ])
    );
}

#[test]
fn int8_overflow_fails_fast() {
    let mut schema = SchemaTree::new();
    let root = schema.root_id();
    schema.add_leaf(root, "level", TypeDescriptor::of(TypeKind::Int8));
    let input = json!({"level": 200});

    let mut data = DataTree::new();
    let data_root = data.root_id();
    let err = unmarshal(
        &schema,
        schema.root_id(),
        &mut data,
        data_root,
        &input,
        &UnmarshalOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, UnmarshalError::Range { .. }));
}

#[test]
fn repeated_unmarshal_merges_into_existing_tree() {
    let schema = device_schema();
    let mut data = DataTree::new();
    let data_root = data.root_id();

    let first = json!({"system": {"hostname": "rtr0"}});
    let second = json!({"system": {"counter": 1}});
    unmarshal(
        &schema,
        schema.root_id(),
        &mut data,
        data_root,
        &first,
        &UnmarshalOptions::default(),
    )
    .unwrap();
    unmarshal(
        &schema,
        schema.root_id(),
        &mut data,
        data_root,
        &second,
        &UnmarshalOptions::default(),
    )
    .unwrap();

    let system = data.child(data_root, "system").unwrap();
    assert!(data.child(system, "hostname").is_some());
    assert!(data.child(system, "counter").is_some());
}
