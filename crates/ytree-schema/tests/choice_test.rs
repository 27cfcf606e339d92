//! Choice/case exclusivity: cases are flattened into the containing
//! record, and at most one case of a choice may be populated.

use ytree_schema::{
    SchemaTree, TypeDescriptor, TypeKind, ValidationError, ValidationOptions, validate,
};
use ytree_value::{DataTree, LeafValue, ScalarValue};

/// container transport {
///   choice endpoint {
///     case tcp { leaf port; leaf keepalive; }
///     case udp { leaf datagram-size; }
///   }
/// }
fn choice_schema() -> SchemaTree {
    let mut schema = SchemaTree::new();
    let root = schema.root_id();
    let transport = schema.add_container(root, "transport");
    let choice = schema.add_choice(transport, "endpoint");
    let tcp = schema.add_case(choice, "tcp");
    schema.add_leaf(tcp, "port", TypeDescriptor::of(TypeKind::Uint16));
    schema.add_leaf(tcp, "keepalive", TypeDescriptor::of(TypeKind::Bool));
    let udp = schema.add_case(choice, "udp");
    schema.add_leaf(udp, "datagram-size", TypeDescriptor::of(TypeKind::Uint16));
    schema
}

fn transport_data(fields: &[(&str, ScalarValue)]) -> DataTree {
    let mut data = DataTree::new();
    let root = data.root_id();
    let transport = data.ensure_container(root, "transport").unwrap();
    for (name, value) in fields {
        data.set_leaf(transport, name, LeafValue::Scalar(value.clone()))
            .unwrap();
    }
    data
}

#[test]
fn single_case_accepted() {
    let schema = choice_schema();
    let data = transport_data(&[
        ("port", ScalarValue::Uint16(179)),
        ("keepalive", ScalarValue::Bool(true)),
    ]);
    let output = validate(&schema, &data, &ValidationOptions::default());
    assert!(output.is_valid, "{:?}", output.errors);
}

#[test]
fn two_cases_rejected() {
    let schema = choice_schema();
    let data = transport_data(&[
        ("port", ScalarValue::Uint16(179)),
        ("datagram-size", ScalarValue::Uint16(512)),
    ]);
    let output = validate(&schema, &data, &ValidationOptions::default());
    match output.errors.as_slice() {
        [ValidationError::ChoiceMultipleCases { choice, cases, .. }] => {
            assert_eq!(choice, "endpoint");
            assert_eq!(cases.as_slice(), ["tcp", "udp"]);
        }
        other => panic!("unexpected errors {other:?}"),
    }
}

#[test]
fn empty_choice_accepted() {
    let schema = choice_schema();
    let data = transport_data(&[]);
    let output = validate(&schema, &data, &ValidationOptions::default());
    assert!(output.is_valid, "{:?}", output.errors);
}

#[test]
fn implicit_case_counts_as_its_own_case() {
    let mut schema = SchemaTree::new();
    let root = schema.root_id();
    let container = schema.add_container(root, "lb");
    let choice = schema.add_choice(container, "target");
    // A leaf directly under the choice stands for its own case.
    schema.add_leaf(choice, "address", TypeDescriptor::of(TypeKind::String));
    let group = schema.add_case(choice, "group");
    schema.add_leaf(group, "group-name", TypeDescriptor::of(TypeKind::String));

    let mut data = DataTree::new();
    let data_root = data.root_id();
    let lb = data.ensure_container(data_root, "lb").unwrap();
    data.set_leaf(
        lb,
        "address",
        LeafValue::Scalar(ScalarValue::String("10.0.0.1".into())),
    )
    .unwrap();
    data.set_leaf(
        lb,
        "group-name",
        LeafValue::Scalar(ScalarValue::String("pool-a".into())),
    )
    .unwrap();

    let output = validate(&schema, &data, &ValidationOptions::default());
    assert!(matches!(
        output.errors.as_slice(),
        [ValidationError::ChoiceMultipleCases { .. }]
    ));
}
