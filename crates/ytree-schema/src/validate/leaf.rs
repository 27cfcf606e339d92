//! Scalar constraint checks for a single concrete leaf type.
//!
//! `check_scalar` is a pure function returning the violations of one
//! value against one concrete (non-union, non-leafref) descriptor, so
//! union dispatch can run it per alternative without touching shared
//! state.

use regex::Regex;
use ytree_value::{DataPath, ScalarValue};

use crate::types::{TypeDescriptor, in_ranges};

use super::error::ValidationError;

/// Validate one scalar against one concrete type descriptor.
pub fn check_scalar(
    desc: &TypeDescriptor,
    value: &ScalarValue,
    path: &DataPath,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let expected = match desc.kind.scalar_kind() {
        Some(kind) => kind,
        None => {
            errors.push(ValidationError::SchemaInvalid {
                node: desc.name.clone(),
                reason: format!("{} is not a concrete leaf type", desc.kind),
                path: path.clone(),
            });
            return errors;
        }
    };

    if value.kind() != expected {
        errors.push(ValidationError::TypeMismatch {
            expected: expected.name().to_string(),
            actual: value.kind().name().to_string(),
            path: path.clone(),
        });
        return errors;
    }

    match value {
        ScalarValue::String(s) => {
            check_length(desc, s.chars().count() as u64, path, &mut errors);
            check_patterns(desc, s, path, &mut errors);
        }
        ScalarValue::Binary(bytes) => {
            check_length(desc, bytes.len() as u64, path, &mut errors);
        }
        ScalarValue::Decimal64(v) => {
            if !in_ranges(&desc.decimal_range, v) {
                errors.push(ValidationError::Range {
                    value: v.to_string(),
                    type_name: desc.name.clone(),
                    path: path.clone(),
                });
            }
        }
        ScalarValue::Enum(e) => match &desc.enumeration {
            Some(set) => match set.code(&e.name) {
                Some(code) if code == e.code => {}
                _ => {
                    errors.push(ValidationError::UnknownEnumValue {
                        value: e.name.clone(),
                        set: set.name.clone(),
                        path: path.clone(),
                    });
                }
            },
            None => {
                errors.push(ValidationError::SchemaInvalid {
                    node: desc.name.clone(),
                    reason: "enumeration type has no value table".to_string(),
                    path: path.clone(),
                });
            }
        },
        ScalarValue::Identity { name, .. } => {
            if desc.identities.is_empty() {
                errors.push(ValidationError::SchemaInvalid {
                    node: desc.name.clone(),
                    reason: "identityref type has no identity set".to_string(),
                    path: path.clone(),
                });
            } else {
                let bare = name.split_once(':').map(|(_, n)| n).unwrap_or(name.as_str());
                let known = desc
                    .identities
                    .iter()
                    .any(|i| i.split_once(':').map(|(_, n)| n).unwrap_or(i.as_str()) == bare);
                if !known {
                    errors.push(ValidationError::UnknownEnumValue {
                        value: name.clone(),
                        set: desc.name.clone(),
                        path: path.clone(),
                    });
                }
            }
        }
        ScalarValue::Bits(names) => {
            for name in names {
                if !desc.bit_names.iter().any(|b| b == name) {
                    errors.push(ValidationError::UnknownEnumValue {
                        value: name.clone(),
                        set: desc.name.clone(),
                        path: path.clone(),
                    });
                }
            }
        }
        other => {
            if let Some(v) = other.as_int()
                && !in_ranges(&desc.range, &v)
            {
                errors.push(ValidationError::Range {
                    value: v.to_string(),
                    type_name: desc.name.clone(),
                    path: path.clone(),
                });
            }
            // Bool and Empty carry no further constraints.
        }
    }

    errors
}

fn check_length(
    desc: &TypeDescriptor,
    length: u64,
    path: &DataPath,
    errors: &mut Vec<ValidationError>,
) {
    if !in_ranges(&desc.length, &length) {
        errors.push(ValidationError::Range {
            value: format!("length {length}"),
            type_name: desc.name.clone(),
            path: path.clone(),
        });
    }
}

fn check_patterns(
    desc: &TypeDescriptor,
    value: &str,
    path: &DataPath,
    errors: &mut Vec<ValidationError>,
) {
    for pattern in &desc.patterns {
        // Declared patterns match the whole value.
        match Regex::new(&format!("^(?:{pattern})$")) {
            Ok(re) => {
                if !re.is_match(value) {
                    errors.push(ValidationError::PatternMismatch {
                        value: value.to_string(),
                        pattern: pattern.clone(),
                        path: path.clone(),
                    });
                }
            }
            Err(e) => {
                errors.push(ValidationError::SchemaInvalid {
                    node: desc.name.clone(),
                    reason: format!("invalid pattern '{pattern}': {e}"),
                    path: path.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnumType, TypeKind};
    use ytree_value::EnumValue;

    fn root() -> DataPath {
        DataPath::root()
    }

    #[test]
    fn binary_length_range() {
        let desc = TypeDescriptor::of(TypeKind::Binary).with_length(Some(2), Some(10));

        let ok = check_scalar(&desc, &ScalarValue::Binary(vec![0; 6]), &root());
        assert!(ok.is_empty());

        let errs = check_scalar(&desc, &ScalarValue::Binary(vec![0; 1]), &root());
        assert!(matches!(errs.as_slice(), [ValidationError::Range { .. }]));
    }

    #[test]
    fn declared_integer_range_checked() {
        let desc = TypeDescriptor::of(TypeKind::Int32).with_range(Some(0), Some(100));
        assert!(check_scalar(&desc, &ScalarValue::Int32(55), &root()).is_empty());
        let errs = check_scalar(&desc, &ScalarValue::Int32(-1), &root());
        assert!(matches!(errs.as_slice(), [ValidationError::Range { .. }]));
    }

    #[test]
    fn pattern_is_anchored() {
        let desc = TypeDescriptor::of(TypeKind::String).with_pattern("a+");
        assert!(check_scalar(&desc, &ScalarValue::String("aaa".into()), &root()).is_empty());
        let errs = check_scalar(&desc, &ScalarValue::String("aab".into()), &root());
        assert!(matches!(
            errs.as_slice(),
            [ValidationError::PatternMismatch { .. }]
        ));
    }

    #[test]
    fn type_mismatch_reported_once() {
        let desc = TypeDescriptor::of(TypeKind::Uint8).with_range(Some(0), Some(5));
        let errs = check_scalar(&desc, &ScalarValue::String("7".into()), &root());
        assert!(matches!(
            errs.as_slice(),
            [ValidationError::TypeMismatch { .. }]
        ));
    }

    #[test]
    fn enum_membership() {
        let desc = TypeDescriptor::enumeration(EnumType::new(
            "speed",
            [("SPEED_10G".to_string(), 1), ("SPEED_40G".to_string(), 2)],
        ));
        let ok = ScalarValue::Enum(EnumValue {
            set: "speed".into(),
            name: "SPEED_10G".into(),
            code: 1,
        });
        assert!(check_scalar(&desc, &ok, &root()).is_empty());

        let unknown = ScalarValue::Enum(EnumValue {
            set: "speed".into(),
            name: "SPEED_100G".into(),
            code: 3,
        });
        assert!(matches!(
            check_scalar(&desc, &unknown, &root()).as_slice(),
            [ValidationError::UnknownEnumValue { .. }]
        ));
    }
}
