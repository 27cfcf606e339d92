//! Per-kind scalar coders.
//!
//! Convert one already-decoded external value (a JSON value, a wire
//! typed-value, or a key string) into the native scalar for a declared
//! leaf kind. Integer kinds enforce their exact bit-width range here;
//! declared range/pattern constraints are the validator's job.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde_json::Value;
use ytree_schema::{EnumType, TypeDescriptor, TypeKind};
use ytree_value::{EnumValue, ScalarValue};

use crate::config::EnumLookup;
use crate::error::UnmarshalError;
use crate::wire::TypedValue;

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(field: &str, expected: &str, value: &Value) -> UnmarshalError {
    UnmarshalError::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: json_type_name(value).to_string(),
    }
}

/// Decode a JSON value into the scalar for a concrete leaf kind.
pub fn decode_json(
    desc: &TypeDescriptor,
    field: &str,
    value: &Value,
    enums: &dyn EnumLookup,
) -> Result<ScalarValue, UnmarshalError> {
    match desc.kind {
        TypeKind::Bool => match value {
            Value::Bool(b) => Ok(ScalarValue::Bool(*b)),
            other => Err(mismatch(field, "boolean", other)),
        },
        TypeKind::Int8 | TypeKind::Int16 | TypeKind::Int32 | TypeKind::Uint8
        | TypeKind::Uint16 | TypeKind::Uint32 => match value {
            Value::Number(n) => int_value(desc, field, number_to_i128(n, field)?),
            other => Err(mismatch(field, "number", other)),
        },
        // 64-bit integers also arrive as decimal strings on the wire.
        TypeKind::Int64 | TypeKind::Uint64 => match value {
            Value::Number(n) => int_value(desc, field, number_to_i128(n, field)?),
            Value::String(s) => {
                let raw = s.parse::<i128>().map_err(|_| UnmarshalError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("cannot parse '{s}' as {}", desc.kind),
                })?;
                int_value(desc, field, raw)
            }
            other => Err(mismatch(field, "number or decimal string", other)),
        },
        TypeKind::Decimal64 => {
            let text = match value {
                Value::Number(n) => n.to_string(),
                Value::String(s) => s.clone(),
                other => return Err(mismatch(field, "number or decimal string", other)),
            };
            parse_decimal64(desc, field, &text).map(ScalarValue::Decimal64)
        }
        TypeKind::String => match value {
            Value::String(s) => Ok(ScalarValue::String(s.clone())),
            other => Err(mismatch(field, "string", other)),
        },
        TypeKind::Binary => match value {
            Value::String(s) => {
                let bytes = BASE64.decode(s).map_err(|source| UnmarshalError::Base64 {
                    field: field.to_string(),
                    source,
                })?;
                Ok(ScalarValue::Binary(bytes))
            }
            other => Err(mismatch(field, "base64 string", other)),
        },
        // An empty leaf is encoded as a singleton null array.
        TypeKind::Empty => match value {
            Value::Array(items) if items.len() == 1 && items[0].is_null() => {
                Ok(ScalarValue::Empty)
            }
            other => Err(mismatch(field, "[null]", other)),
        },
        TypeKind::Bits => match value {
            Value::String(s) => decode_bits(desc, field, s),
            other => Err(mismatch(field, "string of bit names", other)),
        },
        TypeKind::Enumeration => match value {
            Value::String(s) => decode_enum(desc, field, s, enums),
            other => Err(mismatch(field, "enumeration string", other)),
        },
        TypeKind::Identityref => match value {
            Value::String(s) => decode_identity(desc, field, s),
            other => Err(mismatch(field, "identity string", other)),
        },
        TypeKind::Union | TypeKind::Leafref => Err(UnmarshalError::SchemaInvalid {
            field: field.to_string(),
            reason: format!("{} is not a concrete leaf type", desc.kind),
        }),
    }
}

/// Decode a wire typed-value into the scalar for a concrete leaf kind.
pub fn decode_typed(
    desc: &TypeDescriptor,
    field: &str,
    value: &TypedValue,
    enums: &dyn EnumLookup,
) -> Result<ScalarValue, UnmarshalError> {
    let mismatch = |expected: &str| UnmarshalError::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: value.type_name().to_string(),
    };

    match desc.kind {
        TypeKind::Bool => match value {
            TypedValue::Bool(b) => Ok(ScalarValue::Bool(*b)),
            _ => Err(mismatch("bool")),
        },
        kind if kind.is_integer() => match value {
            TypedValue::Int(i) => int_value(desc, field, *i as i128),
            TypedValue::Uint(u) => int_value(desc, field, *u as i128),
            _ => Err(mismatch("int or uint")),
        },
        TypeKind::Decimal64 => match value {
            TypedValue::Decimal { digits, precision } => {
                Ok(ScalarValue::Decimal64(*digits as f64 / 10f64.powi(*precision as i32)))
            }
            TypedValue::Float(f) => Ok(ScalarValue::Decimal64(*f)),
            _ => Err(mismatch("decimal or float")),
        },
        TypeKind::String => match value {
            TypedValue::String(s) => Ok(ScalarValue::String(s.clone())),
            _ => Err(mismatch("string")),
        },
        // Wire binary payloads are raw bytes, no base64 involved.
        TypeKind::Binary => match value {
            TypedValue::Bytes(b) => Ok(ScalarValue::Binary(b.clone())),
            _ => Err(mismatch("bytes")),
        },
        TypeKind::Empty => match value {
            TypedValue::Bool(true) => Ok(ScalarValue::Empty),
            _ => Err(mismatch("presence marker")),
        },
        TypeKind::Bits => match value {
            TypedValue::String(s) => decode_bits(desc, field, s),
            _ => Err(mismatch("string of bit names")),
        },
        TypeKind::Enumeration => match value {
            TypedValue::String(s) => decode_enum(desc, field, s, enums),
            _ => Err(mismatch("enumeration string")),
        },
        TypeKind::Identityref => match value {
            TypedValue::String(s) => decode_identity(desc, field, s),
            _ => Err(mismatch("identity string")),
        },
        _ => Err(UnmarshalError::SchemaInvalid {
            field: field.to_string(),
            reason: format!("{} is not a concrete leaf type", desc.kind),
        }),
    }
}

/// Decode a list-key string into the scalar for a concrete leaf kind.
pub fn decode_key_string(
    desc: &TypeDescriptor,
    field: &str,
    text: &str,
    enums: &dyn EnumLookup,
) -> Result<ScalarValue, UnmarshalError> {
    match desc.kind {
        TypeKind::Bool => match text {
            "true" => Ok(ScalarValue::Bool(true)),
            "false" => Ok(ScalarValue::Bool(false)),
            other => Err(UnmarshalError::InvalidValue {
                field: field.to_string(),
                reason: format!("cannot parse '{other}' as boolean"),
            }),
        },
        kind if kind.is_integer() => {
            let raw = text.parse::<i128>().map_err(|_| UnmarshalError::InvalidValue {
                field: field.to_string(),
                reason: format!("cannot parse '{text}' as {kind}"),
            })?;
            int_value(desc, field, raw)
        }
        TypeKind::Decimal64 => parse_decimal64(desc, field, text).map(ScalarValue::Decimal64),
        TypeKind::String => Ok(ScalarValue::String(text.to_string())),
        TypeKind::Binary => {
            let bytes = BASE64.decode(text).map_err(|source| UnmarshalError::Base64 {
                field: field.to_string(),
                source,
            })?;
            Ok(ScalarValue::Binary(bytes))
        }
        TypeKind::Bits => decode_bits(desc, field, text),
        TypeKind::Enumeration => decode_enum(desc, field, text, enums),
        TypeKind::Identityref => decode_identity(desc, field, text),
        _ => Err(UnmarshalError::InvalidValue {
            field: field.to_string(),
            reason: format!("{} cannot key a list entry", desc.kind),
        }),
    }
}

fn number_to_i128(n: &serde_json::Number, field: &str) -> Result<i128, UnmarshalError> {
    if let Some(i) = n.as_i64() {
        Ok(i as i128)
    } else if let Some(u) = n.as_u64() {
        Ok(u as i128)
    } else {
        Err(UnmarshalError::InvalidValue {
            field: field.to_string(),
            reason: format!("number {n} is not an integer"),
        })
    }
}

/// Narrow a wide integer into the declared kind, enforcing the exact
/// bit-width range.
fn int_value(desc: &TypeDescriptor, field: &str, raw: i128) -> Result<ScalarValue, UnmarshalError> {
    let Some((min, max)) = desc.kind.int_bounds() else {
        return Err(UnmarshalError::SchemaInvalid {
            field: field.to_string(),
            reason: format!("{} is not an integer type", desc.kind),
        });
    };
    if raw < min || raw > max {
        return Err(UnmarshalError::Range {
            field: field.to_string(),
            value: raw.to_string(),
            type_name: desc.name.clone(),
        });
    }
    Ok(match desc.kind {
        TypeKind::Int8 => ScalarValue::Int8(raw as i8),
        TypeKind::Int16 => ScalarValue::Int16(raw as i16),
        TypeKind::Int32 => ScalarValue::Int32(raw as i32),
        TypeKind::Int64 => ScalarValue::Int64(raw as i64),
        TypeKind::Uint8 => ScalarValue::Uint8(raw as u8),
        TypeKind::Uint16 => ScalarValue::Uint16(raw as u16),
        TypeKind::Uint32 => ScalarValue::Uint32(raw as u32),
        _ => ScalarValue::Uint64(raw as u64),
    })
}

/// Parse a decimal string through the exact rational
/// `numerator * 10^-fraction_digits` before the final (lossy) float
/// conversion. The numerator must fit the 64-bit scaled representation;
/// float imprecision alone never rejects a value.
fn parse_decimal64(
    desc: &TypeDescriptor,
    field: &str,
    text: &str,
) -> Result<f64, UnmarshalError> {
    let fd = desc.fraction_digits;
    if fd == 0 || fd > 18 {
        return Err(UnmarshalError::SchemaInvalid {
            field: field.to_string(),
            reason: format!("decimal64 fraction-digits {fd} outside 1..=18"),
        });
    }

    let invalid = |reason: String| UnmarshalError::InvalidValue {
        field: field.to_string(),
        reason,
    };

    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1i32, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid(format!("cannot parse '{text}' as decimal64")));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid(format!("cannot parse '{text}' as decimal64")));
    }
    if frac_part.len() > fd as usize {
        return Err(invalid(format!(
            "'{text}' has more than {fd} fraction digits"
        )));
    }

    let mut digits = String::with_capacity(int_part.len() + fd as usize);
    digits.push_str(int_part);
    digits.push_str(frac_part);
    for _ in frac_part.len()..fd as usize {
        digits.push('0');
    }
    let mut numerator: BigInt = digits.parse().map_err(|_| {
        invalid(format!("cannot parse '{text}' as decimal64"))
    })?;
    if sign < 0 {
        numerator = -numerator;
    }

    if numerator > BigInt::from(i64::MAX) || numerator < BigInt::from(i64::MIN) {
        return Err(UnmarshalError::Range {
            field: field.to_string(),
            value: text.to_string(),
            type_name: desc.name.clone(),
        });
    }

    let scaled = numerator.to_f64().unwrap_or_default();
    Ok(scaled / 10f64.powi(fd as i32))
}

fn decode_bits(
    desc: &TypeDescriptor,
    field: &str,
    text: &str,
) -> Result<ScalarValue, UnmarshalError> {
    let mut names = Vec::new();
    for name in text.split_whitespace() {
        if !desc.bit_names.iter().any(|b| b == name) {
            return Err(UnmarshalError::UnknownEnumValue {
                field: field.to_string(),
                value: name.to_string(),
                set: desc.name.clone(),
            });
        }
        names.push(name.to_string());
    }
    Ok(ScalarValue::Bits(names))
}

fn decode_enum(
    desc: &TypeDescriptor,
    field: &str,
    name: &str,
    enums: &dyn EnumLookup,
) -> Result<ScalarValue, UnmarshalError> {
    let table: &EnumType = match desc.enumeration.as_ref() {
        Some(table) => table,
        None => enums
            .lookup(&desc.name)
            .ok_or_else(|| UnmarshalError::SchemaInvalid {
                field: field.to_string(),
                reason: format!("enumeration '{}' has no value table", desc.name),
            })?,
    };
    let bare = name.split_once(':').map(|(_, n)| n).unwrap_or(name);
    let code = table
        .code(bare)
        .ok_or_else(|| UnmarshalError::UnknownEnumValue {
            field: field.to_string(),
            value: name.to_string(),
            set: table.name.clone(),
        })?;
    Ok(ScalarValue::Enum(EnumValue {
        set: table.name.clone(),
        name: bare.to_string(),
        code,
    }))
}

fn decode_identity(
    desc: &TypeDescriptor,
    field: &str,
    name: &str,
) -> Result<ScalarValue, UnmarshalError> {
    if desc.identities.is_empty() {
        return Err(UnmarshalError::SchemaInvalid {
            field: field.to_string(),
            reason: format!("identityref '{}' has no identity set", desc.name),
        });
    }
    let bare = name.split_once(':').map(|(_, n)| n).unwrap_or(name);
    let known = desc
        .identities
        .iter()
        .any(|i| i.split_once(':').map(|(_, n)| n).unwrap_or(i.as_str()) == bare);
    if !known {
        return Err(UnmarshalError::UnknownEnumValue {
            field: field.to_string(),
            value: name.to_string(),
            set: desc.name.clone(),
        });
    }
    Ok(ScalarValue::Identity {
        base: desc.name.clone(),
        name: bare.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoEnums;
    use serde_json::json;

    fn desc(kind: TypeKind) -> TypeDescriptor {
        TypeDescriptor::of(kind)
    }

    #[test]
    fn int8_enforces_bit_width() {
        let d = desc(TypeKind::Int8);
        assert_eq!(
            decode_json(&d, "f", &json!(-128), &NoEnums).unwrap(),
            ScalarValue::Int8(-128)
        );
        assert!(matches!(
            decode_json(&d, "f", &json!(128), &NoEnums),
            Err(UnmarshalError::Range { .. })
        ));
    }

    #[test]
    fn int64_accepts_decimal_string() {
        let d = desc(TypeKind::Int64);
        assert_eq!(
            decode_json(&d, "f", &json!("-9223372036854775808"), &NoEnums).unwrap(),
            ScalarValue::Int64(i64::MIN)
        );
        assert!(matches!(
            decode_json(&d, "f", &json!("9223372036854775808"), &NoEnums),
            Err(UnmarshalError::Range { .. })
        ));
    }

    #[test]
    fn uint_rejects_negative() {
        let d = desc(TypeKind::Uint16);
        assert!(matches!(
            decode_json(&d, "f", &json!(-1), &NoEnums),
            Err(UnmarshalError::Range { .. })
        ));
    }

    #[test]
    fn decimal64_exact_rational() {
        let d = TypeDescriptor::decimal64(2);
        assert_eq!(
            decode_json(&d, "f", &json!("2.5"), &NoEnums).unwrap(),
            ScalarValue::Decimal64(2.5)
        );
        assert_eq!(
            decode_json(&d, "f", &json!(0.25), &NoEnums).unwrap(),
            ScalarValue::Decimal64(0.25)
        );
        // More fraction digits than declared precision.
        assert!(matches!(
            decode_json(&d, "f", &json!("0.125"), &NoEnums),
            Err(UnmarshalError::InvalidValue { .. })
        ));
        // Scaled numerator beyond 64 bits.
        assert!(matches!(
            decode_json(&d, "f", &json!("92233720368547758.08"), &NoEnums),
            Err(UnmarshalError::InvalidValue { .. }) | Err(UnmarshalError::Range { .. })
        ));
    }

    #[test]
    fn binary_base64_round_trip() {
        let d = desc(TypeKind::Binary);
        assert_eq!(
            decode_json(&d, "f", &json!("AQID"), &NoEnums).unwrap(),
            ScalarValue::Binary(vec![1, 2, 3])
        );
        assert!(matches!(
            decode_json(&d, "f", &json!("not base64!"), &NoEnums),
            Err(UnmarshalError::Base64 { .. })
        ));
    }

    #[test]
    fn empty_is_singleton_null_array() {
        let d = desc(TypeKind::Empty);
        assert_eq!(
            decode_json(&d, "f", &json!([null]), &NoEnums).unwrap(),
            ScalarValue::Empty
        );
        assert!(matches!(
            decode_json(&d, "f", &json!(null), &NoEnums),
            Err(UnmarshalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn enum_resolution_strips_module_prefix() {
        let d = TypeDescriptor::enumeration(EnumType::new(
            "oper-status",
            [("UP".to_string(), 1), ("DOWN".to_string(), 2)],
        ));
        let up = decode_json(&d, "f", &json!("ietf-interfaces:UP"), &NoEnums).unwrap();
        assert_eq!(
            up,
            ScalarValue::Enum(EnumValue {
                set: "oper-status".into(),
                name: "UP".into(),
                code: 1,
            })
        );
        assert!(matches!(
            decode_json(&d, "f", &json!("TESTING"), &NoEnums),
            Err(UnmarshalError::UnknownEnumValue { .. })
        ));
    }

    #[test]
    fn typed_value_bytes_pass_through() {
        let d = desc(TypeKind::Binary);
        assert_eq!(
            decode_typed(&d, "f", &TypedValue::Bytes(vec![9, 9]), &NoEnums).unwrap(),
            ScalarValue::Binary(vec![9, 9])
        );
    }

    #[test]
    fn key_string_decoding() {
        assert_eq!(
            decode_key_string(&desc(TypeKind::Uint32), "f", "42", &NoEnums).unwrap(),
            ScalarValue::Uint32(42)
        );
        assert_eq!(
            decode_key_string(&desc(TypeKind::Bool), "f", "true", &NoEnums).unwrap(),
            ScalarValue::Bool(true)
        );
        assert!(decode_key_string(&desc(TypeKind::Empty), "f", "x", &NoEnums).is_err());
    }
}
