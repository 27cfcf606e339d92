use core::fmt::Display;

use crate::key::KeyValue;

/// A single typed scalar value held by a leaf or leaf-list element.
///
/// Each variant corresponds to one concrete YANG scalar kind; integer
/// variants carry the exact bit width declared by the schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    /// A decimal64 value after its final (lossy) float conversion.
    Decimal64(f64),
    String(String),
    Binary(Vec<u8>),
    /// A resolved enumeration value.
    Enum(EnumValue),
    /// A resolved identityref: the identity name within a base identity.
    Identity { base: String, name: String },
    /// A bits value: the set bit names, in schema position order.
    Bits(Vec<String>),
    /// The presence marker of an `empty`-typed leaf.
    Empty,
}

/// A resolved enumeration value: the defining set, the canonical name
/// and the integer code assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub set: String,
    pub name: String,
    pub code: i64,
}

/// The runtime shape of a scalar value, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Decimal64,
    String,
    Binary,
    Enum,
    Identity,
    Bits,
    Empty,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "boolean",
            ScalarKind::Int8 => "int8",
            ScalarKind::Int16 => "int16",
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::Uint8 => "uint8",
            ScalarKind::Uint16 => "uint16",
            ScalarKind::Uint32 => "uint32",
            ScalarKind::Uint64 => "uint64",
            ScalarKind::Decimal64 => "decimal64",
            ScalarKind::String => "string",
            ScalarKind::Binary => "binary",
            ScalarKind::Enum => "enumeration",
            ScalarKind::Identity => "identityref",
            ScalarKind::Bits => "bits",
            ScalarKind::Empty => "empty",
        }
    }
}

impl Display for ScalarKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl ScalarValue {
    /// The runtime shape of this value.
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Bool(_) => ScalarKind::Bool,
            ScalarValue::Int8(_) => ScalarKind::Int8,
            ScalarValue::Int16(_) => ScalarKind::Int16,
            ScalarValue::Int32(_) => ScalarKind::Int32,
            ScalarValue::Int64(_) => ScalarKind::Int64,
            ScalarValue::Uint8(_) => ScalarKind::Uint8,
            ScalarValue::Uint16(_) => ScalarKind::Uint16,
            ScalarValue::Uint32(_) => ScalarKind::Uint32,
            ScalarValue::Uint64(_) => ScalarKind::Uint64,
            ScalarValue::Decimal64(_) => ScalarKind::Decimal64,
            ScalarValue::String(_) => ScalarKind::String,
            ScalarValue::Binary(_) => ScalarKind::Binary,
            ScalarValue::Enum(_) => ScalarKind::Enum,
            ScalarValue::Identity { .. } => ScalarKind::Identity,
            ScalarValue::Bits(_) => ScalarKind::Bits,
            ScalarValue::Empty => ScalarKind::Empty,
        }
    }

    /// Widen a signed integer variant to `i128`, if this is one.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            ScalarValue::Int8(v) => Some(*v as i128),
            ScalarValue::Int16(v) => Some(*v as i128),
            ScalarValue::Int32(v) => Some(*v as i128),
            ScalarValue::Int64(v) => Some(*v as i128),
            ScalarValue::Uint8(v) => Some(*v as i128),
            ScalarValue::Uint16(v) => Some(*v as i128),
            ScalarValue::Uint32(v) => Some(*v as i128),
            ScalarValue::Uint64(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Convert to the key-comparable subset, when this value can key a
    /// list entry. Decimal64 keys use their canonical string rendering
    /// since floats are not hashable.
    pub fn to_key(&self) -> Option<KeyValue> {
        match self {
            ScalarValue::Bool(b) => Some(KeyValue::Bool(*b)),
            ScalarValue::Int8(v) => Some(KeyValue::Int64(*v as i64)),
            ScalarValue::Int16(v) => Some(KeyValue::Int64(*v as i64)),
            ScalarValue::Int32(v) => Some(KeyValue::Int64(*v as i64)),
            ScalarValue::Int64(v) => Some(KeyValue::Int64(*v)),
            ScalarValue::Uint8(v) => Some(KeyValue::Uint64(*v as u64)),
            ScalarValue::Uint16(v) => Some(KeyValue::Uint64(*v as u64)),
            ScalarValue::Uint32(v) => Some(KeyValue::Uint64(*v as u64)),
            ScalarValue::Uint64(v) => Some(KeyValue::Uint64(*v)),
            ScalarValue::Decimal64(_) => Some(KeyValue::String(self.to_string())),
            ScalarValue::String(s) => Some(KeyValue::String(s.clone())),
            ScalarValue::Enum(e) => Some(KeyValue::String(e.name.clone())),
            ScalarValue::Identity { name, .. } => Some(KeyValue::String(name.clone())),
            _ => None,
        }
    }
}

impl Display for ScalarValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ScalarValue::Bool(v) => write!(f, "{v}"),
            ScalarValue::Int8(v) => write!(f, "{v}"),
            ScalarValue::Int16(v) => write!(f, "{v}"),
            ScalarValue::Int32(v) => write!(f, "{v}"),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Uint8(v) => write!(f, "{v}"),
            ScalarValue::Uint16(v) => write!(f, "{v}"),
            ScalarValue::Uint32(v) => write!(f, "{v}"),
            ScalarValue::Uint64(v) => write!(f, "{v}"),
            ScalarValue::Decimal64(v) => write!(f, "{v}"),
            ScalarValue::String(s) => f.write_str(s),
            ScalarValue::Binary(b) => write!(f, "<{} bytes>", b.len()),
            ScalarValue::Enum(e) => f.write_str(&e.name),
            ScalarValue::Identity { name, .. } => f.write_str(name),
            ScalarValue::Bits(names) => f.write_str(&names.join(" ")),
            ScalarValue::Empty => f.write_str("[null]"),
        }
    }
}

/// A union leaf value resolved to one alternative.
///
/// The wrapper records which scalar shape the first matching union
/// alternative mapped to. Exclusivity (exactly one populated
/// alternative) is enforced by construction; [`UnionScalar::is_consistent`]
/// re-checks wrappers that crossed a serialization boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionScalar {
    pub kind: ScalarKind,
    pub value: Box<ScalarValue>,
}

impl UnionScalar {
    pub fn new(value: ScalarValue) -> Self {
        Self {
            kind: value.kind(),
            value: Box::new(value),
        }
    }

    /// Whether the recorded kind matches the payload's runtime shape.
    pub fn is_consistent(&self) -> bool {
        self.kind == self.value.kind()
    }
}

/// The value of a leaf or of one leaf-list element.
///
/// A union-typed leaf whose alternatives all share one representation
/// stores a plain [`ScalarValue`]; a multi-representation union stores
/// the resolved [`UnionScalar`] wrapper.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    Scalar(ScalarValue),
    Union(UnionScalar),
}

impl LeafValue {
    /// The scalar payload, unwrapping a union wrapper.
    pub fn scalar(&self) -> &ScalarValue {
        match self {
            LeafValue::Scalar(v) => v,
            LeafValue::Union(u) => &u.value,
        }
    }

    /// The runtime shape of the payload.
    pub fn kind(&self) -> ScalarKind {
        self.scalar().kind()
    }
}

impl From<ScalarValue> for LeafValue {
    fn from(value: ScalarValue) -> Self {
        LeafValue::Scalar(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_kind_round_trip() {
        assert_eq!(ScalarValue::Int16(7).kind(), ScalarKind::Int16);
        assert_eq!(ScalarValue::Empty.kind(), ScalarKind::Empty);
        assert_eq!(ScalarKind::Uint32.name(), "uint32");
    }

    #[test]
    fn to_key_widens_integers() {
        assert_eq!(
            ScalarValue::Uint8(3).to_key(),
            Some(KeyValue::Uint64(3))
        );
        assert_eq!(
            ScalarValue::Int16(-3).to_key(),
            Some(KeyValue::Int64(-3))
        );
        assert_eq!(ScalarValue::Empty.to_key(), None);
    }

    #[test]
    fn union_wrapper_consistency() {
        let ok = UnionScalar::new(ScalarValue::String("a".to_string()));
        assert!(ok.is_consistent());

        let bad = UnionScalar {
            kind: ScalarKind::Int32,
            value: Box::new(ScalarValue::String("a".to_string())),
        };
        assert!(!bad.is_consistent());
    }
}
