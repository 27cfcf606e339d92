//! Type descriptors for leaf and leaf-list schema nodes.
//!
//! Every leaf type is described by a [`TypeDescriptor`]: a closed
//! [`TypeKind`] tag plus the constraint payloads that kind can carry.
//! Union alternatives are nested descriptors and are flattened
//! recursively before dispatch.

use indexmap::IndexMap;
use thiserror::Error;
use ytree_value::ScalarKind;

/// Maximum nesting depth accepted when flattening union alternatives.
/// Well-formed schemas have no union cycles; this guards against
/// accidental self-reference.
pub const MAX_UNION_DEPTH: usize = 16;

/// The closed set of leaf type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Binary,
    Bits,
    Bool,
    Decimal64,
    Empty,
    Enumeration,
    Identityref,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    String,
    Union,
    Leafref,
}

impl TypeKind {
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Binary => "binary",
            TypeKind::Bits => "bits",
            TypeKind::Bool => "boolean",
            TypeKind::Decimal64 => "decimal64",
            TypeKind::Empty => "empty",
            TypeKind::Enumeration => "enumeration",
            TypeKind::Identityref => "identityref",
            TypeKind::Int8 => "int8",
            TypeKind::Int16 => "int16",
            TypeKind::Int32 => "int32",
            TypeKind::Int64 => "int64",
            TypeKind::Uint8 => "uint8",
            TypeKind::Uint16 => "uint16",
            TypeKind::Uint32 => "uint32",
            TypeKind::Uint64 => "uint64",
            TypeKind::String => "string",
            TypeKind::Union => "union",
            TypeKind::Leafref => "leafref",
        }
    }

    /// Inclusive bit-width bounds for integer kinds.
    pub fn int_bounds(&self) -> Option<(i128, i128)> {
        match self {
            TypeKind::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            TypeKind::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            TypeKind::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            TypeKind::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            TypeKind::Uint8 => Some((0, u8::MAX as i128)),
            TypeKind::Uint16 => Some((0, u16::MAX as i128)),
            TypeKind::Uint32 => Some((0, u32::MAX as i128)),
            TypeKind::Uint64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }

    /// The canonical scalar representation this kind maps to, or `None`
    /// for the two indirect kinds (`union`, `leafref`).
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            TypeKind::Binary => Some(ScalarKind::Binary),
            TypeKind::Bits => Some(ScalarKind::Bits),
            TypeKind::Bool => Some(ScalarKind::Bool),
            TypeKind::Decimal64 => Some(ScalarKind::Decimal64),
            TypeKind::Empty => Some(ScalarKind::Empty),
            TypeKind::Enumeration => Some(ScalarKind::Enum),
            TypeKind::Identityref => Some(ScalarKind::Identity),
            TypeKind::Int8 => Some(ScalarKind::Int8),
            TypeKind::Int16 => Some(ScalarKind::Int16),
            TypeKind::Int32 => Some(ScalarKind::Int32),
            TypeKind::Int64 => Some(ScalarKind::Int64),
            TypeKind::Uint8 => Some(ScalarKind::Uint8),
            TypeKind::Uint16 => Some(ScalarKind::Uint16),
            TypeKind::Uint32 => Some(ScalarKind::Uint32),
            TypeKind::Uint64 => Some(ScalarKind::Uint64),
            TypeKind::String => Some(ScalarKind::String),
            TypeKind::Union | TypeKind::Leafref => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.int_bounds().is_some()
    }
}

impl core::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// An inclusive range with optional bounds. A constraint holds when the
/// value falls into any of the declared ranges; an empty range list
/// means unconstrained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd> Range<T> {
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: &T) -> bool {
        if let Some(min) = &self.min
            && value < min
        {
            return false;
        }
        if let Some(max) = &self.max
            && value > max
        {
            return false;
        }
        true
    }
}

/// Whether `value` falls into any of `ranges` (true when empty).
pub fn in_ranges<T: PartialOrd>(ranges: &[Range<T>], value: &T) -> bool {
    ranges.is_empty() || ranges.iter().any(|r| r.contains(value))
}

/// An enumeration type: value names mapped to their assigned codes, in
/// declaration order. Name lookups strip a module prefix, so
/// `"mod:VALUE"` and `"VALUE"` resolve identically.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub values: IndexMap<String, i64>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = (String, i64)>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().collect(),
        }
    }

    /// Resolve a (possibly module-prefixed) value name to its code.
    pub fn code(&self, name: &str) -> Option<i64> {
        let bare = name.split_once(':').map(|(_, rest)| rest).unwrap_or(name);
        self.values.get(bare).copied()
    }

    /// The canonical name assigned to a code.
    pub fn name_of(&self, code: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, c)| **c == code)
            .map(|(n, _)| n.as_str())
    }
}

/// Errors from descriptor-level operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    #[error("union '{type_name}' nests deeper than {MAX_UNION_DEPTH} levels")]
    UnionTooDeep { type_name: String },
}

/// The type of a leaf or leaf-list schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    /// Type name for diagnostics: the base kind name or a typedef name.
    pub name: String,
    /// Declared value ranges for integer kinds.
    pub range: Vec<Range<i128>>,
    /// Declared value ranges for decimal64.
    pub decimal_range: Vec<Range<f64>>,
    /// Declared length ranges for string and binary kinds.
    pub length: Vec<Range<u64>>,
    /// Declared patterns for string kinds; all must match.
    pub patterns: Vec<String>,
    /// Value table for enumeration kinds.
    pub enumeration: Option<EnumType>,
    /// Base identity name and derived identity names for identityref.
    pub identities: Vec<String>,
    /// Fraction digits for decimal64 (1..=18).
    pub fraction_digits: u8,
    /// Declared bit names for bits kinds.
    pub bit_names: Vec<String>,
    /// Alternative types for union kinds, in declaration order.
    pub alternatives: Vec<TypeDescriptor>,
    /// Target path for leafref kinds.
    pub path: Option<String>,
}

impl TypeDescriptor {
    /// A bare descriptor of the given kind with no constraints.
    pub fn of(kind: TypeKind) -> Self {
        Self {
            kind,
            name: kind.name().to_string(),
            range: Vec::new(),
            decimal_range: Vec::new(),
            length: Vec::new(),
            patterns: Vec::new(),
            enumeration: None,
            identities: Vec::new(),
            fraction_digits: 0,
            bit_names: Vec::new(),
            alternatives: Vec::new(),
            path: None,
        }
    }

    pub fn union(alternatives: Vec<TypeDescriptor>) -> Self {
        Self {
            alternatives,
            ..Self::of(TypeKind::Union)
        }
    }

    pub fn leafref(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::of(TypeKind::Leafref)
        }
    }

    pub fn enumeration(set: EnumType) -> Self {
        Self {
            name: set.name.clone(),
            enumeration: Some(set),
            ..Self::of(TypeKind::Enumeration)
        }
    }

    pub fn identityref(base: impl Into<String>, identities: Vec<String>) -> Self {
        Self {
            name: base.into(),
            identities,
            ..Self::of(TypeKind::Identityref)
        }
    }

    pub fn decimal64(fraction_digits: u8) -> Self {
        Self {
            fraction_digits,
            ..Self::of(TypeKind::Decimal64)
        }
    }

    pub fn bits(names: Vec<String>) -> Self {
        Self {
            bit_names: names,
            ..Self::of(TypeKind::Bits)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_range(mut self, min: Option<i128>, max: Option<i128>) -> Self {
        self.range.push(Range::new(min, max));
        self
    }

    pub fn with_decimal_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.decimal_range.push(Range::new(min, max));
        self
    }

    pub fn with_length(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.length.push(Range::new(min, max));
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Recursively flatten union alternatives into concrete leaf-kind
    /// descriptors, entering nested unions transparently. Declaration
    /// order is preserved; it is the dispatch order.
    pub fn flatten_alternatives(&self) -> Result<Vec<&TypeDescriptor>, TypeError> {
        fn walk<'a>(
            desc: &'a TypeDescriptor,
            out: &mut Vec<&'a TypeDescriptor>,
            depth: usize,
        ) -> Result<(), TypeError> {
            if depth > MAX_UNION_DEPTH {
                return Err(TypeError::UnionTooDeep {
                    type_name: desc.name.clone(),
                });
            }
            for alt in &desc.alternatives {
                match alt.kind {
                    TypeKind::Union => walk(alt, out, depth + 1)?,
                    _ => out.push(alt),
                }
            }
            Ok(())
        }

        let mut out = Vec::new();
        walk(self, &mut out, 0)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_bounds_match_widths() {
        assert_eq!(TypeKind::Int8.int_bounds(), Some((-128, 127)));
        assert_eq!(TypeKind::Uint16.int_bounds(), Some((0, 65535)));
        assert_eq!(TypeKind::String.int_bounds(), None);
    }

    #[test]
    fn ranges_are_disjunctive() {
        let ranges = vec![Range::new(Some(1), Some(3)), Range::new(Some(10), None)];
        assert!(in_ranges(&ranges, &2));
        assert!(in_ranges(&ranges, &11));
        assert!(!in_ranges(&ranges, &5));
        assert!(in_ranges::<i128>(&[], &5));
    }

    #[test]
    fn enum_lookup_strips_prefix() {
        let set = EnumType::new(
            "oper-status",
            [("UP".to_string(), 1), ("DOWN".to_string(), 2)],
        );
        assert_eq!(set.code("UP"), Some(1));
        assert_eq!(set.code("ietf-interfaces:DOWN"), Some(2));
        assert_eq!(set.code("TESTING"), None);
        assert_eq!(set.name_of(1), Some("UP"));
    }

    #[test]
    fn nested_unions_flatten_in_order() {
        let inner = TypeDescriptor::union(vec![
            TypeDescriptor::of(TypeKind::Int16),
            TypeDescriptor::of(TypeKind::Bool),
        ]);
        let outer = TypeDescriptor::union(vec![
            TypeDescriptor::of(TypeKind::String),
            inner,
            TypeDescriptor::of(TypeKind::Uint8),
        ]);
        let flat = outer.flatten_alternatives().unwrap();
        let kinds: Vec<_> = flat.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TypeKind::String,
                TypeKind::Int16,
                TypeKind::Bool,
                TypeKind::Uint8
            ]
        );
    }

    #[test]
    fn union_depth_is_capped() {
        let mut desc = TypeDescriptor::of(TypeKind::String);
        for _ in 0..(MAX_UNION_DEPTH + 2) {
            desc = TypeDescriptor::union(vec![desc]);
        }
        assert!(desc.flatten_alternatives().is_err());
    }
}
