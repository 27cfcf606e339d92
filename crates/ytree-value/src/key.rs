use core::fmt::Display;

/// Key-comparable value which implements `Eq` and `Hash`.
///
/// Keyed-list entries are indexed by these. Integer keys are widened to
/// 64 bits so that a `uint8` key field and its map key compare equal;
/// composite (multi-field) keys become a tuple in field declaration
/// order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyValue {
    Bool(bool),
    Int64(i64),
    Uint64(u64),
    String(String),
    Tuple(Vec<KeyValue>),
}

impl Display for KeyValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            KeyValue::Bool(b) => write!(f, "{b}"),
            KeyValue::Int64(v) => write!(f, "{v}"),
            KeyValue::Uint64(v) => write!(f, "{v}"),
            KeyValue::String(s) => f.write_str(s),
            KeyValue::Tuple(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        KeyValue::String(s.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(s: String) -> Self {
        KeyValue::String(s)
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        KeyValue::Int64(v)
    }
}

impl From<u64> for KeyValue {
    fn from(v: u64) -> Self {
        KeyValue::Uint64(v)
    }
}

impl From<bool> for KeyValue {
    fn from(v: bool) -> Self {
        KeyValue::Bool(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_composite_key() {
        let key = KeyValue::Tuple(vec![KeyValue::String("eth0".into()), KeyValue::Uint64(4)]);
        assert_eq!(key.to_string(), "eth0 4");
    }
}
