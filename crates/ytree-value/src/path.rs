use core::fmt::Display;

use thisisplural::Plural;

use crate::key::KeyValue;

/// A concrete location in a data tree, used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Plural)]
pub struct DataPath(pub Vec<DataPathSegment>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataPathSegment {
    /// A named child of a container.
    Field(String),
    /// A keyed-list entry.
    Key(KeyValue),
    /// An unkeyed-list entry or leaf-list element.
    Index(usize),
}

impl DataPath {
    /// Create an empty path representing the data-tree root.
    pub fn root() -> Self {
        DataPath(Vec::new())
    }

    /// Check if this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for DataPath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            match segment {
                DataPathSegment::Field(name) => write!(f, "/{name}")?,
                DataPathSegment::Key(key) => write!(f, "[{key}]")?,
                DataPathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
