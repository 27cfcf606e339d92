//! Value and data-tree types for YANG-modeled data.
//!
//! This crate provides the in-memory data model shared by the schema
//! validation and unmarshaling crates: typed scalar values, the
//! key-comparable subset used for keyed lists, and an arena-backed data
//! tree with non-owning parent links.

/// Scalar values, leaf values and the resolved-union wrapper.
pub mod scalar;

/// Key-comparable values for keyed lists.
pub mod key;

/// Display paths into a data tree, used in diagnostics.
pub mod path;

/// Arena-backed data tree.
pub mod tree;

pub use key::KeyValue;
pub use path::{DataPath, DataPathSegment};
pub use scalar::{EnumValue, LeafValue, ScalarKind, ScalarValue, UnionScalar};
pub use tree::{DataNode, DataNodeId, DataNodeValue, DataTree, TreeError};
