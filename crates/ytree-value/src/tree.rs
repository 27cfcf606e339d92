//! Arena-backed data tree.
//!
//! Nodes live in a flat `Vec` indexed by [`DataNodeId`]; each node
//! carries a non-owning parent id established at insertion time.
//! Unmarshaling mutates the arena in place; validation only reads it.

use indexmap::IndexMap;
use thiserror::Error;

use crate::key::KeyValue;
use crate::scalar::LeafValue;

/// Index of a node within a [`DataTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataNodeId(pub usize);

/// A node in the data tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DataNode {
    pub parent: Option<DataNodeId>,
    pub content: DataNodeValue,
}

/// Content of a data node.
#[derive(Debug, Clone, PartialEq)]
pub enum DataNodeValue {
    /// A container, a list entry, or the (flattened) fields of choice
    /// cases. Field names with a leading `@` are annotation fields with
    /// no schema counterpart.
    Container {
        children: IndexMap<String, DataNodeId>,
    },
    /// A keyed list: entries indexed by their key value.
    KeyedList {
        entries: IndexMap<KeyValue, DataNodeId>,
    },
    /// An unkeyed list: entries in insertion order.
    UnkeyedList { entries: Vec<DataNodeId> },
    Leaf(LeafValue),
    LeafList(Vec<LeafValue>),
}

impl DataNodeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            DataNodeValue::Container { .. } => "container",
            DataNodeValue::KeyedList { .. } => "keyed list",
            DataNodeValue::UnkeyedList { .. } => "list",
            DataNodeValue::Leaf(_) => "leaf",
            DataNodeValue::LeafList(_) => "leaf-list",
        }
    }

    pub fn empty_container() -> Self {
        DataNodeValue::Container {
            children: IndexMap::new(),
        }
    }
}

/// Errors from data-tree mutation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TreeError {
    #[error("node is a {actual}, expected a container")]
    NotAContainer { actual: &'static str },

    #[error("node is a {actual}, expected a list")]
    NotAList { actual: &'static str },

    #[error("container already has a child named '{name}'")]
    DuplicateChild { name: String },
}

/// An arena-backed data tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTree {
    nodes: Vec<DataNode>,
    root: DataNodeId,
}

impl Default for DataTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DataTree {
    /// Create a tree whose root is an empty container.
    pub fn new() -> Self {
        Self {
            nodes: vec![DataNode {
                parent: None,
                content: DataNodeValue::empty_container(),
            }],
            root: DataNodeId(0),
        }
    }

    pub fn root_id(&self) -> DataNodeId {
        self.root
    }

    pub fn node(&self, id: DataNodeId) -> &DataNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: DataNodeId) -> &mut DataNode {
        &mut self.nodes[id.0]
    }

    /// Look up a named child of a container node.
    pub fn child(&self, parent: DataNodeId, name: &str) -> Option<DataNodeId> {
        match &self.node(parent).content {
            DataNodeValue::Container { children } => children.get(name).copied(),
            _ => None,
        }
    }

    /// The parent for structural (instance-path) navigation: list nodes
    /// are transparent, so `..` from a list entry reaches the container
    /// that holds the list.
    pub fn structural_parent(&self, id: DataNodeId) -> Option<DataNodeId> {
        let parent = self.node(id).parent?;
        match &self.node(parent).content {
            DataNodeValue::KeyedList { .. } | DataNodeValue::UnkeyedList { .. } => {
                self.node(parent).parent
            }
            _ => Some(parent),
        }
    }

    /// Insert a child with the given content under a container node.
    ///
    /// Fails if the parent is not a container or the name is taken.
    pub fn add_child(
        &mut self,
        parent: DataNodeId,
        name: &str,
        content: DataNodeValue,
    ) -> Result<DataNodeId, TreeError> {
        match &self.node(parent).content {
            DataNodeValue::Container { children } => {
                if children.contains_key(name) {
                    return Err(TreeError::DuplicateChild {
                        name: name.to_string(),
                    });
                }
            }
            other => {
                return Err(TreeError::NotAContainer {
                    actual: other.type_name(),
                });
            }
        }
        let id = self.push_node(Some(parent), content);
        if let DataNodeValue::Container { children } = &mut self.node_mut(parent).content {
            children.insert(name.to_string(), id);
        }
        Ok(id)
    }

    /// Get the named container child, creating an empty one if absent.
    pub fn ensure_container(
        &mut self,
        parent: DataNodeId,
        name: &str,
    ) -> Result<DataNodeId, TreeError> {
        if let Some(existing) = self.child(parent, name) {
            return Ok(existing);
        }
        self.add_child(parent, name, DataNodeValue::empty_container())
    }

    /// Set a leaf child, replacing any previous value.
    pub fn set_leaf(
        &mut self,
        parent: DataNodeId,
        name: &str,
        value: LeafValue,
    ) -> Result<DataNodeId, TreeError> {
        if let Some(existing) = self.child(parent, name) {
            self.node_mut(existing).content = DataNodeValue::Leaf(value);
            return Ok(existing);
        }
        self.add_child(parent, name, DataNodeValue::Leaf(value))
    }

    /// Get the entry of a keyed list for `key`, creating an empty
    /// container entry if absent.
    pub fn ensure_entry(
        &mut self,
        list: DataNodeId,
        key: KeyValue,
    ) -> Result<DataNodeId, TreeError> {
        match &self.node(list).content {
            DataNodeValue::KeyedList { entries } => {
                if let Some(existing) = entries.get(&key) {
                    return Ok(*existing);
                }
            }
            other => {
                return Err(TreeError::NotAList {
                    actual: other.type_name(),
                });
            }
        }
        let id = self.push_node(Some(list), DataNodeValue::empty_container());
        if let DataNodeValue::KeyedList { entries } = &mut self.node_mut(list).content {
            entries.insert(key, id);
        }
        Ok(id)
    }

    /// Append an entry to an unkeyed list.
    pub fn push_entry(&mut self, list: DataNodeId) -> Result<DataNodeId, TreeError> {
        match &self.node(list).content {
            DataNodeValue::UnkeyedList { .. } => {}
            other => {
                return Err(TreeError::NotAList {
                    actual: other.type_name(),
                });
            }
        }
        let id = self.push_node(Some(list), DataNodeValue::empty_container());
        if let DataNodeValue::UnkeyedList { entries } = &mut self.node_mut(list).content {
            entries.push(id);
        }
        Ok(id)
    }

    fn push_node(&mut self, parent: Option<DataNodeId>, content: DataNodeValue) -> DataNodeId {
        let id = DataNodeId(self.nodes.len());
        self.nodes.push(DataNode { parent, content });
        id
    }
}
