//! Schema tree representation.
//!
//! Nodes live in a flat arena indexed by [`SchemaNodeId`]; each node
//! carries a non-owning parent id established when the node is
//! inserted and never mutated afterwards. The tree is built once at
//! startup and treated as immutable by validation and unmarshaling.

use indexmap::IndexMap;
use thiserror::Error;

use crate::path::PathResolveError;
use crate::types::{MAX_UNION_DEPTH, TypeDescriptor, TypeKind};

/// Index of a node within a [`SchemaTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaNodeId(pub usize);

/// The statement kind of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Container,
    List,
    Leaf,
    LeafList,
    Choice,
    Case,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Container => "container",
            NodeKind::List => "list",
            NodeKind::Leaf => "leaf",
            NodeKind::LeafList => "leaf-list",
            NodeKind::Choice => "choice",
            NodeKind::Case => "case",
        }
    }
}

impl core::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// One position in the schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<SchemaNodeId>,
    pub children: IndexMap<String, SchemaNodeId>,
    /// Type of a leaf or leaf-list node. Always present for those
    /// kinds in a well-formed schema.
    pub type_desc: Option<TypeDescriptor>,
    /// Space-separated key leaf names of a keyed list.
    pub key: Option<String>,
    pub min_elements: Option<u64>,
    pub max_elements: Option<u64>,
    /// False for state (read-only) nodes.
    pub config: bool,
    pub module: Option<String>,
    /// Marks the synthetic root inserted above the modeled top-level
    /// nodes. Absolute paths resolve from here.
    pub fake_root: bool,
}

impl SchemaNode {
    fn new(name: &str, kind: NodeKind, parent: Option<SchemaNodeId>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            parent,
            children: IndexMap::new(),
            type_desc: None,
            key: None,
            min_elements: None,
            max_elements: None,
            config: true,
            module: None,
            fake_root: false,
        }
    }

    /// Key leaf names of a keyed list, in declaration order.
    pub fn key_fields(&self) -> Vec<&str> {
        self.key
            .as_deref()
            .map(|k| k.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// Defects found by the lightweight sanity re-checks performed before
/// validating against a node. Structural schema validation proper is
/// the schema compiler's job; these only catch inconsistencies that
/// would make validation meaningless.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaDefect {
    #[error("{kind} '{name}' has no type descriptor")]
    MissingType { kind: NodeKind, name: String },

    #[error("list '{name}' declares key field '{field}' but has no such child")]
    MissingKeyChild { name: String, field: String },
}

/// Errors resolving a leafref or union type through the schema.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeResolveError {
    #[error("leafref type has no path")]
    MissingPath,

    #[error(transparent)]
    Path(#[from] PathResolveError),

    #[error("leafref target '{name}' has no type")]
    UntypedTarget { name: String },

    #[error("union or leafref chain nests deeper than {MAX_UNION_DEPTH} levels")]
    TooDeep,
}

/// An arena-backed schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaTree {
    nodes: Vec<SchemaNode>,
    root: SchemaNodeId,
}

impl Default for SchemaTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaTree {
    /// Create a tree with a synthetic root container.
    pub fn new() -> Self {
        let mut root = SchemaNode::new("root", NodeKind::Container, None);
        root.fake_root = true;
        Self {
            nodes: vec![root],
            root: SchemaNodeId(0),
        }
    }

    pub fn root_id(&self) -> SchemaNodeId {
        self.root
    }

    pub fn node(&self, id: SchemaNodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: SchemaNodeId) -> &mut SchemaNode {
        &mut self.nodes[id.0]
    }

    fn insert(&mut self, parent: SchemaNodeId, node: SchemaNode) -> SchemaNodeId {
        let id = SchemaNodeId(self.nodes.len());
        let name = node.name.clone();
        self.nodes.push(node);
        self.nodes[parent.0].children.insert(name, id);
        id
    }

    pub fn add_container(&mut self, parent: SchemaNodeId, name: &str) -> SchemaNodeId {
        self.insert(parent, SchemaNode::new(name, NodeKind::Container, Some(parent)))
    }

    pub fn add_list(&mut self, parent: SchemaNodeId, name: &str, key: Option<&str>) -> SchemaNodeId {
        let mut node = SchemaNode::new(name, NodeKind::List, Some(parent));
        node.key = key.map(str::to_string);
        self.insert(parent, node)
    }

    pub fn add_leaf(
        &mut self,
        parent: SchemaNodeId,
        name: &str,
        type_desc: TypeDescriptor,
    ) -> SchemaNodeId {
        let mut node = SchemaNode::new(name, NodeKind::Leaf, Some(parent));
        node.type_desc = Some(type_desc);
        self.insert(parent, node)
    }

    pub fn add_leaf_list(
        &mut self,
        parent: SchemaNodeId,
        name: &str,
        type_desc: TypeDescriptor,
    ) -> SchemaNodeId {
        let mut node = SchemaNode::new(name, NodeKind::LeafList, Some(parent));
        node.type_desc = Some(type_desc);
        self.insert(parent, node)
    }

    pub fn add_choice(&mut self, parent: SchemaNodeId, name: &str) -> SchemaNodeId {
        self.insert(parent, SchemaNode::new(name, NodeKind::Choice, Some(parent)))
    }

    pub fn add_case(&mut self, choice: SchemaNodeId, name: &str) -> SchemaNodeId {
        self.insert(choice, SchemaNode::new(name, NodeKind::Case, Some(choice)))
    }

    /// Direct child lookup by name.
    pub fn child(&self, parent: SchemaNodeId, name: &str) -> Option<SchemaNodeId> {
        self.node(parent).children.get(name).copied()
    }

    /// Child lookup as seen from the data tree: choice and case nodes
    /// are transparent, since cases are flattened into the containing
    /// record.
    pub fn data_child(&self, parent: SchemaNodeId, name: &str) -> Option<SchemaNodeId> {
        let node = self.node(parent);
        if let Some(&id) = node.children.get(name)
            && !matches!(self.node(id).kind, NodeKind::Choice | NodeKind::Case)
        {
            return Some(id);
        }
        for &child_id in node.children.values() {
            if matches!(self.node(child_id).kind, NodeKind::Choice | NodeKind::Case)
                && let Some(found) = self.data_child(child_id, name)
            {
                return Some(found);
            }
        }
        None
    }

    /// Whether this node counts as the tree root for path resolution
    /// and for triggering the global leafref pass.
    pub fn is_root(&self, id: SchemaNodeId) -> bool {
        let node = self.node(id);
        node.fake_root || node.parent.is_none()
    }

    /// Ascend parent links until a root node is reached.
    pub fn root_of(&self, id: SchemaNodeId) -> SchemaNodeId {
        let mut cur = id;
        while !self.is_root(cur) {
            match self.node(cur).parent {
                Some(parent) => cur = parent,
                None => break,
            }
        }
        cur
    }

    /// For a data field of `container` resolved to schema node `child`,
    /// every (choice, selected case) pair crossed between the two,
    /// outermost first. A child directly under a choice (no explicit
    /// case statement) stands for its own case. Used to enforce the
    /// at-most-one-case-selected invariant.
    pub fn owning_cases(
        &self,
        container: SchemaNodeId,
        child: SchemaNodeId,
    ) -> Vec<(SchemaNodeId, SchemaNodeId)> {
        let mut chain = vec![child];
        let mut cur = child;
        loop {
            match self.node(cur).parent {
                Some(parent) if parent == container => break,
                Some(parent) => {
                    chain.push(parent);
                    cur = parent;
                }
                None => return Vec::new(),
            }
        }

        let mut out = Vec::new();
        let mut iter = chain.iter().rev().peekable();
        while let Some(&node) = iter.next() {
            if self.node(node).kind == NodeKind::Choice
                && let Some(&&below) = iter.peek()
            {
                out.push((node, below));
            }
        }
        out
    }

    /// Resolve a leafref descriptor (possibly a chain of leafrefs) to
    /// the node and descriptor it finally points at. `at` is the node
    /// whose type carries the leafref, anchoring relative paths.
    pub fn resolve_leafref_type<'a>(
        &'a self,
        at: SchemaNodeId,
        desc: &'a TypeDescriptor,
    ) -> Result<(SchemaNodeId, &'a TypeDescriptor), TypeResolveError> {
        self.resolve_leafref_inner(at, desc, 0)
    }

    fn resolve_leafref_inner<'a>(
        &'a self,
        at: SchemaNodeId,
        desc: &'a TypeDescriptor,
        depth: usize,
    ) -> Result<(SchemaNodeId, &'a TypeDescriptor), TypeResolveError> {
        if depth > MAX_UNION_DEPTH {
            return Err(TypeResolveError::TooDeep);
        }
        let path = desc.path.as_deref().ok_or(TypeResolveError::MissingPath)?;
        let target = crate::path::resolve_schema_path(self, at, path)?;
        let target_desc = self.node(target).type_desc.as_ref().ok_or_else(|| {
            TypeResolveError::UntypedTarget {
                name: self.node(target).name.clone(),
            }
        })?;
        match target_desc.kind {
            TypeKind::Leafref => self.resolve_leafref_inner(target, target_desc, depth + 1),
            _ => Ok((target, target_desc)),
        }
    }

    /// Flatten a union descriptor into concrete alternatives, entering
    /// nested unions transparently and dereferencing leafref
    /// alternatives to their target types. Declaration order is
    /// preserved; it is the dispatch order.
    pub fn concrete_alternatives<'a>(
        &'a self,
        at: SchemaNodeId,
        desc: &'a TypeDescriptor,
    ) -> Result<Vec<&'a TypeDescriptor>, TypeResolveError> {
        fn walk<'a>(
            tree: &'a SchemaTree,
            at: SchemaNodeId,
            desc: &'a TypeDescriptor,
            out: &mut Vec<&'a TypeDescriptor>,
            depth: usize,
        ) -> Result<(), TypeResolveError> {
            if depth > MAX_UNION_DEPTH {
                return Err(TypeResolveError::TooDeep);
            }
            for alt in &desc.alternatives {
                match alt.kind {
                    TypeKind::Union => walk(tree, at, alt, out, depth + 1)?,
                    TypeKind::Leafref => {
                        let (target, resolved) = tree.resolve_leafref_inner(at, alt, depth + 1)?;
                        if resolved.kind == TypeKind::Union {
                            walk(tree, target, resolved, out, depth + 1)?;
                        } else {
                            out.push(resolved);
                        }
                    }
                    _ => out.push(alt),
                }
            }
            Ok(())
        }

        let mut out = Vec::new();
        walk(self, at, desc, &mut out, 0)?;
        Ok(out)
    }

    /// Lightweight sanity re-checks before validating against a node.
    pub fn verify_node(&self, id: SchemaNodeId) -> Result<(), SchemaDefect> {
        let node = self.node(id);
        match node.kind {
            NodeKind::Leaf | NodeKind::LeafList => {
                if node.type_desc.is_none() {
                    return Err(SchemaDefect::MissingType {
                        kind: node.kind,
                        name: node.name.clone(),
                    });
                }
            }
            NodeKind::List if node.config => {
                for field in node.key_fields() {
                    if self.child(id, field).is_none() {
                        return Err(SchemaDefect::MissingKeyChild {
                            name: node.name.clone(),
                            field: field.to_string(),
                        });
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}
