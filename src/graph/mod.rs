//! Schema Graph
//!
//! Normalized in-memory representation of all schema nodes and their
//! references. Loosely-typed source documents are converted into the tagged
//! `SchemaNode` model at ingestion, so every later stage operates over a
//! closed, statically known set of kinds rather than ad hoc shape inspection.
//!
//! Nodes live in an arena indexed by stable identity (a JSON-pointer-like
//! path into the source document). Insertion order is first-discovered order
//! and drives emission order. Nodes are created once by the loader, mutated
//! only by the resolver (reference substitution), and never deleted.

pub mod analysis;
pub mod classify;
pub mod discriminant;
pub mod loader;
pub mod resolve;

pub use analysis::{compute_scc_analysis, is_declarable, validate_expansion, SccAnalysis};
pub use classify::{Classification, Classifier, FieldDef, FieldType, TypeKind};
pub use discriminant::analyze_unions;
pub use loader::{load_document, load_from_directory, load_from_file};
pub use resolve::resolve_references;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CompileError, Result};

/// Stable node identity: a JSON-pointer-like path into the source schema
/// (e.g. `#/definitions/User/properties/plan`).
pub type NodeId = String;

/// A literal value appearing in an enum or const position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Str(String),
    Num(serde_json::Number),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        _ => write!(f, "{}", c)?,
                    }
                }
                f.write_str("\"")
            }
            Literal::Num(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Primitive JSON types (`integer` normalizes to `Number` at ingestion)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
    Null,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Null => "null",
        }
    }
}

/// One property of an object node, in source order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub target: NodeId,
    /// Property-level flag, orthogonal to the target's nullability.
    pub required: bool,
}

/// One typed unit in the normalized model of the source schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchemaNode {
    Object {
        title: Option<String>,
        properties: Vec<Property>,
    },
    Array {
        items: NodeId,
    },
    /// Member order is preserved for output stability; unions of unions are
    /// never flattened.
    Union {
        title: Option<String>,
        members: Vec<NodeId>,
    },
    Enum {
        title: Option<String>,
        values: Vec<Literal>,
    },
    Primitive(PrimitiveKind),
    /// Unresolved pointer to another node. The resolver fills `resolved`;
    /// an unresolved reference at emission time is a fatal error.
    Reference {
        target: String,
        resolved: Option<NodeId>,
    },
    /// The target type or null. Distinct from "optional", which is the
    /// property-level `required = false`. Carries the source title when the
    /// loader lifted a titled schema into this form.
    Nullable {
        title: Option<String>,
        target: NodeId,
    },
}

impl SchemaNode {
    /// Declared title, for kinds that can carry one.
    pub fn title(&self) -> Option<&str> {
        match self {
            SchemaNode::Object { title, .. }
            | SchemaNode::Union { title, .. }
            | SchemaNode::Enum { title, .. }
            | SchemaNode::Nullable { title, .. } => title.as_deref(),
            _ => None,
        }
    }
}

/// Arena of schema nodes in first-discovered order
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    nodes: IndexMap<NodeId, SchemaNode>,
    roots: IndexSet<NodeId>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node under its identity. Returns the id for chaining.
    pub fn insert(&mut self, id: NodeId, node: SchemaNode) -> NodeId {
        self.nodes.insert(id.clone(), node);
        id
    }

    /// Mark a node as a document root (top-level declaration).
    pub fn add_root(&mut self, id: NodeId) {
        self.roots.insert(id);
    }

    pub fn get(&self, id: &str) -> Option<&SchemaNode> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut SchemaNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn is_root(&self, id: &str) -> bool {
        self.roots.contains(id)
    }

    pub fn roots(&self) -> impl Iterator<Item = &NodeId> {
        self.roots.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn all_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &SchemaNode)> {
        self.nodes.iter()
    }

    /// Immediate child node ids (resolved references contribute their target).
    pub fn children(&self, id: &str) -> Vec<NodeId> {
        match self.nodes.get(id) {
            Some(SchemaNode::Object { properties, .. }) => {
                properties.iter().map(|p| p.target.clone()).collect()
            }
            Some(SchemaNode::Array { items }) => vec![items.clone()],
            Some(SchemaNode::Union { members, .. }) => members.clone(),
            Some(SchemaNode::Nullable { target, .. }) => vec![target.clone()],
            Some(SchemaNode::Reference {
                resolved: Some(target),
                ..
            }) => vec![target.clone()],
            _ => Vec::new(),
        }
    }

    /// Follow resolved reference chains to the concrete node behind `id`.
    ///
    /// Fails when a reference is still unresolved, or when a chain of pure
    /// references loops back on itself without ever reaching a concrete node.
    pub fn target_of(&self, id: &str) -> Result<&NodeId> {
        let mut current = id;
        for _ in 0..=self.nodes.len() {
            let (key, node) = self.nodes.get_key_value(current).ok_or_else(|| {
                CompileError::UnclassifiableNode {
                    id: current.to_string(),
                    reason: "dangling node id".to_string(),
                }
            })?;
            match node {
                SchemaNode::Reference {
                    resolved: Some(next),
                    ..
                } => current = next,
                SchemaNode::Reference {
                    target,
                    resolved: None,
                } => {
                    return Err(CompileError::UnresolvedReference {
                        reference: target.clone(),
                        at: key.clone(),
                    })
                }
                _ => return Ok(key),
            }
        }
        Err(CompileError::UnresolvedReference {
            reference: id.to_string(),
            at: id.to_string(),
        })
    }
}
