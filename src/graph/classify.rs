//! Type Classification
//!
//! Maps each resolved node to a semantic type construct. Classification is
//! output-language-agnostic: it decides what each declaration *is* (object,
//! union, enum, alias) and how inline positions (primitives, arrays,
//! nullables, anonymous enums) are shaped. Rendering happens in
//! `codegen::dts`.
//!
//! Runs after cycle validation, so inline recursion below is guaranteed to
//! bottom out at a declarable node.

use indexmap::IndexMap;
use tracing::debug;

use super::analysis::is_declarable;
use super::{Literal, NodeId, PrimitiveKind, SchemaGraph, SchemaNode};
use crate::error::{CompileError, Result};

/// A field of an object declaration, in source property order
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Original property name, kept verbatim. Names that are not bare
    /// identifiers (`"+1"`) are quoted at render time, never altered.
    pub name: String,
    pub required: bool,
    pub ty: FieldType,
}

/// Language-agnostic type of a field or alias target
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Reference to a declarable node, rendered by name.
    Ref(NodeId),
    Primitive(PrimitiveKind),
    Array(Box<FieldType>),
    /// The type or null. Orthogonal to the field-level required flag; both
    /// may apply at once (`email?: string | null`).
    Nullable(Box<FieldType>),
    /// Anonymous enum, rendered as an inline union of literal types.
    LiteralUnion(Vec<Literal>),
}

impl FieldType {
    /// Wrap in Nullable, collapsing `T | null | null`.
    fn nullable(inner: FieldType) -> FieldType {
        match inner {
            FieldType::Nullable(_) => inner,
            other => FieldType::Nullable(Box::new(other)),
        }
    }
}

/// What kind of declaration a node produces
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Object {
        fields: Vec<FieldDef>,
    },
    /// Member ids are dereferenced to their concrete declarable nodes.
    /// The discriminant is filled in by the discriminator analyzer.
    Union {
        members: Vec<NodeId>,
        discriminant: Option<String>,
    },
    Enum {
        values: Vec<Literal>,
    },
    /// Roots that are references, arrays, nullables, or primitives.
    Alias {
        ty: FieldType,
    },
}

/// Classification result for a single declarable node
#[derive(Debug, Clone)]
pub struct Classification {
    pub node_id: NodeId,
    pub type_kind: TypeKind,
    /// Declared title, preferred by the name resolver.
    pub title: Option<String>,
}

/// Classifies all declarable nodes in a graph
pub struct Classifier<'a> {
    graph: &'a SchemaGraph,
}

impl<'a> Classifier<'a> {
    pub fn new(graph: &'a SchemaGraph) -> Self {
        Self { graph }
    }

    /// Classify every declarable node, in arena (first-discovered) order.
    pub fn classify_all(&self) -> Result<IndexMap<NodeId, Classification>> {
        let mut classifications = IndexMap::new();
        for (id, node) in self.graph.iter() {
            if is_declarable(self.graph, id, node) {
                classifications.insert(id.clone(), self.classify(id, node)?);
            }
        }
        debug!(declarations = classifications.len(), "classification complete");
        Ok(classifications)
    }

    fn classify(&self, id: &NodeId, node: &SchemaNode) -> Result<Classification> {
        let type_kind = match node {
            SchemaNode::Object { properties, .. } => TypeKind::Object {
                fields: properties
                    .iter()
                    .map(|p| {
                        Ok(FieldDef {
                            name: p.name.clone(),
                            required: p.required,
                            ty: self.field_type(&p.target)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            },
            SchemaNode::Union { members, .. } => {
                if members.is_empty() {
                    return Err(unclassifiable(id, "union with no members"));
                }
                let members = members
                    .iter()
                    .map(|m| self.graph.target_of(m).cloned())
                    .collect::<Result<Vec<_>>>()?;
                TypeKind::Union {
                    members,
                    discriminant: None,
                }
            }
            SchemaNode::Enum { values, .. } => {
                if values.is_empty() {
                    return Err(unclassifiable(id, "enum with no values"));
                }
                TypeKind::Enum {
                    values: values.clone(),
                }
            }
            SchemaNode::Reference { .. }
            | SchemaNode::Array { .. }
            | SchemaNode::Nullable { .. }
            | SchemaNode::Primitive(_) => TypeKind::Alias {
                ty: self.alias_type(id, node)?,
            },
        };

        Ok(Classification {
            node_id: id.clone(),
            type_kind,
            title: node.title().map(str::to_string),
        })
    }

    /// Type of a root that declares an alias rather than a body.
    fn alias_type(&self, id: &NodeId, node: &SchemaNode) -> Result<FieldType> {
        match node {
            SchemaNode::Reference { .. } => {
                // Alias to the reference target by name, or to its inline
                // shape when the target is not declarable.
                let concrete = self.graph.target_of(id)?.clone();
                self.field_type(&concrete)
            }
            SchemaNode::Array { items } => {
                Ok(FieldType::Array(Box::new(self.field_type(items)?)))
            }
            SchemaNode::Nullable { target, .. } => {
                Ok(FieldType::nullable(self.field_type(target)?))
            }
            SchemaNode::Primitive(kind) => Ok(FieldType::Primitive(*kind)),
            _ => Err(unclassifiable(id, "node cannot be aliased")),
        }
    }

    /// Shape of a node in field position: declarable targets become named
    /// references, everything else expands inline.
    fn field_type(&self, id: &NodeId) -> Result<FieldType> {
        let concrete = self.graph.target_of(id)?.clone();
        let node = self
            .graph
            .get(&concrete)
            .ok_or_else(|| unclassifiable(&concrete, "dangling node id"))?;

        if is_declarable(self.graph, &concrete, node) {
            return Ok(FieldType::Ref(concrete));
        }

        match node {
            SchemaNode::Primitive(kind) => Ok(FieldType::Primitive(*kind)),
            SchemaNode::Array { items } => {
                Ok(FieldType::Array(Box::new(self.field_type(items)?)))
            }
            SchemaNode::Nullable { target, .. } => {
                Ok(FieldType::nullable(self.field_type(target)?))
            }
            SchemaNode::Enum { values, .. } => {
                if values.is_empty() {
                    return Err(unclassifiable(&concrete, "enum with no values"));
                }
                Ok(FieldType::LiteralUnion(values.clone()))
            }
            // Objects and unions are always declarable; references are
            // consumed by target_of.
            _ => Err(unclassifiable(&concrete, "unexpected inline node")),
        }
    }
}

fn unclassifiable(id: &str, reason: &str) -> CompileError {
    CompileError::UnclassifiableNode {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{load_document, resolve_references};
    use serde_json::json;

    fn classify(doc: serde_json::Value) -> IndexMap<NodeId, Classification> {
        let mut graph = load_document(&doc).unwrap();
        resolve_references(&mut graph).unwrap();
        Classifier::new(&graph).classify_all().unwrap()
    }

    #[test]
    fn test_optional_and_nullable_are_independent() {
        let classifications = classify(json!({
            "definitions": {
                "User": {
                    "type": "object",
                    "required": ["url"],
                    "properties": {
                        "email": { "type": ["string", "null"] },
                        "url": { "type": ["string", "null"] }
                    }
                }
            }
        }));

        let class = &classifications["#/definitions/User"];
        let TypeKind::Object { fields } = &class.type_kind else {
            panic!("expected Object");
        };

        // email: optional AND nullable
        assert!(!fields[0].required);
        assert!(matches!(fields[0].ty, FieldType::Nullable(_)));
        // url: required but still nullable
        assert!(fields[1].required);
        assert!(matches!(fields[1].ty, FieldType::Nullable(_)));
    }

    #[test]
    fn test_anonymous_enum_is_inline_literal_union() {
        let classifications = classify(json!({
            "definitions": {
                "User": {
                    "type": "object",
                    "required": ["type"],
                    "properties": {
                        "type": { "enum": ["Bot", "User", "Organization"] }
                    }
                }
            }
        }));

        // The untitled enum does not declare on its own.
        assert_eq!(classifications.len(), 1);
        let TypeKind::Object { fields } = &classifications["#/definitions/User"].type_kind else {
            panic!("expected Object");
        };
        match &fields[0].ty {
            FieldType::LiteralUnion(values) => assert_eq!(values.len(), 3),
            other => panic!("expected LiteralUnion, got {:?}", other),
        }
    }

    #[test]
    fn test_titled_enum_declares_and_is_referenced_by_name() {
        let classifications = classify(json!({
            "definitions": {
                "Issue": {
                    "type": "object",
                    "required": ["state"],
                    "properties": {
                        "state": {
                            "title": "IssueState",
                            "enum": ["open", "closed"]
                        }
                    }
                }
            }
        }));

        assert_eq!(classifications.len(), 2);
        let TypeKind::Object { fields } = &classifications["#/definitions/Issue"].type_kind else {
            panic!("expected Object");
        };
        assert!(matches!(&fields[0].ty, FieldType::Ref(id) if id.ends_with("/state")));
    }

    #[test]
    fn test_reference_root_becomes_alias() {
        let classifications = classify(json!({
            "definitions": {
                "Schema": { "type": "object", "properties": {} },
                "WebhookEvent": { "$ref": "#/definitions/Schema" }
            }
        }));

        let class = &classifications["#/definitions/WebhookEvent"];
        match &class.type_kind {
            TypeKind::Alias {
                ty: FieldType::Ref(target),
            } => assert_eq!(target, "#/definitions/Schema"),
            other => panic!("expected Alias to Schema, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_union_is_unclassifiable() {
        let doc = json!({
            "definitions": {
                "Bad": { "oneOf": [] }
            }
        });
        let mut graph = load_document(&doc).unwrap();
        resolve_references(&mut graph).unwrap();
        let err = Classifier::new(&graph).classify_all().unwrap_err();
        assert!(matches!(err, CompileError::UnclassifiableNode { .. }));
    }
}
