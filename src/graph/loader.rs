//! Schema Loading
//!
//! Converts loosely-typed JSON documents into the tagged `SchemaNode` model
//! at ingestion. Recognized forms: `$ref`, `oneOf`/`anyOf`, `enum`, `const`,
//! `type` (string or array), `object` + `properties`/`required`,
//! `array` + `items`, and top-level `definitions`/`$defs`.
//!
//! A shape that matches none of the recognized kinds is reported, never
//! silently defaulted.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;
use walkdir::WalkDir;

use super::{Literal, NodeId, PrimitiveKind, Property, SchemaGraph, SchemaNode};
use crate::error::{CompileError, Result};

/// Load a single parsed document into a fresh graph.
pub fn load_document(doc: &Value) -> Result<SchemaGraph> {
    let mut graph = SchemaGraph::new();
    add_document(&mut graph, doc, "")?;
    Ok(graph)
}

/// Load one schema file.
pub fn load_from_file(path: &Path) -> Result<SchemaGraph> {
    let content = fs::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&content)?;
    load_document(&doc)
}

/// Load every `.json` file under a directory into one graph.
///
/// Files are visited in sorted order so node identity and emission order are
/// stable across runs. Cross-file references use the `file.json#/...` form.
pub fn load_from_directory(dir: &Path) -> Result<SchemaGraph> {
    let mut graph = SchemaGraph::new();
    let mut loaded = 0usize;

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }

        let relative = path.strip_prefix(dir).unwrap_or(path);
        let prefix = relative.to_string_lossy().replace('\\', "/");

        let content = fs::read_to_string(path)?;
        let doc: Value = serde_json::from_str(&content)?;
        add_document(&mut graph, &doc, &prefix)?;
        loaded += 1;
    }

    debug!(files = loaded, nodes = graph.node_count(), "directory loaded");
    Ok(graph)
}

/// Add one document to the graph. `prefix` qualifies node ids for
/// multi-document graphs ("" for a single document).
fn add_document(graph: &mut SchemaGraph, doc: &Value, prefix: &str) -> Result<()> {
    let obj = doc.as_object().ok_or_else(|| CompileError::UnclassifiableNode {
        id: format!("{}#", prefix),
        reason: "document root is not an object".to_string(),
    })?;

    // Definitions first, in document order: each is a root declaration.
    for key in ["definitions", "$defs"] {
        if let Some(defs) = obj.get(key).and_then(|v| v.as_object()) {
            for (name, schema) in defs {
                let pointer = format!("{}#/{}/{}", prefix, key, name);
                let id = convert(graph, schema, pointer, prefix)?;
                graph.add_root(id);
            }
        }
    }

    // The document itself may describe a shape beyond its definitions.
    if is_schema_like(obj) {
        let id = convert(graph, doc, format!("{}#", prefix), prefix)?;
        graph.add_root(id);
    }

    Ok(())
}

fn is_schema_like(obj: &serde_json::Map<String, Value>) -> bool {
    ["$ref", "oneOf", "anyOf", "enum", "const", "type", "properties"]
        .iter()
        .any(|k| obj.contains_key(*k))
}

/// Convert one schema value into a node at `pointer`, recursing into
/// subschemas. Returns the inserted node id.
fn convert(graph: &mut SchemaGraph, schema: &Value, pointer: String, prefix: &str) -> Result<NodeId> {
    let obj = schema
        .as_object()
        .ok_or_else(|| unclassifiable(&pointer, "schema is not an object"))?;

    let title = obj
        .get("title")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    // Reject conflicting constraints up front instead of picking a winner.
    let constraint_count = [
        obj.contains_key("$ref"),
        obj.contains_key("enum") || obj.contains_key("const"),
        obj.contains_key("oneOf") || obj.contains_key("anyOf"),
        obj.contains_key("type") || obj.contains_key("properties"),
    ]
    .iter()
    .filter(|&&c| c)
    .count();
    if constraint_count > 1 {
        return Err(unclassifiable(&pointer, "conflicting type constraints"));
    }

    if let Some(target) = obj.get("$ref").and_then(|v| v.as_str()) {
        let target = normalize_ref(target, prefix);
        return Ok(graph.insert(
            pointer,
            SchemaNode::Reference {
                target,
                resolved: None,
            },
        ));
    }

    if let Some(values) = obj.get("enum").and_then(|v| v.as_array()) {
        let values = values
            .iter()
            .map(|v| literal_from(v, &pointer))
            .collect::<Result<Vec<_>>>()?;
        return Ok(graph.insert(pointer, SchemaNode::Enum { title, values }));
    }

    if let Some(value) = obj.get("const") {
        let values = vec![literal_from(value, &pointer)?];
        return Ok(graph.insert(pointer, SchemaNode::Enum { title, values }));
    }

    for key in ["oneOf", "anyOf"] {
        if let Some(variants) = obj.get(key).and_then(|v| v.as_array()) {
            return convert_union(graph, variants, title, pointer, prefix, key);
        }
    }

    if let Some(types) = obj.get("type").and_then(|v| v.as_array()) {
        return convert_type_array(graph, obj, types, title, pointer, prefix);
    }

    match obj.get("type").and_then(|v| v.as_str()) {
        Some("object") => convert_object(graph, obj, title, pointer, prefix),
        Some("array") => {
            let items = obj
                .get("items")
                .ok_or_else(|| unclassifiable(&pointer, "array without items"))?;
            let items_id = convert(graph, items, format!("{}/items", pointer), prefix)?;
            Ok(graph.insert(pointer, SchemaNode::Array { items: items_id }))
        }
        Some(scalar) => {
            let kind = primitive_kind(scalar)
                .ok_or_else(|| unclassifiable(&pointer, "unrecognized type"))?;
            Ok(graph.insert(pointer, SchemaNode::Primitive(kind)))
        }
        None if obj.contains_key("properties") => {
            convert_object(graph, obj, title, pointer, prefix)
        }
        None => Err(unclassifiable(&pointer, "unrecognized schema shape")),
    }
}

fn convert_object(
    graph: &mut SchemaGraph,
    obj: &serde_json::Map<String, Value>,
    title: Option<String>,
    pointer: String,
    prefix: &str,
) -> Result<NodeId> {
    let required: Vec<&str> = obj
        .get("required")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    let mut properties = Vec::new();
    if let Some(props) = obj.get("properties").and_then(|v| v.as_object()) {
        // serde_json's preserve_order keeps source property order here.
        for (name, prop) in props {
            let target = convert(
                graph,
                prop,
                format!("{}/properties/{}", pointer, name),
                prefix,
            )?;
            properties.push(Property {
                name: name.clone(),
                target,
                required: required.contains(&name.as_str()),
            });
        }
    }

    Ok(graph.insert(pointer, SchemaNode::Object { title, properties }))
}

/// A union with a `{"type": "null"}` member lifts to Nullable over the rest.
fn convert_union(
    graph: &mut SchemaGraph,
    variants: &[Value],
    title: Option<String>,
    pointer: String,
    prefix: &str,
    key: &str,
) -> Result<NodeId> {
    let (null_members, concrete): (Vec<&Value>, Vec<&Value>) =
        variants.iter().partition(|v| is_null_schema(v));

    let mut member_ids = Vec::with_capacity(concrete.len());
    for (i, variant) in concrete.iter().enumerate() {
        let id = convert(graph, variant, format!("{}/{}/{}", pointer, key, i), prefix)?;
        member_ids.push(id);
    }

    if null_members.is_empty() {
        return Ok(graph.insert(
            pointer,
            SchemaNode::Union {
                title,
                members: member_ids,
            },
        ));
    }

    let inner = match member_ids.len() {
        0 => return Err(unclassifiable(&pointer, "union of only null")),
        1 => member_ids.remove(0),
        _ => graph.insert(
            format!("{}/{}", pointer, key),
            SchemaNode::Union {
                title: None,
                members: member_ids,
            },
        ),
    };
    // The lifted node keeps the schema's title so it still names the
    // declaration.
    Ok(graph.insert(pointer, SchemaNode::Nullable { title, target: inner }))
}

/// A `"null"` entry in a `type` array lifts to Nullable over the rest.
fn convert_type_array(
    graph: &mut SchemaGraph,
    obj: &serde_json::Map<String, Value>,
    types: &[Value],
    title: Option<String>,
    pointer: String,
    prefix: &str,
) -> Result<NodeId> {
    let names: Vec<&str> = types.iter().filter_map(|v| v.as_str()).collect();
    if names.len() != types.len() {
        return Err(unclassifiable(&pointer, "non-string entry in type array"));
    }

    let nullable = names.iter().any(|&t| t == "null");
    let concrete: Vec<&str> = names.into_iter().filter(|&t| t != "null").collect();

    // Without a null entry the concrete part lands at the pointer itself;
    // with one, the Nullable wrapper takes the pointer and the concrete part
    // nests under it.
    let inner_pointer = if nullable {
        format!("{}/type/0", pointer)
    } else {
        pointer.clone()
    };

    let inner = match concrete.len() {
        0 if nullable => graph.insert(inner_pointer, SchemaNode::Primitive(PrimitiveKind::Null)),
        0 => return Err(unclassifiable(&pointer, "empty type array")),
        1 => {
            // Re-run single-type conversion so object/array detail applies.
            let mut narrowed = obj.clone();
            narrowed.insert("type".to_string(), Value::String(concrete[0].to_string()));
            if nullable {
                // The lifted Nullable owns the title, not the inner node.
                narrowed.remove("title");
            }
            convert(graph, &Value::Object(narrowed), inner_pointer, prefix)?
        }
        _ => {
            let mut members = Vec::with_capacity(concrete.len());
            for (i, name) in concrete.iter().enumerate() {
                let kind = primitive_kind(name)
                    .ok_or_else(|| unclassifiable(&pointer, "unrecognized type"))?;
                members.push(graph.insert(
                    format!("{}/type/{}", pointer, i),
                    SchemaNode::Primitive(kind),
                ));
            }
            graph.insert(
                inner_pointer,
                SchemaNode::Union {
                    title: if nullable { None } else { title.clone() },
                    members,
                },
            )
        }
    };

    if nullable {
        Ok(graph.insert(pointer, SchemaNode::Nullable { title, target: inner }))
    } else {
        Ok(inner)
    }
}

fn is_null_schema(v: &Value) -> bool {
    v.get("type").and_then(|t| t.as_str()) == Some("null")
        || v.get("const").map(|c| c.is_null()).unwrap_or(false)
}

fn primitive_kind(name: &str) -> Option<PrimitiveKind> {
    match name {
        "string" => Some(PrimitiveKind::String),
        "number" | "integer" => Some(PrimitiveKind::Number),
        "boolean" => Some(PrimitiveKind::Boolean),
        "null" => Some(PrimitiveKind::Null),
        _ => None,
    }
}

fn literal_from(value: &Value, pointer: &str) -> Result<Literal> {
    match value {
        Value::String(s) => Ok(Literal::Str(s.clone())),
        Value::Number(n) => Ok(Literal::Num(n.clone())),
        Value::Bool(b) => Ok(Literal::Bool(*b)),
        _ => Err(unclassifiable(pointer, "unsupported literal value")),
    }
}

/// Qualify a local `#/...` reference with the document prefix; bare file
/// references point at that file's root.
fn normalize_ref(target: &str, prefix: &str) -> String {
    if let Some(rest) = target.strip_prefix('#') {
        format!("{}#{}", prefix, rest)
    } else if target.contains('#') {
        target.to_string()
    } else {
        format!("{}#", target)
    }
}

fn unclassifiable(pointer: &str, reason: &str) -> CompileError {
    CompileError::UnclassifiableNode {
        id: pointer.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_properties_keep_source_order() {
        let doc = json!({
            "definitions": {
                "User": {
                    "type": "object",
                    "required": ["login"],
                    "properties": {
                        "login": { "type": "string" },
                        "id": { "type": "number" },
                        "admin": { "type": "boolean" }
                    }
                }
            }
        });
        let graph = load_document(&doc).unwrap();

        match graph.get("#/definitions/User").unwrap() {
            SchemaNode::Object { properties, .. } => {
                let names: Vec<&str> = properties.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["login", "id", "admin"]);
                assert!(properties[0].required);
                assert!(!properties[1].required);
            }
            other => panic!("expected Object, got {:?}", other),
        }
    }

    #[test]
    fn test_type_array_with_null_becomes_nullable() {
        let doc = json!({
            "definitions": {
                "Email": { "type": ["string", "null"] }
            }
        });
        let graph = load_document(&doc).unwrap();

        match graph.get("#/definitions/Email").unwrap() {
            SchemaNode::Nullable { target, .. } => match graph.get(target).unwrap() {
                SchemaNode::Primitive(PrimitiveKind::String) => {}
                other => panic!("expected string primitive, got {:?}", other),
            },
            other => panic!("expected Nullable, got {:?}", other),
        }
    }

    #[test]
    fn test_nullable_lift_keeps_title() {
        let doc = json!({
            "definitions": {
                "email": { "title": "EmailAddress", "type": ["string", "null"] },
                "maybe": {
                    "title": "MaybeName",
                    "oneOf": [
                        { "type": "string" },
                        { "type": "null" }
                    ]
                }
            }
        });
        let graph = load_document(&doc).unwrap();

        assert_eq!(
            graph.get("#/definitions/email").unwrap().title(),
            Some("EmailAddress")
        );
        assert_eq!(
            graph.get("#/definitions/maybe").unwrap().title(),
            Some("MaybeName")
        );
    }

    #[test]
    fn test_type_array_without_null_lands_at_pointer() {
        let doc = json!({
            "definitions": {
                "Value": { "type": ["string", "number"] }
            }
        });
        let graph = load_document(&doc).unwrap();

        match graph.get("#/definitions/Value").unwrap() {
            SchemaNode::Union { members, .. } => assert_eq!(members.len(), 2),
            other => panic!("expected Union, got {:?}", other),
        }
        // No leftover twin node beside the union itself.
        assert!(graph.get("#/definitions/Value/type").is_none());
    }

    #[test]
    fn test_const_becomes_single_literal_enum() {
        let doc = json!({
            "definitions": {
                "Action": { "const": "created" }
            }
        });
        let graph = load_document(&doc).unwrap();

        match graph.get("#/definitions/Action").unwrap() {
            SchemaNode::Enum { values, .. } => {
                assert_eq!(values, &[Literal::Str("created".into())]);
            }
            other => panic!("expected Enum, got {:?}", other),
        }
    }

    #[test]
    fn test_oneof_with_null_member_lifts_to_nullable() {
        let doc = json!({
            "definitions": {
                "MaybeUser": {
                    "oneOf": [
                        { "type": "object", "properties": {} },
                        { "type": "null" }
                    ]
                }
            }
        });
        let graph = load_document(&doc).unwrap();

        assert!(matches!(
            graph.get("#/definitions/MaybeUser").unwrap(),
            SchemaNode::Nullable { .. }
        ));
    }

    #[test]
    fn test_conflicting_constraints_are_rejected() {
        let doc = json!({
            "definitions": {
                "Bad": { "type": "string", "enum": ["a"] }
            }
        });
        let err = load_document(&doc).unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnclassifiableNode { .. }
        ));
    }

    #[test]
    fn test_refs_are_prefix_qualified() {
        assert_eq!(normalize_ref("#/definitions/User", ""), "#/definitions/User");
        assert_eq!(
            normalize_ref("#/definitions/User", "events.json"),
            "events.json#/definitions/User"
        );
        assert_eq!(normalize_ref("user.json", "events.json"), "user.json#");
    }
}
