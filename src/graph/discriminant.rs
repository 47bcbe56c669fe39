//! Discriminator Analysis
//!
//! Detects tagged unions: a union whose members are all objects sharing a
//! required property that carries a distinct literal value in each member.
//! The tag is advisory output metadata; detection failure is never an error,
//! the union just stays undiscriminated.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use super::classify::{Classification, FieldType, TypeKind};
use super::{Literal, NodeId};

/// Fill in the discriminant of every union classification where one exists.
///
/// Runs over the finished classification map so member objects are already
/// classified regardless of declaration order.
pub fn analyze_unions(classifications: &mut IndexMap<NodeId, Classification>) {
    let mut tags: Vec<(NodeId, String)> = Vec::new();

    for (id, class) in classifications.iter() {
        if let TypeKind::Union { members, .. } = &class.type_kind {
            if let Some(tag) = find_discriminant(members, classifications) {
                tags.push((id.clone(), tag));
            }
        }
    }

    debug!(discriminated = tags.len(), "union analysis complete");

    for (id, tag) in tags {
        if let Some(Classification {
            type_kind: TypeKind::Union { discriminant, .. },
            ..
        }) = classifications.get_mut(&id)
        {
            *discriminant = Some(tag);
        }
    }
}

/// The shared tag property of a union, if all members agree on one.
///
/// Candidates are tried in the first member's property order, so when several
/// properties qualify the earliest one wins. A member that is not an object
/// (a nested union, an enum, an alias) disqualifies the whole union.
fn find_discriminant(
    members: &[NodeId],
    classifications: &IndexMap<NodeId, Classification>,
) -> Option<String> {
    let member_fields: Vec<_> = members
        .iter()
        .map(|m| match classifications.get(m).map(|c| &c.type_kind) {
            Some(TypeKind::Object { fields }) => Some(fields),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;

    let (first, rest) = member_fields.split_first()?;

    'candidate: for field in first.iter() {
        let Some(literal) = tag_literal(&field.ty, field.required) else {
            continue;
        };
        let mut seen: HashSet<&Literal> = HashSet::new();
        seen.insert(literal);

        for fields in rest {
            let Some(other) = fields.iter().find(|f| f.name == field.name) else {
                continue 'candidate;
            };
            let Some(literal) = tag_literal(&other.ty, other.required) else {
                continue 'candidate;
            };
            // Two members carrying the same literal cannot be told apart.
            if !seen.insert(literal) {
                continue 'candidate;
            }
        }

        return Some(field.name.clone());
    }

    None
}

/// The single literal a field pins, when it qualifies as a tag.
fn tag_literal(ty: &FieldType, required: bool) -> Option<&Literal> {
    if !required {
        return None;
    }
    match ty {
        FieldType::LiteralUnion(values) if values.len() == 1 => Some(&values[0]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{load_document, resolve_references, Classifier};
    use serde_json::json;

    fn classify(doc: serde_json::Value) -> IndexMap<NodeId, Classification> {
        let mut graph = load_document(&doc).unwrap();
        resolve_references(&mut graph).unwrap();
        let mut classifications = Classifier::new(&graph).classify_all().unwrap();
        analyze_unions(&mut classifications);
        classifications
    }

    fn event(action: &str) -> serde_json::Value {
        json!({
            "type": "object",
            "required": ["action", "id"],
            "properties": {
                "action": { "const": action },
                "id": { "type": "number" }
            }
        })
    }

    fn discriminant_of<'a>(
        classifications: &'a IndexMap<NodeId, Classification>,
        id: &str,
    ) -> &'a Option<String> {
        match &classifications[id].type_kind {
            TypeKind::Union { discriminant, .. } => discriminant,
            other => panic!("expected Union, got {:?}", other),
        }
    }

    #[test]
    fn test_detects_shared_literal_tag() {
        let classifications = classify(json!({
            "definitions": {
                "Created": event("created"),
                "Deleted": event("deleted"),
                "Event": {
                    "oneOf": [
                        { "$ref": "#/definitions/Created" },
                        { "$ref": "#/definitions/Deleted" }
                    ]
                }
            }
        }));

        assert_eq!(
            discriminant_of(&classifications, "#/definitions/Event"),
            &Some("action".to_string())
        );
    }

    #[test]
    fn test_first_property_order_breaks_ties() {
        // Both "kind" and "action" qualify; "kind" comes first in the first
        // member, so it wins.
        let member = |kind: &str, action: &str| {
            json!({
                "type": "object",
                "required": ["kind", "action"],
                "properties": {
                    "kind": { "const": kind },
                    "action": { "const": action }
                }
            })
        };
        let classifications = classify(json!({
            "definitions": {
                "A": member("a", "x"),
                "B": member("b", "y"),
                "Event": {
                    "oneOf": [
                        { "$ref": "#/definitions/A" },
                        { "$ref": "#/definitions/B" }
                    ]
                }
            }
        }));

        assert_eq!(
            discriminant_of(&classifications, "#/definitions/Event"),
            &Some("kind".to_string())
        );
    }

    #[test]
    fn test_shared_literal_value_disqualifies() {
        let classifications = classify(json!({
            "definitions": {
                "A": event("created"),
                "B": event("created"),
                "Event": {
                    "oneOf": [
                        { "$ref": "#/definitions/A" },
                        { "$ref": "#/definitions/B" }
                    ]
                }
            }
        }));

        assert_eq!(discriminant_of(&classifications, "#/definitions/Event"), &None);
    }

    #[test]
    fn test_optional_tag_disqualifies() {
        let member = |action: &str| {
            json!({
                "type": "object",
                "properties": { "action": { "const": action } }
            })
        };
        let classifications = classify(json!({
            "definitions": {
                "A": member("created"),
                "B": member("deleted"),
                "Event": {
                    "oneOf": [
                        { "$ref": "#/definitions/A" },
                        { "$ref": "#/definitions/B" }
                    ]
                }
            }
        }));

        assert_eq!(discriminant_of(&classifications, "#/definitions/Event"), &None);
    }

    #[test]
    fn test_union_member_disqualifies() {
        // A member that is itself a union is never part of a tagged union.
        let classifications = classify(json!({
            "definitions": {
                "A": event("created"),
                "Inner": {
                    "oneOf": [
                        { "$ref": "#/definitions/A" }
                    ]
                },
                "Event": {
                    "oneOf": [
                        { "$ref": "#/definitions/A" },
                        { "$ref": "#/definitions/Inner" }
                    ]
                }
            }
        }));

        assert_eq!(discriminant_of(&classifications, "#/definitions/Event"), &None);
    }
}
