//! Cycle Analysis
//!
//! Builds a petgraph view of the resolved arena and computes strongly
//! connected components. A cycle is only renderable when it passes through a
//! node that gets its own named declaration, since the name becomes a forward
//! reference that cuts the cycle. A cycle made entirely of inline nodes
//! (arrays, nullables, anonymous enums) would need infinite expansion and is
//! rejected before classification.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use super::{NodeId, SchemaGraph, SchemaNode};
use crate::error::{CompileError, Result};

/// Strongly connected component groups of the schema graph
///
/// Only non-trivial groups are kept: components of more than one node, or a
/// single node that references itself.
#[derive(Debug, Default)]
pub struct SccAnalysis {
    pub groups: Vec<Vec<NodeId>>,
}

impl SccAnalysis {
    pub fn is_cyclic(&self, id: &str) -> bool {
        self.groups.iter().any(|g| g.iter().any(|m| m == id))
    }
}

/// True when a node gets its own named declaration in the output.
///
/// Objects and unions always declare; enums declare when titled; any document
/// root declares (untyped roots become aliases).
pub fn is_declarable(graph: &SchemaGraph, id: &str, node: &SchemaNode) -> bool {
    if graph.is_root(id) {
        return true;
    }
    match node {
        SchemaNode::Object { .. } | SchemaNode::Union { .. } => true,
        SchemaNode::Enum { title, .. } => title.is_some(),
        _ => false,
    }
}

/// Compute SCC groups over the resolved edges.
pub fn compute_scc_analysis(graph: &SchemaGraph) -> SccAnalysis {
    let mut pg = DiGraph::<NodeId, ()>::with_capacity(graph.node_count(), graph.node_count() * 2);
    let mut indices: HashMap<&NodeId, NodeIndex> = HashMap::with_capacity(graph.node_count());

    for id in graph.all_ids() {
        indices.insert(id, pg.add_node(id.clone()));
    }
    for (id, _) in graph.iter() {
        for child in graph.children(id) {
            if let (Some(&from), Some(&to)) = (indices.get(id), indices.get(&child)) {
                pg.add_edge(from, to, ());
            }
        }
    }

    let mut groups = Vec::new();
    for scc in tarjan_scc(&pg) {
        let cyclic = scc.len() > 1 || scc.iter().any(|&n| pg.find_edge(n, n).is_some());
        if cyclic {
            groups.push(
                scc.into_iter()
                    .filter_map(|n| pg.node_weight(n).cloned())
                    .collect(),
            );
        }
    }

    debug!(groups = groups.len(), "scc analysis complete");
    SccAnalysis { groups }
}

/// Verify every cycle passes through at least one declarable node.
pub fn validate_expansion(graph: &SchemaGraph, analysis: &SccAnalysis) -> Result<()> {
    for group in &analysis.groups {
        let cut = group.iter().any(|id| {
            graph
                .get(id)
                .map(|node| is_declarable(graph, id, node))
                .unwrap_or(false)
        });
        if !cut {
            return Err(CompileError::UnclassifiableNode {
                id: group[0].clone(),
                reason: format!(
                    "cyclic schema cannot be expanded inline: {}",
                    group.join(" -> ")
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{resolve_references, Property};

    fn object(properties: Vec<Property>) -> SchemaNode {
        SchemaNode::Object {
            title: None,
            properties,
        }
    }

    fn mutual_pair() -> SchemaGraph {
        let mut graph = SchemaGraph::new();
        graph.insert(
            "#/a".into(),
            object(vec![Property {
                name: "b".into(),
                target: "#/a/ref_b".into(),
                required: true,
            }]),
        );
        graph.insert(
            "#/a/ref_b".into(),
            SchemaNode::Reference {
                target: "#/b".into(),
                resolved: None,
            },
        );
        graph.insert(
            "#/b".into(),
            object(vec![Property {
                name: "a".into(),
                target: "#/b/ref_a".into(),
                required: true,
            }]),
        );
        graph.insert(
            "#/b/ref_a".into(),
            SchemaNode::Reference {
                target: "#/a".into(),
                resolved: None,
            },
        );
        graph.add_root("#/a".into());
        graph.add_root("#/b".into());
        graph
    }

    #[test]
    fn test_mutual_recursion_forms_one_scc() {
        let mut graph = mutual_pair();
        resolve_references(&mut graph).unwrap();

        let analysis = compute_scc_analysis(&graph);
        assert_eq!(analysis.groups.len(), 1);
        assert!(analysis.is_cyclic("#/a"));
        assert!(analysis.is_cyclic("#/b"));
        // The reference nodes sit on the cycle too.
        assert_eq!(analysis.groups[0].len(), 4);

        // Objects cut the cycle, so expansion is fine.
        validate_expansion(&graph, &analysis).unwrap();
    }

    #[test]
    fn test_inline_only_cycle_is_rejected() {
        // A non-root array whose items point back at itself: nothing in the
        // cycle carries a name, so it cannot be rendered.
        let mut graph = SchemaGraph::new();
        graph.insert(
            "#/x/properties/p".into(),
            SchemaNode::Array {
                items: "#/x/properties/p".into(),
            },
        );
        graph.insert(
            "#/x".into(),
            object(vec![Property {
                name: "p".into(),
                target: "#/x/properties/p".into(),
                required: true,
            }]),
        );
        graph.add_root("#/x".into());

        let analysis = compute_scc_analysis(&graph);
        let err = validate_expansion(&graph, &analysis).unwrap_err();
        assert!(matches!(err, CompileError::UnclassifiableNode { .. }));
    }

    #[test]
    fn test_acyclic_graph_has_no_groups() {
        let mut graph = SchemaGraph::new();
        graph.insert(
            "#/a".into(),
            SchemaNode::Primitive(crate::graph::PrimitiveKind::String),
        );
        graph.add_root("#/a".into());

        let analysis = compute_scc_analysis(&graph);
        assert!(analysis.groups.is_empty());
    }
}
