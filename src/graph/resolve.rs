//! Reference Resolution
//!
//! Replaces every `Reference` node's symbolic target with a concrete node id.
//! Cycles are tolerated: a reference back to an in-progress ancestor becomes
//! a forward link that the emitter renders by name, never inline, so the
//! traversal always terminates.
//!
//! Mutates nodes in place and is idempotent; a second run re-derives the
//! same resolved ids.

use std::collections::HashSet;

use tracing::debug;

use super::{NodeId, SchemaGraph, SchemaNode};
use crate::error::{CompileError, Result};

/// Resolve all references in the graph, depth-first from the roots.
///
/// Fails with `UnresolvedReference` when a target identity does not exist
/// anywhere in the graph.
pub fn resolve_references(graph: &mut SchemaGraph) -> Result<()> {
    let mut resolver = Resolver {
        visiting: HashSet::new(),
        done: HashSet::new(),
    };

    let roots: Vec<NodeId> = graph.roots().cloned().collect();
    for root in roots {
        resolver.visit(graph, &root)?;
    }

    // Nodes unreachable from any root still get their references checked.
    let remaining: Vec<NodeId> = graph.all_ids().cloned().collect();
    for id in remaining {
        resolver.visit(graph, &id)?;
    }

    debug!(nodes = resolver.done.len(), "reference resolution complete");
    Ok(())
}

struct Resolver {
    /// Nodes on the active traversal stack.
    visiting: HashSet<NodeId>,
    done: HashSet<NodeId>,
}

impl Resolver {
    fn visit(&mut self, graph: &mut SchemaGraph, id: &NodeId) -> Result<()> {
        if self.done.contains(id) || !self.visiting.insert(id.clone()) {
            return Ok(());
        }

        // Child lists are cloned up front; the only mutation below is filling
        // a Reference's resolved id.
        let node = graph
            .get(id)
            .cloned()
            .ok_or_else(|| CompileError::UnclassifiableNode {
                id: id.clone(),
                reason: "dangling node id".to_string(),
            })?;

        match node {
            SchemaNode::Object { properties, .. } => {
                for property in &properties {
                    self.visit(graph, &property.target)?;
                }
            }
            SchemaNode::Array { items } => self.visit(graph, &items)?,
            SchemaNode::Union { members, .. } => {
                for member in &members {
                    self.visit(graph, member)?;
                }
            }
            SchemaNode::Nullable { target, .. } => self.visit(graph, &target)?,
            SchemaNode::Enum { .. } | SchemaNode::Primitive(_) => {}
            SchemaNode::Reference { target, .. } => {
                if !graph.contains(&target) {
                    return Err(CompileError::UnresolvedReference {
                        reference: target.clone(),
                        at: id.clone(),
                    });
                }
                if let Some(SchemaNode::Reference { resolved, .. }) = graph.get_mut(id) {
                    *resolved = Some(target.clone());
                }
                // An in-progress target stays a forward link; descending
                // would inline a cycle.
                if !self.visiting.contains(&target) {
                    self.visit(graph, &target)?;
                }
            }
        }

        self.visiting.remove(id);
        self.done.insert(id.clone());
        Ok(())
    }
}
