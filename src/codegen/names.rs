//! Name Resolution
//!
//! Assigns a unique output identifier to every declaration. Titles win;
//! untitled nodes take their last meaningful path segment. Collisions are
//! disambiguated by prefixing enclosing path segments, which keeps names
//! stable under unrelated edits elsewhere in the input.

use indexmap::IndexMap;
use tracing::debug;

use crate::config::{CompileConfig, NamingConfig};
use crate::error::{CompileError, Result};
use crate::graph::{Classification, NodeId};

/// Structural path segments that never contribute to a name.
const STRUCTURAL_SEGMENTS: &[&str] = &[
    "properties",
    "definitions",
    "$defs",
    "items",
    "oneOf",
    "anyOf",
    "type",
];

/// Final declaration names, keyed by canonical node id
#[derive(Debug, Default)]
pub struct NameTable {
    names: IndexMap<NodeId, String>,
}

impl NameTable {
    /// Resolve names for every canonical declaration, in declaration order.
    pub fn build(
        classifications: &IndexMap<NodeId, Classification>,
        canonical: &IndexMap<NodeId, NodeId>,
        config: &CompileConfig,
    ) -> Result<NameTable> {
        let mut table = NameTable::default();

        // First pass: preferred names. Collisions are collected, not fatal.
        let mut by_name: IndexMap<String, Vec<NodeId>> = IndexMap::new();
        for (id, class) in classifications {
            if canonical.get(id) != Some(id) {
                continue;
            }
            let preferred = preferred_name(class, config);
            by_name.entry(preferred).or_default().push(id.clone());
        }

        // Second pass: disambiguate clashes with the nearest enclosing
        // meaningful segment. If two ids still collide after that, the input
        // is genuinely ambiguous and we refuse to guess.
        for (name, ids) in by_name {
            if let [id] = &ids[..] {
                table.names.insert(id.clone(), name);
                continue;
            }
            let mut qualified: IndexMap<String, NodeId> = IndexMap::new();
            for id in ids {
                let parent = parent_segment(&id)
                    .map(|s| pascal_case(s, &config.naming))
                    .unwrap_or_default();
                let full = format!("{}{}", parent, name);
                if let Some(first) = qualified.get(&full) {
                    return Err(CompileError::NameCollision {
                        name: full,
                        first: first.clone(),
                        second: id,
                    });
                }
                qualified.insert(full, id);
            }
            for (full, id) in qualified {
                table.names.insert(id, full);
            }
        }

        debug!(names = table.names.len(), "name resolution complete");
        Ok(table)
    }

    pub fn name_of(&self, id: &str) -> Result<&str> {
        self.names
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| CompileError::UnclassifiableNode {
                id: id.to_string(),
                reason: "no name assigned".to_string(),
            })
    }
}

fn preferred_name(class: &Classification, config: &CompileConfig) -> String {
    if let Some(title) = &class.title {
        return pascal_case(title, &config.naming);
    }
    if let Some(segment) = last_meaningful_segment(&class.node_id) {
        return pascal_case(segment, &config.naming);
    }
    // A bare document root (`file.json#` or `#`): fall back to the file stem,
    // then to the configured root name.
    let stem = class
        .node_id
        .split('#')
        .next()
        .and_then(|f| f.rsplit('/').next())
        .and_then(|f| f.split('.').next())
        .filter(|s| !s.is_empty());
    match stem {
        Some(stem) => pascal_case(stem, &config.naming),
        None => config.root_name.clone(),
    }
}

/// Last path segment that carries meaning (skips structural keywords and
/// numeric indices).
fn last_meaningful_segment(id: &str) -> Option<&str> {
    let pointer = id.split_once('#').map(|(_, p)| p).unwrap_or(id);
    pointer
        .split('/')
        .rev()
        .find(|s| !s.is_empty() && !is_structural(s))
}

/// Segment enclosing the last meaningful one, for disambiguation.
fn parent_segment(id: &str) -> Option<&str> {
    let pointer = id.split_once('#').map(|(_, p)| p).unwrap_or(id);
    let mut meaningful = pointer
        .split('/')
        .filter(|s| !s.is_empty() && !is_structural(s));
    let mut prev = None;
    let mut last = meaningful.next()?;
    for segment in meaningful {
        prev = Some(last);
        last = segment;
    }
    prev
}

fn is_structural(segment: &str) -> bool {
    STRUCTURAL_SEGMENTS.contains(&segment) || segment.chars().all(|c| c.is_ascii_digit())
}

/// Convert a source name to PascalCase, honoring configured acronyms.
///
/// Input with no separators keeps its internal casing (only the first letter
/// is raised), so `IssueCommentEvent` survives untouched.
pub fn pascal_case(input: &str, config: &NamingConfig) -> String {
    let has_separator = input.contains(['_', '-', ' ', '.']);
    if !has_separator {
        if config.preserve_screaming_case
            && input.len() > 1
            && input.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return input.to_string();
        }
        let mut chars = input.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }

    input
        .split(['_', '-', ' ', '.'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let upper = word.to_uppercase();
            if config.acronyms.iter().any(|a| *a == upper) {
                return upper;
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.as_str().to_lowercase().chars())
                    .collect(),
                None => String::new(),
            }
        })
        .collect()
}
