//! Compilation Pipeline
//!
//! Drives a loaded schema graph through resolution, cycle analysis,
//! classification, union analysis, structural deduplication, and name
//! resolution, then assembles the final declaration list. The pipeline is
//! pure: same graph and config in, byte-identical output out.

pub mod dts;
pub mod names;

pub use dts::{render_module, DeclKind, Declaration, Field, TsType};
pub use names::NameTable;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::CompileConfig;
use crate::error::Result;
use crate::graph::{
    analyze_unions, compute_scc_analysis, resolve_references, validate_expansion,
    Classification, Classifier, FieldType, Literal, NodeId, SchemaGraph, TypeKind,
};

/// Finished compilation: declarations in first-discovered order
#[derive(Debug)]
pub struct CompileOutput {
    pub declarations: Vec<Declaration>,
}

impl CompileOutput {
    /// Render the whole module as declaration text.
    pub fn render(&self) -> String {
        render_module(&self.declarations)
    }
}

/// Compile a schema graph into type declarations.
pub fn compile(mut graph: SchemaGraph, config: &CompileConfig) -> Result<CompileOutput> {
    resolve_references(&mut graph)?;

    let scc = compute_scc_analysis(&graph);
    validate_expansion(&graph, &scc)?;

    let mut classifications = Classifier::new(&graph).classify_all()?;
    analyze_unions(&mut classifications);

    let canonical = deduplicate(&classifications);
    let names = NameTable::build(&classifications, &canonical, config)?;

    let declarations = assemble(&classifications, &canonical, &names)?;
    info!(
        nodes = graph.node_count(),
        declarations = declarations.len(),
        "compilation complete"
    );
    Ok(CompileOutput { declarations })
}

/// Map every declaration id to its canonical representative.
///
/// Objects and enums with identical structure collapse onto the first
/// discovered one; unions and aliases always stand for themselves. The
/// fingerprint of a node prints referenced ids through the current canonical
/// map, so merging two leaves can make their parents identical on the next
/// round. Iterates to a fixpoint, which exists because representatives only
/// ever move earlier in declaration order.
fn deduplicate(classifications: &IndexMap<NodeId, Classification>) -> IndexMap<NodeId, NodeId> {
    let mut canonical: IndexMap<NodeId, NodeId> = classifications
        .keys()
        .map(|id| (id.clone(), id.clone()))
        .collect();

    loop {
        let mut by_print: IndexMap<String, NodeId> = IndexMap::new();
        let mut changed = false;

        for (id, class) in classifications {
            let Some(print) = fingerprint(class, &canonical) else {
                continue;
            };
            match by_print.get(&print) {
                Some(rep) => {
                    if canonical[id] != *rep {
                        let rep = rep.clone();
                        canonical.insert(id.clone(), rep);
                        changed = true;
                    }
                }
                None => {
                    by_print.insert(print, id.clone());
                    if canonical[id] != *id {
                        canonical.insert(id.clone(), id.clone());
                        changed = true;
                    }
                }
            }
        }

        if !changed {
            break;
        }
    }

    let merged = canonical.iter().filter(|(id, rep)| id != rep).count();
    debug!(merged, "deduplication complete");
    canonical
}

/// Structural fingerprint of a dedup-eligible declaration.
///
/// Titles are ignored; two nodes with the same shape are the same type.
/// Unions and aliases return None and never merge.
fn fingerprint(
    class: &Classification,
    canonical: &IndexMap<NodeId, NodeId>,
) -> Option<String> {
    match &class.type_kind {
        TypeKind::Object { fields } => {
            let body: Vec<String> = fields
                .iter()
                .map(|f| {
                    format!(
                        "{}:{}:{}",
                        f.name,
                        f.required,
                        type_print(&f.ty, canonical)
                    )
                })
                .collect();
            Some(format!("obj{{{}}}", body.join(";")))
        }
        TypeKind::Enum { values } => {
            let body: Vec<String> = values.iter().map(Literal::to_string).collect();
            Some(format!("enum{{{}}}", body.join("|")))
        }
        TypeKind::Union { .. } | TypeKind::Alias { .. } => None,
    }
}

fn type_print(ty: &FieldType, canonical: &IndexMap<NodeId, NodeId>) -> String {
    match ty {
        FieldType::Ref(id) => {
            let rep = canonical.get(id).unwrap_or(id);
            format!("ref({})", rep)
        }
        FieldType::Primitive(kind) => kind.as_str().to_string(),
        FieldType::Array(inner) => format!("arr({})", type_print(inner, canonical)),
        FieldType::Nullable(inner) => format!("opt({})", type_print(inner, canonical)),
        FieldType::LiteralUnion(values) => {
            let body: Vec<String> = values.iter().map(Literal::to_string).collect();
            format!("lit({})", body.join("|"))
        }
    }
}

/// Convert classifications into named declarations, dropping merged twins.
fn assemble(
    classifications: &IndexMap<NodeId, Classification>,
    canonical: &IndexMap<NodeId, NodeId>,
    names: &NameTable,
) -> Result<Vec<Declaration>> {
    let mut declarations = Vec::new();

    for (id, class) in classifications {
        if canonical.get(id) != Some(id) {
            continue;
        }
        let kind = match &class.type_kind {
            TypeKind::Object { fields } => DeclKind::Interface {
                fields: fields
                    .iter()
                    .map(|f| {
                        Ok(Field {
                            name: f.name.clone(),
                            optional: !f.required,
                            ty: ts_type(&f.ty, canonical, names)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            },
            TypeKind::Union {
                members,
                discriminant,
            } => DeclKind::Union {
                members: members
                    .iter()
                    .map(|m| {
                        let rep = canonical.get(m).unwrap_or(m);
                        names.name_of(rep).map(str::to_string)
                    })
                    .collect::<Result<Vec<_>>>()?,
                discriminant: discriminant.clone(),
            },
            TypeKind::Enum { values } => DeclKind::Enum {
                values: values.clone(),
            },
            TypeKind::Alias { ty } => DeclKind::Alias {
                ty: ts_type(ty, canonical, names)?,
            },
        };
        declarations.push(Declaration {
            name: names.name_of(id)?.to_string(),
            kind,
        });
    }

    Ok(declarations)
}

fn ts_type(
    ty: &FieldType,
    canonical: &IndexMap<NodeId, NodeId>,
    names: &NameTable,
) -> Result<TsType> {
    Ok(match ty {
        FieldType::Ref(id) => {
            let rep = canonical.get(id).unwrap_or(id);
            TsType::Named(names.name_of(rep)?.to_string())
        }
        FieldType::Primitive(kind) => TsType::Primitive(*kind),
        FieldType::Array(inner) => TsType::Array(Box::new(ts_type(inner, canonical, names)?)),
        FieldType::Nullable(inner) => {
            TsType::Nullable(Box::new(ts_type(inner, canonical, names)?))
        }
        FieldType::LiteralUnion(values) => TsType::LiteralUnion(values.clone()),
    })
}
