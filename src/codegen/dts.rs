//! Declaration Rendering
//!
//! Serializes resolved declarations into TypeScript-style `.d.ts` text.
//! Everything upstream works over node ids; by this point all ids have been
//! replaced by final names, so rendering is pure string assembly with no
//! graph access.

use serde::Serialize;
use std::fmt::Write;

use crate::graph::{Literal, PrimitiveKind};

/// A single named declaration in the output module
#[derive(Debug, Clone, Serialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
}

#[derive(Debug, Clone, Serialize)]
pub enum DeclKind {
    Interface {
        fields: Vec<Field>,
    },
    Union {
        members: Vec<String>,
        /// Property name shared by all members. Structured metadata only;
        /// the rendered text is identical with or without it.
        discriminant: Option<String>,
    },
    Enum {
        values: Vec<Literal>,
    },
    Alias {
        ty: TsType,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: String,
    pub optional: bool,
    pub ty: TsType,
}

/// A rendered type expression
#[derive(Debug, Clone, Serialize)]
pub enum TsType {
    Named(String),
    Primitive(PrimitiveKind),
    Array(Box<TsType>),
    Nullable(Box<TsType>),
    LiteralUnion(Vec<Literal>),
}

/// True when `name` can appear unquoted as an object key.
fn is_bare_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn render_key(name: &str) -> String {
    if is_bare_ident(name) {
        name.to_string()
    } else {
        Literal::Str(name.to_string()).to_string()
    }
}

pub fn render_type(ty: &TsType) -> String {
    match ty {
        TsType::Named(name) => name.clone(),
        TsType::Primitive(kind) => kind.as_str().to_string(),
        TsType::Array(inner) => {
            let rendered = render_type(inner);
            // Union element types need grouping: `(A | B)[]`, not `A | B[]`.
            if rendered.contains(' ') {
                format!("({})[]", rendered)
            } else {
                format!("{}[]", rendered)
            }
        }
        TsType::Nullable(inner) => format!("{} | null", render_type(inner)),
        TsType::LiteralUnion(values) => values
            .iter()
            .map(Literal::to_string)
            .collect::<Vec<_>>()
            .join(" | "),
    }
}

pub fn render_declaration(decl: &Declaration) -> String {
    let mut out = String::new();
    match &decl.kind {
        DeclKind::Interface { fields } => {
            let _ = writeln!(out, "export interface {} {{", decl.name);
            for field in fields {
                let marker = if field.optional { "?" } else { "" };
                let _ = writeln!(
                    out,
                    "  {}{}: {};",
                    render_key(&field.name),
                    marker,
                    render_type(&field.ty)
                );
            }
            out.push('}');
        }
        DeclKind::Union { members, .. } => {
            let _ = writeln!(out, "export type {} =", decl.name);
            for (i, member) in members.iter().enumerate() {
                let terminator = if i + 1 == members.len() { ";" } else { "" };
                let _ = writeln!(out, "  | {}{}", member, terminator);
            }
            // writeln! leaves a trailing newline after the last member
            out.pop();
        }
        DeclKind::Enum { values } => {
            let rendered = values
                .iter()
                .map(Literal::to_string)
                .collect::<Vec<_>>()
                .join(" | ");
            let _ = write!(out, "export type {} = {};", decl.name, rendered);
        }
        DeclKind::Alias { ty } => {
            let _ = write!(out, "export type {} = {};", decl.name, render_type(ty));
        }
    }
    out
}

/// Join declarations into a module, one blank line between each.
pub fn render_module(declarations: &[Declaration]) -> String {
    let rendered: Vec<String> = declarations.iter().map(render_declaration).collect();
    let mut out = rendered.join("\n\n");
    out.push('\n');
    out
}
