//! # typedecl
//!
//! Compiles schema documents into TypeScript-style type declarations.
//!
//! Input documents are JSON schemas (a pragmatic subset: `properties`,
//! `required`, `$ref`, `enum`, `const`, `oneOf`/`anyOf`, `type`, `items`,
//! `definitions`/`$defs`). Output is a `.d.ts` module with one named
//! declaration per schema type, in first-discovered order.
//!
//! The pipeline:
//!
//! ```text
//! load -> resolve refs -> cycle analysis -> classify -> union analysis
//!      -> deduplicate -> resolve names -> emit
//! ```
//!
//! Compilation is deterministic: the same input always renders the same
//! bytes. Recursive schemas are supported as long as every cycle passes
//! through a named declaration.
//!
//! ```no_run
//! use typedecl::{compile, load_from_file, CompileConfig};
//!
//! # fn main() -> typedecl::Result<()> {
//! let graph = load_from_file("webhook.json".as_ref())?;
//! let output = compile(graph, &CompileConfig::default())?;
//! print!("{}", output.render());
//! # Ok(())
//! # }
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod graph;

pub use codegen::{compile, CompileOutput, DeclKind, Declaration, Field, TsType};
pub use config::{CompileConfig, NamingConfig};
pub use error::{CompileError, Result};
pub use graph::{load_document, load_from_directory, load_from_file, SchemaGraph, SchemaNode};
