//! Error types for the compiler

use thiserror::Error;

use crate::graph::NodeId;

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;

/// Compilation errors
///
/// Structural errors abort the whole compilation: the compiler either
/// produces a complete, internally consistent declaration set or fails
/// entirely. No partial output is ever written.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("unresolved reference `{reference}` at {at}")]
    UnresolvedReference { reference: String, at: NodeId },

    #[error("unclassifiable node {id}: {reason}")]
    UnclassifiableNode { id: NodeId, reason: String },

    #[error("name collision on `{name}`: {first} and {second} both resolve to it")]
    NameCollision {
        name: String,
        first: NodeId,
        second: NodeId,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
