//! Compiler configuration
//!
//! Configuration is an explicit value passed into the compilation entry
//! point, never process-wide state, so independent compilations running in
//! parallel cannot interfere with each other.

use serde::{Deserialize, Serialize};

/// Top-level compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileConfig {
    /// Name assigned to an untitled document root.
    pub root_name: String,

    /// Naming conventions for generated declarations.
    pub naming: NamingConfig,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            root_name: "Schema".to_string(),
            naming: NamingConfig::default(),
        }
    }
}

/// Casing rules applied when deriving declaration names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Acronyms kept fully uppercase when PascalCasing segmented names
    /// (e.g. `tenant_id` -> `TenantID`).
    pub acronyms: Vec<String>,

    /// Preserve SCREAMING_CASE words instead of recasing them.
    pub preserve_screaming_case: bool,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            acronyms: ["ID", "URL", "API", "UUID"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preserve_screaming_case: false,
        }
    }
}
