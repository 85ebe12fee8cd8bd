//! Validator configuration
//!
//! The set of known type names and the resource limits. Loadable from JSON;
//! every field is optional and falls back to its default.
//!
//! ```json
//! { "known_types": ["int", "String", "Point"], "max_nesting": 64 }
//! ```

use miette::Diagnostic;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Types recognized when no configuration says otherwise
pub const DEFAULT_TYPES: &[&str] = &[
    "int", "float", "char", "boolean", "String", "double", "void", "long", "short", "byte",
];

pub const DEFAULT_MAX_INPUT_BYTES: usize = 4 * 1024 * 1024;
pub const DEFAULT_MAX_NESTING: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Closed set of type names; anything else in type position is INVALID_TYPE
    pub known_types: FxHashSet<String>,
    /// Inputs larger than this are rejected outright
    pub max_input_bytes: usize,
    /// Maximum depth of blocks plus parenthesized expressions
    pub max_nesting: usize,
    /// Accept a missing `;` directly before `}` with a warning
    pub lenient_block_semicolons: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            known_types: DEFAULT_TYPES.iter().map(|t| t.to_string()).collect(),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_nesting: DEFAULT_MAX_NESTING,
            lenient_block_semicolons: true,
        }
    }
}

impl ValidatorConfig {
    /// Add a known type name
    pub fn with_type(mut self, name: impl Into<String>) -> Self {
        self.known_types.insert(name.into());
        self
    }

    pub fn with_max_input_bytes(mut self, limit: usize) -> Self {
        self.max_input_bytes = limit;
        self
    }

    pub fn with_max_nesting(mut self, limit: usize) -> Self {
        self.max_nesting = limit;
        self
    }

    pub fn with_lenient_block_semicolons(mut self, lenient: bool) -> Self {
        self.lenient_block_semicolons = lenient;
        self
    }

    pub fn is_known_type(&self, name: &str) -> bool {
        self.known_types.contains(name)
    }

    /// Parse a JSON configuration; `origin` names the source in errors
    pub fn from_json_str(json: &str, origin: impl AsRef<Path>) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: origin.as_ref().to_path_buf(),
            source,
        })
    }

    /// Read and parse a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json, path)
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot read config file {}", path.display())]
    #[diagnostic(code(javacheck::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}", path.display())]
    #[diagnostic(
        code(javacheck::config::parse),
        help(
            "expected a JSON object with known_types, max_input_bytes, max_nesting \
             or lenient_block_semicolons"
        )
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
