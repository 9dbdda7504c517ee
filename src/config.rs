//! Configuration for the extraction pipeline.
//!
//! # Example
//!
//! ```
//! use crucible::PipelineConfig;
//!
//! // Defaults: protect the raw Elementor data mirror, never translate "ID"
//! let config = PipelineConfig::default();
//! assert_eq!(config.protected_prefixes, vec!["meta/_elementor_data/".to_string()]);
//! assert_eq!(config.id_field, "ID");
//!
//! // Partial JSON config, everything else defaulted
//! let config = PipelineConfig::from_json_str(r#"{"ignore_fields": ["_edit_lock"]}"#).unwrap();
//! assert_eq!(config.ignore_fields, vec!["_edit_lock".to_string()]);
//! assert_eq!(config.max_nesting_depth, 32);
//! ```

use crate::error::ConfigError;
use crate::filter::RuleSet;
use crate::flatten::FlattenLimits;
use serde::Deserialize;
use std::path::Path;

/// Configuration for one pipeline instance.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Field names never sent for translation (exact segment match)
    #[serde(default)]
    pub ignore_fields: Vec<String>,

    /// Regex patterns matched against the full encoded path
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Encoded path prefixes pruned from every reconstituted tree
    #[serde(default = "default_protected_prefixes")]
    pub protected_prefixes: Vec<String>,

    /// Identifier field excluded from the original side on download
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Serialized sub-documents that may be unwrapped inside one another
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    /// Structural depth limit for a single tree
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: usize,

    /// Re-encode unwrapped sub-documents as strings after reconstitution
    #[serde(default)]
    pub reserialize_embedded: bool,

    /// Also drop `id_field` entries from the translated side on download
    #[serde(default)]
    pub filter_translated_ids: bool,
}

fn default_protected_prefixes() -> Vec<String> {
    vec!["meta/_elementor_data/".to_string()]
}

fn default_id_field() -> String {
    "ID".to_string()
}

fn default_max_nesting_depth() -> usize {
    32
}

fn default_max_tree_depth() -> usize {
    512
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            ignore_fields: Vec::new(),
            ignore_patterns: Vec::new(),
            protected_prefixes: default_protected_prefixes(),
            id_field: default_id_field(),
            max_nesting_depth: default_max_nesting_depth(),
            max_tree_depth: default_max_tree_depth(),
            reserialize_embedded: false,
            filter_translated_ids: false,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let display = path.as_ref().display().to_string();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })
    }

    /// Compile the ignore list and ignore patterns
    pub fn ignore_rules(&self) -> Result<RuleSet, ConfigError> {
        RuleSet::compile(self.ignore_fields.as_slice(), self.ignore_patterns.as_slice())
    }

    pub fn limits(&self) -> FlattenLimits {
        FlattenLimits {
            max_nesting_depth: self.max_nesting_depth,
            max_tree_depth: self.max_tree_depth,
        }
    }
}
