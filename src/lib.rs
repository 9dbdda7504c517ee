//! # Crucible - Content Localization Toolkit
//!
//! Extracts translatable leaf values from nested page-builder content, hands
//! them to a translation connector as a flat mapping, and rebuilds the full
//! content tree once translated values come back.
//!
//! ## Modules
//!
//! - **path**: encode a tree position as a `/`-delimited key and back
//! - **flatten**: tree to path-addressed entries (unwrapping embedded JSON) and back
//! - **filter**: exclusion rules (exact field names, regex patterns)
//! - **merge**: overlay merge and protected-namespace pruning
//! - **pipeline**: upload and download orchestration around a connector
//!
//! ## Quick Start
//!
//! ### Upload
//!
//! ```rust
//! use crucible::{extract_translatable, PipelineConfig};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), crucible::PipelineError> {
//! let content = json!({
//!     "ID": 7,
//!     "post_title": "Hi",
//!     "meta": {"_elementor_data": "[{\"id\":\"a1\",\"settings\":{\"title\":\"Hello\"}}]"}
//! });
//!
//! let config = PipelineConfig {
//!     ignore_fields: vec!["ID".into(), "id".into()],
//!     ..Default::default()
//! };
//! let entries = extract_translatable(content, &config)?;
//!
//! let transport = entries.to_transport();
//! assert_eq!(transport["post_title"], "Hi");
//! assert_eq!(transport["meta/_elementor_data/0/settings/title"], "Hello");
//! # Ok(())
//! # }
//! ```
//!
//! ### Download
//!
//! ```rust
//! use crucible::{reconstitute, ContentTree, PipelineConfig};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), crucible::PipelineError> {
//! let original = json!({"ID": 7, "post_title": "Hi", "post_content": "Body"});
//! let translated = json!({"post_title": "Bonjour"});
//!
//! let tree = reconstitute(original, translated, &PipelineConfig::default())?;
//! assert_eq!(tree, ContentTree::from(json!({"post_title": "Bonjour", "post_content": "Body"})));
//! # Ok(())
//! # }
//! ```

use serde_json::Value;

pub mod config;
pub mod error;
pub mod filter;
pub mod flatten;
pub mod merge;
pub mod path;
pub mod pipeline;
pub mod transport;
pub mod types;

// Re-export commonly used types for convenience
pub use config::PipelineConfig;
pub use error::{ConfigError, FlattenError, HookError, PathError, PipelineError};
pub use filter::{exclude, ExclusionRule, RuleSet};
pub use flatten::{structurize, structurize_within, FlattenLimits, Flattened, TreeFlattener};
pub use merge::{merge, prune};
pub use path::{FlatPath, PathCodec, PathSegment};
pub use pipeline::{
    ExtractionPipeline, FilterStrategy, StaticConnector, SubmissionContext, TranslationConnector,
    ON_CONTENT_FIELD_PROCESS,
};
pub use transport::TransportWriter;
pub use types::{ContentTree, FieldMap, FlatEntrySet, FlatValue, Scalar, ScalarCodec};

/// Upload entry point with a configuration-backed connector
pub fn extract_translatable(raw: Value, config: &PipelineConfig) -> Result<FlatEntrySet, PipelineError> {
    let connector = StaticConnector::from_config(config)?;
    let pipeline = ExtractionPipeline::new(connector, config.clone());
    pipeline.extract_translatable(&SubmissionContext::default(), raw)
}

/// Download entry point with a configuration-backed connector, filters applied
pub fn reconstitute(
    raw_original: Value,
    raw_translated: Value,
    config: &PipelineConfig,
) -> Result<ContentTree, PipelineError> {
    let connector = StaticConnector::from_config(config)?;
    let pipeline = ExtractionPipeline::new(connector, config.clone());
    pipeline.reconstitute(&SubmissionContext::default(), raw_original, raw_translated, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upload_then_download() {
        let original = json!({
            "ID": 1,
            "post_title": "Hi",
            "meta": {"_elementor_data": "[{\"id\":\"a1\",\"settings\":{\"title\":\"Hello\"}}]"}
        });
        let config = PipelineConfig {
            ignore_fields: vec!["ID".to_string(), "id".to_string()],
            reserialize_embedded: true,
            protected_prefixes: vec![],
            ..Default::default()
        };

        let entries = extract_translatable(original.clone(), &config).unwrap();
        assert_eq!(entries.len(), 2);

        // Pretend the translator uppercased everything
        let mut translated = entries.to_transport();
        for value in translated.values_mut() {
            *value = value.to_uppercase();
        }
        let translated = FlatEntrySet::from_transport(&translated, Some(&entries)).unwrap();
        let translated = Value::from(structurize(&translated).unwrap());

        let tree = reconstitute(original, translated, &config).unwrap();
        assert_eq!(
            tree,
            ContentTree::from(json!({
                "post_title": "HI",
                "meta": {"_elementor_data": "[{\"settings\":{\"title\":\"HELLO\"}}]"}
            }))
        );
    }
}
