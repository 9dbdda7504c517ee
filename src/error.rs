//! Error types for path decoding, flattening, configuration and the pipeline.

use thiserror::Error;

/// Boxed error returned by connector hooks and post-merge callbacks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// An encoded path could not be decoded back into segments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("malformed path '{key}': {reason}")]
    Malformed { key: String, reason: String },
}

impl PathError {
    pub(crate) fn malformed(key: &str, reason: impl Into<String>) -> Self {
        PathError::Malformed {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while flattening a tree or rebuilding one from entries
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlattenError {
    /// Serialized sub-documents (or plain nesting) went deeper than allowed
    #[error("nesting at '{path}' exceeds the limit of {limit}")]
    ExcessiveNesting { path: String, limit: usize },

    /// Entries disagree about what kind of node lives at a path
    #[error("ambiguous structure at '{path}': {reason}")]
    AmbiguousStructure { path: String, reason: String },
}

/// Invalid exclusion rules or an unreadable configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid ignore pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read config file '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}'")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Anything that aborts one submission's trip through the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Flatten(#[from] FlattenError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("hook '{hook}' failed")]
    Hook {
        hook: &'static str,
        #[source]
        source: HookError,
    },
}

impl PipelineError {
    pub(crate) fn hook(hook: &'static str) -> impl FnOnce(HookError) -> Self {
        move |source| PipelineError::Hook { hook, source }
    }
}
