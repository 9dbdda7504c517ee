//! Upload and download orchestration
//!
//! Upload turns one content tree into translation-ready entries. Download
//! merges translated entries over the original ones and rebuilds a tree. Both
//! directions take an explicit [`SubmissionContext`]; nothing about the current
//! submission is kept in shared state, so one pipeline can serve concurrent
//! submissions.

pub mod connector;
pub mod extraction;
pub mod hooks;

pub use connector::{StaticConnector, TranslationConnector};
pub use extraction::ExtractionPipeline;
pub use hooks::{FieldProcessHooks, ON_CONTENT_FIELD_PROCESS};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction a connection-profile filter runs for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterStrategy {
    Upload,
    Download,
}

impl fmt::Display for FilterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterStrategy::Upload => f.write_str("upload"),
            FilterStrategy::Download => f.write_str("download"),
        }
    }
}

/// The submission a pipeline call works on, passed to every hook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionContext {
    pub id: String,
    #[serde(default)]
    pub source_site: Option<u64>,
    #[serde(default)]
    pub target_locale: Option<String>,
}

impl SubmissionContext {
    pub fn new(id: impl Into<String>) -> Self {
        SubmissionContext {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_source_site(mut self, site: u64) -> Self {
        self.source_site = Some(site);
        self
    }

    pub fn with_target_locale(mut self, locale: impl Into<String>) -> Self {
        self.target_locale = Some(locale.into());
        self
    }
}
