use super::{FilterStrategy, SubmissionContext};
use crate::config::PipelineConfig;
use crate::error::{ConfigError, HookError};
use crate::filter::RuleSet;
use crate::types::{ContentTree, FieldMap, FlatEntrySet};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// The translation connector the pipeline runs inside of
///
/// The connector owns submission records, translation profiles and the field
/// processors. Every hook except [`ignore_rules`](Self::ignore_rules) defaults
/// to passing its input through unchanged. A hook's return value is taken as
/// is; errors abort the current submission.
pub trait TranslationConnector {
    /// Ignore-list rules, read once at the start of every run
    fn ignore_rules(&self) -> RuleSet;

    /// Normalize a raw stored value into a content tree
    fn prepare_source(&self, _ctx: &SubmissionContext, raw: Value) -> Result<ContentTree, HookError> {
        Ok(ContentTree::from(raw))
    }

    /// Load field-processor settings for this submission
    fn prepare_field_processor_values(&self, _ctx: &SubmissionContext) -> Result<(), HookError> {
        Ok(())
    }

    /// Field processors run before upload; a value may grow into a subtree
    fn before_send(&self, _ctx: &SubmissionContext, entries: FlatEntrySet) -> Result<FieldMap, HookError> {
        Ok(entries.into_field_map())
    }

    /// Field processors run on the original side of a download
    fn process_fields(
        &self,
        _ctx: &SubmissionContext,
        entries: FlatEntrySet,
    ) -> Result<FlatEntrySet, HookError> {
        Ok(entries)
    }

    /// Translation-profile filters for the given direction
    fn connection_profile_filters(
        &self,
        _ctx: &SubmissionContext,
        entries: FlatEntrySet,
        _strategy: FilterStrategy,
    ) -> Result<FlatEntrySet, HookError> {
        Ok(entries)
    }

    /// Make sure the profile cleans metadata on download; must be idempotent
    fn ensure_clean_metadata_on_download(&self, _ctx: &SubmissionContext) -> Result<(), HookError> {
        Ok(())
    }
}

/// A connector backed by static configuration, with pass-through hooks
///
/// Translation profiles are kept per source site; submissions without a
/// source site share one default profile.
#[derive(Debug, Default)]
pub struct StaticConnector {
    rules: RuleSet,
    clean_metadata_profiles: Mutex<HashSet<Option<u64>>>,
}

impl StaticConnector {
    pub fn new(rules: RuleSet) -> Self {
        StaticConnector {
            rules,
            clean_metadata_profiles: Mutex::new(HashSet::new()),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.ignore_rules()?))
    }

    /// Whether the profile of `source_site` cleans metadata on download
    pub fn clean_metadata_on_download(&self, source_site: Option<u64>) -> bool {
        self.clean_metadata_profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&source_site)
    }
}

impl TranslationConnector for StaticConnector {
    fn ignore_rules(&self) -> RuleSet {
        self.rules.clone()
    }

    fn ensure_clean_metadata_on_download(&self, ctx: &SubmissionContext) -> Result<(), HookError> {
        let mut profiles = self
            .clean_metadata_profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if profiles.insert(ctx.source_site) {
            info!(
                submission = %ctx.id,
                source_site = ?ctx.source_site,
                "enabled clean metadata on download for the translation profile"
            );
        }
        Ok(())
    }
}
