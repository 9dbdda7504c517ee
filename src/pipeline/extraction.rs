use super::connector::TranslationConnector;
use super::hooks::FieldProcessHooks;
use super::{FilterStrategy, SubmissionContext};
use crate::config::PipelineConfig;
use crate::error::{HookError, PipelineError};
use crate::filter::{exclude, ExclusionRule, RuleSet};
use crate::flatten::{reserialize, TreeFlattener};
use crate::merge::{merge, prune};
use crate::types::{ContentTree, FlatEntrySet};
use serde_json::Value;
use tracing::{debug, info, instrument, trace};

/// Runs content through flattening, filtering and merging for one connector
///
/// The pipeline keeps no per-submission state: both entry points take `&self`
/// and return fresh values, or an error and nothing else.
#[derive(Debug)]
pub struct ExtractionPipeline<C> {
    connector: C,
    config: PipelineConfig,
    flattener: TreeFlattener,
    hooks: FieldProcessHooks,
}

impl<C: TranslationConnector> ExtractionPipeline<C> {
    pub fn new(connector: C, config: PipelineConfig) -> Self {
        let flattener = TreeFlattener::new(config.limits());
        ExtractionPipeline {
            connector,
            config,
            flattener,
            hooks: FieldProcessHooks::new(),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn flattener(&self) -> &TreeFlattener {
        &self.flattener
    }

    /// Register a callback for the post-merge hook point on download
    pub fn on_content_field_process<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&SubmissionContext, FlatEntrySet) -> Result<FlatEntrySet, HookError> + Send + Sync + 'static,
    {
        self.hooks.register(hook);
        self
    }

    /// Upload: turn raw stored content into translation-ready entries
    #[instrument(skip_all, fields(submission = %ctx.id))]
    pub fn extract_translatable(
        &self,
        ctx: &SubmissionContext,
        raw: Value,
    ) -> Result<FlatEntrySet, PipelineError> {
        let rules = self.connector.ignore_rules();

        let tree = self
            .connector
            .prepare_source(ctx, raw)
            .map_err(PipelineError::hook("prepare_source"))?;
        self.connector
            .prepare_field_processor_values(ctx)
            .map_err(PipelineError::hook("prepare_field_processor_values"))?;

        let entries = self.flattener.flatten(&tree)?.into_scalars();
        let leaves = entries.len();
        let entries = exclude(&entries, &rules);

        let fields = self
            .connector
            .before_send(ctx, entries)
            .map_err(PipelineError::hook("before_send"))?;
        let entries = self.flattener.flatten_fields(&fields)?.into_scalars();

        let entries = self
            .connector
            .connection_profile_filters(ctx, entries, FilterStrategy::Upload)
            .map_err(PipelineError::hook("connection_profile_filters"))?;

        info!(leaves, translatable = entries.len(), "extracted translatable fields");
        trace!(fields = ?entries.to_transport(), "translatable fields");
        Ok(entries)
    }

    /// Download: merge translated values over the original and rebuild the tree
    #[instrument(skip_all, fields(submission = %ctx.id, apply_filters = apply_filters))]
    pub fn reconstitute(
        &self,
        ctx: &SubmissionContext,
        raw_original: Value,
        raw_translated: Value,
        apply_filters: bool,
    ) -> Result<ContentTree, PipelineError> {
        debug!("applying translated values");
        self.connector
            .ensure_clean_metadata_on_download(ctx)
            .map_err(PipelineError::hook("ensure_clean_metadata_on_download"))?;

        let original = self
            .connector
            .prepare_source(ctx, raw_original)
            .map_err(PipelineError::hook("prepare_source"))?;
        let translated = self
            .connector
            .prepare_source(ctx, raw_translated)
            .map_err(PipelineError::hook("prepare_source"))?;

        let original = self.flattener.flatten_with_boundaries(&original)?;
        let translated = self.flattener.flatten(&translated)?;

        let (base, translated) = if apply_filters {
            let base = self.filter_original(ctx, original.entries)?;
            let translated = if self.config.filter_translated_ids {
                exclude(&translated, &self.id_rules())
            } else {
                translated
            };
            (base, translated)
        } else {
            (original.entries, translated)
        };

        let merged = merge(&base, &translated);
        let merged = self.hooks.apply(ctx, merged)?;
        let merged = prune(&merged, self.config.protected_prefixes.as_slice());

        let tree = self.flattener.structurize(&merged)?;
        info!(fields = merged.len(), "reconstituted translated content");

        if self.config.reserialize_embedded {
            Ok(reserialize(tree, &original.boundaries))
        } else {
            Ok(tree)
        }
    }

    fn id_rules(&self) -> RuleSet {
        RuleSet::new().with(ExclusionRule::name(&self.config.id_field))
    }

    /// Ignore list plus the identifier field, field processors, then profile filters
    fn filter_original(
        &self,
        ctx: &SubmissionContext,
        entries: FlatEntrySet,
    ) -> Result<FlatEntrySet, PipelineError> {
        self.connector
            .prepare_field_processor_values(ctx)
            .map_err(PipelineError::hook("prepare_field_processor_values"))?;

        let rules = self
            .connector
            .ignore_rules()
            .with(ExclusionRule::name(&self.config.id_field));
        let entries = exclude(&entries, &rules);

        let entries = self
            .connector
            .process_fields(ctx, entries)
            .map_err(PipelineError::hook("process_fields"))?;

        self.connector
            .connection_profile_filters(ctx, entries, FilterStrategy::Download)
            .map_err(PipelineError::hook("connection_profile_filters"))
    }
}
