//! crucible-apply: Merge translated fields back into the original content
//!
//! Usage:
//!   # Translated content shaped like the original
//!   crucible-apply --original post.json --translated post.fr.json
//!
//!   # Translated fields as produced by crucible-extract (path -> text)
//!   crucible-apply --original post.json --translated fields.fr.json --flat
//!
//!   # Keep original identifiers and re-encode embedded documents
//!   crucible-apply --original post.json --translated post.fr.json --no-filters --reserialize

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use crucible::transport::read_json;
use crucible::{
    ContentTree, ExtractionPipeline, FlatEntrySet, PipelineConfig, StaticConnector, SubmissionContext,
    TransportWriter,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;

#[derive(Parser, Debug)]
#[command(name = "crucible-apply")]
#[command(about = "Merge translated fields back into the original content", long_about = None)]
struct Args {
    /// Original content
    #[arg(long, value_name = "FILE")]
    original: String,

    /// Translated content
    #[arg(long, value_name = "FILE")]
    translated: String,

    /// The translated file is a flat map of encoded path to text
    #[arg(long)]
    flat: bool,

    /// JSON pipeline config file
    #[arg(long, short = 'c')]
    config: Option<String>,

    /// Skip the ignore list, identifier and profile filters on the original
    #[arg(long)]
    no_filters: bool,

    /// Re-encode embedded documents as JSON strings
    #[arg(long)]
    reserialize: bool,

    /// Protected path prefix to prune; replaces the configured list, may be repeated
    #[arg(long = "protected-prefix")]
    protected_prefixes: Vec<String>,

    /// Target locale passed to hooks
    #[arg(long)]
    locale: Option<String>,

    /// Source site whose translation profile is updated on download
    #[arg(long)]
    source_site: Option<u64>,

    /// Submission id recorded in logs
    #[arg(long, default_value = "cli")]
    submission: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };
    if args.reserialize {
        config.reserialize_embedded = true;
    }
    if !args.protected_prefixes.is_empty() {
        config.protected_prefixes = args.protected_prefixes.clone();
    }

    let connector = StaticConnector::from_config(&config)?;
    let pipeline = ExtractionPipeline::new(connector, config);

    let original = read_file(&args.original)?;
    let translated = read_file(&args.translated)?;
    let translated = if args.flat {
        unflatten_translated(&pipeline, &original, translated)?
    } else {
        translated
    };

    let mut ctx = SubmissionContext::new(args.submission);
    if let Some(locale) = args.locale {
        ctx = ctx.with_target_locale(locale);
    }
    if let Some(site) = args.source_site {
        ctx = ctx.with_source_site(site);
    }

    let tree = pipeline.reconstitute(&ctx, original, translated, !args.no_filters)?;

    let mut writer = TransportWriter::new(std::io::stdout().lock());
    writer.write_tree(&tree)?;
    writer.flush()?;

    Ok(())
}

fn read_file(path: &str) -> Result<Value> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
    read_json(BufReader::new(file)).with_context(|| format!("Failed to read {}", path))
}

/// Rebuild a tree from flat translated fields, typed after the original leaves
fn unflatten_translated(
    pipeline: &ExtractionPipeline<StaticConnector>,
    original: &Value,
    translated: Value,
) -> Result<Value> {
    let fields: IndexMap<String, String> =
        serde_json::from_value(translated).context("Translated fields must map paths to strings")?;
    let hints = pipeline
        .flattener()
        .flatten(&ContentTree::from(original.clone()))
        .context("Failed to flatten original content")?;
    let entries = FlatEntrySet::from_transport(&fields, Some(&hints))?;
    let tree = pipeline.flattener().structurize(&entries)?;
    Ok(tree.into())
}
