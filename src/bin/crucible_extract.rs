//! crucible-extract: Flatten content into translation-ready fields
//!
//! Usage:
//!   # Read a post from a file, print the fields to translate
//!   crucible-extract post.json
//!
//!   # Read from stdin with a config file, one JSON line per field
//!   cat post.json | crucible-extract --config crucible.json --lines
//!
//!   # Ad-hoc ignore rules
//!   crucible-extract post.json --ignore-fields ID,id,_edit_lock --ignore-pattern '^meta/_wp_'

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use crucible::transport::read_json;
use crucible::{ExtractionPipeline, PipelineConfig, StaticConnector, SubmissionContext, TransportWriter};
use std::fs::File;
use std::io::{BufReader, Read};

#[derive(Parser, Debug)]
#[command(name = "crucible-extract")]
#[command(about = "Flatten content into translation-ready fields", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// JSON pipeline config file
    #[arg(long, short = 'c')]
    config: Option<String>,

    /// Comma-separated field names to never send for translation
    #[arg(long)]
    ignore_fields: Option<String>,

    /// Regex matched against encoded paths; may be repeated
    #[arg(long = "ignore-pattern")]
    ignore_patterns: Vec<String>,

    /// Write one JSON line per field, keeping scalar types
    #[arg(long)]
    lines: bool,

    /// Submission id recorded in logs
    #[arg(long, default_value = "cli")]
    submission: String,

    /// Maximum depth of serialized documents nested in one another
    #[arg(long)]
    max_nesting_depth: Option<usize>,
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

    // Build config
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(fields_str) = args.ignore_fields {
        config.ignore_fields.extend(
            fields_str
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        );
    }
    config.ignore_patterns.extend(args.ignore_patterns);
    if let Some(depth) = args.max_nesting_depth {
        config.max_nesting_depth = depth;
    }

    let reader = match &args.input {
        Some(file_path) => Box::new(BufReader::new(
            File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?,
        )) as Box<dyn Read>,
        None => Box::new(std::io::stdin()) as Box<dyn Read>,
    };
    let raw = read_json(reader)?;

    let connector = StaticConnector::from_config(&config)?;
    let pipeline = ExtractionPipeline::new(connector, config);
    let entries = pipeline.extract_translatable(&SubmissionContext::new(args.submission), raw)?;

    let mut writer = TransportWriter::new(std::io::stdout().lock());
    if args.lines {
        writer.write_entry_lines(&entries)?;
    } else {
        writer.write_entries(&entries)?;
    }
    writer.flush()?;

    Ok(())
}
