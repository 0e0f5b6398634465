//! Schema Build CLI
//!
//! Builds a schema from a source catalog (file or directory) and prints it
//! as a tree, JSON or a Graphviz relationship graph. With `--compare`, a
//! second catalog is built with the same settings and the two renderings
//! are diffed. With `--expect-fingerprint`, the build fails unless the
//! schema's fingerprint matches.
//!
//! Build diagnostics are logged through `tracing` (warnings by default,
//! `RUST_LOG=schema_forge=debug` for everything).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use schema_forge::config::OutputFormat;
use schema_forge::schema::analysis::RelationshipGraph;
use schema_forge::schema::compare;
use schema_forge::{
    BuildConfig, Checksum, CollectingSink, Schema, SchemaBuilder, SourceCatalog, TracingSink,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-build")]
#[command(about = "Build an immutable schema from a source catalog")]
struct Cli {
    /// Catalog file (.json/.toml) or directory of catalog files
    #[arg(short, long)]
    model: PathBuf,

    /// Explicit config file, layered over the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format (defaults to the configured one)
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Write the output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Second catalog to diff against
    #[arg(long)]
    compare: Option<PathBuf>,

    /// Root object types; types they reference are discovered
    #[arg(short, long = "root")]
    roots: Vec<String>,

    /// Register every declared object type (the default without --root)
    #[arg(long)]
    all_objects: bool,

    /// Fail unless the built schema has this fingerprint (full hex)
    #[arg(long)]
    expect_fingerprint: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Tree,
    Json,
    Dot,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Tree => OutputFormat::Tree,
            Format::Json => OutputFormat::Json,
            Format::Dot => OutputFormat::Dot,
        }
    }
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = BuildConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let format = cli.format.map(OutputFormat::from).unwrap_or(config.output.format);

    let schema = build(&config, &cli.model, &cli)?;

    if let Some(expected) = &cli.expect_fingerprint {
        let expected = Checksum::from(expected.to_lowercase());
        if !schema.matches_fingerprint(&expected) {
            anyhow::bail!(
                "fingerprint mismatch: expected {}, built {}",
                expected.short(),
                schema.fingerprint().short()
            );
        }
        eprintln!("✅ Fingerprint matches ({})", expected.short());
    }

    if let Some(other) = &cli.compare {
        let other_schema = build(&config, other, &cli)?;
        match compare::diff(&schema, &other_schema) {
            None => println!("✅ Schemas are identical ({})", schema.fingerprint().short()),
            Some(diff) => {
                print!("{}", diff.unified);
                println!();
                println!("📊 +{} -{} lines", diff.added, diff.removed);
            }
        }
        return Ok(());
    }

    let rendered = match format {
        OutputFormat::Tree => schema.render_tree(),
        OutputFormat::Json => schema.to_json()?,
        OutputFormat::Dot => RelationshipGraph::from_schema(&schema)?.to_dot(),
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("✅ Wrote {} ({})", path.display(), schema.fingerprint().short());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

fn build(config: &BuildConfig, model: &Path, cli: &Cli) -> Result<Schema> {
    let catalog = SourceCatalog::load(model)
        .with_context(|| format!("loading catalog {}", model.display()))?;

    let sink = CollectingSink::new();
    let mut builder = SchemaBuilder::from_config(config)?
        .with_catalog(catalog)
        .with_diagnostics((TracingSink, sink.clone()));

    for root in &cli.roots {
        builder.object(root);
    }
    if cli.all_objects || cli.roots.is_empty() {
        builder.objects_from_catalog();
    }

    let schema = builder
        .build()
        .with_context(|| format!("building schema from {}", model.display()))?;

    eprintln!("📊 {}: {}", model.display(), sink.diagnostics().summary());

    Ok(schema)
}
