//! Command-line entry point.
//!
//! # Responsibility
//! - Load config, open rule and taxonomy storage.
//! - List rule groups or resolve one listing, printing JSON to stdout.
//!
//! No classification backend is wired here; inconclusive listings fail
//! with the unconfigured-classifier error.

use catmap_core::{
    init_logging_from_config, load_config, load_taxonomy_from_path, CoreConfig,
    JsonRuleRepository, LogFacadeLogger, MatcherEngine, ResolutionRequest, RuleStore,
    UnconfiguredClassifier,
};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "catmap")]
#[command(about = "Map marketplace listings onto a destination category taxonomy", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List rule groups that have documents on disk
    Groups(ConfigArgs),
    /// Resolve one listing and print the result as JSON
    Resolve(ResolveArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// Path to the JSON config file
    #[arg(long, short = 'c')]
    config: PathBuf,
}

#[derive(Args)]
struct ResolveArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Rule group to bind the matcher to
    #[arg(long, short = 'g')]
    group: String,

    /// Source marketplace domain, e.g. `costco`
    #[arg(long)]
    source: String,

    /// Source category path, segments joined by `>`
    #[arg(long, default_value = "")]
    path: String,

    /// Product name as listed
    #[arg(long, short = 'n')]
    name: String,

    #[arg(long)]
    brand: Option<String>,

    /// Free-form text forwarded to the external classifier
    #[arg(long)]
    extra: Option<String>,

    /// Also forward per-stage lines to the log file
    #[arg(long)]
    trace_stages: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Groups(args) => run_groups(&args),
        Commands::Resolve(args) => run_resolve(&args),
    }
}

fn prepare(args: &ConfigArgs) -> Result<(CoreConfig, RuleStore<JsonRuleRepository>), Box<dyn Error>> {
    let config = load_config(&args.config)?;
    init_logging_from_config(&config)?;
    let taxonomy = load_taxonomy_from_path(&config.taxonomy_db);
    info!(
        "event=cli_start module=cli status=ok rules_dir={} taxonomy_rows={}",
        config.rules_dir.display(),
        taxonomy.len()
    );
    let store = RuleStore::new(JsonRuleRepository::new(&config.rules_dir), taxonomy);
    Ok((config, store))
}

fn run_groups(args: &ConfigArgs) -> Result<(), Box<dyn Error>> {
    let (_, store) = prepare(args)?;
    let groups: Vec<String> = store.list_available_groups().into_iter().collect();
    println!("{}", serde_json::to_string_pretty(&groups)?);
    Ok(())
}

fn run_resolve(args: &ResolveArgs) -> Result<(), Box<dyn Error>> {
    let (config, store) = prepare(&args.config)?;
    let mut builder = MatcherEngine::for_group(&store, &args.group, Arc::new(UnconfiguredClassifier))
        .config(config.matcher);
    if args.trace_stages {
        builder = builder.logger(Arc::new(LogFacadeLogger));
    }
    let engine = builder.build();

    let mut request = ResolutionRequest::new(&args.source, &args.path, &args.name);
    if let Some(brand) = &args.brand {
        request = request.with_brand(brand);
    }
    if let Some(extra) = &args.extra {
        request = request.with_extra_text(extra);
    }

    let result = engine.resolve(&request)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
