use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trove_random::config::{find_config_file, load_config, Config};
use trove_random::models::{FacetConstraints, Zone};
use trove_random::sampler::{
    EmptyReason, IdPrefixOptions, NewspaperOptions, QueryComposer, RandomRecordOptions,
    SampleOutcome, SampledRecord, Sampler, SamplerLimits, Stopwords,
};
use trove_random::utils::{record_rows, truncate_with_ellipsis};
use trove_random::TroveClient;

/// Trove Random - pull random records out of the Trove search API
#[derive(Parser, Debug)]
#[command(name = "trove-random")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pull random records out of the Trove search API", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed the random number generator for a reproducible session
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Random record from the book, article, picture, map, music or collection zones
    #[command(alias = "r")]
    Random {
        /// Zone to consider (repeatable; default: all of them)
        #[arg(long = "zone", short = 'z')]
        zones: Vec<Zone>,

        /// Base query (default: a random common word)
        #[arg(long, short = 'Q')]
        query: Option<String>,

        /// Append a random common word to the query
        #[arg(long)]
        random_word: bool,

        /// Append a random two-digit number to the query
        #[arg(long)]
        random_number: bool,

        /// Facet constraint applied up front, as name=value (repeatable)
        #[arg(long = "facet", short = 'f', value_parser = parse_facet)]
        facets: Vec<(String, String)>,
    },

    /// Random newspaper article
    #[command(alias = "n")]
    Newspaper {
        /// Base query (default: a random common word)
        #[arg(long, short = 'Q')]
        query: Option<String>,

        /// Append a random common word to the query
        #[arg(long)]
        random_word: bool,

        /// Append a random two-digit number to the query
        #[arg(long)]
        random_number: bool,

        /// Facet constraint applied up front, as name=value (repeatable)
        #[arg(long = "facet", short = 'f', value_parser = parse_facet)]
        facets: Vec<(String, String)>,
    },

    /// Random record found by probing numeric id prefixes
    #[command(alias = "id")]
    IdPrefix {
        /// Zone to search
        #[arg(long, short = 'z', default_value_t = Zone::Newspaper)]
        zone: Zone,

        /// Facet constraint held fixed, as name=value (repeatable)
        #[arg(long = "facet", short = 'f', value_parser = parse_facet)]
        facets: Vec<(String, String)>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn parse_facet(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() && !value.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected name=value, got {:?}", raw)),
    }
}

fn to_constraints(facets: Vec<(String, String)>) -> FacetConstraints {
    facets.into_iter().collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from file if specified or found in default locations,
    // with environment overrides applied either way
    let config_path = cli.config.clone().or_else(find_config_file);
    let config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("loading config from {}", path.display()),
        None => "loading config from the environment".to_string(),
    })?;

    // Initialize tracing based on verbosity, falling back to the configured level
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => config.logging.level.as_str(),
        (false, 1) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("trove_random={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let outcome = match cli.command {
        Commands::Config => {
            print!("{}", config.to_toml()?);
            return Ok(());
        }
        Commands::Random {
            zones,
            query,
            random_word,
            random_number,
            facets,
        } => {
            let options = RandomRecordOptions {
                zones,
                query,
                random_word,
                random_number,
                facets: to_constraints(facets),
            };
            build_sampler(&config, cli.seed)?
                .random_record(&options)
                .await?
        }
        Commands::Newspaper {
            query,
            random_word,
            random_number,
            facets,
        } => {
            let options = NewspaperOptions {
                query,
                random_word,
                random_number,
                facets: to_constraints(facets),
            };
            build_sampler(&config, cli.seed)?
                .random_newspaper_article(&options)
                .await?
        }
        Commands::IdPrefix { zone, facets } => {
            let options = IdPrefixOptions {
                zone,
                facets: to_constraints(facets),
            };
            build_sampler(&config, cli.seed)?
                .random_by_id_prefix(&options)
                .await?
        }
    };

    output_outcome(&outcome, cli.output, cli.quiet)
}

fn build_sampler(config: &Config, seed: Option<u64>) -> Result<Sampler<TroveClient>> {
    if config.api.key.is_none() {
        tracing::warn!("No API key configured; set TROVE_API_KEY or api.key");
    }

    let stopwords = match &config.sampler.stopwords_path {
        Some(path) => Stopwords::load(path)?,
        None => Stopwords::builtin(),
    };
    let client = TroveClient::from_config(config)?;
    let mut sampler = Sampler::new(client)
        .with_limits(SamplerLimits::from(&config.sampler))
        .with_composer(QueryComposer::new(stopwords));
    if let Some(seed) = seed {
        sampler = sampler.with_seed(seed);
    }
    Ok(sampler)
}

fn describe_empty(reason: &EmptyReason) -> String {
    match reason {
        EmptyReason::NoMatches => "No result: the narrowed query matched nothing".to_string(),
        EmptyReason::ProbeExhausted { attempts } => {
            format!("No result: {} randomized queries matched nothing", attempts)
        }
        EmptyReason::PrefixExhausted { iterations } => {
            format!("No result: gave up after {} id prefixes", iterations)
        }
    }
}

fn output_outcome(outcome: &SampleOutcome, format: OutputFormat, quiet: bool) -> Result<()> {
    let actual_format = if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    };

    match (actual_format, outcome) {
        (OutputFormat::Json, _) => {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        }
        (_, SampleOutcome::Empty(reason)) => {
            if !quiet {
                println!("{}", describe_empty(reason));
            }
        }
        (OutputFormat::Plain, SampleOutcome::Found(found)) => {
            for (label, value) in record_rows(&found.record) {
                println!("{}: {}", label, value);
            }
            println!("Zone: {}", found.zone);
            println!("Query: {}", found.query);
            println!("Matches: {} ({} requests)", found.total, found.requests);
        }
        (_, SampleOutcome::Found(found)) => print_table(found),
    }
    Ok(())
}

fn print_table(found: &SampledRecord) {
    use comfy_table::{Attribute, Cell, Table};

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    for (label, value) in record_rows(&found.record) {
        table.add_row(vec![
            Cell::new(label).add_attribute(Attribute::Bold),
            Cell::new(truncate_with_ellipsis(&value, 80)),
        ]);
    }
    table.add_row(vec![Cell::new("Zone"), Cell::new(found.zone.to_string())]);
    table.add_row(vec![Cell::new("Query"), Cell::new(&found.query)]);
    if !found.facets.is_empty() {
        let facets = found
            .facets
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![Cell::new("Facets"), Cell::new(facets)]);
    }
    table.add_row(vec![
        Cell::new("Matches"),
        Cell::new(format!("{} ({} requests)", found.total, found.requests)),
    ]);
    println!("{table}");
}
