//! Blocket client command-line entry point
//!
//! Searches Blocket or looks up a single ad and prints the results as JSON.

use anyhow::Context;
use blocket_client::config::{load_config, LogLevel};
use blocket_client::{BlocketClient, ClientConfig, ListingType, QueryConfig, Status};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Blocket client: search classified ads from the command line
#[derive(Parser, Debug)]
#[command(name = "blocket")]
#[command(version)]
#[command(about = "Search Blocket classified ads", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all log output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find all ads matching a query
    Find {
        /// Search query
        query: String,

        /// Maximum number of results per page
        #[arg(long)]
        limit: Option<u32>,

        /// Listing type
        #[arg(long, value_enum)]
        listing_type: Option<ListingTypeArg>,

        /// Ad status
        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        /// Maximum distance in kilometers from the search location
        #[arg(long)]
        geolocation: Option<u32>,

        /// Additional fields to include in the response
        #[arg(long)]
        include: Option<String>,
    },

    /// Look up a single ad by id
    FindById {
        /// Ad identifier
        id: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ListingTypeArg {
    #[value(name = "s")]
    Selling,
    #[value(name = "b")]
    Buying,
    #[value(name = "a")]
    All,
}

impl From<ListingTypeArg> for ListingType {
    fn from(arg: ListingTypeArg) -> Self {
        match arg {
            ListingTypeArg::Selling => ListingType::Selling,
            ListingTypeArg::Buying => ListingType::Buying,
            ListingTypeArg::All => ListingType::All,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusArg {
    Active,
    Inactive,
    All,
}

impl From<StatusArg> for Status {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Active => Status::Active,
            StatusArg::Inactive => Status::Inactive,
            StatusArg::All => Status::All,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ClientConfig::default(),
    };

    setup_logging(config.log_level, cli.verbose, cli.quiet);

    let client = BlocketClient::new(config).context("Failed to build client")?;

    match cli.command {
        Command::Find {
            query,
            limit,
            listing_type,
            status,
            geolocation,
            include,
        } => {
            let query = QueryConfig {
                query,
                limit,
                listing_type: listing_type.map(Into::into),
                status: status.map(Into::into),
                geolocation,
                include,
                ..QueryConfig::default()
            };

            let ads = client.find(&query).await.context("Search failed")?;
            tracing::info!("Found {} ads", ads.len());
            println!("{}", serde_json::to_string_pretty(&ads)?);
        }
        Command::FindById { id } => match client.find_by_id(&id).await.context("Lookup failed")? {
            Some(ad) => println!("{}", serde_json::to_string_pretty(&ad)?),
            None => {
                eprintln!("No ad found with id {}", id);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber
///
/// The configured level applies unless overridden by `-v`/`-q`.
fn setup_logging(level: LogLevel, verbose: u8, quiet: bool) {
    let level = if quiet {
        LogLevel::None
    } else {
        match verbose {
            0 => level,
            1 => level.max(LogLevel::Info),
            _ => LogLevel::Debug,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level.as_filter()))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}
