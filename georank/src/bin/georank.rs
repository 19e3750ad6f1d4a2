//! Command-line front end for the listing search service.
//!
//! Usage:
//!     georank --db listings.sqlite search local_jobs --query driver --lat 12.97 --lon 77.59
//!     georank --db listings.sqlite popular jobs --limit 10

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use georank::models::GeoPoint;
use georank::{Domain, EngineConfig, ListingSearchApi, ListingSearchService, SearchRequest};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "georank", version, about = "Geo-ranked listing search")]
struct Cli {
    /// SQLite database path
    #[arg(long, default_value = "listings.sqlite")]
    db: PathBuf,

    /// TOML config file; missing file means defaults
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one search and print the page as JSON
    Search {
        domain: Domain,

        #[arg(long, short)]
        query: Option<String>,

        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,

        /// Searching user; supplies the anchor when no coordinates are given
        #[arg(long)]
        user: Option<i64>,

        /// Cursor from a previous page
        #[arg(long, conflicts_with = "page")]
        cursor: Option<String>,

        /// Legacy 1-based page number
        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        page_size: Option<u32>,

        /// Filters as a JSON array, e.g. '[{"op":"at_least","field":"salary_min","value":20000}]'
        #[arg(long)]
        filters: Option<String>,
    },
    /// Print the most searched terms for a domain
    Popular {
        domain: Domain,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref()).context("failed to load config")?;
    let service = ListingSearchService::open(&cli.db, config)
        .with_context(|| format!("failed to open {}", cli.db.display()))?;

    match cli.command {
        Command::Search {
            domain,
            query,
            lat,
            lon,
            user,
            cursor,
            page,
            page_size,
            filters,
        } => {
            let anchor = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
                (None, None) => None,
                _ => bail!("--lat and --lon must be given together"),
            };
            let filters = match filters {
                Some(raw) => serde_json::from_str(&raw).context("--filters is not a valid filter list")?,
                None => Vec::new(),
            };

            let request = SearchRequest {
                user_id: user,
                query,
                anchor,
                cursor,
                page,
                page_size,
                filters,
            };
            let page = service.search(domain, request).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Command::Popular { domain, limit } => {
            let terms = service.popular_terms(domain, limit)?;
            println!("{}", serde_json::to_string_pretty(&terms)?);
        }
    }

    Ok(())
}
