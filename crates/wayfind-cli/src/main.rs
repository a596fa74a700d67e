mod places;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wayfind_places::PlaceService;

use crate::places::{BoundsArgs, LocationArgs};

#[derive(Debug, Parser)]
#[command(name = "wayfind-cli")]
#[command(about = "Query canonical and coverage places from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Places inside a map viewport
    Bounds {
        #[command(flatten)]
        bounds: BoundsArgs,
        #[command(flatten)]
        location: LocationArgs,
        /// Category name or alias (e.g. coffee, food)
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Places within a radius of a point
    Near {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long, default_value = "1000")]
        radius_m: f64,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Full text search
    Search {
        query: String,
        #[command(flatten)]
        location: LocationArgs,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Name-only autocomplete
    Suggest {
        query: String,
        #[command(flatten)]
        location: LocationArgs,
        #[arg(long, default_value = "8")]
        limit: usize,
    },
    /// One place by id (`fsq:<id>` for coverage records)
    Place { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = wayfind_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = wayfind_db::PoolConfig::from_app_config(&config);
    let pool = wayfind_db::connect_pool_lazy(&config.database_url, pool_config)?;
    let service = PlaceService::from_app_config(&config, pool)?;

    match cli.command {
        Commands::Bounds {
            bounds,
            location,
            category,
            limit,
        } => places::run_bounds(&service, &bounds, &location, category, limit).await,
        Commands::Near {
            lat,
            lng,
            radius_m,
            category,
            limit,
        } => places::run_near(&service, lat, lng, radius_m, category, limit).await,
        Commands::Search {
            query,
            location,
            limit,
        } => places::run_search(&service, &query, &location, limit).await,
        Commands::Suggest {
            query,
            location,
            limit,
        } => places::run_suggest(&service, &query, &location, limit).await,
        Commands::Place { id } => places::run_place(&service, &id).await,
    }
}
