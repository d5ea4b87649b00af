//! Command line driver: plan one delivery date from a JSON dataset.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use route_planner::haversine::HaversineMatrix;
use route_planner::osrm::{OsrmClient, OsrmConfig};
use route_planner::store::{InMemoryPlanStore, InMemoryRecords, JsonFilePlanStore};
use route_planner::traits::{DistanceMatrixProvider, PlanStore};
use route_planner::{PlanError, PlanRequest, PlannerOptions, RouteAssignmentEngine};

#[derive(Debug, Parser)]
#[command(name = "route-planner", about = "Plan per-day delivery routes for a fleet of riders")]
struct Args {
    /// JSON file with `depot`, `riders` and `orders`.
    #[arg(long)]
    dataset: PathBuf,

    /// Delivery date, YYYY-MM-DD.
    #[arg(long)]
    date: NaiveDate,

    /// Rider name; repeat once per rider.
    #[arg(long = "rider", required = true)]
    riders: Vec<String>,

    /// Number of riders; defaults to the number of --rider flags.
    #[arg(long)]
    num_riders: Option<usize>,

    /// Use great-circle distances instead of OSRM.
    #[arg(long)]
    offline: bool,

    /// OSRM base URL; overrides OSRM_IP.
    #[arg(long)]
    osrm_url: Option<String>,

    /// Persist the plan cache in this JSON file.
    #[arg(long)]
    cache_file: Option<PathBuf>,

    #[arg(long, default_value_t = PlannerOptions::default().max_cluster_size)]
    max_cluster_size: usize,

    /// Solve clusters one at a time.
    #[arg(long)]
    sequential: bool,
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<String, PlanError> {
    let records = InMemoryRecords::from_path(&args.dataset)?;

    let provider: Box<dyn DistanceMatrixProvider + Sync> = if args.offline {
        Box::new(HaversineMatrix::default())
    } else {
        let mut config = OsrmConfig::from_env()?;
        if let Some(url) = args.osrm_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        Box::new(OsrmClient::new(config)?)
    };

    let store: Box<dyn PlanStore> = match args.cache_file {
        Some(path) => Box::new(JsonFilePlanStore::new(path)),
        None => Box::new(InMemoryPlanStore::default()),
    };

    let options = PlannerOptions {
        max_cluster_size: args.max_cluster_size,
        parallel: !args.sequential,
        ..PlannerOptions::default()
    };

    let num_riders = args.num_riders.unwrap_or(args.riders.len());
    let request = PlanRequest {
        num_riders,
        delivery_date: args.date,
        rider_names: args.riders,
    };

    let engine = RouteAssignmentEngine::new(records, provider, store, options);
    let result = engine.plan(&request)?;
    Ok(serde_json::to_string_pretty(&result)?)
}

fn main() -> ExitCode {
    enable_tracing();

    match run(Args::parse()) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "planning failed");
            eprintln!("error: {}", err);
            if err.is_client_error() {
                ExitCode::from(2)
            } else if err.is_retryable() {
                ExitCode::from(3)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
