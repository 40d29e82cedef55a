use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transit_router::domain::{StopIndex, Time};
use transit_router::router::{RouteRequest, Router, RouterConfig};
use transit_router::transit::{LoadError, TransitNetwork, load_network};

/// Plan a journey over a timetabled network.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Network file (JSON)
    network: PathBuf,

    /// Routing config file (JSON); missing fields take their defaults
    #[arg(short, long, env = "TRANSIT_ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// Origin stop id or name
    #[arg(long)]
    from: String,

    /// Destination stop id or name
    #[arg(long)]
    to: String,

    /// Departure time, or latest arrival with --arrive-by (HH:MM[:SS])
    #[arg(long, value_parser = Time::parse)]
    time: Time,

    #[arg(long)]
    arrive_by: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Network(#[from] LoadError),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unknown stop: {0}")]
    UnknownStop(String),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    let network = load_network(&args.network)?;
    let from = find_stop(&network, &args.from)?;
    let to = find_stop(&network, &args.to)?;

    let mut request = RouteRequest::between_stops(from, to, args.time);
    if args.arrive_by {
        request = request.arrive_by();
    }

    let router = Router::new(Arc::new(network), config);
    let response = router.route(request).await;

    if response.itineraries.is_empty() {
        println!("No itineraries found.");
    }
    for (i, itinerary) in response.itineraries.iter().enumerate() {
        println!("{}. {itinerary}", i + 1);
    }
    for error in &response.errors {
        println!("Note: {error}");
    }
    info!(
        itineraries = response.itineraries.len(),
        errors = response.errors.len(),
        "Done"
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<RouterConfig, CliError> {
    let json = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| CliError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

fn find_stop(network: &TransitNetwork, id_or_name: &str) -> Result<StopIndex, CliError> {
    network
        .find_stop(id_or_name)
        .ok_or_else(|| CliError::UnknownStop(id_or_name.to_string()))
}
