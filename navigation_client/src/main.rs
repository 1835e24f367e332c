use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use navigation_client::{
    api::ApiClient,
    config::ClientConfig,
    format::{format_distance, format_distance_imperial, format_duration, format_eta},
    location::{ensure_permission, LocationProvider, ManualLocationProvider, PermissionStatus},
    session::{NavigationSession, SessionEvent, TripStatus},
};
use navigation_lib::{coordinate::Coordinate, gateway::HistoryStore, history::DEFAULT_HISTORY_LIMIT, route::RouteResult};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nav")]
#[command(about = "Terminal client for the navigation service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route to an address from the given position, refreshing until stopped
    Navigate {
        address: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Start the trip right away and stop on arrival
        #[arg(long)]
        start_trip: bool,
    },
    /// Resolve an address without routing
    Geocode { address: String },
    /// List recent destinations
    History {
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,
    },
    /// Forget every recent destination
    ClearHistory,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=info,navigation_client=info", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();
    let api = Arc::new(ApiClient::new(config.api_url.clone(), config.request_timeout)?);
    tracing::info!("Using navigation service at {}", api.base_url());

    match cli.command {
        Commands::Navigate { address, lat, lon, start_trip } => {
            let location = ManualLocationProvider::new(PermissionStatus::Unknown, true);
            if ensure_permission(&location).await != PermissionStatus::Granted {
                location.open_system_settings();
                bail!("Location permission is required to navigate");
            }
            let origin = Coordinate::new(lat, lon);
            location.set_position(Some(origin));

            navigate(&config, api, &location, &address, origin, start_trip).await?;
        },
        Commands::Geocode { address } => {
            let destination = api.geocode_address(&address).await?;
            println!("{}\t{:.6}, {:.6}", destination.place_name, destination.coords.latitude, destination.coords.longitude);
        },
        Commands::History { limit } => {
            for entry in api.list(limit).await? {
                println!("{}\t{}", entry.created_at.format("%Y-%m-%d %H:%M"), entry.label());
            }
        },
        Commands::ClearHistory => {
            println!("Cleared {} entries", api.clear().await?);
        },
    }

    Ok(())
}

async fn navigate(
    config: &ClientConfig,
    api: Arc<ApiClient>,
    location: &ManualLocationProvider,
    address: &str,
    origin: Coordinate,
    start_trip: bool,
) -> anyhow::Result<()> {
    let mut session = NavigationSession::with_settings(api.clone(), api, location.subscribe(), config.session);
    let mut events = session.subscribe();

    let route = session.submit_destination(address, Some(origin)).await?;
    print_route(&route);

    if start_trip && session.start_trip().await? == TripStatus::Completed {
        println!("Already at {}", route.destination.place_name);
        return Ok(());
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(SessionEvent::RouteUpdated(route)) => print_route(&route),
                Ok(SessionEvent::RefreshFailed(err)) => println!("Refresh failed, keeping last route: {err}"),
                Ok(SessionEvent::WaitingForLocation) => println!("Waiting for location..."),
                Ok(SessionEvent::Arrived(route)) => {
                    println!("Arrived at {}", route.destination.place_name);
                    break;
                },
                Ok(SessionEvent::Cleared) | Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(skipped)) => tracing::debug!("Skipped {skipped} session events"),
            },
        }
    }

    session.clear().await;
    Ok(())
}

fn print_route(route: &RouteResult) {
    println!(
        "{}\t{} ({})\t{}\tETA {}",
        route.destination.place_name,
        format_distance(route.distance_meters),
        format_distance_imperial(route.distance_meters),
        format_duration(route.duration_seconds),
        format_eta(Some(route.eta)),
    );
}
