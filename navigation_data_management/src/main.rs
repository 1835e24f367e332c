use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use navigation_data_management::DataManager;
use navigation_lib::history::DEFAULT_HISTORY_LIMIT;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "data_management")]
#[command(about = "A CLI to inspect and maintain the navigation history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recent destinations, falling back to trip logs
    List {
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,
    },
    /// Delete every address history entry. Trip logs are kept
    Clear,
    /// Insert the sample debug trip
    DebugTrip,
    /// List stored trip logs, newest first
    TripLogs {
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,
    },
}

// CLI for manual data operations
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info,navigation_data_management=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let data_manager = DataManager::start(Some(&database_url)).await?;
    if !data_manager.is_connected() {
        bail!("DATABASE_URL is blank");
    }

    match cli.command {
        Commands::List { limit } => {
            for entry in data_manager.history(limit).await {
                println!("{}\t{}\t{}", entry.id, entry.created_at.format("%d/%m/%Y %H:%M (UTC)"), entry.label());
            }
        },
        Commands::Clear => {
            println!("Cleared {} entries", data_manager.clear_history().await);
        },
        Commands::DebugTrip => match data_manager.log_debug_trip().await? {
            Some(id) => println!("Inserted debug trip {id}"),
            None => println!("Database not connected, nothing inserted"),
        },
        Commands::TripLogs { limit } => {
            for record in data_manager.trip_logs(limit).await? {
                println!(
                    "{}\t{}\t{}\t{} m\t{} s",
                    record.id,
                    record.created_at.format("%d/%m/%Y %H:%M (UTC)"),
                    record.log.destination.place_name,
                    record.log.distance_meters,
                    record.log.duration_seconds
                );
            }
        },
    }

    Ok(())
}
