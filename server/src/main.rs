use std::{fs::OpenOptions, net::SocketAddr, sync::Arc};

use local_ip_address::local_ip;
use navigation_data_management::DataManager;
use server::{
    config::{is_placeholder_key, ServerConfig},
    maps::{MapboxGateway, INVALID_KEY_MESSAGE},
    server_state::ServerState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env();

    std::fs::create_dir_all(&config.log_dir)?;
    let log_file = config.log_dir.join("server.log");

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=debug,navigation_data_management=debug,tower_http=debug", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    tracing::info!("Starting server...");

    // Provider calls fail fast per request; warn now so the operator sees it before the first one.
    if is_placeholder_key(&config.maps_api_key) {
        tracing::warn!("{INVALID_KEY_MESSAGE}");
    }

    let data_manager = DataManager::start(config.database_url.as_deref()).await?;
    let maps = Arc::new(MapboxGateway::from_config(&config));
    let server_state = Arc::new(ServerState::new(data_manager, maps));

    let app = server::app(server_state);

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], config.port))).await?;
    let port = listener.local_addr()?.port();

    tracing::info!("API listening on port {port}");
    tracing::info!("Localhost URL: http://localhost:{port}");
    match local_ip() {
        Ok(ip) => tracing::info!("LAN URL: http://{ip}:{port}"),
        Err(err) => tracing::warn!("No LAN IP detected ({err}); connect via localhost or set NAVIGATION_API_URL"),
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
