use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    middleware::{from_fn, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::server_state::ServerState;

pub mod config;
pub mod error;
pub mod maps;
pub mod navigation;
pub mod server_state;

pub fn app(server_state: Arc<ServerState>) -> Router {
    let navigation = Router::new()
        .route("/route", post(navigation::create_route))
        .route("/geocode", get(navigation::geocode_destination))
        .route(
            "/history",
            get(navigation::list_history)
                .post(navigation::append_history)
                .delete(navigation::clear_history),
        )
        .route("/debug-log", post(navigation::debug_log));

    Router::new()
        .route("/health", get(navigation::health))
        .nest("/api/navigation", navigation)
        .with_state(server_state)
        .layer(from_fn(no_store))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// Every response is marked uncacheable.
async fn no_store(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    response.headers_mut().insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
