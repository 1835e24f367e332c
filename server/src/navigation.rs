use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use navigation_lib::{
    api::{
        AppendHistoryRequest, AppendHistoryResponse, ClearedResponse, GeocodeQuery, HealthResponse, HistoryQuery,
        HistoryResponse, MessageResponse, RouteRequest, ValidRouteRequest,
    },
    destination::Destination,
    error::NavError,
    planner::{plan_route, resolve_target},
    route::RouteResult,
    trip_log::TripLog,
};

use crate::{error::ApiError, server_state::ServerState};

type ApiResult<T> = Result<T, ApiError>;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

/// Resolves the destination if needed, asks for directions, then records the
/// trip log and history entry. Bookkeeping failures never fail the route.
pub async fn create_route(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> ApiResult<Json<RouteResult>> {
    let Json(request) = payload.map_err(json_rejection)?;
    let ValidRouteRequest {
        origin,
        target,
        history_address,
    } = request.validate()?;

    let destination = resolve_target(state.maps.as_ref(), target).await?;
    let route = plan_route(state.maps.as_ref(), origin, destination).await?;

    state.data_manager.save_trip_log(&TripLog::from_route(origin, &route)).await;

    // A blank label (a client refresh) is not recorded.
    state.data_manager.record_history(&history_address, &route.destination).await;

    Ok(Json(route))
}

pub async fn geocode_destination(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<GeocodeQuery>, QueryRejection>,
) -> ApiResult<Json<Destination>> {
    let Query(query) = query.map_err(query_rejection)?;
    let address = query.validate()?;

    let destination = state.maps.geocode(&address).await?;
    Ok(Json(destination))
}

pub async fn list_history(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Json<HistoryResponse>> {
    let Query(query) = query.map_err(query_rejection)?;
    let limit = query.validate()?;

    let history = state.data_manager.history(limit).await;
    tracing::debug!("Returning {} history entries", history.len());

    Ok(Json(HistoryResponse {
        history,
    }))
}

pub async fn append_history(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<AppendHistoryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AppendHistoryResponse>)> {
    let Json(request) = payload.map_err(json_rejection)?;
    let (address, destination) = request.validate()?;

    let entry = state.data_manager.record_history(&address, &destination).await;
    Ok((StatusCode::CREATED, Json(AppendHistoryResponse {
        entry,
    })))
}

pub async fn clear_history(State(state): State<Arc<ServerState>>) -> Json<ClearedResponse> {
    let cleared = state.data_manager.clear_history().await;
    tracing::info!("Cleared {cleared} history entries");

    Json(ClearedResponse {
        cleared,
    })
}

pub async fn debug_log(State(state): State<Arc<ServerState>>) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    state.data_manager.log_debug_trip().await.map_err(NavError::from)?;

    Ok((StatusCode::CREATED, Json(MessageResponse {
        message: "Debug trip inserted".into(),
    })))
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError(NavError::invalid_input(&["body"], rejection.body_text()))
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
    ApiError(NavError::invalid_input(&["query"], rejection.body_text()))
}
