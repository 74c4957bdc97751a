// HTTP request handlers
use crate::application::dashboard_service::DashboardView;
use crate::domain::dashboard::ChartDataStore;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current view: grid of every zone or the single expanded chart
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    Json(state.dashboard_service.current_view().await)
}

pub async fn expand_zone(
    Path(zone): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.dashboard_service.expand(&zone).await {
        Ok(_) => Json(state.dashboard_service.current_view().await).into_response(),
        Err(e) => (StatusCode::NOT_FOUND, Json(json!({ "error": e.to_string() }))).into_response(),
    }
}

pub async fn close_chart(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    state.dashboard_service.close().await;
    Json(state.dashboard_service.current_view().await)
}

/// Raw chart data of the latest applied poll
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<ChartDataStore> {
    let snapshot = state.current_store.snapshot().await;
    Json(snapshot.as_ref().clone())
}

pub async fn get_historical(State(state): State<Arc<AppState>>) -> Response {
    match state.dashboard_service.historical_view().await {
        Some(view) => Json(view).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "historical feed is not configured" })),
        )
            .into_response(),
    }
}
