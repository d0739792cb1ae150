//! API route handlers
//!
//! Request handling for the REST surface: service status, the truck table,
//! alerts, fleet stats/risk, chart histories, and the assistant REST
//! fallback. All reads come from the published dashboard snapshot, never
//! the live store.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::assistant::FleetAssistant;
use crate::hub::BroadcastHub;
use crate::types::{
    Alert, DashboardSnapshot, FleetRisk, FleetStats, HistoryPoint, TruckRecord,
};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers and WebSocket sessions.
#[derive(Clone)]
pub struct DashboardState {
    /// Latest published dashboard view (written once per tick)
    pub dashboard: Arc<RwLock<DashboardSnapshot>>,
    /// Fan-out hub for WebSocket sessions
    pub hub: BroadcastHub,
    /// AI assistant handle
    pub assistant: FleetAssistant,
    /// Service start time for uptime reporting
    pub started_at: Instant,
}

impl DashboardState {
    pub fn new(
        dashboard: Arc<RwLock<DashboardSnapshot>>,
        hub: BroadcastHub,
        assistant: FleetAssistant,
    ) -> Self {
        Self {
            dashboard,
            hub,
            assistant,
            started_at: Instant::now(),
        }
    }
}

// ============================================================================
// Status Endpoint
// ============================================================================

/// Service status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub streaming: bool,
    pub connected_clients: usize,
    pub active_trucks: usize,
    pub tick: u64,
    pub uptime_secs: u64,
}

/// GET /api/v1/status - Service liveness and stream state
pub async fn get_status(State(state): State<DashboardState>) -> Json<StatusResponse> {
    let dash = state.dashboard.read().await;
    Json(StatusResponse {
        status: "online",
        version: env!("CARGO_PKG_VERSION"),
        // The tick counter only moves while the driver is alive
        streaming: dash.latest.tick > 0,
        connected_clients: state.hub.client_count(),
        active_trucks: dash.latest.trucks.len(),
        tick: dash.latest.tick,
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// GET /health - Legacy liveness endpoint
pub async fn legacy_health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

// ============================================================================
// Truck Endpoints
// ============================================================================

/// GET /api/v1/trucks - Current truck table
pub async fn get_trucks(State(state): State<DashboardState>) -> Json<Vec<TruckRecord>> {
    let dash = state.dashboard.read().await;
    Json(dash.latest.trucks.clone())
}

/// GET /api/v1/trucks/:id - One truck or 404
pub async fn get_truck(
    State(state): State<DashboardState>,
    Path(truck_id): Path<String>,
) -> Response {
    let dash = state.dashboard.read().await;
    match dash.latest.trucks.iter().find(|t| t.truck_id == truck_id) {
        Some(truck) => Json(truck.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Truck not found"})),
        )
            .into_response(),
    }
}

// ============================================================================
// Alert & Fleet Endpoints
// ============================================================================

/// GET /api/v1/alerts - Recent alerts (bounded by the log cap)
pub async fn get_alerts(State(state): State<DashboardState>) -> Json<Vec<Alert>> {
    let dash = state.dashboard.read().await;
    Json(dash.alerts.clone())
}

/// GET /api/v1/fleet/stats - Fleet speed statistics
pub async fn get_fleet_stats(State(state): State<DashboardState>) -> Json<FleetStats> {
    let dash = state.dashboard.read().await;
    Json(dash.latest.fleet_stats.clone())
}

/// GET /api/v1/fleet/risk - Fleet risk block
pub async fn get_fleet_risk(State(state): State<DashboardState>) -> Json<FleetRisk> {
    let dash = state.dashboard.read().await;
    Json(dash.latest.fleet_risk.clone())
}

// ============================================================================
// History Endpoints
// ============================================================================

/// GET /api/v1/history/eta
pub async fn get_eta_history(State(state): State<DashboardState>) -> Json<Vec<HistoryPoint>> {
    let dash = state.dashboard.read().await;
    Json(dash.eta_history.clone())
}

/// GET /api/v1/history/speed
pub async fn get_speed_history(State(state): State<DashboardState>) -> Json<Vec<HistoryPoint>> {
    let dash = state.dashboard.read().await;
    Json(dash.speed_history.clone())
}

/// GET /api/v1/history/risk
pub async fn get_risk_history(State(state): State<DashboardState>) -> Json<Vec<HistoryPoint>> {
    let dash = state.dashboard.read().await;
    Json(dash.risk_history.clone())
}

// ============================================================================
// Assistant REST Fallback
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// POST /api/v1/assistant/ask - REST fallback for clients without an open
/// channel. Returns the same shape as the `ai_response` wire message.
pub async fn ask_assistant(
    State(state): State<DashboardState>,
    Json(req): Json<AskRequest>,
) -> Json<serde_json::Value> {
    let reply = state.assistant.ask(&req.question).await;
    Json(serde_json::to_value(&reply).unwrap_or_else(
        |_| serde_json::json!({"error": "serialization failure"}),
    ))
}
