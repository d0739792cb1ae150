//! API route definitions
//!
//! Endpoints for the fleet dashboard:
//! - /api/v1/status - service liveness and stream state
//! - /api/v1/trucks - current truck table
//! - /api/v1/alerts - recent alert log
//! - /api/v1/fleet/* - fleet stats and risk
//! - /api/v1/history/* - chart history buffers
//! - /api/v1/assistant/ask - REST fallback for AI questions

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, DashboardState};
use super::ws;

/// Create all API routes for the dashboard
pub fn api_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/status", get(handlers::get_status))
        .route("/trucks", get(handlers::get_trucks))
        .route("/trucks/:id", get(handlers::get_truck))
        .route("/alerts", get(handlers::get_alerts))
        .route("/fleet/stats", get(handlers::get_fleet_stats))
        .route("/fleet/risk", get(handlers::get_fleet_risk))
        .route("/history/eta", get(handlers::get_eta_history))
        .route("/history/speed", get(handlers::get_speed_history))
        .route("/history/risk", get(handlers::get_risk_history))
        .route("/assistant/ask", post(handlers::ask_assistant))
        .with_state(state)
}

/// Root-level routes: legacy health endpoint and the WebSocket upgrade
pub fn root_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/health", get(handlers::legacy_health_check))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::FleetAssistant;
    use crate::hub::BroadcastHub;
    use crate::types::DashboardSnapshot;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    fn create_test_state() -> DashboardState {
        let dashboard = Arc::new(RwLock::new(DashboardSnapshot::default()));
        DashboardState::new(
            Arc::clone(&dashboard),
            BroadcastHub::new(),
            FleetAssistant::rule_based(dashboard),
        )
    }

    #[tokio::test]
    async fn test_api_routes_status() {
        let app = api_routes(create_test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_routes_trucks() {
        let app = api_routes(create_test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/trucks")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_routes_unknown_truck_404() {
        let app = api_routes(create_test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/trucks/T-999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_routes_history() {
        let app = api_routes(create_test_state());
        for uri in ["/history/eta", "/history/speed", "/history/risk"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_root_routes_health() {
        let app = root_routes(create_test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
