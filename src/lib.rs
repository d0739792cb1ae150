//! FLEETWATCH: Fleet Operational Intelligence
//!
//! Real-time fleet telemetry pipeline: a fixed-interval tick loop advances
//! per-truck sensor state, derives predictive metrics (ETA, rolling speed),
//! scores anomalies and risk, and fans consistent snapshots out to every
//! connected viewer over a duplex WebSocket channel.
//!
//! ## Architecture
//!
//! - **Engine**: tick-driven Generator -> Predictor -> Anomaly -> Risk
//!   pipeline, single owner of the hot state
//! - **Broadcast Hub**: immutable per-tick snapshot fan-out
//! - **API**: axum REST surface plus the `/ws` viewer channel
//! - **Assistant**: AI collaborator seam with a rule-based fallback

pub mod api;
pub mod assistant;
pub mod config;
pub mod engine;
pub mod hub;
pub mod types;

// Re-export the fleet configuration
pub use config::FleetConfig;

// Re-export commonly used types
pub use types::{
    Alert, AlertCategory, AlertSeverity, DashboardSnapshot, FleetRisk, FleetSnapshot,
    FleetStats, RiskLevel, Truck, TruckRecord,
};

// Re-export the engine and hub
pub use engine::{Engine, TickDriver};
pub use hub::BroadcastHub;

// Re-export the assistant
pub use assistant::FleetAssistant;
