//! Fleet telemetry engine
//!
//! The per-tick pipeline: Generator -> Predictive Model -> Anomaly/Alert
//! Engine -> Risk Scorer -> History Buffers, driven by [`tick::TickDriver`].

pub mod anomaly;
pub mod generator;
pub mod predictor;
pub mod risk;
pub mod state;
pub mod tick;

pub use anomaly::AnomalyEngine;
pub use generator::{TelemetryGenerator, TickEvents};
pub use risk::RiskEngine;
pub use state::FleetState;
pub use tick::{Engine, TickDriver};
