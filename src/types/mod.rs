//! Core domain and wire types

mod alert;
mod messages;
mod risk;
mod snapshot;
mod truck;

pub use alert::{Alert, AlertCategory, AlertSeverity};
pub use messages::{AnswerSource, ClientMessage, ServerMessage};
pub use risk::{FleetRisk, RiskLevel};
pub use snapshot::{DashboardSnapshot, FleetSnapshot, FleetStats, HistoryPoint, HistorySeries, KpiBlock};
pub use truck::{RouteLeg, RoutePhase, RouteType, Truck, TruckRecord};
