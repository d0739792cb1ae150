//! Wire messages for the duplex viewer channel
//!
//! One JSON object per logical event, discriminated by `type`.

use serde::{Deserialize, Serialize};

use super::{Alert, FleetRisk, FleetStats, HistoryPoint, KpiBlock, TruckRecord};

/// Where an assistant answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerSource {
    #[serde(rename = "model")]
    Model,
    #[serde(rename = "rule-based")]
    RuleBased,
}

/// Server -> client messages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent exactly once per session on connect.
    InitialState {
        trucks: Vec<TruckRecord>,
        alerts: Vec<Alert>,
        kpi: KpiBlock,
        fleet_risk: FleetRisk,
        fleet_stats: FleetStats,
        eta_history: Vec<HistoryPoint>,
        speed_history: Vec<HistoryPoint>,
        risk_history: Vec<HistoryPoint>,
    },
    /// Sent once per tick per session; `alerts` holds new alerts only.
    StreamUpdate {
        trucks: Vec<TruckRecord>,
        alerts: Vec<Alert>,
        kpi: KpiBlock,
        fleet_risk: FleetRisk,
        fleet_stats: FleetStats,
    },
    /// Out-of-band reply to an `ai_question`, delivered to the asking
    /// session only.
    AiResponse {
        response: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        token_usage: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_tokens: Option<u64>,
        source: AnswerSource,
    },
    /// Liveness response to a client `ping`.
    Pong,
}

/// Client -> server messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    AiQuestion { question: String },
    Ping,
}
