//! Per-tick snapshot types and bounded history buffers

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Alert, FleetRisk, TruckRecord};
use crate::config::defaults::HISTORY_CAPACITY;

/// Dashboard KPI block computed from one tick's truck table.
///
/// Invariant: `on_time + delayed == active_trucks` (every truck is in exactly
/// one bucket; `high_risk` is a sub-count of `delayed`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KpiBlock {
    pub active_trucks: usize,
    /// Trucks at LOW or MEDIUM risk
    pub on_time: usize,
    pub on_time_pct: f64,
    /// Trucks at HIGH or CRITICAL risk
    pub delayed: usize,
    /// Trucks at CRITICAL risk
    pub high_risk: usize,
}

/// Fleet-wide speed statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetStats {
    pub avg_fleet_speed: f64,
    pub urban_avg_speed: f64,
    pub interstate_avg_speed: f64,
    pub total_trucks: usize,
}

/// One charted sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Bounded FIFO series of history samples (capacity 30).
///
/// Serializes as a plain array so the wire format matches the
/// `eta_history[]` / `speed_history[]` / `risk_history[]` message fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistorySeries {
    points: VecDeque<HistoryPoint>,
}

impl HistorySeries {
    pub fn new() -> Self {
        Self {
            points: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Append a sample, evicting exactly the oldest on overflow.
    pub fn push(&mut self, timestamp: DateTime<Utc>, value: f64) {
        if self.points.len() >= HISTORY_CAPACITY {
            self.points.pop_front();
        }
        self.points.push_back(HistoryPoint { timestamp, value });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Ordered copy for handshakes and the REST history endpoints.
    pub fn to_vec(&self) -> Vec<HistoryPoint> {
        self.points.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryPoint> {
        self.points.iter()
    }
}

/// The immutable unit of broadcast: everything derived from one tick.
///
/// Once published for a tick it is never mutated; all sessions observe the
/// same content.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FleetSnapshot {
    pub tick: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub trucks: Vec<TruckRecord>,
    /// Alerts produced this tick only
    pub new_alerts: Vec<Alert>,
    pub kpi: KpiBlock,
    pub fleet_stats: FleetStats,
    pub fleet_risk: FleetRisk,
}

/// Full dashboard view published alongside each snapshot: the latest tick
/// plus the alert log and history buffers a newly connecting session needs.
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub latest: FleetSnapshot,
    /// Recent alert log copy (bounded by the 200-entry log cap)
    pub alerts: Vec<Alert>,
    pub eta_history: Vec<HistoryPoint>,
    pub speed_history: Vec<HistoryPoint>,
    pub risk_history: Vec<HistoryPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_series_cap() {
        let mut series = HistorySeries::new();
        for i in 0..(HISTORY_CAPACITY + 1) {
            series.push(Utc::now(), i as f64);
        }
        assert_eq!(series.len(), HISTORY_CAPACITY);
    }

    #[test]
    fn test_history_series_evicts_oldest() {
        let mut series = HistorySeries::new();
        for i in 0..HISTORY_CAPACITY {
            series.push(Utc::now(), i as f64);
        }
        // The 31st sample evicts exactly the oldest (value 0.0)
        series.push(Utc::now(), 99.0);
        let values: Vec<f64> = series.iter().map(|p| p.value).collect();
        assert_eq!(values[0], 1.0);
        assert_eq!(*values.last().unwrap(), 99.0);
        assert_eq!(values.len(), HISTORY_CAPACITY);
    }

    #[test]
    fn test_history_series_serializes_as_array() {
        let mut series = HistorySeries::new();
        series.push(Utc::now(), 42.0);
        let v = serde_json::to_value(&series).unwrap();
        assert!(v.is_array());
        assert_eq!(v[0]["value"], 42.0);
    }
}
