//! Fleet hot state
//!
//! Owned exclusively by the tick driver task; every other component sees
//! immutable snapshots published after each tick, never the live store.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::config::defaults::{ALERT_LOG_CAPACITY, RECENT_ALERTS_ON_CONNECT};
use crate::types::{
    Alert, DashboardSnapshot, FleetRisk, FleetSnapshot, FleetStats, HistorySeries, KpiBlock,
    Truck, TruckRecord,
};

/// The truck table, alert log, and history buffers.
#[derive(Debug)]
pub struct FleetState {
    pub trucks: Vec<Truck>,
    /// Append-only alert log, FIFO-evicted at 200 entries
    pub alert_log: VecDeque<Alert>,
    pub eta_history: HistorySeries,
    pub speed_history: HistorySeries,
    pub risk_history: HistorySeries,
    pub tick: u64,
}

impl FleetState {
    pub fn new(trucks: Vec<Truck>) -> Self {
        Self {
            trucks,
            alert_log: VecDeque::with_capacity(ALERT_LOG_CAPACITY),
            eta_history: HistorySeries::new(),
            speed_history: HistorySeries::new(),
            risk_history: HistorySeries::new(),
            tick: 0,
        }
    }

    /// Append new alerts, respecting the log cap.
    pub fn push_alerts(&mut self, alerts: &[Alert]) {
        for alert in alerts {
            if self.alert_log.len() >= ALERT_LOG_CAPACITY {
                self.alert_log.pop_front();
            }
            self.alert_log.push_back(alert.clone());
        }
    }

    /// One history sample per metric per tick.
    pub fn record_history(
        &mut self,
        now: DateTime<Utc>,
        avg_eta: f64,
        avg_speed: f64,
        risk_score: f64,
    ) {
        self.eta_history.push(now, avg_eta);
        self.speed_history.push(now, avg_speed);
        self.risk_history.push(now, risk_score);
    }

    /// Dashboard KPI block over the current truck table.
    ///
    /// Every truck lands in exactly one of on_time / delayed, so the counts
    /// partition the fleet; `high_risk` sub-counts CRITICAL trucks.
    pub fn kpi(&self) -> KpiBlock {
        let active = self.trucks.len();
        let on_time = self
            .trucks
            .iter()
            .filter(|t| !t.risk_level.is_high_risk())
            .count();
        let delayed = active - on_time;
        let high_risk = self
            .trucks
            .iter()
            .filter(|t| t.risk_level == crate::types::RiskLevel::Critical)
            .count();
        KpiBlock {
            active_trucks: active,
            on_time,
            on_time_pct: if active == 0 {
                0.0
            } else {
                (on_time as f64 / active as f64 * 100.0).round()
            },
            delayed,
            high_risk,
        }
    }

    pub fn truck_records(&self) -> Vec<TruckRecord> {
        self.trucks.iter().map(Truck::record).collect()
    }

    /// Build the immutable per-tick snapshot.
    pub fn build_snapshot(
        &self,
        now: DateTime<Utc>,
        new_alerts: Vec<Alert>,
        fleet_stats: FleetStats,
        fleet_risk: FleetRisk,
    ) -> FleetSnapshot {
        FleetSnapshot {
            tick: self.tick,
            timestamp: Some(now),
            trucks: self.truck_records(),
            new_alerts,
            kpi: self.kpi(),
            fleet_stats,
            fleet_risk,
        }
    }

    /// Build the full dashboard view for REST handlers and session
    /// handshakes: the latest snapshot plus recent alerts and histories.
    pub fn build_dashboard(&self, latest: FleetSnapshot) -> DashboardSnapshot {
        let recent_start = self.alert_log.len().saturating_sub(RECENT_ALERTS_ON_CONNECT);
        DashboardSnapshot {
            latest,
            alerts: self.alert_log.iter().skip(recent_start).cloned().collect(),
            eta_history: self.eta_history.to_vec(),
            speed_history: self.speed_history.to_vec(),
            risk_history: self.risk_history.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generator::TelemetryGenerator;
    use crate::types::{AlertCategory, AlertSeverity, RiskLevel};

    fn make_alert(seq: u64) -> Alert {
        Alert {
            seq,
            truck_id: "T-102".to_string(),
            category: AlertCategory::FuelLow,
            severity: AlertSeverity::Warning,
            title: format!("alert {seq}"),
            message: String::new(),
            ai_insight: None,
            timestamp: Utc::now(),
        }
    }

    fn seeded_state(size: usize) -> FleetState {
        let mut generator = TelemetryGenerator::new(Some(8));
        FleetState::new(generator.seed_fleet(size))
    }

    #[test]
    fn test_alert_log_cap_and_fifo_order() {
        let mut state = seeded_state(1);
        let alerts: Vec<Alert> = (0..(ALERT_LOG_CAPACITY as u64 + 10)).map(make_alert).collect();
        state.push_alerts(&alerts);
        assert_eq!(state.alert_log.len(), ALERT_LOG_CAPACITY);
        // Oldest ten evicted, order preserved
        assert_eq!(state.alert_log.front().map(|a| a.seq), Some(10));
        assert_eq!(
            state.alert_log.back().map(|a| a.seq),
            Some(ALERT_LOG_CAPACITY as u64 + 9)
        );
    }

    #[test]
    fn test_kpi_partitions_fleet() {
        let mut state = seeded_state(5);
        state.trucks[0].risk_level = RiskLevel::Low;
        state.trucks[1].risk_level = RiskLevel::Medium;
        state.trucks[2].risk_level = RiskLevel::High;
        state.trucks[3].risk_level = RiskLevel::Critical;
        state.trucks[4].risk_level = RiskLevel::Critical;

        let kpi = state.kpi();
        assert_eq!(kpi.active_trucks, 5);
        assert_eq!(kpi.on_time + kpi.delayed, kpi.active_trucks);
        assert_eq!(kpi.on_time, 2);
        assert_eq!(kpi.delayed, 3);
        assert_eq!(kpi.high_risk, 2);
        assert_eq!(kpi.on_time_pct, 40.0);
    }

    #[test]
    fn test_kpi_empty_fleet() {
        let state = FleetState::new(Vec::new());
        let kpi = state.kpi();
        assert_eq!(kpi.active_trucks, 0);
        assert_eq!(kpi.on_time_pct, 0.0);
    }

    #[test]
    fn test_dashboard_bounds_recent_alerts() {
        let mut state = seeded_state(1);
        let alerts: Vec<Alert> = (0..50).map(make_alert).collect();
        state.push_alerts(&alerts);
        let dashboard = state.build_dashboard(FleetSnapshot::default());
        assert_eq!(dashboard.alerts.len(), RECENT_ALERTS_ON_CONNECT);
        // Most recent survive
        assert_eq!(dashboard.alerts.last().map(|a| a.seq), Some(49));
    }
}
