//! Tick driver
//!
//! The single periodic loop that owns and exclusively mutates the hot fleet
//! state. Each tick runs Generator -> Predictive Model -> Anomaly/Alert
//! Engine -> Risk Scorer -> History Buffers, then publishes an immutable
//! snapshot to the broadcast hub and the shared dashboard view.
//!
//! The synchronous core lives in [`Engine::run_tick`] so scenario tests can
//! drive ticks directly; [`TickDriver::run`] wraps it in the interval loop
//! with cancellation.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::anomaly::AnomalyEngine;
use super::generator::TelemetryGenerator;
use super::predictor;
use super::risk::RiskEngine;
use super::state::FleetState;
use crate::config::FleetConfig;
use crate::hub::BroadcastHub;
use crate::types::{Alert, DashboardSnapshot, FleetSnapshot};

/// The synchronous tick pipeline: stages plus the hot state they mutate.
pub struct Engine {
    generator: TelemetryGenerator,
    anomaly: AnomalyEngine,
    risk: RiskEngine,
    pub state: FleetState,
    tick_interval_secs: u64,
}

impl Engine {
    pub fn new(cfg: &FleetConfig) -> Self {
        let mut generator = TelemetryGenerator::new(cfg.stream.seed);
        let trucks = generator.seed_fleet(cfg.stream.fleet_size);
        info!(fleet_size = trucks.len(), seed = ?cfg.stream.seed, "Fleet seeded");
        Self {
            generator,
            anomaly: AnomalyEngine::new(cfg.thresholds.clone()),
            risk: RiskEngine::new(cfg.risk.clone(), cfg.thresholds.clone()),
            state: FleetState::new(trucks),
            tick_interval_secs: cfg.stream.tick_interval_secs,
        }
    }

    /// Run one tick. Returns the immutable snapshot for broadcast and the
    /// full dashboard view for handshakes/REST.
    ///
    /// Snapshot consistency: every derived block (KPI, risk, stats,
    /// histories) is computed from the truck table as left by this tick's
    /// stages — never a mix of ticks.
    pub fn run_tick(&mut self, now: DateTime<Utc>) -> (FleetSnapshot, DashboardSnapshot) {
        self.state.tick += 1;

        // Stage 1: advance telemetry; reseed arrivals (fleet size conserved)
        let events = self
            .generator
            .advance(&mut self.state.trucks, self.tick_interval_secs as f64);
        for truck_id in &events.arrivals {
            if let Some(truck) = self
                .state
                .trucks
                .iter_mut()
                .find(|t| &t.truck_id == truck_id)
            {
                self.generator.reseed(truck);
            }
        }

        // Stage 2: predictive fields
        for truck in &mut self.state.trucks {
            predictor::update_truck(truck);
        }

        // Stage 3: alert rules (edge-triggered)
        let mut new_alerts: Vec<Alert> = Vec::new();
        for truck in &self.state.trucks {
            let refueled = events.refuels.contains(&truck.truck_id);
            new_alerts.extend(self.anomaly.evaluate(truck, refueled, now));
        }

        // Stage 4: risk scoring, using this tick's alerts per truck
        for truck in &mut self.state.trucks {
            let truck_alerts: Vec<Alert> = new_alerts
                .iter()
                .filter(|a| a.truck_id == truck.truck_id)
                .cloned()
                .collect();
            let (score, level, explanation, _) = self.risk.score_truck(truck, &truck_alerts);
            truck.risk_score = score;
            truck.risk_level = level;
            truck.explanation = explanation;
        }
        let fleet_risk = self.risk.fleet_risk(&self.state.trucks);
        let fleet_stats = predictor::fleet_stats(&self.state.trucks);

        // Stage 5: history samples and alert log
        self.state.push_alerts(&new_alerts);
        self.state.record_history(
            now,
            predictor::fleet_avg_eta(&self.state.trucks),
            fleet_stats.avg_fleet_speed,
            fleet_risk.overall_score,
        );

        let snapshot = self
            .state
            .build_snapshot(now, new_alerts, fleet_stats, fleet_risk);
        let dashboard = self.state.build_dashboard(snapshot.clone());
        (snapshot, dashboard)
    }

    pub fn tick_interval_secs(&self) -> u64 {
        self.tick_interval_secs
    }
}

/// Owns the engine and drives it on a fixed interval until cancellation.
pub struct TickDriver {
    engine: Engine,
    hub: BroadcastHub,
    dashboard: Arc<RwLock<DashboardSnapshot>>,
    cancel_token: CancellationToken,
}

impl TickDriver {
    pub fn new(
        engine: Engine,
        hub: BroadcastHub,
        dashboard: Arc<RwLock<DashboardSnapshot>>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            engine,
            hub,
            dashboard,
            cancel_token,
        }
    }

    /// Run until cancelled. Any error escaping a tick stage is returned and
    /// takes the process down — broadcasting an inconsistent snapshot is
    /// worse than stopping.
    pub async fn run(mut self) -> Result<()> {
        let interval_secs = self.engine.tick_interval_secs();
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(interval_secs, "[TickDriver] Task starting");

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!(
                        ticks = self.engine.state.tick,
                        "[TickDriver] Shutdown signal received"
                    );
                    return Ok(());
                }
                _ = interval.tick() => {
                    let started = Instant::now();
                    let now = Utc::now();
                    let (snapshot, dashboard) = self.engine.run_tick(now);

                    let new_alert_count = snapshot.new_alerts.len();
                    let tick = snapshot.tick;

                    // Publish order: dashboard first so a session connecting
                    // between the two sees state no newer than its first
                    // stream update.
                    *self.dashboard.write().await = dashboard;
                    self.hub.publish(Arc::new(snapshot));

                    let elapsed = started.elapsed();
                    if elapsed.as_secs() >= interval_secs {
                        warn!(
                            tick,
                            elapsed_ms = elapsed.as_millis() as u64,
                            "[TickDriver] Tick exceeded interval — downstream stalled"
                        );
                    }
                    if tick % 30 == 0 {
                        info!(
                            tick,
                            clients = self.hub.client_count(),
                            new_alerts = new_alert_count,
                            "[TickDriver] Progress"
                        );
                    }
                }
            }
        }
    }
}
