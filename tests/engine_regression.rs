//! Engine regression tests
//!
//! Scenario-level checks over the tick pipeline: alert edge-triggering
//! across ticks, KPI consistency, history bounds, and the handshake
//! guarantees a connecting session relies on.

use chrono::Utc;
use fleetwatch::config::FleetConfig;
use fleetwatch::engine::Engine;
use fleetwatch::hub::BroadcastHub;
use fleetwatch::types::{AlertCategory, AlertSeverity};
use std::sync::Arc;

fn engine_with(fleet_size: usize, seed: u64) -> Engine {
    let mut cfg = FleetConfig::default();
    cfg.stream.fleet_size = fleet_size;
    cfg.stream.seed = Some(seed);
    cfg.stream.tick_interval_secs = 2;
    Engine::new(&cfg)
}

/// Fleet of 3 trucks, 2 s ticks; one truck forced to 45 °F. Expect exactly
/// one critical alert on the transition tick, a HIGH-or-worse risk level,
/// and zero new alerts for that rule on the next tick with the temperature
/// still at 45 °F.
#[test]
fn test_hot_reefer_scenario_edge_triggered() {
    let mut engine = engine_with(3, 42);
    let hot_id = engine.state.trucks[0].truck_id.clone();

    engine.state.trucks[0].temperature = 45.0;
    let (snapshot, _) = engine.run_tick(Utc::now());

    let hot_alerts: Vec<_> = snapshot
        .new_alerts
        .iter()
        .filter(|a| a.truck_id == hot_id)
        .collect();
    assert_eq!(hot_alerts.len(), 1, "expected exactly one alert: {hot_alerts:?}");
    assert_eq!(hot_alerts[0].severity, AlertSeverity::Critical);
    assert_eq!(hot_alerts[0].category, AlertCategory::TemperatureHigh);

    let hot_truck = snapshot
        .trucks
        .iter()
        .find(|t| t.truck_id == hot_id)
        .expect("hot truck present in snapshot");
    assert!(
        hot_truck.risk_level.is_high_risk(),
        "risk level {} for hot reefer",
        hot_truck.risk_level
    );

    // Tick 2: temperature unchanged at 45 °F — the still-true condition
    // must not re-alert
    engine.state.trucks[0].temperature = 45.0;
    let (snapshot2, _) = engine.run_tick(Utc::now());
    let repeat_alerts = snapshot2
        .new_alerts
        .iter()
        .filter(|a| a.truck_id == hot_id && a.category == AlertCategory::TemperatureHigh)
        .count();
    assert_eq!(repeat_alerts, 0, "still-true condition re-alerted");
}

/// A rule that stays continuously fired across 5 consecutive ticks produces
/// exactly one alert, not five.
#[test]
fn test_continuous_condition_alerts_once_in_five_ticks() {
    let mut engine = engine_with(3, 7);
    let hot_id = engine.state.trucks[0].truck_id.clone();

    let mut temp_alerts = 0;
    for _ in 0..5 {
        engine.state.trucks[0].temperature = 45.0;
        let (snapshot, _) = engine.run_tick(Utc::now());
        temp_alerts += snapshot
            .new_alerts
            .iter()
            .filter(|a| a.truck_id == hot_id && a.category == AlertCategory::TemperatureHigh)
            .count();
    }
    assert_eq!(temp_alerts, 1);
}

/// `sum(KPI counts by category) == total active truck count`, every tick,
/// and fuel stays within bounds.
#[test]
fn test_kpi_and_fuel_invariants_over_long_run() {
    let mut engine = engine_with(6, 99);
    for _ in 0..200 {
        let (snapshot, _) = engine.run_tick(Utc::now());
        assert_eq!(
            snapshot.kpi.on_time + snapshot.kpi.delayed,
            snapshot.kpi.active_trucks
        );
        assert!(snapshot.kpi.high_risk <= snapshot.kpi.delayed);
        for truck in &snapshot.trucks {
            assert!(
                (0.0..=100.0).contains(&truck.fuel_level),
                "fuel out of range: {}",
                truck.fuel_level
            );
        }
    }
}

/// History buffers never exceed 30 samples and alert log never exceeds 200.
#[test]
fn test_bounded_buffers_over_long_run() {
    let mut engine = engine_with(5, 13);
    for _ in 0..400 {
        let (_, dashboard) = engine.run_tick(Utc::now());
        assert!(dashboard.eta_history.len() <= 30);
        assert!(dashboard.speed_history.len() <= 30);
        assert!(dashboard.risk_history.len() <= 30);
    }
    assert_eq!(engine.state.eta_history.len(), 30);
    assert!(engine.state.alert_log.len() <= 200);
}

/// A session connecting mid-run must receive an initial state whose truck
/// count matches the live store at connect time, and converge to the same
/// truck table as a session connected since tick 0 after observing the
/// same updates.
#[tokio::test]
async fn test_midrun_connect_converges_with_early_session() {
    let hub = BroadcastHub::new();
    let mut engine = engine_with(4, 55);

    // Early session, connected since tick 0
    let (mut early_rx, _early_guard) = hub.subscribe();
    let mut early_view = Vec::new();

    // Run 5 ticks before the late session connects
    let mut latest_dashboard = None;
    for _ in 0..5 {
        let (snapshot, dashboard) = engine.run_tick(Utc::now());
        hub.publish(Arc::new(snapshot));
        latest_dashboard = Some(dashboard);
        while let Ok(s) = early_rx.try_recv() {
            early_view = s.trucks.clone();
        }
    }

    // Late session: handshake from the published dashboard, not tick 0
    let (mut late_rx, _late_guard) = hub.subscribe();
    let handshake = latest_dashboard.expect("dashboard published");
    assert_eq!(handshake.latest.trucks.len(), 4);
    assert_eq!(handshake.latest.tick, 5);
    let mut late_view = handshake.latest.trucks.clone();

    // Both observe the same subsequent updates
    for _ in 0..5 {
        let (snapshot, _) = engine.run_tick(Utc::now());
        hub.publish(Arc::new(snapshot));
        while let Ok(s) = early_rx.try_recv() {
            early_view = s.trucks.clone();
        }
        while let Ok(s) = late_rx.try_recv() {
            late_view = s.trucks.clone();
        }
    }

    assert_eq!(early_view.len(), late_view.len());
    for (a, b) in early_view.iter().zip(late_view.iter()) {
        assert_eq!(a.truck_id, b.truck_id);
        assert_eq!(a.speed, b.speed);
        assert_eq!(a.risk_level, b.risk_level);
    }
}

/// 50 sessions connecting mid-run all receive a handshake whose truck
/// count matches the live store at connect time, not tick 0, and all
/// observe the same next tick.
#[tokio::test]
async fn test_fifty_sessions_connect_mid_run() {
    let hub = BroadcastHub::new();
    let mut engine = engine_with(4, 31);

    let mut dashboard = None;
    for _ in 0..8 {
        let (snapshot, dash) = engine.run_tick(Utc::now());
        hub.publish(Arc::new(snapshot));
        dashboard = Some(dash);
    }
    let handshake = dashboard.expect("dashboard published");

    let mut sessions: Vec<_> = (0..50).map(|_| hub.subscribe()).collect();
    assert_eq!(hub.client_count(), 50);
    for _ in &sessions {
        // Each session's initial_state is built from the live dashboard
        assert_eq!(handshake.latest.trucks.len(), 4);
        assert_eq!(handshake.latest.tick, 8);
    }

    let (snapshot, _) = engine.run_tick(Utc::now());
    hub.publish(Arc::new(snapshot));
    for (rx, _guard) in &mut sessions {
        let update = rx.recv().await.expect("update delivered");
        assert_eq!(update.tick, 9);
        assert_eq!(update.trucks.len(), 4);
    }

    drop(sessions);
    assert_eq!(hub.client_count(), 0);
}

/// Stream updates carry only the alerts produced that tick, never the
/// full log.
#[test]
fn test_stream_updates_carry_new_alerts_only() {
    let mut engine = engine_with(3, 21);
    engine.state.trucks[0].temperature = 45.0;
    let (snapshot1, _) = engine.run_tick(Utc::now());
    assert!(!snapshot1.new_alerts.is_empty());

    // With no fresh transitions the next snapshot carries no repeats of
    // the temperature alert even though the log retains it
    engine.state.trucks[0].temperature = 45.0;
    let (snapshot2, dashboard2) = engine.run_tick(Utc::now());
    assert!(snapshot2
        .new_alerts
        .iter()
        .all(|a| a.category != AlertCategory::TemperatureHigh));
    assert!(dashboard2
        .alerts
        .iter()
        .any(|a| a.category == AlertCategory::TemperatureHigh));
}
