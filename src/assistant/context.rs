//! Fleet context rendering for the AI collaborator
//!
//! Renders the latest dashboard snapshot to a compact text block the
//! collaborator receives alongside every question.

use crate::types::DashboardSnapshot;

/// Render the live fleet state as collaborator context.
pub fn render_context(dash: &DashboardSnapshot) -> String {
    let snapshot = &dash.latest;
    let mut ctx = String::from("=== LIVE FLEET DATA ===\n\n");

    if !snapshot.trucks.is_empty() {
        ctx.push_str("## Active Trucks:\n");
        for t in &snapshot.trucks {
            ctx.push_str(&format!(
                "- {}: Speed {:.1} mph, Temp {:.1}°F, Fuel {:.1}%, Route: {} -> {}, \
                 ETA: {:.0} min, Risk: {} ({:.1})\n",
                t.truck_id,
                t.speed,
                t.temperature,
                t.fuel_level,
                t.origin,
                t.destination,
                t.eta_minutes,
                t.risk_level,
                t.risk_score,
            ));
        }
    }

    if !dash.alerts.is_empty() {
        ctx.push_str("\n## Recent Alerts:\n");
        let start = dash.alerts.len().saturating_sub(10);
        for alert in &dash.alerts[start..] {
            ctx.push_str(&format!(
                "- [{}] {}: {}\n",
                alert.severity.to_string().to_uppercase(),
                alert.title,
                alert.message
            ));
        }
    }

    ctx.push_str(&format!(
        "\n## Fleet Overview:\n- Average Speed: {:.1} mph\n- Total Trucks: {}\n",
        snapshot.fleet_stats.avg_fleet_speed, snapshot.fleet_stats.total_trucks
    ));

    ctx.push_str(&format!(
        "\n## Risk Index:\n- Overall: {} (Score: {:.1})\n- High Risk Trucks: {}\n- Critical: {}\n",
        snapshot.fleet_risk.overall_level,
        snapshot.fleet_risk.overall_score,
        snapshot.fleet_risk.high_risk_count,
        snapshot.fleet_risk.critical_count,
    ));

    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FleetConfig;
    use crate::engine::Engine;

    #[test]
    fn test_context_names_trucks_and_risk() {
        let mut cfg = FleetConfig::default();
        cfg.stream.fleet_size = 3;
        cfg.stream.seed = Some(1);
        let mut engine = Engine::new(&cfg);
        let (_, dash) = engine.run_tick(chrono::Utc::now());

        let ctx = render_context(&dash);
        assert!(ctx.contains("Active Trucks"));
        assert!(ctx.contains("T-102"));
        assert!(ctx.contains("Risk Index"));
        assert!(ctx.contains("Fleet Overview"));
    }

    #[test]
    fn test_context_on_empty_dashboard() {
        let ctx = render_context(&DashboardSnapshot::default());
        assert!(!ctx.contains("Active Trucks"));
        assert!(ctx.contains("Total Trucks: 0"));
    }
}
