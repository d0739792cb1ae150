//! Rule-based fallback answerer
//!
//! Deterministic answers straight from the snapshot, used when no model
//! backend is configured or the collaborator fails. Keyword routing over
//! the question, specific truck ids first.

use crate::types::{DashboardSnapshot, TruckRecord};

/// Answer a question from the dashboard snapshot alone.
pub fn answer(question: &str, dash: &DashboardSnapshot) -> String {
    let q = question.to_lowercase();
    let trucks = &dash.latest.trucks;
    let risk = &dash.latest.fleet_risk;
    let stats = &dash.latest.fleet_stats;

    // Specific truck queries take priority over topic keywords
    if let Some(truck) = trucks.iter().find(|t| q.contains(&t.truck_id.to_lowercase())) {
        return truck_report(truck);
    }

    if q.contains("delay") || q.contains("late") {
        let delayed: Vec<&TruckRecord> = trucks
            .iter()
            .filter(|t| t.risk_level.is_high_risk())
            .collect();
        if delayed.is_empty() {
            return "All shipments are currently on schedule. No significant delays detected."
                .to_string();
        }
        let mut out = String::from("Delayed / high-risk shipments:\n");
        for t in delayed {
            out.push_str(&format!(
                "- {} ({} -> {}): risk {}, speed {:.0} mph, ETA {:.0} min\n",
                t.truck_id, t.origin, t.destination, t.risk_level, t.speed, t.eta_minutes
            ));
        }
        return out;
    }

    if q.contains("risk") || q.contains("danger") {
        return format!(
            "Fleet risk assessment:\n- Overall level: {}\n- Score: {:.1}/100\n\
             - High risk trucks: {}\n- Critical trucks: {}\n\n\
             Risk factors include delay magnitude, temperature abnormalities, \
             speed inconsistencies, and active alerts.",
            risk.overall_level, risk.overall_score, risk.high_risk_count, risk.critical_count
        );
    }

    if q.contains("alert") || q.contains("warning") {
        if dash.alerts.is_empty() {
            return "No active alerts at this time. All systems operating normally.".to_string();
        }
        let mut out = format!("Recent alerts ({}):\n", dash.alerts.len());
        let start = dash.alerts.len().saturating_sub(5);
        for alert in &dash.alerts[start..] {
            out.push_str(&format!(
                "- [{}] {}: {}\n",
                alert.severity.to_string().to_uppercase(),
                alert.title,
                alert.message
            ));
        }
        return out;
    }

    if q.contains("eta") || q.contains("arrival") || q.contains("arrive") {
        let mut out = String::from("ETA predictions:\n");
        for t in trucks {
            out.push_str(&format!(
                "- {} -> {}: {:.0} min (avg speed {:.1} mph)\n",
                t.truck_id, t.destination, t.eta_minutes, t.rolling_avg_speed_mph
            ));
        }
        return out;
    }

    if q.contains("help") || q.contains("what can") {
        return "I can help with:\n\
                - Truck status — ask about any truck (e.g. \"status of T-102\")\n\
                - Delays — \"which trucks are delayed?\"\n\
                - Risk — \"what's the current risk level?\"\n\
                - Alerts — \"show me recent alerts\"\n\
                - ETAs — \"when will trucks arrive?\"\n\
                - Fleet summary — \"give me an operations overview\""
            .to_string();
    }

    // Default: operations summary (also matches summary/overview/status)
    format!(
        "Fleet operations summary:\n- Active fleet: {} trucks\n- Average speed: {:.1} mph\n\
         - Risk level: {} ({:.1}/100)\n- Active alerts: {}\n- High risk shipments: {}\n\n\
         All trucks are monitored in real time with continuous ETA prediction and \
         anomaly detection.",
        stats.total_trucks,
        stats.avg_fleet_speed,
        risk.overall_level,
        risk.overall_score,
        dash.alerts.len(),
        risk.high_risk_count
    )
}

fn truck_report(t: &TruckRecord) -> String {
    format!(
        "{} status report:\n- Route: {} -> {}\n- Current speed: {:.1} mph\n\
         - Temperature: {:.1}°F\n- Fuel level: {:.1}%\n- ETA: {:.0} minutes\n\
         - Risk level: {} (score {:.1})\n- Driver: {}\n\n{}",
        t.truck_id,
        t.origin,
        t.destination,
        t.speed,
        t.temperature,
        t.fuel_level,
        t.eta_minutes,
        t.risk_level,
        t.risk_score,
        t.driver,
        t.explanation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FleetConfig;
    use crate::engine::Engine;

    fn dashboard() -> DashboardSnapshot {
        let mut cfg = FleetConfig::default();
        cfg.stream.fleet_size = 3;
        cfg.stream.seed = Some(12);
        let mut engine = Engine::new(&cfg);
        let (_, dash) = engine.run_tick(chrono::Utc::now());
        dash
    }

    #[test]
    fn test_specific_truck_question() {
        let dash = dashboard();
        let reply = answer("What's the status of t-102?", &dash);
        assert!(reply.contains("T-102 status report"));
        assert!(reply.contains("Driver"));
    }

    #[test]
    fn test_risk_question() {
        let dash = dashboard();
        let reply = answer("what's the current risk?", &dash);
        assert!(reply.contains("Fleet risk assessment"));
    }

    #[test]
    fn test_eta_question() {
        let dash = dashboard();
        let reply = answer("when do trucks arrive?", &dash);
        assert!(reply.contains("ETA predictions"));
        assert!(reply.contains("T-102"));
    }

    #[test]
    fn test_alerts_question_with_empty_log() {
        let mut dash = dashboard();
        dash.alerts.clear();
        let reply = answer("any alerts?", &dash);
        assert!(reply.contains("No active alerts"));
    }

    #[test]
    fn test_unmatched_question_gets_summary() {
        let dash = dashboard();
        let reply = answer("tell me something", &dash);
        assert!(reply.contains("Fleet operations summary"));
        assert!(reply.contains("3 trucks"));
    }
}
