//! Risk Scorer
//!
//! Maps each truck's current readings to a 0-100 composite score and a risk
//! level, and aggregates a fleet-wide risk block. The scoring function is
//! monotone in each factor; level boundaries are total-ordered and
//! exhaustive, so every score maps to exactly one level.

use crate::config::RiskConfig;
use crate::config::ThresholdConfig;
use crate::types::{Alert, AlertSeverity, FleetRisk, RiskLevel, Truck};

/// Per-truck factor breakdown feeding the composite score.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskBreakdown {
    pub delay: f64,
    pub temperature: f64,
    pub speed: f64,
    pub alerts: f64,
}

/// Deterministic risk scoring over the current truck table.
pub struct RiskEngine {
    cfg: RiskConfig,
    thresholds: ThresholdConfig,
}

impl RiskEngine {
    pub fn new(cfg: RiskConfig, thresholds: ThresholdConfig) -> Self {
        Self { cfg, thresholds }
    }

    /// Score one truck from its readings and the alerts it produced this
    /// tick. Returns (score, level, explanation, breakdown).
    pub fn score_truck(
        &self,
        truck: &Truck,
        new_alerts: &[Alert],
    ) -> (f64, RiskLevel, String, RiskBreakdown) {
        let breakdown = RiskBreakdown {
            delay: self.delay_risk(truck),
            temperature: self.temperature_risk(truck),
            speed: self.speed_risk(truck),
            alerts: Self::alert_risk(new_alerts),
        };

        let score = (self.cfg.weight_delay * breakdown.delay
            + self.cfg.weight_temperature * breakdown.temperature
            + self.cfg.weight_speed * breakdown.speed
            + self.cfg.weight_alerts * breakdown.alerts)
            .clamp(0.0, 100.0);

        let level = self.level_for(score);
        let explanation = Self::explain(&truck.truck_id, level, &breakdown);
        (score, level, explanation, breakdown)
    }

    /// Bucket a 0-100 score into a level. Boundaries are half-open on the
    /// low side, so a boundary value always maps to the higher level.
    pub fn level_for(&self, score: f64) -> RiskLevel {
        if score >= self.cfg.critical_at {
            RiskLevel::Critical
        } else if score >= self.cfg.high_at {
            RiskLevel::High
        } else if score >= self.cfg.medium_at {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Fleet-wide aggregate over already-scored trucks: mean of per-truck
    /// scores, bucketed with the same boundaries.
    pub fn fleet_risk(&self, trucks: &[Truck]) -> FleetRisk {
        if trucks.is_empty() {
            return FleetRisk::default();
        }
        let overall_score =
            (trucks.iter().map(|t| t.risk_score).sum::<f64>() / trucks.len() as f64)
                .clamp(0.0, 100.0);
        FleetRisk {
            overall_score,
            overall_level: self.level_for(overall_score),
            high_risk_count: trucks.iter().filter(|t| t.risk_level.is_high_risk()).count(),
            critical_count: trucks
                .iter()
                .filter(|t| t.risk_level == RiskLevel::Critical)
                .count(),
            total_trucks: trucks.len(),
        }
    }

    /// Schedule risk grows once the saturating ETA passes four hours.
    fn delay_risk(&self, truck: &Truck) -> f64 {
        let eta_hours = truck.eta_minutes / 60.0;
        ((eta_hours - 4.0) * 15.0).clamp(0.0, 100.0)
    }

    /// Magnitude of temperature excursion beyond the warning band.
    fn temperature_risk(&self, truck: &Truck) -> f64 {
        let t = truck.temperature;
        let excursion = if t > self.thresholds.temp_warn_high_f {
            t - self.thresholds.temp_warn_high_f
        } else if t < self.thresholds.temp_warn_low_f {
            self.thresholds.temp_warn_low_f - t
        } else {
            return 0.0;
        };
        (excursion * 20.0).clamp(0.0, 100.0)
    }

    /// Speed inconsistency: stopped or crawling trucks score highest, then
    /// large deviation from the truck's own rolling average.
    fn speed_risk(&self, truck: &Truck) -> f64 {
        if truck.speed < 20.0 {
            80.0
        } else if truck.speed < 35.0 {
            50.0
        } else if (truck.speed - truck.rolling_avg_speed).abs() > 20.0 {
            40.0
        } else {
            0.0
        }
    }

    /// Severity of the worst alert the truck produced this tick.
    fn alert_risk(new_alerts: &[Alert]) -> f64 {
        new_alerts
            .iter()
            .map(|a| match a.severity {
                AlertSeverity::Critical => 80.0,
                AlertSeverity::Warning => 40.0,
                AlertSeverity::Info => 0.0,
            })
            .fold(0.0, f64::max)
    }

    fn explain(truck_id: &str, level: RiskLevel, breakdown: &RiskBreakdown) -> String {
        let mut factors = Vec::new();
        if breakdown.delay > 30.0 {
            factors.push(format!("significant delivery delay (risk {:.0}%)", breakdown.delay));
        }
        if breakdown.temperature > 30.0 {
            factors.push(format!(
                "temperature abnormality (risk {:.0}%)",
                breakdown.temperature
            ));
        }
        if breakdown.speed > 30.0 {
            factors.push(format!("speed inconsistency (risk {:.0}%)", breakdown.speed));
        }
        if breakdown.alerts > 30.0 {
            factors.push(format!("active alerts (risk {:.0}%)", breakdown.alerts));
        }

        if factors.is_empty() {
            format!("{truck_id} is operating within normal parameters.")
        } else {
            format!("{truck_id} risk is {level} due to: {}.", factors.join(", "))
        }
    }
}
