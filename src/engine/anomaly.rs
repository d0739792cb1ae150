//! Anomaly & Alert Engine
//!
//! Evaluates independent threshold rules against each truck every tick.
//! Rules are edge-triggered: per truck per rule category the engine
//! remembers the last fired severity, emits an alert only on the
//! not-fired -> fired transition (or an escalation within it), and clears
//! the memory when the condition clears. A rule that cannot evaluate for a
//! truck this tick is skipped and logged, never aborting the tick.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::defaults::SPEED_DROP_MIN_SAMPLES;
use crate::config::ThresholdConfig;
use crate::types::{Alert, AlertCategory, AlertSeverity, Truck};

/// Per-truck edge-trigger memory: category -> severity currently fired.
type FiredMap = HashMap<AlertCategory, AlertSeverity>;

/// Edge-triggered rule evaluation over the fleet.
pub struct AnomalyEngine {
    cfg: ThresholdConfig,
    fired: HashMap<String, FiredMap>,
    next_seq: u64,
}

impl AnomalyEngine {
    pub fn new(cfg: ThresholdConfig) -> Self {
        Self {
            cfg,
            fired: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Evaluate all rules for one truck; returns the new alerts (at most one
    /// per rule category). `refueled` marks the generator's explicit refuel
    /// event, which is inherently edge-triggered.
    pub fn evaluate(
        &mut self,
        truck: &Truck,
        refueled: bool,
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();

        let conditions = [
            (AlertCategory::TemperatureHigh, self.check_temperature_high(truck)),
            (AlertCategory::TemperatureLow, self.check_temperature_low(truck)),
            (AlertCategory::SpeedDrop, self.check_speed_drop(truck)),
            (AlertCategory::FuelLow, self.check_fuel_low(truck)),
        ];

        for (category, condition) in conditions {
            let previous = self
                .fired
                .get(&truck.truck_id)
                .and_then(|m| m.get(&category))
                .copied();

            match condition {
                Some(severity) => {
                    // Emit only on transition into fired, or escalation
                    if previous.map_or(true, |p| severity > p) {
                        alerts.push(self.build_alert(truck, category, severity, now));
                    }
                    self.fired
                        .entry(truck.truck_id.clone())
                        .or_default()
                        .insert(category, severity);
                }
                None => {
                    if let Some(map) = self.fired.get_mut(&truck.truck_id) {
                        map.remove(&category);
                    }
                }
            }
        }

        if refueled {
            alerts.push(self.build_alert(truck, AlertCategory::Refuel, AlertSeverity::Info, now));
        }

        alerts
    }

    fn check_temperature_high(&self, truck: &Truck) -> Option<AlertSeverity> {
        let t = truck.temperature;
        if t > self.cfg.temp_critical_high_f {
            Some(AlertSeverity::Critical)
        } else if t > self.cfg.temp_warn_high_f {
            Some(AlertSeverity::Warning)
        } else {
            None
        }
    }

    fn check_temperature_low(&self, truck: &Truck) -> Option<AlertSeverity> {
        let t = truck.temperature;
        if t < self.cfg.temp_critical_low_f {
            Some(AlertSeverity::Critical)
        } else if t < self.cfg.temp_warn_low_f {
            Some(AlertSeverity::Warning)
        } else {
            None
        }
    }

    /// Speed drop relative to the truck's own rolling average. Skips (with a
    /// log) until the window has enough samples to make the average
    /// meaningful.
    fn check_speed_drop(&self, truck: &Truck) -> Option<AlertSeverity> {
        if truck.speed_window.len() < SPEED_DROP_MIN_SAMPLES {
            debug!(truck_id = %truck.truck_id, "speed_drop rule skipped: window too small");
            return None;
        }
        let avg = truck.rolling_avg();
        let drop_frac = (avg - truck.speed) / avg;
        if drop_frac > self.cfg.speed_drop_critical_frac {
            Some(AlertSeverity::Critical)
        } else if drop_frac > self.cfg.speed_drop_warn_frac {
            Some(AlertSeverity::Warning)
        } else {
            None
        }
    }

    fn check_fuel_low(&self, truck: &Truck) -> Option<AlertSeverity> {
        if truck.fuel_level < self.cfg.fuel_low_pct {
            Some(AlertSeverity::Warning)
        } else {
            None
        }
    }

    fn build_alert(
        &mut self,
        truck: &Truck,
        category: AlertCategory,
        severity: AlertSeverity,
        now: DateTime<Utc>,
    ) -> Alert {
        self.next_seq += 1;
        let id = &truck.truck_id;
        let (title, message, ai_insight) = match category {
            AlertCategory::TemperatureHigh => (
                format!("Temperature Spike on {id}"),
                format!(
                    "Sensor reports {:.1}°F — above the {:.0}°F safe threshold. Cargo at risk.",
                    truck.temperature, self.cfg.temp_warn_high_f
                ),
                Some(format!(
                    "Reefer on {id} reporting {:.1}°F. Possible compressor fault; cargo at risk if not addressed soon.",
                    truck.temperature
                )),
            ),
            AlertCategory::TemperatureLow => (
                format!("Low Temperature on {id}"),
                format!(
                    "Temperature dropped to {:.1}°F, below the {:.0}°F safe minimum.",
                    truck.temperature, self.cfg.temp_warn_low_f
                ),
                Some(format!(
                    "Cold chain temperature {:.1}°F is below range. Recommend checking insulation integrity.",
                    truck.temperature
                )),
            ),
            AlertCategory::SpeedDrop => (
                format!("Sudden Speed Drop on {id}"),
                format!(
                    "Speed {:.0} mph is well below the rolling average of {:.0} mph. Possible obstruction or mechanical issue.",
                    truck.speed,
                    truck.rolling_avg()
                ),
                Some(format!(
                    "Telematics show {id} running {:.0}% below its rolling average. If speed stays low, dispatch a maintenance check.",
                    ((truck.rolling_avg() - truck.speed) / truck.rolling_avg() * 100.0).max(0.0)
                )),
            ),
            AlertCategory::FuelLow => (
                format!("Low Fuel on {id}"),
                format!(
                    "Fuel at {:.1}%, below the {:.0}% reserve threshold.",
                    truck.fuel_level, self.cfg.fuel_low_pct
                ),
                None,
            ),
            AlertCategory::Refuel => (
                format!("Refuel Stop for {id}"),
                format!("Truck refueled to {:.1}%.", truck.fuel_level),
                None,
            ),
        };

        Alert {
            seq: self.next_seq,
            truck_id: truck.truck_id.clone(),
            category,
            severity,
            title,
            message,
            ai_insight,
            timestamp: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generator::TelemetryGenerator;

    fn engine() -> AnomalyEngine {
        AnomalyEngine::new(ThresholdConfig::default())
    }

    fn test_truck() -> Truck {
        let mut generator = TelemetryGenerator::new(Some(9));
        let mut trucks = generator.seed_fleet(1);
        let mut truck = trucks.remove(0);
        truck.temperature = 33.0;
        truck.fuel_level = 80.0;
        truck.speed = 60.0;
        truck.speed_window.clear();
        for _ in 0..5 {
            truck.push_speed_sample(60.0);
        }
        truck
    }

    #[test]
    fn test_nominal_truck_produces_no_alerts() {
        let mut engine = engine();
        let truck = test_truck();
        assert!(engine.evaluate(&truck, false, Utc::now()).is_empty());
    }

    #[test]
    fn test_temperature_tiers() {
        let mut engine = engine();
        let mut truck = test_truck();

        truck.temperature = 39.0; // outside warn band only
        let alerts = engine.evaluate(&truck, false, Utc::now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
        assert_eq!(alerts[0].category, AlertCategory::TemperatureHigh);

        let mut engine = super::AnomalyEngine::new(ThresholdConfig::default());
        truck.temperature = 45.0; // outside critical band
        let alerts = engine.evaluate(&truck, false, Utc::now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_edge_trigger_fires_once_across_five_ticks() {
        let mut engine = engine();
        let mut truck = test_truck();
        truck.temperature = 45.0;

        let mut total = 0;
        for _ in 0..5 {
            total += engine.evaluate(&truck, false, Utc::now()).len();
        }
        assert_eq!(total, 1, "continuously-fired rule must alert exactly once");
    }

    #[test]
    fn test_refire_after_condition_clears() {
        let mut engine = engine();
        let mut truck = test_truck();

        truck.temperature = 45.0;
        assert_eq!(engine.evaluate(&truck, false, Utc::now()).len(), 1);

        truck.temperature = 33.0; // condition clears, memory resets
        assert!(engine.evaluate(&truck, false, Utc::now()).is_empty());

        truck.temperature = 45.0;
        assert_eq!(engine.evaluate(&truck, false, Utc::now()).len(), 1);
    }

    #[test]
    fn test_escalation_emits_again() {
        let mut engine = engine();
        let mut truck = test_truck();

        truck.temperature = 39.0; // warning
        assert_eq!(engine.evaluate(&truck, false, Utc::now()).len(), 1);

        truck.temperature = 45.0; // escalates to critical
        let alerts = engine.evaluate(&truck, false, Utc::now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);

        // De-escalation back to warning is not a fresh transition
        truck.temperature = 39.0;
        assert!(engine.evaluate(&truck, false, Utc::now()).is_empty());
    }

    #[test]
    fn test_speed_drop_rule_relative_to_rolling_average() {
        let mut engine = engine();
        let mut truck = test_truck();

        truck.speed = 40.0; // 33% below the 60 mph average
        let alerts = engine.evaluate(&truck, false, Utc::now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, AlertCategory::SpeedDrop);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);

        let mut engine = super::AnomalyEngine::new(ThresholdConfig::default());
        truck.speed = 20.0; // 66% below
        let alerts = engine.evaluate(&truck, false, Utc::now());
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_speed_drop_skipped_with_small_window() {
        let mut engine = engine();
        let mut truck = test_truck();
        truck.speed_window.clear();
        truck.push_speed_sample(60.0);
        truck.speed = 5.0;
        // Rule skipped for this truck this tick, no abort
        assert!(engine.evaluate(&truck, false, Utc::now()).is_empty());
    }

    #[test]
    fn test_fuel_low_and_refuel_event() {
        let mut engine = engine();
        let mut truck = test_truck();

        truck.fuel_level = 12.0;
        let alerts = engine.evaluate(&truck, false, Utc::now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, AlertCategory::FuelLow);

        // Refuel clears the condition and surfaces an info alert
        truck.fuel_level = 90.0;
        let alerts = engine.evaluate(&truck, true, Utc::now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, AlertCategory::Refuel);
        assert_eq!(alerts[0].severity, AlertSeverity::Info);
    }

    #[test]
    fn test_alert_seq_is_generation_order() {
        let mut engine = engine();
        let mut truck = test_truck();
        truck.temperature = 45.0;
        truck.fuel_level = 10.0;
        let alerts = engine.evaluate(&truck, false, Utc::now());
        assert_eq!(alerts.len(), 2);
        assert!(alerts[0].seq < alerts[1].seq);
    }
}
