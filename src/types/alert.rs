//! Alert types emitted by the anomaly engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity, mapped directly to the dashboard badge scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "info"),
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Rule category an alert belongs to.
///
/// Edge-triggering is tracked per truck per category: a category that stays
/// continuously fired produces one alert on the transition, not one per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    TemperatureHigh,
    TemperatureLow,
    SpeedDrop,
    FuelLow,
    Refuel,
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertCategory::TemperatureHigh => write!(f, "temperature_high"),
            AlertCategory::TemperatureLow => write!(f, "temperature_low"),
            AlertCategory::SpeedDrop => write!(f, "speed_drop"),
            AlertCategory::FuelLow => write!(f, "fuel_low"),
            AlertCategory::Refuel => write!(f, "refuel"),
        }
    }
}

/// One alert event, identified by generation order (`seq`).
///
/// Appended to a 200-entry FIFO log; consumed by the broadcast hub and the
/// REST alerts endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub seq: u64,
    pub truck_id: String,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_insight: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Info < AlertSeverity::Warning);
        assert!(AlertSeverity::Warning < AlertSeverity::Critical);
    }

    #[test]
    fn test_severity_wire_format() {
        assert_eq!(
            serde_json::to_string(&AlertSeverity::Critical).unwrap(),
            "\"critical\""
        );
    }

    #[test]
    fn test_alert_serializes_without_empty_insight() {
        let alert = Alert {
            seq: 1,
            truck_id: "T-102".to_string(),
            category: AlertCategory::FuelLow,
            severity: AlertSeverity::Warning,
            title: "Low Fuel on T-102".to_string(),
            message: "Fuel at 12.0%".to_string(),
            ai_insight: None,
            timestamp: Utc::now(),
        };
        let v = serde_json::to_value(&alert).unwrap();
        assert!(v.get("ai_insight").is_none());
        assert_eq!(v["severity"], "warning");
        assert_eq!(v["category"], "fuel_low");
    }
}
