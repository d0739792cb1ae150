//! Risk classification types

use serde::{Deserialize, Serialize};

/// Risk level for a single truck or the fleet as a whole.
///
/// Ordered: `Low < Medium < High < Critical`. Serialized in upper case to
/// match the wire format (`"LOW"`, `"MEDIUM"`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// HIGH and CRITICAL trucks count toward `high_risk_count`.
    pub fn is_high_risk(self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Fleet-wide risk aggregate, recomputed every tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetRisk {
    /// 0-100 aggregate over the current truck table
    pub overall_score: f64,
    /// Bucket of `overall_score`
    pub overall_level: RiskLevel,
    /// Trucks at HIGH or CRITICAL
    pub high_risk_count: usize,
    /// Trucks at CRITICAL
    pub critical_count: usize,
    /// Fleet size the aggregate was computed over
    pub total_trucks: usize,
}
