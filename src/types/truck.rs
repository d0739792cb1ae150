//! Truck state and wire record types

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::RiskLevel;
use crate::config::defaults::{AVG_SPEED_FLOOR_MPH, SPEED_WINDOW_CAPACITY};

/// Route classification used for partitioned fleet speed averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    Urban,
    Interstate,
}

/// Where a truck is in its route lifecycle.
///
/// `EnRoute -> Arrived` happens inside the generator when progress reaches
/// 1.0; the reseed transition (`Arrived -> EnRoute` with a fresh leg) is an
/// explicit, separately observable step so tests can assert it atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePhase {
    EnRoute,
    Arrived,
}

/// One origin/destination leg with fixed endpoint coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteLeg {
    pub origin: String,
    pub destination: String,
    /// (latitude, longitude)
    pub origin_coords: (f64, f64),
    pub dest_coords: (f64, f64),
    pub route_type: RouteType,
}

/// Live per-truck state, owned exclusively by the tick driver.
///
/// Mutated only by the generator and the predictive/risk stages during a
/// tick; everything downstream sees immutable [`TruckRecord`] copies.
#[derive(Debug, Clone)]
pub struct Truck {
    pub truck_id: String,
    pub leg: RouteLeg,
    pub phase: RoutePhase,
    /// Fraction of the current leg completed, 0.0..=1.0
    pub progress: f64,

    // Kinematics
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,

    // Payload sensors
    pub temperature: f64,
    pub fuel_level: f64,
    pub engine_load: f64,

    // Assignment
    pub driver: String,
    pub driver_license: String,
    pub cargo: String,

    /// Rolling window of recent speed samples (FIFO)
    pub speed_window: VecDeque<f64>,

    // Derived fields, refreshed by the predictive and risk stages each tick
    pub eta_minutes: f64,
    pub remaining_distance_miles: f64,
    pub rolling_avg_speed: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub explanation: String,
}

impl Truck {
    /// Push a speed sample, evicting the oldest once the window is full.
    pub fn push_speed_sample(&mut self, speed: f64) {
        if self.speed_window.len() >= SPEED_WINDOW_CAPACITY {
            self.speed_window.pop_front();
        }
        self.speed_window.push_back(speed);
    }

    /// Rolling average speed, floored so ETA saturates instead of diverging
    /// when a truck is stopped.
    pub fn rolling_avg(&self) -> f64 {
        if self.speed_window.is_empty() {
            return self.speed.max(AVG_SPEED_FLOOR_MPH);
        }
        let sum: f64 = self.speed_window.iter().sum();
        (sum / self.speed_window.len() as f64).max(AVG_SPEED_FLOOR_MPH)
    }

    /// Cold-chain cargo gets temperature-sensitive treatment in the generator.
    pub fn is_cold_chain(&self) -> bool {
        let c = self.cargo.to_lowercase();
        c.contains("vaccine") || c.contains("perishable") || c.contains("cold chain")
    }

    /// Immutable wire-format copy of the current state.
    pub fn record(&self) -> TruckRecord {
        TruckRecord {
            truck_id: self.truck_id.clone(),
            origin: self.leg.origin.clone(),
            destination: self.leg.destination.clone(),
            latitude: round(self.latitude, 6),
            longitude: round(self.longitude, 6),
            speed: round(self.speed, 1),
            temperature: round(self.temperature, 1),
            fuel_level: round(self.fuel_level, 1),
            engine_load: round(self.engine_load, 1),
            driver: self.driver.clone(),
            driver_license: self.driver_license.clone(),
            cargo: self.cargo.clone(),
            route_type: self.leg.route_type,
            progress_percent: round(self.progress * 100.0, 1),
            eta_minutes: round(self.eta_minutes, 0),
            remaining_distance_miles: round(self.remaining_distance_miles, 1),
            rolling_avg_speed_mph: round(self.rolling_avg_speed, 1),
            risk_score: round(self.risk_score, 1),
            risk_level: self.risk_level,
            explanation: self.explanation.clone(),
        }
    }
}

/// Wire-format truck record broadcast in every snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruckRecord {
    pub truck_id: String,
    pub origin: String,
    pub destination: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,
    pub temperature: f64,
    pub fuel_level: f64,
    pub engine_load: f64,
    pub driver: String,
    pub driver_license: String,
    pub cargo: String,
    pub route_type: RouteType,
    pub progress_percent: f64,
    pub eta_minutes: f64,
    pub remaining_distance_miles: f64,
    pub rolling_avg_speed_mph: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub explanation: String,
}

fn round(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
