//! Predictive Model
//!
//! Rolling ETA and speed averages, per truck and fleet-wide. Pure functions
//! over the current truck table; the only state is each truck's own rolling
//! speed window.

use crate::config::defaults::EARTH_RADIUS_MILES;
use crate::types::{FleetStats, RouteType, Truck};

/// Great-circle distance between two coordinates (miles).
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_MILES * 2.0 * a.sqrt().asin()
}

/// Refresh a truck's derived predictive fields from its current state.
///
/// Pushes the current speed into the rolling window, then computes remaining
/// distance to the destination and `eta_minutes = distance / avg * 60` with
/// the rolling average floored so ETA saturates when the truck is stopped.
pub fn update_truck(truck: &mut Truck) {
    truck.push_speed_sample(truck.speed);
    truck.rolling_avg_speed = truck.rolling_avg();
    truck.remaining_distance_miles = haversine_miles(
        truck.latitude,
        truck.longitude,
        truck.leg.dest_coords.0,
        truck.leg.dest_coords.1,
    );
    truck.eta_minutes = truck.remaining_distance_miles / truck.rolling_avg_speed * 60.0;
}

/// Fleet-wide speed statistics: simple mean of current speeds, partitioned
/// urban vs. interstate on the route-type attribute.
pub fn fleet_stats(trucks: &[Truck]) -> FleetStats {
    let mean = |speeds: &[f64]| {
        if speeds.is_empty() {
            0.0
        } else {
            speeds.iter().sum::<f64>() / speeds.len() as f64
        }
    };

    let all: Vec<f64> = trucks.iter().map(|t| t.speed).collect();
    let urban: Vec<f64> = trucks
        .iter()
        .filter(|t| t.leg.route_type == RouteType::Urban)
        .map(|t| t.speed)
        .collect();
    let interstate: Vec<f64> = trucks
        .iter()
        .filter(|t| t.leg.route_type == RouteType::Interstate)
        .map(|t| t.speed)
        .collect();

    FleetStats {
        avg_fleet_speed: mean(&all),
        urban_avg_speed: mean(&urban),
        interstate_avg_speed: mean(&interstate),
        total_trucks: trucks.len(),
    }
}

/// Fleet average ETA in minutes (history buffer sample).
pub fn fleet_avg_eta(trucks: &[Truck]) -> f64 {
    if trucks.is_empty() {
        return 0.0;
    }
    trucks.iter().map(|t| t.eta_minutes).sum::<f64>() / trucks.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generator::TelemetryGenerator;

    #[test]
    fn test_haversine_known_distance() {
        // Los Angeles -> Chicago is roughly 1745 miles great-circle
        let d = haversine_miles(34.0522, -118.2437, 41.8781, -87.6298);
        assert!((1700.0..1800.0).contains(&d), "distance: {d}");
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        let d = haversine_miles(40.0, -100.0, 40.0, -100.0);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_eta_saturates_at_speed_floor() {
        let mut generator = TelemetryGenerator::new(Some(1));
        let mut trucks = generator.seed_fleet(1);
        let truck = &mut trucks[0];
        truck.speed_window.clear();
        truck.speed = 0.0;
        update_truck(truck);
        // Floored at 1 mph: ETA equals remaining miles in minutes * 60, finite
        assert!(truck.eta_minutes.is_finite());
        assert!(
            (truck.eta_minutes - truck.remaining_distance_miles * 60.0).abs() < 1e-6,
            "eta {} for {} miles",
            truck.eta_minutes,
            truck.remaining_distance_miles
        );
    }

    #[test]
    fn test_fleet_stats_partition() {
        let mut generator = TelemetryGenerator::new(Some(2));
        let mut trucks = generator.seed_fleet(5);
        for truck in &mut trucks {
            truck.speed = 60.0;
        }
        // Catalog index 4 is an urban leg (Atlanta -> Charlotte)
        trucks[4].speed = 40.0;
        let stats = fleet_stats(&trucks);
        assert_eq!(stats.total_trucks, 5);
        assert!((stats.avg_fleet_speed - 56.0).abs() < 1e-9);
        assert!((stats.urban_avg_speed - 40.0).abs() < 1e-9);
        assert!((stats.interstate_avg_speed - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_fleet_stats_empty() {
        let stats = fleet_stats(&[]);
        assert_eq!(stats.avg_fleet_speed, 0.0);
        assert_eq!(stats.total_trucks, 0);
    }
}
