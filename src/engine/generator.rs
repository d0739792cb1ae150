//! Telemetry Generator
//!
//! Advances every truck's physical and operational state one tick. Pure
//! state-advance: deterministic given a seeded RNG, no failure modes.
//! Out-of-range values are clamped rather than propagated.

use std::collections::HashMap;
use std::collections::VecDeque;

use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::config::defaults::SIM_TIME_COMPRESSION;
use crate::engine::predictor;
use crate::types::{RiskLevel, RouteLeg, RoutePhase, RouteType, Truck};

// ============================================================================
// Simulation Constants
// ============================================================================

/// Hard speed range (mph)
const SPEED_MIN: f64 = 0.0;
const SPEED_MAX: f64 = 85.0;
/// Reefer set point the temperature relaxes toward (°F)
const TEMP_SET_POINT: f64 = 33.0;
/// Hard temperature clamp range (°F)
const TEMP_MIN: f64 = 10.0;
const TEMP_MAX: f64 = 60.0;
/// Engine load clamp range (%)
const ENGINE_LOAD_MIN: f64 = 20.0;
const ENGINE_LOAD_MAX: f64 = 95.0;
/// Fuel level below which the truck refuels (explicit event)
const REFUEL_BELOW_PCT: f64 = 10.0;

// ============================================================================
// Route Catalog
// ============================================================================

/// Built-in route legs between major US cities.
fn route_catalog() -> Vec<RouteLeg> {
    let leg = |origin: &str, o: (f64, f64), dest: &str, d: (f64, f64), rt: RouteType| RouteLeg {
        origin: origin.to_string(),
        destination: dest.to_string(),
        origin_coords: o,
        dest_coords: d,
        route_type: rt,
    };
    vec![
        leg("Los Angeles", (34.0522, -118.2437), "Chicago", (41.8781, -87.6298), RouteType::Interstate),
        leg("Phoenix", (33.4484, -112.0740), "Seattle", (47.6062, -122.3321), RouteType::Interstate),
        leg("Dallas", (32.7767, -96.7970), "Denver", (39.7392, -104.9903), RouteType::Interstate),
        leg("New York", (40.7128, -74.0060), "Miami", (25.7617, -80.1918), RouteType::Interstate),
        leg("Atlanta", (33.7490, -84.3880), "Charlotte", (35.2271, -80.8431), RouteType::Urban),
        leg("Houston", (29.7604, -95.3698), "Denver", (39.7392, -104.9903), RouteType::Interstate),
        leg("San Francisco", (37.7749, -122.4194), "Las Vegas", (36.1699, -115.1398), RouteType::Urban),
        leg("Chicago", (41.8781, -87.6298), "Atlanta", (33.7490, -84.3880), RouteType::Interstate),
        leg("Seattle", (47.6062, -122.3321), "San Francisco", (37.7749, -122.4194), RouteType::Urban),
        leg("Denver", (39.7392, -104.9903), "Dallas", (32.7767, -96.7970), RouteType::Interstate),
    ]
}

const DRIVERS: &[(&str, &str)] = &[
    ("Johnathan Carter", "CA-8291"),
    ("Maria Santos", "AZ-4512"),
    ("James Wilson", "TX-7723"),
    ("Aisha Brown", "NY-3341"),
    ("Robert Kim", "GA-9102"),
    ("Carlos Rodriguez", "TX-1188"),
    ("Linda Wu", "CA-4492"),
    ("Priya Patel", "IL-5560"),
    ("Marcus Lee", "WA-2087"),
    ("Elena Novak", "CO-6614"),
];

const CARGO: &[&str] = &[
    "Electronics",
    "Vaccines (Cold Chain)",
    "Auto Parts",
    "Perishable Foods",
    "Textiles",
    "Petrochemicals",
    "Retail Goods",
    "Machinery",
    "Paper Products",
    "Frozen Seafood",
];

// ============================================================================
// Per-Truck Episode State
// ============================================================================

/// Episodic degradation window so the anomaly engine has real signal:
/// a timer counts down to an episode, the episode runs for a bounded
/// duration (speed decay, cold-chain temperature climb), then clears.
#[derive(Debug, Clone)]
struct Episode {
    ticks_until_next: u32,
    remaining: u32,
}

impl Episode {
    fn active(&self) -> bool {
        self.remaining > 0
    }
}

// ============================================================================
// Events
// ============================================================================

/// Explicit per-tick events surfaced by the generator.
///
/// Refuels are the only path by which fuel may rise; arrivals are the only
/// path to a new route leg.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Truck ids that transitioned `EnRoute -> Arrived` this tick
    pub arrivals: Vec<String>,
    /// Truck ids that refueled this tick (including depot refuel on reseed)
    pub refuels: Vec<String>,
}

// ============================================================================
// Generator
// ============================================================================

/// Advances the fleet one tick at a time.
pub struct TelemetryGenerator {
    rng: StdRng,
    episodes: HashMap<String, Episode>,
    catalog: Vec<RouteLeg>,
    next_leg: usize,
}

impl TelemetryGenerator {
    /// Seeded for reproducible runs; `None` seeds from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            episodes: HashMap::new(),
            catalog: route_catalog(),
            next_leg: 0,
        }
    }

    /// Seed `size` trucks from the route catalog with fresh baselines.
    ///
    /// Trucks start partway along their legs so the dashboard is
    /// interesting from the first tick.
    pub fn seed_fleet(&mut self, size: usize) -> Vec<Truck> {
        (0..size)
            .map(|i| {
                let leg = self.catalog[i % self.catalog.len()].clone();
                let (driver, license) = DRIVERS[i % DRIVERS.len()];
                let cargo = CARGO[i % CARGO.len()];
                let progress = self.rng.gen_range(0.1..0.6);
                let (latitude, longitude) = interpolate(&leg, progress);
                let mut truck = Truck {
                    truck_id: format!("T-{:03}", 102 + i * 101),
                    leg,
                    phase: RoutePhase::EnRoute,
                    progress,
                    latitude,
                    longitude,
                    speed: self.rng.gen_range(55.0..72.0),
                    temperature: self.rng.gen_range(30.0..36.0),
                    fuel_level: self.rng.gen_range(45.0..95.0),
                    engine_load: self.rng.gen_range(40.0..70.0),
                    driver: driver.to_string(),
                    driver_license: license.to_string(),
                    cargo: cargo.to_string(),
                    speed_window: VecDeque::new(),
                    eta_minutes: 0.0,
                    remaining_distance_miles: 0.0,
                    rolling_avg_speed: 0.0,
                    risk_score: 0.0,
                    risk_level: RiskLevel::Low,
                    explanation: String::new(),
                };
                truck.push_speed_sample(truck.speed);
                self.episodes.insert(
                    truck.truck_id.clone(),
                    Episode {
                        ticks_until_next: self.rng.gen_range(20..100),
                        remaining: 0,
                    },
                );
                truck
            })
            .collect()
    }

    /// Advance every truck one tick of `elapsed_secs` (wall clock).
    ///
    /// Arrived trucks are flagged in the returned events; the tick driver
    /// reseeds them via [`reseed`](Self::reseed) as an explicit transition.
    pub fn advance(&mut self, trucks: &mut [Truck], elapsed_secs: f64) -> TickEvents {
        let mut events = TickEvents::default();
        let sim_hours = elapsed_secs * SIM_TIME_COMPRESSION / 3600.0;

        for truck in trucks.iter_mut() {
            if truck.phase == RoutePhase::Arrived {
                continue;
            }

            let anomalous = self.step_episode(&truck.truck_id);
            self.step_speed(truck, anomalous);
            self.step_temperature(truck, anomalous);
            if self.step_fuel(truck) {
                events.refuels.push(truck.truck_id.clone());
            }
            self.step_engine_load(truck);
            self.step_position(truck, sim_hours);

            if truck.progress >= 1.0 {
                truck.progress = 1.0;
                truck.phase = RoutePhase::Arrived;
                debug!(truck_id = %truck.truck_id, destination = %truck.leg.destination, "Truck arrived");
                events.arrivals.push(truck.truck_id.clone());
            }
        }

        events
    }

    /// Reseed an arrived truck with a new leg and fresh sensor baselines.
    ///
    /// The `Arrived -> EnRoute` transition: new origin is the previous
    /// destination when the catalog continues from it, otherwise the next
    /// catalog leg. Includes a depot refuel (the caller records it as an
    /// explicit refuel event).
    pub fn reseed(&mut self, truck: &mut Truck) {
        let continuation = self
            .catalog
            .iter()
            .position(|leg| leg.origin == truck.leg.destination);
        let idx = continuation.unwrap_or_else(|| {
            self.next_leg = (self.next_leg + 1) % self.catalog.len();
            self.next_leg
        });
        truck.leg = self.catalog[idx].clone();
        truck.phase = RoutePhase::EnRoute;
        truck.progress = 0.0;
        let (lat, lon) = interpolate(&truck.leg, 0.0);
        truck.latitude = lat;
        truck.longitude = lon;
        truck.speed = self.rng.gen_range(55.0..70.0);
        truck.temperature = self.rng.gen_range(31.0..35.0);
        truck.fuel_level = self.rng.gen_range(85.0..95.0);
        truck.engine_load = self.rng.gen_range(40.0..65.0);
        truck.speed_window.clear();
        truck.push_speed_sample(truck.speed);
    }

    /// Tick the truck's episode state machine; returns whether an episode
    /// is active this tick.
    fn step_episode(&mut self, truck_id: &str) -> bool {
        let rng = &mut self.rng;
        let episode = self
            .episodes
            .entry(truck_id.to_string())
            .or_insert_with(|| Episode {
                ticks_until_next: rng.gen_range(20..100),
                remaining: 0,
            });

        if episode.active() {
            episode.remaining -= 1;
            return true;
        }
        if episode.ticks_until_next == 0 {
            episode.remaining = rng.gen_range(8..20);
            episode.ticks_until_next = rng.gen_range(100..300);
            return true;
        }
        episode.ticks_until_next -= 1;
        false
    }

    fn step_speed(&mut self, truck: &mut Truck, anomalous: bool) {
        if anomalous {
            truck.speed -= self.rng.gen_range(5.0..15.0);
        } else {
            // Relax toward a cruising band with correlated noise
            let cruise = match truck.leg.route_type {
                RouteType::Interstate => 64.0,
                RouteType::Urban => 48.0,
            };
            let noise = normal_sample(&mut self.rng, 0.0, 1.2);
            truck.speed += (cruise - truck.speed) * 0.2 + noise;
        }
        truck.speed = truck.speed.clamp(SPEED_MIN, SPEED_MAX);
    }

    fn step_temperature(&mut self, truck: &mut Truck, anomalous: bool) {
        if anomalous && truck.is_cold_chain() {
            // Compressor struggling: reefer temperature climbs
            truck.temperature += self.rng.gen_range(0.5..2.0);
        } else {
            let noise = normal_sample(&mut self.rng, 0.0, 0.3);
            truck.temperature += (TEMP_SET_POINT - truck.temperature) * 0.1 + noise;
        }
        truck.temperature = truck.temperature.clamp(TEMP_MIN, TEMP_MAX);
    }

    /// Monotone fuel burn; returns true when an explicit refuel happened.
    fn step_fuel(&mut self, truck: &mut Truck) -> bool {
        let load_factor = truck.engine_load / 70.0;
        truck.fuel_level -= self.rng.gen_range(0.02..0.06) * load_factor.max(0.5);
        truck.fuel_level = truck.fuel_level.max(0.0);
        if truck.fuel_level < REFUEL_BELOW_PCT {
            truck.fuel_level = self.rng.gen_range(70.0..95.0);
            return true;
        }
        false
    }

    fn step_engine_load(&mut self, truck: &mut Truck) {
        let target = 45.0 + (truck.speed / SPEED_MAX) * 40.0;
        let noise = normal_sample(&mut self.rng, 0.0, 3.0);
        truck.engine_load = (target + noise).clamp(ENGINE_LOAD_MIN, ENGINE_LOAD_MAX);
    }

    fn step_position(&mut self, truck: &mut Truck, sim_hours: f64) {
        let leg_miles = predictor::haversine_miles(
            truck.leg.origin_coords.0,
            truck.leg.origin_coords.1,
            truck.leg.dest_coords.0,
            truck.leg.dest_coords.1,
        )
        .max(1.0);
        truck.progress += truck.speed * sim_hours / leg_miles;
        let (lat, lon) = interpolate(&truck.leg, truck.progress.min(1.0));
        // GPS jitter
        truck.latitude = lat + self.rng.gen_range(-0.005..0.005);
        truck.longitude = lon + self.rng.gen_range(-0.005..0.005);
    }
}

/// Linear interpolation along a leg by progress fraction.
fn interpolate(leg: &RouteLeg, progress: f64) -> (f64, f64) {
    let p = progress.clamp(0.0, 1.0);
    let lat = leg.origin_coords.0 + (leg.dest_coords.0 - leg.origin_coords.0) * p;
    let lon = leg.origin_coords.1 + (leg.dest_coords.1 - leg.origin_coords.1) * p;
    (lat, lon)
}

/// Normal sample that degrades to the mean on degenerate parameters
/// instead of propagating an error out of a pure state-advance.
fn normal_sample(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    match Normal::new(mean, std_dev) {
        Ok(dist) => dist.sample(rng),
        Err(_) => mean,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(size: usize, seed: u64) -> (TelemetryGenerator, Vec<Truck>) {
        let mut generator = TelemetryGenerator::new(Some(seed));
        let trucks = generator.seed_fleet(size);
        (generator, trucks)
    }

    #[test]
    fn test_seed_fleet_size_and_ids() {
        let (_, trucks) = seeded(5, 7);
        assert_eq!(trucks.len(), 5);
        assert_eq!(trucks[0].truck_id, "T-102");
        // Ids unique
        let ids: std::collections::HashSet<_> =
            trucks.iter().map(|t| t.truck_id.clone()).collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_deterministic_given_seed() {
        let (mut g1, mut fleet1) = seeded(4, 42);
        let (mut g2, mut fleet2) = seeded(4, 42);
        for _ in 0..50 {
            g1.advance(&mut fleet1, 2.0);
            g2.advance(&mut fleet2, 2.0);
        }
        for (a, b) in fleet1.iter().zip(fleet2.iter()) {
            assert_eq!(a.speed, b.speed);
            assert_eq!(a.fuel_level, b.fuel_level);
            assert_eq!(a.progress, b.progress);
        }
    }

    #[test]
    fn test_values_stay_in_plausible_ranges() {
        let (mut generator, mut trucks) = seeded(6, 3);
        for _ in 0..300 {
            generator.advance(&mut trucks, 2.0);
            for truck in &trucks {
                assert!((SPEED_MIN..=SPEED_MAX).contains(&truck.speed));
                assert!((0.0..=100.0).contains(&truck.fuel_level));
                assert!((ENGINE_LOAD_MIN..=ENGINE_LOAD_MAX).contains(&truck.engine_load));
                assert!((TEMP_MIN..=TEMP_MAX).contains(&truck.temperature));
            }
        }
    }

    #[test]
    fn test_fuel_monotone_except_refuel() {
        let (mut generator, mut trucks) = seeded(3, 11);
        let mut prev: Vec<f64> = trucks.iter().map(|t| t.fuel_level).collect();
        for _ in 0..500 {
            let events = generator.advance(&mut trucks, 2.0);
            for (i, truck) in trucks.iter().enumerate() {
                if truck.fuel_level > prev[i] {
                    assert!(
                        events.refuels.contains(&truck.truck_id),
                        "fuel rose on {} without a refuel event",
                        truck.truck_id
                    );
                }
                prev[i] = truck.fuel_level;
            }
        }
    }

    #[test]
    fn test_arrival_transition_and_reseed_conserves_fleet() {
        let (mut generator, mut trucks) = seeded(3, 5);
        // Force one truck to the end of its leg
        trucks[0].progress = 0.999;
        trucks[0].speed = 80.0;
        let mut arrived = false;
        for _ in 0..20 {
            let events = generator.advance(&mut trucks, 2.0);
            if events.arrivals.contains(&trucks[0].truck_id) {
                assert_eq!(trucks[0].phase, RoutePhase::Arrived);
                arrived = true;
                let old_destination = trucks[0].leg.destination.clone();
                generator.reseed(&mut trucks[0]);
                assert_eq!(trucks[0].phase, RoutePhase::EnRoute);
                assert_eq!(trucks[0].progress, 0.0);
                // Continuation leg starts where the previous one ended
                assert_eq!(trucks[0].leg.origin, old_destination);
                break;
            }
        }
        assert!(arrived, "truck never arrived");
        assert_eq!(trucks.len(), 3);
    }
}
