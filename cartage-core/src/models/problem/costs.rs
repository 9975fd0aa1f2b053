#[cfg(test)]
#[path = "../../../tests/unit/models/problem/costs_test.rs"]
mod costs_test;

use crate::models::common::{Cost, Distance, Duration, GeoPoint, Timestamp};

const EARTH_RADIUS_KM: f64 = 6371.;

const SECONDS_PER_HOUR: f64 = 3600.;
const SECONDS_PER_MINUTE: f64 = 60.;

/// A default urban driving speed in km/h before traffic factors are applied.
pub const BASE_SPEED_KMH: f64 = 40.;

/// Specifies how travel speed depends on the departure time.
#[derive(Clone, Debug)]
pub enum SpeedProfile {
    /// A constant speed in km/h.
    Constant(f64),
    /// A base speed in km/h scaled down by an hour of day traffic factor.
    TimeOfDay {
        /// A speed on an empty road.
        base_kmh: f64,
    },
}

impl Default for SpeedProfile {
    fn default() -> Self {
        SpeedProfile::TimeOfDay { base_kmh: BASE_SPEED_KMH }
    }
}

impl SpeedProfile {
    /// Returns effective speed in km/h for the given departure time.
    pub fn speed_at(&self, departure: Timestamp) -> f64 {
        match self {
            SpeedProfile::Constant(kmh) => *kmh,
            SpeedProfile::TimeOfDay { base_kmh } => base_kmh / traffic_factor(departure),
        }
    }

    /// Returns a profile degraded by the given slowdown factor (at least 1).
    pub fn slowed(&self, factor: f64) -> Self {
        let factor = factor.max(1.);
        match self {
            SpeedProfile::Constant(kmh) => SpeedProfile::Constant(kmh / factor),
            SpeedProfile::TimeOfDay { base_kmh } => SpeedProfile::TimeOfDay { base_kmh: base_kmh / factor },
        }
    }
}

/// Returns traffic factor for the hour of day: rush hours are the slowest.
fn traffic_factor(departure: Timestamp) -> f64 {
    let hour = (departure / SECONDS_PER_HOUR).rem_euclid(24.) as u32;
    match hour {
        7..=9 | 17..=19 => 1.8,
        10..=16 => 1.2,
        _ => 1.,
    }
}

/// Gets distance between two points in kilometers using haversine formula.
pub fn distance(from: &GeoPoint, to: &GeoPoint) -> Distance {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.).sin().powi(2) + (d_lng / 2.).sin().powi(2) * lat1.cos() * lat2.cos();
    let c = 2. * a.sqrt().atan2((1. - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Gets travel duration in seconds between two points for the given departure time.
pub fn duration(from: &GeoPoint, to: &GeoPoint, profile: &SpeedProfile, departure: Timestamp) -> Duration {
    let speed = profile.speed_at(departure);
    if speed <= 0. {
        return f64::MAX;
    }

    distance(from, to) / speed * SECONDS_PER_HOUR
}

/// Weights which convert traveled distance, spent time and lateness into a scalar cost.
#[derive(Clone, Debug)]
pub struct CostModel {
    /// Cost per traveled kilometer.
    pub per_km: f64,
    /// Cost per minute of driving.
    pub per_minute: f64,
    /// Cost per minute of waiting for a time window to open.
    pub per_waiting_minute: f64,
    /// Cost per minute an urgent delivery stays undelivered, applied per priority
    /// level above the default one. Pushes urgent orders to the front of a route.
    pub per_priority_minute: f64,
    /// A flat penalty added by search heuristics for each constraint violation.
    pub violation_penalty: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self { per_km: 0.5, per_minute: 0.1, per_waiting_minute: 0.1, per_priority_minute: 0.02, violation_penalty: 1000. }
    }
}

impl CostModel {
    /// Gets cost of a single travel leg.
    pub fn leg_cost(&self, distance: Distance, duration: Duration, waiting: Duration) -> Cost {
        self.per_km * distance
            + self.per_minute * duration / SECONDS_PER_MINUTE
            + self.per_waiting_minute * waiting / SECONDS_PER_MINUTE
    }

    /// Gets a penalty for completing a delivery of the given priority that late
    /// after the route start.
    pub fn priority_delay_cost(&self, priority: u8, completion: Duration) -> Cost {
        self.per_priority_minute * priority.saturating_sub(1) as f64 * completion / SECONDS_PER_MINUTE
    }
}
