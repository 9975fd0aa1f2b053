#[cfg(test)]
#[path = "../../../tests/unit/models/problem/fleet_test.rs"]
mod fleet_test;

use crate::models::common::{GeoPoint, Load};
use crate::models::solution::Route;

/// A default bound for amount of orders a single vehicle can serve concurrently.
pub const DEFAULT_MAX_ORDERS: usize = 10;

/// Specifies a vehicle operational status.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum VehicleStatus {
    /// Vehicle is free and has no route.
    Idle,
    /// Vehicle has orders bound to it and may accept more.
    Assigned,
    /// Vehicle is carrying out its committed route.
    EnRoute,
    /// Vehicle is out of service and must not receive orders.
    Unavailable,
}

/// Represents a delivery vehicle.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// An unique vehicle id.
    pub id: String,
    /// A maximum load the vehicle can carry at once.
    pub capacity: Load,
    /// A current vehicle location.
    pub location: GeoPoint,
    /// A current operational status.
    pub status: VehicleStatus,
    /// An active route. Empty when the vehicle is idle.
    pub route: Route,
    /// A bound for amount of orders served concurrently.
    pub max_orders: usize,
}

impl Vehicle {
    /// Creates a new idle vehicle without a route.
    pub fn new(id: &str, capacity: Load, location: GeoPoint) -> Self {
        Self {
            id: id.to_string(),
            capacity,
            location,
            status: VehicleStatus::Idle,
            route: Route::default(),
            max_orders: DEFAULT_MAX_ORDERS,
        }
    }

    /// Checks whether the vehicle can be considered for new assignments.
    pub fn is_operational(&self) -> bool {
        matches!(self.status, VehicleStatus::Idle | VehicleStatus::Assigned)
    }

    /// Gets amount of distinct orders on the active route.
    pub fn order_count(&self) -> usize {
        self.route.order_ids().len()
    }

    /// Gets capacity left once the heaviest point of the active route is considered.
    pub fn remaining_capacity(&self) -> Load {
        self.capacity - self.route.max_onboard()
    }

    /// Checks whether the vehicle is operational and has room for the given extra load.
    pub fn can_accept(&self, load: &Load) -> bool {
        self.is_operational() && self.order_count() < self.max_orders && load.fits(&self.remaining_capacity())
    }
}
