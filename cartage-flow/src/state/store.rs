#[cfg(test)]
#[path = "../../tests/unit/state/store_test.rs"]
mod store_test;

use cartage_core::models::problem::{Order, OrderStatus, Vehicle};
use rustc_hash::FxHashMap;
use std::sync::RwLock;

/// Provides read and write access to orders. The store is the single source of truth
/// between orchestration cycles; the core does not cache its content any longer than that.
pub trait OrderStore: Send + Sync {
    /// Gets an order by its id.
    fn get_order(&self, id: &str) -> Option<Order>;

    /// Creates or replaces the order.
    fn put_order(&self, order: Order);

    /// Removes the order, returning it when it was present.
    fn remove_order(&self, id: &str) -> Option<Order>;

    /// Lists orders waiting for assignment.
    fn list_pending(&self) -> Vec<Order>;

    /// Lists all known orders.
    fn list_orders(&self) -> Vec<Order>;
}

/// Provides read and write access to the vehicle fleet.
pub trait FleetStore: Send + Sync {
    /// Gets a vehicle by its id.
    fn get_vehicle(&self, id: &str) -> Option<Vehicle>;

    /// Creates or replaces the vehicle.
    fn put_vehicle(&self, vehicle: Vehicle);

    /// Lists all known vehicles.
    fn list_vehicles(&self) -> Vec<Vehicle>;
}

/// An in-memory store used in tests and single process deployments.
#[derive(Default)]
pub struct InMemoryStore {
    orders: RwLock<FxHashMap<String, Order>>,
    vehicles: RwLock<FxHashMap<String, Vehicle>>,
}

impl OrderStore for InMemoryStore {
    fn get_order(&self, id: &str) -> Option<Order> {
        self.orders.read().expect("cannot lock orders").get(id).cloned()
    }

    fn put_order(&self, order: Order) {
        self.orders.write().expect("cannot lock orders").insert(order.id.clone(), order);
    }

    fn remove_order(&self, id: &str) -> Option<Order> {
        self.orders.write().expect("cannot lock orders").remove(id)
    }

    fn list_pending(&self) -> Vec<Order> {
        self.orders
            .read()
            .expect("cannot lock orders")
            .values()
            .filter(|order| order.status == OrderStatus::Pending)
            .cloned()
            .collect()
    }

    fn list_orders(&self) -> Vec<Order> {
        self.orders.read().expect("cannot lock orders").values().cloned().collect()
    }
}

impl FleetStore for InMemoryStore {
    fn get_vehicle(&self, id: &str) -> Option<Vehicle> {
        self.vehicles.read().expect("cannot lock vehicles").get(id).cloned()
    }

    fn put_vehicle(&self, vehicle: Vehicle) {
        self.vehicles.write().expect("cannot lock vehicles").insert(vehicle.id.clone(), vehicle);
    }

    fn list_vehicles(&self) -> Vec<Vehicle> {
        let mut vehicles: Vec<Vehicle> =
            self.vehicles.read().expect("cannot lock vehicles").values().cloned().collect();
        vehicles.sort_by(|a, b| a.id.cmp(&b.id));

        vehicles
    }
}
