#[cfg(test)]
#[path = "../../../tests/unit/models/solution/route_test.rs"]
mod route_test;

use crate::models::common::{Cost, Duration, GeoPoint, Load, Schedule, TimeWindow};
use crate::models::problem::Order;
use crate::utils::GenericResult;
use rustc_hash::{FxHashMap, FxHashSet};

/// A service time spent at a pickup stop.
pub const PICKUP_SERVICE_TIME: Duration = 300.;

/// A service time spent at a delivery stop.
pub const DELIVERY_SERVICE_TIME: Duration = 180.;

/// Specifies which order leg a stop serves.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StopKind {
    /// Goods are taken aboard.
    Pickup,
    /// Goods are handed over.
    Delivery,
}

/// A single stop of a route serving one leg of an order.
#[derive(Clone, Debug)]
pub struct Stop {
    /// An id of the served order.
    pub order_id: String,
    /// A leg type.
    pub kind: StopKind,
    /// A stop location.
    pub location: GeoPoint,
    /// A load of the served order.
    pub load: Load,
    /// A priority of the served order.
    pub priority: u8,
    /// A time window in which service is allowed to start.
    pub window: Option<TimeWindow>,
    /// A time spent at the stop.
    pub service_time: Duration,
    /// An estimated arrival and departure. Zeroed until the route is committed.
    pub schedule: Schedule,
}

impl Stop {
    /// Creates a pickup stop for the given order.
    pub fn pickup(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            kind: StopKind::Pickup,
            location: order.pickup,
            load: order.load,
            priority: order.priority,
            window: None,
            service_time: PICKUP_SERVICE_TIME,
            schedule: Schedule::new(0., 0.),
        }
    }

    /// Creates a delivery stop for the given order.
    pub fn delivery(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            kind: StopKind::Delivery,
            location: order.delivery,
            load: order.load,
            priority: order.priority,
            window: order.window.clone(),
            service_time: DELIVERY_SERVICE_TIME,
            schedule: Schedule::new(0., 0.),
        }
    }
}

/// An ordered sequence of stops committed to one vehicle.
#[derive(Clone, Debug, Default)]
pub struct Route {
    /// Stops in the order they are performed.
    pub stops: Vec<Stop>,
    /// A total route cost.
    pub cost: Cost,
}

impl Route {
    /// Creates a new instance of `Route`.
    pub fn new(stops: Vec<Stop>, cost: Cost) -> Self {
        Self { stops, cost }
    }

    /// Checks whether the route has no stops.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Gets ids of distinct orders served by the route in the order of their first leg.
    pub fn order_ids(&self) -> Vec<String> {
        let mut seen = FxHashSet::default();
        self.stops
            .iter()
            .filter(|stop| seen.insert(stop.order_id.clone()))
            .map(|stop| stop.order_id.clone())
            .collect()
    }

    /// Gets an index of the given order leg within the route.
    pub fn index_of(&self, order_id: &str, kind: StopKind) -> Option<usize> {
        self.stops.iter().position(|stop| stop.order_id == order_id && stop.kind == kind)
    }

    /// Gets a load which is already aboard when the route starts: delivery legs
    /// without a preceding pickup leg belong to orders picked up earlier.
    pub fn initial_load(&self) -> Load {
        Self::initial_load_of(&self.stops)
    }

    /// Same as [`Route::initial_load`], but for a plain stop sequence.
    pub fn initial_load_of(stops: &[Stop]) -> Load {
        let picked: FxHashSet<&str> = stops
            .iter()
            .filter(|stop| stop.kind == StopKind::Pickup)
            .map(|stop| stop.order_id.as_str())
            .collect();

        stops
            .iter()
            .filter(|stop| stop.kind == StopKind::Delivery && !picked.contains(stop.order_id.as_str()))
            .fold(Load::default(), |acc, stop| acc + stop.load)
    }

    /// Gets the maximum load carried aboard over all route prefixes.
    pub fn max_onboard(&self) -> Load {
        let mut onboard = self.initial_load();
        let mut max = onboard;

        for stop in &self.stops {
            onboard = match stop.kind {
                StopKind::Pickup => onboard + stop.load,
                StopKind::Delivery => onboard - stop.load,
            };
            max = max.max(&onboard);
        }

        max
    }

    /// Removes all legs of the given order keeping the rest of the route intact.
    /// Returns true when at least one leg was removed.
    pub fn remove_order(&mut self, order_id: &str) -> bool {
        let original = self.stops.len();
        self.stops.retain(|stop| stop.order_id != order_id);

        original != self.stops.len()
    }

    /// Verifies capacity and precedence invariants against the given vehicle capacity.
    pub fn validate(&self, capacity: &Load) -> GenericResult<()> {
        let mut leg_index = FxHashMap::default();
        for (index, stop) in self.stops.iter().enumerate() {
            if leg_index.insert((stop.order_id.clone(), stop.kind), index).is_some() {
                return Err(format!("route has duplicated {:?} leg of order '{}'", stop.kind, stop.order_id).into());
            }
        }

        for ((order_id, kind), &index) in leg_index.iter() {
            if *kind != StopKind::Delivery {
                continue;
            }

            if let Some(&pickup_index) = leg_index.get(&(order_id.clone(), StopKind::Pickup)) {
                if pickup_index > index {
                    return Err(format!("route delivers order '{order_id}' before picking it up").into());
                }
            }
        }

        if !self.max_onboard().fits(capacity) {
            return Err(format!("route exceeds vehicle capacity: {:?} > {:?}", self.max_onboard(), capacity).into());
        }

        Ok(())
    }
}
