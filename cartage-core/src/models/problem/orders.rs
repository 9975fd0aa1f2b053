#[cfg(test)]
#[path = "../../../tests/unit/models/problem/orders_test.rs"]
mod orders_test;

use crate::models::common::{GeoPoint, Load, TimeWindow, Timestamp};
use crate::utils::GenericResult;

/// A maximum allowed order priority. Higher value means more urgent order.
pub const MAX_PRIORITY: u8 = 5;

/// A default order priority.
pub const DEFAULT_PRIORITY: u8 = 1;

/// Specifies an order lifecycle status.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OrderStatus {
    /// Order is admitted, but not bound to any vehicle yet.
    Pending,
    /// Order is bound to a vehicle.
    Assigned,
    /// Order legs are sequenced within the committed route of its vehicle.
    Routed,
    /// Order is dispatched and being carried out.
    InTransit,
    /// Order is delivered. The order is immutable from now on.
    Delivered,
    /// Order processing failed and is subject to the exception policy.
    Failed,
    /// Automated recovery is exhausted, manual intervention is required.
    Escalated,
}

impl OrderStatus {
    /// Checks whether the status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Escalated)
    }

    /// Checks whether transition to the next status is allowed by the lifecycle state machine.
    pub fn can_transition(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Assigned) => true,
            (Assigned, Routed) => true,
            (Routed, InTransit) => true,
            (InTransit, Delivered) => true,
            // requeue paths used by the exception policy
            (Assigned | Routed | InTransit | Failed, Pending) => true,
            // any non-delivered state can fail
            (Pending | Assigned | Routed | InTransit, Failed) => true,
            (Failed, Escalated) => true,
            _ => false,
        }
    }
}

/// A delivery order with its constraints and lifecycle status.
#[derive(Clone, Debug)]
pub struct Order {
    /// An unique order id.
    pub id: String,
    /// An id of the customer which created the order.
    pub customer_id: String,
    /// A pickup location.
    pub pickup: GeoPoint,
    /// A delivery location.
    pub delivery: GeoPoint,
    /// A load to be carried.
    pub load: Load,
    /// An order priority within `[DEFAULT_PRIORITY, MAX_PRIORITY]` range.
    pub priority: u8,
    /// An optional delivery time window.
    pub window: Option<TimeWindow>,
    /// A current lifecycle status.
    pub status: OrderStatus,
    /// A moment when the order was admitted.
    pub created_at: Timestamp,
    /// Amount of automated recovery attempts spent on the order.
    pub retries: u32,
}

impl Order {
    /// Creates a new pending order with default priority and no time window.
    pub fn new(id: &str, customer_id: &str, pickup: GeoPoint, delivery: GeoPoint, load: Load) -> Self {
        Self {
            id: id.to_string(),
            customer_id: customer_id.to_string(),
            pickup,
            delivery,
            load,
            priority: DEFAULT_PRIORITY,
            window: None,
            status: OrderStatus::Pending,
            created_at: 0.,
            retries: 0,
        }
    }

    /// Moves the order to the next status checking the lifecycle state machine.
    pub fn transition(&mut self, next: OrderStatus) -> GenericResult<()> {
        if !self.status.can_transition(next) {
            return Err(format!("order '{}': invalid transition {:?} -> {:?}", self.id, self.status, next).into());
        }

        self.status = next;

        Ok(())
    }
}
