use cartage_core::models::solution::Route;
use std::sync::Mutex;

/// A structured event emitted towards the external alerting collaborator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// Automated recovery for the order is exhausted.
    OrderEscalated {
        /// An id of the escalated order.
        order_id: String,
        /// A human readable reason.
        detail: String,
    },
    /// A vehicle went out of service while carrying orders.
    VehicleBreakdown {
        /// An id of the broken vehicle.
        vehicle_id: String,
        /// A human readable reason.
        detail: String,
    },
}

/// Receives alert events. Delivery and formatting are the collaborator's responsibility.
pub trait AlertSink: Send + Sync {
    /// Publishes a single event.
    fn publish(&self, event: Event);
}

/// Receives committed routes when their orders become ready for dispatch.
pub trait DispatchSink: Send + Sync {
    /// Announces that the order is sequenced within the vehicle route and leaves for delivery.
    fn dispatch(&self, order_id: &str, vehicle_id: &str, route: &Route);
}

/// A dispatch announcement kept by [`RecordingSink`].
#[derive(Clone, Debug)]
pub struct DispatchNote {
    /// An id of the dispatched order.
    pub order_id: String,
    /// An id of the carrying vehicle.
    pub vehicle_id: String,
    /// A committed route at the moment of dispatch.
    pub route: Route,
}

/// Collects events in memory. Used in tests and single process deployments.
#[derive(Default)]
pub struct RecordingSink {
    alerts: Mutex<Vec<Event>>,
    dispatches: Mutex<Vec<DispatchNote>>,
}

impl RecordingSink {
    /// Gets a copy of published alert events.
    pub fn alerts(&self) -> Vec<Event> {
        self.alerts.lock().expect("cannot lock alerts").clone()
    }

    /// Gets a copy of dispatch announcements.
    pub fn dispatches(&self) -> Vec<DispatchNote> {
        self.dispatches.lock().expect("cannot lock dispatches").clone()
    }
}

impl AlertSink for RecordingSink {
    fn publish(&self, event: Event) {
        self.alerts.lock().expect("cannot lock alerts").push(event);
    }
}

impl DispatchSink for RecordingSink {
    fn dispatch(&self, order_id: &str, vehicle_id: &str, route: &Route) {
        self.dispatches.lock().expect("cannot lock dispatches").push(DispatchNote {
            order_id: order_id.to_string(),
            vehicle_id: vehicle_id.to_string(),
            route: route.clone(),
        });
    }
}
