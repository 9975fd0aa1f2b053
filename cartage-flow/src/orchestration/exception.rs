#[cfg(test)]
#[path = "../../tests/unit/orchestration/exception_test.rs"]
mod exception_test;

use crate::state::{AlertSink, Event, FleetStore, OrderStore};
use cartage_core::models::common::Timestamp;
use cartage_core::models::problem::{OrderStatus, VehicleStatus};
use cartage_core::models::solution::Route;
use rustc_hash::FxHashSet;

/// Classifies a failure raised during a cycle or reported from outside.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FailureKind {
    /// No vehicle has enough remaining capacity.
    Capacity,
    /// No vehicle admits a feasible insertion of the order.
    NoFeasibleVehicle,
    /// Order legs cannot be sequenced into a feasible route.
    InfeasibleInsertion,
    /// A vehicle went out of service.
    VehicleBreakdown,
    /// A delivery time window cannot be met.
    TimeWindowViolation,
    /// External conditions delay the delivery.
    ConditionDelay,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            FailureKind::Capacity => "capacity",
            FailureKind::NoFeasibleVehicle => "no feasible vehicle",
            FailureKind::InfeasibleInsertion => "infeasible insertion",
            FailureKind::VehicleBreakdown => "vehicle breakdown",
            FailureKind::TimeWindowViolation => "time window violation",
            FailureKind::ConditionDelay => "condition delay",
        };
        write!(f, "{value}")
    }
}

/// A failure event to be handled by the exception policy.
#[derive(Clone, Debug)]
pub struct FailureEvent {
    /// A failure classification.
    pub kind: FailureKind,
    /// An affected order, if any.
    pub order_id: Option<String>,
    /// An affected vehicle, if any.
    pub vehicle_id: Option<String>,
}

/// An outcome applied to the affected entities.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// Order went back to the pending queue for another attempt.
    Requeued,
    /// Automated recovery is exhausted, the order needs manual intervention.
    Escalated,
    /// Failure is recorded without changing any entity.
    Noted,
}

/// An append-only record of one handled failure. Records are never mutated,
/// only superseded by newer ones.
#[derive(Clone, Debug)]
pub struct ExceptionRecord {
    /// An affected order, if any.
    pub order_id: Option<String>,
    /// An affected vehicle, if any.
    pub vehicle_id: Option<String>,
    /// A failure classification.
    pub kind: FailureKind,
    /// A retry counter of the order at the moment of handling.
    pub retry: u32,
    /// A moment the failure was handled.
    pub timestamp: Timestamp,
    /// An applied outcome.
    pub resolution: Resolution,
}

/// Retry bounds per failure kind before an order escalates.
#[derive(Clone, Debug)]
pub struct ExceptionPolicy {
    /// A bound for capacity and no-feasible-vehicle failures.
    pub capacity_retries: u32,
    /// A bound for infeasible insertion failures.
    pub feasibility_retries: u32,
    /// A bound for time window violations.
    pub window_retries: u32,
    /// A bound for external condition delays.
    pub condition_retries: u32,
}

impl Default for ExceptionPolicy {
    fn default() -> Self {
        Self { capacity_retries: 3, feasibility_retries: 2, window_retries: 2, condition_retries: 3 }
    }
}

impl ExceptionPolicy {
    fn max_retries(&self, kind: FailureKind) -> u32 {
        match kind {
            FailureKind::Capacity | FailureKind::NoFeasibleVehicle => self.capacity_retries,
            FailureKind::InfeasibleInsertion => self.feasibility_retries,
            FailureKind::TimeWindowViolation => self.window_retries,
            FailureKind::ConditionDelay => self.condition_retries,
            // breakdown requeues orders unconditionally, the bound is not consulted
            FailureKind::VehicleBreakdown => u32::MAX,
        }
    }
}

/// Applies the retry, reassignment and escalation policy to failure events. Handling is
/// idempotent: a failure event redelivered with the same order, kind and retry counter
/// changes nothing and produces no extra records.
pub struct ExceptionHandler {
    policy: ExceptionPolicy,
    records: Vec<ExceptionRecord>,
    seen: FxHashSet<(String, FailureKind, u32)>,
}

impl ExceptionHandler {
    /// Creates a new instance of `ExceptionHandler`.
    pub fn new(policy: ExceptionPolicy) -> Self {
        Self { policy, records: Vec::new(), seen: FxHashSet::default() }
    }

    /// Gets all records produced so far.
    pub fn records(&self) -> &[ExceptionRecord] {
        &self.records
    }

    /// Handles a single failure event, returns amount of records produced.
    pub fn handle(
        &mut self,
        event: &FailureEvent,
        orders: &dyn OrderStore,
        fleet: &dyn FleetStore,
        alerts: &dyn AlertSink,
        now: Timestamp,
    ) -> usize {
        match (event.kind, &event.order_id, &event.vehicle_id) {
            (FailureKind::VehicleBreakdown, _, Some(vehicle_id)) => {
                self.handle_breakdown(vehicle_id, orders, fleet, alerts, now)
            }
            (kind, Some(order_id), _) => self.handle_order_failure(kind, order_id, event, orders, alerts, now),
            (kind, None, Some(vehicle_id)) => self.note(kind, vehicle_id, now),
            _ => 0,
        }
    }

    /// Grounds the vehicle and requeues all of its active orders for reassignment.
    /// The vehicle receives no new orders until it is externally marked available again.
    fn handle_breakdown(
        &mut self,
        vehicle_id: &str,
        orders: &dyn OrderStore,
        fleet: &dyn FleetStore,
        alerts: &dyn AlertSink,
        now: Timestamp,
    ) -> usize {
        let Some(mut vehicle) = fleet.get_vehicle(vehicle_id) else {
            return 0;
        };

        let was_operational = vehicle.status != VehicleStatus::Unavailable;
        let affected = vehicle.route.order_ids();

        vehicle.status = VehicleStatus::Unavailable;
        vehicle.route = Route::default();
        fleet.put_vehicle(vehicle);

        let mut produced = 0;
        for order_id in &affected {
            let Some(mut order) = orders.get_order(order_id) else {
                continue;
            };

            if !self.seen.insert((order_id.clone(), FailureKind::VehicleBreakdown, order.retries)) {
                continue;
            }

            if order.transition(OrderStatus::Pending).is_err() {
                continue;
            }
            let retry = order.retries;
            orders.put_order(order);

            self.records.push(ExceptionRecord {
                order_id: Some(order_id.clone()),
                vehicle_id: Some(vehicle_id.to_string()),
                kind: FailureKind::VehicleBreakdown,
                retry,
                timestamp: now,
                resolution: Resolution::Requeued,
            });
            produced += 1;
        }

        if was_operational {
            alerts.publish(Event::VehicleBreakdown {
                vehicle_id: vehicle_id.to_string(),
                detail: format!("{} active orders requeued", affected.len()),
            });
        }

        produced
    }

    /// Retries a transient failure up to the configured bound, escalates afterwards.
    fn handle_order_failure(
        &mut self,
        kind: FailureKind,
        order_id: &str,
        event: &FailureEvent,
        orders: &dyn OrderStore,
        alerts: &dyn AlertSink,
        now: Timestamp,
    ) -> usize {
        let Some(mut order) = orders.get_order(order_id) else {
            return 0;
        };

        if order.status.is_terminal() {
            return 0;
        }

        if !self.seen.insert((order_id.to_string(), kind, order.retries)) {
            return 0;
        }

        let resolution = if order.retries < self.policy.max_retries(kind) {
            order.retries += 1;
            if order.status != OrderStatus::Pending && order.transition(OrderStatus::Pending).is_err() {
                return 0;
            }
            Resolution::Requeued
        } else {
            if order.status != OrderStatus::Failed && order.transition(OrderStatus::Failed).is_err() {
                return 0;
            }
            if order.transition(OrderStatus::Escalated).is_err() {
                return 0;
            }

            alerts.publish(Event::OrderEscalated {
                order_id: order_id.to_string(),
                detail: format!("{kind} persisted after {} retries", order.retries),
            });
            Resolution::Escalated
        };

        let retry = order.retries;
        orders.put_order(order);

        self.records.push(ExceptionRecord {
            order_id: Some(order_id.to_string()),
            vehicle_id: event.vehicle_id.clone(),
            kind,
            retry,
            timestamp: now,
            resolution,
        });

        1
    }

    /// Records a vehicle level failure which changes no entity state.
    fn note(&mut self, kind: FailureKind, vehicle_id: &str, now: Timestamp) -> usize {
        if !self.seen.insert((vehicle_id.to_string(), kind, 0)) {
            return 0;
        }

        self.records.push(ExceptionRecord {
            order_id: None,
            vehicle_id: Some(vehicle_id.to_string()),
            kind,
            retry: 0,
            timestamp: now,
            resolution: Resolution::Noted,
        });

        1
    }
}
