//! Binds unassigned orders to fleet vehicles minimizing the marginal route cost.

#[cfg(test)]
#[path = "../../tests/unit/assignment/assignment_test.rs"]
mod assignment_test;

use crate::construction::{PlanningStrategy, RoutePlanner};
use crate::models::common::{Cost, Timestamp};
use crate::models::problem::{Order, Vehicle};
use crate::models::solution::{Route, Stop};
use crate::utils::{compare_floats, parallel_collect, Environment};
use std::sync::Arc;

/// Specifies why no vehicle can take an order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssignmentFailure {
    /// Remaining capacity of every operational vehicle is too small for the order.
    NoCapacity,
    /// No vehicle admits a feasible insertion of the order legs.
    NoFeasibleVehicle,
}

impl std::fmt::Display for AssignmentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentFailure::NoCapacity => write!(f, "no vehicle has enough remaining capacity"),
            AssignmentFailure::NoFeasibleVehicle => write!(f, "no vehicle admits a feasible insertion"),
        }
    }
}

impl std::error::Error for AssignmentFailure {}

/// A pairing of an order with the vehicle chosen for it.
#[derive(Clone, Debug)]
pub struct AssignmentResult {
    /// An id of the assigned order.
    pub order_id: String,
    /// An id of the chosen vehicle.
    pub vehicle_id: String,
    /// A recomputed route of the chosen vehicle which includes the order legs.
    pub route: Route,
    /// A cost delta against the vehicle route without the order.
    pub marginal_cost: Cost,
}

/// Matches unassigned orders to available vehicles using tentative route insertions.
pub struct AssignmentOptimizer {
    planner: Arc<RoutePlanner>,
    environment: Arc<Environment>,
}

impl AssignmentOptimizer {
    /// Creates a new instance of `AssignmentOptimizer`.
    pub fn new(planner: Arc<RoutePlanner>, environment: Arc<Environment>) -> Self {
        Self { planner, environment }
    }

    /// Picks the vehicle which serves the order with the smallest marginal cost. Every candidate
    /// gets the order legs tentatively inserted into its current route via greedy insertion, so
    /// the estimate stays cheap enough to run per candidate. Ties are broken by vehicle id.
    pub fn assign(
        &self,
        order: &Order,
        fleet: &[Vehicle],
        departure: Timestamp,
    ) -> Result<AssignmentResult, AssignmentFailure> {
        let operational: Vec<&Vehicle> = fleet.iter().filter(|vehicle| vehicle.is_operational()).collect();

        let candidates: Vec<&Vehicle> =
            operational.iter().copied().filter(|vehicle| vehicle.can_accept(&order.load)).collect();

        if candidates.is_empty() {
            return Err(if operational.is_empty() {
                AssignmentFailure::NoFeasibleVehicle
            } else {
                AssignmentFailure::NoCapacity
            });
        }

        let evaluate = |vehicle: &&Vehicle| self.evaluate_candidate(order, vehicle, departure);

        let results = if candidates.len() > 1 && self.environment.parallelism > 1 {
            parallel_collect(&candidates, evaluate)
        } else {
            candidates.iter().map(evaluate).collect()
        };

        results
            .into_iter()
            .flatten()
            .min_by(|a, b| {
                compare_floats(a.marginal_cost, b.marginal_cost).then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
            })
            .ok_or(AssignmentFailure::NoFeasibleVehicle)
    }

    /// Re-validates a previously computed assignment against the live vehicle state: the binding
    /// is committable only when the vehicle still serves the same orders and stays operational.
    pub fn is_committable(&self, result: &AssignmentResult, vehicle: &Vehicle) -> bool {
        if !vehicle.is_operational() {
            return false;
        }

        let mut expected = result.route.order_ids();
        expected.retain(|id| *id != result.order_id);
        expected.sort();

        let mut actual = vehicle.route.order_ids();
        actual.sort();

        actual == expected
    }

    fn evaluate_candidate(&self, order: &Order, vehicle: &Vehicle, departure: Timestamp) -> Option<AssignmentResult> {
        let mut stops = vehicle.route.stops.clone();
        stops.push(Stop::pickup(order));
        stops.push(Stop::delivery(order));

        self.planner
            .plan(stops, vehicle, departure, PlanningStrategy::GreedyInsertion)
            .ok()
            .filter(|outcome| !outcome.partial)
            .map(|outcome| AssignmentResult {
                order_id: order.id.clone(),
                vehicle_id: vehicle.id.clone(),
                marginal_cost: outcome.route.cost - vehicle.route.cost,
                route: outcome.route,
            })
    }
}
