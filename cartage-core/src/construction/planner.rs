#[cfg(test)]
#[path = "../../tests/unit/construction/planner_test.rs"]
mod planner_test;

use crate::construction::heuristics::{plan_greedy, plan_nearest, PlanningContext};
use crate::evolution::{evolve_sequence, EvolutionConfig};
use crate::models::common::Timestamp;
use crate::models::problem::{CostModel, SpeedProfile, Vehicle};
use crate::models::solution::{Route, Stop};
use crate::utils::Environment;
use std::sync::Arc;

/// Specifies a strategy used to sequence stops into a route.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlanningStrategy {
    /// Insert order legs one by one at their cheapest feasible positions.
    GreedyInsertion,
    /// Repeatedly append the nearest feasible stop.
    NearestNeighbor,
    /// Search stop permutations with a bounded genetic algorithm.
    GeneticSearch,
}

/// Specifies why planning failed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PlanningFailure {
    /// No feasible position exists for a leg of the given order.
    InfeasibleInsertion {
        /// An id of the order which cannot be inserted.
        order_id: String,
    },
}

impl std::fmt::Display for PlanningFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanningFailure::InfeasibleInsertion { order_id } => {
                write!(f, "no feasible insertion for order '{order_id}'")
            }
        }
    }
}

impl std::error::Error for PlanningFailure {}

/// A result of route planning.
#[derive(Clone, Debug)]
pub struct PlanOutcome {
    /// A planned route.
    pub route: Route,
    /// Whether the route is a best effort which still violates some constraints.
    pub partial: bool,
}

/// Configures route planning.
#[derive(Clone, Debug)]
pub struct PlannerConfig {
    /// A stop count above which genetic search is preferred over construction heuristics.
    pub genetic_threshold: usize,
    /// A genetic search configuration.
    pub evolution: EvolutionConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { genetic_threshold: 8, evolution: EvolutionConfig::default() }
    }
}

/// Sequences stops into vehicle routes using one of interchangeable strategies.
pub struct RoutePlanner {
    profile: SpeedProfile,
    costs: CostModel,
    config: PlannerConfig,
    environment: Arc<Environment>,
}

impl RoutePlanner {
    /// Creates a new instance of `RoutePlanner`.
    pub fn new(profile: SpeedProfile, costs: CostModel, config: PlannerConfig, environment: Arc<Environment>) -> Self {
        Self { profile, costs, config, environment }
    }

    /// Creates a planner with default profile, cost model and configuration.
    pub fn default_with(environment: Arc<Environment>) -> Self {
        Self::new(SpeedProfile::default(), CostModel::default(), PlannerConfig::default(), environment)
    }

    /// Gets the speed profile used by the planner.
    pub fn profile(&self) -> &SpeedProfile {
        &self.profile
    }

    /// Selects a planning strategy based on the problem size.
    pub fn select_strategy(&self, stop_count: usize) -> PlanningStrategy {
        if stop_count > self.config.genetic_threshold {
            PlanningStrategy::GeneticSearch
        } else {
            PlanningStrategy::GreedyInsertion
        }
    }

    /// Sequences the given stops into a route for the vehicle leaving at the given time.
    pub fn plan(
        &self,
        stops: Vec<Stop>,
        vehicle: &Vehicle,
        departure: Timestamp,
        strategy: PlanningStrategy,
    ) -> Result<PlanOutcome, PlanningFailure> {
        self.plan_with(stops, vehicle, departure, strategy, &self.profile)
    }

    /// Same as [`RoutePlanner::plan`], but with an overridden speed profile, e.g. one
    /// degraded by reported traffic conditions.
    pub fn plan_with(
        &self,
        stops: Vec<Stop>,
        vehicle: &Vehicle,
        departure: Timestamp,
        strategy: PlanningStrategy,
        profile: &SpeedProfile,
    ) -> Result<PlanOutcome, PlanningFailure> {
        if stops.is_empty() {
            return Ok(PlanOutcome { route: Route::default(), partial: false });
        }

        let ctx = PlanningContext { vehicle, profile, costs: &self.costs, departure };

        let outcome = match strategy {
            PlanningStrategy::GreedyInsertion => {
                plan_greedy(&ctx, stops).map(|sequence| PlanOutcome { route: ctx.build_route(sequence), partial: false })
            }
            PlanningStrategy::NearestNeighbor => {
                plan_nearest(&ctx, stops).map(|sequence| PlanOutcome { route: ctx.build_route(sequence), partial: false })
            }
            PlanningStrategy::GeneticSearch => {
                let (sequence, partial) =
                    evolve_sequence(&ctx, stops, &self.config.evolution, self.environment.as_ref());
                Ok(PlanOutcome { route: ctx.build_route(sequence), partial })
            }
        }?;

        debug_assert!(outcome.partial || outcome.route.validate(&vehicle.capacity).is_ok());

        Ok(outcome)
    }
}
