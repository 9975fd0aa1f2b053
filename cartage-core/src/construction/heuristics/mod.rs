//! Route construction heuristics and shared machinery to evaluate stop sequences.

#[cfg(test)]
#[path = "../../../tests/unit/construction/heuristics/context_test.rs"]
mod context_test;

mod greedy;
pub(crate) use self::greedy::plan_greedy;

mod nearest;
pub(crate) use self::nearest::plan_nearest;

use crate::models::common::{Cost, Schedule, Timestamp};
use crate::models::problem::{distance, duration, CostModel, SpeedProfile, Vehicle};
use crate::models::solution::{Route, Stop, StopKind};
use rustc_hash::FxHashSet;

/// Specifies an evaluation context data shared by all construction heuristics.
pub struct PlanningContext<'a> {
    /// A vehicle the route is planned for.
    pub vehicle: &'a Vehicle,
    /// A speed profile used to estimate travel durations.
    pub profile: &'a SpeedProfile,
    /// A cost model used to score the route.
    pub costs: &'a CostModel,
    /// A moment the vehicle leaves its current location.
    pub departure: Timestamp,
}

/// A result of a stop sequence evaluation.
pub struct SequenceSummary {
    /// A total sequence cost.
    pub cost: Cost,
    /// Schedules of each stop in sequence order.
    pub schedules: Vec<Schedule>,
    /// Amount of capacity overflows, late arrivals and precedence violations.
    pub violations: usize,
}

impl PlanningContext<'_> {
    /// Evaluates the stop sequence in a single pass: computes per stop schedules,
    /// the total cost, and counts constraint violations over every prefix.
    pub fn evaluate(&self, stops: &[Stop]) -> SequenceSummary {
        let picked_in_sequence: FxHashSet<&str> = stops
            .iter()
            .filter(|stop| stop.kind == StopKind::Pickup)
            .map(|stop| stop.order_id.as_str())
            .collect();

        let mut onboard = Route::initial_load_of(stops);
        let mut visited_pickups = FxHashSet::default();

        let mut location = self.vehicle.location;
        let mut time = self.departure;

        let mut cost = 0.;
        let mut violations = 0;
        let mut schedules = Vec::with_capacity(stops.len());

        for stop in stops {
            let leg_distance = distance(&location, &stop.location);
            let leg_duration = duration(&location, &stop.location, self.profile, time);

            let arrival = time + leg_duration;
            let mut waiting = 0.;

            if let Some(window) = &stop.window {
                if arrival > window.end {
                    violations += 1;
                }
                waiting = (window.start - arrival).max(0.);
            }

            match stop.kind {
                StopKind::Pickup => {
                    visited_pickups.insert(stop.order_id.as_str());
                    onboard = onboard + stop.load;
                }
                StopKind::Delivery => {
                    if picked_in_sequence.contains(stop.order_id.as_str())
                        && !visited_pickups.contains(stop.order_id.as_str())
                    {
                        violations += 1;
                    }
                    onboard = onboard - stop.load;
                }
            }

            if !onboard.fits(&self.vehicle.capacity) {
                violations += 1;
            }

            cost += self.costs.leg_cost(leg_distance, leg_duration, waiting);
            if stop.kind == StopKind::Delivery {
                cost += self.costs.priority_delay_cost(stop.priority, arrival - self.departure);
            }

            let departure = arrival + waiting + stop.service_time;
            schedules.push(Schedule::new(arrival, departure));

            location = stop.location;
            time = departure;
        }

        SequenceSummary { cost, schedules, violations }
    }

    /// Checks whether the sequence satisfies capacity and time windows at every prefix.
    pub fn is_feasible(&self, stops: &[Stop]) -> bool {
        self.evaluate(stops).violations == 0
    }

    /// Turns the sequence into a route with computed schedules and cost.
    pub fn build_route(&self, mut stops: Vec<Stop>) -> Route {
        let summary = self.evaluate(&stops);

        stops.iter_mut().zip(summary.schedules).for_each(|(stop, schedule)| stop.schedule = schedule);

        Route::new(stops, summary.cost)
    }
}
