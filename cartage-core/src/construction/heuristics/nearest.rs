#[cfg(test)]
#[path = "../../../tests/unit/construction/heuristics/nearest_test.rs"]
mod nearest_test;

use crate::construction::heuristics::PlanningContext;
use crate::construction::PlanningFailure;
use crate::models::problem::distance;
use crate::models::solution::{Stop, StopKind};
use crate::utils::compare_floats;
use rustc_hash::FxHashSet;
use std::cmp::Ordering;

/// Builds a stop sequence by repeatedly appending the nearest feasible unvisited stop,
/// breaking distance ties by the lower stop index.
pub(crate) fn plan_nearest(ctx: &PlanningContext, stops: Vec<Stop>) -> Result<Vec<Stop>, PlanningFailure> {
    let picked_in_input: FxHashSet<&str> = stops
        .iter()
        .filter(|stop| stop.kind == StopKind::Pickup)
        .map(|stop| stop.order_id.as_str())
        .collect();

    let mut visited = vec![false; stops.len()];
    let mut sequence: Vec<Stop> = Vec::with_capacity(stops.len());

    while sequence.len() < stops.len() {
        let location = sequence.last().map_or(ctx.vehicle.location, |stop| stop.location);
        let mut best: Option<(f64, usize)> = None;

        for (index, stop) in stops.iter().enumerate() {
            if visited[index] || !precedence_allows(&stops, &visited, &picked_in_input, stop) {
                continue;
            }

            sequence.push(stop.clone());
            let is_feasible = ctx.is_feasible(&sequence);
            sequence.pop();

            if !is_feasible {
                continue;
            }

            let leg_distance = distance(&location, &stop.location);
            let is_closer = match &best {
                Some((best_distance, _)) => compare_floats(leg_distance, *best_distance) == Ordering::Less,
                None => true,
            };
            if is_closer {
                best = Some((leg_distance, index));
            }
        }

        match best {
            Some((_, index)) => {
                visited[index] = true;
                sequence.push(stops[index].clone());
            }
            None => {
                let order_id = stops
                    .iter()
                    .zip(visited.iter())
                    .find(|(_, &visited)| !visited)
                    .map(|(stop, _)| stop.order_id.clone())
                    .unwrap_or_default();
                return Err(PlanningFailure::InfeasibleInsertion { order_id });
            }
        }
    }

    Ok(sequence)
}

/// A delivery leg must wait until its pickup leg is sequenced if the pickup is part of the input.
fn precedence_allows(stops: &[Stop], visited: &[bool], picked_in_input: &FxHashSet<&str>, stop: &Stop) -> bool {
    if stop.kind != StopKind::Delivery || !picked_in_input.contains(stop.order_id.as_str()) {
        return true;
    }

    stops
        .iter()
        .zip(visited.iter())
        .any(|(other, &visited)| visited && other.kind == StopKind::Pickup && other.order_id == stop.order_id)
}
