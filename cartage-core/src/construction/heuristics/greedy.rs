#[cfg(test)]
#[path = "../../../tests/unit/construction/heuristics/greedy_test.rs"]
mod greedy_test;

use crate::construction::heuristics::PlanningContext;
use crate::construction::PlanningFailure;
use crate::models::solution::{Stop, StopKind};
use crate::utils::compare_floats;
use std::cmp::Ordering;

struct InsertionGroup {
    order_id: String,
    priority: u8,
    window_start: f64,
    legs: Vec<Stop>,
}

/// Builds a stop sequence by taking orders by urgency and inserting their legs at the
/// cheapest feasible positions of the sequence built so far.
pub(crate) fn plan_greedy(ctx: &PlanningContext, stops: Vec<Stop>) -> Result<Vec<Stop>, PlanningFailure> {
    let mut sequence = Vec::with_capacity(stops.len());

    for group in group_stops(stops) {
        let candidate = match group.legs.as_slice() {
            [single] => insert_single(ctx, &sequence, single),
            [pickup, delivery] => insert_pair(ctx, &sequence, pickup, delivery),
            _ => None,
        };

        match candidate {
            Some(best) => sequence = best,
            None => return Err(PlanningFailure::InfeasibleInsertion { order_id: group.order_id }),
        }
    }

    Ok(sequence)
}

/// Groups stops by their order, most urgent orders first.
fn group_stops(stops: Vec<Stop>) -> Vec<InsertionGroup> {
    let mut groups: Vec<InsertionGroup> = Vec::new();

    for stop in stops {
        let window_start = stop.window.as_ref().map_or(f64::MAX, |window| window.start);
        match groups.iter_mut().find(|group| group.order_id == stop.order_id) {
            Some(group) => {
                group.window_start = group.window_start.min(window_start);
                // keep the pickup leg first within the group
                match stop.kind {
                    StopKind::Pickup => group.legs.insert(0, stop),
                    StopKind::Delivery => group.legs.push(stop),
                }
            }
            None => groups.push(InsertionGroup {
                order_id: stop.order_id.clone(),
                priority: stop.priority,
                window_start,
                legs: vec![stop],
            }),
        }
    }

    groups.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| compare_floats(a.window_start, b.window_start))
            .then_with(|| a.order_id.cmp(&b.order_id))
    });

    groups
}

/// Tries all insertion positions for a single leg, returns the cheapest feasible sequence.
fn insert_single(ctx: &PlanningContext, sequence: &[Stop], stop: &Stop) -> Option<Vec<Stop>> {
    let mut best: Option<(f64, Vec<Stop>)> = None;

    for index in 0..=sequence.len() {
        let mut candidate = sequence.to_vec();
        candidate.insert(index, stop.clone());

        best = select_cheaper(ctx, best, candidate);
    }

    best.map(|(_, sequence)| sequence)
}

/// Tries all position pairs for a pickup with its delivery, keeping pickup before delivery.
fn insert_pair(ctx: &PlanningContext, sequence: &[Stop], pickup: &Stop, delivery: &Stop) -> Option<Vec<Stop>> {
    let mut best: Option<(f64, Vec<Stop>)> = None;

    for pickup_index in 0..=sequence.len() {
        for delivery_index in (pickup_index + 1)..=(sequence.len() + 1) {
            let mut candidate = sequence.to_vec();
            candidate.insert(pickup_index, pickup.clone());
            candidate.insert(delivery_index, delivery.clone());

            best = select_cheaper(ctx, best, candidate);
        }
    }

    best.map(|(_, sequence)| sequence)
}

fn select_cheaper(
    ctx: &PlanningContext,
    best: Option<(f64, Vec<Stop>)>,
    candidate: Vec<Stop>,
) -> Option<(f64, Vec<Stop>)> {
    let summary = ctx.evaluate(&candidate);
    if summary.violations > 0 {
        return best;
    }

    match &best {
        Some((best_cost, _)) if compare_floats(summary.cost, *best_cost) != Ordering::Less => best,
        _ => Some((summary.cost, candidate)),
    }
}
