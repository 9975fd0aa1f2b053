#[cfg(test)]
#[path = "../../tests/unit/evolution/operators_test.rs"]
mod operators_test;

use crate::models::solution::{Stop, StopKind};
use crate::utils::Random;
use rustc_hash::FxHashMap;

/// An order preserving crossover (OX): a slice of the first parent is kept in place,
/// remaining positions are filled with the second parent's genes in their relative order.
pub(super) fn order_crossover(first: &[usize], second: &[usize], random: &dyn Random) -> Vec<usize> {
    let len = first.len();
    if len <= 2 {
        return first.to_vec();
    }

    let start = random.uniform_int(0, len as i32 - 2) as usize;
    let end = random.uniform_int(start as i32 + 1, len as i32) as usize;

    let mut taken = vec![false; len];
    first[start..end].iter().for_each(|&gene| taken[gene] = true);

    let mut filler = second.iter().filter(|&&gene| !taken[gene]);
    (0..len)
        .map(|position| {
            if (start..end).contains(&position) {
                first[position]
            } else {
                *filler.next().expect("crossover parents must be permutations of the same genes")
            }
        })
        .collect()
}

/// Swaps two random genes of the permutation.
pub(super) fn swap_mutation(permutation: &mut [usize], random: &dyn Random) {
    let len = permutation.len();
    if len < 2 {
        return;
    }

    let first = random.uniform_int(0, len as i32 - 1) as usize;
    let mut second = random.uniform_int(0, len as i32 - 1) as usize;
    if first == second {
        second = (second + 1) % len;
    }

    permutation.swap(first, second);
}

/// Reorders the permutation so that each pickup leg comes before the delivery leg
/// of the same order whenever both legs are present.
pub(super) fn repair(stops: &[Stop], permutation: Vec<usize>) -> Vec<usize> {
    let pickup_index: FxHashMap<&str, usize> = stops
        .iter()
        .enumerate()
        .filter(|(_, stop)| stop.kind == StopKind::Pickup)
        .map(|(index, stop)| (stop.order_id.as_str(), index))
        .collect();

    let mut emitted = vec![false; stops.len()];
    let mut deferred: FxHashMap<usize, usize> = FxHashMap::default();
    let mut result = Vec::with_capacity(permutation.len());

    for index in permutation {
        match stops[index].kind {
            StopKind::Pickup => {
                result.push(index);
                emitted[index] = true;
                if let Some(delivery) = deferred.remove(&index) {
                    result.push(delivery);
                    emitted[delivery] = true;
                }
            }
            StopKind::Delivery => match pickup_index.get(stops[index].order_id.as_str()) {
                Some(&pickup) if !emitted[pickup] => {
                    deferred.insert(pickup, index);
                }
                _ => {
                    result.push(index);
                    emitted[index] = true;
                }
            },
        }
    }

    result
}
