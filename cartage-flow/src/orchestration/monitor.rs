#[cfg(test)]
#[path = "../../tests/unit/orchestration/monitor_test.rs"]
mod monitor_test;

use rustc_hash::FxHashSet;

/// Specifies a road condition reported by the external traffic and weather monitor.
#[derive(Clone, Debug, PartialEq)]
pub enum ConditionKind {
    /// Travel is slowed down by the given factor.
    Delay {
        /// A slowdown factor, at least 1.
        factor: f64,
    },
    /// A road on the current route is closed, the remaining stops must be resequenced.
    Closure,
}

/// A condition signal affecting one vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionEvent {
    /// An id of the affected vehicle.
    pub vehicle_id: String,
    /// A reported condition.
    pub kind: ConditionKind,
}

/// Buffers condition signals between cycles. Signals are acted upon only at the start
/// of a cycle, and at most one replan per vehicle is requested per cycle.
#[derive(Default)]
pub struct ConditionMonitor {
    queue: Vec<ConditionEvent>,
}

impl ConditionMonitor {
    /// Accepts a condition signal.
    pub fn accept(&mut self, event: ConditionEvent) {
        self.queue.push(event);
    }

    /// Takes at most one buffered signal per vehicle, first one wins. Clears the buffer.
    pub fn drain(&mut self) -> Vec<ConditionEvent> {
        let mut vehicles = FxHashSet::default();

        std::mem::take(&mut self.queue)
            .into_iter()
            .filter(|event| vehicles.insert(event.vehicle_id.clone()))
            .collect()
    }
}
