#[cfg(test)]
#[path = "../../tests/unit/orchestration/supervisor_test.rs"]
mod supervisor_test;

use crate::intake::{OrderIntake, OrderPayload, ValidationError};
use crate::orchestration::{
    ConditionEvent, ConditionKind, ConditionMonitor, ExceptionHandler, ExceptionPolicy, ExceptionRecord,
    FailureEvent, FailureKind,
};
use crate::state::{AlertSink, DispatchSink, FleetStore, OrderStore};
use cartage_core::assignment::{AssignmentFailure, AssignmentOptimizer};
use cartage_core::construction::RoutePlanner;
use cartage_core::models::common::Timestamp;
use cartage_core::models::problem::{Order, OrderStatus, SpeedProfile, Vehicle, VehicleStatus};
use cartage_core::models::solution::{Route, Stop};
use cartage_core::utils::{compare_floats, parallel_collect, Environment, GenericResult};
use std::sync::Arc;

/// Counters describing the work done by a single orchestration cycle.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CycleReport {
    /// Amount of orders bound to a vehicle.
    pub assigned: usize,
    /// Amount of orders which got their route committed.
    pub routed: usize,
    /// Amount of orders handed over for dispatch.
    pub dispatched: usize,
    /// Amount of orders confirmed as delivered.
    pub delivered: usize,
    /// Amount of vehicles which got their remaining stops replanned.
    pub replanned: usize,
    /// Amount of orders withdrawn on request.
    pub withdrawn: usize,
    /// Amount of orders left waiting for the next cycle.
    pub deferred: usize,
    /// Amount of exception records produced within the cycle.
    pub exceptions: usize,
}

/// Tunables of the orchestration cycle.
#[derive(Clone, Debug)]
pub struct CycleConfig {
    /// Amount of extra commit attempts when a vehicle changes between
    /// candidate evaluation and commit.
    pub commit_retries: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self { commit_retries: 1 }
    }
}

/// An order level outcome reported by the external dispatch and tracking collaborator.
#[derive(Clone, Debug)]
pub enum DeliverySignal {
    /// Order was handed over to the customer.
    Delivered {
        /// An id of the delivered order.
        order_id: String,
    },
    /// Order could not be carried out.
    Failed {
        /// An id of the failed order.
        order_id: String,
        /// A failure classification.
        kind: FailureKind,
    },
}

/// The supervisory controller. It owns typed handles to the fixed capability set:
/// intake, assignment optimizer, route planner, condition monitor and exception handler,
/// and advances all orders through their lifecycle one cycle at a time.
pub struct Supervisor {
    orders: Arc<dyn OrderStore>,
    fleet: Arc<dyn FleetStore>,
    alerts: Arc<dyn AlertSink>,
    dispatcher: Arc<dyn DispatchSink>,
    intake: OrderIntake,
    planner: Arc<RoutePlanner>,
    optimizer: AssignmentOptimizer,
    monitor: ConditionMonitor,
    exceptions: ExceptionHandler,
    config: CycleConfig,
    environment: Arc<Environment>,
    signals: Vec<DeliverySignal>,
    breakdowns: Vec<String>,
    withdrawals: Vec<String>,
}

impl Supervisor {
    /// Validates the raw payload and admits it as a pending order.
    pub fn submit(&self, payload: &OrderPayload, now: Timestamp) -> Result<Order, ValidationError> {
        let order = self.intake.admit(payload, now)?;
        self.orders.put_order(order.clone());

        (self.environment.logger)(&format!("order '{}' admitted", order.id));

        Ok(order)
    }

    /// Accepts a condition signal. It is acted upon at the start of the next cycle.
    pub fn accept_condition(&mut self, event: ConditionEvent) {
        self.monitor.accept(event);
    }

    /// Accepts a delivery outcome signal. It is acted upon at the start of the next cycle.
    pub fn accept_signal(&mut self, signal: DeliverySignal) {
        self.signals.push(signal);
    }

    /// Reports a vehicle breakdown. It is acted upon at the start of the next cycle.
    pub fn report_breakdown(&mut self, vehicle_id: &str) {
        self.breakdowns.push(vehicle_id.to_string());
    }

    /// Requests an order withdrawal. Applied at the start of the next cycle; orders
    /// already dispatched cannot be withdrawn.
    pub fn request_withdrawal(&mut self, order_id: &str) {
        self.withdrawals.push(order_id.to_string());
    }

    /// Returns a grounded vehicle back to service so it can take orders again.
    pub fn restore_vehicle(&self, vehicle_id: &str) -> GenericResult<()> {
        let mut vehicle =
            self.fleet.get_vehicle(vehicle_id).ok_or_else(|| format!("unknown vehicle '{vehicle_id}'"))?;

        if vehicle.status == VehicleStatus::Unavailable {
            vehicle.status = VehicleStatus::Idle;
            self.fleet.put_vehicle(vehicle);
        }

        Ok(())
    }

    /// Gets exception records accumulated over all cycles.
    pub fn exception_records(&self) -> &[ExceptionRecord] {
        self.exceptions.records()
    }

    /// Runs one orchestration cycle: applies queued external signals, drains pending
    /// orders through assignment, commits routes for assigned orders and surfaces them
    /// for dispatch. Every failure goes through the exception policy, never raw.
    pub fn run_cycle(&mut self, now: Timestamp) -> CycleReport {
        let mut report = CycleReport::default();
        let records_before = self.exceptions.records().len();

        self.apply_signals(now, &mut report);
        self.apply_breakdowns(now);
        self.apply_withdrawals(now, &mut report);
        self.apply_conditions(now, &mut report);

        self.assign_pending(now, &mut report);
        self.route_assigned(now, &mut report);
        self.dispatch_routed(&mut report);

        report.deferred = self.orders.list_pending().len();
        report.exceptions = self.exceptions.records().len() - records_before;

        (self.environment.logger)(&format!(
            "cycle done: assigned {}, routed {}, dispatched {}, delivered {}, replanned {}, deferred {}, exceptions {}",
            report.assigned,
            report.routed,
            report.dispatched,
            report.delivered,
            report.replanned,
            report.deferred,
            report.exceptions
        ));

        report
    }

    fn handle_failure(&mut self, event: FailureEvent, now: Timestamp) {
        self.exceptions.handle(&event, self.orders.as_ref(), self.fleet.as_ref(), self.alerts.as_ref(), now);
    }

    fn find_vehicle_of(&self, order_id: &str) -> Option<Vehicle> {
        self.fleet
            .list_vehicles()
            .into_iter()
            .find(|vehicle| vehicle.route.stops.iter().any(|stop| stop.order_id == order_id))
    }

    fn apply_signals(&mut self, now: Timestamp, report: &mut CycleReport) {
        for signal in std::mem::take(&mut self.signals) {
            match signal {
                DeliverySignal::Delivered { order_id } => {
                    let Some(mut order) = self.orders.get_order(&order_id) else {
                        continue;
                    };
                    let destination = order.delivery;

                    if order.transition(OrderStatus::Delivered).is_err() {
                        (self.environment.logger)(&format!("ignored delivered signal for order '{order_id}'"));
                        continue;
                    }
                    self.orders.put_order(order);

                    if let Some(mut vehicle) = self.find_vehicle_of(&order_id) {
                        vehicle.route.remove_order(&order_id);
                        if vehicle.route.is_empty() && vehicle.status == VehicleStatus::EnRoute {
                            vehicle.status = VehicleStatus::Idle;
                            vehicle.location = destination;
                        }
                        self.fleet.put_vehicle(vehicle);
                    }

                    report.delivered += 1;
                }
                DeliverySignal::Failed { order_id, kind } => {
                    let vehicle_id = self.find_vehicle_of(&order_id).map(|mut vehicle| {
                        vehicle.route.remove_order(&order_id);
                        if vehicle.route.is_empty() && vehicle.status == VehicleStatus::EnRoute {
                            vehicle.status = VehicleStatus::Idle;
                        }
                        let id = vehicle.id.clone();
                        self.fleet.put_vehicle(vehicle);
                        id
                    });

                    if let Some(mut order) = self.orders.get_order(&order_id) {
                        if order.status.can_transition(OrderStatus::Failed) {
                            let _ = order.transition(OrderStatus::Failed);
                            self.orders.put_order(order);
                        }
                    }

                    self.handle_failure(FailureEvent { kind, order_id: Some(order_id), vehicle_id }, now);
                }
            }
        }
    }

    fn apply_breakdowns(&mut self, now: Timestamp) {
        for vehicle_id in std::mem::take(&mut self.breakdowns) {
            self.handle_failure(
                FailureEvent { kind: FailureKind::VehicleBreakdown, order_id: None, vehicle_id: Some(vehicle_id) },
                now,
            );
        }
    }

    fn apply_withdrawals(&mut self, now: Timestamp, report: &mut CycleReport) {
        for order_id in std::mem::take(&mut self.withdrawals) {
            let Some(order) = self.orders.get_order(&order_id) else {
                continue;
            };

            match order.status {
                OrderStatus::Pending => {
                    self.orders.remove_order(&order_id);
                    report.withdrawn += 1;
                }
                OrderStatus::Assigned | OrderStatus::Routed => {
                    if let Some(mut vehicle) = self.find_vehicle_of(&order_id) {
                        vehicle.route.remove_order(&order_id);
                        if !self.replan_vehicle(&mut vehicle, now, None) {
                            (self.environment.logger)(&format!(
                                "kept stale route of vehicle '{}' after withdrawal",
                                vehicle.id
                            ));
                        }
                        if vehicle.route.is_empty() && vehicle.status == VehicleStatus::Assigned {
                            vehicle.status = VehicleStatus::Idle;
                        }
                        self.fleet.put_vehicle(vehicle);
                    }
                    self.orders.remove_order(&order_id);
                    report.withdrawn += 1;
                }
                _ => {
                    (self.environment.logger)(&format!(
                        "cannot withdraw order '{order_id}' in status {:?}",
                        order.status
                    ));
                }
            }
        }
    }

    /// Replans the whole route of the vehicle from its current location.
    /// Keeps the route untouched and returns false when no feasible plan exists.
    fn replan_vehicle(&self, vehicle: &mut Vehicle, departure: Timestamp, profile: Option<&SpeedProfile>) -> bool {
        if vehicle.route.is_empty() {
            return true;
        }

        let stops = vehicle.route.stops.clone();
        let strategy = self.planner.select_strategy(stops.len());

        let outcome = match profile {
            Some(profile) => self.planner.plan_with(stops, vehicle, departure, strategy, profile),
            None => self.planner.plan(stops, vehicle, departure, strategy),
        };

        match outcome {
            Ok(outcome) if !outcome.partial => {
                vehicle.route = outcome.route;
                true
            }
            _ => false,
        }
    }

    fn apply_conditions(&mut self, now: Timestamp, report: &mut CycleReport) {
        for event in self.monitor.drain() {
            let Some(mut vehicle) = self.fleet.get_vehicle(&event.vehicle_id) else {
                continue;
            };

            if vehicle.status != VehicleStatus::EnRoute || vehicle.route.is_empty() {
                continue;
            }

            // already completed legs stay untouched, only the remaining suffix is resequenced
            let split = vehicle.route.stops.iter().position(|stop| stop.schedule.arrival > now).unwrap_or(vehicle.route.stops.len());
            let (locked, suffix) = vehicle.route.stops.split_at(split);
            if suffix.is_empty() {
                continue;
            }

            let (start_location, start_time) = locked
                .last()
                .map(|stop| (stop.location, stop.schedule.departure.max(now)))
                .unwrap_or((vehicle.location, now));

            let profile = match event.kind {
                ConditionKind::Delay { factor } => self.planner.profile().slowed(factor),
                ConditionKind::Closure => self.planner.profile().clone(),
            };

            let mut probe = vehicle.clone();
            probe.location = start_location;
            probe.route = Route::default();

            let suffix: Vec<Stop> = suffix.to_vec();
            let locked: Vec<Stop> = locked.to_vec();
            let strategy = self.planner.select_strategy(suffix.len());

            match self.planner.plan_with(suffix, &probe, start_time, strategy, &profile) {
                Ok(outcome) if !outcome.partial => {
                    let cost = outcome.route.cost;
                    let stops = locked.into_iter().chain(outcome.route.stops).collect();
                    vehicle.route = Route::new(stops, cost);
                    self.fleet.put_vehicle(vehicle);
                    report.replanned += 1;
                }
                _ => {
                    self.handle_failure(
                        FailureEvent {
                            kind: FailureKind::ConditionDelay,
                            order_id: None,
                            vehicle_id: Some(event.vehicle_id.clone()),
                        },
                        now,
                    );
                }
            }
        }
    }

    fn assign_pending(&mut self, now: Timestamp, report: &mut CycleReport) {
        let mut pending = self.orders.list_pending();
        pending.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| compare_floats(a.created_at, b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        for order in pending {
            match self.try_assign(&order, now) {
                Ok(()) => report.assigned += 1,
                // commit conflict persisted, the order waits for the next cycle
                Err(None) => {}
                Err(Some(failure)) => {
                    let kind = match failure {
                        AssignmentFailure::NoCapacity => FailureKind::Capacity,
                        AssignmentFailure::NoFeasibleVehicle => FailureKind::NoFeasibleVehicle,
                    };
                    self.handle_failure(
                        FailureEvent { kind, order_id: Some(order.id.clone()), vehicle_id: None },
                        now,
                    );
                }
            }
        }
    }

    /// Evaluates candidates on a fleet snapshot, re-validates the chosen vehicle against
    /// the live store right before commit and retries once on a conflict.
    fn try_assign(&mut self, order: &Order, now: Timestamp) -> Result<(), Option<AssignmentFailure>> {
        for _ in 0..=self.config.commit_retries {
            let fleet = self.fleet.list_vehicles();
            let result = self.optimizer.assign(order, &fleet, now).map_err(Some)?;

            let Some(mut vehicle) = self.fleet.get_vehicle(&result.vehicle_id) else {
                continue;
            };
            if !self.optimizer.is_committable(&result, &vehicle) {
                continue;
            }

            vehicle.route = result.route;
            if vehicle.status == VehicleStatus::Idle {
                vehicle.status = VehicleStatus::Assigned;
            }
            self.fleet.put_vehicle(vehicle);

            let mut order = order.clone();
            if order.transition(OrderStatus::Assigned).is_err() {
                return Err(None);
            }
            self.orders.put_order(order);

            return Ok(());
        }

        Err(None)
    }

    /// Commits a full route per vehicle with freshly assigned orders. Vehicles are planned
    /// in parallel as independent read-only tasks, commits happen sequentially.
    fn route_assigned(&mut self, now: Timestamp, report: &mut CycleReport) {
        let candidates: Vec<Vehicle> = self
            .fleet
            .list_vehicles()
            .into_iter()
            .filter(|vehicle| vehicle.status == VehicleStatus::Assigned && !vehicle.route.is_empty())
            .collect();

        if candidates.is_empty() {
            return;
        }

        let planner = self.planner.clone();
        let plan = |vehicle: &Vehicle| {
            let stops = vehicle.route.stops.clone();
            let strategy = planner.select_strategy(stops.len());
            planner.plan(stops, vehicle, now, strategy)
        };

        let outcomes = if candidates.len() > 1 && self.environment.parallelism > 1 {
            parallel_collect(&candidates, plan)
        } else {
            candidates.iter().map(plan).collect()
        };

        for (mut vehicle, outcome) in candidates.into_iter().zip(outcomes) {
            match outcome {
                Ok(outcome) if !outcome.partial => {
                    vehicle.route = outcome.route;
                    for order_id in vehicle.route.order_ids() {
                        let Some(mut order) = self.orders.get_order(&order_id) else {
                            continue;
                        };
                        if order.status == OrderStatus::Assigned && order.transition(OrderStatus::Routed).is_ok() {
                            self.orders.put_order(order);
                            report.routed += 1;
                        }
                    }
                    self.fleet.put_vehicle(vehicle);
                }
                _ => {
                    // the vehicle route cannot be committed, requeue its fresh orders
                    for order_id in vehicle.route.order_ids() {
                        let Some(order) = self.orders.get_order(&order_id) else {
                            continue;
                        };
                        if order.status == OrderStatus::Assigned {
                            vehicle.route.remove_order(&order_id);
                            self.handle_failure(
                                FailureEvent {
                                    kind: FailureKind::InfeasibleInsertion,
                                    order_id: Some(order_id),
                                    vehicle_id: Some(vehicle.id.clone()),
                                },
                                now,
                            );
                        }
                    }
                    if vehicle.route.is_empty() && vehicle.status == VehicleStatus::Assigned {
                        vehicle.status = VehicleStatus::Idle;
                    }
                    self.fleet.put_vehicle(vehicle);
                }
            }
        }
    }

    /// Surfaces routed orders for dispatch and moves them in transit.
    fn dispatch_routed(&mut self, report: &mut CycleReport) {
        for mut vehicle in self.fleet.list_vehicles() {
            if vehicle.status != VehicleStatus::Assigned {
                continue;
            }

            let mut dispatched = 0;
            for order_id in vehicle.route.order_ids() {
                let Some(mut order) = self.orders.get_order(&order_id) else {
                    continue;
                };
                if order.status != OrderStatus::Routed {
                    continue;
                }

                self.dispatcher.dispatch(&order.id, &vehicle.id, &vehicle.route);
                if order.transition(OrderStatus::InTransit).is_ok() {
                    self.orders.put_order(order);
                    dispatched += 1;
                }
            }

            if dispatched > 0 {
                vehicle.status = VehicleStatus::EnRoute;
                self.fleet.put_vehicle(vehicle);
                report.dispatched += dispatched;
            }
        }
    }
}

/// A builder for [`Supervisor`]. Stores and sinks are required, everything else defaults.
pub struct SupervisorBuilder {
    orders: Option<Arc<dyn OrderStore>>,
    fleet: Option<Arc<dyn FleetStore>>,
    alerts: Option<Arc<dyn AlertSink>>,
    dispatcher: Option<Arc<dyn DispatchSink>>,
    intake: OrderIntake,
    planner: Option<Arc<RoutePlanner>>,
    policy: ExceptionPolicy,
    config: CycleConfig,
    environment: Arc<Environment>,
}

impl Default for SupervisorBuilder {
    fn default() -> Self {
        Self {
            orders: None,
            fleet: None,
            alerts: None,
            dispatcher: None,
            intake: OrderIntake::default(),
            planner: None,
            policy: ExceptionPolicy::default(),
            config: CycleConfig::default(),
            environment: Arc::new(Environment::default()),
        }
    }
}

impl SupervisorBuilder {
    /// Sets order and fleet stores.
    pub fn with_stores(mut self, orders: Arc<dyn OrderStore>, fleet: Arc<dyn FleetStore>) -> Self {
        self.orders = Some(orders);
        self.fleet = Some(fleet);
        self
    }

    /// Sets alert and dispatch sinks.
    pub fn with_sinks(mut self, alerts: Arc<dyn AlertSink>, dispatcher: Arc<dyn DispatchSink>) -> Self {
        self.alerts = Some(alerts);
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Sets a custom intake.
    pub fn with_intake(mut self, intake: OrderIntake) -> Self {
        self.intake = intake;
        self
    }

    /// Sets a custom route planner.
    pub fn with_planner(mut self, planner: Arc<RoutePlanner>) -> Self {
        self.planner = Some(planner);
        self
    }

    /// Sets a custom exception policy.
    pub fn with_policy(mut self, policy: ExceptionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets a custom cycle configuration.
    pub fn with_config(mut self, config: CycleConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets a custom environment.
    pub fn with_environment(mut self, environment: Arc<Environment>) -> Self {
        self.environment = environment;
        self
    }

    /// Builds the supervisor.
    pub fn build(self) -> GenericResult<Supervisor> {
        let orders = self.orders.ok_or("an order store is required")?;
        let fleet = self.fleet.ok_or("a fleet store is required")?;
        let alerts = self.alerts.ok_or("an alert sink is required")?;
        let dispatcher = self.dispatcher.ok_or("a dispatch sink is required")?;

        let planner =
            self.planner.unwrap_or_else(|| Arc::new(RoutePlanner::default_with(self.environment.clone())));
        let optimizer = AssignmentOptimizer::new(planner.clone(), self.environment.clone());

        Ok(Supervisor {
            orders,
            fleet,
            alerts,
            dispatcher,
            intake: self.intake,
            planner,
            optimizer,
            monitor: ConditionMonitor::default(),
            exceptions: ExceptionHandler::new(self.policy),
            config: self.config,
            environment: self.environment,
            signals: Vec::new(),
            breakdowns: Vec::new(),
            withdrawals: Vec::new(),
        })
    }
}
