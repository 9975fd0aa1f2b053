use super::*;
use crate::helpers::*;
use crate::orchestration::Resolution;
use crate::state::Event;
use cartage_core::models::solution::StopKind;

#[test]
fn can_drive_single_order_to_in_transit_within_one_cycle() {
    let mut harness = test_harness();
    harness.store.put_vehicle(test_vehicle("v1"));
    harness.supervisor.submit(&test_payload("order1"), 0.).expect("must be admitted");

    let report = harness.supervisor.run_cycle(0.);

    assert_eq!(report.assigned, 1);
    assert_eq!(report.routed, 1);
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.deferred, 0);
    assert_eq!(report.exceptions, 0);

    let order = harness.store.get_order("order1").unwrap();
    assert_eq!(order.status, OrderStatus::InTransit);

    let vehicle = harness.store.get_vehicle("v1").unwrap();
    assert_eq!(vehicle.status, VehicleStatus::EnRoute);
    assert_eq!(vehicle.route.stops.len(), 2);
    assert_eq!(vehicle.route.stops[0].kind, StopKind::Pickup);
    assert_eq!(vehicle.route.stops[1].kind, StopKind::Delivery);
    assert!(vehicle.route.validate(&vehicle.capacity).is_ok());

    let dispatches = harness.sink.dispatches();
    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0].order_id, "order1");
    assert_eq!(dispatches[0].vehicle_id, "v1");
}

#[test]
fn can_defer_order_when_capacity_is_spent_within_cycle() {
    let mut harness = test_harness();
    harness.store.put_vehicle(test_vehicle("v1"));

    let mut first = test_payload("order1");
    first.weight = 300.;
    let mut second = test_payload("order2");
    second.weight = 300.;

    harness.supervisor.submit(&first, 0.).expect("must be admitted");
    harness.supervisor.submit(&second, 0.).expect("must be admitted");

    let report = harness.supervisor.run_cycle(0.);

    assert_eq!(report.assigned, 1);
    assert_eq!(report.deferred, 1);

    let statuses: Vec<OrderStatus> = ["order1", "order2"]
        .iter()
        .map(|id| harness.store.get_order(id).unwrap().status)
        .collect();

    assert!(statuses.contains(&OrderStatus::InTransit));
    assert!(statuses.contains(&OrderStatus::Pending));

    // the deferred order is requeued by the policy, not failed
    let records = harness.supervisor.exception_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].resolution, Resolution::Requeued);
    assert!(harness.sink.alerts().is_empty());
}

#[test]
fn can_requeue_orders_of_broken_vehicle() {
    let mut harness = test_harness();
    harness.store.put_vehicle(test_vehicle("v1"));
    harness.supervisor.submit(&test_payload("order1"), 0.).expect("must be admitted");
    harness.supervisor.submit(&test_payload("order2"), 0.).expect("must be admitted");
    harness.supervisor.run_cycle(0.);

    harness.supervisor.report_breakdown("v1");
    let report = harness.supervisor.run_cycle(10.);

    let vehicle = harness.store.get_vehicle("v1").unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Unavailable);
    assert!(vehicle.route.is_empty());

    // no other vehicle exists, so both orders stay pending
    assert_eq!(report.assigned, 0);
    assert_eq!(report.deferred, 2);
    for order_id in ["order1", "order2"] {
        assert_eq!(harness.store.get_order(order_id).unwrap().status, OrderStatus::Pending);
    }

    let breakdown_records = harness
        .supervisor
        .exception_records()
        .iter()
        .filter(|record| record.kind == FailureKind::VehicleBreakdown)
        .count();
    assert_eq!(breakdown_records, 2);

    assert!(harness
        .sink
        .alerts()
        .iter()
        .any(|event| matches!(event, Event::VehicleBreakdown { vehicle_id, .. } if vehicle_id == "v1")));
}

#[test]
fn can_reassign_orders_after_vehicle_is_restored() {
    let mut harness = test_harness();
    harness.store.put_vehicle(test_vehicle("v1"));
    harness.supervisor.submit(&test_payload("order1"), 0.).expect("must be admitted");
    harness.supervisor.run_cycle(0.);

    harness.supervisor.report_breakdown("v1");
    harness.supervisor.run_cycle(10.);

    harness.supervisor.restore_vehicle("v1").expect("vehicle must be known");
    let report = harness.supervisor.run_cycle(20.);

    assert_eq!(report.assigned, 1);
    assert_eq!(harness.store.get_order("order1").unwrap().status, OrderStatus::InTransit);
}

#[test]
fn can_withdraw_assigned_order_and_keep_route_consistent() {
    let mut harness = test_harness();

    // a vehicle which already carries two assigned orders bound to it
    let order1 = {
        let mut order = test_order("order1");
        order.status = OrderStatus::Assigned;
        order
    };
    let order2 = {
        let mut order = test_order("order2");
        order.status = OrderStatus::Assigned;
        order
    };

    let mut vehicle = test_vehicle("v1");
    vehicle.status = VehicleStatus::Assigned;
    vehicle.route.stops = vec![
        cartage_core::models::solution::Stop::pickup(&order1),
        cartage_core::models::solution::Stop::pickup(&order2),
        cartage_core::models::solution::Stop::delivery(&order1),
        cartage_core::models::solution::Stop::delivery(&order2),
    ];

    harness.store.put_order(order1);
    harness.store.put_order(order2);
    harness.store.put_vehicle(vehicle);

    harness.supervisor.request_withdrawal("order1");
    let report = harness.supervisor.run_cycle(0.);

    assert_eq!(report.withdrawn, 1);
    assert!(harness.store.get_order("order1").is_none());

    let vehicle = harness.store.get_vehicle("v1").unwrap();
    assert_eq!(vehicle.route.order_ids(), vec!["order2".to_string()]);
    assert!(vehicle.route.validate(&vehicle.capacity).is_ok());
}

#[test]
fn can_confirm_delivery_and_free_the_vehicle() {
    let mut harness = test_harness();
    harness.store.put_vehicle(test_vehicle("v1"));
    harness.supervisor.submit(&test_payload("order1"), 0.).expect("must be admitted");
    harness.supervisor.run_cycle(0.);

    harness.supervisor.accept_signal(DeliverySignal::Delivered { order_id: "order1".to_string() });
    let report = harness.supervisor.run_cycle(1000.);

    assert_eq!(report.delivered, 1);
    assert_eq!(harness.store.get_order("order1").unwrap().status, OrderStatus::Delivered);

    let vehicle = harness.store.get_vehicle("v1").unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Idle);
    assert!(vehicle.route.is_empty());
}

#[test]
fn can_requeue_failed_delivery() {
    let mut harness = test_harness();
    harness.store.put_vehicle(test_vehicle("v1"));
    harness.supervisor.submit(&test_payload("order1"), 0.).expect("must be admitted");
    harness.supervisor.run_cycle(0.);

    harness.supervisor.accept_signal(DeliverySignal::Failed {
        order_id: "order1".to_string(),
        kind: FailureKind::TimeWindowViolation,
    });
    let report = harness.supervisor.run_cycle(1000.);

    // the order goes back through the whole pipeline within the same cycle
    assert_eq!(report.assigned, 1);
    assert_eq!(harness.store.get_order("order1").unwrap().retries, 1);
    assert_eq!(harness.store.get_order("order1").unwrap().status, OrderStatus::InTransit);
}

#[test]
fn can_replan_remaining_stops_once_per_repeated_condition_signal() {
    let mut harness = test_harness();
    harness.store.put_vehicle(test_vehicle("v1"));
    harness.supervisor.submit(&test_payload("order1"), 0.).expect("must be admitted");
    harness.supervisor.run_cycle(0.);

    let delay = ConditionEvent { vehicle_id: "v1".to_string(), kind: ConditionKind::Delay { factor: 1.5 } };
    harness.supervisor.accept_condition(delay.clone());
    harness.supervisor.accept_condition(delay.clone());
    harness.supervisor.accept_condition(delay);

    let report = harness.supervisor.run_cycle(100.);

    assert_eq!(report.replanned, 1);

    let vehicle = harness.store.get_vehicle("v1").unwrap();
    assert_eq!(vehicle.route.stops.len(), 2);
    assert!(vehicle.route.validate(&vehicle.capacity).is_ok());
}

#[test]
fn can_keep_completed_legs_untouched_on_replan() {
    let mut harness = test_harness();
    harness.store.put_vehicle(test_vehicle("v1"));
    harness.supervisor.submit(&test_payload("order1"), 0.).expect("must be admitted");
    harness.supervisor.run_cycle(0.);

    let before = harness.store.get_vehicle("v1").unwrap();
    let pickup_schedule = before.route.stops[0].schedule.clone();

    harness.supervisor.accept_condition(ConditionEvent {
        vehicle_id: "v1".to_string(),
        kind: ConditionKind::Delay { factor: 2. },
    });
    // the pickup leg is already completed by now, only the delivery leg may move
    harness.supervisor.run_cycle(pickup_schedule.departure + 1.);

    let after = harness.store.get_vehicle("v1").unwrap();
    assert_eq!(after.route.stops[0].schedule, pickup_schedule);
    assert!(after.route.stops[1].schedule.arrival > before.route.stops[1].schedule.arrival);
}

mod invariants {
    use super::*;
    use crate::intake::{CoordinatePayload, OrderPayload};
    use proptest::prelude::*;

    fn payload_strategy() -> impl Strategy<Value = OrderPayload> {
        (-0.05f64..0.05, -0.05f64..0.05, 1f64..200., 0.1f64..2., 1u8..=5u8).prop_map(
            |(pickup_shift, delivery_shift, weight, volume, priority)| OrderPayload {
                id: None,
                customer_id: "customer1".to_string(),
                pickup: CoordinatePayload { lat: DEFAULT_DEPOT.lat + pickup_shift, lng: DEFAULT_DEPOT.lng },
                delivery: CoordinatePayload { lat: DEFAULT_DEPOT.lat + delivery_shift, lng: DEFAULT_DEPOT.lng },
                weight,
                volume,
                priority,
                time_window_start: None,
                time_window_end: None,
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]
        #[test]
        fn can_keep_route_invariants_for_any_order_mix(payloads in prop::collection::vec(payload_strategy(), 1..6)) {
            let mut harness = test_harness();
            harness.store.put_vehicle(test_vehicle("v1"));
            harness.store.put_vehicle(test_vehicle("v2"));

            for payload in &payloads {
                harness.supervisor.submit(payload, 0.).expect("generated payloads are valid");
            }

            harness.supervisor.run_cycle(0.);

            for vehicle in harness.store.list_vehicles() {
                prop_assert!(vehicle.route.validate(&vehicle.capacity).is_ok());
            }
        }
    }
}
