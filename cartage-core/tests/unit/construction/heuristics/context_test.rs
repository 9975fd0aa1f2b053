use super::*;
use crate::helpers::construction::PlanningSetup;
use crate::helpers::models::{test_order, test_order_with_load, test_order_with_window};
use crate::models::common::Load;
use crate::models::solution::{DELIVERY_SERVICE_TIME, PICKUP_SERVICE_TIME};

#[test]
fn can_evaluate_empty_sequence() {
    let setup = PlanningSetup::default();
    let summary = setup.context().evaluate(&[]);

    assert_eq!(summary.cost, 0.);
    assert_eq!(summary.violations, 0);
    assert!(summary.schedules.is_empty());
}

#[test]
fn can_compute_schedules_with_service_times() {
    let setup = PlanningSetup::default();
    // pickup is at the vehicle location, so the first leg takes no time
    let order = test_order("order1");
    let stops = vec![Stop::pickup(&order), Stop::delivery(&order)];

    let summary = setup.context().evaluate(&stops);

    assert_eq!(summary.violations, 0);
    assert_eq!(summary.schedules.len(), 2);

    let pickup = &summary.schedules[0];
    assert_eq!(pickup.arrival, 0.);
    assert_eq!(pickup.departure, PICKUP_SERVICE_TIME);

    let delivery = &summary.schedules[1];
    // 0.01 degree of latitude at 40 km/h is roughly 100 seconds away
    assert!((delivery.arrival - (PICKUP_SERVICE_TIME + 100.)).abs() < 2.);
    assert_eq!(delivery.departure, delivery.arrival + DELIVERY_SERVICE_TIME);
}

#[test]
fn can_wait_for_time_window_to_open() {
    let setup = PlanningSetup::default();
    let order = test_order_with_window("order1", 1000., 2000.);
    let stops = vec![Stop::pickup(&order), Stop::delivery(&order)];

    let summary = setup.context().evaluate(&stops);

    assert_eq!(summary.violations, 0);

    let delivery = &summary.schedules[1];
    assert!(delivery.arrival < 1000.);
    assert_eq!(delivery.departure, 1000. + DELIVERY_SERVICE_TIME);
}

#[test]
fn can_count_late_arrival_as_violation() {
    let setup = PlanningSetup::default();
    let order = test_order_with_window("order1", 0., 100.);
    let stops = vec![Stop::pickup(&order), Stop::delivery(&order)];

    let summary = setup.context().evaluate(&stops);

    assert_eq!(summary.violations, 1);
    assert!(!setup.context().is_feasible(&stops));
}

#[test]
fn can_count_capacity_overflow_as_violation() {
    let setup = PlanningSetup::default();
    let order1 = test_order_with_load("order1", Load::new(300., 1.));
    let order2 = test_order_with_load("order2", Load::new(300., 1.));
    let stops = vec![
        Stop::pickup(&order1),
        Stop::pickup(&order2),
        Stop::delivery(&order1),
        Stop::delivery(&order2),
    ];

    let summary = setup.context().evaluate(&stops);

    assert_eq!(summary.violations, 1);
}

#[test]
fn can_count_delivery_before_pickup_as_violation() {
    let setup = PlanningSetup::default();
    let order = test_order("order1");
    let stops = vec![Stop::delivery(&order), Stop::pickup(&order)];

    let summary = setup.context().evaluate(&stops);

    assert_eq!(summary.violations, 1);
}

#[test]
fn can_build_route_with_cost_and_schedules() {
    let setup = PlanningSetup::default();
    let order = test_order("order1");

    let route = setup.context().build_route(vec![Stop::pickup(&order), Stop::delivery(&order)]);

    assert!(route.cost > 0.);
    assert!(route.stops.iter().all(|stop| stop.schedule.departure >= stop.schedule.arrival));
}
