use super::*;
use crate::helpers::models::{test_order, test_order_with_load};

fn pickup_delivery(order_id: &str) -> (Stop, Stop) {
    let order = test_order(order_id);
    (Stop::pickup(&order), Stop::delivery(&order))
}

#[test]
fn can_get_order_ids_in_first_leg_order() {
    let (pickup1, delivery1) = pickup_delivery("order1");
    let (pickup2, delivery2) = pickup_delivery("order2");

    let route = Route::new(vec![pickup2, pickup1, delivery2, delivery1], 0.);

    assert_eq!(route.order_ids(), vec!["order2".to_string(), "order1".to_string()]);
}

#[test]
fn can_get_initial_load_from_unmatched_deliveries() {
    let order1 = test_order_with_load("order1", Load::new(100., 2.));
    let (pickup2, delivery2) = pickup_delivery("order2");

    let route = Route::new(vec![Stop::delivery(&order1), pickup2, delivery2], 0.);

    assert_eq!(route.initial_load(), Load::new(100., 2.));
}

#[test]
fn can_get_max_onboard_over_prefixes() {
    let order1 = test_order_with_load("order1", Load::new(100., 2.));
    let order2 = test_order_with_load("order2", Load::new(200., 3.));

    let route = Route::new(
        vec![Stop::pickup(&order1), Stop::pickup(&order2), Stop::delivery(&order1), Stop::delivery(&order2)],
        0.,
    );

    assert_eq!(route.max_onboard(), Load::new(300., 5.));
}

#[test]
fn can_remove_order_legs() {
    let (pickup1, delivery1) = pickup_delivery("order1");
    let (pickup2, delivery2) = pickup_delivery("order2");

    let mut route = Route::new(vec![pickup1, pickup2, delivery1, delivery2], 0.);

    assert!(route.remove_order("order1"));
    assert!(!route.remove_order("order1"));

    assert_eq!(route.order_ids(), vec!["order2".to_string()]);
    assert_eq!(route.stops.len(), 2);
}

#[test]
fn can_validate_correct_route() {
    let (pickup, delivery) = pickup_delivery("order1");
    let route = Route::new(vec![pickup, delivery], 0.);

    assert!(route.validate(&Load::new(500., 10.)).is_ok());
}

#[test]
fn can_detect_precedence_violation() {
    let (pickup, delivery) = pickup_delivery("order1");
    let route = Route::new(vec![delivery, pickup], 0.);

    assert!(route.validate(&Load::new(500., 10.)).is_err());
}

#[test]
fn can_detect_capacity_violation() {
    let order = test_order_with_load("order1", Load::new(501., 1.));
    let route = Route::new(vec![Stop::pickup(&order), Stop::delivery(&order)], 0.);

    assert!(route.validate(&Load::new(500., 10.)).is_err());
}

#[test]
fn can_detect_duplicated_leg() {
    let order = test_order("order1");
    let route = Route::new(vec![Stop::pickup(&order), Stop::pickup(&order), Stop::delivery(&order)], 0.);

    assert!(route.validate(&Load::new(500., 10.)).is_err());
}
