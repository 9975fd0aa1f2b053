use super::*;
use crate::helpers::test_payload;

#[test]
fn can_admit_valid_payload() {
    let intake = OrderIntake::default();

    let order = intake.admit(&test_payload("order1"), 100.).expect("must be admitted");

    assert_eq!(order.id, "order1");
    assert_eq!(order.customer_id, "customer1");
    assert_eq!(order.load, Load::new(25., 1.2));
    assert_eq!(order.created_at, 100.);
    assert!(order.window.is_none());
}

#[test]
fn can_generate_order_id_when_missing() {
    let intake = OrderIntake::default();
    let mut payload = test_payload("");
    payload.id = None;

    let first = intake.admit(&payload, 0.).expect("must be admitted");
    let second = intake.admit(&payload, 0.).expect("must be admitted");

    assert_eq!(first.id, "ORD-000001");
    assert_eq!(second.id, "ORD-000002");
}

#[test]
fn can_parse_time_window() {
    let intake = OrderIntake::default();
    let mut payload = test_payload("order1");
    payload.time_window_start = Some("2026-08-06T10:00:00Z".to_string());
    payload.time_window_end = Some("2026-08-06T11:00:00Z".to_string());

    let order = intake.admit(&payload, 0.).expect("must be admitted");

    let window = order.window.expect("window must be parsed");
    assert_eq!(window.end - window.start, 3600.);
}

parameterized_test! {can_reject_malformed_payload, mutate, {
    let intake = OrderIntake::default();
    let mut payload = test_payload("order1");
    let mutate: fn(&mut OrderPayload) = mutate;
    mutate(&mut payload);

    assert!(intake.admit(&payload, 0.).is_err());
}}

can_reject_malformed_payload! {
    case01_empty_customer: |payload: &mut OrderPayload| payload.customer_id = "  ".to_string(),
    case02_bad_latitude: |payload: &mut OrderPayload| payload.pickup.lat = 91.,
    case03_bad_longitude: |payload: &mut OrderPayload| payload.delivery.lng = -181.,
    case04_nan_coordinate: |payload: &mut OrderPayload| payload.pickup.lng = f64::NAN,
    case05_too_heavy: |payload: &mut OrderPayload| payload.weight = 1000.1,
    case06_negative_weight: |payload: &mut OrderPayload| payload.weight = -1.,
    case07_too_bulky: |payload: &mut OrderPayload| payload.volume = 10.1,
    case08_zero_priority: |payload: &mut OrderPayload| payload.priority = 0,
    case09_priority_too_high: |payload: &mut OrderPayload| payload.priority = 6,
    case10_half_open_window: |payload: &mut OrderPayload| payload.time_window_start = Some("2026-08-06T10:00:00Z".to_string()),
    case11_inverted_window: |payload: &mut OrderPayload| {
        payload.time_window_start = Some("2026-08-06T11:00:00Z".to_string());
        payload.time_window_end = Some("2026-08-06T10:00:00Z".to_string());
    },
    case12_bad_time_format: |payload: &mut OrderPayload| {
        payload.time_window_start = Some("today".to_string());
        payload.time_window_end = Some("tomorrow".to_string());
    },
}

#[test]
fn can_collect_all_validation_errors_at_once() {
    let intake = OrderIntake::default();
    let mut payload = test_payload("order1");
    payload.customer_id = String::new();
    payload.weight = -1.;
    payload.priority = 9;

    let error = intake.admit(&payload, 0.).expect_err("must be rejected");

    assert_eq!(error.errors.len(), 3);
}

#[test]
fn can_admit_json_payload() {
    let intake = OrderIntake::default();
    let json = r#"{
        "customerId": "customer1",
        "pickup": { "lat": 40.7128, "lng": -74.0060 },
        "delivery": { "lat": 40.7228, "lng": -74.0060 },
        "weight": 25.0,
        "volume": 1.2
    }"#;

    let order = intake.admit_json(json, 0.).expect("must be admitted");

    assert_eq!(order.customer_id, "customer1");
    assert_eq!(order.priority, DEFAULT_PRIORITY);
}

#[test]
fn can_reject_malformed_json() {
    let intake = OrderIntake::default();

    let error = intake.admit_json("{not json}", 0.).expect_err("must be rejected");

    assert_eq!(error.errors.len(), 1);
}
