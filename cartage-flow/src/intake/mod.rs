//! Validates raw order payloads before they are admitted into the workflow.

#[cfg(test)]
#[path = "../../tests/unit/intake/intake_test.rs"]
mod intake_test;

use cartage_core::models::common::{GeoPoint, Load, TimeWindow, Timestamp};
use cartage_core::models::problem::{Order, DEFAULT_PRIORITY, MAX_PRIORITY};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// A geographic coordinate of a raw payload.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct CoordinatePayload {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// A raw order payload as received from the external intake collaborator.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    /// An optional order id. Generated when missing.
    #[serde(default)]
    pub id: Option<String>,
    /// An id of the customer which created the order.
    pub customer_id: String,
    /// A pickup coordinate.
    pub pickup: CoordinatePayload,
    /// A delivery coordinate.
    pub delivery: CoordinatePayload,
    /// A load weight in kilograms.
    #[serde(default)]
    pub weight: f64,
    /// A load volume in cubic meters.
    #[serde(default)]
    pub volume: f64,
    /// An order priority, higher value means more urgent order.
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// An earliest delivery time in RFC3339 format.
    #[serde(default)]
    pub time_window_start: Option<String>,
    /// A latest delivery time in RFC3339 format.
    #[serde(default)]
    pub time_window_end: Option<String>,
}

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

/// A list of problems found in a rejected payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationError {
    /// Problems in the order they were found.
    pub errors: Vec<String>,
}

impl ValidationError {
    fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid order payload: {}", self.errors.join(", "))
    }
}

impl std::error::Error for ValidationError {}

/// Bounds enforced by the intake validation.
#[derive(Clone, Debug)]
pub struct IntakeLimits {
    /// A maximum accepted weight in kilograms.
    pub max_weight: f64,
    /// A maximum accepted volume in cubic meters.
    pub max_volume: f64,
}

impl Default for IntakeLimits {
    fn default() -> Self {
        Self { max_weight: 1000., max_volume: 10. }
    }
}

/// Validates raw payloads and admits them as pending orders.
#[derive(Default)]
pub struct OrderIntake {
    limits: IntakeLimits,
    sequence: AtomicU64,
}

impl OrderIntake {
    /// Creates a new instance of `OrderIntake` with the given bounds.
    pub fn new(limits: IntakeLimits) -> Self {
        Self { limits, sequence: AtomicU64::default() }
    }

    /// Validates the payload and creates a pending order from it.
    /// Malformed payloads are rejected and never enter the workflow.
    pub fn admit(&self, payload: &OrderPayload, now: Timestamp) -> Result<Order, ValidationError> {
        let mut errors = Vec::new();

        if payload.customer_id.trim().is_empty() {
            errors.push("customer id is required".to_string());
        }

        validate_coordinate("pickup", &payload.pickup, &mut errors);
        validate_coordinate("delivery", &payload.delivery, &mut errors);

        if !(0. ..=self.limits.max_weight).contains(&payload.weight) {
            errors.push(format!("weight must be within [0, {}] kg", self.limits.max_weight));
        }

        if !(0. ..=self.limits.max_volume).contains(&payload.volume) {
            errors.push(format!("volume must be within [0, {}] m3", self.limits.max_volume));
        }

        if !(DEFAULT_PRIORITY..=MAX_PRIORITY).contains(&payload.priority) {
            errors.push(format!("priority must be within [{DEFAULT_PRIORITY}, {MAX_PRIORITY}]"));
        }

        let window = parse_window(payload, &mut errors);

        if !errors.is_empty() {
            return Err(ValidationError::new(errors));
        }

        let id = match &payload.id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            _ => format!("ORD-{:06}", self.sequence.fetch_add(1, Ordering::Relaxed) + 1),
        };

        let mut order = Order::new(
            &id,
            &payload.customer_id,
            GeoPoint::new(payload.pickup.lat, payload.pickup.lng),
            GeoPoint::new(payload.delivery.lat, payload.delivery.lng),
            Load::new(payload.weight, payload.volume),
        );
        order.priority = payload.priority;
        order.window = window;
        order.created_at = now;

        Ok(order)
    }

    /// Same as [`OrderIntake::admit`], but for a json encoded payload.
    pub fn admit_json(&self, json: &str, now: Timestamp) -> Result<Order, ValidationError> {
        let payload: OrderPayload = serde_json::from_str(json)
            .map_err(|err| ValidationError::new(vec![format!("malformed payload: {err}")]))?;

        self.admit(&payload, now)
    }
}

fn validate_coordinate(name: &str, coordinate: &CoordinatePayload, errors: &mut Vec<String>) {
    if !coordinate.lat.is_finite() || coordinate.lat.abs() > 90. {
        errors.push(format!("{name} latitude must be within [-90, 90]"));
    }

    if !coordinate.lng.is_finite() || coordinate.lng.abs() > 180. {
        errors.push(format!("{name} longitude must be within [-180, 180]"));
    }
}

fn parse_window(payload: &OrderPayload, errors: &mut Vec<String>) -> Option<TimeWindow> {
    match (&payload.time_window_start, &payload.time_window_end) {
        (Some(start), Some(end)) => {
            let start = parse_time(start, errors);
            let end = parse_time(end, errors);

            match (start, end) {
                (Some(start), Some(end)) if start < end => Some(TimeWindow::new(start, end)),
                (Some(_), Some(_)) => {
                    errors.push("time window start must be before its end".to_string());
                    None
                }
                _ => None,
            }
        }
        (None, None) => None,
        _ => {
            errors.push("time window requires both start and end".to_string());
            None
        }
    }
}

fn parse_time(value: &str, errors: &mut Vec<String>) -> Option<Timestamp> {
    match OffsetDateTime::parse(value, &Rfc3339) {
        Ok(time) => Some(time.unix_timestamp() as f64),
        Err(_) => {
            errors.push(format!("cannot parse '{value}' as RFC3339 time"));
            None
        }
    }
}
