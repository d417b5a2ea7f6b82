//! Change detection over canonical encodings.
//!
//! Two encodings are equal when they have the same shape, identical keys,
//! strings, booleans and nulls, and numeric leaves within `epsilon` of each
//! other. Float noise from transform math therefore never triggers a push.

#[cfg(test)]
#[path = "detect_test.rs"]
mod detect_test;

use serde_json::Value;

/// Default numeric tolerance.
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Deep structural equality with numeric tolerance.
#[must_use]
pub fn approx_eq(a: &Value, b: &Value, epsilon: f64) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => (x - y).abs() <= epsilon,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| approx_eq(x, y, epsilon))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| approx_eq(x, y, epsilon)))
        }
        _ => a == b,
    }
}

/// Whether `current` differs from the last synced `baseline`.
///
/// With no baseline yet (nothing hydrated, nothing pushed) every state
/// counts as changed.
#[must_use]
pub fn has_changed(current: &Value, baseline: Option<&Value>, epsilon: f64) -> bool {
    baseline.is_none_or(|base| !approx_eq(current, base, epsilon))
}
