//! Deep structural equality over JSON values.
//!
//! Rules:
//! - identical primitives are equal; numbers compare numerically (`1 == 1.0`)
//! - `null` and non-objects never equal objects
//! - arrays compare element-wise in order
//! - objects compare by key set, then per key (key order irrelevant)
//! - two strings that differ byte-wise are still equal when both parse as
//!   RFC 3339 timestamps for the same instant
//!
//! Inputs must be acyclic. `serde_json::Value` cannot express cycles, so the
//! constraint holds by construction.

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};

/// Compare two values structurally.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y || same_instant(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, xv)| ym.get(k).is_some_and(|yv| deep_equal(xv, yv)))
        }
        _ => false,
    }
}

/// Integers compare exactly; floats only when one side is a float.
fn numbers_equal(x: &Number, y: &Number) -> bool {
    match (as_integer(x), as_integer(y)) {
        (Some(ix), Some(iy)) => ix == iy,
        _ => match (x.as_f64(), y.as_f64()) {
            (Some(fx), Some(fy)) => fx == fy,
            _ => false,
        },
    }
}

/// The number as an integer, if it was stored as one.
pub(crate) fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Parse a string as a temporal value.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn same_instant(a: &str, b: &str) -> bool {
    match (parse_instant(a), parse_instant(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
