//! Coercion of the backend's timestamp representations into `DateTime<Utc>`.
//!
//! Flow log payloads carry RFC 3339 strings, but replays and other exporters
//! hand out protobuf-style `{ "seconds": .., "nanos": .. }` objects or plain
//! epoch numbers. All of them end up as the same absolute instant with the
//! sub-second part preserved.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error_handling::types::FieldProblem;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Builds an instant from whole epoch seconds plus a fractional nanosecond part.
pub fn from_epoch_parts(seconds: i64, nanos: u32) -> Option<DateTime<Utc>> {
    if nanos >= NANOS_PER_SECOND {
        return None;
    }
    DateTime::from_timestamp(seconds, nanos)
}

/// Splits fractional epoch seconds into a `(seconds, nanos)` pair.
fn from_epoch_float(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let whole = value.floor();
    let mut seconds = whole as i64;
    let mut nanos = ((value - whole) * f64::from(NANOS_PER_SECOND)).round() as u32;
    if nanos == NANOS_PER_SECOND {
        seconds += 1;
        nanos = 0;
    }
    from_epoch_parts(seconds, nanos)
}

fn epoch_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn epoch_nanos(value: Option<&Value>) -> Option<u32> {
    match value {
        None | Some(Value::Null) => Some(0),
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    }
}

/// Converts any supported timestamp representation into an absolute instant.
pub fn coerce_instant(value: &Value) -> Result<DateTime<Utc>, FieldProblem> {
    let invalid = || FieldProblem::InvalidTimestamp(value.to_string());
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.with_timezone(&Utc));
            }
            s.parse::<f64>()
                .ok()
                .and_then(from_epoch_float)
                .ok_or_else(invalid)
        }
        Value::Number(n) => match n.as_i64() {
            Some(seconds) => from_epoch_parts(seconds, 0).ok_or_else(invalid),
            None => n.as_f64().and_then(from_epoch_float).ok_or_else(invalid),
        },
        Value::Object(obj) => {
            let seconds = obj.get("seconds").and_then(epoch_seconds).ok_or_else(invalid)?;
            let nanos = epoch_nanos(obj.get("nanos")).ok_or_else(invalid)?;
            from_epoch_parts(seconds, nanos).ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use serde_json::json;

    #[test]
    fn rfc3339_keeps_nanoseconds() {
        let dt = coerce_instant(&json!("2018-04-03T13:47:37.301723960Z")).unwrap();
        assert_eq!(dt.timestamp(), Utc.with_ymd_and_hms(2018, 4, 3, 13, 47, 37).unwrap().timestamp());
        assert_eq!(dt.nanosecond(), 301_723_960);
    }

    #[test]
    fn seconds_and_nanos_object() {
        let dt = coerce_instant(&json!({"seconds": "1522763257", "nanos": 301723960})).unwrap();
        assert_eq!(dt.timestamp(), 1_522_763_257);
        assert_eq!(dt.nanosecond(), 301_723_960);

        let dt = coerce_instant(&json!({"seconds": 1522763257})).unwrap();
        assert_eq!(dt.nanosecond(), 0);
    }

    #[test]
    fn epoch_numbers() {
        let dt = coerce_instant(&json!(1522763257)).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2018, 4, 3, 13, 47, 37).unwrap());

        let dt = coerce_instant(&json!(1522763257.5)).unwrap();
        assert_eq!(dt.timestamp(), 1_522_763_257);
        assert_eq!(dt.nanosecond(), 500_000_000);

        let dt = coerce_instant(&json!("1522763257.25")).unwrap();
        assert_eq!(dt.nanosecond(), 250_000_000);
    }

    #[test]
    fn rejects_garbage() {
        assert!(coerce_instant(&json!("yesterday")).is_err());
        assert!(coerce_instant(&json!(true)).is_err());
        assert!(coerce_instant(&json!({"nanos": 5})).is_err());
        assert!(coerce_instant(&json!({"seconds": 1, "nanos": 2_000_000_000u64})).is_err());
    }
}
