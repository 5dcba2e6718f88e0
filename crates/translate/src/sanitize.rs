// crates/translate/src/sanitize.rs

use bson::{oid::ObjectId, Bson, Document};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Number, Value as Json};

/// Converts raw filter values into the typed values the store compares against.
///
/// Filter values usually arrive as strings (URL query parameters), so a range
/// bound like `"2020-01-01"` or a membership list of hex ids would otherwise be
/// compared as text. When disabled only the JSON → BSON mapping is applied.
#[derive(Debug, Clone, Copy)]
pub struct Sanitizer {
    enabled: bool,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Sanitizer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Coerce a single value:
    ///
    /// 1. 24 hex characters → `ObjectId`
    /// 2. parseable date/time → `DateTime`
    /// 3. anything else → plain BSON conversion
    pub fn sanitize(&self, value: &Json) -> Bson {
        if self.enabled {
            if let Json::String(s) = value {
                if let Some(coerced) = coerce_str(s) {
                    return coerced;
                }
            }
        }
        to_bson(value)
    }
}

fn coerce_str(s: &str) -> Option<Bson> {
    if is_object_id(s) {
        return ObjectId::parse_str(s).ok().map(Bson::ObjectId);
    }
    parse_datetime(s).map(|dt| Bson::DateTime(bson::DateTime::from_millis(dt.timestamp_millis())))
}

fn is_object_id(s: &str) -> bool {
    s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Accepted shapes: RFC 3339, RFC 2822, `YYYY-MM-DD[ T]HH:MM[:SS[.fff]]`
/// (taken as UTC) and bare `YYYY-MM-DD` (UTC midnight).
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Plain JSON → BSON mapping used for every value that reaches the query.
///
/// Integers that fit 32 bits become `Int32` so they line up with the way
/// drivers encode small literals.
pub fn to_bson(value: &Json) -> Bson {
    match value {
        Json::Null => Bson::Null,
        Json::Bool(b) => Bson::Boolean(*b),
        Json::Number(n) => number_to_bson(n),
        Json::String(s) => Bson::String(s.clone()),
        Json::Array(items) => Bson::Array(items.iter().map(to_bson).collect()),
        Json::Object(map) => Bson::Document(
            map.iter()
                .map(|(k, v)| (k.clone(), to_bson(v)))
                .collect::<Document>(),
        ),
    }
}

fn number_to_bson(n: &Number) -> Bson {
    if let Some(i) = n.as_i64() {
        return i32::try_from(i).map_or(Bson::Int64(i), Bson::Int32);
    }
    if let Some(u) = n.as_u64() {
        if let Ok(i) = i64::try_from(u) {
            return Bson::Int64(i);
        }
    }
    Bson::Double(n.as_f64().unwrap_or(f64::NAN))
}
