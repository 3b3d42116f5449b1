//! Value model (spec component A).
//!
//! A tagged literal carries its own origin so the executor can tell whether it is
//! pushdown-eligible as a native store value. Strings that match the ISO-8601 profile
//! in spec §3 are promoted to timestamps on ingress into predicates and inserts; on
//! egress through projection they render back to `YYYY-MM-DDThh:mm:ss` text.

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

pub const DATETIME_ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

static ISO8601_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:-?(?:[1-9][0-9]*)?[0-9]{4})-(?:1[0-2]|0[1-9])-(?:3[01]|0[1-9]|[12][0-9])T(?:2[0-3]|[01][0-9]):(?:[0-5][0-9]):(?:[0-5][0-9])(?:\.[0-9]+)?(?:Z|[+-](?:2[0-3]|[01][0-9]):[0-5][0-9])?$",
    )
    .expect("static ISO-8601 regex must compile")
});

/// True if `s` matches the strict ISO-8601 profile this engine promotes on ingress.
pub fn is_iso8601(s: &str) -> bool {
    ISO8601_RE.is_match(s)
}

/// A single literal value, as held anywhere in the AST or a document body.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Parse a raw literal string the way predicate/insert ingress does: promote an
    /// ISO-8601-shaped string to a timestamp, leave everything else as text. This is the
    /// ingress half of the invariant in spec §3(iv): identical literal text in WHERE and
    /// in INSERT/UPDATE values must produce identical typed values.
    pub fn from_literal_str(s: &str) -> Value {
        if is_iso8601(s) {
            if let Some(ts) = parse_iso8601(s) {
                return Value::Timestamp(ts);
            }
        }
        Value::Str(s.to_string())
    }

    /// Recursively promote ISO-8601 strings to timestamps inside lists and maps too,
    /// matching `sql_date.py`'s `value_to_datetime`, which the distilled spec compresses
    /// into a scalar-only rule but whose recursive case is needed for `IN`/`ARRAY_CONTAINS`
    /// against lists of dates to behave at all.
    pub fn promote_dates(self) -> Value {
        match self {
            Value::Str(s) => Value::from_literal_str(&s),
            Value::List(items) => Value::List(items.into_iter().map(Value::promote_dates).collect()),
            Value::Map(m) => Value::Map(m.into_iter().map(|(k, v)| (k, v.promote_dates())).collect()),
            other => other,
        }
    }

    /// Egress rendering: timestamps become `YYYY-MM-DDThh:mm:ss` text, everything else
    /// recurses structurally. Used by projection before a value leaves the engine.
    pub fn render_dates(self) -> Value {
        match self {
            Value::Timestamp(ts) => Value::Str(ts.format(DATETIME_ISO_FORMAT).to_string()),
            Value::List(items) => Value::List(items.into_iter().map(Value::render_dates).collect()),
            Value::Map(m) => Value::Map(m.into_iter().map(|(k, v)| (k, v.render_dates())).collect()),
            other => other,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Structural equality used by the join engine: scalars compare directly, lists
    /// element-wise, timestamps as a point in time (so an offset-bearing and a
    /// UTC-normalized timestamp referring to the same instant still match).
    pub fn structurally_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.structurally_eq(y))
            }
            _ => self == other,
        }
    }
}

pub fn parse_iso8601(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
        }
    }
    None
}

/// Convert a serde_json value (the shape a document body is stored/transported as) into
/// the engine's `Value`, promoting date-shaped strings along the way.
pub fn from_json(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Value::from_literal_str(s),
        serde_json::Value::Array(items) => Value::List(items.iter().map(from_json).collect()),
        serde_json::Value::Object(map) => {
            Value::Map(map.iter().map(|(k, v)| (k.clone(), from_json(v))).collect())
        }
    }
}

/// Convert a `Value` back to JSON for storage/transport, rendering timestamps to text.
pub fn to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::Timestamp(ts) => serde_json::Value::String(ts.format(DATETIME_ISO_FORMAT).to_string()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Map(m) => {
            serde_json::Value::Object(m.iter().map(|(k, v)| (k.clone(), to_json(v))).collect::<Vec<_>>().into_iter().collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_iso8601_strictly() {
        assert!(is_iso8601("2022-03-18T00:00:00"));
        assert!(is_iso8601("2022-03-18T00:00:00.123Z"));
        assert!(is_iso8601("2022-03-18T00:00:00+02:00"));
        assert!(!is_iso8601("2022-03-18"));
        assert!(!is_iso8601("not a date"));
        assert!(!is_iso8601("2022-13-18T00:00:00"));
    }

    #[test]
    fn promotes_bare_scalar_literal() {
        let v = Value::from_literal_str("2022-03-18T00:00:00");
        assert!(matches!(v, Value::Timestamp(_)));
        let v = Value::from_literal_str("plain text");
        assert_eq!(v, Value::Str("plain text".to_string()));
    }

    #[test]
    fn promotes_dates_recursively_through_list() {
        let v = Value::List(vec![Value::Str("2022-03-18T00:00:00".into()), Value::Str("x".into())]);
        let promoted = v.promote_dates();
        match promoted {
            Value::List(items) => {
                assert!(matches!(items[0], Value::Timestamp(_)));
                assert_eq!(items[1], Value::Str("x".into()));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn renders_timestamp_back_to_iso_text() {
        let ts = parse_iso8601("2022-03-18T00:00:00").unwrap();
        let rendered = Value::Timestamp(ts).render_dates();
        assert_eq!(rendered, Value::Str("2022-03-18T00:00:00".to_string()));
    }

    #[test]
    fn structural_equality_matches_lists_elementwise() {
        let a = Value::List(vec![Value::Number(1.0), Value::Str("x".into())]);
        let b = Value::List(vec![Value::Number(1.0), Value::Str("x".into())]);
        assert!(a.structurally_eq(&b));
    }
}
