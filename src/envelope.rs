//! Parsing and classification of structured event log lines.
//!
//! A log line is expected to look like
//! `{"<any>": {"standard": "..", "event": "..", "version": "..", "<data>": {..}}}`,
//! optionally prefixed with `EVENT_JSON:`. The text is emitted by the contract and is
//! untrusted, so every step here yields an absent value instead of failing.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::projector::coerce_text;

/// Marker some contracts put in front of the JSON body (NEP-297).
pub const EVENT_LOG_PREFIX: &str = "EVENT_JSON:";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("log line is empty")]
    Empty,
    #[error("log line is JSON null")]
    Null,
    #[error("log line is not valid JSON: {0}")]
    Malformed(String),
}

/// Parse one raw log line into a JSON value.
pub fn parse_log(raw: &str) -> Result<Value, ParseFailure> {
    let body = raw.trim();
    let body = body.strip_prefix(EVENT_LOG_PREFIX).unwrap_or(body).trim_start();
    if body.is_empty() {
        return Err(ParseFailure::Empty);
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) => Err(ParseFailure::Null),
        Ok(value) => Ok(value),
        Err(e) => Err(ParseFailure::Malformed(e.to_string())),
    }
}

/// Envelope fields of a classified log, borrowing the payload from the parsed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope<'a> {
    pub standard: Option<String>,
    pub event: Option<String>,
    pub version: Option<String>,
    pub payload: Option<&'a Map<String, Value>>,
}

impl Envelope<'_> {
    pub fn is_empty(&self) -> bool {
        self.standard.is_none()
            && self.event.is_none()
            && self.version.is_none()
            && self.payload.is_none()
    }
}

/// Extract the envelope from a parsed log value.
///
/// The first top-level entry is the envelope regardless of its key. The payload is
/// the first envelope entry holding an object.
pub fn classify(value: &Value) -> Envelope<'_> {
    let Some(envelope) = first_entry(value).and_then(Value::as_object) else {
        return Envelope::default();
    };

    let mut classified = Envelope::default();
    for (key, value) in envelope {
        match key.as_str() {
            "standard" => classified.standard = coerce_text(value),
            "event" => classified.event = coerce_text(value),
            "version" => classified.version = coerce_text(value),
            _ => {}
        }
    }
    classified.payload = envelope.values().find_map(Value::as_object);

    classified
}

fn first_entry(value: &Value) -> Option<&Value> {
    value.as_object()?.values().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_log(""), Err(ParseFailure::Empty));
        assert_eq!(parse_log("   "), Err(ParseFailure::Empty));
        assert_eq!(parse_log("EVENT_JSON:"), Err(ParseFailure::Empty));
        assert_eq!(parse_log("null"), Err(ParseFailure::Null));
        assert!(matches!(parse_log("Transfer 5 NEAR to bob"), Err(ParseFailure::Malformed(_))));
        assert!(matches!(parse_log("{\"a\":"), Err(ParseFailure::Malformed(_))));
    }

    #[test]
    fn test_parse_accepts_non_objects() {
        assert_eq!(parse_log("[1,2]"), Ok(json!([1, 2])));
        assert_eq!(parse_log("\"text\""), Ok(json!("text")));
    }

    #[test]
    fn test_parse_strips_event_prefix() {
        let parsed = parse_log(r#"EVENT_JSON:{"standard":"nep171"}"#).unwrap();
        assert_eq!(parsed, json!({"standard": "nep171"}));

        let parsed = parse_log(r#"  EVENT_JSON: {"a":1}  "#).unwrap();
        assert_eq!(parsed, json!({"a": 1}));
    }

    #[test]
    fn test_classify_full_envelope() {
        let value = json!({
            "EVENT_JSON": {
                "standard": "nep171",
                "event": "init",
                "version": "1.0.0",
                "data": {"adminId": "alice"}
            }
        });
        let envelope = classify(&value);

        assert_eq!(envelope.standard.as_deref(), Some("nep171"));
        assert_eq!(envelope.event.as_deref(), Some("init"));
        assert_eq!(envelope.version.as_deref(), Some("1.0.0"));
        assert_eq!(envelope.payload.unwrap().get("adminId"), Some(&json!("alice")));
    }

    #[test]
    fn test_classify_only_reads_first_top_level_entry() {
        let value = json!({
            "first": {"standard": "nep171"},
            "second": {"standard": "other", "event": "init"}
        });
        let envelope = classify(&value);

        assert_eq!(envelope.standard.as_deref(), Some("nep171"));
        assert_eq!(envelope.event, None);
        assert_eq!(envelope.payload, None);
    }

    #[test]
    fn test_classify_payload_written_first() {
        let value = json!({"e": {"data": {"x": 1}, "standard": "nep171"}});
        let envelope = classify(&value);

        assert_eq!(envelope.payload.unwrap().get("x"), Some(&json!(1)));
        assert_eq!(envelope.standard.as_deref(), Some("nep171"));
    }

    #[test]
    fn test_classify_tolerates_structural_mismatch() {
        assert!(classify(&json!([1, 2, 3])).is_empty());
        assert!(classify(&json!({})).is_empty());
        assert!(classify(&json!({"e": "not an object"})).is_empty());
        assert!(classify(&json!({"e": [{"standard": "nep171"}]})).is_empty());

        let value = json!({"e": {"standard": "nep171", "data": [1]}});
        let envelope = classify(&value);
        assert_eq!(envelope.standard.as_deref(), Some("nep171"));
        assert_eq!(envelope.payload, None);
    }

    #[test]
    fn test_classify_skips_uncoercible_envelope_values() {
        let value = json!({"e": {"standard": null, "event": {"x": 1}, "version": 2}});
        let envelope = classify(&value);

        assert_eq!(envelope.standard, None);
        assert_eq!(envelope.event, None);
        assert_eq!(envelope.version.as_deref(), Some("2"));
        assert!(envelope.payload.is_some());
    }
}
