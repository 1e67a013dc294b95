//! Outbound wire envelopes.
//!
//! Every envelope is compact JSON with lowercase keys:
//! `{"component":...,"data":{...},"type":...}`. The default `serde_json`
//! map keeps object keys sorted, which peers rely on for byte-stable
//! output.

use std::sync::Arc;

use serde_json::{json, Map, Value};

/// Callback that receives each formatted outbound envelope.
pub type Sink = Arc<dyn Fn(String) + Send + Sync>;

/// The four integrity envelope flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityKind {
    /// Left half of a split range; carries `tail`.
    CheckLeft,
    /// Right half of a split range.
    CheckRight,
    /// Whole-range confirmation check.
    CheckGlobal,
    /// The range holds no rows at all.
    Clear,
}

impl IntegrityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckLeft => "integrity_check_left",
            Self::CheckRight => "integrity_check_right",
            Self::CheckGlobal => "integrity_check_global",
            Self::Clear => "integrity_clear",
        }
    }
}

/// Checksum and bounds of one half (or the whole) of a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeDigest {
    pub begin: String,
    pub end: String,
    /// 64 lowercase hex characters.
    pub checksum: String,
    /// First key of the right half; set only on left-half digests.
    pub tail: Option<String>,
}

/// Format an integrity envelope. `digest` is `None` only for
/// [`IntegrityKind::Clear`], whose data block carries the session id alone.
pub fn integrity_envelope(
    component: &str,
    kind: IntegrityKind,
    id: i64,
    digest: Option<&RangeDigest>,
) -> String {
    let mut data = Map::new();
    data.insert("id".to_string(), Value::from(id));
    if let Some(digest) = digest {
        data.insert("begin".to_string(), Value::from(digest.begin.as_str()));
        data.insert("end".to_string(), Value::from(digest.end.as_str()));
        data.insert("checksum".to_string(), Value::from(digest.checksum.as_str()));
        if let Some(tail) = &digest.tail {
            data.insert("tail".to_string(), Value::from(tail.as_str()));
        }
    }
    envelope(component, kind.as_str(), Value::Object(data))
}

/// Format a `state` envelope carrying one full row.
///
/// `index` and `timestamp` are echoed with whatever JSON type the dataset
/// produced for the configured columns.
pub fn state_envelope(
    component: &str,
    index: &Value,
    timestamp: &Value,
    attributes: &Map<String, Value>,
) -> String {
    let data = json!({
        "attributes": attributes,
        "index": index,
        "timestamp": timestamp,
    });
    envelope(component, "state", data)
}

fn envelope(component: &str, kind: &str, data: Value) -> String {
    json!({
        "component": component,
        "data": data,
        "type": kind,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_envelope_exact() {
        let digest = RangeDigest {
            begin: "1".to_string(),
            end: "1".to_string(),
            checksum: "c5dcae9d302e6c131194d392700dd52d42e5003677ce5df44cf1473ec5d5f950"
                .to_string(),
            tail: Some("2".to_string()),
        };
        assert_eq!(
            integrity_envelope("test_component", IntegrityKind::CheckLeft, 1, Some(&digest)),
            r#"{"component":"test_component","data":{"begin":"1","checksum":"c5dcae9d302e6c131194d392700dd52d42e5003677ce5df44cf1473ec5d5f950","end":"1","id":1,"tail":"2"},"type":"integrity_check_left"}"#
        );
    }

    #[test]
    fn test_right_envelope_has_no_tail() {
        let digest = RangeDigest {
            begin: "2".to_string(),
            end: "2".to_string(),
            checksum: "c5dcae9d302e6c131194d392700dd52d42e5003677ce5df44cf1473ec5d5f950"
                .to_string(),
            tail: None,
        };
        assert_eq!(
            integrity_envelope("test_component", IntegrityKind::CheckRight, 1, Some(&digest)),
            r#"{"component":"test_component","data":{"begin":"2","checksum":"c5dcae9d302e6c131194d392700dd52d42e5003677ce5df44cf1473ec5d5f950","end":"2","id":1},"type":"integrity_check_right"}"#
        );
    }

    #[test]
    fn test_clear_envelope_carries_id_only() {
        assert_eq!(
            integrity_envelope("fim", IntegrityKind::Clear, 7, None),
            r#"{"component":"fim","data":{"id":7},"type":"integrity_clear"}"#
        );
    }

    #[test]
    fn test_state_envelope_exact() {
        let mut attributes = Map::new();
        attributes.insert("test_index_field".to_string(), Value::from("11"));
        attributes.insert("test_last_event_field".to_string(), Value::from("22"));
        attributes.insert("campo prueba".to_string(), Value::from("prueba"));

        let message = state_envelope(
            "test_component",
            &Value::from("11"),
            &Value::from("22"),
            &attributes,
        );
        assert_eq!(
            message,
            r#"{"component":"test_component","data":{"attributes":{"campo prueba":"prueba","test_index_field":"11","test_last_event_field":"22"},"index":"11","timestamp":"22"},"type":"state"}"#
        );
    }

    #[test]
    fn test_state_envelope_keeps_value_types() {
        let mut attributes = Map::new();
        attributes.insert("path".to_string(), Value::from("/etc/hosts"));
        attributes.insert("last_event".to_string(), Value::from(1596489273i64));

        let message = state_envelope(
            "fim",
            &Value::from("/etc/hosts"),
            &Value::from(1596489273i64),
            &attributes,
        );
        assert_eq!(
            message,
            r#"{"component":"fim","data":{"attributes":{"last_event":1596489273,"path":"/etc/hosts"},"index":"/etc/hosts","timestamp":1596489273},"type":"state"}"#
        );
    }
}
