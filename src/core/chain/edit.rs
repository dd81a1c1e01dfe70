//! Order edits and new-order requests
//!
//! Client JSON is turned into typed values here. Update bodies are partial:
//! each recognised key becomes one [`OrderEdit`], and keys that are unknown
//! or carry a value of the wrong type are collected as [`InvalidEdit`]s
//! instead of failing the whole update.

use crate::domain::{FieldsyncError, InvalidEdit, OrderRevision, PatientId, Result, RevisionId};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

/// JSON key holding the instructions
pub const KEY_INSTRUCTIONS: &str = "instructions";
/// JSON key holding the scheduled start, in epoch milliseconds
pub const KEY_START_MILLIS: &str = "start_millis";
/// JSON key holding the auto-expire time, in epoch milliseconds
pub const KEY_STOP_MILLIS: &str = "stop_millis";
/// JSON key holding the patient id on create
pub const KEY_PATIENT_UUID: &str = "patient_uuid";
/// JSON key holding an order's stable id
pub const KEY_UUID: &str = "uuid";
/// JSON key holding the current revision id of a resolved order
pub const KEY_REVISION: &str = "revision";

/// A single field change to an order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEdit {
    /// Replace the instructions
    Instructions(String),
    /// Set or clear the scheduled start
    ScheduledStart(Option<DateTime<Utc>>),
    /// Set or clear the auto-expire time
    AutoExpire(Option<DateTime<Utc>>),
}

impl OrderEdit {
    /// Applies the edit to `revision`, returning whether any field changed
    pub fn apply(&self, revision: &mut OrderRevision) -> bool {
        match self {
            OrderEdit::Instructions(text) => {
                if &revision.instructions == text {
                    return false;
                }
                revision.instructions = text.clone();
            }
            OrderEdit::ScheduledStart(start) => {
                if &revision.scheduled_start == start {
                    return false;
                }
                revision.scheduled_start = *start;
            }
            OrderEdit::AutoExpire(expire) => {
                if &revision.auto_expire == expire {
                    return false;
                }
                revision.auto_expire = *expire;
            }
        }
        true
    }
}

/// Result of parsing an update body
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedEdits {
    /// Edits to apply, in key order
    pub edits: Vec<OrderEdit>,

    /// Keys that were rejected
    pub rejected: Vec<InvalidEdit>,
}

/// Parses a partial update body
///
/// # Errors
///
/// Returns `Validation` if the body is not a JSON object. Problems with
/// individual keys are reported in [`ParsedEdits::rejected`].
pub fn parse_edits(body: &Value) -> Result<ParsedEdits> {
    let object = as_object(body)?;
    let mut parsed = ParsedEdits::default();

    for (key, value) in object {
        let edit = match key.as_str() {
            KEY_INSTRUCTIONS => match value {
                Value::String(text) if !text.trim().is_empty() => {
                    Ok(OrderEdit::Instructions(text.clone()))
                }
                Value::String(_) => Err(InvalidEdit::new(key, "instructions cannot be empty")),
                _ => Err(invalid_type(key, value)),
            },
            KEY_START_MILLIS => optional_millis(key, value).map(OrderEdit::ScheduledStart),
            KEY_STOP_MILLIS => optional_millis(key, value).map(OrderEdit::AutoExpire),
            _ => Err(InvalidEdit::new(key, "not the name of an editable property")),
        };
        match edit {
            Ok(edit) => parsed.edits.push(edit),
            Err(rejected) => parsed.rejected.push(rejected),
        }
    }

    Ok(parsed)
}

/// A validated request to create an order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Client-chosen id for the root revision
    pub uuid: Option<RevisionId>,

    /// Patient the order is for
    pub patient_id: PatientId,

    /// Non-empty instructions
    pub instructions: String,

    /// Scheduled start; `None` means "now" at creation
    pub scheduled_start: Option<DateTime<Utc>>,

    /// Auto-expire time
    pub auto_expire: Option<DateTime<Utc>>,
}

impl NewOrder {
    /// Parses a create body
    ///
    /// # Errors
    ///
    /// Returns `Validation` when `patient_uuid` is missing or `instructions`
    /// is missing or empty, and `InvalidEdit` when an optional field has a
    /// value of the wrong type.
    pub fn from_json(body: &Value) -> Result<Self> {
        let object = as_object(body)?;

        let patient_id = object
            .get(KEY_PATIENT_UUID)
            .and_then(Value::as_str)
            .ok_or_else(|| missing(KEY_PATIENT_UUID))
            .and_then(|id| PatientId::new(id).map_err(FieldsyncError::Validation))?;

        let instructions = object
            .get(KEY_INSTRUCTIONS)
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                FieldsyncError::Validation(format!(
                    "Required key '{KEY_INSTRUCTIONS}' is missing or empty"
                ))
            })?
            .to_string();

        let uuid = match object.get(KEY_UUID) {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => {
                Some(RevisionId::new(id.as_str()).map_err(FieldsyncError::Validation)?)
            }
            Some(other) => return Err(invalid_type(KEY_UUID, other).into()),
        };

        let scheduled_start = object
            .get(KEY_START_MILLIS)
            .map(|v| optional_millis(KEY_START_MILLIS, v))
            .transpose()
            .map_err(FieldsyncError::from)?
            .flatten();
        let auto_expire = object
            .get(KEY_STOP_MILLIS)
            .map(|v| optional_millis(KEY_STOP_MILLIS, v))
            .transpose()
            .map_err(FieldsyncError::from)?
            .flatten();

        Ok(Self {
            uuid,
            patient_id,
            instructions,
            scheduled_start,
            auto_expire,
        })
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>> {
    body.as_object()
        .ok_or_else(|| FieldsyncError::Validation("order body must be a JSON object".to_string()))
}

fn missing(key: &str) -> FieldsyncError {
    FieldsyncError::Validation(format!("Required key '{key}' is missing"))
}

fn invalid_type(key: &str, value: &Value) -> InvalidEdit {
    InvalidEdit::new(key, format!("value of invalid type: {value}"))
}

fn optional_millis(
    key: &str,
    value: &Value,
) -> std::result::Result<Option<DateTime<Utc>>, InvalidEdit> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            let millis = n.as_i64().ok_or_else(|| invalid_type(key, value))?;
            Utc.timestamp_millis_opt(millis)
                .single()
                .map(Some)
                .ok_or_else(|| InvalidEdit::new(key, "timestamp out of range"))
        }
        _ => Err(invalid_type(key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProviderId;
    use serde_json::json;
    use test_case::test_case;

    fn revision() -> OrderRevision {
        OrderRevision::builder()
            .revision_id(RevisionId::new("r1").unwrap())
            .patient_id(PatientId::new("p1").unwrap())
            .orderer(ProviderId::new("guest").unwrap())
            .instructions("Rest")
            .scheduled_start(Some(Utc.timestamp_millis_opt(1_000).unwrap()))
            .created_at(Utc.timestamp_millis_opt(1_000).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_partial_update() {
        let parsed = parse_edits(&json!({
            "start_millis": null,
            "stop_millis": 5000,
        }))
        .unwrap();

        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.edits.len(), 2);
        assert!(parsed.edits.contains(&OrderEdit::ScheduledStart(None)));
        assert!(parsed
            .edits
            .contains(&OrderEdit::AutoExpire(Some(Utc.timestamp_millis_opt(5000).unwrap()))));
    }

    #[test_case(json!({"instructions": null}), "instructions" ; "null instructions")]
    #[test_case(json!({"instructions": ""}), "instructions" ; "empty instructions")]
    #[test_case(json!({"start_millis": "soon"}), "start_millis" ; "string start")]
    #[test_case(json!({"stop_millis": 1.5}), "stop_millis" ; "fractional stop")]
    #[test_case(json!({"dose": "2x"}), "dose" ; "unknown key")]
    fn test_rejected_keys(body: Value, field: &str) {
        let parsed = parse_edits(&body).unwrap();
        assert!(parsed.edits.is_empty());
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].field, field);
    }

    #[test]
    fn test_rejections_do_not_drop_valid_edits() {
        let parsed = parse_edits(&json!({"instructions": "Fluids", "dose": 2})).unwrap();
        assert_eq!(parsed.edits, vec![OrderEdit::Instructions("Fluids".to_string())]);
        assert_eq!(parsed.rejected.len(), 1);
    }

    #[test]
    fn test_parse_edits_requires_object() {
        assert!(matches!(
            parse_edits(&json!([1, 2])),
            Err(FieldsyncError::Validation(_))
        ));
    }

    #[test]
    fn test_apply_reports_changes() {
        let mut rev = revision();
        assert!(!OrderEdit::Instructions("Rest".to_string()).apply(&mut rev));
        assert!(OrderEdit::ScheduledStart(None).apply(&mut rev));
        assert_eq!(rev.scheduled_start, None);
        assert!(!OrderEdit::AutoExpire(None).apply(&mut rev));
    }

    #[test]
    fn test_new_order_from_json() {
        let order = NewOrder::from_json(&json!({
            "uuid": "client-chosen",
            "patient_uuid": "p1",
            "instructions": "Paracetamol",
            "stop_millis": 2000,
        }))
        .unwrap();

        assert_eq!(order.uuid.unwrap().as_str(), "client-chosen");
        assert_eq!(order.scheduled_start, None);
        assert_eq!(order.auto_expire.unwrap().timestamp_millis(), 2000);
    }

    #[test_case(json!({"instructions": "x"}) ; "missing patient")]
    #[test_case(json!({"patient_uuid": "p1"}) ; "missing instructions")]
    #[test_case(json!({"patient_uuid": "p1", "instructions": "  "}) ; "blank instructions")]
    fn test_new_order_validation(body: Value) {
        assert!(matches!(
            NewOrder::from_json(&body),
            Err(FieldsyncError::Validation(_))
        ));
    }

    #[test_case(json!({"patient_uuid": "p1", "instructions": "x", "start_millis": "now"}), "start_millis" ; "bad start")]
    #[test_case(json!({"patient_uuid": "p1", "instructions": "x", "stop_millis": [1]}), "stop_millis" ; "bad stop")]
    #[test_case(json!({"patient_uuid": "p1", "instructions": "x", "uuid": 7}), "uuid" ; "numeric uuid")]
    fn test_new_order_rejects_wrong_types(body: Value, field: &str) {
        match NewOrder::from_json(&body) {
            Err(FieldsyncError::InvalidEdit(rejected)) => assert_eq!(rejected.field, field),
            other => panic!("expected InvalidEdit for {field}, got {other:?}"),
        }
    }
}
