use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;
use serde::Serialize;

/// Uniform result shape returned by every endpoint.
///
/// Success: `{"success": true, "data": ...}`.
/// Failure: `{"success": false, "code": "...", "error": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    /// Successful result carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            code: None,
            error: None,
        }
    }

    /// Failed result with a stable error code and a message.
    pub fn failure(code: &'static str, error: String) -> Self {
        Self {
            success: false,
            data: None,
            code: Some(code),
            error: Some(error),
        }
    }
}

impl Envelope<()> {
    /// Successful result with no payload.
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            code: None,
            error: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

/// Generate a new random ID (UUIDv4, no dashes).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}

/// Get the current time as an RFC 3339 string.
///
/// Fixed microsecond precision with a `Z` suffix, so that lexical order
/// of stored timestamps is chronological order.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Merge a JSON patch into a base value.
///
/// For each key in `patch`:
/// - If the value is `null`, the key is removed from `base`.
/// - Otherwise, the key is set to the patch value.
///
/// This follows RFC 7386 (JSON Merge Patch) semantics.
pub fn merge_patch(base: &mut serde_json::Value, patch: &serde_json::Value) {
    if let (Some(base_obj), Some(patch_obj)) = (base.as_object_mut(), patch.as_object()) {
        for (key, value) in patch_obj {
            if value.is_null() {
                base_obj.remove(key);
            } else if value.is_object() {
                let entry = base_obj
                    .entry(key.clone())
                    .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
                merge_patch(entry, value);
            } else {
                base_obj.insert(key.clone(), value.clone());
            }
        }
    } else {
        *base = patch.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
    }

    #[test]
    fn test_now_rfc3339_is_sortable() {
        let a = now_rfc3339();
        let b = now_rfc3339();
        assert!(a.ends_with('Z'));
        // 2024-01-01T00:00:00.000000Z
        assert_eq!(a.len(), 27);
        assert!(a <= b);
    }

    #[test]
    fn test_merge_patch() {
        let mut base = serde_json::json!({"a": 1, "b": 2, "c": {"d": 3}});
        let patch = serde_json::json!({"b": null, "c": {"e": 4}, "f": 5});
        merge_patch(&mut base, &patch);
        assert_eq!(
            base,
            serde_json::json!({"a": 1, "c": {"d": 3, "e": 4}, "f": 5})
        );
    }

    #[test]
    fn test_envelope_ok_shape() {
        let json = serde_json::to_value(Envelope::ok(serde_json::json!({"id": "p1"}))).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": {"id": "p1"}}));

        let json = serde_json::to_value(Envelope::done()).unwrap();
        assert_eq!(json, serde_json::json!({"success": true}));
    }
}
