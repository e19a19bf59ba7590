use serde_json::json;

use crate::error::CoreError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Map a typed core failure to a response. Storage failures are logged here
/// and surfaced generically; every other variant is user-correctable and
/// passes its message through.
pub fn core_err(id: &str, e: &CoreError) -> serde_json::Value {
    if let CoreError::Storage(detail) = e {
        tracing::error!(%detail, "storage failure");
        return err(id, e.code(), "storage failure", None);
    }
    err(id, e.code(), e.to_string(), None)
}
