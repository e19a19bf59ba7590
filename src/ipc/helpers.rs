use rusqlite::Connection;
use std::collections::HashSet;

use crate::ipc::error::err;
use crate::ipc::types::{AppState, Principal, Request};
use crate::roster::Role;

pub fn db_conn<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn required_i64(req: &Request, key: &str) -> Result<i64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn principal(req: &Request) -> Result<Principal, serde_json::Value> {
    let Some(raw) = req.params.get("principal") else {
        return Err(err(&req.id, "bad_params", "missing principal", None));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| err(&req.id, "bad_params", format!("bad principal: {e}"), None))
}

pub fn require_role(req: &Request, role: Role) -> Result<Principal, serde_json::Value> {
    let p = principal(req)?;
    if p.role != role {
        return Err(err(
            &req.id,
            "access_denied",
            format!("{role} role required"),
            None,
        ));
    }
    Ok(p)
}

/// Parse `params.studentIds` as a non-empty integer array, de-duplicated in
/// first-seen order.
pub fn parse_student_ids(req: &Request) -> Result<Vec<i64>, serde_json::Value> {
    let Some(raw) = req.params.get("studentIds").and_then(|v| v.as_array()) else {
        return Err(err(&req.id, "bad_params", "missing studentIds", None));
    };
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for v in raw {
        let Some(id) = v.as_i64() else {
            return Err(err(
                &req.id,
                "bad_params",
                "studentIds must contain only integers",
                None,
            ));
        };
        if seen.insert(id) {
            out.push(id);
        }
    }
    if out.is_empty() {
        return Err(err(
            &req.id,
            "bad_params",
            "studentIds must contain at least one student id",
            None,
        ));
    }
    Ok(out)
}
