use crate::ipc::error::{core_err, err, ok};
use crate::ipc::helpers::{db_conn, require_role};
use crate::ipc::types::{AppState, Request};
use crate::roster::Role;
use crate::standing::{self, SortKey};
use serde_json::json;

fn handle_class_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let principal = match require_role(req, Role::Teacher) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let sort = match req.params.get("sortBy").and_then(|v| v.as_str()) {
        None => SortKey::default(),
        Some(raw) => match raw.parse::<SortKey>() {
            Ok(k) => k,
            Err(e) => return err(&req.id, "bad_params", e, None),
        },
    };

    match standing::class_status(conn, principal.user_id, sort) {
        Ok(standings) => ok(&req.id, json!({ "standings": standings })),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "class.status" => Some(handle_class_status(state, req)),
        _ => None,
    }
}
