use crate::ipc::error::{core_err, err, ok};
use crate::ipc::helpers::{db_conn, require_role, required_i64, required_str};
use crate::ipc::types::{AppState, Request};
use crate::roster::{self, Role};
use serde_json::json;

fn handle_users_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let username = match required_str(req, "username") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    if username.is_empty() || name.is_empty() {
        return err(&req.id, "bad_params", "username and name must not be empty", None);
    }
    let role = match required_str(req, "role") {
        Ok(v) => match v.parse::<Role>() {
            Ok(r) => r,
            Err(e) => return err(&req.id, "bad_params", e, None),
        },
        Err(resp) => return resp,
    };
    // Hashing happens upstream; the stored credential is opaque here.
    let credential_hash = match required_str(req, "credentialHash") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match roster::create_user(conn, &username, &credential_hash, &name, role) {
        Ok(user_id) => ok(&req.id, json!({ "userId": user_id })),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_users_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user_id = match required_i64(req, "userId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match roster::user_by_id(conn, user_id) {
        Ok(user) => ok(&req.id, json!({ "user": user })),
        Err(e) => core_err(&req.id, &e),
    }
}

// Store surface for the transport-level login flow: the credential hash is
// returned here and nowhere else, and this process never verifies it.
fn handle_users_get_by_username(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let username = match required_str(req, "username") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match roster::user_by_username(conn, &username) {
        Ok(cred) => ok(
            &req.id,
            json!({ "user": cred.user, "credentialHash": cred.credential_hash }),
        ),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(req, Role::Teacher) {
        return resp;
    }
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match roster::students(conn) {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_seed_demo(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match roster::seed_demo(conn) {
        Ok(seeded) => {
            if seeded {
                tracing::info!("demo roster seeded");
            }
            ok(&req.id, json!({ "seeded": seeded }))
        }
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "users.create" => Some(handle_users_create(state, req)),
        "users.get" => Some(handle_users_get(state, req)),
        "users.getByUsername" => Some(handle_users_get_by_username(state, req)),
        "students.list" => Some(handle_students_list(state, req)),
        "workspace.seedDemo" => Some(handle_seed_demo(state, req)),
        _ => None,
    }
}
