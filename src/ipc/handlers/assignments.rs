use crate::groups;
use crate::ipc::error::{core_err, err, ok};
use crate::ipc::helpers::{db_conn, parse_student_ids, require_role, required_i64, required_str};
use crate::ipc::types::{AppState, Request};
use crate::roster::Role;
use serde_json::json;

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let principal = match require_role(req, Role::Teacher) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let question = match required_str(req, "question") {
        Ok(v) => v.trim().to_string(),
        Err(resp) => return resp,
    };
    if question.is_empty() {
        return err(&req.id, "bad_params", "question must not be empty", None);
    }
    let student_ids = match parse_student_ids(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match groups::create_assignment(conn, &question, &student_ids, principal.user_id) {
        Ok(assignment_id) => ok(&req.id, json!({ "assignmentId": assignment_id })),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let principal = match require_role(req, Role::Teacher) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match groups::teacher_assignments(conn, principal.user_id) {
        Ok(assignments) => ok(&req.id, json!({ "assignments": assignments })),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let assignment_id = match required_i64(req, "assignmentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match groups::assignment_by_id(conn, assignment_id) {
        Ok(assignment) => ok(&req.id, json!({ "assignment": assignment })),
        Err(e) => core_err(&req.id, &e),
    }
}

// Role-gated only: the core does not verify group membership, and a closed
// assignment can still be re-answered. Ownership checks stay with the caller.
fn handle_submit_answer(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(req, Role::Student) {
        return resp;
    }
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let assignment_id = match required_i64(req, "assignmentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let answer = match required_str(req, "answer") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match groups::submit_answer(conn, assignment_id, &answer) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_evaluate(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_role(req, Role::Teacher) {
        return resp;
    }
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let assignment_id = match required_i64(req, "assignmentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let score = match required_i64(req, "score") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match groups::evaluate(conn, assignment_id, score) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_mine(state: &mut AppState, req: &Request) -> serde_json::Value {
    let principal = match require_role(req, Role::Student) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match groups::student_assignments(conn, principal.user_id) {
        Ok(assignments) => ok(&req.id, json!({ "assignments": assignments })),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_scores_mine(state: &mut AppState, req: &Request) -> serde_json::Value {
    let principal = match require_role(req, Role::Student) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match groups::student_scores(conn, principal.user_id) {
        Ok(scores) => ok(&req.id, json!({ "scores": scores })),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assignments.create" => Some(handle_create(state, req)),
        "assignments.list" => Some(handle_list(state, req)),
        "assignments.get" => Some(handle_get(state, req)),
        "assignments.submitAnswer" => Some(handle_submit_answer(state, req)),
        "assignments.evaluate" => Some(handle_evaluate(state, req)),
        "assignments.mine" => Some(handle_mine(state, req)),
        "scores.mine" => Some(handle_scores_mine(state, req)),
        _ => None,
    }
}
