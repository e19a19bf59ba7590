mod test_support;

use serde_json::json;
use test_support::{
    create_user, request_err, request_ok, select_workspace, spawn_sidecar, student_principal,
    teacher_principal, temp_dir,
};

#[test]
fn create_submit_evaluate_roundtrip() {
    let workspace = temp_dir("groupwork-lifecycle");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let teacher = create_user(&mut stdin, &mut reader, "teach", "Prof. Okoye", "teacher");
    let s1 = create_user(&mut stdin, &mut reader, "s1", "Sana", "student");
    let s2 = create_user(&mut stdin, &mut reader, "s2", "Timo", "student");

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "create",
        "assignments.create",
        json!({
            "principal": teacher_principal(teacher),
            "question": "Why does quicksort degrade on sorted input?",
            "studentIds": [s1, s2]
        }),
    );
    let assignment_id = created
        .get("assignmentId")
        .and_then(|v| v.as_i64())
        .expect("assignmentId");

    let got = request_ok(
        &mut stdin,
        &mut reader,
        "get1",
        "assignments.get",
        json!({ "assignmentId": assignment_id }),
    );
    let a = got.get("assignment").expect("assignment");
    assert_eq!(a.get("status").and_then(|v| v.as_str()), Some("open"));
    assert!(a.get("answer").map(|v| v.is_null()).unwrap_or(false));
    assert!(a.get("score").map(|v| v.is_null()).unwrap_or(false));
    assert_eq!(
        a.get("members").and_then(|v| v.as_array()).map(|m| m.len()),
        Some(2)
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "answer",
        "assignments.submitAnswer",
        json!({
            "principal": student_principal(s1),
            "assignmentId": assignment_id,
            "answer": "A sorted run makes every pivot the minimum."
        }),
    );
    let got = request_ok(
        &mut stdin,
        &mut reader,
        "get2",
        "assignments.get",
        json!({ "assignmentId": assignment_id }),
    );
    let a = got.get("assignment").expect("assignment");
    assert_eq!(
        a.get("answer").and_then(|v| v.as_str()),
        Some("A sorted run makes every pivot the minimum.")
    );
    assert_eq!(
        a.get("status").and_then(|v| v.as_str()),
        Some("open"),
        "answering must not close the assignment"
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "eval",
        "assignments.evaluate",
        json!({ "principal": teacher_principal(teacher), "assignmentId": assignment_id, "score": 28 }),
    );
    let got = request_ok(
        &mut stdin,
        &mut reader,
        "get3",
        "assignments.get",
        json!({ "assignmentId": assignment_id }),
    );
    let a = got.get("assignment").expect("assignment");
    assert_eq!(a.get("status").and_then(|v| v.as_str()), Some("closed"));
    assert_eq!(a.get("score").and_then(|v| v.as_i64()), Some(28));
}

#[test]
fn out_of_range_scores_leave_state_untouched() {
    let workspace = temp_dir("groupwork-score-range");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let teacher = create_user(&mut stdin, &mut reader, "teach", "Prof. Okoye", "teacher");
    let s1 = create_user(&mut stdin, &mut reader, "s1", "Sana", "student");

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "create",
        "assignments.create",
        json!({ "principal": teacher_principal(teacher), "question": "Q", "studentIds": [s1] }),
    );
    let assignment_id = created.get("assignmentId").and_then(|v| v.as_i64()).unwrap();

    for (id, score) in [("high", 31), ("low", -1)] {
        let code = request_err(
            &mut stdin,
            &mut reader,
            id,
            "assignments.evaluate",
            json!({ "principal": teacher_principal(teacher), "assignmentId": assignment_id, "score": score }),
        );
        assert_eq!(code, "invalid_score");
    }

    let got = request_ok(
        &mut stdin,
        &mut reader,
        "get",
        "assignments.get",
        json!({ "assignmentId": assignment_id }),
    );
    let a = got.get("assignment").expect("assignment");
    assert_eq!(a.get("status").and_then(|v| v.as_str()), Some("open"));
    assert!(a.get("score").map(|v| v.is_null()).unwrap_or(false));
}

#[test]
fn reevaluation_keeps_closed_and_takes_last_score() {
    let workspace = temp_dir("groupwork-reevaluate");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let teacher = create_user(&mut stdin, &mut reader, "teach", "Prof. Okoye", "teacher");
    let s1 = create_user(&mut stdin, &mut reader, "s1", "Sana", "student");

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "create",
        "assignments.create",
        json!({ "principal": teacher_principal(teacher), "question": "Q", "studentIds": [s1] }),
    );
    let assignment_id = created.get("assignmentId").and_then(|v| v.as_i64()).unwrap();

    for (id, score) in [("first", 30), ("second", 0)] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "assignments.evaluate",
            json!({ "principal": teacher_principal(teacher), "assignmentId": assignment_id, "score": score }),
        );
    }

    let got = request_ok(
        &mut stdin,
        &mut reader,
        "get",
        "assignments.get",
        json!({ "assignmentId": assignment_id }),
    );
    let a = got.get("assignment").expect("assignment");
    assert_eq!(a.get("status").and_then(|v| v.as_str()), Some("closed"));
    assert_eq!(a.get("score").and_then(|v| v.as_i64()), Some(0));
}

#[test]
fn missing_assignment_reports_not_found() {
    let workspace = temp_dir("groupwork-missing");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let teacher = create_user(&mut stdin, &mut reader, "teach", "Prof. Okoye", "teacher");
    let s1 = create_user(&mut stdin, &mut reader, "s1", "Sana", "student");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "eval",
        "assignments.evaluate",
        json!({ "principal": teacher_principal(teacher), "assignmentId": 999, "score": 10 }),
    );
    assert_eq!(code, "not_found");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "answer",
        "assignments.submitAnswer",
        json!({ "principal": student_principal(s1), "assignmentId": 999, "answer": "x" }),
    );
    assert_eq!(code, "not_found");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "get",
        "assignments.get",
        json!({ "assignmentId": 999 }),
    );
    assert_eq!(code, "not_found");

    // Creating with an unknown student also reports the missing row.
    let code = request_err(
        &mut stdin,
        &mut reader,
        "create",
        "assignments.create",
        json!({ "principal": teacher_principal(teacher), "question": "Q", "studentIds": [s1, 999] }),
    );
    assert_eq!(code, "not_found");
}
