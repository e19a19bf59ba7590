use chrono::Utc;
use rusqlite::{params_from_iter, types::Value, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    Closed,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown assignment status: {other}")),
        }
    }
}

pub const MAX_SCORE: i64 = 30;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,
    pub question: String,
    pub answer: Option<String>,
    pub score: Option<i64>,
    pub status: Status,
    pub teacher_id: i64,
    pub created_at: String,
    pub members: Vec<StudentRef>,
}

/// Assignment as seen from a group member's side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAssignment {
    pub id: i64,
    pub question: String,
    pub answer: Option<String>,
    pub score: Option<i64>,
    pub status: Status,
    pub teacher_name: String,
    pub created_at: String,
    pub members: Vec<StudentRef>,
}

/// Closed assignment with the member's equally-apportioned share of the score.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredAssignment {
    pub id: i64,
    pub question: String,
    pub answer: Option<String>,
    pub score: i64,
    pub individual_score: f64,
    pub teacher_name: String,
    pub created_at: String,
    pub members: Vec<StudentRef>,
}

fn dedup_ids(student_ids: &[i64]) -> Vec<i64> {
    let mut ids = student_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Pairing fairness check: the candidate set is admissible iff no unordered
/// pair of its students already shares two or more of this teacher's
/// assignments. Read-only; duplicate ids are treated as a set.
pub fn can_form_group(
    conn: &Connection,
    student_ids: &[i64],
    teacher_id: i64,
) -> Result<bool, CoreError> {
    let ids = dedup_ids(student_ids);
    if ids.len() < 2 {
        // No pair exists, nothing to violate.
        return Ok(true);
    }

    let placeholders = std::iter::repeat("?")
        .take(ids.len())
        .collect::<Vec<_>>()
        .join(",");
    let sql = format!(
        "SELECT 1
         FROM assignment_groups g1
         JOIN assignment_groups g2
           ON g1.assignment_id = g2.assignment_id AND g1.student_id < g2.student_id
         JOIN assignments a ON a.id = g1.assignment_id
         WHERE a.teacher_id = ?
           AND g1.student_id IN ({placeholders})
           AND g2.student_id IN ({placeholders})
         GROUP BY g1.student_id, g2.student_id
         HAVING COUNT(*) >= 2
         LIMIT 1"
    );

    let mut values: Vec<Value> = Vec::with_capacity(ids.len() * 2 + 1);
    values.push(Value::Integer(teacher_id));
    for id in &ids {
        values.push(Value::Integer(*id));
    }
    for id in &ids {
        values.push(Value::Integer(*id));
    }

    let mut stmt = conn.prepare(&sql)?;
    let blocked: Option<i64> = stmt
        .query_row(params_from_iter(values), |r| r.get(0))
        .optional()?;
    Ok(blocked.is_none())
}

fn ensure_student(conn: &Connection, id: i64) -> Result<(), CoreError> {
    let role: Option<String> = conn
        .query_row("SELECT role FROM users WHERE id = ?", [id], |r| r.get(0))
        .optional()?;
    match role.as_deref() {
        Some("student") => Ok(()),
        _ => Err(CoreError::NotFound(format!("student {id}"))),
    }
}

fn ensure_assignment(conn: &Connection, id: i64) -> Result<(), CoreError> {
    let exists: Option<i64> = conn
        .query_row("SELECT 1 FROM assignments WHERE id = ?", [id], |r| r.get(0))
        .optional()?;
    match exists {
        Some(_) => Ok(()),
        None => Err(CoreError::NotFound(format!("assignment {id}"))),
    }
}

/// Check-and-insert unit: the pairing check and the membership inserts run in
/// one transaction so a failed check never leaves partial rows behind and
/// concurrent creations cannot both pass the check on the same connection.
pub fn create_assignment(
    conn: &Connection,
    question: &str,
    student_ids: &[i64],
    teacher_id: i64,
) -> Result<i64, CoreError> {
    let ids = dedup_ids(student_ids);
    if ids.is_empty() {
        return Err(CoreError::ConstraintViolation(
            "an assignment requires at least one group member".to_string(),
        ));
    }
    for id in &ids {
        ensure_student(conn, *id)?;
    }

    let tx = conn.unchecked_transaction()?;

    if !can_form_group(&tx, &ids, teacher_id)? {
        return Err(CoreError::ConstraintViolation(
            "some pair of these students already shares two assignments".to_string(),
        ));
    }

    tx.execute(
        "INSERT INTO assignments(question, status, teacher_id, created_at)
         VALUES(?, 'open', ?, ?)",
        (question, teacher_id, Utc::now().to_rfc3339()),
    )?;
    let assignment_id = tx.last_insert_rowid();

    for id in &ids {
        tx.execute(
            "INSERT INTO assignment_groups(assignment_id, student_id) VALUES(?, ?)",
            (assignment_id, id),
        )?;
    }

    tx.commit()?;
    Ok(assignment_id)
}

/// Overwrites the answer unconditionally. Membership and open-status checks
/// are the caller's responsibility; a closed assignment can be re-answered.
pub fn submit_answer(conn: &Connection, assignment_id: i64, answer: &str) -> Result<(), CoreError> {
    ensure_assignment(conn, assignment_id)?;
    conn.execute(
        "UPDATE assignments SET answer = ? WHERE id = ?",
        (answer, assignment_id),
    )?;
    Ok(())
}

/// Sets the score and forces the assignment closed. Last write wins on the
/// score; an already-closed assignment stays closed.
pub fn evaluate(conn: &Connection, assignment_id: i64, score: i64) -> Result<(), CoreError> {
    if !(0..=MAX_SCORE).contains(&score) {
        return Err(CoreError::InvalidScore(score));
    }
    ensure_assignment(conn, assignment_id)?;
    conn.execute(
        "UPDATE assignments SET score = ?, status = 'closed' WHERE id = ?",
        (score, assignment_id),
    )?;
    Ok(())
}

fn members_of(conn: &Connection, assignment_id: i64) -> Result<Vec<StudentRef>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.name
         FROM assignment_groups g
         JOIN users u ON u.id = g.student_id
         WHERE g.assignment_id = ?
         ORDER BY u.name",
    )?;
    let rows = stmt
        .query_map([assignment_id], |r| {
            Ok(StudentRef {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

struct AssignmentRow {
    id: i64,
    question: String,
    answer: Option<String>,
    score: Option<i64>,
    status: String,
    teacher_id: i64,
    created_at: String,
}

fn row_to_assignment(conn: &Connection, row: AssignmentRow) -> Result<Assignment, CoreError> {
    let status = row
        .status
        .parse::<Status>()
        .map_err(CoreError::Storage)?;
    let members = members_of(conn, row.id)?;
    Ok(Assignment {
        id: row.id,
        question: row.question,
        answer: row.answer,
        score: row.score,
        status,
        teacher_id: row.teacher_id,
        created_at: row.created_at,
        members,
    })
}

pub fn assignment_by_id(conn: &Connection, id: i64) -> Result<Assignment, CoreError> {
    let row = conn
        .query_row(
            "SELECT id, question, answer, score, status, teacher_id, created_at
             FROM assignments WHERE id = ?",
            [id],
            |r| {
                Ok(AssignmentRow {
                    id: r.get(0)?,
                    question: r.get(1)?,
                    answer: r.get(2)?,
                    score: r.get(3)?,
                    status: r.get(4)?,
                    teacher_id: r.get(5)?,
                    created_at: r.get(6)?,
                })
            },
        )
        .optional()?;

    match row {
        Some(row) => row_to_assignment(conn, row),
        None => Err(CoreError::NotFound(format!("assignment {id}"))),
    }
}

pub fn teacher_assignments(conn: &Connection, teacher_id: i64) -> Result<Vec<Assignment>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, question, answer, score, status, teacher_id, created_at
         FROM assignments
         WHERE teacher_id = ?
         ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt
        .query_map([teacher_id], |r| {
            Ok(AssignmentRow {
                id: r.get(0)?,
                question: r.get(1)?,
                answer: r.get(2)?,
                score: r.get(3)?,
                status: r.get(4)?,
                teacher_id: r.get(5)?,
                created_at: r.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|row| row_to_assignment(conn, row))
        .collect()
}

pub fn student_assignments(
    conn: &Connection,
    student_id: i64,
) -> Result<Vec<StudentAssignment>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.question, a.answer, a.score, a.status, a.created_at, t.name
         FROM assignments a
         JOIN assignment_groups g ON g.assignment_id = a.id
         JOIN users t ON t.id = a.teacher_id
         WHERE g.student_id = ?
         ORDER BY a.created_at DESC, a.id DESC",
    )?;
    let rows = stmt
        .query_map([student_id], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<String>>(2)?,
                r.get::<_, Option<i64>>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
                r.get::<_, String>(6)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(rows.len());
    for (id, question, answer, score, status, created_at, teacher_name) in rows {
        let status = status.parse::<Status>().map_err(CoreError::Storage)?;
        out.push(StudentAssignment {
            id,
            question,
            answer,
            score,
            status,
            teacher_name,
            created_at,
            members: members_of(conn, id)?,
        });
    }
    Ok(out)
}

pub fn student_scores(
    conn: &Connection,
    student_id: i64,
) -> Result<Vec<ScoredAssignment>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.question, a.answer, a.score, a.created_at, t.name,
                (SELECT COUNT(*) FROM assignment_groups g2 WHERE g2.assignment_id = a.id)
         FROM assignments a
         JOIN assignment_groups g ON g.assignment_id = a.id
         JOIN users t ON t.id = a.teacher_id
         WHERE g.student_id = ? AND a.status = 'closed' AND a.score IS NOT NULL
         ORDER BY a.created_at DESC, a.id DESC",
    )?;
    let rows = stmt
        .query_map([student_id], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<String>>(2)?,
                r.get::<_, i64>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
                r.get::<_, i64>(6)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(rows.len());
    for (id, question, answer, score, created_at, teacher_name, group_size) in rows {
        out.push(ScoredAssignment {
            id,
            question,
            answer,
            score,
            individual_score: score as f64 / group_size.max(1) as f64,
            teacher_name,
            created_at,
            members: members_of(conn, id)?,
        });
    }
    Ok(out)
}
