use rusqlite::Connection;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Assignments,
    Average,
}

impl std::str::FromStr for SortKey {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "assignments" => Ok(Self::Assignments),
            "average" => Ok(Self::Average),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// One student's rollup under a single teacher.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStanding {
    pub id: i64,
    pub name: String,
    pub open_count: i64,
    pub closed_count: i64,
    pub total_count: i64,
    pub average_score: Option<f64>,
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Default)]
struct Tally {
    open: i64,
    closed: i64,
    share_sum: f64,
}

/// Rollup for every student globally, not just this teacher's: students with
/// no assignments under the teacher appear with zero counts and no average.
///
/// The average apportions each closed assignment's score equally among its
/// group members (score / group_size) and means those shares over the
/// student's closed assignments, rounded to 2 decimals. A closed row with no
/// score contributes nothing to the numerator but still counts in the
/// denominator, matching the store aggregate this replaces.
pub fn class_status(
    conn: &Connection,
    teacher_id: i64,
    sort: SortKey,
) -> Result<Vec<StudentStanding>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT g.student_id, a.status, a.score,
                (SELECT COUNT(*) FROM assignment_groups g2 WHERE g2.assignment_id = a.id)
         FROM assignment_groups g
         JOIN assignments a ON a.id = g.assignment_id
         WHERE a.teacher_id = ?",
    )?;
    let memberships = stmt
        .query_map([teacher_id], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<i64>>(2)?,
                r.get::<_, i64>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut tallies: HashMap<i64, Tally> = HashMap::new();
    for (student_id, status, score, group_size) in memberships {
        let t = tallies.entry(student_id).or_default();
        if status == "closed" {
            t.closed += 1;
            if let Some(score) = score {
                t.share_sum += score as f64 / group_size.max(1) as f64;
            }
        } else {
            t.open += 1;
        }
    }

    let mut stmt = conn.prepare("SELECT id, name FROM users WHERE role = 'student'")?;
    let students = stmt
        .query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out: Vec<StudentStanding> = students
        .into_iter()
        .map(|(id, name)| {
            let t = tallies.remove(&id).unwrap_or_default();
            let average_score = if t.closed > 0 {
                Some(round2(t.share_sum / t.closed as f64))
            } else {
                None
            };
            StudentStanding {
                id,
                name,
                open_count: t.open,
                closed_count: t.closed,
                total_count: t.open + t.closed,
                average_score,
            }
        })
        .collect();

    // Sorting stays in Rust so null placement never depends on store collation.
    match sort {
        SortKey::Name => out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id))),
        SortKey::Assignments => out.sort_by(|a, b| {
            b.total_count
                .cmp(&a.total_count)
                .then_with(|| a.name.cmp(&b.name))
                .then(a.id.cmp(&b.id))
        }),
        SortKey::Average => out.sort_by(|a, b| {
            cmp_average_desc(a.average_score, b.average_score)
                .then_with(|| a.name.cmp(&b.name))
                .then(a.id.cmp(&b.id))
        }),
    }

    Ok(out)
}

/// Descending by value; students without an average sort after every student
/// that has one.
fn cmp_average_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
