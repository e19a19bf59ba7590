use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Teacher,
    Student,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Teacher => write!(f, "teacher"),
            Self::Student => write!(f, "student"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Public user shape; the credential hash never travels through this.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: Role,
}

/// Row returned to the authentication layer only.
#[derive(Debug, Clone)]
pub struct Credential {
    pub user: UserRow,
    pub credential_hash: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub id: i64,
    pub username: String,
    pub name: String,
}

pub fn create_user(
    conn: &Connection,
    username: &str,
    credential_hash: &str,
    name: &str,
    role: Role,
) -> Result<i64, CoreError> {
    let taken: Option<i64> = conn
        .query_row("SELECT 1 FROM users WHERE username = ?", [username], |r| {
            r.get(0)
        })
        .optional()?;
    if taken.is_some() {
        return Err(CoreError::Conflict(format!(
            "username already exists: {username}"
        )));
    }

    conn.execute(
        "INSERT INTO users(username, credential_hash, name, role) VALUES(?, ?, ?, ?)",
        (username, credential_hash, name, role.to_string()),
    )?;
    Ok(conn.last_insert_rowid())
}

fn parse_role(raw: &str) -> Result<Role, CoreError> {
    raw.parse::<Role>().map_err(CoreError::Storage)
}

pub fn user_by_id(conn: &Connection, id: i64) -> Result<UserRow, CoreError> {
    let row = conn
        .query_row(
            "SELECT id, username, name, role FROM users WHERE id = ?",
            [id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, username, name, role)) => Ok(UserRow {
            id,
            username,
            name,
            role: parse_role(&role)?,
        }),
        None => Err(CoreError::NotFound(format!("user {id}"))),
    }
}

pub fn user_by_username(conn: &Connection, username: &str) -> Result<Credential, CoreError> {
    let row = conn
        .query_row(
            "SELECT id, username, name, role, credential_hash FROM users WHERE username = ?",
            [username],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, uname, name, role, credential_hash)) => Ok(Credential {
            user: UserRow {
                id,
                username: uname,
                name,
                role: parse_role(&role)?,
            },
            credential_hash,
        }),
        None => Err(CoreError::NotFound(format!("user {username}"))),
    }
}

pub fn students(conn: &Connection) -> Result<Vec<StudentRow>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, username, name FROM users WHERE role = 'student' ORDER BY name",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(StudentRow {
                id: r.get(0)?,
                username: r.get(1)?,
                name: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

const DEMO_CREDENTIAL_HASH: &str = "$demo$not-a-real-hash";

const DEMO_STUDENTS: [&str; 20] = [
    "Ada Byrne",
    "Ben Castillo",
    "Cleo Duval",
    "Dev Ferreira",
    "Edie Grant",
    "Felix Hooper",
    "Gina Ivanova",
    "Hugo Jensen",
    "Ines Keller",
    "Jonas Lindqvist",
    "Kira Moreau",
    "Leo Novak",
    "Maia Okafor",
    "Nils Petrov",
    "Orla Quigley",
    "Priya Rao",
    "Quentin Silva",
    "Rosa Tanaka",
    "Stefan Ucar",
    "Tara Varga",
];

/// Populate an empty workspace with a demo roster and two sample assignments
/// for the first teacher. A non-empty roster is left untouched.
pub fn seed_demo(conn: &Connection) -> Result<bool, CoreError> {
    let user_count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
    if user_count > 0 {
        return Ok(false);
    }

    let teacher1 = create_user(
        conn,
        "teacher1",
        DEMO_CREDENTIAL_HASH,
        "Prof. Ellery",
        Role::Teacher,
    )?;
    create_user(
        conn,
        "teacher2",
        DEMO_CREDENTIAL_HASH,
        "Prof. Marchetti",
        Role::Teacher,
    )?;

    let mut student_ids = Vec::with_capacity(DEMO_STUDENTS.len());
    for name in DEMO_STUDENTS {
        // Surnames double as usernames in the demo roster.
        let username = name.rsplit(' ').next().unwrap_or(name).to_ascii_lowercase();
        student_ids.push(create_user(
            conn,
            &username,
            DEMO_CREDENTIAL_HASH,
            name,
            Role::Student,
        )?);
    }

    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO assignments(question, answer, score, status, teacher_id, created_at)
         VALUES(?, ?, ?, 'closed', ?, ?)",
        (
            "Describe how a hash map resolves key collisions.",
            "Separate chaining keeps a bucket list per slot; open addressing probes for the next free slot.",
            25_i64,
            teacher1,
            &now,
        ),
    )?;
    let closed_id = conn.last_insert_rowid();
    for sid in &student_ids[0..3] {
        conn.execute(
            "INSERT INTO assignment_groups(assignment_id, student_id) VALUES(?, ?)",
            (closed_id, sid),
        )?;
    }

    conn.execute(
        "INSERT INTO assignments(question, status, teacher_id, created_at)
         VALUES(?, 'open', ?, ?)",
        (
            "Compare depth-first and breadth-first traversal with one use case each.",
            teacher1,
            &now,
        ),
    )?;
    let open_id = conn.last_insert_rowid();
    for sid in &student_ids[3..7] {
        conn.execute(
            "INSERT INTO assignment_groups(assignment_id, student_id) VALUES(?, ?)",
            (open_id, sid),
        )?;
    }

    Ok(true)
}
