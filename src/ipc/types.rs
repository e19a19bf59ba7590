use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::roster::Role;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Authenticated caller identity, established by the transport layer and
/// carried explicitly in each request. The core never reads ambient session
/// state.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
}
