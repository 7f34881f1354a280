/// Database types for pending schedule drafts
use crate::schedule::Draft;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Row as stored; assignment lists are JSON strings.
#[derive(Debug, Clone)]
pub struct DbDraft {
    pub draft_id: i64,
    pub section_id: Option<i64>,
    pub initial_assignments: String, // JSON string
    pub pending_assignments: String, // JSON string
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub draft_id: i64,
    #[serde(flatten)]
    pub draft: Draft,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbDraft> for DraftRecord {
    type Error = DraftStoreError;

    fn try_from(row: DbDraft) -> Result<Self, Self::Error> {
        Ok(DraftRecord {
            draft_id: row.draft_id,
            draft: Draft {
                section_id: row.section_id,
                initial: serde_json::from_str(&row.initial_assignments)?,
                pending: serde_json::from_str(&row.pending_assignments)?,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Error)]
pub enum DraftStoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt assignment list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Draft store lock poisoned")]
    Poisoned,
}
