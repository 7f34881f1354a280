/// Database module for pending schedule drafts

mod types;

pub use types::{DraftRecord, DraftStoreError};

use crate::catalog::ScheduleAssignment;
use crate::schedule::Draft;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};
use types::DbDraft;

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_drafts.sql");

pub struct DraftStore {
    db: Mutex<Connection>,
}

impl DraftStore {
    /// Opens the database at `db_path` and initializes the schema
    pub fn new(db_path: &str) -> Result<Self, DraftStoreError> {
        Self::with_connection(Connection::open(db_path)?)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self, DraftStoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, DraftStoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DraftStoreError> {
        self.db.lock().map_err(|_| DraftStoreError::Poisoned)
    }

    /// Stores a new draft and returns it with its assigned id
    pub fn create(&self, draft: &Draft) -> Result<DraftRecord, DraftStoreError> {
        let initial = serde_json::to_string(&draft.initial)?;
        let pending = serde_json::to_string(&draft.pending)?;
        let now = Utc::now();

        let db = self.lock()?;
        db.execute(
            "INSERT INTO drafts (section_id, initial_assignments, pending_assignments, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            (draft.section_id, initial, pending, now),
        )?;

        Ok(DraftRecord {
            draft_id: db.last_insert_rowid(),
            draft: draft.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get(&self, draft_id: i64) -> Result<Option<DraftRecord>, DraftStoreError> {
        let db = self.lock()?;
        let row = db
            .query_row(
                "SELECT draft_id, section_id, initial_assignments, pending_assignments,
                        created_at, updated_at
                 FROM drafts
                 WHERE draft_id = ?",
                [draft_id],
                |row| {
                    Ok(DbDraft {
                        draft_id: row.get(0)?,
                        section_id: row.get(1)?,
                        initial_assignments: row.get(2)?,
                        pending_assignments: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            )
            .optional()?;

        row.map(DraftRecord::try_from).transpose()
    }

    /// Replaces the pending list. Returns false if the draft doesn't exist
    pub fn save_pending(
        &self,
        draft_id: i64,
        pending: &[ScheduleAssignment],
    ) -> Result<bool, DraftStoreError> {
        let pending = serde_json::to_string(pending)?;
        let db = self.lock()?;
        let changed = db.execute(
            "UPDATE drafts SET pending_assignments = ?1, updated_at = ?2 WHERE draft_id = ?3",
            (pending, Utc::now(), draft_id),
        )?;
        Ok(changed > 0)
    }

    pub fn delete(&self, draft_id: i64) -> Result<bool, DraftStoreError> {
        let db = self.lock()?;
        let changed = db.execute("DELETE FROM drafts WHERE draft_id = ?", [draft_id])?;
        Ok(changed > 0)
    }
}
