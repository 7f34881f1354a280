use crate::catalog::CatalogClient;
use crate::db::DraftStore;
use dashmap::DashMap;
use std::sync::Arc;

/// State shared by every request handler.
pub struct AppState {
    /// Catalog collaborator access and the cached occupancy board
    pub catalog: CatalogClient,
    /// Pending assignment lists
    pub drafts: DraftStore,
    /// Per-draft locks so read-modify-write cycles on one draft don't interleave
    pub draft_locks: DashMap<i64, Arc<tokio::sync::Mutex<()>>>,
}

impl AppState {
    pub fn new(catalog: CatalogClient, drafts: DraftStore) -> Self {
        Self {
            catalog,
            drafts,
            draft_locks: DashMap::new(),
        }
    }

    /// Gets or creates the lock for the given draft.
    pub fn draft_lock(&self, draft_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        self.draft_locks
            .entry(draft_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    pub fn forget_draft_lock(&self, draft_id: i64) {
        self.draft_locks.remove(&draft_id);
    }
}
