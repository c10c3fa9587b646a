//! Shared state for the HTTP handlers.

use std::sync::{Arc, Mutex};

use crate::content::ContentStore;
use crate::db::Database;
use crate::error::{AppError, AppResult};

/// Handles to both stores. Cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Database>>,
    content: Arc<ContentStore>,
}

impl AppState {
    pub fn new(db: Database, content: ContentStore) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            content: Arc::new(content),
        }
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Runs `f` on the blocking pool inside one database transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back otherwise,
    /// including when `f` panics.
    pub async fn with_tx<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Database, &ContentStore) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let content = Arc::clone(&self.content);

        tokio::task::spawn_blocking(move || {
            // A panicking request poisons the lock after its transaction was
            // rolled back, so the connection is still consistent.
            let db = db.lock().unwrap_or_else(|poisoned| {
                tracing::warn!("Recovering database handle after a panicked request");
                poisoned.into_inner()
            });
            db.transaction(|db| f(db, content.as_ref()))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Request task failed: {}", e)))?
    }
}
