//! Shared application state.

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use drivedesk_storage::FileManager;

/// Shared handler state.
///
/// User actions run one at a time: each handler holds the action guard for
/// the whole façade call.
#[derive(Clone)]
pub struct AppState {
    files: FileManager,
    action_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(files: FileManager) -> Self {
        Self {
            files,
            action_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn files(&self) -> &FileManager {
        &self.files
    }

    /// Backend name of the underlying store.
    pub fn backend(&self) -> &str {
        self.files.directory().store().name()
    }

    /// Wait until no other action runs, then hold the slot.
    pub async fn begin_action(&self) -> MutexGuard<'_, ()> {
        self.action_lock.lock().await
    }
}
