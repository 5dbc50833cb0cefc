//! Title-to-id resolution over a remote store.
//!
//! The remote service addresses entries by opaque id, while users name them
//! by title. Titles are not unique; resolution always acts on the first
//! entry the service returns and logs when others were passed over.

use std::sync::Arc;

use drivedesk_common::{EntryId, Result};

use crate::provider::{EntryQuery, RemoteEntry, RemoteStore};

/// Resolves human-readable titles to entry ids.
#[derive(Clone)]
pub struct DirectoryClient {
    store: Arc<dyn RemoteStore>,
}

impl DirectoryClient {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Store this client queries.
    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    /// First non-trashed entry titled `title`.
    ///
    /// # Returns
    /// - `Ok(None)` when nothing carries that title
    ///
    /// # Errors
    /// - Any failure of the underlying query; never folded into `Ok(None)`
    pub async fn lookup(&self, title: &str) -> Result<Option<RemoteEntry>> {
        let mut matches = self.store.query(&EntryQuery::title(title)).await?;

        if matches.len() > 1 {
            tracing::warn!(
                title,
                count = matches.len(),
                chosen = %matches[0].id,
                "Title is ambiguous; acting on the first match"
            );
        }

        if matches.is_empty() {
            Ok(None)
        } else {
            Ok(Some(matches.swap_remove(0)))
        }
    }

    /// Id of the first entry titled `title`.
    pub async fn resolve_file_id(&self, title: &str) -> Result<Option<EntryId>> {
        Ok(self.lookup(title).await?.map(|entry| entry.id))
    }

    /// Id of the folder titled `title`.
    ///
    /// Only the first match is considered: if it is not a folder the title
    /// resolves to `None`, even when a later match is a folder.
    pub async fn resolve_folder_id(&self, title: &str) -> Result<Option<EntryId>> {
        match self.lookup(title).await? {
            Some(entry) if entry.is_folder() => Ok(Some(entry.id)),
            Some(entry) => {
                tracing::info!(
                    title,
                    mime_type = %entry.mime_type,
                    "Title matches an entry that is not a folder"
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
