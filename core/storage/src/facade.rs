//! File operations the UI is built on.
//!
//! [`FileManager`] combines title resolution, the remote store and the
//! archive builder into the handful of actions a user can take: upload,
//! list, download, delete.

use futures::StreamExt;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use drivedesk_common::{is_native_mime, EntryId, Error, ParentRef, Result};

use crate::archive::{ArchiveBuffer, ArchiveBuilder};
use crate::directory::DirectoryClient;
use crate::provider::{EntryQuery, NewEntry, RemoteEntry, RemoteStore};

/// Entries of one folder, as returned by the remote query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Listing {
    /// Folder title the listing was requested for; `None` for the root.
    pub folder: Option<String>,
    entries: Vec<RemoteEntry>,
}

/// One displayable listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRow {
    pub id: String,
    pub title: String,
    pub mime_type: String,
}

impl Listing {
    pub fn new(folder: Option<String>, entries: Vec<RemoteEntry>) -> Self {
        Self { folder, entries }
    }

    pub fn entries(&self) -> &[RemoteEntry] {
        &self.entries
    }

    pub fn push(&mut self, entry: RemoteEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows in listing order.
    pub fn rows(&self) -> Vec<ListingRow> {
        self.entries
            .iter()
            .map(|entry| ListingRow {
                id: entry.id.to_string(),
                title: entry.title.clone(),
                mime_type: entry.mime_type.clone(),
            })
            .collect()
    }
}

/// Whether an upload replaced an existing entry or made a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadAction {
    Created,
    Updated,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub entry: RemoteEntry,
    pub action: UploadAction,
    /// Parent folder the entry was created under, when one resolved.
    pub folder_id: Option<EntryId>,
}

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Trashed(EntryId),
    /// No entry carried the title; nothing was changed.
    NotFound,
}

/// Type sent by clients that do not know what they are uploading.
const GENERIC_MIME_TYPE: &str = "application/octet-stream";

/// MIME type for uploaded content: the declared one when it says anything,
/// otherwise a guess from the file name.
pub fn upload_mime_type(title: &str, declared: Option<&str>) -> Option<String> {
    declared
        .map(str::trim)
        .filter(|mime| !mime.is_empty() && *mime != GENERIC_MIME_TYPE)
        .map(str::to_string)
        .or_else(|| {
            mime_guess::from_path(title)
                .first()
                .map(|mime| mime.essence_str().to_string())
        })
}

/// Upload, list, download and delete by title.
#[derive(Clone)]
pub struct FileManager {
    directory: DirectoryClient,
}

impl FileManager {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            directory: DirectoryClient::new(store),
        }
    }

    pub fn directory(&self) -> &DirectoryClient {
        &self.directory
    }

    fn store(&self) -> &Arc<dyn RemoteStore> {
        self.directory.store()
    }

    /// Upload `content` under `title`, replacing the content of an existing
    /// entry with the same title.
    ///
    /// An existing entry keeps its id and location even when `folder` names
    /// a different folder. A `folder` that does not resolve places a new
    /// entry in the root. The stored type comes from [`upload_mime_type`].
    ///
    /// # Errors
    /// - Any failure while resolving, creating or updating
    pub async fn upload(
        &self,
        content: Vec<u8>,
        title: &str,
        folder: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<UploadOutcome> {
        let result = self.upload_inner(content, title, folder, mime_type).await;
        match &result {
            Ok(outcome) => tracing::info!(
                title,
                id = %outcome.entry.id,
                action = ?outcome.action,
                "Uploaded file"
            ),
            Err(e) if e.is_remote() => tracing::error!(title, error = %e, "Upload failed"),
            Err(e) => tracing::warn!(title, error = %e, "Upload rejected"),
        }
        result
    }

    async fn upload_inner(
        &self,
        content: Vec<u8>,
        title: &str,
        folder: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<UploadOutcome> {
        if title.trim().is_empty() {
            return Err(Error::InvalidInput("File name cannot be empty".to_string()));
        }
        let mime_type = upload_mime_type(title, mime_type);

        let existing = self.directory.resolve_file_id(title).await?;

        let folder_id = match folder {
            Some(name) => {
                let id = self.directory.resolve_folder_id(name).await?;
                if id.is_none() {
                    tracing::warn!(folder = name, "Folder not found; uploading to root");
                }
                id
            }
            None => None,
        };

        match existing {
            Some(id) => {
                let entry = self
                    .store()
                    .update_content(&id, content, mime_type.as_deref())
                    .await?;
                Ok(UploadOutcome {
                    entry,
                    action: UploadAction::Updated,
                    folder_id,
                })
            }
            None => {
                let mut new = NewEntry::new(title).with_parent(folder_id.clone());
                if let Some(mime_type) = mime_type {
                    new = new.with_mime_type(mime_type);
                }
                let entry = self.store().create(new, content).await?;
                Ok(UploadOutcome {
                    entry,
                    action: UploadAction::Created,
                    folder_id,
                })
            }
        }
    }

    /// Non-trashed entries of `folder`, or of the root when `None`.
    ///
    /// # Returns
    /// - `Ok(None)` when `folder` names no folder
    pub async fn list(&self, folder: Option<&str>) -> Result<Option<Listing>> {
        let parent = match folder {
            None => ParentRef::Root,
            Some(name) => match self.directory.resolve_folder_id(name).await? {
                Some(id) => ParentRef::Folder(id),
                None => {
                    tracing::info!(folder = name, "Folder not found");
                    return Ok(None);
                }
            },
        };

        let entries = self.store().query(&EntryQuery::children(parent)).await?;
        tracing::debug!(folder = ?folder, count = entries.len(), "Listed folder");
        Ok(Some(Listing::new(folder.map(str::to_string), entries)))
    }

    /// Write the content of entry `id` to `target_path`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    /// - `Unsupported` for native formats, which have no byte content
    /// - Fetch or filesystem failures
    pub async fn download_single(
        &self,
        id: &EntryId,
        target_path: &Path,
        mime_type: &str,
    ) -> Result<u64> {
        if is_native_mime(mime_type) {
            return Err(Error::Unsupported(format!(
                "Entry {} has native type {} and cannot be downloaded",
                id, mime_type
            )));
        }

        let mut stream = self.store().fetch_stream(id).await?;
        let mut file = tokio::fs::File::create(target_path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create {}: {}", target_path.display(), e),
            ))
        })?;

        let copied = async {
            let mut written = 0u64;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok::<u64, Error>(written)
        }
        .await;

        // A failed transfer leaves no partial file behind.
        let written = match copied {
            Ok(written) => written,
            Err(e) => {
                drop(file);
                if let Err(remove) = tokio::fs::remove_file(target_path).await {
                    tracing::warn!(
                        path = %target_path.display(),
                        error = %remove,
                        "Failed to remove partial download"
                    );
                }
                tracing::error!(id = %id, error = %e, "Download failed");
                return Err(e);
            }
        };

        tracing::info!(id = %id, path = %target_path.display(), bytes = written, "Downloaded file");
        Ok(written)
    }

    /// Move the first entry titled `title` to the trash.
    ///
    /// `folder` only appears in the log; the title is resolved globally.
    pub async fn delete(&self, title: &str, folder: Option<&str>) -> Result<DeleteOutcome> {
        let location = folder.unwrap_or("root");

        let Some(id) = self.directory.resolve_file_id(title).await? else {
            tracing::info!(title, folder = location, "Nothing to delete");
            return Ok(DeleteOutcome::NotFound);
        };

        self.store().trash(&id).await.inspect_err(|e| {
            tracing::error!(title, id = %id, error = %e, "Delete failed");
        })?;

        tracing::info!(title, id = %id, folder = location, "Moved file to trash");
        Ok(DeleteOutcome::Trashed(id))
    }

    /// List `folder` and package its downloadable entries into a zip.
    ///
    /// # Returns
    /// - `Ok(None)` when `folder` names no folder
    pub async fn download_folder(
        &self,
        folder: Option<&str>,
    ) -> Result<Option<(Listing, ArchiveBuffer)>> {
        let Some(listing) = self.list(folder).await? else {
            return Ok(None);
        };
        let archive = ArchiveBuilder::new(self.store().clone())
            .build(&listing)
            .await?;
        Ok(Some((listing, archive)))
    }
}
