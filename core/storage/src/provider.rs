//! Remote store trait definition.

use async_trait::async_trait;
use futures::{stream, Stream};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use drivedesk_common::{is_folder_mime, is_native_mime, EntryId, ParentRef, Result};

/// A file or folder record in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Opaque id assigned by the remote service.
    pub id: EntryId,
    /// Display name. Not unique.
    pub title: String,
    /// MIME type identifying the kind of entry.
    pub mime_type: String,
    /// Ids of the folders containing this entry.
    #[serde(default)]
    pub parents: Vec<String>,
    /// Soft-deleted flag.
    #[serde(default)]
    pub trashed: bool,
}

impl RemoteEntry {
    /// Check if this is a folder.
    pub fn is_folder(&self) -> bool {
        is_folder_mime(&self.mime_type)
    }

    /// Native Workspace formats have no downloadable bytes.
    pub fn is_native(&self) -> bool {
        is_native_mime(&self.mime_type)
    }
}

/// Filter for [`RemoteStore::query`]. Both variants exclude trashed entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryQuery {
    /// Entries whose parents include `parent`.
    Children { parent: ParentRef },
    /// Entries whose title equals `title` exactly.
    TitleEquals { title: String },
}

impl EntryQuery {
    pub fn children(parent: ParentRef) -> Self {
        EntryQuery::Children { parent }
    }

    pub fn title(title: impl Into<String>) -> Self {
        EntryQuery::TitleEquals {
            title: title.into(),
        }
    }
}

/// Metadata for an entry about to be created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEntry {
    pub title: String,
    /// Left to the remote service to detect when `None`.
    pub mime_type: Option<String>,
    /// Created under the root when `None`.
    pub parent: Option<EntryId>,
}

impl NewEntry {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: Option<EntryId>) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Byte stream type for downloads.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<bytes::Bytes>> + Send>>;

/// Remote storage API consumed by the directory client, façade and archive
/// builder.
///
/// Implementations own authentication and token refresh. They are shared
/// behind an `Arc` and must not cache listings.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Backend name (e.g., "gdrive", "memory").
    fn name(&self) -> &str;

    /// Return all entries matching `query`, in the order the service returns
    /// them.
    ///
    /// # Errors
    /// - Network/authentication errors. An empty match set is `Ok(vec![])`.
    async fn query(&self, query: &EntryQuery) -> Result<Vec<RemoteEntry>>;

    /// Create a new entry with the given content.
    async fn create(&self, entry: NewEntry, content: Vec<u8>) -> Result<RemoteEntry>;

    /// Replace the content of an existing entry, keeping its id.
    ///
    /// `mime_type` describes the new content; the entry keeps its type when
    /// `None`.
    ///
    /// # Errors
    /// - `NotFound` if `id` does not exist
    async fn update_content(
        &self,
        id: &EntryId,
        content: Vec<u8>,
        mime_type: Option<&str>,
    ) -> Result<RemoteEntry>;

    /// Download the complete content of an entry.
    async fn fetch_content(&self, id: &EntryId) -> Result<Vec<u8>>;

    /// Download content as a stream of chunks.
    ///
    /// The default buffers through [`RemoteStore::fetch_content`].
    async fn fetch_stream(&self, id: &EntryId) -> Result<ByteStream> {
        let data = self.fetch_content(id).await?;
        let stream = stream::once(async move { Ok(bytes::Bytes::from(data)) });
        Ok(Box::pin(stream))
    }

    /// Move an entry to the trash. Entries are never purged.
    async fn trash(&self, id: &EntryId) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivedesk_common::{FOLDER_MIME_TYPE, SPREADSHEET_MIME_TYPE};

    fn entry(mime_type: &str) -> RemoteEntry {
        RemoteEntry {
            id: EntryId::new("1").unwrap(),
            title: "name".to_string(),
            mime_type: mime_type.to_string(),
            parents: vec!["root".to_string()],
            trashed: false,
        }
    }

    #[test]
    fn test_entry_kinds() {
        assert!(entry(FOLDER_MIME_TYPE).is_folder());
        assert!(entry(FOLDER_MIME_TYPE).is_native());
        assert!(entry(SPREADSHEET_MIME_TYPE).is_native());
        assert!(!entry(SPREADSHEET_MIME_TYPE).is_folder());
        assert!(!entry("text/csv").is_native());
    }

    #[test]
    fn test_entry_serialization_defaults() {
        let json = r#"{"id":"abc","title":"a.txt","mime_type":"text/plain"}"#;
        let entry: RemoteEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id.as_str(), "abc");
        assert!(entry.parents.is_empty());
        assert!(!entry.trashed);
    }

    #[test]
    fn test_new_entry_builder() {
        let parent = EntryId::new("folder").unwrap();
        let new = NewEntry::new("report.csv")
            .with_parent(Some(parent.clone()))
            .with_mime_type("text/csv");
        assert_eq!(new.title, "report.csv");
        assert_eq!(new.parent, Some(parent));
        assert_eq!(new.mime_type.as_deref(), Some("text/csv"));
    }
}
