//! In-memory remote store for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use drivedesk_common::{EntryId, Error, ParentRef, Result, FOLDER_MIME_TYPE};

use crate::provider::{EntryQuery, NewEntry, RemoteEntry, RemoteStore};

/// MIME type given to created entries that don't name one.
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
struct StoredEntry {
    entry: RemoteEntry,
    content: Vec<u8>,
}

/// In-memory remote store.
///
/// Behaves like the remote service as far as the façade can observe:
/// insertion-ordered query results, duplicate titles allowed, soft delete.
/// `set_unavailable(true)` makes every call fail with a network error.
pub struct MemoryStore {
    entries: RwLock<Vec<StoredEntry>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate the remote service being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Network("memory store is unavailable".to_string()));
        }
        Ok(())
    }

    /// Seed an entry directly. Returns the assigned id.
    pub async fn insert(
        &self,
        title: &str,
        mime_type: &str,
        parent: ParentRef,
        content: impl Into<Vec<u8>>,
    ) -> EntryId {
        let id = Self::next_id();
        let entry = RemoteEntry {
            id: id.clone(),
            title: title.to_string(),
            mime_type: mime_type.to_string(),
            parents: vec![parent.as_query_id().to_string()],
            trashed: false,
        };
        self.entries.write().await.push(StoredEntry {
            entry,
            content: content.into(),
        });
        id
    }

    /// Seed a folder. Returns its id.
    pub async fn insert_folder(&self, title: &str, parent: ParentRef) -> EntryId {
        self.insert(title, FOLDER_MIME_TYPE, parent, Vec::new()).await
    }

    /// Look up any entry by id, trashed or not.
    pub async fn get(&self, id: &EntryId) -> Option<RemoteEntry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|stored| &stored.entry.id == id)
            .map(|stored| stored.entry.clone())
    }

    /// Number of entries, trashed included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the store holds no entries at all.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn next_id() -> EntryId {
        EntryId::new(Uuid::new_v4().simple().to_string()).expect("uuid string is never empty")
    }

    fn matches(entry: &RemoteEntry, query: &EntryQuery) -> bool {
        if entry.trashed {
            return false;
        }
        match query {
            EntryQuery::Children { parent } => {
                entry.parents.iter().any(|p| p == parent.as_query_id())
            }
            EntryQuery::TitleEquals { title } => &entry.title == title,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn query(&self, query: &EntryQuery) -> Result<Vec<RemoteEntry>> {
        self.check_available()?;
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|stored| Self::matches(&stored.entry, query))
            .map(|stored| stored.entry.clone())
            .collect())
    }

    async fn create(&self, entry: NewEntry, content: Vec<u8>) -> Result<RemoteEntry> {
        self.check_available()?;
        if entry.title.is_empty() {
            return Err(Error::InvalidInput("Entry title cannot be empty".to_string()));
        }

        let mut entries = self.entries.write().await;
        let parent = match entry.parent {
            Some(parent) => {
                let exists = entries
                    .iter()
                    .any(|stored| stored.entry.id == parent && stored.entry.is_folder());
                if !exists {
                    return Err(Error::NotFound(format!("Parent folder not found: {}", parent)));
                }
                parent.as_str().to_string()
            }
            None => ParentRef::Root.as_query_id().to_string(),
        };

        let created = RemoteEntry {
            id: Self::next_id(),
            title: entry.title,
            mime_type: entry
                .mime_type
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            parents: vec![parent],
            trashed: false,
        };
        entries.push(StoredEntry {
            entry: created.clone(),
            content,
        });
        Ok(created)
    }

    async fn update_content(
        &self,
        id: &EntryId,
        content: Vec<u8>,
        mime_type: Option<&str>,
    ) -> Result<RemoteEntry> {
        self.check_available()?;
        let mut entries = self.entries.write().await;
        let stored = entries
            .iter_mut()
            .find(|stored| &stored.entry.id == id)
            .ok_or_else(|| Error::NotFound(format!("Entry not found: {}", id)))?;
        stored.content = content;
        if let Some(mime_type) = mime_type {
            stored.entry.mime_type = mime_type.to_string();
        }
        Ok(stored.entry.clone())
    }

    async fn fetch_content(&self, id: &EntryId) -> Result<Vec<u8>> {
        self.check_available()?;
        let entries = self.entries.read().await;
        match entries.iter().find(|stored| &stored.entry.id == id) {
            Some(stored) if stored.entry.is_native() => Err(Error::Unsupported(format!(
                "Entry {} is a native {} with no byte content",
                id, stored.entry.mime_type
            ))),
            Some(stored) => Ok(stored.content.clone()),
            None => Err(Error::NotFound(format!("Entry not found: {}", id))),
        }
    }

    async fn trash(&self, id: &EntryId) -> Result<()> {
        self.check_available()?;
        let mut entries = self.entries.write().await;
        let stored = entries
            .iter_mut()
            .find(|stored| &stored.entry.id == id)
            .ok_or_else(|| Error::NotFound(format!("Entry not found: {}", id)))?;
        stored.entry.trashed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_fetch() {
        let store = MemoryStore::new();
        let created = store
            .create(NewEntry::new("a.txt"), b"hello".to_vec())
            .await
            .unwrap();

        assert_eq!(created.parents, vec!["root".to_string()]);
        assert_eq!(created.mime_type, DEFAULT_MIME_TYPE);
        assert_eq!(store.fetch_content(&created.id).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_children_query_excludes_trashed_and_other_parents() {
        let store = MemoryStore::new();
        let folder = store.insert_folder("docs", ParentRef::Root).await;
        let keep = store.insert("keep.txt", "text/plain", ParentRef::Root, "k").await;
        let gone = store.insert("gone.txt", "text/plain", ParentRef::Root, "g").await;
        store
            .insert("nested.txt", "text/plain", ParentRef::Folder(folder.clone()), "n")
            .await;
        store.trash(&gone).await.unwrap();

        let root = store
            .query(&EntryQuery::children(ParentRef::Root))
            .await
            .unwrap();
        let ids: Vec<_> = root.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec![folder, keep]);
    }

    #[tokio::test]
    async fn test_title_query_returns_all_duplicates_in_order() {
        let store = MemoryStore::new();
        let first = store.insert("dup", "text/plain", ParentRef::Root, "1").await;
        let second = store.insert("dup", "text/plain", ParentRef::Root, "2").await;

        let found = store.query(&EntryQuery::title("dup")).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, first);
        assert_eq!(found[1].id, second);
    }

    #[tokio::test]
    async fn test_create_under_missing_parent_fails() {
        let store = MemoryStore::new();
        let missing = EntryId::new("nope").unwrap();
        let result = store
            .create(NewEntry::new("x").with_parent(Some(missing)), vec![])
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_keeps_id() {
        let store = MemoryStore::new();
        let id = store.insert("a.txt", "text/plain", ParentRef::Root, "v1").await;
        let updated = store.update_content(&id, b"v2".to_vec(), None).await.unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(store.fetch_content(&id).await.unwrap(), b"v2");
    }

    #[tokio::test]
    async fn test_native_entry_has_no_content() {
        let store = MemoryStore::new();
        let id = store
            .insert("sheet", drivedesk_common::SPREADSHEET_MIME_TYPE, ParentRef::Root, "")
            .await;
        assert!(matches!(
            store.fetch_content(&id).await,
            Err(Error::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_unavailable_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let result = store.query(&EntryQuery::title("a")).await;
        assert!(matches!(result, Err(Error::Network(_))));

        store.set_unavailable(false);
        assert!(store.query(&EntryQuery::title("a")).await.unwrap().is_empty());
    }
}
