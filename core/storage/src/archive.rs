//! Zip archive builder for listings.

use futures::StreamExt;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use drivedesk_common::{Error, Result};

use crate::facade::Listing;
use crate::provider::{RemoteEntry, RemoteStore};

/// Completed in-memory zip archive.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBuffer {
    bytes: Vec<u8>,
    /// Archive entry names, in write order.
    pub file_names: Vec<String>,
    /// Titles left out because they have no byte content.
    pub skipped: Vec<String>,
}

impl ArchiveBuffer {
    /// Raw zip bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take ownership of the zip bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Reader positioned at the start of the archive.
    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn zip_error(err: zip::result::ZipError) -> Error {
    Error::Archive(err.to_string())
}

/// Packages listing entries into a deflate-compressed zip.
pub struct ArchiveBuilder {
    store: Arc<dyn RemoteStore>,
}

impl ArchiveBuilder {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Build an archive from every downloadable entry of `listing`.
    ///
    /// Entries are written in listing order, each named after its title and
    /// streamed straight from the store. Native formats (spreadsheets,
    /// documents, folders) are skipped. When titles repeat, only the last
    /// occurrence is written.
    ///
    /// # Errors
    /// - Any fetch failure aborts the whole build
    pub async fn build(&self, listing: &Listing) -> Result<ArchiveBuffer> {
        let entries = listing.entries();

        let mut last_index: HashMap<&str, usize> = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            if !entry.is_native() {
                last_index.insert(entry.title.as_str(), index);
            }
        }

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut buffer = ArchiveBuffer::default();

        for (index, entry) in entries.iter().enumerate() {
            if entry.is_native() {
                tracing::info!(
                    title = %entry.title,
                    mime_type = %entry.mime_type,
                    "Skipping native entry with no byte content"
                );
                buffer.skipped.push(entry.title.clone());
                continue;
            }
            if last_index.get(entry.title.as_str()) != Some(&index) {
                tracing::warn!(
                    title = %entry.title,
                    id = %entry.id,
                    "Duplicate title in listing; a later entry replaces this one"
                );
                continue;
            }

            self.append_entry(&mut writer, entry, options).await?;
            buffer.file_names.push(entry.title.clone());
        }

        buffer.bytes = writer.finish().map_err(zip_error)?.into_inner();
        tracing::info!(
            files = buffer.file_names.len(),
            skipped = buffer.skipped.len(),
            bytes = buffer.bytes.len(),
            "Archive built"
        );
        Ok(buffer)
    }

    async fn append_entry(
        &self,
        writer: &mut ZipWriter<Cursor<Vec<u8>>>,
        entry: &RemoteEntry,
        options: SimpleFileOptions,
    ) -> Result<()> {
        let mut stream = self.store.fetch_stream(&entry.id).await?;
        writer
            .start_file(entry.title.as_str(), options)
            .map_err(zip_error)?;

        let mut written = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk)?;
            written += chunk.len();
        }

        tracing::debug!(title = %entry.title, bytes = written, "Added to archive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::provider::EntryQuery;
    use drivedesk_common::{EntryId, ParentRef, SPREADSHEET_MIME_TYPE};
    use std::io::Read;
    use zip::ZipArchive;

    async fn root_listing(store: &MemoryStore) -> Listing {
        let entries = store
            .query(&EntryQuery::children(ParentRef::Root))
            .await
            .unwrap();
        Listing::new(None, entries)
    }

    fn read_archive(buffer: &ArchiveBuffer) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(buffer.reader()).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                file.read_to_end(&mut data).unwrap();
                (file.name().to_string(), data)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_spreadsheet_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        store.insert("a.txt", "text/plain", ParentRef::Root, "alpha").await;
        store
            .insert("b.csv", SPREADSHEET_MIME_TYPE, ParentRef::Root, "")
            .await;

        let listing = root_listing(&store).await;
        let buffer = ArchiveBuilder::new(store.clone()).build(&listing).await.unwrap();

        assert_eq!(
            read_archive(&buffer),
            vec![("a.txt".to_string(), b"alpha".to_vec())]
        );
        assert_eq!(buffer.skipped, vec!["b.csv".to_string()]);
    }

    #[tokio::test]
    async fn test_folders_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        store.insert_folder("nested", ParentRef::Root).await;
        store.insert("c.bin", "application/octet-stream", ParentRef::Root, vec![0u8, 1, 2]).await;

        let listing = root_listing(&store).await;
        let buffer = ArchiveBuilder::new(store.clone()).build(&listing).await.unwrap();

        assert_eq!(buffer.file_names, vec!["c.bin".to_string()]);
        assert_eq!(buffer.skipped, vec!["nested".to_string()]);
    }

    #[tokio::test]
    async fn test_documents_do_not_abort_build() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert("minutes", "application/vnd.google-apps.document", ParentRef::Root, "")
            .await;
        store.insert("a.txt", "text/plain", ParentRef::Root, "alpha").await;

        let listing = root_listing(&store).await;
        let buffer = ArchiveBuilder::new(store.clone()).build(&listing).await.unwrap();

        assert_eq!(buffer.file_names, vec!["a.txt".to_string()]);
        assert_eq!(buffer.skipped, vec!["minutes".to_string()]);
    }

    #[tokio::test]
    async fn test_listing_order_preserved() {
        let store = Arc::new(MemoryStore::new());
        store.insert("z.txt", "text/plain", ParentRef::Root, "z").await;
        store.insert("a.txt", "text/plain", ParentRef::Root, "a").await;

        let listing = root_listing(&store).await;
        let buffer = ArchiveBuilder::new(store.clone()).build(&listing).await.unwrap();

        let names: Vec<String> = read_archive(&buffer).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["z.txt".to_string(), "a.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_titles_keep_last() {
        let store = Arc::new(MemoryStore::new());
        store.insert("same.txt", "text/plain", ParentRef::Root, "first").await;
        store.insert("same.txt", "text/plain", ParentRef::Root, "second").await;

        let listing = root_listing(&store).await;
        let buffer = ArchiveBuilder::new(store.clone()).build(&listing).await.unwrap();

        assert_eq!(
            read_archive(&buffer),
            vec![("same.txt".to_string(), b"second".to_vec())]
        );
    }

    #[tokio::test]
    async fn test_empty_listing_gives_valid_empty_archive() {
        let store = Arc::new(MemoryStore::new());
        let buffer = ArchiveBuilder::new(store.clone())
            .build(&Listing::new(None, vec![]))
            .await
            .unwrap();

        assert!(!buffer.is_empty());
        assert!(read_archive(&buffer).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_build() {
        let store = Arc::new(MemoryStore::new());
        store.insert("a.txt", "text/plain", ParentRef::Root, "a").await;
        let mut listing = root_listing(&store).await;
        listing.push(RemoteEntry {
            id: EntryId::new("ghost").unwrap(),
            title: "ghost.txt".to_string(),
            mime_type: "text/plain".to_string(),
            parents: vec!["root".to_string()],
            trashed: false,
        });

        let result = ArchiveBuilder::new(store.clone()).build(&listing).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
