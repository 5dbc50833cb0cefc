//! Remote storage layer for DriveDesk.
//!
//! This crate provides a trait-based interface to the remote file service
//! (Google Drive, or an in-memory stand-in for tests), title resolution on
//! top of it, and the file operations the web UI exposes.
//!
//! # Design Principles
//! - Store isolation: no Drive-specific logic above the `RemoteStore` trait
//! - Async operations: all I/O operations are async
//! - Not-found is a value: lookups return `Ok(None)`, failures return `Err`
//! - Streaming: archive and download paths consume content chunk by chunk

pub mod archive;
pub mod directory;
pub mod facade;
pub mod gdrive;
pub mod memory;
pub mod provider;
pub mod registry;

pub use archive::{ArchiveBuffer, ArchiveBuilder};
pub use directory::DirectoryClient;
pub use facade::{
    upload_mime_type, DeleteOutcome, FileManager, Listing, ListingRow, UploadAction,
    UploadOutcome,
};
pub use gdrive::{GDriveConfig, GDriveStore};
pub use memory::MemoryStore;
pub use provider::{ByteStream, EntryQuery, NewEntry, RemoteEntry, RemoteStore};
pub use registry::{create_default_registry, StoreFactory, StoreRegistry};
