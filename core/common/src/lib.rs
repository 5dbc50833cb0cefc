//! Common utilities and types shared across DriveDesk crates.
//!
//! Holds the error type every layer returns and the small identifier types
//! that flow between the storage backends, the façade and the web layer.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    is_folder_mime, is_native_mime, EntryId, ParentRef, SensitiveString, FOLDER_MIME_TYPE,
    NATIVE_MIME_PREFIX, SPREADSHEET_MIME_TYPE,
};
