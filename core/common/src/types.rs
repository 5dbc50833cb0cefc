//! Common types used throughout DriveDesk.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// MIME type the remote service uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
/// MIME type of native spreadsheets.
pub const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";
/// Prefix shared by all native Workspace formats (docs, sheets, folders, ...).
pub const NATIVE_MIME_PREFIX: &str = "application/vnd.google-apps.";

/// Opaque identifier of a remote entry.
///
/// Ids are assigned by the remote service; they are never derived locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Create a new EntryId from a string.
    ///
    /// # Errors
    /// - Returns error if id is empty
    pub fn new(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(crate::Error::InvalidInput(
                "EntryId cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parent a listing is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParentRef {
    /// The account's root folder.
    Root,
    /// A folder addressed by id.
    Folder(EntryId),
}

impl ParentRef {
    /// Id to put in a parents filter; the remote service aliases the root as `root`.
    pub fn as_query_id(&self) -> &str {
        match self {
            ParentRef::Root => "root",
            ParentRef::Folder(id) => id.as_str(),
        }
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentRef::Root => write!(f, "root"),
            ParentRef::Folder(id) => write!(f, "{}", id),
        }
    }
}

/// Whether a MIME type denotes a folder.
pub fn is_folder_mime(mime_type: &str) -> bool {
    mime_type == FOLDER_MIME_TYPE
}

/// Whether a MIME type is a native Workspace format with no raw byte content.
pub fn is_native_mime(mime_type: &str) -> bool {
    mime_type.starts_with(NATIVE_MIME_PREFIX)
}

/// Secret string that zeroizes on drop and never prints itself.
#[derive(Clone, Zeroize, Serialize, Deserialize)]
#[zeroize(drop)]
#[serde(transparent)]
pub struct SensitiveString(String);

impl SensitiveString {
    /// Wrap a secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Borrow the secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveString([REDACTED; {} bytes])", self.0.len())
    }
}
