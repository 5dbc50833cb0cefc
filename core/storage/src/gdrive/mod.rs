//! Google Drive backend for DriveDesk.
//!
//! - Service-account credential decoding and JWT-bearer token minting
//! - Drive v3 REST client (query, multipart create, media update, download, trash)
//! - `RemoteStore` implementation over the client

pub mod auth;
pub mod client;
pub mod provider;

pub use auth::{ServiceAccountKey, Session, TokenManager, DRIVE_SCOPE};
pub use client::{DriveClient, DriveEndpoints, DriveFile};
pub use provider::{create_gdrive_store, GDriveConfig, GDriveStore};
