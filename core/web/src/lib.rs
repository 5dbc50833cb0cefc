//! Web front end for DriveDesk.
//!
//! Serves a single HTML page with upload, read, download and delete forms,
//! backed by JSON and file-download routes over a [`FileManager`].
//!
//! [`FileManager`]: drivedesk_storage::FileManager

pub mod config;
pub mod error;
pub mod export;
pub mod handler;
pub mod page;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{WebError, WebResult};
pub use export::listing_workbook;
pub use router::build_router;
pub use server::WebServer;
pub use state::AppState;
