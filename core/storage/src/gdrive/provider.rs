//! Google Drive remote store implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use drivedesk_common::{EntryId, Error, Result};

use crate::provider::{ByteStream, EntryQuery, NewEntry, RemoteEntry, RemoteStore};

use super::auth::{ServiceAccountKey, Session, DRIVE_SCOPE};
use super::client::{build_query, DriveClient, DriveEndpoints, DRIVE_API_BASE, DRIVE_UPLOAD_BASE};

fn default_scope() -> String {
    DRIVE_SCOPE.to_string()
}

fn default_user_agent() -> String {
    format!("DriveDesk/{}", env!("CARGO_PKG_VERSION"))
}

fn default_api_base() -> String {
    DRIVE_API_BASE.to_string()
}

fn default_upload_base() -> String {
    DRIVE_UPLOAD_BASE.to_string()
}

/// Google Drive store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GDriveConfig {
    /// Base64-packaged service-account key JSON.
    pub credential_base64: String,
    /// OAuth2 scope requested for the session.
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_upload_base")]
    pub upload_base: String,
}

impl GDriveConfig {
    /// Configuration with default scope and endpoints.
    pub fn new(credential_base64: impl Into<String>) -> Self {
        Self {
            credential_base64: credential_base64.into(),
            scope: default_scope(),
            user_agent: default_user_agent(),
            api_base: default_api_base(),
            upload_base: default_upload_base(),
        }
    }
}

/// Google Drive remote store.
///
/// Holds one [`Session`] for the life of the process; every call reuses it.
pub struct GDriveStore {
    client: DriveClient,
}

impl GDriveStore {
    /// Create a new Google Drive store.
    ///
    /// Decodes the credential and parses its key; no request is sent until
    /// the first call (or [`GDriveStore::verify`]).
    ///
    /// # Errors
    /// - `Credential` if the key cannot be decoded
    /// - `Network` if the HTTP client cannot be built
    pub fn new(config: GDriveConfig) -> Result<Self> {
        let key = ServiceAccountKey::from_base64(&config.credential_base64)?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        let session = Session::new(http.clone(), &key, config.scope.clone())?;
        let endpoints = DriveEndpoints {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            upload_base: config.upload_base.trim_end_matches('/').to_string(),
        };

        tracing::info!(client_email = %key.client_email, "Google Drive store configured");

        Ok(Self {
            client: DriveClient::new(http, session, endpoints),
        })
    }

    /// Acquire a token now so a bad credential fails fast.
    pub async fn verify(&self) -> Result<()> {
        self.client.session().verify().await
    }

    /// Session used by this store.
    pub fn session(&self) -> &Session {
        self.client.session()
    }
}

#[async_trait]
impl RemoteStore for GDriveStore {
    fn name(&self) -> &str {
        "gdrive"
    }

    async fn query(&self, query: &EntryQuery) -> Result<Vec<RemoteEntry>> {
        let q = build_query(query);
        self.client
            .list_files(&q)
            .await?
            .into_iter()
            .map(|file| file.into_entry())
            .collect()
    }

    async fn create(&self, entry: NewEntry, content: Vec<u8>) -> Result<RemoteEntry> {
        self.client
            .create_file(
                &entry.title,
                entry.mime_type.as_deref(),
                entry.parent.as_ref().map(|p| p.as_str()),
                content,
            )
            .await?
            .into_entry()
    }

    async fn update_content(
        &self,
        id: &EntryId,
        content: Vec<u8>,
        mime_type: Option<&str>,
    ) -> Result<RemoteEntry> {
        self.client
            .update_content(id.as_str(), mime_type, content)
            .await?
            .into_entry()
    }

    async fn fetch_content(&self, id: &EntryId) -> Result<Vec<u8>> {
        self.client.download(id.as_str()).await
    }

    async fn fetch_stream(&self, id: &EntryId) -> Result<ByteStream> {
        self.client.download_stream(id.as_str()).await
    }

    async fn trash(&self, id: &EntryId) -> Result<()> {
        self.client.trash(id.as_str()).await.map(|_| ())
    }
}

/// Create a Google Drive store from a JSON configuration value.
pub fn create_gdrive_store(config: serde_json::Value) -> Result<Arc<dyn RemoteStore>> {
    let gdrive_config: GDriveConfig = serde_json::from_value(config)
        .map_err(|e| Error::InvalidInput(format!("Invalid GDrive config: {}", e)))?;

    Ok(Arc::new(GDriveStore::new(gdrive_config)?))
}
