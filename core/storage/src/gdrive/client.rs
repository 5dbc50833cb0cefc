//! Google Drive API client.

use futures::StreamExt;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};

use drivedesk_common::{EntryId, Error, Result};

use crate::provider::{ByteStream, EntryQuery, RemoteEntry};

use super::auth::Session;

/// Google Drive API base URL.
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
/// Google Drive upload API base URL.
pub const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Fields requested for every file resource.
const FILE_FIELDS: &str = "id,name,mimeType,parents,trashed";
const OCTET_STREAM: &str = "application/octet-stream";

/// Page size for list requests (the API maximum).
const PAGE_SIZE: &str = "1000";

/// Google Drive file metadata from API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID.
    pub id: String,
    /// File name (the entry's title).
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Parent folder IDs.
    #[serde(default)]
    pub parents: Vec<String>,
    /// Trashed status.
    #[serde(default)]
    pub trashed: bool,
}

impl DriveFile {
    /// Convert into the backend-neutral entry.
    pub fn into_entry(self) -> Result<RemoteEntry> {
        Ok(RemoteEntry {
            id: EntryId::new(self.id)
                .map_err(|_| Error::Remote("Drive returned a file without an id".to_string()))?,
            title: self.name,
            mime_type: self.mime_type,
            parents: self.parents,
            trashed: self.trashed,
        })
    }
}

/// Response from listing files.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListResponse {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Base URLs the client talks to. Overridable so tests can point at a local
/// server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveEndpoints {
    pub api_base: String,
    pub upload_base: String,
}

impl Default for DriveEndpoints {
    fn default() -> Self {
        Self {
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: DRIVE_UPLOAD_BASE.to_string(),
        }
    }
}

/// Escape a value for use inside a single-quoted Drive query literal.
pub fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Render an [`EntryQuery`] in the Drive `q` syntax.
pub fn build_query(query: &EntryQuery) -> String {
    match query {
        EntryQuery::Children { parent } => format!(
            "'{}' in parents and trashed = false",
            escape_query_literal(parent.as_query_id())
        ),
        EntryQuery::TitleEquals { title } => format!(
            "name = '{}' and trashed = false",
            escape_query_literal(title)
        ),
    }
}

/// Build a `multipart/related` body: JSON metadata part, then content part.
fn multipart_related_body(
    boundary: &str,
    metadata_json: &str,
    content_type: &str,
    data: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + metadata_json.len() + 256);

    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata_json.as_bytes());
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{}--", boundary).as_bytes());
    body
}

/// Google Drive API client.
pub struct DriveClient {
    http: Client,
    session: Session,
    endpoints: DriveEndpoints,
}

impl DriveClient {
    /// Create a new Drive client.
    pub fn new(http: Client, session: Session, endpoints: DriveEndpoints) -> Self {
        Self {
            http,
            session,
            endpoints,
        }
    }

    /// Session this client authenticates with.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get authorization header.
    async fn auth_header(&self) -> Result<String> {
        let token = self.session.access_token().await?;
        Ok(format!("Bearer {}", token))
    }

    /// List every file matching a `q` expression, following page tokens.
    pub async fn list_files(&self, q: &str) -> Result<Vec<DriveFile>> {
        let url = format!("{}/files", self.endpoints.api_base);
        let fields = format!("nextPageToken,files({})", FILE_FIELDS);
        let mut all_files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let auth = self.auth_header().await?;
            let mut request = self
                .http
                .get(&url)
                .header(header::AUTHORIZATION, auth)
                .query(&[
                    ("q", q),
                    ("fields", fields.as_str()),
                    ("pageSize", PAGE_SIZE),
                ]);

            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            tracing::debug!(q, page = ?page_token, "Listing Drive files");
            let response = request
                .send()
                .await
                .map_err(|e| Error::Network(format!("Failed to list files: {}", e)))?;

            let list_response: FileListResponse = self.handle_response(response).await?;
            all_files.extend(list_response.files);

            match list_response.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(all_files)
    }

    /// Create a file with content in one multipart request.
    pub async fn create_file(
        &self,
        name: &str,
        mime_type: Option<&str>,
        parent_id: Option<&str>,
        data: Vec<u8>,
    ) -> Result<DriveFile> {
        let url = format!("{}/files", self.endpoints.upload_base);
        let auth = self.auth_header().await?;

        let mut metadata = serde_json::json!({ "name": name });
        if let Some(mime_type) = mime_type {
            metadata["mimeType"] = serde_json::json!(mime_type);
        }
        if let Some(parent) = parent_id {
            metadata["parents"] = serde_json::json!([parent]);
        }
        let metadata_json = serde_json::to_string(&metadata)?;

        let boundary = format!("drivedesk-{}", uuid::Uuid::new_v4().simple());
        let content_type = mime_type.unwrap_or(OCTET_STREAM);
        let body = multipart_related_body(&boundary, &metadata_json, content_type, &data);

        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, auth)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to create file: {}", e)))?;

        self.handle_response(response).await
    }

    /// Replace the content of an existing file.
    ///
    /// Drive keeps the stored type unless the new content names one.
    pub async fn update_content(
        &self,
        file_id: &str,
        mime_type: Option<&str>,
        data: Vec<u8>,
    ) -> Result<DriveFile> {
        let url = format!("{}/files/{}", self.endpoints.upload_base, file_id);
        let auth = self.auth_header().await?;

        let response = self
            .http
            .patch(&url)
            .header(header::AUTHORIZATION, auth)
            .header(header::CONTENT_TYPE, mime_type.unwrap_or(OCTET_STREAM))
            .query(&[("uploadType", "media"), ("fields", FILE_FIELDS)])
            .body(data)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to update file: {}", e)))?;

        self.handle_response(response).await
    }

    async fn start_download(&self, file_id: &str) -> Result<reqwest::Response> {
        let url = format!("{}/files/{}", self.endpoints.api_base, file_id);
        let auth = self.auth_header().await?;

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, auth)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to download file: {}", e)))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::status_error(response, "Download failed").await)
        }
    }

    /// Download file content.
    pub async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        self.start_download(file_id)
            .await?
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| Error::Network(format!("Failed to read download response: {}", e)))
    }

    /// Download file as a stream.
    pub async fn download_stream(&self, file_id: &str) -> Result<ByteStream> {
        let stream = self
            .start_download(file_id)
            .await?
            .bytes_stream()
            .map(|result| result.map_err(|e| Error::Network(format!("Stream read error: {}", e))));

        Ok(Box::pin(stream))
    }

    /// Move a file to the trash.
    pub async fn trash(&self, file_id: &str) -> Result<DriveFile> {
        let url = format!("{}/files/{}", self.endpoints.api_base, file_id);
        let auth = self.auth_header().await?;

        let response = self
            .http
            .patch(&url)
            .header(header::AUTHORIZATION, auth)
            .query(&[("fields", FILE_FIELDS)])
            .json(&serde_json::json!({ "trashed": true }))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to trash file: {}", e)))?;

        self.handle_response(response).await
    }

    /// Handle API response with error checking.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Remote(format!("Failed to parse response: {}", e)))
        } else {
            Err(Self::status_error(response, "API error").await)
        }
    }

    async fn status_error(response: reqwest::Response, context: &str) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Error::NotFound(format!("{}: {}", context, body)),
            StatusCode::UNAUTHORIZED => {
                Error::Authentication("Invalid or expired token".to_string())
            }
            StatusCode::FORBIDDEN => Error::PermissionDenied(format!("{}: {}", context, body)),
            _ => Error::Remote(format!("{}: {} - {}", context, status, body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivedesk_common::ParentRef;
    use proptest::prelude::*;

    fn unescape(literal: &str) -> Option<String> {
        let mut out = String::new();
        let mut chars = literal.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => out.push(chars.next()?),
                '\'' => return None,
                c => out.push(c),
            }
        }
        Some(out)
    }

    #[test]
    fn test_escape_query_literal() {
        assert_eq!(escape_query_literal("plain.txt"), "plain.txt");
        assert_eq!(escape_query_literal("o'brien.csv"), "o\\'brien.csv");
        assert_eq!(escape_query_literal("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_build_children_query() {
        assert_eq!(
            build_query(&EntryQuery::children(ParentRef::Root)),
            "'root' in parents and trashed = false"
        );
        let folder = ParentRef::Folder(EntryId::new("1xYz").unwrap());
        assert_eq!(
            build_query(&EntryQuery::children(folder)),
            "'1xYz' in parents and trashed = false"
        );
    }

    #[test]
    fn test_build_title_query() {
        assert_eq!(
            build_query(&EntryQuery::title("it's.txt")),
            "name = 'it\\'s.txt' and trashed = false"
        );
    }

    #[test]
    fn test_multipart_body_layout() {
        let body = multipart_related_body("XYZ", r#"{"name":"a"}"#, "text/plain", b"hello");
        let text = String::from_utf8(body).unwrap();

        assert!(text.starts_with("--XYZ\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{\"name\":\"a\"}\r\n"));
        assert!(text.contains("--XYZ\r\nContent-Type: text/plain\r\n\r\nhello\r\n"));
        assert!(text.ends_with("--XYZ--"));
    }

    #[test]
    fn test_drive_file_from_api_json() {
        let json = r#"{
            "id": "abc123",
            "name": "report.csv",
            "mimeType": "text/csv",
            "parents": ["root"],
            "size": "42"
        }"#;
        let file: DriveFile = serde_json::from_str(json).unwrap();
        assert!(!file.trashed);

        let entry = file.into_entry().unwrap();
        assert_eq!(entry.id.as_str(), "abc123");
        assert_eq!(entry.title, "report.csv");
        assert_eq!(entry.parents, vec!["root".to_string()]);
    }

    #[test]
    fn test_drive_file_without_id_is_rejected() {
        let file = DriveFile {
            id: String::new(),
            name: "x".to_string(),
            mime_type: "text/plain".to_string(),
            parents: vec![],
            trashed: false,
        };
        assert!(matches!(file.into_entry(), Err(Error::Remote(_))));
    }

    #[test]
    fn test_list_response_tolerates_missing_files() {
        let list: FileListResponse = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
        assert!(list.next_page_token.is_none());
    }

    proptest! {
        #[test]
        fn escaped_literal_unescapes_to_original(title in ".*") {
            let escaped = escape_query_literal(&title);
            prop_assert_eq!(unescape(&escaped), Some(title));
        }
    }
}
