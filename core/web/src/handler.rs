//! HTTP handlers for the page, JSON and download routes.
//!
//! Every action handler holds the [`AppState`] action guard for the whole
//! façade call and maps failures through [`WebError`].

use axum::body::Bytes;
use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::Form;
use serde::{Deserialize, Serialize};
use serde_json::json;

use drivedesk_common::Error;
use drivedesk_storage::{DeleteOutcome, Listing, ListingRow, UploadAction, UploadOutcome};

use crate::error::{WebError, WebResult};
use crate::export::{listing_workbook, EXPORT_FILE_NAME, XLSX_CONTENT_TYPE};
use crate::page::INDEX_HTML;
use crate::state::AppState;

/// Download name for folder archives.
pub const ARCHIVE_FILE_NAME: &str = "google_drive_files.zip";

const ROOT_LABEL: &str = "root";

/// `?folder=` parameter shared by the listing routes.
#[derive(Debug, Default, Deserialize)]
pub struct FolderQuery {
    #[serde(default)]
    pub folder: Option<String>,
}

impl FolderQuery {
    fn folder(&self) -> Option<&str> {
        folder_name(self.folder.as_deref())
    }
}

/// Blank folder fields mean the root.
fn folder_name(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|name| !name.is_empty())
}

fn location(folder: Option<&str>) -> String {
    folder.unwrap_or(ROOT_LABEL).to_string()
}

fn attachment(content_type: &'static str, file_name: &str, body: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file_name);
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub folder: String,
    pub count: usize,
    pub files: Vec<ListingRow>,
}

impl From<&Listing> for ListingResponse {
    fn from(listing: &Listing) -> Self {
        Self {
            folder: location(listing.folder.as_deref()),
            count: listing.len(),
            files: listing.rows(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Created,
    Updated,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct UploadFileReport {
    pub file_name: String,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Where the file ended up; `root` when the folder did not resolve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadFileReport {
    fn done(file_name: String, folder: Option<&str>, outcome: &UploadOutcome) -> Self {
        let status = match outcome.action {
            UploadAction::Created => UploadStatus::Created,
            UploadAction::Updated => UploadStatus::Updated,
        };
        // Updated entries stay where they were; only a new entry lands in
        // the resolved folder.
        let placed = match (outcome.action, &outcome.folder_id) {
            (UploadAction::Updated, _) => None,
            (UploadAction::Created, Some(_)) => Some(location(folder)),
            (UploadAction::Created, None) => Some(ROOT_LABEL.to_string()),
        };
        Self {
            file_name,
            status,
            id: Some(outcome.entry.id.to_string()),
            location: placed,
            error: None,
        }
    }

    fn failed(file_name: String, error: impl Into<String>) -> Self {
        Self {
            file_name,
            status: UploadStatus::Failed,
            id: None,
            location: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadReport {
    pub folder: String,
    pub uploaded: usize,
    pub failed: usize,
    pub files: Vec<UploadFileReport>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub file_name: String,
    #[serde(default)]
    pub folder: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStatus {
    Trashed,
    NotFound,
}

#[derive(Debug, Serialize)]
pub struct DeleteReport {
    pub file_name: String,
    pub folder: String,
    pub status: DeleteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Index page.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check handler.
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "backend": state.backend(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Upload every file part of the form, reporting each one.
///
/// A failed file does not stop the rest of the batch.
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> WebResult<Json<UploadReport>> {
    let mut folder_field: Option<String> = None;
    let mut parts: Vec<(String, Option<String>, Bytes)> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("folder") => folder_field = Some(field.text().await?),
            Some("files") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                // Browsers send one empty, unnamed part when nothing was picked.
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                parts.push((file_name, content_type, data));
            }
            other => tracing::debug!(field = ?other, "Ignoring unknown form field"),
        }
    }

    if parts.is_empty() {
        return Err(Error::InvalidInput("No files selected".to_string()).into());
    }

    let folder = folder_name(folder_field.as_deref());
    let _action = state.begin_action().await;

    let mut files = Vec::with_capacity(parts.len());
    for (file_name, content_type, data) in parts {
        if file_name.trim().is_empty() {
            files.push(UploadFileReport::failed(file_name, "Missing file name"));
            continue;
        }
        let uploaded = state
            .files()
            .upload(data.to_vec(), &file_name, folder, content_type.as_deref())
            .await;
        let report = match uploaded {
            Ok(outcome) => UploadFileReport::done(file_name, folder, &outcome),
            Err(e) => UploadFileReport::failed(file_name, e.to_string()),
        };
        files.push(report);
    }

    let failed = files
        .iter()
        .filter(|f| matches!(f.status, UploadStatus::Failed))
        .count();
    Ok(Json(UploadReport {
        folder: location(folder),
        uploaded: files.len() - failed,
        failed,
        files,
    }))
}

/// Listing of a folder as JSON rows.
pub async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<FolderQuery>,
) -> WebResult<Json<ListingResponse>> {
    let folder = query.folder();
    let _action = state.begin_action().await;

    let listing = state
        .files()
        .list(folder)
        .await?
        .ok_or_else(|| WebError::FolderNotFound(location(folder)))?;
    Ok(Json(ListingResponse::from(&listing)))
}

/// Listing of a folder as an Excel workbook.
pub async fn export_handler(
    State(state): State<AppState>,
    Query(query): Query<FolderQuery>,
) -> WebResult<Response> {
    let folder = query.folder();
    let _action = state.begin_action().await;

    let listing = state
        .files()
        .list(folder)
        .await?
        .ok_or_else(|| WebError::FolderNotFound(location(folder)))?;
    let workbook = listing_workbook(&listing)?;

    tracing::info!(folder = %location(folder), rows = listing.len(), "Exported listing");
    Ok(attachment(XLSX_CONTENT_TYPE, EXPORT_FILE_NAME, workbook))
}

/// Zip of every downloadable file in a folder.
pub async fn archive_handler(
    State(state): State<AppState>,
    Query(query): Query<FolderQuery>,
) -> WebResult<Response> {
    let folder = query.folder();
    let _action = state.begin_action().await;

    let (listing, archive) = state
        .files()
        .download_folder(folder)
        .await?
        .ok_or_else(|| WebError::FolderNotFound(location(folder)))?;

    tracing::info!(
        folder = %location(folder),
        listed = listing.len(),
        archived = archive.file_names.len(),
        "Files ready to download"
    );
    Ok(attachment("application/zip", ARCHIVE_FILE_NAME, archive.into_bytes()))
}

/// Move a file to the trash by title.
pub async fn delete_handler(
    State(state): State<AppState>,
    Form(form): Form<DeleteForm>,
) -> WebResult<Json<DeleteReport>> {
    let file_name = form.file_name.trim();
    if file_name.is_empty() {
        return Err(Error::InvalidInput("File name cannot be empty".to_string()).into());
    }
    let folder = folder_name(Some(form.folder.as_str()));
    let _action = state.begin_action().await;

    let outcome = state.files().delete(file_name, folder).await?;
    let (status, id) = match outcome {
        DeleteOutcome::Trashed(id) => (DeleteStatus::Trashed, Some(id.to_string())),
        DeleteOutcome::NotFound => (DeleteStatus::NotFound, None),
    };

    Ok(Json(DeleteReport {
        file_name: file_name.to_string(),
        folder: location(folder),
        status,
        id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_folder_is_root() {
        assert_eq!(folder_name(None), None);
        assert_eq!(folder_name(Some("")), None);
        assert_eq!(folder_name(Some("   ")), None);
        assert_eq!(folder_name(Some(" reports ")), Some("reports"));
        assert_eq!(location(None), "root");
    }
}
