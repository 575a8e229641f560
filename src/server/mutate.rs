//! Upload and delete. Both invalidate cached listings before responding.

use super::{ApiError, AppState};
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use gallery_library::{DeleteFailure, Upload, UploadedFile};
use serde::{Deserialize, Serialize};

const UPLOAD_FIELD: &str = "files";

#[derive(Debug, Default, Deserialize)]
pub struct DirQuery {
    dir: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    ok: bool,
    uploaded: usize,
    files: Vec<UploadedFile>,
}

/// `POST /api/upload?dir=`: multipart, one part per file under `files`.
///
/// Parts are read chunk by chunk, so a request over the file count or size
/// limits is rejected as soon as it crosses them.
pub async fn upload(
    State(state): State<AppState>,
    query: Result<Query<DirQuery>, QueryRejection>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    state.authorize(&headers, None)?;
    let Query(query) = query?;
    let mut multipart = multipart?;
    let settings = state.gallery.settings();

    let mut files = Vec::new();
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        settings.check_file_count(files.len() + 1)?;
        let file_name = field.file_name().unwrap_or_default().to_string();
        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            settings.check_file_size(&file_name, (data.len() + chunk.len()) as u64)?;
            data.extend_from_slice(&chunk);
        }
        files.push(Upload { file_name, data });
    }

    let dir = query.dir.unwrap_or_default();
    let files = state.gallery.upload(&dir, files).await?;
    Ok(Json(UploadResponse {
        ok: true,
        uploaded: files.len(),
        files,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteBody {
    dir: Option<String>,
    #[serde(default)]
    names: Vec<String>,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    ok: bool,
    deleted: Vec<String>,
    failed: Vec<DeleteFailure>,
}

/// `POST /api/delete`: JSON `{ dir?, names, token? }`; `dir` may also come
/// from the query string.
pub async fn delete(
    State(state): State<AppState>,
    query: Result<Query<DirQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Result<Json<DeleteBody>, JsonRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Query(query) = query?;
    let Json(body) = body?;
    state.authorize(&headers, body.token.as_deref())?;

    let dir = body.dir.or(query.dir).unwrap_or_default();
    let report = state.gallery.delete(&dir, &body.names).await?;
    Ok(Json(DeleteResponse {
        ok: true,
        deleted: report.deleted,
        failed: report.failed,
    }))
}
