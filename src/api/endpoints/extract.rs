//! `POST /api/extract`: upload a PDF, get the five fields back.

use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::staging::{download_filename, is_pdf, stage_upload};
use crate::api::types::ApiContext;
use crate::pipeline::extraction::export::{render, ExportFormat};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExtractQuery {
    /// Download format. Without it the full record, metadata included, is returned.
    pub format: Option<ExportFormat>,
    /// Send as an attachment.
    pub download: bool,
}

struct Upload {
    filename: String,
    bytes: Vec<u8>,
    model: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut model = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(ApiError::BadRequest(format!("Malformed upload: {e}"))),
        };
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("document.pdf").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {e}")))?;
                file = Some((filename, bytes.to_vec()));
            }
            "model" => {
                let value = field.text().await.unwrap_or_default();
                let value = value.trim();
                if !value.is_empty() {
                    model = Some(value.to_string());
                }
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| ApiError::BadRequest("No file provided.".into()))?;
    Ok(Upload {
        filename,
        bytes,
        model,
    })
}

pub async fn extract(
    State(ctx): State<ApiContext>,
    Query(query): Query<ExtractQuery>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;

    if upload.bytes.is_empty() {
        return Err(ApiError::BadRequest("Empty file.".into()));
    }
    if upload.bytes.len() > ctx.config.max_upload_bytes {
        return Err(ApiError::PayloadTooLarge {
            limit: ctx.config.max_upload_bytes,
        });
    }
    if !is_pdf(&upload.bytes) {
        return Err(ApiError::UnsupportedMedia);
    }

    // Removed from disk when `staged` drops.
    let staged = stage_upload(&ctx.config.staging_dir, &upload.bytes)?;
    tracing::info!(
        size = upload.bytes.len(),
        model = upload.model.as_deref().unwrap_or("-"),
        "Document staged for extraction"
    );

    let merged = ctx
        .pipeline
        .extract_document(
            staged.path().to_path_buf(),
            upload.model,
            ctx.config.read_timeout(),
        )
        .await?;
    drop(staged);

    let format = match (query.format, query.download) {
        (Some(format), _) => format,
        (None, true) => ExportFormat::Json,
        (None, false) => return Ok(Json(merged).into_response()),
    };

    let body = render(&merged.without_metadata(), format).map_err(ApiError::Internal)?;
    let filename = download_filename(&upload.filename, format.extension());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(body))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
