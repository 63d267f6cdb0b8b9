use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, body::Body};
use chrono::Utc;
use common::storage::{BoxReader, ObjectKey, ObjectStore};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::image::ImageUploadResponse;
use crate::state::AppState;
use crate::utils::image::{
    image_content_type, image_object_key, served_image_type, validate_flat_filename,
};

/// Request body limit for image uploads: the configured image limit plus
/// room for the multipart framing.
pub fn image_upload_body_limit(max_image_size: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max(usize::try_from(max_image_size).unwrap_or(usize::MAX).saturating_add(64 * 1024))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Images",
    operation_id = "uploadImage",
    summary = "Upload a recipe image",
    description = "Stores the `file` multipart field under `recipes/{user_id}-{unix_millis}-{name}.{ext}` and returns its \
        public URL, to be saved as a recipe's `image_url`. Only PNG, JPEG, GIF, WebP and AVIF images are accepted. The type \
        is guessed from the filename and must agree with the part's declared content type; the key extension is \
        rewritten to match it. An existing object under the same key is replaced.",
    request_body(content_type = "multipart/form-data", description = "Image file in the `file` field"),
    responses(
        (status = 201, description = "Image stored", body = ImageUploadResponse),
        (status = 400, description = "Missing file, not an image or too large (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Fehlerhafte Multipart-Anfrage: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Die Datei muss einen Dateinamen haben".into()))?;
        let filename = validate_flat_filename(&filename)
            .map_err(|e| AppError::Validation(e.message().into()))?
            .to_string();

        let content_type = image_content_type(&filename, field.content_type()).ok_or_else(|| {
            AppError::Validation("Nur Bilddateien sind erlaubt".into())
        })?;

        let key = image_object_key(auth_user.user_id, Utc::now(), &filename, &content_type)?;
        let size = stream_field_to_store(
            field,
            &key,
            &*state.object_store,
            state.config.storage.max_image_size,
        )
        .await?;

        tracing::info!(key = %key, size, %content_type, "Stored recipe image");

        return Ok((
            StatusCode::CREATED,
            Json(ImageUploadResponse {
                url: state.config.storage.public_url(key.as_str()),
                path: key.to_string(),
                content_type,
                size,
            }),
        ));
    }

    Err(AppError::Validation("Es wurde keine Datei hochgeladen".into()))
}

/// Serve a stored object. Objects are public; only the configured bucket exists.
///
/// Accepted image keys are served with the type recorded by their extension.
/// Anything else is sent as an opaque download.
#[instrument(skip(state))]
pub async fn serve_object(
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
) -> Result<Response, AppError> {
    if bucket != state.config.storage.bucket {
        return Err(AppError::NotFound("Datei nicht gefunden".into()));
    }
    let key = ObjectKey::parse(&path).map_err(|_| AppError::NotFound("Datei nicht gefunden".into()))?;

    let size = state.object_store.size(&key).await?;
    let reader = state.object_store.get_stream(&key).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff");

    let builder = match served_image_type(key.as_str()) {
        Some(content_type) => builder.header(header::CONTENT_TYPE, content_type),
        None => {
            tracing::warn!(key = %key, "Serving non-image object as download");
            builder
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .header(header::CONTENT_DISPOSITION, "attachment")
        }
    };

    builder
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Stream a multipart field into the object store via a temp file.
async fn stream_field_to_store(
    mut field: axum::extract::multipart::Field<'_>,
    key: &ObjectKey,
    store: &dyn ObjectStore,
    max_size: u64,
) -> Result<u64, AppError> {
    let temp_path = std::env::temp_dir().join(format!("rezepte-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Fehler beim Lesen der Datei: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(AppError::Validation(format!(
                    "Die Datei ist zu groß (maximal {max_size} Bytes)"
                )));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        if total_size == 0 {
            return Err(AppError::Validation("Die Datei ist leer".into()));
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;
        drop(temp_file);

        let file = tokio::fs::File::open(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        let reader: BoxReader = Box::new(file);
        Ok(store.put_stream(key, reader).await?)
    }
    .await;

    // Best effort.
    let _ = tokio::fs::remove_file(&temp_path).await;

    result
}
