//! Paste HTTP handlers.

use crate::{error::HttpError, models::paste::*, AppError, AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};

fn check_paste_size(state: &AppState, content: &str) -> Result<(), HttpError> {
    if content.len() > state.config.max_paste_size {
        return Err(AppError::InvalidArgument(format!(
            "Paste size exceeds maximum of {} bytes",
            state.config.max_paste_size
        ))
        .into());
    }
    Ok(())
}

/// Create a new paste.
///
/// # Returns
/// The created paste as JSON.
///
/// # Errors
/// 400 for missing fields, oversized content or an invalid expire token;
/// 500 for storage failures.
pub async fn create_paste(
    State(state): State<AppState>,
    payload: Result<Json<CreatePasteRequest>, JsonRejection>,
) -> Result<Json<Paste>, HttpError> {
    let Json(req) = payload?;
    check_paste_size(&state, &req.content)?;

    let paste = state
        .service
        .create(&req.content, &req.language, req.expire.as_deref())?;
    Ok(Json(paste))
}

/// Fetch a live paste by id.
///
/// # Errors
/// 404 when the paste never existed or was purged, 410 when it has expired.
pub async fn get_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Paste>, HttpError> {
    Ok(Json(state.service.get(&id)?))
}

/// Fetch the raw content of a live paste as `text/plain`.
///
/// # Errors
/// Same as [`get_paste`].
pub async fn get_raw_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let content = state.service.get_content(&id)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], content))
}

/// Update content and language of a paste.
///
/// A missing or empty `language` resets it to `text`.
///
/// # Errors
/// 400 for empty or oversized content, 404 for unknown ids.
pub async fn update_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePasteRequest>, JsonRejection>,
) -> Result<Json<Paste>, HttpError> {
    let Json(req) = payload?;
    check_paste_size(&state, &req.content)?;

    let updated = state
        .service
        .update(&id, &req.content, req.language.as_deref())?;
    Ok(Json(updated))
}

/// Record one view of a paste.
///
/// # Returns
/// The paste with its updated view count.
///
/// # Errors
/// 404 for unknown ids.
pub async fn increment_views(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Paste>, HttpError> {
    Ok(Json(state.service.increment_views(&id, 1)?))
}
