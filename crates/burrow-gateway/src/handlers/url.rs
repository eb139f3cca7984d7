use crate::error::{AppError, Result};
use crate::model::{ShortenRequest, UrlResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use burrow_core::ShortCode;
use tracing::debug;

pub async fn create_url_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<UrlResponse>> {
    let Json(request) = payload?;

    if request.url.is_empty() {
        return Err(AppError::EmptyUrl);
    }

    let shortened = state.shortener().shorten(&request.url).await?;

    Ok(Json(UrlResponse {
        url: shortened.code.to_url(state.base_url()),
    }))
}

pub async fn get_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UrlResponse>> {
    // a malformed code can never have been issued
    let Ok(code) = ShortCode::new(short_code) else {
        return Err(AppError::LinkNotFound);
    };

    match state.shortener().resolve(&code).await? {
        Some(url) => Ok(Json(UrlResponse { url })),
        None => {
            debug!(code = %code, "short code not found");
            Err(AppError::LinkNotFound)
        }
    }
}
