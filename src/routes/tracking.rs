use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use sqlx::SqlitePool;
use tracing::debug;

use crate::routes::AppState;
use crate::services::{contact_service, tracking_service};

/// 1x1 transparent GIF served for every pixel hit.
const PIXEL_GIF: [u8; 43] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// The pixel endpoint embedded into every campaign email. Always answers
/// with the gif, even for stale or unknown log ids.
async fn track_open(State(pool): State<SqlitePool>, Path(log_id): Path<String>) -> impl IntoResponse {
    match tracking_service::record_open(&pool, &log_id).await {
        Ok(true) => debug!(log = %log_id, "open recorded"),
        Ok(false) => {}
        Err(e) => tracing::warn!(log = %log_id, error = %e, "open tracking failed"),
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/gif")],
        PIXEL_GIF.to_vec(),
    )
}

async fn unsubscribe(
    State(pool): State<SqlitePool>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    match contact_service::unsubscribe_by_token(&pool, &token).await {
        Ok(Some(contact)) => Html(format!(
            "<html><body><p>{} has been unsubscribed.</p></body></html>",
            contact.email
        ))
        .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Html("<html><body><p>Unknown unsubscribe link.</p></body></html>".to_string()),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!("<html><body><p>Error: {}</p></body></html>", e)),
        )
            .into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/track/:log_id/open", get(track_open))
        .route("/unsubscribe/:token", get(unsubscribe))
}
