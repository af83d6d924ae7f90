use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::models::contact::ContactReq;
use crate::routes::AppState;
use crate::services::contact_service;

#[derive(Deserialize)]
struct ImportReq {
    contacts: Vec<ContactReq>,
}

async fn add_contact(
    State(pool): State<SqlitePool>,
    Path(brand_id): Path<String>,
    Json(req): Json<ContactReq>,
) -> impl IntoResponse {
    match contact_service::add_contact(&pool, &brand_id, &req).await {
        Ok(contact) => (StatusCode::CREATED, Json(contact)).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn list_contacts(
    State(pool): State<SqlitePool>,
    Path(brand_id): Path<String>,
) -> impl IntoResponse {
    match contact_service::list_contacts(&pool, &brand_id).await {
        Ok(contacts) => Json(contacts).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// Bulk import of rows parsed upstream (CSV parsing stays outside).
async fn import_contacts(
    State(pool): State<SqlitePool>,
    Path(brand_id): Path<String>,
    Json(req): Json<ImportReq>,
) -> impl IntoResponse {
    match contact_service::import_contacts(&pool, &brand_id, &req.contacts).await {
        Ok(imported) => Json(serde_json::json!({
            "ok": true,
            "imported": imported,
            "skipped": req.contacts.len() - imported
        }))
        .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn delete_contact(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match contact_service::delete_contact(&pool, &id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/brands/:id/contacts", post(add_contact))
        .route("/brands/:id/contacts", get(list_contacts))
        .route("/brands/:id/contacts/import", post(import_contacts))
        .route("/contacts/:id", delete(delete_contact))
}
