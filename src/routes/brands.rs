use axum::{
    extract::{Json, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::SqlitePool;

use crate::routes::{auth::user_id_from_headers, AppState};
use crate::services::brand_service::{self, BrandReq};

async fn create_brand(
    State(pool): State<SqlitePool>,
    headers: HeaderMap,
    Json(req): Json<BrandReq>,
) -> impl IntoResponse {
    let Some(user_id) = user_id_from_headers(&headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    match brand_service::create_brand(&pool, user_id, &req).await {
        Ok(brand) => (StatusCode::CREATED, Json(brand)).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn list_brands(State(pool): State<SqlitePool>, headers: HeaderMap) -> impl IntoResponse {
    let Some(user_id) = user_id_from_headers(&headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    match brand_service::list_brands(&pool, user_id).await {
        Ok(brands) => Json(brands).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn get_brand(State(pool): State<SqlitePool>, Path(id): Path<String>) -> impl IntoResponse {
    match brand_service::get_brand(&pool, &id).await {
        Ok(Some(brand)) => Json(brand).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn update_brand(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
    Json(req): Json<BrandReq>,
) -> impl IntoResponse {
    match brand_service::update_brand(&pool, &id, &req).await {
        Ok(Some(brand)) => Json(brand).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn delete_brand(State(pool): State<SqlitePool>, Path(id): Path<String>) -> impl IntoResponse {
    match brand_service::delete_brand(&pool, &id).await {
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
        .route("/brands", post(create_brand))
        .route("/brands", get(list_brands))
        .route("/brands/:id", get(get_brand))
        .route("/brands/:id", put(update_brand))
        .route("/brands/:id", delete(delete_brand))
}
