use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::now_epoch;
use crate::models::warmup::{WarmupConfig, WarmupSettingsReq};
use crate::routes::AppState;
use crate::services::warmup_service;

#[derive(Serialize)]
struct WarmupReadout {
    config: WarmupConfig,
    /// Whole days elapsed since the ramp started.
    days_since_start: i64,
    /// Phase/limit the ramp table yields for today.
    effective_phase: i64,
    effective_daily_limit: Option<i64>,
}

fn readout(config: WarmupConfig) -> WarmupReadout {
    let days = config
        .start_date
        .map(|s| warmup_service::days_since(s, now_epoch()))
        .unwrap_or(0);
    let (effective_phase, effective_daily_limit) = warmup_service::phase_for(days);
    WarmupReadout {
        config,
        days_since_start: days,
        effective_phase,
        effective_daily_limit,
    }
}

async fn get_warmup(
    State(pool): State<SqlitePool>,
    Path(brand_id): Path<String>,
) -> impl IntoResponse {
    match warmup_service::get_config(&pool, &brand_id).await {
        Ok(config) => Json(readout(config)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn update_warmup(
    State(pool): State<SqlitePool>,
    Path(brand_id): Path<String>,
    Json(req): Json<WarmupSettingsReq>,
) -> impl IntoResponse {
    match warmup_service::update_settings(&pool, &brand_id, &req).await {
        Ok(config) => Json(readout(config)).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/brands/:id/warmup", get(get_warmup))
        .route("/brands/:id/warmup", put(update_warmup))
}
