use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::db::now_epoch;
use crate::models::campaign::{CampaignReq, CampaignStatus};
use crate::routes::AppState;
use crate::services::{campaign_service, scheduler::Scheduler};

async fn create_campaign(
    State(pool): State<SqlitePool>,
    Path(brand_id): Path<String>,
    Json(req): Json<CampaignReq>,
) -> impl IntoResponse {
    match campaign_service::create_campaign(&pool, &brand_id, &req).await {
        Ok(campaign) => (StatusCode::CREATED, Json(campaign)).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn list_campaigns(
    State(pool): State<SqlitePool>,
    Path(brand_id): Path<String>,
) -> impl IntoResponse {
    match campaign_service::list_campaigns(&pool, &brand_id).await {
        Ok(campaigns) => Json(campaigns).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn get_campaign(State(pool): State<SqlitePool>, Path(id): Path<String>) -> impl IntoResponse {
    match campaign_service::get_campaign(&pool, &id).await {
        Ok(Some(campaign)) => Json(campaign).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn update_campaign(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
    Json(req): Json<CampaignReq>,
) -> impl IntoResponse {
    match campaign_service::update_campaign(&pool, &id, &req).await {
        Ok(Some(campaign)) => Json(campaign).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn delete_campaign(
    State(pool): State<SqlitePool>,
    State(scheduler): State<Arc<Scheduler>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    scheduler.cancel_scheduled(&id).await;
    match campaign_service::delete_campaign(&pool, &id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// Send now: mark scheduled and enqueue immediately.
async fn send_campaign(
    State(pool): State<SqlitePool>,
    State(scheduler): State<Arc<Scheduler>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match campaign_service::get_campaign(&pool, &id).await {
        Ok(Some(campaign)) => {
            if campaign.status_enum() == Some(CampaignStatus::Processing) {
                return (
                    StatusCode::CONFLICT,
                    Json(serde_json::json!({ "ok": false, "error": "campaign is already sending" })),
                )
                    .into_response();
            }
            if let Err(e) = campaign_service::mark_scheduled(&pool, &id, None).await {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
                )
                    .into_response();
            }
            scheduler.invoke_send(id.clone());
            Json(serde_json::json!({ "ok": true, "campaign_id": id })).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct ScheduleReq {
    /// Unix epoch seconds.
    at: i64,
}

async fn schedule_campaign(
    State(pool): State<SqlitePool>,
    State(scheduler): State<Arc<Scheduler>>,
    Path(id): Path<String>,
    Json(req): Json<ScheduleReq>,
) -> impl IntoResponse {
    if req.at <= now_epoch() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "ok": false, "error": "scheduled time must be in the future" })),
        )
            .into_response();
    }
    match campaign_service::get_campaign(&pool, &id).await {
        Ok(Some(_)) => {
            if let Err(e) = campaign_service::mark_scheduled(&pool, &id, Some(req.at)).await {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
                )
                    .into_response();
            }
            scheduler.schedule_send(id.clone(), req.at).await;
            Json(serde_json::json!({ "ok": true, "campaign_id": id, "scheduled_at": req.at }))
                .into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn cancel_campaign(
    State(pool): State<SqlitePool>,
    State(scheduler): State<Arc<Scheduler>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    scheduler.cancel_scheduled(&id).await;
    match campaign_service::cancel_schedule(&pool, &id).await {
        Ok(true) => Json(serde_json::json!({ "ok": true })).into_response(),
        Ok(false) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "ok": false, "error": "campaign is not scheduled" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// Manual resume of a paused campaign; sends immediately.
async fn resume_campaign(
    State(pool): State<SqlitePool>,
    State(scheduler): State<Arc<Scheduler>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match campaign_service::resume(&pool, &id).await {
        Ok(true) => {
            scheduler.invoke_send(id.clone());
            Json(serde_json::json!({ "ok": true, "campaign_id": id })).into_response()
        }
        Ok(false) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "ok": false, "error": "campaign is not paused" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn campaign_logs(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match campaign_service::logs(&pool, &id).await {
        Ok(logs) => Json(logs).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn campaign_stats(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match campaign_service::stats(&pool, &id).await {
        Ok(Some(stats)) => Json(stats).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/brands/:id/campaigns", post(create_campaign))
        .route("/brands/:id/campaigns", get(list_campaigns))
        .route("/campaigns/:id", get(get_campaign))
        .route("/campaigns/:id", put(update_campaign))
        .route("/campaigns/:id", delete(delete_campaign))
        .route("/campaigns/:id/send", post(send_campaign))
        .route("/campaigns/:id/schedule", post(schedule_campaign))
        .route("/campaigns/:id/cancel", post(cancel_campaign))
        .route("/campaigns/:id/resume", post(resume_campaign))
        .route("/campaigns/:id/stats", get(campaign_stats))
        .route("/campaigns/:id/logs", get(campaign_logs))
}
