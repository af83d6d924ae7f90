use axum::extract::FromRef;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::scheduler::Scheduler;

pub mod auth;
pub mod brands;
pub mod campaigns;
pub mod contacts;
pub mod settings;
pub mod tracking;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub scheduler: Arc<Scheduler>,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<Scheduler> {
    fn from_ref(state: &AppState) -> Self {
        state.scheduler.clone()
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(brands::router())
        .merge(contacts::router())
        .merge(campaigns::router())
        .merge(settings::router())
        .merge(tracking::router())
}
