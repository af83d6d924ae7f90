use anyhow::Result;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use sendora::config::Config;
use sendora::routes::{self, AppState};
use sendora::services::scheduler::Scheduler;
use sendora::{db, models};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sendora=debug")),
        )
        .init();

    let config = Config::from_env();

    // Build a correct sqlite URL (sqlx expects sqlite://path or sqlite::memory:)
    let db_url = normalize_sqlite_url(&config.database_url);

    // Ensure file exists for file-based sqlite (avoid open error on some setups)
    if let Some(path) = db_file_path(&db_url) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        if !path.exists() {
            std::fs::File::create(&path).ok();
        }
    }

    let pool = db::connect(&db_url).await?;
    db::run_migrations(&pool).await?;

    let scheduler = Scheduler::new(pool.clone(), config.clone());
    scheduler.start_sweep().await;
    requeue_scheduled(&pool, &scheduler).await?;

    let state = AppState {
        pool: pool.clone(),
        scheduler: scheduler.clone(),
    };

    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .merge(routes::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await;
    Ok(())
}

/// Re-register delayed invocations for campaigns that were scheduled
/// before the process last stopped.
async fn requeue_scheduled(
    pool: &sqlx::SqlitePool,
    scheduler: &std::sync::Arc<Scheduler>,
) -> Result<()> {
    let rows: Vec<(String, Option<i64>)> =
        sqlx::query_as("SELECT id, scheduled_at FROM campaigns WHERE status = ?")
            .bind(models::campaign::CampaignStatus::Scheduled.as_str())
            .fetch_all(pool)
            .await?;
    for (id, at) in rows {
        match at {
            Some(at) => scheduler.schedule_send(id, at).await,
            // "send now" campaigns interrupted before their run started
            None => scheduler.invoke_send(id),
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;
    let ctrl_c = async {
        signal::ctrl_c().await.ok();
    };
    #[cfg(unix)]
    let term = async {
        if let Ok(mut s) = signal::unix::signal(signal::unix::SignalKind::terminate()) {
            s.recv().await;
        }
    };
    #[cfg(not(unix))]
    let term = std::future::pending::<()>();
    tokio::select! { _ = ctrl_c => {}, _ = term => {} }
}

fn normalize_sqlite_url(input: &str) -> String {
    // Accept forms: sqlite:foo.db (fix), sqlite://foo.db (ok), file:foo.db (convert), just path (prepend)
    if input.starts_with("sqlite://") || input.starts_with("sqlite::memory:") {
        return input.to_string();
    }
    if input.starts_with("sqlite:") {
        // single colon like sqlite:foo.db -> make it sqlite://foo.db
        let rest = input.trim_start_matches("sqlite:");
        return format!("sqlite://{}", rest.trim_start_matches('/'));
    }
    if input.starts_with("file:") {
        return format!("sqlite://{}", input.trim_start_matches("file:"));
    }
    // bare path
    format!("sqlite://{}", input)
}

fn db_file_path(url: &str) -> Option<std::path::PathBuf> {
    // sqlite URLs: sqlite://<path>. Strip prefix
    if let Some(rest) = url.strip_prefix("sqlite://") {
        if rest == ":memory:" {
            return None;
        }
        return Some(std::path::PathBuf::from(rest));
    }
    None
}
