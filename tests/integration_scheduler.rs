use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::time::Duration;

use sendora::config::Config;
use sendora::db;
use sendora::models::campaign::{CampaignReq, CampaignStatus};
use sendora::services::scheduler::Scheduler;
use sendora::services::campaign_service;

async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        port: 0,
        api_base_url: "http://api.test".into(),
        app_base_url: "http://app.test".into(),
    }
}

/// A campaign on a brand with no SMTP settings; a run against it fails
/// at setup, which makes the scheduler's work observable as a status flip.
async fn seed_campaign(pool: &SqlitePool) -> String {
    sqlx::query("INSERT INTO users (username, password_hash, role, created_at) VALUES ('tester', 'x', 'Admin', 0)")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO brands (id, user_id, name, created_at, updated_at) VALUES ('b1', 1, 'Acme', 0, 0)",
    )
    .execute(pool)
    .await
    .unwrap();
    let campaign = campaign_service::create_campaign(
        pool,
        "b1",
        &CampaignReq {
            name: "Launch".into(),
            subject: "Hi".into(),
            body: "<p>Hi {{name}}</p>".into(),
        },
    )
    .await
    .unwrap();
    campaign.id
}

async fn status_of(pool: &SqlitePool, id: &str) -> CampaignStatus {
    campaign_service::get_campaign(pool, id)
        .await
        .unwrap()
        .unwrap()
        .status_enum()
        .unwrap()
}

#[tokio::test]
async fn due_schedule_fires_and_runs_the_campaign() {
    let pool = setup_pool().await;
    let id = seed_campaign(&pool).await;
    let scheduler = Scheduler::new(pool.clone(), test_config());

    scheduler.schedule_send(id.clone(), db::now_epoch() + 1).await;

    // the brand has no SMTP settings, so the fired run ends up failed
    let mut waited = 0;
    while status_of(&pool, &id).await != CampaignStatus::Failed {
        tokio::time::sleep(Duration::from_millis(50)).await;
        waited += 1;
        assert!(waited < 200, "scheduled run never fired");
    }

    // the key was consumed when the task fired
    assert!(!scheduler.cancel_scheduled(&id).await);
}

#[tokio::test]
async fn cancel_removes_a_pending_schedule_by_campaign_id() {
    let pool = setup_pool().await;
    let id = seed_campaign(&pool).await;
    let scheduler = Scheduler::new(pool.clone(), test_config());

    scheduler.schedule_send(id.clone(), db::now_epoch() + 3600).await;
    assert!(scheduler.cancel_scheduled(&id).await);
    assert!(!scheduler.cancel_scheduled(&id).await);
    assert!(!scheduler.cancel_scheduled("never-scheduled").await);

    // nothing ran
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(status_of(&pool, &id).await, CampaignStatus::Draft);
}

#[tokio::test]
async fn rescheduling_replaces_the_pending_invocation() {
    let pool = setup_pool().await;
    let id = seed_campaign(&pool).await;
    let scheduler = Scheduler::new(pool.clone(), test_config());

    scheduler.schedule_send(id.clone(), db::now_epoch() + 3600).await;
    scheduler.schedule_send(id.clone(), db::now_epoch() + 7200).await;

    // one pending entry under the key, not two
    assert!(scheduler.cancel_scheduled(&id).await);
    assert!(!scheduler.cancel_scheduled(&id).await);

    scheduler.shutdown().await;
}
