use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use sendora::db;
use sendora::models::campaign::{CampaignReq, CampaignStatus};
use sendora::services::{campaign_service, warmup_service};

async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

async fn seed_brand(pool: &SqlitePool, brand_id: &str) {
    sqlx::query("INSERT INTO users (username, password_hash, role, created_at) VALUES ('tester', 'x', 'Admin', 0)")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO brands (id, user_id, name, created_at, updated_at) VALUES (?, 1, 'Acme', 0, 0)",
    )
    .bind(brand_id)
    .execute(pool)
    .await
    .unwrap();
}

async fn seed_paused_campaign(pool: &SqlitePool, brand_id: &str) -> String {
    let req = CampaignReq {
        name: "Launch".into(),
        subject: "Hi".into(),
        body: "<p>Hi {{name}}</p>".into(),
    };
    let campaign = campaign_service::create_campaign(pool, brand_id, &req)
        .await
        .unwrap();
    sqlx::query("UPDATE campaigns SET status = 'paused', paused_by_warmup = 1 WHERE id = ?")
        .bind(&campaign.id)
        .execute(pool)
        .await
        .unwrap();
    campaign.id
}

#[tokio::test]
async fn sweep_with_no_configs_is_a_noop() {
    let pool = setup_pool().await;
    let outcome = warmup_service::auto_resume_sweep(&pool, db::now_epoch())
        .await
        .unwrap();
    assert_eq!(outcome.processed, 0);
    assert!(outcome.resumed.is_empty());
}

#[tokio::test]
async fn sweep_resumes_warmup_paused_campaigns_once_per_day() {
    let pool = setup_pool().await;
    seed_brand(&pool, "b1").await;
    let campaign_id = seed_paused_campaign(&pool, "b1").await;

    // quota already refreshed today, last resume check yesterday
    warmup_service::get_config(&pool, "b1").await.unwrap();
    let now = db::now_epoch();
    sqlx::query(
        r#"UPDATE warmup_configs
           SET enabled = 1, auto_resume = 1, start_date = ?, sent_today = 0,
               last_reset_date = ?, last_auto_resume_check = ?
           WHERE brand_id = 'b1'"#,
    )
    .bind(now - 5 * 86_400)
    .bind(now)
    .bind(now - 86_400)
    .execute(&pool)
    .await
    .unwrap();

    let outcome = warmup_service::auto_resume_sweep(&pool, now).await.unwrap();
    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.resumed, vec![campaign_id.clone()]);

    let campaign = campaign_service::get_campaign(&pool, &campaign_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(campaign.status_enum(), Some(CampaignStatus::Scheduled));
    assert!(!campaign.paused_by_warmup);

    // second sweep the same day is a no-op
    let again = warmup_service::auto_resume_sweep(&pool, now).await.unwrap();
    assert_eq!(again.processed, 1);
    assert!(again.resumed.is_empty());
    let campaign = campaign_service::get_campaign(&pool, &campaign_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(campaign.status_enum(), Some(CampaignStatus::Scheduled));
}

#[tokio::test]
async fn sweep_skips_brands_that_sent_today() {
    let pool = setup_pool().await;
    seed_brand(&pool, "b1").await;
    let campaign_id = seed_paused_campaign(&pool, "b1").await;

    warmup_service::get_config(&pool, "b1").await.unwrap();
    let now = db::now_epoch();
    sqlx::query(
        r#"UPDATE warmup_configs
           SET enabled = 1, auto_resume = 1, start_date = ?, sent_today = 4,
               last_reset_date = ?, last_auto_resume_check = ?
           WHERE brand_id = 'b1'"#,
    )
    .bind(now - 5 * 86_400)
    .bind(now)
    .bind(now - 86_400)
    .execute(&pool)
    .await
    .unwrap();

    let outcome = warmup_service::auto_resume_sweep(&pool, now).await.unwrap();
    assert!(outcome.resumed.is_empty());

    let campaign = campaign_service::get_campaign(&pool, &campaign_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(campaign.status_enum(), Some(CampaignStatus::Paused));
    assert!(campaign.paused_by_warmup);
}

#[tokio::test]
async fn manually_paused_campaigns_are_not_auto_resumed() {
    let pool = setup_pool().await;
    seed_brand(&pool, "b1").await;

    let req = CampaignReq {
        name: "Manual".into(),
        subject: "Hi".into(),
        body: "<p>Hi</p>".into(),
    };
    let campaign = campaign_service::create_campaign(&pool, "b1", &req)
        .await
        .unwrap();
    // paused, but not by the quota gate
    sqlx::query("UPDATE campaigns SET status = 'paused', paused_by_warmup = 0 WHERE id = ?")
        .bind(&campaign.id)
        .execute(&pool)
        .await
        .unwrap();

    warmup_service::get_config(&pool, "b1").await.unwrap();
    let now = db::now_epoch();
    sqlx::query(
        r#"UPDATE warmup_configs
           SET enabled = 1, auto_resume = 1, start_date = ?, sent_today = 0,
               last_reset_date = ?, last_auto_resume_check = ?
           WHERE brand_id = 'b1'"#,
    )
    .bind(now - 5 * 86_400)
    .bind(now)
    .bind(now - 86_400)
    .execute(&pool)
    .await
    .unwrap();

    let outcome = warmup_service::auto_resume_sweep(&pool, now).await.unwrap();
    assert!(outcome.resumed.is_empty());

    let refreshed = campaign_service::get_campaign(&pool, &campaign.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.status_enum(), Some(CampaignStatus::Paused));
}
