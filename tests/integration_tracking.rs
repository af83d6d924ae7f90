use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use sendora::db;
use sendora::models::campaign::CampaignReq;
use sendora::models::contact::ContactReq;
use sendora::services::{campaign_service, contact_service, tracking_service};

async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

async fn seed(pool: &SqlitePool) -> (String, String, String, String) {
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
    let contact = contact_service::add_contact(
        pool,
        "b1",
        &ContactReq { email: "ana@test".into(), name: Some("Ana".into()) },
    )
    .await
    .unwrap();

    let log_id = "log-1".to_string();
    sqlx::query(
        "INSERT INTO email_logs (id, campaign_id, contact_id, status, detail, created_at) VALUES (?, ?, ?, 'sent', 'mid-1', 0)",
    )
    .bind(&log_id)
    .bind(&campaign.id)
    .bind(&contact.id)
    .execute(pool)
    .await
    .unwrap();

    (campaign.id, contact.id, contact.unsubscribe_token, log_id)
}

#[tokio::test]
async fn first_pixel_hit_flips_log_and_bumps_open_count() {
    let pool = setup_pool().await;
    let (campaign_id, _, _, log_id) = seed(&pool).await;

    assert!(tracking_service::record_open(&pool, &log_id).await.unwrap());

    let (status, opened_at): (String, Option<i64>) =
        sqlx::query_as("SELECT status, opened_at FROM email_logs WHERE id = ?")
            .bind(&log_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "opened");
    assert!(opened_at.is_some());

    let open_count: i64 = sqlx::query_scalar("SELECT open_count FROM campaigns WHERE id = ?")
        .bind(&campaign_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(open_count, 1);
}

#[tokio::test]
async fn repeat_pixel_hits_are_ignored() {
    let pool = setup_pool().await;
    let (campaign_id, _, _, log_id) = seed(&pool).await;

    assert!(tracking_service::record_open(&pool, &log_id).await.unwrap());
    assert!(!tracking_service::record_open(&pool, &log_id).await.unwrap());
    assert!(!tracking_service::record_open(&pool, "no-such-log").await.unwrap());

    let open_count: i64 = sqlx::query_scalar("SELECT open_count FROM campaigns WHERE id = ?")
        .bind(&campaign_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(open_count, 1);
}

#[tokio::test]
async fn pending_rows_never_count_as_opens() {
    let pool = setup_pool().await;
    let (campaign_id, contact_id, _, _) = seed(&pool).await;

    sqlx::query(
        "INSERT INTO email_logs (id, campaign_id, contact_id, status, created_at) VALUES ('log-2', ?, ?, 'pending', 0)",
    )
    .bind(&campaign_id)
    .bind(&contact_id)
    .execute(&pool)
    .await
    .unwrap();

    assert!(!tracking_service::record_open(&pool, "log-2").await.unwrap());
}

#[tokio::test]
async fn unsubscribe_by_token_flips_contact_status() {
    let pool = setup_pool().await;
    let (_, _, token, _) = seed(&pool).await;

    let contact = contact_service::unsubscribe_by_token(&pool, &token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(contact.email, "ana@test");

    let status: String = sqlx::query_scalar("SELECT status FROM contacts WHERE id = ?")
        .bind(&contact.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "unsubscribed");

    assert!(contact_service::unsubscribe_by_token(&pool, "bogus")
        .await
        .unwrap()
        .is_none());
}
