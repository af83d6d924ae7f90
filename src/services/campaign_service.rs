/// Campaign management service
use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::now_epoch;
use crate::models::campaign::{Campaign, CampaignReq, CampaignStatus};
use crate::models::email_log::EmailLog;

pub async fn create_campaign(
    pool: &SqlitePool,
    brand_id: &str,
    req: &CampaignReq,
) -> Result<Campaign> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = now_epoch();

    sqlx::query(
        r#"INSERT INTO campaigns (id, brand_id, name, subject, body, status, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(brand_id)
    .bind(&req.name)
    .bind(&req.subject)
    .bind(&req.body)
    .bind(CampaignStatus::Draft.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let campaign = sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await?;
    Ok(campaign)
}

pub async fn get_campaign(pool: &SqlitePool, campaign_id: &str) -> Result<Option<Campaign>> {
    let campaign = sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns WHERE id = ?")
        .bind(campaign_id)
        .fetch_optional(pool)
        .await?;
    Ok(campaign)
}

pub async fn list_campaigns(pool: &SqlitePool, brand_id: &str) -> Result<Vec<Campaign>> {
    let campaigns = sqlx::query_as::<_, Campaign>(
        "SELECT * FROM campaigns WHERE brand_id = ? ORDER BY created_at DESC",
    )
    .bind(brand_id)
    .fetch_all(pool)
    .await?;
    Ok(campaigns)
}

pub async fn update_campaign(
    pool: &SqlitePool,
    campaign_id: &str,
    req: &CampaignReq,
) -> Result<Option<Campaign>> {
    sqlx::query(
        "UPDATE campaigns SET name = ?, subject = ?, body = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&req.name)
    .bind(&req.subject)
    .bind(&req.body)
    .bind(now_epoch())
    .bind(campaign_id)
    .execute(pool)
    .await?;
    get_campaign(pool, campaign_id).await
}

/// Deleting a campaign cascades its email logs.
pub async fn delete_campaign(pool: &SqlitePool, campaign_id: &str) -> Result<bool> {
    sqlx::query("DELETE FROM email_logs WHERE campaign_id = ?")
        .bind(campaign_id)
        .execute(pool)
        .await?;
    let result = sqlx::query("DELETE FROM campaigns WHERE id = ?")
        .bind(campaign_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_status(
    pool: &SqlitePool,
    campaign_id: &str,
    status: CampaignStatus,
) -> Result<()> {
    sqlx::query("UPDATE campaigns SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(now_epoch())
        .bind(campaign_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Quota gate hit: park the campaign for the auto-resume sweep.
pub async fn pause_for_warmup(pool: &SqlitePool, campaign_id: &str) -> Result<()> {
    sqlx::query(
        "UPDATE campaigns SET status = ?, paused_by_warmup = 1, updated_at = ? WHERE id = ?",
    )
    .bind(CampaignStatus::Paused.as_str())
    .bind(now_epoch())
    .bind(campaign_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_scheduled(
    pool: &SqlitePool,
    campaign_id: &str,
    scheduled_at: Option<i64>,
) -> Result<()> {
    sqlx::query(
        "UPDATE campaigns SET status = ?, scheduled_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(CampaignStatus::Scheduled.as_str())
    .bind(scheduled_at)
    .bind(now_epoch())
    .bind(campaign_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Cancel a scheduled campaign back to draft. Only scheduled campaigns
/// can be cancelled; returns false otherwise.
pub async fn cancel_schedule(pool: &SqlitePool, campaign_id: &str) -> Result<bool> {
    let res = sqlx::query(
        "UPDATE campaigns SET status = ?, scheduled_at = NULL, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(CampaignStatus::Draft.as_str())
    .bind(now_epoch())
    .bind(campaign_id)
    .bind(CampaignStatus::Scheduled.as_str())
    .execute(pool)
    .await?;
    Ok(res.rows_affected() > 0)
}

/// Manual resume of a paused campaign; clears the warmup flag.
pub async fn resume(pool: &SqlitePool, campaign_id: &str) -> Result<bool> {
    let res = sqlx::query(
        r#"UPDATE campaigns SET status = ?, paused_by_warmup = 0, updated_at = ?
           WHERE id = ? AND status = ?"#,
    )
    .bind(CampaignStatus::Scheduled.as_str())
    .bind(now_epoch())
    .bind(campaign_id)
    .bind(CampaignStatus::Paused.as_str())
    .execute(pool)
    .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn increment_sent(pool: &SqlitePool, campaign_id: &str) -> Result<()> {
    sqlx::query(
        "UPDATE campaigns SET sent_count = sent_count + 1, updated_at = ? WHERE id = ?",
    )
    .bind(now_epoch())
    .bind(campaign_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Full send audit trail for a campaign, in attempt order.
pub async fn logs(pool: &SqlitePool, campaign_id: &str) -> Result<Vec<EmailLog>> {
    let logs = sqlx::query_as::<_, EmailLog>(
        "SELECT * FROM email_logs WHERE campaign_id = ? ORDER BY rowid",
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;
    Ok(logs)
}

#[derive(Debug, Serialize)]
pub struct CampaignStats {
    pub sent_count: i64,
    pub open_count: i64,
    pub pending: i64,
    pub sent: i64,
    pub failed: i64,
    pub opened: i64,
}

pub async fn stats(pool: &SqlitePool, campaign_id: &str) -> Result<Option<CampaignStats>> {
    let Some(campaign) = get_campaign(pool, campaign_id).await? else {
        return Ok(None);
    };

    let count = |status: &'static str| {
        let pool = pool.clone();
        let id = campaign_id.to_string();
        async move {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM email_logs WHERE campaign_id = ? AND status = ?",
            )
            .bind(id)
            .bind(status)
            .fetch_one(&pool)
            .await
        }
    };

    Ok(Some(CampaignStats {
        sent_count: campaign.sent_count,
        open_count: campaign.open_count,
        pending: count("pending").await?,
        sent: count("sent").await?,
        failed: count("failed").await?,
        opened: count("opened").await?,
    }))
}
