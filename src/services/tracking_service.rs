/// Open tracking: first pixel hit flips the log row and bumps the
/// campaign's open counter.
use anyhow::Result;
use sqlx::SqlitePool;

use crate::db::now_epoch;
use crate::models::email_log::EmailLogStatus;

/// Returns true on the first hit for a sent log row; later hits (or hits
/// for rows that never reached sent) are no-ops.
pub async fn record_open(pool: &SqlitePool, log_id: &str) -> Result<bool> {
    let now = now_epoch();
    let res = sqlx::query("UPDATE email_logs SET status = ?, opened_at = ? WHERE id = ? AND status = ?")
        .bind(EmailLogStatus::Opened.as_str())
        .bind(now)
        .bind(log_id)
        .bind(EmailLogStatus::Sent.as_str())
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query(
        r#"UPDATE campaigns SET open_count = open_count + 1, updated_at = ?
           WHERE id = (SELECT campaign_id FROM email_logs WHERE id = ?)"#,
    )
    .bind(now)
    .bind(log_id)
    .execute(pool)
    .await?;

    Ok(true)
}
