/// Domain warmup: staged daily-volume ramp per brand
use anyhow::Result;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::now_epoch;
use crate::models::campaign::CampaignStatus;
use crate::models::warmup::{WarmupConfig, WarmupSettingsReq, DEFAULT_TIMEZONE};

const SECONDS_PER_DAY: i64 = 86_400;

/// Warmup ramp: days since start -> (phase, daily cap). The final phase
/// is uncapped (None).
pub fn phase_for(days_since_start: i64) -> (i64, Option<i64>) {
    match days_since_start.max(0) {
        0..=3 => (1, Some(50)),
        4..=7 => (2, Some(200)),
        8..=14 => (3, Some(500)),
        15..=21 => (4, Some(1500)),
        _ => (5, None),
    }
}

/// Whole wall-clock days elapsed between two instants, clamped at zero.
pub fn days_since(start: i64, now: i64) -> i64 {
    if now <= start {
        return 0;
    }
    (now - start) / SECONDS_PER_DAY
}

/// Calendar day of an instant in the given zone.
pub fn local_day(ts: i64, tz: Tz) -> NaiveDate {
    DateTime::from_timestamp(ts, 0)
        .unwrap_or_default()
        .with_timezone(&tz)
        .date_naive()
}

/// Load a brand's warmup config, creating the default row on first access.
pub async fn get_config(pool: &SqlitePool, brand_id: &str) -> Result<WarmupConfig> {
    if let Some(cfg) =
        sqlx::query_as::<_, WarmupConfig>("SELECT * FROM warmup_configs WHERE brand_id = ?")
            .bind(brand_id)
            .fetch_optional(pool)
            .await?
    {
        return Ok(cfg);
    }

    let now = now_epoch();
    sqlx::query(
        r#"INSERT OR IGNORE INTO warmup_configs
           (brand_id, enabled, timezone, current_phase, daily_limit, sent_today, auto_resume, updated_at)
           VALUES (?, 0, ?, 1, 50, 0, 1, ?)"#,
    )
    .bind(brand_id)
    .bind(DEFAULT_TIMEZONE)
    .bind(now)
    .execute(pool)
    .await?;

    let cfg = sqlx::query_as::<_, WarmupConfig>("SELECT * FROM warmup_configs WHERE brand_id = ?")
        .bind(brand_id)
        .fetch_one(pool)
        .await?;
    Ok(cfg)
}

/// Daily reset: once per local calendar day, zero the counter and
/// recompute phase/cap from elapsed days. No-op (and no write) when the
/// local day has not advanced; safe to call redundantly.
pub async fn roll_daily(pool: &SqlitePool, cfg: WarmupConfig, now: i64) -> Result<WarmupConfig> {
    let tz = cfg.tz();
    let advanced = match cfg.last_reset_date {
        Some(last) => local_day(now, tz) > local_day(last, tz),
        None => true,
    };
    if !advanced {
        return Ok(cfg);
    }

    let days = cfg
        .start_date
        .map(|start| days_since(start, now))
        .unwrap_or(0);
    let (phase, limit) = phase_for(days);

    // Guard on the old reset stamp so a racing sweep and send run cannot
    // both apply the roll.
    let res = sqlx::query(
        r#"UPDATE warmup_configs
           SET sent_today = 0, last_reset_date = ?, current_phase = ?, daily_limit = ?, updated_at = ?
           WHERE brand_id = ? AND last_reset_date IS ?"#,
    )
    .bind(now)
    .bind(phase)
    .bind(limit)
    .bind(now)
    .bind(&cfg.brand_id)
    .bind(cfg.last_reset_date)
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        // Lost the race; take the winner's state.
        let fresh =
            sqlx::query_as::<_, WarmupConfig>("SELECT * FROM warmup_configs WHERE brand_id = ?")
                .bind(&cfg.brand_id)
                .fetch_one(pool)
                .await?;
        return Ok(fresh);
    }

    info!(brand = %cfg.brand_id, phase, limit = ?limit, "warmup daily reset applied");
    Ok(WarmupConfig {
        sent_today: 0,
        last_reset_date: Some(now),
        current_phase: phase,
        daily_limit: limit,
        updated_at: now,
        ..cfg
    })
}

/// Atomic increment of the persisted sent-today counter.
pub async fn record_send(pool: &SqlitePool, brand_id: &str) -> Result<()> {
    sqlx::query(
        "UPDATE warmup_configs SET sent_today = sent_today + 1, updated_at = ? WHERE brand_id = ?",
    )
    .bind(now_epoch())
    .bind(brand_id)
    .execute(pool)
    .await?;
    Ok(())
}

#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub processed: usize,
    /// Campaign ids transitioned back to scheduled, to be re-enqueued.
    pub resumed: Vec<String>,
}

/// Periodic sweep over all brands with warmup + auto-resume on: roll the
/// daily reset, then once per local day re-schedule campaigns that were
/// paused by the quota gate. Idempotent per brand per calendar day.
pub async fn auto_resume_sweep(pool: &SqlitePool, now: i64) -> Result<SweepOutcome> {
    let configs = sqlx::query_as::<_, WarmupConfig>(
        "SELECT * FROM warmup_configs WHERE enabled = 1 AND auto_resume = 1",
    )
    .fetch_all(pool)
    .await?;

    let mut outcome = SweepOutcome {
        processed: configs.len(),
        resumed: Vec::new(),
    };

    for cfg in configs {
        let cfg = roll_daily(pool, cfg, now).await?;
        let tz = cfg.tz();
        let day_advanced = match cfg.last_auto_resume_check {
            Some(last) => local_day(now, tz) > local_day(last, tz),
            None => true,
        };
        if !day_advanced || cfg.sent_today != 0 {
            continue;
        }

        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM campaigns WHERE brand_id = ? AND status = ? AND paused_by_warmup = 1",
        )
        .bind(&cfg.brand_id)
        .bind(CampaignStatus::Paused.as_str())
        .fetch_all(pool)
        .await?;

        if !ids.is_empty() {
            sqlx::query(
                r#"UPDATE campaigns SET status = ?, paused_by_warmup = 0, updated_at = ?
                   WHERE brand_id = ? AND status = ? AND paused_by_warmup = 1"#,
            )
            .bind(CampaignStatus::Scheduled.as_str())
            .bind(now)
            .bind(&cfg.brand_id)
            .bind(CampaignStatus::Paused.as_str())
            .execute(pool)
            .await?;
            info!(brand = %cfg.brand_id, campaigns = ids.len(), "auto-resumed warmup-paused campaigns");
        }

        sqlx::query(
            "UPDATE warmup_configs SET last_auto_resume_check = ?, updated_at = ? WHERE brand_id = ?",
        )
        .bind(now)
        .bind(now)
        .bind(&cfg.brand_id)
        .execute(pool)
        .await?;

        outcome.resumed.extend(ids);
    }

    Ok(outcome)
}

/// Apply per-brand warmup settings. Enabling starts the ramp clock if it
/// was never started and recomputes the effective phase.
pub async fn update_settings(
    pool: &SqlitePool,
    brand_id: &str,
    req: &WarmupSettingsReq,
) -> Result<WarmupConfig> {
    let cfg = get_config(pool, brand_id).await?;
    let now = now_epoch();

    let enabled = req.enabled.unwrap_or(cfg.enabled);
    let auto_resume = req.auto_resume.unwrap_or(cfg.auto_resume);
    let timezone = match &req.timezone {
        Some(tz) => {
            if tz.parse::<Tz>().is_err() {
                anyhow::bail!("unknown timezone: {}", tz);
            }
            tz.clone()
        }
        None => cfg.timezone.clone(),
    };

    let start_date = match (enabled, cfg.start_date) {
        (true, None) => Some(now),
        (_, existing) => existing,
    };
    let days = start_date.map(|s| days_since(s, now)).unwrap_or(0);
    let (phase, limit) = phase_for(days);

    sqlx::query(
        r#"UPDATE warmup_configs
           SET enabled = ?, auto_resume = ?, timezone = ?, start_date = ?,
               current_phase = ?, daily_limit = ?, updated_at = ?
           WHERE brand_id = ?"#,
    )
    .bind(enabled)
    .bind(auto_resume)
    .bind(&timezone)
    .bind(start_date)
    .bind(phase)
    .bind(limit)
    .bind(now)
    .bind(brand_id)
    .execute(pool)
    .await?;

    let cfg = sqlx::query_as::<_, WarmupConfig>("SELECT * FROM warmup_configs WHERE brand_id = ?")
        .bind(brand_id)
        .fetch_one(pool)
        .await?;
    Ok(cfg)
}
