use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";

/// Per-brand warmup state, lazily created on first access.
///
/// `sent_today` is only ever zeroed by the daily reset; `current_phase`
/// and `daily_limit` are recomputed from elapsed days on each reset.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WarmupConfig {
    pub brand_id: String,
    pub enabled: bool,
    pub start_date: Option<i64>,
    /// IANA zone name used for calendar-day boundaries.
    pub timezone: String,
    pub current_phase: i64,
    /// NULL means unlimited (final phase).
    pub daily_limit: Option<i64>,
    pub sent_today: i64,
    pub last_reset_date: Option<i64>,
    pub last_auto_resume_check: Option<i64>,
    pub auto_resume: bool,
    pub updated_at: i64,
}

impl WarmupConfig {
    pub fn tz(&self) -> Tz {
        self.timezone
            .parse()
            .unwrap_or(chrono_tz::America::Sao_Paulo)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmupSettingsReq {
    pub enabled: Option<bool>,
    pub timezone: Option<String>,
    pub auto_resume: Option<bool>,
}
