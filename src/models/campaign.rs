use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Processing,
    Completed,
    Failed,
    Paused,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Scheduled => "scheduled",
            CampaignStatus::Processing => "processing",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Failed => "failed",
            CampaignStatus::Paused => "paused",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(CampaignStatus::Draft),
            "scheduled" => Some(CampaignStatus::Scheduled),
            "processing" => Some(CampaignStatus::Processing),
            "completed" => Some(CampaignStatus::Completed),
            "failed" => Some(CampaignStatus::Failed),
            "paused" => Some(CampaignStatus::Paused),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Campaign {
    pub id: String,
    pub brand_id: String,
    pub name: String,
    pub subject: String,
    /// HTML template; the literal `{{name}}` token is substituted per contact.
    pub body: String,
    pub status: String,
    pub scheduled_at: Option<i64>,
    pub sent_count: i64,
    pub open_count: i64,
    /// Distinguishes quota-induced pauses (eligible for auto-resume) from other pauses.
    pub paused_by_warmup: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Campaign {
    pub fn status_enum(&self) -> Option<CampaignStatus> {
        CampaignStatus::from_str(&self.status)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignReq {
    pub name: String,
    pub subject: String,
    pub body: String,
}
