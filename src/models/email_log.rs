use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailLogStatus {
    Pending,
    Sent,
    Failed,
    Opened,
}

impl EmailLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailLogStatus::Pending => "pending",
            EmailLogStatus::Sent => "sent",
            EmailLogStatus::Failed => "failed",
            EmailLogStatus::Opened => "opened",
        }
    }
}

/// One row per send attempt. `detail` holds the provider message id for
/// sent rows and the error text for failed rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmailLog {
    pub id: String,
    pub campaign_id: String,
    pub contact_id: String,
    pub status: String,
    pub detail: Option<String>,
    pub opened_at: Option<i64>,
    pub created_at: i64,
}
