use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A sending tenant: owns its contacts, campaigns and SMTP identity.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Brand {
    pub id: String,
    pub user_id: i64,
    pub name: String,
    pub domain: String,
    pub smtp_host: String,
    pub smtp_port: i64,
    pub smtp_user: String,
    #[serde(skip_serializing)]
    pub smtp_password_enc: String, // Base64 encoded at rest
    pub from_email: String,
    /// Pause between two consecutive sends of a campaign run, in milliseconds.
    pub email_delay_ms: i64,
    pub is_default: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Brand {
    /// Encode an SMTP password for storage (simple base64, upgrade to a vault later)
    pub fn encode_password(password: &str) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(password.as_bytes())
    }

    pub fn decode_password(encoded: &str) -> Result<String> {
        use base64::Engine;
        let decoded = base64::engine::general_purpose::STANDARD.decode(encoded)?;
        Ok(String::from_utf8(decoded)?)
    }

    /// Decoded SMTP password for this brand
    pub fn smtp_password(&self) -> Result<String> {
        Self::decode_password(&self.smtp_password_enc)
    }
}
