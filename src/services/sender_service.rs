/// Campaign send worker: dispatches one campaign run end to end.
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::now_epoch;
use crate::models::brand::Brand;
use crate::models::campaign::{Campaign, CampaignStatus};
use crate::models::contact::Contact;
use crate::models::email_log::EmailLogStatus;
use crate::services::{brand_service, campaign_service, contact_service, warmup_service};
use crate::smtp::{EmailTransport, Envelope, SmtpMailer, SmtpSettings};

/// Fixed extra backoff after a provider rate-limit response, on top of
/// the regular inter-send delay.
pub const RATE_LIMIT_PENALTY: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
pub struct RunOutcome {
    pub sent: u64,
    pub failed: u64,
    pub paused_by_warmup: bool,
}

/// Entry point invoked by the scheduler. The caller guarantees single
/// flight per campaign; a missing campaign is a logged no-op.
pub async fn process_campaign_sending(
    pool: &SqlitePool,
    config: &Config,
    campaign_id: &str,
) -> Result<RunOutcome> {
    let Some(campaign) = campaign_service::get_campaign(pool, campaign_id).await? else {
        warn!(campaign = %campaign_id, "send invoked for unknown campaign, skipping");
        return Ok(RunOutcome::default());
    };

    campaign_service::set_status(pool, &campaign.id, CampaignStatus::Processing).await?;

    match run(pool, config, &campaign).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            error!(campaign = %campaign.id, error = %e, "campaign run failed");
            campaign_service::set_status(pool, &campaign.id, CampaignStatus::Failed).await?;
            Err(e)
        }
    }
}

async fn run(pool: &SqlitePool, config: &Config, campaign: &Campaign) -> Result<RunOutcome> {
    let brand = brand_service::get_brand(pool, &campaign.brand_id)
        .await?
        .with_context(|| format!("brand {} not found", campaign.brand_id))?;

    // Resolved once per run; incomplete credentials abort the whole run.
    let settings = SmtpSettings::resolve(&brand)?;
    let mailer = SmtpMailer::connect(&settings)?;
    let delay = Duration::from_millis(settings.delay_ms);

    run_send_loop(pool, config, campaign, &brand, &mailer, delay).await
}

/// The send loop proper, generic over the transport so tests can inject
/// a fake provider.
pub async fn run_send_loop<T: EmailTransport + ?Sized>(
    pool: &SqlitePool,
    config: &Config,
    campaign: &Campaign,
    brand: &Brand,
    transport: &T,
    delay: Duration,
) -> Result<RunOutcome> {
    // Fixed snapshot: contacts subscribed after this point are excluded,
    // mid-run unsubscribes stay in.
    let contacts = contact_service::list_subscribed(pool, &brand.id).await?;
    info!(campaign = %campaign.id, contacts = contacts.len(), "starting campaign run");

    let warmup = {
        let cfg = warmup_service::get_config(pool, &brand.id).await?;
        if cfg.enabled {
            Some(warmup_service::roll_daily(pool, cfg, now_epoch()).await?)
        } else {
            None
        }
    };
    // Local shadow of the persisted counter, advanced after each send so
    // the quota gate does not re-read the row every iteration.
    let mut sent_today = warmup.as_ref().map(|c| c.sent_today).unwrap_or(0);
    let daily_limit = warmup.as_ref().and_then(|c| c.daily_limit);

    let mut outcome = RunOutcome::default();

    for contact in &contacts {
        if warmup.is_some() {
            if let Some(limit) = daily_limit {
                if sent_today >= limit {
                    info!(
                        campaign = %campaign.id,
                        limit,
                        "daily warmup limit reached, pausing campaign"
                    );
                    campaign_service::pause_for_warmup(pool, &campaign.id).await?;
                    outcome.paused_by_warmup = true;
                    return Ok(outcome);
                }
            }
        }

        let log_id = create_pending_log(pool, &campaign.id, &contact.id).await?;
        let envelope = Envelope {
            to: contact.email.clone(),
            from: brand.from_email.clone(),
            subject: campaign.subject.clone(),
            html: render_body(&campaign.body, contact, config, &log_id),
        };

        match transport.send(&envelope).await {
            Ok(message_id) => {
                mark_log_sent(pool, &log_id, &message_id).await?;
                campaign_service::increment_sent(pool, &campaign.id).await?;
                if warmup.is_some() {
                    warmup_service::record_send(pool, &brand.id).await?;
                    sent_today += 1;
                }
                outcome.sent += 1;
            }
            Err(e) => {
                let text = e.to_string();
                warn!(campaign = %campaign.id, to = %contact.email, error = %text, "send failed");
                // Audit trail: the pending row stays, the failure gets
                // its own row.
                insert_failed_log(pool, &campaign.id, &contact.id, &text).await?;
                outcome.failed += 1;
                if is_rate_limited(&text) {
                    warn!(campaign = %campaign.id, "provider rate limit detected, backing off");
                    sleep(RATE_LIMIT_PENALTY).await;
                }
            }
        }

        // Uniform throttle between consecutive sends, success or failure.
        sleep(delay).await;
    }

    campaign_service::set_status(pool, &campaign.id, CampaignStatus::Completed).await?;
    info!(
        campaign = %campaign.id,
        sent = outcome.sent,
        failed = outcome.failed,
        "campaign completed"
    );
    Ok(outcome)
}

/// Crude rate-limit heuristic on the provider's error text.
fn is_rate_limited(error_text: &str) -> bool {
    let lower = error_text.to_lowercase();
    lower.contains("limit") || lower.contains("too many")
}

/// Substitute the `{{name}}` placeholder, then append the tracking pixel
/// and the unsubscribe footer.
fn render_body(template: &str, contact: &Contact, config: &Config, log_id: &str) -> String {
    let name = contact
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("Friend");
    let mut html = template.replace("{{name}}", name);
    html.push_str(&format!(
        "\n<img src=\"{}/track/{}/open\" width=\"1\" height=\"1\" alt=\"\" style=\"display:none\">",
        config.api_base_url, log_id
    ));
    html.push_str(&format!(
        "\n<p style=\"font-size:12px;color:#888\"><a href=\"{}/unsubscribe/{}\">Unsubscribe</a></p>",
        config.app_base_url, contact.unsubscribe_token
    ));
    html
}

async fn create_pending_log(
    pool: &SqlitePool,
    campaign_id: &str,
    contact_id: &str,
) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO email_logs (id, campaign_id, contact_id, status, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(campaign_id)
    .bind(contact_id)
    .bind(EmailLogStatus::Pending.as_str())
    .bind(now_epoch())
    .execute(pool)
    .await?;
    Ok(id)
}

async fn mark_log_sent(pool: &SqlitePool, log_id: &str, message_id: &str) -> Result<()> {
    sqlx::query("UPDATE email_logs SET status = ?, detail = ? WHERE id = ?")
        .bind(EmailLogStatus::Sent.as_str())
        .bind(message_id)
        .bind(log_id)
        .execute(pool)
        .await?;
    Ok(())
}

async fn insert_failed_log(
    pool: &SqlitePool,
    campaign_id: &str,
    contact_id: &str,
    error_text: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO email_logs (id, campaign_id, contact_id, status, detail, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(campaign_id)
    .bind(contact_id)
    .bind(EmailLogStatus::Failed.as_str())
    .bind(error_text)
    .bind(now_epoch())
    .execute(pool)
    .await?;
    Ok(())
}
