/// Campaign scheduler: delayed send invocations plus the periodic
/// warmup sweep. Owned by the process and shut down with it.
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::now_epoch;
use crate::models::campaign::CampaignStatus;
use crate::services::{campaign_service, sender_service, warmup_service};

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

type RunningSet = Arc<RwLock<HashSet<String>>>;

pub struct Scheduler {
    pool: SqlitePool,
    config: Config,
    /// Pending delayed invocations, keyed by campaign id so a scheduled
    /// run can be cancelled before it fires.
    pending: Arc<RwLock<HashMap<String, JoinHandle<()>>>>,
    /// In-flight runs; the per-campaign single-flight guard.
    running: RunningSet,
    sweep: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(pool: SqlitePool, config: Config) -> Arc<Self> {
        Arc::new(Scheduler {
            pool,
            config,
            pending: Arc::new(RwLock::new(HashMap::new())),
            running: Arc::new(RwLock::new(HashSet::new())),
            sweep: Mutex::new(None),
        })
    }

    /// Run a campaign send now ("send now" or a just-resumed campaign).
    pub fn invoke_send(&self, campaign_id: String) {
        let pool = self.pool.clone();
        let config = self.config.clone();
        let running = self.running.clone();
        tokio::spawn(async move {
            run_guarded(pool, config, running, campaign_id).await;
        });
    }

    /// Queue a send at a future instant, keyed by the campaign id.
    /// Re-scheduling replaces any pending invocation for that campaign.
    pub async fn schedule_send(&self, campaign_id: String, at: i64) {
        self.cancel_scheduled(&campaign_id).await;

        let pool = self.pool.clone();
        let config = self.config.clone();
        let running = self.running.clone();
        let pending = self.pending.clone();
        let key = campaign_id.clone();
        // The lock is held until the handle is stored: a due-now task
        // blocks on its claim below until registration is complete.
        let mut map = self.pending.write().await;
        let handle = tokio::spawn(async move {
            let wait = (at - now_epoch()).max(0) as u64;
            tokio::time::sleep(Duration::from_secs(wait)).await;
            // Claim the key before running so a late cancel cannot abort
            // a run that already started.
            if pending.write().await.remove(&key).is_none() {
                return;
            }
            run_guarded(pool, config, running, key).await;
        });
        map.insert(campaign_id, handle);
    }

    /// Cancel a pending delayed invocation. Returns false when nothing
    /// was pending under that campaign id.
    pub async fn cancel_scheduled(&self, campaign_id: &str) -> bool {
        if let Some(handle) = self.pending.write().await.remove(campaign_id) {
            handle.abort();
            true
        } else {
            false
        }
    }

    /// Start the recurring warmup sweep. Every tick it rolls daily
    /// resets and re-enqueues campaigns the sweep resumed.
    pub async fn start_sweep(&self) {
        let pool = self.pool.clone();
        let config = self.config.clone();
        let running = self.running.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(SWEEP_INTERVAL).await;
                sweep_tick(&pool, &config, &running).await;
            }
        });
        *self.sweep.lock().await = Some(handle);
    }

    /// Stop the sweep and abort pending delayed invocations. In-flight
    /// runs are not interrupted.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.sweep.lock().await.take() {
            handle.abort();
        }
        let mut pending = self.pending.write().await;
        for (_, handle) in pending.drain() {
            handle.abort();
        }
    }
}

async fn sweep_tick(pool: &SqlitePool, config: &Config, running: &RunningSet) {
    match warmup_service::auto_resume_sweep(pool, now_epoch()).await {
        Ok(outcome) => {
            if !outcome.resumed.is_empty() {
                info!(
                    processed = outcome.processed,
                    resumed = outcome.resumed.len(),
                    "warmup sweep resumed campaigns"
                );
            }
            for id in outcome.resumed {
                let pool = pool.clone();
                let config = config.clone();
                let running = running.clone();
                tokio::spawn(async move {
                    run_guarded(pool, config, running, id).await;
                });
            }
        }
        Err(e) => error!(error = %e, "warmup sweep failed"),
    }
}

async fn run_guarded(pool: SqlitePool, config: Config, running: RunningSet, campaign_id: String) {
    {
        let mut running = running.write().await;
        if !running.insert(campaign_id.clone()) {
            warn!(campaign = %campaign_id, "send already in flight, skipping duplicate invocation");
            return;
        }
    }

    if let Err(e) = sender_service::process_campaign_sending(&pool, &config, &campaign_id).await {
        error!(campaign = %campaign_id, error = %e, "campaign send failed");
        // The run may have died before flipping the status itself.
        if let Err(e) =
            campaign_service::set_status(&pool, &campaign_id, CampaignStatus::Failed).await
        {
            error!(campaign = %campaign_id, error = %e, "could not mark campaign failed");
        }
    }

    running.write().await.remove(&campaign_id);
}
