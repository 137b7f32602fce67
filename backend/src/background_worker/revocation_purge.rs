use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Utc;
use crates::domain::repositories::revocations::RevocationRepository;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Deletes revocation rows whose token has expired anyway. Runs until the task is aborted.
pub async fn run_purge_loop<R>(revocation_repo: Arc<R>, interval: Duration)
where
    R: RevocationRepository + Send + Sync + ?Sized,
{
    info!(interval_secs = interval.as_secs(), "revocation_purge: started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if let Err(err) = purge_once(revocation_repo.as_ref()).await {
            error!(db_error = ?err, "revocation_purge: purge failed");
        }
    }
}

pub async fn purge_once<R>(revocation_repo: &R) -> Result<usize>
where
    R: RevocationRepository + Send + Sync + ?Sized,
{
    let removed = revocation_repo.purge_expired(Utc::now()).await?;

    if removed > 0 {
        info!(removed, "revocation_purge: expired revocations deleted");
    } else {
        debug!("revocation_purge: nothing to delete");
    }

    Ok(removed)
}
