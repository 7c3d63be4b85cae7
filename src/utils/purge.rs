use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Days, Utc};
use sqlx::MySqlPool;
use tracing::{error, info};

use crate::db;

/// Checks older than this instant are removed.
pub fn purge_cutoff(now: DateTime<Utc>, retention_days: u32) -> DateTime<Utc> {
    now.checked_sub_days(Days::new(u64::from(retention_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub async fn purge_once(pool: &MySqlPool, retention_days: u32) -> Result<u64> {
    let cutoff = purge_cutoff(Utc::now(), retention_days);
    let removed = db::purge_before(pool, cutoff).await?;

    info!(removed, cutoff = %cutoff, "Purged old check events");
    Ok(removed)
}

/// Runs [`purge_once`] now and then every `interval_hours`, forever.
pub async fn run_purge_loop(pool: MySqlPool, retention_days: u32, interval_hours: u64) {
    let period = Duration::from_secs(interval_hours.max(1) * 3600);
    let mut ticker = actix_web::rt::time::interval(period);

    loop {
        ticker.tick().await;
        if let Err(e) = purge_once(&pool, retention_days).await {
            error!(error = %e, "Purge of old check events failed");
        }
    }
}
