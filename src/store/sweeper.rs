/// Background expiry of stale credential records
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::store::CredentialStore;

/// Spawn a task that sweeps records older than `max_age` every `interval`
/// for as long as the runtime lives. The first sweep runs immediately.
pub fn spawn_sweeper(store: CredentialStore, interval: Duration, max_age: Duration) -> JoinHandle<()> {
    info!(
        "Starting credential sweeper (interval {:?}, max age {:?})",
        interval, max_age
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let store = store.clone();
            let max_age_secs = max_age.as_secs();
            match tokio::task::spawn_blocking(move || store.sweep_expired(max_age_secs)).await {
                Ok(0) => debug!("Credential sweep found nothing to remove"),
                Ok(removed) => info!("Removed {} expired client records", removed),
                Err(e) => error!("Credential sweep task failed: {}", e),
            }
        }
    })
}
