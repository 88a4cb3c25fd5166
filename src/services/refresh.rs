//! Background catalog refresh
//!
//! Re-parses upstream playlists on a fixed interval so long-running
//! deployments pick up channel changes without an operator-triggered reload.
//! Only users whose catalog is already populated are refreshed; first-time
//! population stays lazy.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::models::UserRegistry;
use crate::services::catalog_cache::CatalogCache;

pub async fn start_refresh_task(
    registry: Arc<UserRegistry>,
    cache: Arc<CatalogCache>,
    interval_secs: u64,
) {
    let mut interval = time::interval(Duration::from_secs(interval_secs));
    // First tick fires immediately; nothing is cached yet, so skip it
    interval.tick().await;

    loop {
        interval.tick().await;

        let usernames = cache.cached_users().await;
        if usernames.is_empty() {
            continue;
        }

        tracing::info!("Refreshing {} cached catalog(s)", usernames.len());
        for username in usernames {
            if let Some(user) = registry.find(&username) {
                cache.reload(user).await;
            }
        }
    }
}
