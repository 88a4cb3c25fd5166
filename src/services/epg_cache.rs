use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::models::UserAccount;
use crate::services::fetcher::Fetcher;

/// Served when a user has no guide source or a refresh attempt fails.
/// Never cached, so the next request tries the source again.
pub const EMPTY_GUIDE: &str =
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<tv generator-info-name=\"xtream-bridge\"></tv>\n";

struct EpgEntry {
    document: Arc<String>,
    fetched_at: Instant,
}

impl EpgEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Per-user raw guide documents with a fixed TTL (6 hours by default).
///
/// The guide XML is opaque to the gateway: it is stored and served verbatim,
/// never interpreted. A failed refresh leaves the previous (expired) entry in
/// place and serves the empty placeholder for that request only.
pub struct EpgCache {
    fetcher: Fetcher,
    ttl: Duration,
    entries: RwLock<HashMap<String, EpgEntry>>,
}

impl EpgCache {
    pub fn new(fetcher: Fetcher, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The user's guide document, refreshing if absent or expired.
    pub async fn get(&self, user: &UserAccount) -> Arc<String> {
        let Some(url) = user.epg_url.as_deref() else {
            return Arc::new(EMPTY_GUIDE.to_string());
        };

        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&user.username) {
                if entry.is_fresh(self.ttl) {
                    return entry.document.clone();
                }
            }
        }

        match self.fetcher.fetch_text(url).await {
            Ok(document) => {
                let document = Arc::new(document);
                self.entries.write().await.insert(
                    user.username.clone(),
                    EpgEntry {
                        document: document.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                document
            }
            Err(err) => {
                tracing::warn!("EPG fetch failed for '{}': {}", user.username, err);
                Arc::new(EMPTY_GUIDE.to_string())
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
