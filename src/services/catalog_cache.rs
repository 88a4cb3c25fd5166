use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::{Catalog, UserAccount, UserRegistry};
use crate::services::fetcher::Fetcher;
use crate::services::m3u_parser;

/// Per-user catalog store, populated lazily on first authenticated access.
///
/// Entries are `Arc<Catalog>` so a reload replaces the whole entry with a
/// single map insert; concurrent readers keep whatever snapshot they already
/// cloned and never observe a half-written catalog. A failed fetch or parse
/// degrades the user to an empty catalog rather than leaving the entry
/// absent, so broken sources stay isolated to their own user.
pub struct CatalogCache {
    fetcher: Fetcher,
    entries: RwLock<HashMap<String, Arc<Catalog>>>,
}

impl CatalogCache {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Read-only lookup, keyed by canonical username. Used by the stream
    /// gateway, which must not trigger a load.
    pub async fn get(&self, username: &str) -> Option<Arc<Catalog>> {
        self.entries.read().await.get(username).cloned()
    }

    /// Cached entry for the user, loading it synchronously on first access.
    pub async fn get_or_load(&self, user: &UserAccount) -> Arc<Catalog> {
        if let Some(catalog) = self.get(&user.username).await {
            return catalog;
        }
        self.reload(user).await
    }

    /// Force a fresh fetch+parse and swap in the result wholesale.
    pub async fn reload(&self, user: &UserAccount) -> Arc<Catalog> {
        let catalog = Arc::new(self.load(user).await);
        self.entries
            .write()
            .await
            .insert(user.username.clone(), catalog.clone());
        catalog
    }

    /// Reload every registered user, sequentially.
    pub async fn reload_all(&self, registry: &UserRegistry) {
        for user in registry.accounts() {
            self.reload(user).await;
        }
    }

    /// Drop a user's entry; the next authenticated access loads it again.
    pub async fn invalidate(&self, username: &str) {
        self.entries.write().await.remove(username);
    }

    /// Usernames that currently hold an entry.
    pub async fn cached_users(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn load(&self, user: &UserAccount) -> Catalog {
        let Some(url) = user.playlist_url.as_deref() else {
            // Valid account with no source: stays on an empty catalog
            return Catalog::default();
        };

        let text = match self.fetcher.fetch_text(url).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("Playlist fetch failed for '{}': {}", user.username, err);
                return Catalog::default();
            }
        };

        match m3u_parser::parse_m3u(&text) {
            Ok(catalog) => {
                tracing::info!(
                    "Loaded catalog for '{}': {} channels in {} categories",
                    user.username,
                    catalog.channels.len(),
                    catalog.categories.len()
                );
                catalog
            }
            Err(err) => {
                tracing::warn!("Playlist parse failed for '{}': {}", user.username, err);
                Catalog::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_cache() -> CatalogCache {
        let fetcher = Fetcher::new(&Config::from_env()).unwrap();
        CatalogCache::new(fetcher)
    }

    fn user_without_source(name: &str) -> UserAccount {
        UserAccount {
            username: name.to_string(),
            password: "pw".to_string(),
            playlist_url: None,
            epg_url: None,
        }
    }

    #[tokio::test]
    async fn test_user_without_source_keeps_empty_catalog() {
        let cache = test_cache();
        let user = user_without_source("alice");

        let catalog = cache.get_or_load(&user).await;
        assert!(catalog.channels.is_empty());
        assert!(catalog.categories.is_empty());

        // The empty entry is cached, not re-derived
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("alice").await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_drops_entry() {
        let cache = test_cache();
        let user = user_without_source("alice");

        cache.get_or_load(&user).await;
        cache.invalidate("alice").await;
        assert!(cache.get("alice").await.is_none());
    }

    #[tokio::test]
    async fn test_get_never_loads() {
        let cache = test_cache();
        assert!(cache.get("nobody").await.is_none());
        assert_eq!(cache.len().await, 0);
    }
}
