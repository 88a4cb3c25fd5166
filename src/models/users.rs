use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::Config;

/// One registry account. Playlist and EPG sources are optional; accounts
/// without a playlist source are valid and simply stay on an empty catalog.
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    pub playlist_url: Option<String>,
    pub epg_url: Option<String>,
}

/// users.json entry. The plain-string form is shorthand for a password-only
/// account, matching the flat `"name": "password"` files this gateway
/// historically shipped with.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UserSpec {
    Password(String),
    Full {
        password: String,
        #[serde(default)]
        playlist_url: Option<String>,
        #[serde(default)]
        epg_url: Option<String>,
    },
}

/// Static user registry, loaded once before serving traffic.
///
/// Username lookup is case-insensitive; the canonical (file-cased) name is
/// what gets bound to authenticated requests. Passwords are compared exactly.
#[derive(Debug, Default)]
pub struct UserRegistry {
    accounts: HashMap<String, UserAccount>,
    // lowercased username -> canonical username
    index: HashMap<String, String>,
}

impl UserRegistry {
    pub fn from_json(raw: &str, config: &Config) -> Result<Self> {
        let specs: HashMap<String, UserSpec> =
            serde_json::from_str(raw).context("Invalid users file")?;

        let mut registry = UserRegistry::default();
        for (username, spec) in specs {
            let account = match spec {
                UserSpec::Password(password) => UserAccount {
                    username: username.clone(),
                    password,
                    playlist_url: config.default_playlist_url.clone(),
                    epg_url: config.default_epg_url.clone(),
                },
                UserSpec::Full {
                    password,
                    playlist_url,
                    epg_url,
                } => UserAccount {
                    username: username.clone(),
                    password,
                    playlist_url: playlist_url.or_else(|| config.default_playlist_url.clone()),
                    epg_url: epg_url.or_else(|| config.default_epg_url.clone()),
                },
            };

            let folded = username.to_lowercase();
            if let Some(existing) = registry.index.get(&folded).cloned() {
                // Deterministic winner for case-insensitive resolution:
                // the lexicographically first canonical name
                let winner = if existing.as_str() <= username.as_str() {
                    existing.clone()
                } else {
                    username.clone()
                };
                tracing::warn!(
                    "Usernames '{}' and '{}' collide case-insensitively; '{}' keeps the folded lookup",
                    existing,
                    username,
                    winner
                );
                registry.index.insert(folded, winner);
            } else {
                registry.index.insert(folded, username.clone());
            }
            registry.accounts.insert(username, account);
        }

        Ok(registry)
    }

    pub fn load(path: &Path, config: &Config) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read users file {}", path.display()))?;
        Self::from_json(&raw, config)
    }

    /// Resolve a username case-insensitively to its canonical account.
    /// An exact-case match takes precedence over the folded index so that
    /// colliding entries each keep their own credentials.
    pub fn find(&self, username: &str) -> Option<&UserAccount> {
        if let Some(account) = self.accounts.get(username) {
            return Some(account);
        }
        self.index
            .get(&username.to_lowercase())
            .and_then(|canonical| self.accounts.get(canonical))
    }

    pub fn accounts(&self) -> impl Iterator<Item = &UserAccount> {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_config() -> Config {
        let mut config = Config::from_env();
        config.default_playlist_url = Some("http://default/playlist.m3u".to_string());
        config.default_epg_url = None;
        config
    }

    #[test]
    fn test_shorthand_and_full_entries() {
        let raw = r#"{
            "alice": "secret",
            "bob": {
                "password": "hunter2",
                "playlist_url": "http://prov/bob.m3u",
                "epg_url": "http://prov/bob.xml"
            }
        }"#;
        let registry = UserRegistry::from_json(raw, &test_config()).unwrap();

        let alice = registry.find("alice").unwrap();
        assert_eq!(alice.password, "secret");
        assert_eq!(
            alice.playlist_url.as_deref(),
            Some("http://default/playlist.m3u")
        );
        assert!(alice.epg_url.is_none());

        let bob = registry.find("bob").unwrap();
        assert_eq!(bob.playlist_url.as_deref(), Some("http://prov/bob.m3u"));
        assert_eq!(bob.epg_url.as_deref(), Some("http://prov/bob.xml"));
    }

    #[test]
    fn test_case_insensitive_lookup_keeps_canonical_name() {
        let raw = r#"{"Alice": "secret"}"#;
        let registry = UserRegistry::from_json(raw, &test_config()).unwrap();

        let account = registry.find("aLiCe").unwrap();
        assert_eq!(account.username, "Alice");
    }

    #[test]
    fn test_exact_match_beats_folded_index() {
        let raw = r#"{"john": "pass123", "John": "other456"}"#;
        let registry = UserRegistry::from_json(raw, &test_config()).unwrap();

        assert_eq!(registry.find("John").unwrap().password, "other456");
        assert_eq!(registry.find("john").unwrap().password, "pass123");
        // Non-exact casing resolves to the lexicographically first name
        assert_eq!(registry.find("JOHN").unwrap().password, "other456");
    }
}
