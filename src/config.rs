use std::collections::HashSet;
use std::env;

/// How the stream endpoint hands media to clients.
///
/// A deployment-level choice: either every playable channel is answered with
/// a 302 to its upstream URL, or the gateway opens the upstream connection
/// itself and pipes the bytes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Redirect,
    Proxy,
}

impl StreamMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "proxy" => StreamMode::Proxy,
            _ => StreamMode::Redirect,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub base_url: String,

    // User registry
    pub users_file: String,
    pub default_playlist_url: Option<String>,
    pub default_epg_url: Option<String>,

    // Fetching
    pub fetch_timeout_ms: u64,
    pub epg_ttl_secs: u64,
    pub catalog_refresh_secs: u64,

    // Stream gateway
    pub stream_mode: StreamMode,
    pub bypass_hosts: HashSet<String>,

    // Admin
    pub admin_key: Option<String>,

    // Misc
    pub user_agent: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),

            // User registry
            users_file: env::var("USERS_FILE").unwrap_or_else(|_| "users.json".to_string()),
            default_playlist_url: env::var("M3U_URL").ok().filter(|v| !v.is_empty()),
            default_epg_url: env::var("EPG_URL").ok().filter(|v| !v.is_empty()),

            // Fetching
            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()
                .unwrap_or(30_000),
            epg_ttl_secs: env::var("EPG_TTL_SECS")
                .unwrap_or_else(|_| "21600".to_string())
                .parse()
                .unwrap_or(21_600), // 6 hours
            catalog_refresh_secs: env::var("CATALOG_REFRESH_SECS")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .unwrap_or(0), // 0 = lazy only

            // Stream gateway
            stream_mode: StreamMode::parse(
                &env::var("STREAM_MODE").unwrap_or_else(|_| "redirect".to_string()),
            ),
            bypass_hosts: parse_host_set(&env::var("BYPASS_HOSTS").unwrap_or_default()),

            // Admin
            admin_key: env::var("ADMIN_KEY").ok().filter(|v| !v.is_empty()),

            // Misc - Use VLC user agent to avoid IPTV server blocks
            user_agent: env::var("USER_AGENT")
                .unwrap_or_else(|_| "VLC/3.0.20 LibVLC/3.0.20".to_string()),
        }
    }
}

/// Parse a comma-separated host list into a lowercase set.
fn parse_host_set(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_mode_parse() {
        assert_eq!(StreamMode::parse("proxy"), StreamMode::Proxy);
        assert_eq!(StreamMode::parse("Proxy"), StreamMode::Proxy);
        assert_eq!(StreamMode::parse("redirect"), StreamMode::Redirect);
        assert_eq!(StreamMode::parse("passthrough"), StreamMode::Redirect);
    }

    #[test]
    fn test_parse_host_set() {
        let hosts = parse_host_set("CDN.example.com, other.net,,  ");
        assert_eq!(hosts.len(), 2);
        assert!(hosts.contains("cdn.example.com"));
        assert!(hosts.contains("other.net"));
    }
}
