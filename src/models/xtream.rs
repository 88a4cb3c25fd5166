use chrono::Utc;
use serde::Serialize;

/// Static expiry far enough out that players render the account as unlimited
/// (2030-01-01 00:00:00 UTC).
const EXP_DATE: &str = "1893456000";

/// Login-probe payload: `user_info` echoing the authenticated credentials
/// plus a server descriptor. Most fields are static because the registry does
/// not track per-account quotas.
#[derive(Debug, Serialize)]
pub struct AuthorizationResponse {
    pub user_info: UserInfo,
    pub server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub password: String,
    pub auth: u8,
    pub status: String,
    pub exp_date: String,
    pub is_trial: String,
    pub active_cons: String,
    pub created_at: String,
    pub max_connections: String,
    pub allowed_output_formats: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub url: String,
    pub port: String,
    pub https_port: String,
    pub server_protocol: String,
    pub rtmp_port: String,
    pub timestamp_now: i64,
    pub timezone: String,
}

impl AuthorizationResponse {
    pub fn new(username: &str, password: &str, base_url: &str, port: u16) -> Self {
        let now = Utc::now();
        let server_protocol = if base_url.starts_with("https") {
            "https"
        } else {
            "http"
        };

        Self {
            user_info: UserInfo {
                username: username.to_string(),
                password: password.to_string(),
                auth: 1,
                status: "Active".to_string(),
                exp_date: EXP_DATE.to_string(),
                is_trial: "0".to_string(),
                active_cons: "1".to_string(),
                created_at: "1609459200".to_string(),
                max_connections: "1".to_string(),
                allowed_output_formats: vec!["m3u8".to_string(), "ts".to_string()],
            },
            server_info: ServerInfo {
                url: base_url.to_string(),
                port: port.to_string(),
                https_port: port.to_string(),
                server_protocol: server_protocol.to_string(),
                rtmp_port: "1935".to_string(),
                timestamp_now: now.timestamp(),
                timezone: "UTC".to_string(),
            },
        }
    }
}

/// Auth-failure payload rendered by the API-style endpoints.
pub fn auth_failed() -> serde_json::Value {
    serde_json::json!({ "user_info": { "auth": 0, "status": "Disabled" } })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_probe_echoes_credentials() {
        let resp = AuthorizationResponse::new("alice", "secret", "http://gw.local", 8080);
        assert_eq!(resp.user_info.username, "alice");
        assert_eq!(resp.user_info.password, "secret");
        assert_eq!(resp.user_info.auth, 1);
        assert_eq!(resp.server_info.port, "8080");
        assert_eq!(resp.server_info.server_protocol, "http");
    }

    #[test]
    fn test_auth_failed_shape() {
        let body = serde_json::to_string(&auth_failed()).unwrap();
        assert!(body.contains("\"auth\":0"));
        assert!(body.contains("Disabled"));
    }
}
