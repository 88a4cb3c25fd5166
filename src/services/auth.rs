use crate::models::{UserAccount, UserRegistry};

/// Resolve credentials against the registry: case-insensitive on username,
/// exact on password. Returns the canonical account on success.
pub fn authenticate<'r>(
    registry: &'r UserRegistry,
    username: &str,
    password: &str,
) -> Option<&'r UserAccount> {
    registry
        .find(username)
        .filter(|account| account.password == password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn registry() -> UserRegistry {
        UserRegistry::from_json(r#"{"alice": "secret"}"#, &Config::from_env()).unwrap()
    }

    #[test]
    fn test_username_case_insensitive() {
        let registry = registry();
        let account = authenticate(&registry, "Alice", "secret").unwrap();
        assert_eq!(account.username, "alice");
    }

    #[test]
    fn test_password_case_sensitive() {
        let registry = registry();
        assert!(authenticate(&registry, "alice", "Secret").is_none());
    }

    #[test]
    fn test_unknown_user() {
        let registry = registry();
        assert!(authenticate(&registry, "mallory", "secret").is_none());
    }
}
