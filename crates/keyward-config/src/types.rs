//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! base_url = "https://api.example"
//!
//! [paths]        # login, logout, refresh
//! [transport]    # timeout_secs, user_agent
//! [login]        # body, token_field, refresh_token_field
//! [refresh]      # token_field
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL relative request paths are joined onto.
    pub base_url: Option<String>,

    /// Authentication endpoint paths.
    pub paths: Option<PathsConfig>,

    /// HTTP transport settings.
    pub transport: Option<TransportConfig>,

    /// Login exchange settings.
    pub login: Option<LoginConfig>,

    /// Refresh exchange settings.
    pub refresh: Option<RefreshConfig>,
}

impl Settings {
    /// Create empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge other settings on top of these (other takes priority).
    pub fn merge(&mut self, other: Settings) {
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }

        if let Some(paths) = other.paths {
            self.paths.get_or_insert_with(PathsConfig::default).merge(paths);
        }

        if other.transport.is_some() {
            self.transport = other.transport;
        }

        if other.login.is_some() {
            self.login = other.login;
        }

        if other.refresh.is_some() {
            self.refresh = other.refresh;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// Endpoint paths (`[paths]`). Unset paths keep the client defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub login: Option<String>,
    pub logout: Option<String>,
    pub refresh: Option<String>,
}

impl PathsConfig {
    fn merge(&mut self, other: PathsConfig) {
        if other.login.is_some() {
            self.login = other.login;
        }
        if other.logout.is_some() {
            self.logout = other.logout;
        }
        if other.refresh.is_some() {
            self.refresh = other.refresh;
        }
    }
}

/// HTTP transport settings (`[transport]`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// User agent sent with every request.
    pub user_agent: Option<String>,
}

/// Login exchange settings (`[login]`).
///
/// `token_field` and `refresh_token_field` are dotted paths into the login
/// response body, e.g. `"data.access"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// JSON body sent with every login request.
    pub body: Option<Map<String, Value>>,
    pub token_field: Option<String>,
    pub refresh_token_field: Option<String>,
}

/// Refresh exchange settings (`[refresh]`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Dotted path of the access token in the refresh response body.
    pub token_field: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let settings = Settings::from_toml(
            r#"
base_url = "https://api.example"

[paths]
login = "/login"
refresh = "/token/refresh"

[transport]
timeout_secs = 5
user_agent = "test-agent"

[login]
token_field = "data.access"
refresh_token_field = "data.refresh"

[login.body]
username = "ada"
password = "hunter2"

[refresh]
token_field = "access"
"#,
        )
        .unwrap();

        assert_eq!(settings.base_url.as_deref(), Some("https://api.example"));
        let paths = settings.paths.unwrap();
        assert_eq!(paths.login.as_deref(), Some("/login"));
        assert!(paths.logout.is_none());
        assert_eq!(settings.transport.unwrap().timeout_secs, Some(5));

        let login = settings.login.unwrap();
        assert_eq!(login.token_field.as_deref(), Some("data.access"));
        assert_eq!(login.body.unwrap()["username"], "ada");
        assert_eq!(settings.refresh.unwrap().token_field.as_deref(), Some("access"));
    }

    #[test]
    fn test_parse_empty() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::new());
    }

    #[test]
    fn test_parse_invalid() {
        let err = Settings::from_toml("base_url = [").unwrap_err();
        assert!(matches!(err, crate::ConfigError::Parse(_)));
    }

    #[test]
    fn test_merge_overrides_and_keeps() {
        let mut base = Settings::from_toml(
            r#"
base_url = "https://user.example"
[paths]
login = "/login"
logout = "/logout"
[transport]
timeout_secs = 30
"#,
        )
        .unwrap();
        let project = Settings::from_toml(
            r#"
base_url = "https://project.example"
[paths]
login = "/session"
"#,
        )
        .unwrap();

        base.merge(project);

        assert_eq!(base.base_url.as_deref(), Some("https://project.example"));
        let paths = base.paths.as_ref().unwrap();
        assert_eq!(paths.login.as_deref(), Some("/session"));
        assert_eq!(paths.logout.as_deref(), Some("/logout"));
        assert_eq!(base.transport.unwrap().timeout_secs, Some(30));
    }

    #[test]
    fn test_roundtrip_toml() {
        let settings = Settings {
            base_url: Some("https://api.example".to_string()),
            paths: Some(PathsConfig {
                login: Some("/login".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let parsed = Settings::from_toml(&settings.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, settings);
    }
}
