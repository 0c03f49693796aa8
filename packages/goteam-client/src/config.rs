/// Configuration for the goteam client.
/// Reads client.json from ~/.config/goteam/client.json (or platform equivalent).
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use goteam_core::session::Session;
use goteam_core::types::Identifier;

pub const ENV_BACKEND_URL: &str = "GOTEAM_BACKEND_URL";
pub const ENV_USERNAME: &str = "GOTEAM_USERNAME";
pub const ENV_TOKEN: &str = "GOTEAM_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Team new boards are created for.
    #[serde(default)]
    pub team_id: Option<Identifier>,
    /// Board opened at startup.
    #[serde(default)]
    pub board_id: Option<Identifier>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_backend_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: default_request_timeout_secs(),
            team_id: None,
            board_id: None,
        }
    }
}

impl ClientConfig {
    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|url| !url.trim().is_empty()) {
            log::info!("Using backend URL from {}", ENV_BACKEND_URL);
            self.backend_url = url;
        }
    }
}

/// Credentials handed over by the login flow through the environment.
pub fn session_from_env() -> Option<Session> {
    session_from_lookup(|key| std::env::var(key).ok())
}

fn session_from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Option<Session> {
    let username = lookup(ENV_USERNAME).filter(|value| !value.is_empty())?;
    let token = lookup(ENV_TOKEN).filter(|value| !value.is_empty())?;
    Some(Session::new(username, token))
}

/// Default config path: ~/.config/goteam/client.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("goteam")
        .join("client.json")
}

/// Load config from path. Returns default if file doesn't exist.
pub fn load_config(path: &Path) -> ClientConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Failed to parse config {}: {}", path.display(), e);
            ClientConfig::default()
        }),
        Err(_) => {
            log::info!("No config at {}, using defaults", path.display());
            ClientConfig::default()
        }
    }
}

pub fn save_config(path: &Path, config: &ClientConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("client.json"));
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        fs::write(&path, r#"{"board_id": 42}"#).unwrap();
        let config = load_config(&path);
        assert_eq!(config.board_id, Some(Identifier(42)));
        assert_eq!(config.backend_url, default_backend_url());
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn test_unparseable_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(load_config(&path), ClientConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("client.json");
        let config = ClientConfig {
            backend_url: "https://goteam.example".to_string(),
            team_id: Some(Identifier(3)),
            ..ClientConfig::default()
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path), config);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BACKEND_URL, "http://10.0.0.2:8000"),
            (ENV_USERNAME, "alice"),
            (ENV_TOKEN, "secret"),
        ]);
        let lookup = |key: &str| env.get(key).map(|value| value.to_string());

        let mut config = ClientConfig::default();
        config.apply_overrides(lookup);
        assert_eq!(config.backend_url, "http://10.0.0.2:8000");
        assert_eq!(session_from_lookup(lookup), Some(Session::new("alice", "secret")));
        assert_eq!(session_from_lookup(|_| None), None);
    }
}
