use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Root configuration for solace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[derive(Default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub limits: LimitsConfig,
    pub modes: ModesConfig,
    pub server: ServerConfig,
}

impl Config {
    /// API key for the configured provider, if one is set.
    pub fn get_api_key(&self) -> Option<&str> {
        let key = self.provider.api_key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    /// Reject settings that would break the pipeline's invariants.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.modes.premium_max_tokens <= self.modes.free_max_tokens {
            return Err(ConfigError::Invalid(format!(
                "premiumMaxTokens ({}) must exceed freeMaxTokens ({})",
                self.modes.premium_max_tokens, self.modes.free_max_tokens
            )));
        }
        if self.limits.max_requests == 0 {
            return Err(ConfigError::Invalid("maxRequests must be at least 1".to_string()));
        }
        if self.limits.window_secs == 0 {
            return Err(ConfigError::Invalid("windowSecs must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    pub api_key: String,
    pub api_base: Option<String>,
    pub model: String,
    pub temperature: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
        }
    }
}

/// Per-caller request throttling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LimitsConfig {
    pub window_secs: u64,
    pub max_requests: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_requests: 40,
        }
    }
}

/// Output-length ceilings per account tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModesConfig {
    pub premium_max_tokens: u32,
    pub free_max_tokens: u32,
}

impl Default for ModesConfig {
    fn default() -> Self {
        Self {
            premium_max_tokens: 1500,
            free_max_tokens: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

// ====== Config loading/saving ======

/// Load configuration from environment variables.
///
/// Priority:
/// 1. `SOLACE_CONFIG` env var, full JSON config
/// 2. Individual env vars (merged on top of the file config)
/// 3. File fallback (`~/.solace/config.json`)
pub fn load_config_from_env() -> Config {
    if let Ok(json) = std::env::var("SOLACE_CONFIG") {
        match serde_json::from_str::<Config>(&json) {
            Ok(config) => return config,
            Err(e) => {
                tracing::warn!("Failed to parse SOLACE_CONFIG: {}", e);
            }
        }
    }

    let mut cfg = load_config(None);

    if let Ok(v) = std::env::var("OPENAI_API_KEY") {
        cfg.provider.api_key = v;
    }
    if let Ok(v) = std::env::var("SOLACE_API_BASE") {
        cfg.provider.api_base = Some(v);
    }
    if let Ok(v) = std::env::var("SOLACE_MODEL") {
        cfg.provider.model = v;
    }
    if let Ok(v) = std::env::var("SOLACE_PORT") {
        match v.parse::<u16>() {
            Ok(port) => cfg.server.port = port,
            Err(_) => tracing::warn!("Ignoring invalid SOLACE_PORT: {}", v),
        }
    }

    cfg
}

/// Get the default config file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.json")
}

/// Get the solace data directory.
pub fn get_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".solace")
}

/// Read and parse a config file, failing on any problem.
pub fn read_config(path: &Path) -> std::result::Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    Ok(serde_json::from_str::<Config>(&content)?)
}

/// Load configuration from file or create default.
pub fn load_config(config_path: Option<&Path>) -> Config {
    let path = config_path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(get_config_path);

    match read_config(&path) {
        Ok(config) => config,
        Err(ConfigError::NotFound(_)) => Config::default(),
        Err(e) => {
            tracing::warn!("Failed to load config from {}: {}", path.display(), e);
            tracing::warn!("Using default configuration.");
            Config::default()
        }
    }
}

/// Save configuration to file.
pub fn save_config(config: &Config, config_path: Option<&Path>) -> std::result::Result<(), ConfigError> {
    let path = config_path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(get_config_path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    }

    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.limits.window_secs, 60);
        assert_eq!(cfg.limits.max_requests, 40);
        assert_eq!(cfg.modes.premium_max_tokens, 1500);
        assert_eq!(cfg.modes.free_max_tokens, 600);
        assert_eq!(cfg.server.port, 3000);
        assert!(cfg.get_api_key().is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_config_camelcase_compat() {
        let json = r#"{
            "provider": { "apiKey": "sk-test123", "model": "gpt-4o" },
            "limits": { "windowSecs": 30, "maxRequests": 10 },
            "modes": { "premiumMaxTokens": 2000 }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.get_api_key(), Some("sk-test123"));
        assert_eq!(cfg.provider.model, "gpt-4o");
        assert_eq!(cfg.limits.window_secs, 30);
        assert_eq!(cfg.limits.max_requests, 10);
        assert_eq!(cfg.modes.premium_max_tokens, 2000);
        assert_eq!(cfg.modes.free_max_tokens, 600);
    }

    #[test]
    fn test_validate_rejects_inverted_ceilings() {
        let mut cfg = Config::default();
        cfg.modes.premium_max_tokens = 600;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut cfg = Config::default();
        cfg.limits.max_requests = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.limits.window_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_blank_api_key_is_none() {
        let mut cfg = Config::default();
        cfg.provider.api_key = "   ".to_string();
        assert!(cfg.get_api_key().is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let mut cfg = Config::default();
        cfg.provider.model = "test-model".to_string();
        cfg.limits.max_requests = 5;
        save_config(&cfg, Some(&path)).unwrap();

        assert!(path.exists());
        let loaded = load_config(Some(&path));
        assert_eq!(loaded.provider.model, "test-model");
        assert_eq!(loaded.limits.max_requests, 5);
    }

    #[test]
    fn test_load_config_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = load_config(Some(&tmp.path().join("missing.json")));
        assert_eq!(cfg.provider.model, "gpt-4o-mini");
    }

    #[test]
    fn test_load_config_malformed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let cfg = load_config(Some(&path));
        assert_eq!(cfg.limits.max_requests, 40);
    }

    #[test]
    fn test_read_config_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.json");
        assert!(matches!(read_config(&missing), Err(ConfigError::NotFound(_))));

        let bad = tmp.path().join("bad.json");
        std::fs::write(&bad, "[1, 2").unwrap();
        assert!(matches!(read_config(&bad), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_from_env_full_json() {
        let json = r#"{ "provider": { "apiKey": "sk-env-test" } }"#;
        std::env::set_var("SOLACE_CONFIG", json);
        let cfg = load_config_from_env();
        assert_eq!(cfg.get_api_key(), Some("sk-env-test"));
        std::env::remove_var("SOLACE_CONFIG");
    }
}
