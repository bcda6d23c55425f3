use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use litper_types::Country;

/// Top-level configuration for litper, read from `<state_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LitperConfig {
    /// Where the JSON state files live. Defaults to the directory holding
    /// this config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<String>,

    /// Optional backend serving `/dashboard/resumen`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Backend request timeout before falling back to local data.
    #[serde(default = "default_backend_timeout_ms")]
    pub backend_timeout_ms: u64,

    /// Address for `litper serve`.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// LLM CLI used by the chat and tracking summaries.
    #[serde(default = "default_assistant_command")]
    pub assistant_command: String,

    #[serde(default = "default_assistant_model")]
    pub assistant_model: String,

    /// Country used to validate phones when an import doesn't say.
    #[serde(default)]
    pub default_country: Country,

    /// Days within which a delivery counts as on time.
    #[serde(default = "default_sla_days")]
    pub sla_days: u32,

    #[serde(default = "default_trend_days")]
    pub trend_days: u32,

    /// Conversation messages kept as chat context.
    #[serde(default = "default_max_chat_messages")]
    pub max_chat_messages: usize,

    /// "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Seconds between agent city ticks while serving.
    #[serde(default = "default_city_tick_secs")]
    pub city_tick_secs: u64,
}

fn default_backend_timeout_ms() -> u64 {
    3000
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_assistant_command() -> String {
    "claude".to_string()
}

fn default_assistant_model() -> String {
    "haiku".to_string()
}

fn default_sla_days() -> u32 {
    litper_analytics::DEFAULT_SLA_DAYS
}

fn default_trend_days() -> u32 {
    30
}

fn default_max_chat_messages() -> usize {
    20
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_city_tick_secs() -> u64 {
    30
}

impl Default for LitperConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            api_url: None,
            backend_timeout_ms: default_backend_timeout_ms(),
            bind_addr: default_bind_addr(),
            assistant_command: default_assistant_command(),
            assistant_model: default_assistant_model(),
            default_country: Country::default(),
            sla_days: default_sla_days(),
            trend_days: default_trend_days(),
            max_chat_messages: default_max_chat_messages(),
            log_format: default_log_format(),
            city_tick_secs: default_city_tick_secs(),
        }
    }
}

impl LitperConfig {
    /// Config file path within the state directory.
    pub fn config_path(state_dir: &Path) -> PathBuf {
        state_dir.join("config.toml")
    }

    /// Load config from disk. Returns default if not found.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = Self::config_path(state_dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to disk.
    pub fn save(&self, state_dir: &Path) -> Result<()> {
        let path = Self::config_path(state_dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Directory for the JSON state files, `~` expanded.
    pub fn data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.state_dir {
            Some(dir) => expand_home(dir),
            None => config_dir.to_path_buf(),
        }
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = LitperConfig::default();
        assert_eq!(config.sla_days, 3);
        assert_eq!(config.assistant_model, "haiku");
        assert!(config.api_url.is_none());
        assert!(!config.json_logs());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let config = LitperConfig {
            api_url: Some("http://localhost:9000".to_string()),
            default_country: Country::Chile,
            ..LitperConfig::default()
        };
        config.save(dir.path()).unwrap();
        let loaded = LitperConfig::load(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(
            LitperConfig::config_path(dir.path()),
            "sla_days = 5\nlog_format = \"json\"\n",
        )
        .unwrap();
        let loaded = LitperConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.sla_days, 5);
        assert!(loaded.json_logs());
        assert_eq!(loaded.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_data_dir() {
        let config = LitperConfig::default();
        assert_eq!(config.data_dir(Path::new("/tmp/litper")), PathBuf::from("/tmp/litper"));

        let custom = LitperConfig {
            state_dir: Some("/var/lib/litper".to_string()),
            ..LitperConfig::default()
        };
        assert_eq!(custom.data_dir(Path::new("/tmp/x")), PathBuf::from("/var/lib/litper"));
    }
}
