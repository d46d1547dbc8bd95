//! Configuration loading for RelayClaw.
//!
//! Loads configuration from `~/.relayclaw/config.toml` with environment
//! variable overrides. Each load produces an immutable snapshot; the channel
//! manager and the provider hold it behind an `Arc` and a hot reload simply
//! swaps in a newer snapshot.

use relayclaw_core::channel::{ChannelKind, ChannelSettings};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Providers consulted for a credential when no top-level `api_key` is set,
/// highest priority first.
pub const PROVIDER_PRIORITY: [&str; 10] = [
    "openrouter",
    "anthropic",
    "openai",
    "deepseek",
    "gemini",
    "zhipu",
    "dashscope",
    "moonshot",
    "groq",
    "vllm",
];

/// The root configuration structure.
///
/// Maps directly to `~/.relayclaw/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (takes precedence over per-provider keys)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Explicit endpoint override (self-hosted or aggregator URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Provider-specific credentials
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Channel configurations
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_model() -> String {
    "anthropic/claude-opus-4-5".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_base", &self.api_base)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("providers", &self.providers)
            .field("channels", &self.channels)
            .field("logging", &self.logging)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// The credential and endpoint a provider should be built with.
#[derive(Clone, Default, PartialEq)]
pub struct ProviderCredentials {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &redact(&self.api_key))
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Per-kind channel configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Allow-list and platform-specific keys
    #[serde(flatten)]
    pub settings: ChannelSettings,
}

impl ChannelConfig {
    pub fn enabled(settings: ChannelSettings) -> Self {
        Self {
            enabled: true,
            settings,
        }
    }
}

impl std::fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Platform keys are mostly tokens and secrets; show names only.
        let mut keys: Vec<&String> = self.settings.extra.keys().collect();
        keys.sort();
        f.debug_struct("ChannelConfig")
            .field("enabled", &self.enabled)
            .field("allow_from", &self.settings.allow_from)
            .field("settings", &keys)
            .finish()
    }
}

/// One entry per supported channel kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub telegram: ChannelConfig,

    #[serde(default)]
    pub whatsapp: ChannelConfig,

    #[serde(default)]
    pub discord: ChannelConfig,

    #[serde(default)]
    pub feishu: ChannelConfig,
}

impl ChannelsConfig {
    pub fn get(&self, kind: ChannelKind) -> &ChannelConfig {
        match kind {
            ChannelKind::Telegram => &self.telegram,
            ChannelKind::WhatsApp => &self.whatsapp,
            ChannelKind::Discord => &self.discord,
            ChannelKind::Feishu => &self.feishu,
        }
    }

    pub fn get_mut(&mut self, kind: ChannelKind) -> &mut ChannelConfig {
        match kind {
            ChannelKind::Telegram => &mut self.telegram,
            ChannelKind::WhatsApp => &mut self.whatsapp,
            ChannelKind::Discord => &mut self.discord,
            ChannelKind::Feishu => &mut self.feishu,
        }
    }

    /// Kinds whose `enabled` flag is set.
    pub fn enabled_kinds(&self) -> Vec<ChannelKind> {
        ChannelKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).enabled)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write a daily-rotated debug log here in addition to stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.relayclaw/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `RELAYCLAW_API_KEY`
    /// - `RELAYCLAW_API_BASE`
    /// - `RELAYCLAW_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_toml_str(&content).map_err(|reason| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse a configuration document.
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Apply `RELAYCLAW_*` overrides using `lookup` to read variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("RELAYCLAW_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(base) = lookup("RELAYCLAW_API_BASE") {
            self.api_base = Some(base);
        }
        if let Some(model) = lookup("RELAYCLAW_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".relayclaw")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Pick the credential and endpoint the completion provider should use.
    ///
    /// The top-level `api_key` wins; otherwise the first provider in
    /// [`PROVIDER_PRIORITY`] with a key, then any other provider with a key
    /// (alphabetically). A top-level `api_base` always overrides a
    /// provider's own.
    pub fn provider_credentials(&self) -> ProviderCredentials {
        if self.api_key.is_some() {
            return ProviderCredentials {
                api_key: self.api_key.clone(),
                api_base: self.api_base.clone(),
            };
        }

        let mut others: Vec<&String> = self
            .providers
            .keys()
            .filter(|name| !PROVIDER_PRIORITY.contains(&name.as_str()))
            .collect();
        others.sort();

        let candidates = PROVIDER_PRIORITY
            .iter()
            .copied()
            .chain(others.into_iter().map(String::as_str));

        for name in candidates {
            if let Some(provider) = self.providers.get(name) {
                if provider.api_key.is_some() {
                    return ProviderCredentials {
                        api_key: provider.api_key.clone(),
                        api_base: self.api_base.clone().or_else(|| provider.api_base.clone()),
                    };
                }
            }
        }

        ProviderCredentials {
            api_key: None,
            api_base: self.api_base.clone(),
        }
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            providers: HashMap::new(),
            channels: ChannelsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let config = AppConfig::default();
        assert_eq!(config.default_model, "anthropic/claude-opus-4-5");
        assert_eq!(config.default_max_tokens, 4096);
        assert!(config.channels.enabled_kinds().is_empty());
    }

    #[test]
    fn config_roundtrip_toml() {
        let toml_str = AppConfig::default_toml();
        let parsed = AppConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed.default_model, AppConfig::default().default_model);
    }

    #[test]
    fn channel_sections_parse() {
        let config = AppConfig::from_toml_str(
            r#"
[channels.telegram]
enabled = true
token = "123:abc"
allow_from = ["alice"]

[channels.discord]
enabled = false
token = "xyz"
"#,
        )
        .unwrap();

        let telegram = config.channels.get(ChannelKind::Telegram);
        assert!(telegram.enabled);
        assert_eq!(telegram.settings.get_str("token"), Some("123:abc"));
        assert_eq!(telegram.settings.allow_from, vec!["alice".to_string()]);

        assert!(!config.channels.get(ChannelKind::Discord).enabled);
        assert_eq!(config.channels.enabled_kinds(), vec![ChannelKind::Telegram]);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = AppConfig::from_toml_str(
            r#"
api_key = "sk-or-secret"

[providers.groq]
api_key = "gsk-secret"

[channels.telegram]
enabled = true
token = "bot-secret"
"#,
        )
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-or-secret"));
        assert!(!debug.contains("gsk-secret"));
        assert!(!debug.contains("bot-secret"));
        assert!(debug.contains("token"));
    }

    #[test]
    fn top_level_key_wins() {
        let mut config = AppConfig {
            api_key: Some("sk-top".into()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "openrouter".into(),
            ProviderConfig {
                api_key: Some("sk-or-x".into()),
                api_base: None,
            },
        );
        assert_eq!(config.provider_credentials().api_key.as_deref(), Some("sk-top"));
    }

    #[test]
    fn provider_priority_order() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "groq".into(),
            ProviderConfig {
                api_key: Some("gsk".into()),
                api_base: None,
            },
        );
        config.providers.insert(
            "anthropic".into(),
            ProviderConfig {
                api_key: Some("sk-ant".into()),
                api_base: None,
            },
        );
        assert_eq!(config.provider_credentials().api_key.as_deref(), Some("sk-ant"));
    }

    #[test]
    fn provider_api_base_follows_its_key() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "vllm".into(),
            ProviderConfig {
                api_key: Some("local".into()),
                api_base: Some("http://localhost:8000/v1".into()),
            },
        );
        let creds = config.provider_credentials();
        assert_eq!(creds.api_base.as_deref(), Some("http://localhost:8000/v1"));
    }

    #[test]
    fn no_credentials_keeps_api_base() {
        let config = AppConfig {
            api_base: Some("http://gpu-box:8000/v1".into()),
            ..AppConfig::default()
        };
        let creds = config.provider_credentials();
        assert!(creds.api_key.is_none());
        assert_eq!(creds.api_base.as_deref(), Some("http://gpu-box:8000/v1"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| match name {
            "RELAYCLAW_API_KEY" => Some("sk-env".into()),
            "RELAYCLAW_MODEL" => Some("deepseek-chat".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.default_model, "deepseek-chat");
        assert!(config.api_base.is_none());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_model, "anthropic/claude-opus-4-5");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "default_model = \"glm-4.7-flash\"\n[channels.feishu]\nenabled = true"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "glm-4.7-flash");
        assert!(config.channels.get(ChannelKind::Feishu).enabled);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_model = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
