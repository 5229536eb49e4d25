mod defaults;


use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::action::Domain;
use crate::error::ConciergeError;
use defaults::*;

/// Top-level Concierge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// Capability endpoints keyed by domain (`calendar`, `gmail`, ...).
    #[serde(default)]
    pub capabilities: HashMap<String, CapabilityEndpoint>,
}

/// General assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// IANA timezone used to interpret "tomorrow at 3pm".
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            timezone: default_timezone(),
        }
    }
}

impl AssistantConfig {
    /// Parse the configured timezone.
    pub fn tz(&self) -> Result<chrono_tz::Tz, ConciergeError> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| ConciergeError::Config(format!("invalid timezone '{}': {e}", self.timezone)))
    }
}

/// Reasoning provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// `anthropic`, `openai`, or `none` (heuristic classifier only).
    #[serde(default = "default_provider")]
    pub default: String,
    pub anthropic: Option<AnthropicConfig>,
    pub openai: Option<OpenAiConfig>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            default: default_provider(),
            anthropic: None,
            openai: None,
        }
    }
}

/// Anthropic Messages API config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_anthropic_model")]
    pub model: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_anthropic_model(),
        }
    }
}

/// OpenAI-compatible chat completions config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_openai_model(),
            base_url: default_openai_base_url(),
        }
    }
}

/// Resolve an API key: the configured value, else the environment variable.
pub fn resolve_api_key(configured: &str, env_var: &str) -> String {
    if !configured.trim().is_empty() {
        return configured.trim().to_string();
    }
    std::env::var(env_var).unwrap_or_default()
}

/// Intent classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// When false the heuristic backend is used even if a provider exists.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
    /// Model override for classification calls.
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_classifier_timeout(),
            model: None,
        }
    }
}

/// Memory config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Prior turns passed to the classifier and orchestrator.
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            history_turns: default_history_turns(),
        }
    }
}

/// Dispatcher tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Tasks shown per page before "show the rest".
    #[serde(default = "default_task_page_size")]
    pub task_page_size: usize,
    /// Maximum age of a disambiguation round.
    #[serde(default = "default_pending_ttl_secs")]
    pub disambiguation_ttl_secs: i64,
    /// Age after which greetings clear other pending state.
    #[serde(default = "default_pending_ttl_secs")]
    pub stale_pending_secs: i64,
    /// Look-ahead window when no date narrows an event search.
    #[serde(default = "default_search_window_days")]
    pub search_window_days: i64,
    /// Default length of created events.
    #[serde(default = "default_event_minutes")]
    pub default_event_minutes: i64,
    /// Ask yes/no before deleting a single matched event.
    #[serde(default = "default_true")]
    pub confirm_deletes: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            task_page_size: default_task_page_size(),
            disambiguation_ttl_secs: default_pending_ttl_secs(),
            stale_pending_secs: default_pending_ttl_secs(),
            search_window_days: default_search_window_days(),
            default_event_minutes: default_event_minutes(),
            confirm_deletes: true,
        }
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Bearer token for API authentication. Empty = no auth (for local-only use).
    #[serde(default)]
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_api_host(),
            port: default_api_port(),
            api_key: String::new(),
        }
    }
}

/// Where a capability service lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityEndpoint {
    /// Base URL; `/perform` and `/search` are appended.
    pub endpoint: String,
    /// Bearer token sent to the service.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_capability_timeout")]
    pub timeout_secs: u64,
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

impl Config {
    /// Reject settings that cannot work at runtime.
    pub fn validate(&self) -> Result<(), ConciergeError> {
        self.assistant.tz()?;

        match self.provider.default.as_str() {
            "anthropic" | "openai" | "none" => {}
            other => {
                return Err(ConciergeError::Config(format!(
                    "unsupported provider: {other}"
                )))
            }
        }

        if self.dispatch.task_page_size == 0 {
            return Err(ConciergeError::Config(
                "dispatch.task_page_size must be at least 1".to_string(),
            ));
        }

        for (key, cap) in &self.capabilities {
            if key == Domain::Reminders.as_str() {
                warn!("capabilities.reminders is ignored: reminders are served locally");
            } else if Domain::from_key(key).is_none() {
                warn!("ignoring unknown capability section: {key}");
            }
            if cap.endpoint.trim().is_empty() {
                return Err(ConciergeError::Config(format!(
                    "capabilities.{key}.endpoint must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, ConciergeError> {
    let path = Path::new(path);
    if !path.exists() {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConciergeError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| ConciergeError::Config(format!("failed to parse config: {}", e)))?;

    config.validate()?;
    Ok(config)
}
