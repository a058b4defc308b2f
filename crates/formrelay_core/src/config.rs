//! Configuration for the relay.
//!
//! Non-secret settings come from a TOML file; every field that a hosting
//! platform normally injects (script URL, API key, bind address) can be
//! overridden from the environment. The Discord token is never read here,
//! see `formrelay_discord::DiscordBotConfig`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "formrelay.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    /// AI completion settings. The `/ai` command exists only when this is
    /// present, enabled and has a key.
    #[serde(default)]
    pub ai: Option<AiConfig>,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub discord: DiscordAppConfig,
}

/// Apps Script backend holding per-user form settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// URL of the deployed Apps Script web app.
    #[serde(default)]
    pub script_url: Option<String>,

    /// Timeout applied to every outbound request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            script_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_ai_url")]
    pub api_url: String,

    /// Never written back to disk.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_ai_model")]
    pub model: String,

    /// Reply used when the completion API answers with a non-200 status.
    #[serde(default = "default_ai_failure_message")]
    pub failure_message: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_ai_url(),
            api_key: None,
            model: default_ai_model(),
            failure_message: default_ai_failure_message(),
        }
    }
}

impl AiConfig {
    pub fn is_active(&self) -> bool {
        self.enabled && self.has_key()
    }

    /// A blank key (e.g. `AI_API_KEY=` in `.env`) counts as no key.
    fn has_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Health check listener required by the hosting platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_health_bind")]
    pub bind: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: default_health_bind(),
        }
    }
}

/// Discord options (non-sensitive)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordAppConfig {
    #[serde(default = "default_invite_url")]
    pub invite_url: String,

    #[serde(default = "default_homepage_url")]
    pub homepage_url: String,
}

impl Default for DiscordAppConfig {
    fn default() -> Self {
        Self {
            invite_url: default_invite_url(),
            homepage_url: default_homepage_url(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_ai_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ai_failure_message() -> String {
    "Sorry, the AI service could not answer right now.".to_string()
}

fn default_health_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_invite_url() -> String {
    "https://discord.com/oauth2/authorize?client_id=1279655946359935027".to_string()
}

fn default_homepage_url() -> String {
    "https://bamjun.github.io/google_forms_discord_bot/".to_string()
}

impl RelayConfig {
    /// Script URL, once [`validate`](Self::validate) has passed.
    pub fn script_url(&self) -> Result<&str, ConfigError> {
        self.backend
            .script_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigError::MissingField("backend.script_url (SCRIPT_URL)".to_string()))
    }

    /// The AI section, if the `/ai` command should be offered.
    pub fn active_ai(&self) -> Option<&AiConfig> {
        self.ai.as_ref().filter(|ai| ai.is_active())
    }

    /// Apply environment overrides using the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides from an arbitrary lookup.
    ///
    /// Setting an AI key through the environment creates the `[ai]` section
    /// with defaults when the file did not have one.
    pub fn apply_env_from(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("SCRIPT_URL") {
            self.backend.script_url = Some(url);
        }

        if let Some(key) = var("AI_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
            self.ai.get_or_insert_with(AiConfig::default).api_key = Some(key);
        }
        if let Some(ai) = self.ai.as_mut() {
            if let Some(url) = var("AI_API_URL") {
                ai.api_url = url;
            }
            if let Some(model) = var("AI_MODEL") {
                ai.model = model;
            }
        }

        if let Some(bind) = var("HEALTH_BIND") {
            self.health.bind = bind;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.script_url()?;

        if let Some(ai) = &self.ai {
            if ai.enabled && !ai.has_key() {
                return Err(ConfigError::InvalidValue {
                    field: "ai.api_key".to_string(),
                    reason: "AI is enabled but no key was given (set AI_API_KEY)".to_string(),
                });
            }
        }

        if self.health.enabled && self.health.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidValue {
                field: "health.bind".to_string(),
                reason: format!("'{}' is not a socket address", self.health.bind),
            });
        }

        Ok(())
    }
}

/// Load configuration from a TOML file
pub async fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;

    toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: path.display().to_string(),
        cause: e.to_string(),
    })
}

/// Candidate config files, most specific first.
pub fn standard_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("formrelay").join("config.toml"));
    }
    paths
}

/// Load the first config file that exists, or defaults when there is none.
pub async fn load_config_from_standard_locations() -> Result<RelayConfig, ConfigError> {
    for path in standard_config_paths() {
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!("Loading config from {}", path.display());
            return load_config(&path).await;
        }
    }

    tracing::info!("No config file found, using defaults");
    Ok(RelayConfig::default())
}
