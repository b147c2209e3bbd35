//! Relay configuration.
//!
//! Loaded once at startup from an optional TOML file, then overridden by
//! environment variables. The resulting value is immutable and shared by all
//! requests.

use chatrelay_backend::GenerationEndpoint;
use chatrelay_core::{HistoryWindow, PromptLabels, SamplingParams};
use chatrelay_error::{ChatRelayError, ChatRelayResult};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument};

/// Placeholder backend used when nothing is configured. Not for production.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default request body limit: 10 MiB.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Address the HTTP server binds to.
pub const ENV_BIND: &str = "CHATRELAY_BIND";
/// Largest accepted request body in bytes.
pub const ENV_BODY_LIMIT_BYTES: &str = "CHATRELAY_BODY_LIMIT_BYTES";
/// Full generation URL, used verbatim.
pub const ENV_API_URL: &str = "GENERATION_API_URL";
/// Base URL; `/generate` is appended.
pub const ENV_BASE_URL: &str = "GENERATION_BASE_URL";
/// Backend timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "GENERATION_TIMEOUT_SECS";
/// JSON field holding the generated text.
pub const ENV_RESPONSE_FIELD: &str = "GENERATION_RESPONSE_FIELD";
/// Token budget per reply.
pub const ENV_MAX_NEW_TOKENS: &str = "GENERATION_MAX_NEW_TOKENS";
/// Sampling on/off.
pub const ENV_DO_SAMPLE: &str = "GENERATION_DO_SAMPLE";
/// Sampling temperature.
pub const ENV_TEMPERATURE: &str = "GENERATION_TEMPERATURE";
/// Nucleus sampling mass.
pub const ENV_TOP_P: &str = "GENERATION_TOP_P";
/// Turns of history kept in the prompt.
pub const ENV_HISTORY_TURNS: &str = "CHAT_HISTORY_TURNS";
/// Prompt label for user lines.
pub const ENV_USER_LABEL: &str = "CHAT_USER_LABEL";
/// Prompt label for assistant lines.
pub const ENV_ASSISTANT_LABEL: &str = "CHAT_ASSISTANT_LABEL";

/// Top-level relay configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Generation backend settings
    #[serde(default)]
    pub backend: BackendSettings,
    /// Sampling parameters forwarded with every prompt
    #[serde(default)]
    pub sampling: SamplingParams,
    /// Prompt construction settings
    #[serde(default)]
    pub prompt: PromptSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Socket address to bind
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Largest accepted request body; the transcript travels with every call
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

/// Generation backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL; prompts go to `<base_url>/generate`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Full URL used verbatim; takes precedence over `base_url`
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Upper bound on one backend call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// JSON field holding the generated text
    #[serde(default = "default_response_field")]
    pub response_field: String,
}

/// Prompt construction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSettings {
    /// Number of recent turns kept in the prompt
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
    /// Label for user lines
    #[serde(default = "default_user_label")]
    pub user_label: String,
    /// Label for assistant lines
    #[serde(default = "default_assistant_label")]
    pub assistant_label: String,
}

impl RelayConfig {
    /// Loads configuration from `path` (or defaults), applies environment
    /// overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed, an
    /// environment variable does not parse, or a value is out of range.
    #[instrument]
    pub fn load(path: Option<&Path>) -> ChatRelayResult<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = base.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> ChatRelayResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChatRelayError::configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the TOML is invalid.
    pub fn from_toml_str(content: &str) -> ChatRelayResult<Self> {
        toml::from_str(content).map_err(|e| {
            ChatRelayError::configuration(format!("Failed to parse config: {}", e))
        })
    }

    /// Applies overrides from `lookup`, normally the process environment.
    ///
    /// Variables that are unset leave the current value untouched.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a variable is set but does not parse.
    pub fn apply_env_with<F>(mut self, lookup: F) -> ChatRelayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(ENV_BIND) {
            self.server.bind = bind;
        }
        if let Some(limit) = parse_var(&lookup, ENV_BODY_LIMIT_BYTES)? {
            self.server.body_limit_bytes = limit;
        }
        if let Some(url) = lookup(ENV_API_URL) {
            self.backend.endpoint_url = Some(url);
        }
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.backend.base_url = url;
        }
        if let Some(secs) = parse_var(&lookup, ENV_TIMEOUT_SECS)? {
            self.backend.timeout_secs = secs;
        }
        if let Some(field) = lookup(ENV_RESPONSE_FIELD) {
            self.backend.response_field = field;
        }
        if let Some(turns) = parse_var(&lookup, ENV_HISTORY_TURNS)? {
            self.prompt.history_turns = turns;
        }
        if let Some(label) = lookup(ENV_USER_LABEL) {
            self.prompt.user_label = label;
        }
        if let Some(label) = lookup(ENV_ASSISTANT_LABEL) {
            self.prompt.assistant_label = label;
        }

        let current = &self.sampling;
        self.sampling = SamplingParams::builder()
            .max_new_tokens(
                parse_var(&lookup, ENV_MAX_NEW_TOKENS)?.unwrap_or(*current.max_new_tokens()),
            )
            .do_sample(parse_var(&lookup, ENV_DO_SAMPLE)?.unwrap_or(*current.do_sample()))
            .temperature(parse_var(&lookup, ENV_TEMPERATURE)?.unwrap_or(*current.temperature()))
            .top_p(parse_var(&lookup, ENV_TOP_P)?.unwrap_or(*current.top_p()))
            .build()
            .map_err(|e| ChatRelayError::configuration(format!("Invalid sampling: {}", e)))?;

        Ok(self)
    }

    /// Checks every derived value.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found.
    pub fn validate(&self) -> ChatRelayResult<()> {
        self.bind_addr()?;
        self.endpoint()?;
        self.window()?;
        self.sampling.validate()?;
        if self.server.body_limit_bytes == 0 {
            return Err(ChatRelayError::configuration(
                "body_limit_bytes must be greater than zero",
            ));
        }
        if self.backend.timeout_secs == 0 {
            return Err(ChatRelayError::configuration(
                "timeout_secs must be greater than zero",
            ));
        }
        if self.backend.response_field.is_empty() {
            return Err(ChatRelayError::configuration(
                "response_field must not be empty",
            ));
        }
        Ok(())
    }

    /// Socket address the HTTP server binds to.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `server.bind` is not a socket address.
    pub fn bind_addr(&self) -> ChatRelayResult<SocketAddr> {
        self.server.bind.parse().map_err(|e| {
            ChatRelayError::configuration(format!(
                "Invalid bind address '{}': {}",
                self.server.bind, e
            ))
        })
    }

    /// Resolved generation endpoint.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid URL.
    pub fn endpoint(&self) -> ChatRelayResult<GenerationEndpoint> {
        match &self.backend.endpoint_url {
            Some(url) => GenerationEndpoint::verbatim(url),
            None => GenerationEndpoint::from_base_url(&self.backend.base_url),
        }
    }

    /// True when the backend is still the built-in placeholder.
    pub fn uses_placeholder_backend(&self) -> bool {
        self.backend.endpoint_url.is_none() && self.backend.base_url == DEFAULT_BASE_URL
    }

    /// History window for prompt construction.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `history_turns` is zero.
    pub fn window(&self) -> ChatRelayResult<HistoryWindow> {
        HistoryWindow::new(self.prompt.history_turns)
    }

    /// Prompt role labels.
    pub fn labels(&self) -> PromptLabels {
        PromptLabels::new(&self.prompt.user_label, &self.prompt.assistant_label)
    }

    /// Backend call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> ChatRelayResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                ChatRelayError::configuration(format!("{}='{}' is invalid: {}", key, raw, e))
            })
        })
        .transpose()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoint_url: None,
            timeout_secs: default_timeout_secs(),
            response_field: default_response_field(),
        }
    }
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            history_turns: default_history_turns(),
            user_label: default_user_label(),
            assistant_label: default_assistant_label(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_body_limit_bytes() -> usize {
    DEFAULT_BODY_LIMIT_BYTES
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_response_field() -> String {
    chatrelay_backend::DEFAULT_RESPONSE_FIELD.to_string()
}

fn default_history_turns() -> usize {
    5
}

fn default_user_label() -> String {
    "User".to_string()
}

fn default_assistant_label() -> String {
    "Assistant".to_string()
}
