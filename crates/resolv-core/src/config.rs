use serde::{Deserialize, Serialize};

/// Default Gemini model used when neither config.toml nor secret.json names one.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Default cap on model requests per user message.
pub const DEFAULT_MAX_ROUNDS: usize = 8;

/// Default per-message deadline, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Root configuration structure for secret.json
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Root configuration structure for config.toml
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ConfigRoot {
    #[serde(default)]
    pub dialogue: DialogueConfig,
}

/// Settings for the tool-calling dialogue loop.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DialogueConfig {
    /// Model name override; takes precedence over secret.json
    pub model: Option<String>,
    /// Maximum model requests per user message
    pub max_rounds: usize,
    /// Deadline for one user message, in seconds
    pub request_timeout_secs: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl DialogueConfig {
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}
