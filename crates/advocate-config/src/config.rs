use serde::{Deserialize, Serialize};

pub const DEFAULT_WELCOME_MESSAGE: &str = "Hello! I'm your AI legal rights assistant. I can help you understand your rights based on your location ({location}). How can I assist you today?";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            backend: BackendConfig::default(),
            conversation: ConversationConfig::default(),
            voice: VoiceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Look up a value by dotted key
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["backend", "base_url"] => Some(self.backend.base_url.clone()),
            ["backend", "timeout_secs"] => Some(self.backend.timeout_secs.to_string()),
            ["backend", "max_retries"] => Some(self.backend.max_retries.to_string()),
            ["conversation", "welcome_message"] => Some(self.conversation.welcome_message.clone()),
            ["conversation", "default_state"] => self.conversation.default_state.clone(),
            ["voice", "speech_enabled"] => Some(self.voice.speech_enabled.to_string()),
            ["voice", "local_speech_command"] => Some(self.voice.local_speech_command.clone()),
            ["voice", "output_file"] => Some(self.voice.output_file.clone()),
            ["logging", "level"] => Some(self.logging.level.as_str().to_string()),
            ["logging", "json_format"] => Some(self.logging.json_format.to_string()),
            ["logging", "file"] => self.logging.file.clone(),
            _ => None,
        }
    }

    /// Set a value by dotted key
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["backend", "base_url"] => {
                self.backend.base_url = value.trim_end_matches('/').to_string();
            }
            ["backend", "timeout_secs"] => {
                self.backend.timeout_secs = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid number: {}", value))
                })?;
            }
            ["backend", "max_retries"] => {
                self.backend.max_retries = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid number: {}", value))
                })?;
            }
            ["conversation", "welcome_message"] => {
                self.conversation.welcome_message = value.to_string();
            }
            ["conversation", "default_state"] => {
                self.conversation.default_state = if value.trim().is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            ["voice", "speech_enabled"] => {
                self.voice.speech_enabled = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid boolean: {}", value))
                })?;
            }
            ["voice", "local_speech_command"] => {
                self.voice.local_speech_command = value.to_string();
            }
            ["voice", "output_file"] => {
                self.voice.output_file = value.to_string();
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "json_format"] => {
                self.logging.json_format = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid boolean: {}", value))
                })?;
            }
            ["logging", "file"] => {
                self.logging.file = Some(value.to_string());
            }
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }
}

/// Legal-response backend connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Retries for idempotent reads; writes are never retried
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    2
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 60,
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationConfig {
    /// `{location}` is replaced with the user's location
    pub welcome_message: String,
    /// State assumed at startup, if any
    #[serde(default)]
    pub default_state: Option<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            default_state: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceConfig {
    pub speech_enabled: bool,
    /// Program that reads text aloud when the backend cannot
    pub local_speech_command: String,
    /// Where synthesized replies are written
    pub output_file: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            speech_enabled: true,
            local_speech_command: "espeak".to_string(),
            output_file: "~/.advocate/speech/reply.mp3".to_string(),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    #[serde(default)]
    pub json_format: bool,
    /// Log file; stderr only when unset
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.max_retries, 2);
        assert!(config.conversation.welcome_message.contains("{location}"));
        assert!(config.voice.speech_enabled);
    }

    #[test]
    fn test_get_set_value() {
        let mut config = Config::default();
        config.set_value("backend.base_url", "http://legal.example:9000/").unwrap();
        assert_eq!(config.get_value("backend.base_url").unwrap(), "http://legal.example:9000");

        config.set_value("conversation.default_state", "Texas").unwrap();
        assert_eq!(config.get_value("conversation.default_state").unwrap(), "Texas");

        config.set_value("logging.level", "WARNING").unwrap();
        assert_eq!(config.logging.level, LogLevel::Warn);

        assert!(config.set_value("voice.speech_enabled", "maybe").is_err());
        assert!(matches!(
            config.set_value("server.port", "1"),
            Err(ConfigError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"version": "0.0.9"}"#).unwrap();
        assert_eq!(config.version, "0.0.9");
        assert_eq!(config.backend, BackendConfig::default());
        assert_eq!(config.logging.level, LogLevel::Info);
    }
}
