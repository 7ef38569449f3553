pub mod config;
pub mod manager;

pub use config::{
    BackendConfig, Config, ConfigError, ConfigResult, ConversationConfig, LogLevel, LoggingConfig,
    VoiceConfig, DEFAULT_WELCOME_MESSAGE,
};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// Advocate's directory under the user's home
pub fn advocate_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".advocate"))
}

/// Default config file path
pub fn default_config_path() -> Option<PathBuf> {
    advocate_dir().map(|dir| dir.join("config.json"))
}

/// Default log file path
pub fn default_log_path() -> Option<PathBuf> {
    advocate_dir().map(|dir| dir.join("logs").join("advocate.log"))
}

/// Create the Advocate directory layout
pub async fn init_advocate_dirs() -> ConfigResult<()> {
    if let Some(dir) = advocate_dir() {
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::create_dir_all(dir.join("logs")).await?;
    }
    Ok(())
}

/// Expand a leading `~/` to the user's home directory
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir().map(|home| home.join(rest))
    } else {
        Some(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advocate_dir() {
        let dir = advocate_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().to_string_lossy().contains(".advocate"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/.advocate/config.json");
        assert!(expanded.is_some());
        assert!(!expanded.unwrap().to_string_lossy().starts_with('~'));

        assert_eq!(expand_tilde("/etc/advocate.json"), Some(PathBuf::from("/etc/advocate.json")));
    }
}
