use crate::config::{Config, ConfigError, ConfigResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Loads, validates and persists the client configuration
#[derive(Clone)]
pub struct ConfigManager {
    path: PathBuf,
    config: Arc<RwLock<Config>>,
}

impl ConfigManager {
    /// Load the config file, writing defaults if it does not exist yet
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        let config = if path.exists() {
            info!("Loading config from {:?}", path);
            let content = tokio::fs::read_to_string(path).await?;
            let content = Self::expand_env_vars(&content)?;
            let config: Config = serde_json::from_str(&content)?;
            Self::validate(&config)?;
            config
        } else {
            info!("Config file not found, creating default config at {:?}", path);
            let default_config = Config::default();
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let content = serde_json::to_string_pretty(&default_config)?;
            tokio::fs::write(path, &content).await?;
            default_config
        };

        Ok(Self {
            path: path.to_path_buf(),
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// Load from `~/.advocate/config.json`
    pub async fn load_default() -> ConfigResult<Self> {
        let config_path = Self::default_config_path()?;
        Self::load(&config_path).await
    }

    pub fn default_config_path() -> ConfigResult<PathBuf> {
        crate::default_config_path()
            .ok_or_else(|| ConfigError::InvalidPath("Could not find home directory".to_string()))
    }

    /// Wrap an in-memory config (tests, `config init`)
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(config)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Arc<RwLock<Config>> {
        Arc::clone(&self.config)
    }

    /// Clone of the current config
    pub async fn snapshot(&self) -> Config {
        self.config.read().await.clone()
    }

    pub async fn save(&self) -> ConfigResult<()> {
        let config = self.config.read().await;
        let content = serde_json::to_string_pretty(&*config)?;
        drop(config);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content).await?;
        info!("Config saved to {:?}", self.path);
        Ok(())
    }

    pub async fn reload(&self) -> ConfigResult<()> {
        if !self.path.exists() {
            return Err(ConfigError::InvalidPath(format!(
                "Config file not found: {:?}",
                self.path
            )));
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let content = Self::expand_env_vars(&content)?;
        let new_config: Config = serde_json::from_str(&content)?;

        Self::validate(&new_config)?;

        let mut config = self.config.write().await;
        *config = new_config;
        drop(config);

        info!("Config reloaded from {:?}", self.path);
        Ok(())
    }

    /// Apply `f`, validate the result and save it
    pub async fn update<F>(&self, f: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config) -> ConfigResult<()>,
    {
        let mut config = self.config.write().await;
        let mut candidate = config.clone();
        f(&mut candidate)?;
        Self::validate(&candidate)?;
        *config = candidate;
        drop(config);
        self.save().await
    }

    pub fn validate(config: &Config) -> ConfigResult<()> {
        let base_url = config.backend.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::Validation(
                "Backend base_url cannot be empty".to_string(),
            ));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "Backend base_url must start with http:// or https://: {}",
                base_url
            )));
        }

        if config.backend.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Backend timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Expand `${VAR}` or `${VAR:-default}`
    fn expand_env_vars(content: &str) -> ConfigResult<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        let mut result = String::with_capacity(content.len());
        let mut last = 0;

        for cap in re.captures_iter(content) {
            let (Some(full_match), Some(var_expr)) = (cap.get(0), cap.get(1)) else {
                continue;
            };

            let (var_name, default_value) = match var_expr.as_str().split_once(":-") {
                Some((name, default)) => (name, Some(default)),
                None => (var_expr.as_str(), None),
            };

            let replacement = match std::env::var(var_name) {
                Ok(val) => val,
                Err(_) => match default_value {
                    Some(default) => default.to_string(),
                    None => return Err(ConfigError::EnvVarNotFound(var_name.to_string())),
                },
            };

            result.push_str(&content[last..full_match.start()]);
            result.push_str(&replacement);
            last = full_match.end();
        }

        result.push_str(&content[last..]);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let manager = ConfigManager::load(&config_path).await.unwrap();
        let config = manager.snapshot().await;

        assert!(config_path.exists());
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.timeout_secs, 60);
    }

    #[tokio::test]
    async fn test_update_persists() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let manager = ConfigManager::load(&config_path).await.unwrap();

        manager
            .update(|config| config.set_value("conversation.default_state", "Ohio"))
            .await
            .unwrap();

        let reloaded = ConfigManager::load(&config_path).await.unwrap();
        assert_eq!(
            reloaded.snapshot().await.conversation.default_state.as_deref(),
            Some("Ohio")
        );
    }

    #[tokio::test]
    async fn test_update_rejects_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let manager = ConfigManager::load(&config_path).await.unwrap();

        let result = manager
            .update(|config| config.set_value("backend.timeout_secs", "0"))
            .await;
        assert!(matches!(result, Err(ConfigError::Validation(_))));
        assert_eq!(manager.snapshot().await.backend.timeout_secs, 60);
    }

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("ADVOCATE_TEST_BACKEND", "http://10.0.0.5:8000");

        let content = r#"{"base_url": "${ADVOCATE_TEST_BACKEND}", "other": "${ADVOCATE_TEST_UNSET_VAR:-fallback}"}"#;
        let expanded = ConfigManager::expand_env_vars(content).unwrap();

        assert!(expanded.contains("http://10.0.0.5:8000"));
        assert!(expanded.contains("fallback"));
    }

    #[test]
    fn test_env_var_missing() {
        let content = r#"{"key": "${ADVOCATE_TEST_DEFINITELY_UNSET}"}"#;
        assert!(matches!(
            ConfigManager::expand_env_vars(content),
            Err(ConfigError::EnvVarNotFound(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.backend.base_url = "localhost:8000".to_string();
        assert!(ConfigManager::validate(&config).is_err());

        config.backend.base_url = "https://rights.example.org".to_string();
        assert!(ConfigManager::validate(&config).is_ok());

        config.backend.timeout_secs = 0;
        assert!(ConfigManager::validate(&config).is_err());
    }
}
