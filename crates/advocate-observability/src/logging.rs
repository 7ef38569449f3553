use std::path::{Path, PathBuf};

use advocate_config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Crates whose debug output drowns ours
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustls=warn"];

#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    #[error("Logging error: {message}")]
    Logging { message: String },

    #[error("Invalid log file path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ObservabilityError {
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ObservabilityError>;

/// Keeps the non-blocking file writer flushing; drop it at exit
#[derive(Debug, Default)]
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Build the event filter: `RUST_LOG` wins over the configured level.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|e| ObservabilityError::logging(format!("Invalid RUST_LOG: {}", e)))?,
        _ => EnvFilter::try_new(config.level.as_str())
            .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?,
    };

    for directive in QUIET_TARGETS {
        filter = filter.add_directive(
            directive
                .parse()
                .map_err(|e| ObservabilityError::logging(format!("Invalid directive: {}", e)))?,
        );
    }

    Ok(filter)
}

/// Install the global subscriber: stderr output plus an optional log file.
pub fn init_logging(config: &LoggingConfig) -> Result<LogGuard> {
    let filter = build_filter(config)?;
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    if config.json_format {
        layers.push(stderr.json().boxed());
    } else {
        layers.push(stderr.boxed());
    }

    let mut guard = LogGuard::default();
    if let Some(file) = config.file.as_deref() {
        let path = advocate_config::expand_tilde(file)
            .ok_or_else(|| ObservabilityError::InvalidPath(file.to_string()))?;
        let (dir, name) = split_log_path(&path)?;
        std::fs::create_dir_all(&dir)?;

        let appender = tracing_appender::rolling::never(dir, name);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        let file_layer = fmt::layer().with_writer(writer).with_ansi(false);
        if config.json_format {
            layers.push(file_layer.json().boxed());
        } else {
            layers.push(file_layer.boxed());
        }
        guard._file_guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| ObservabilityError::logging(e.to_string()))?;

    tracing::debug!(target: "advocate_observability", "Logging initialized with level: {}", config.level);
    Ok(guard)
}

fn split_log_path(path: &Path) -> Result<(PathBuf, String)> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ObservabilityError::InvalidPath(path.display().to_string()))?
        .to_string();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use advocate_config::LogLevel;

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/advocate/advocate.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log/advocate"));
        assert_eq!(name, "advocate.log");

        let (dir, name) = split_log_path(Path::new("advocate.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "advocate.log");
    }

    #[test]
    fn test_split_log_path_rejects_directory_only() {
        assert!(split_log_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_build_filter_from_config() {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            ..Default::default()
        };
        assert!(build_filter(&config).is_ok());
    }
}
