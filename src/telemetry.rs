//! Logging setup.
//!
//! Console output always goes through a `tracing_subscriber` fmt layer. If
//! [`LoggingConfig::file`] is set, a second fmt layer writes plain text to that
//! file through a non-blocking `tracing_appender` worker; the returned guard
//! must be held until exit or buffered lines are lost.

use crate::config::LoggingConfig;
use crate::error::{GraphError, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over the configured filter.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&config.filter)?,
    };

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_thread_names(config.thread_names))
        .with(file_layer)
        .try_init()
        .map_err(|e| GraphError::Logging(e.to_string()))?;

    Ok(guard)
}

/// Parse an `EnvFilter` directive string, rejecting invalid directives.
pub fn parse_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives)
        .map_err(|e| GraphError::Logging(format!("invalid filter '{}': {}", directives, e)))
}

fn file_appender(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender> {
    let name = path
        .file_name()
        .ok_or_else(|| GraphError::Logging(format!("log path {:?} has no file name", path)))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    Ok(tracing_appender::rolling::never(dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(parse_filter(&LoggingConfig::default().filter).is_ok());
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let err = parse_filter("pingraph=loud").unwrap_err();
        assert!(matches!(err, GraphError::Logging(_)));
    }

    #[test]
    fn test_file_appender_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("engine.log");
        file_appender(&path).unwrap();
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn test_file_appender_needs_file_name() {
        assert!(file_appender(Path::new("/")).is_err());
    }
}
