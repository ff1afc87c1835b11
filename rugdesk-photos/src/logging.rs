//! Tracing subscriber setup
//!
//! Level: `RUST_LOG` if set, otherwise `[logging] level`. Output goes to
//! `[logging] file` (appended, parent directories created) when set,
//! otherwise stderr.

use rugdesk_common::config::LoggingConfig;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, falling back to the configured level
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Open `path` for appending, creating parent directories
pub fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Writer for the configured destination
pub fn log_writer(config: &LoggingConfig) -> std::io::Result<BoxMakeWriter> {
    match &config.file {
        Some(path) => Ok(BoxMakeWriter::new(Mutex::new(open_log_file(path)?))),
        None => Ok(BoxMakeWriter::new(std::io::stderr)),
    }
}

/// Install the global subscriber
pub fn init_tracing(config: &LoggingConfig) -> std::io::Result<()> {
    let writer = log_writer(config)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(writer)
        .with_ansi(config.file.is_none())
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_receives_events() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("rugdesk.log");
        let config = LoggingConfig {
            level: "info".to_string(),
            file: Some(path.clone()),
        };

        let subscriber = tracing_subscriber::fmt()
            .with_writer(log_writer(&config).unwrap())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(owner_id = "acme", "Photo upload complete");
            tracing::debug!("below configured level");
        });

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Photo upload complete"));
        assert!(text.contains("owner_id=\"acme\""));
        assert!(!text.contains("below configured level"));
    }

    #[test]
    fn test_log_file_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rugdesk.log");
        std::fs::write(&path, "earlier run\n").unwrap();

        let config = LoggingConfig {
            level: "info".to_string(),
            file: Some(path.clone()),
        };
        let subscriber = tracing_subscriber::fmt()
            .with_writer(log_writer(&config).unwrap())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || tracing::warn!("second run"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("earlier run\n"));
        assert!(text.contains("second run"));
    }

    #[test]
    fn test_unwritable_log_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let config = LoggingConfig {
            level: "info".to_string(),
            file: Some(blocker.join("rugdesk.log")),
        };
        assert!(log_writer(&config).is_err());
    }
}
