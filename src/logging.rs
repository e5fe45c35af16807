use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::Result;

/// Sends logs to `path`, since the terminal belongs to the UI. `RUST_LOG`
/// overrides the configured level. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init(level: &str, path: &Path) -> Result<WorkerGuard> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_missing_log_directory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logs").join("app.log");
        let guard = init("debug", &path).unwrap();
        tracing::info!("hello from the test");
        drop(guard);
        assert!(path.exists());
    }
}
