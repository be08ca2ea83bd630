//! File-backed diagnostics. The terminal belongs to the UI, so log lines go to
//! a file instead of stderr.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// `<cache dir>/odk-shell/odk-shell.log`, or the working directory when no
/// cache dir is known.
pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("odk-shell")
        .join("odk-shell.log")
}

/// Install file logging, or run without a subscriber when the file cannot be
/// set up. Returns whether logging is active.
pub fn init_or_warn(log_path: &Path) -> bool {
    match init_file_logging(log_path) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("warning: logging disabled: {e:#}");
            false
        }
    }
}

pub fn init_file_logging(log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create log directory {}", parent.display()))?;
        }
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .try_init()
        .map_err(|e| anyhow::anyhow!("install log subscriber: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_ends_with_app_log() {
        let p = default_log_path();
        assert!(p.ends_with("odk-shell/odk-shell.log"));
    }

    #[test]
    fn unusable_log_path_does_not_abort_startup() {
        // A regular file cannot act as the log directory.
        let blocker = std::env::temp_dir().join(format!("odk-shell-log-{}", std::process::id()));
        std::fs::write(&blocker, b"").unwrap();
        let log_path = blocker.join("odk-shell.log");

        assert!(init_file_logging(&log_path).is_err());
        assert!(!init_or_warn(&log_path));

        std::fs::remove_file(&blocker).unwrap();
    }
}
