pub mod models;
pub mod services;

pub use services::summarizer::{summarize, Summarizer, SummaryOptions};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const KEEP_LOG_FILES: usize = 30;

/// Logging switches, read once from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    file_log: bool,
    cleanup: bool,
    dir: PathBuf,
}

impl LogSettings {
    fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let truthy = |name: &str| {
            matches!(
                lookup(name).as_deref(),
                Some("1") | Some("true") | Some("TRUE") | Some("yes") | Some("YES")
            )
        };
        let dir = match lookup("NEPSUM_LOG_DIR") {
            Some(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => get_logs_dir(),
        };
        Self {
            file_log: !truthy("NEPSUM_DISABLE_FILE_LOG"),
            cleanup: !truthy("NEPSUM_DISABLE_LOG_CLEANUP"),
            dir,
        }
    }
}

/// Initialize logging: console to stderr plus a per-session log file.
///
/// - `RUST_LOG` controls the filter (default `info`)
/// - `NEPSUM_DISABLE_FILE_LOG=1` keeps logging on the console only
/// - `NEPSUM_DISABLE_LOG_CLEANUP=1` keeps every old session log
/// - `NEPSUM_LOG_DIR` overrides the log directory
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let settings = LogSettings::from_env();

    if !settings.file_log {
        init_console_only_logging(env_filter);
        return;
    }

    let logs_dir = settings.dir;
    if let Err(e) = fs::create_dir_all(&logs_dir) {
        eprintln!("Failed to create logs directory: {}", e);
        init_console_only_logging(env_filter);
        info!("Falling back to console-only logging (log dir not writable)");
        return;
    }

    let log_filename = format!("nepsum_{}.log", chrono::Local::now().format("%Y%m%d_%H%M%S"));

    // One file per session; writes stay off the calling thread.
    let (file_writer, file_guard) = tracing_appender::non_blocking(rolling::never(&logs_dir, &log_filename));
    let _ = LOG_GUARD.set(file_guard);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer())
        .try_init();

    info!(version = env!("CARGO_PKG_VERSION"), "[logging] writing {}", logs_dir.join(&log_filename).display());

    if settings.cleanup {
        std::thread::spawn(move || cleanup_old_logs(&logs_dir, KEEP_LOG_FILES));
    }
}

fn get_logs_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("nepsum").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn cleanup_old_logs(logs_dir: &Path, keep: usize) {
    let mut entries: Vec<_> = match fs::read_dir(logs_dir) {
        Ok(rd) => rd.filter_map(|e| e.ok()).collect(),
        Err(_) => return,
    };

    entries.retain(|e| {
        let name = e.file_name().to_string_lossy().to_string();
        name.starts_with("nepsum_") && name.ends_with(".log")
    });

    if entries.len() <= keep {
        return;
    }

    entries.sort_by_key(|e| {
        e.metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
    });

    let remove_count = entries.len().saturating_sub(keep);
    for entry in entries.into_iter().take(remove_count) {
        let _ = fs::remove_file(entry.path());
    }
}

fn console_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer().with_writer(std::io::stderr).with_target(false)
}

fn init_console_only_logging(env_filter: EnvFilter) {
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name: &str| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_log_settings_defaults() {
        let settings = LogSettings::from_lookup(lookup(&[]));
        assert!(settings.file_log);
        assert!(settings.cleanup);
        assert_eq!(settings.dir, get_logs_dir());
    }

    #[test]
    fn test_log_settings_switches() {
        let vars = [
            ("NEPSUM_DISABLE_LOG_CLEANUP", "1"),
            ("NEPSUM_DISABLE_FILE_LOG", "no"),
            ("NEPSUM_LOG_DIR", "/tmp/nepsum-logs"),
        ];
        let settings = LogSettings::from_lookup(lookup(&vars));
        assert!(!settings.cleanup);
        assert!(settings.file_log);
        assert_eq!(settings.dir, PathBuf::from("/tmp/nepsum-logs"));

        let settings = LogSettings::from_lookup(lookup(&[("NEPSUM_DISABLE_FILE_LOG", "true"), ("NEPSUM_LOG_DIR", "  ")]));
        assert!(!settings.file_log);
        assert!(settings.cleanup);
        assert_eq!(settings.dir, get_logs_dir());
    }

    #[test]
    fn test_cleanup_old_logs_keeps_newest() {
        let dir = std::env::temp_dir().join(format!("nepsum_logs_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for i in 0..5 {
            fs::write(dir.join(format!("nepsum_2026010{}_000000.log", i)), "x").unwrap();
        }
        fs::write(dir.join("other.txt"), "keep").unwrap();

        cleanup_old_logs(&dir, 2);

        let remaining: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|n| n.starts_with("nepsum_"))
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(dir.join("other.txt").exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
