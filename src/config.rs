use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::logging::LogConfig;

/// Process-level settings read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub engine: EngineEnvConfig,
}

#[derive(Debug, Clone, Default)]
pub struct EngineEnvConfig {
    /// JSON tuning profile; defaults apply when unset.
    pub tuning_path: Option<PathBuf>,
    /// JSON taxonomy; the reference graph applies when unset.
    pub taxonomy_path: Option<PathBuf>,
    /// Overrides `EngineConfig::history_window` when set.
    pub history_window: Option<usize>,
}

/// Logging settings only. These keys never warn, so they can be read
/// before the subscriber exists.
pub fn log_config_from_env() -> LogConfig {
    LogConfig {
        log_level: env_or("RUST_LOG", "info"),
        enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
        log_dir: env_or("LOG_DIR", "./logs"),
    }
}

impl Config {
    /// Reads every key. Parse failures are logged, so install tracing first.
    pub fn from_env() -> Self {
        let log = log_config_from_env();
        Self {
            log_level: log.log_level,
            enable_file_logs: log.enable_file_logs,
            log_dir: log.log_dir,
            engine: EngineEnvConfig {
                tuning_path: env_opt_path("ENGINE_TUNING_PATH"),
                taxonomy_path: env_opt_path("TAXONOMY_PATH"),
                history_window: env_opt_parse("ENGINE_HISTORY_WINDOW"),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(
                key,
                value = %raw,
                "Failed to parse env var, using default"
            );
            None
        }
    }
}

fn env_opt_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::*;

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn managed_keys() -> &'static [&'static str] {
        &[
            "RUST_LOG",
            "ENABLE_FILE_LOGS",
            "LOG_DIR",
            "ENGINE_TUNING_PATH",
            "TAXONOMY_PATH",
            "ENGINE_HISTORY_WINDOW",
        ]
    }

    fn clear_keys(keys: &[&str]) {
        for key in keys {
            env::remove_var(key);
        }
    }

    #[test]
    fn loads_defaults_when_missing() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        let cfg = Config::from_env();
        assert_eq!(cfg.log_level, "info");
        assert!(!cfg.enable_file_logs);
        assert_eq!(cfg.log_dir, "./logs");
        assert!(cfg.engine.tuning_path.is_none());
        assert!(cfg.engine.taxonomy_path.is_none());
        assert!(cfg.engine.history_window.is_none());
    }

    #[test]
    fn reads_paths_and_numbers() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("ENGINE_TUNING_PATH", "/etc/engine.json");
        env::set_var("TAXONOMY_PATH", "  ");
        env::set_var("ENGINE_HISTORY_WINDOW", "30");

        let cfg = Config::from_env();
        assert_eq!(
            cfg.engine.tuning_path.as_deref(),
            Some(std::path::Path::new("/etc/engine.json"))
        );
        assert!(cfg.engine.taxonomy_path.is_none());
        assert_eq!(cfg.engine.history_window, Some(30));
        clear_keys(managed_keys());
    }

    #[test]
    fn invalid_values_fall_back() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("ENGINE_HISTORY_WINDOW", "lots");
        env::set_var("ENABLE_FILE_LOGS", "maybe");

        let cfg = Config::from_env();
        assert!(cfg.engine.history_window.is_none());
        assert!(!cfg.enable_file_logs);
        clear_keys(managed_keys());
    }

    #[test]
    fn log_settings_match_full_config() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("LOG_DIR", "/var/log/practice");
        env::set_var("ENABLE_FILE_LOGS", "on");
        env::set_var("ENGINE_HISTORY_WINDOW", "bad");

        let log = log_config_from_env();
        let cfg = Config::from_env();
        assert_eq!(log.log_dir, "/var/log/practice");
        assert!(log.enable_file_logs);
        assert_eq!(log.log_dir, cfg.log_dir);
        assert_eq!(log.enable_file_logs, cfg.enable_file_logs);
        assert_eq!(log.log_level, cfg.log_level);
        clear_keys(managed_keys());
    }

    #[test]
    fn feature_flags_accept_common_spellings() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        for raw in ["1", "TRUE", "yes", "on"] {
            env::set_var("ENABLE_FILE_LOGS", raw);
            assert!(Config::from_env().enable_file_logs, "{raw}");
        }
        clear_keys(managed_keys());
    }
}
