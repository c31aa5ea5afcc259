// Runtime settings, read from the environment (and an optional .env file)

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_HISTORY_FILE: &str = "historico_calculos.json";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_LOG_FILE: &str = "feecalc.log";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON file holding the calculation history (desktop variant)
    pub history_file: PathBuf,
    /// Address the web variant listens on
    pub bind_address: String,
    /// Fallback filter when RUST_LOG is not set
    pub log_level: String,
    /// Where the terminal UI sends its logs
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            bind_address: DEFAULT_BIND_ADDR.to_string(),
            log_level: "info".to_string(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        Config {
            history_file: get("FEECALC_HISTORY_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.history_file),
            bind_address: get("FEECALC_BIND_ADDR").unwrap_or(defaults.bind_address),
            log_level: get("FEECALC_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_file: get("FEECALC_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }

    /// Log to stdout (web server)
    pub fn init_stdout_logging(&self) {
        tracing_subscriber::registry()
            .with(self.env_filter())
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    /// Log to `log_file` so the terminal UI keeps the screen to itself
    pub fn init_file_logging(&self) -> Result<()> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .with_context(|| format!("Failed to open log file: {:?}", self.log_file))?;

        tracing_subscriber::registry()
            .with(self.env_filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
            .init();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);

        assert_eq!(config, Config::default());
        assert_eq!(config.history_file, PathBuf::from("historico_calculos.json"));
    }

    #[test]
    fn test_overrides_and_blank_values() {
        let vars: HashMap<&str, &str> = [
            ("FEECALC_HISTORY_FILE", "/tmp/h.json"),
            ("FEECALC_BIND_ADDR", "127.0.0.1:8080"),
            ("FEECALC_LOG_LEVEL", "  "),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.history_file, PathBuf::from("/tmp/h.json"));
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
    }
}
