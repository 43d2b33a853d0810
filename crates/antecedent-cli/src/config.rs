use std::time::Duration;

use antecedent_backend::ConnectionConfig;
use antecedent_core::RetryPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// API server connection
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Backoff for object reads during verification
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Connection validations
        if self.connection.server.trim().is_empty() {
            return Err("connection.server must not be empty".into());
        }
        if self.connection.timeout_ms == 0 {
            return Err("connection.timeout_ms must be > 0".into());
        }
        // Retry validations
        if self.retry.max_attempts == 0 {
            return Err("retry.max_attempts must be > 0".into());
        }
        if !self.retry.factor.is_finite() || self.retry.factor < 1.0 {
            return Err("retry.factor must be >= 1.0".into());
        }
        if !(0.0..=1.0).contains(&self.retry.jitter) {
            return Err("retry.jitter must be between 0.0 and 1.0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,
    #[serde(default = "default_factor")]
    pub factor: f64,
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Overall budget for one object read, unbounded when unset
    #[serde(default)]
    pub max_elapsed_ms: Option<u64>,
}

fn default_initial_interval_ms() -> u64 {
    10
}
fn default_factor() -> f64 {
    5.0
}
fn default_jitter() -> f64 {
    0.1
}
fn default_max_attempts() -> u32 {
    4
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            initial_interval_ms: default_initial_interval_ms(),
            factor: default_factor(),
            jitter: default_jitter(),
            max_attempts: default_max_attempts(),
            max_elapsed_ms: None,
        }
    }
}

impl RetrySettings {
    pub fn to_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::default()
            .with_initial_interval(Duration::from_millis(self.initial_interval_ms))
            .with_factor(self.factor)
            .with_jitter(self.jitter)
            .with_max_attempts(self.max_attempts);
        match self.max_elapsed_ms {
            Some(ms) => policy.with_max_elapsed(Duration::from_millis(ms)),
            None => policy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "warn".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if !pathbuf.exists() {
                    return Err(format!("config file not found: {p}"));
                }
                builder = builder.add_source(File::from(pathbuf));
            }
            None => {
                // Try default file in the working directory
                let default_path = PathBuf::from("antecedent.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., ANTECEDENT__CONNECTION__SERVER=https://k8s:6443
        builder = builder.add_source(
            Environment::with_prefix("ANTECEDENT")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
