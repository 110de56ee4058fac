/// Configuration file loader for rs_webssh
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use tracing::info;

use crate::config::{AppConfig, ConfigError};
use crate::service::{COLS_RANGE, ROWS_RANGE};

/// Prefix of environment variables overriding file values, e.g. `WEBSSH__SERVER__PORT=9000`
const ENV_PREFIX: &str = "WEBSSH";

/// Configuration loader responsible for loading and parsing configuration files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a file, layered under environment overrides.
    ///
    /// An explicit path must exist. Without one the default `config.toml` is
    /// used when present and built-in defaults otherwise.
    pub fn load_config(&self, config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let (path, required) = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound(path.display().to_string()));
                }
                (Some(path.to_path_buf()), true)
            }
            None => (default_config_path(), false),
        };

        let mut builder = Config::builder();
        if let Some(path) = path {
            info!("Loading configuration from file: {:?}", path);
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(required));
        }

        let settings = builder.add_source(env_source()).build()?;
        let config: AppConfig = settings.try_deserialize()?;
        self.validate(config)
    }

    /// Parse configuration from string content
    pub fn parse_config(&self, content: &str) -> Result<AppConfig, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;
        let config: AppConfig = settings.try_deserialize()?;
        info!("Configuration parsed successfully");
        self.validate(config)
    }

    fn validate(&self, config: AppConfig) -> Result<AppConfig, ConfigError> {
        if config.terminal.read_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "terminal.read_chunk_size must be greater than zero".to_string(),
            ));
        }
        let size = config.terminal.size;
        if !COLS_RANGE.contains(&i64::from(size.columns))
            || !ROWS_RANGE.contains(&i64::from(size.rows))
        {
            return Err(ConfigError::Invalid(format!(
                "terminal.size {}x{} is outside {:?} columns and {:?} rows",
                size.columns, size.rows, COLS_RANGE, ROWS_RANGE
            )));
        }
        if config.store.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "store.sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        if config.ssh.window_size == 0 {
            return Err(ConfigError::Invalid(
                "ssh.window_size must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

/// Default configuration path
pub fn default_config_path() -> Option<PathBuf> {
    // 使用当前工作目录作为默认配置文件目录
    std::env::current_dir().ok().map(|dir| dir.join("config.toml"))
}
