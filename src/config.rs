use rusqlite::Connection;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::loader::DEFAULT_BATCH_SIZE;

/// Runtime tuning, read once at startup. Everything has a default so the
/// binary runs without a config file at all.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub load: LoadConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Store file path. `:memory:` opens a throwaway in-memory store.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Rows per INSERT statement.
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the rolling JSON log files.
    pub dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            load: LoadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("feedpipe.db"),
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Read `config.toml` from the working directory, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(PipelineError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                )))
            }
        };

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Open the store this configuration points at. The caller owns the
    /// connection and passes it into the pipeline.
    pub fn store_connection(&self) -> Result<Connection> {
        let conn = if self.database.path == Path::new(":memory:") {
            Connection::open_in_memory()?
        } else {
            Connection::open(&self.database.path)?
        };
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.load.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.database.path, PathBuf::from("feedpipe.db"));
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_the_rest() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[load]\nbatch_size = 25\n").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.load.batch_size, 25);
        assert_eq!(config.logging.dir, PathBuf::from("logs"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[load\nbatch_size = ").unwrap();

        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_memory_path_opens_in_memory_store() {
        let config = Config {
            database: DatabaseConfig {
                path: PathBuf::from(":memory:"),
            },
            ..Default::default()
        };
        assert!(config.store_connection().is_ok());
    }
}
