use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::GridError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub gridquery: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const GRIDQUERY_LEVEL: &str = "info";

    fn default() -> Self {
        LoggingConfig {
            gridquery: Self::GRIDQUERY_LEVEL.to_string(),
        }
    }

    fn ensure_valid(&mut self) {
        let str_original = self.gridquery.clone();
        self.gridquery = self.gridquery.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.gridquery.as_str()) {
            eprintln!(
                "Config error: gridquery log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::GRIDQUERY_LEVEL
            );
            self.gridquery = Self::GRIDQUERY_LEVEL.to_owned();
        }
    }

    /// flexi_logger level string: our crate at the configured level,
    /// everything else at warn.
    pub fn log_spec(&self) -> String {
        format!("warn, gridquery={}", self.gridquery)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// Upper bound on rows per page; 0 means unlimited.
    pub max_page_length: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub query: QueryConfig,
}

impl Config {
    const ENV_PREFIX: &str = "GRIDQUERY_";

    pub fn project_dirs() -> Result<ProjectDirs, GridError> {
        ProjectDirs::from("", "", "gridquery")
            .ok_or_else(|| GridError::Error("Could not determine a home directory".into()))
    }

    pub fn default_for(data_dir: &Path) -> Self {
        Config {
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                path: data_dir.join("customers.db"),
            },
            query: QueryConfig { max_page_length: 0 },
        }
    }

    /// Loads the configuration from `config.toml` in the app's data directory,
    /// then applies `GRIDQUERY_` environment overrides (`GRIDQUERY_SERVER__PORT=9000`).
    /// A default config file is written if none exists.
    pub fn load_config(project_dirs: &ProjectDirs) -> Result<Self, GridError> {
        let data_dir = project_dirs.data_local_dir();
        let config_path = data_dir.join("config.toml");
        let default_config = Self::default_for(data_dir);

        if !config_path.exists() {
            Self::write_default(&config_path, &default_config);
        }

        Self::from_figment(Self::figment(&default_config, &config_path))
    }

    fn figment(default_config: &Config, config_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(default_config))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
    }

    fn from_figment(figment: Figment) -> Result<Self, GridError> {
        let mut config: Config = figment.extract().map_err(Box::new)?;
        config.ensure_valid();
        Ok(config)
    }

    fn write_default(config_path: &Path, default_config: &Config) {
        if let Some(parent) = config_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!(
                    "Failed to create configuration directory {}: {}",
                    parent.display(),
                    e
                );
            }
        }
        match toml::to_string_pretty(default_config) {
            Ok(toml_string) => {
                if let Err(e) = fs::write(config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            }
            Err(e) => eprintln!("Failed to serialize default config: {e}"),
        }
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_when_file_missing() {
        Jail::expect_with(|jail| {
            let dir = jail.directory().to_path_buf();
            let defaults = Config::default_for(&dir);
            let config =
                Config::from_figment(Config::figment(&defaults, &dir.join("config.toml")))
                    .unwrap();
            assert_eq!(config, defaults);
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.query.max_page_length, 0);
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [server]
                host = "0.0.0.0"
                port = 9000

                [query]
                max_page_length = 250
                "#,
            )?;
            jail.set_env("GRIDQUERY_SERVER__PORT", "9100");

            let dir = jail.directory().to_path_buf();
            let defaults = Config::default_for(&dir);
            let config =
                Config::from_figment(Config::figment(&defaults, &dir.join("config.toml")))
                    .unwrap();
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.query.max_page_length, 250);
            assert_eq!(config.database.path, dir.join("customers.db"));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_log_level_falls_back() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[logging]\ngridquery = \" LOUD \"\n")?;
            let dir = jail.directory().to_path_buf();
            let defaults = Config::default_for(&dir);
            let config =
                Config::from_figment(Config::figment(&defaults, &dir.join("config.toml")))
                    .unwrap();
            assert_eq!(config.logging.gridquery, "info");
            Ok(())
        });
    }

    #[test]
    fn test_log_level_is_normalized() {
        let mut logging = LoggingConfig {
            gridquery: " DEBUG ".into(),
        };
        logging.ensure_valid();
        assert_eq!(logging.gridquery, "debug");
        assert_eq!(logging.log_spec(), "warn, gridquery=debug");
    }

    #[test]
    fn test_write_default_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let defaults = Config::default_for(dir.path());
        Config::write_default(&path, &defaults);

        let text = fs::read_to_string(&path).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, defaults);
    }
}
