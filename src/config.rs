use serde::Deserialize;

use crate::error::IndexerResult;
use crate::event_processor::ProcessorOptions;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub processing: ProcessorOptions,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    /// SQL run once at startup to create the record tables
    #[serde(default = "default_schema_path")]
    pub schema_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Newline-delimited receipts; `-` reads stdin
    pub path: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: "-".to_string(),
        }
    }
}

fn default_schema_path() -> String {
    "./init.sql".to_string()
}

impl Config {
    pub fn load(path: &str) -> IndexerResult<Self> {
        // Load .env file first
        dotenv::dotenv().ok();
        let config_builder = config::Config::builder()
            .add_source(config::File::with_name(path))
            // Environment overrides, e.g. INDEXER__DATABASE__PASSWORD
            .add_source(config::Environment::with_prefix("INDEXER").separator("__"))
            .build()?;

        let config: Config = config_builder.try_deserialize()?;
        Ok(config)
    }

    pub fn from_toml_str(toml: &str) -> IndexerResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn db_url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.database.user,
            self.database.password,
            self.database.host,
            self.database.port,
            self.database.name
        )
    }
}
