use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub const MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

impl DatabaseConfig {
    pub fn from_cli_or_env_or_yaml(cli_arg: Option<String>, yaml_config: Option<String>) -> Self {
        let url = if let Some(arg) = cli_arg {
            arg
        } else if let Ok(env) = std::env::var("DATABASE_URL") {
            env
        } else if let Some(yaml) = yaml_config {
            yaml
        } else {
            MEMORY_URL.to_string()
        };

        Self { url, pool_size: 20 }
    }

    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_URL || self.url.contains(":memory:")
    }

    pub async fn create_pool(&self) -> Result<sqlx::SqlitePool, sqlx::Error> {
        let options = if self.url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(&self.url)?
        } else {
            SqliteConnectOptions::new().filename(&self.url)
        }
        .create_if_missing(true);

        // every connection to an in-memory database sees its own empty database
        let max_connections = if self.is_memory() { 1 } else { self.pool_size };
        SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
    }
}
