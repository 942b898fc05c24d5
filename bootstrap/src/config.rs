// bootstrap/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use schema_init::{RerunPolicy, SetupOptions, DATABASE_NAME};
use std::env;
use std::time::Duration;

const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub mongodb_uri: String,
  pub database_name: String,
  pub connect_timeout: Duration,
  pub policy: RerunPolicy,
  pub verify_indexes: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source. Unset variables fall back
  /// to defaults; set but unparsable ones are errors.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

    let mongodb_uri = get_or("MONGODB_URI", DEFAULT_MONGODB_URI);
    let database_name = get_or("MONGODB_DATABASE", DATABASE_NAME);
    if database_name.trim().is_empty() {
      return Err(AppError::Config("MONGODB_DATABASE must not be empty".to_string()));
    }

    let connect_timeout = get_or("MONGODB_CONNECT_TIMEOUT_SECS", &DEFAULT_CONNECT_TIMEOUT_SECS.to_string())
      .parse::<u64>()
      .map(Duration::from_secs)
      .map_err(|e| AppError::Config(format!("Invalid MONGODB_CONNECT_TIMEOUT_SECS: {}", e)))?;

    let policy = get_or("SCHEMA_INIT_MODE", "idempotent")
      .parse::<RerunPolicy>()
      .map_err(|e| AppError::Config(format!("Invalid SCHEMA_INIT_MODE: {}", e)))?;

    let verify_indexes = get_or("SCHEMA_INIT_VERIFY", "true")
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SCHEMA_INIT_VERIFY value: {}", e)))?;

    tracing::info!(database = %database_name, %policy, "Configuration loaded.");
    // The URI may carry credentials; it is not logged.

    Ok(Self {
      mongodb_uri,
      database_name,
      connect_timeout,
      policy,
      verify_indexes,
    })
  }

  pub fn setup_options(&self) -> SetupOptions {
    SetupOptions {
      policy: self.policy,
      verify_indexes: self.verify_indexes,
    }
  }
}
