// bootstrap/src/db.rs

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::Client;
use tracing::{info, instrument};

const APP_NAME: &str = "carbon-clear-init";

/// Connects and pings the target database so that a bad URI or an
/// unreachable server fails before any schema step runs.
#[instrument(skip_all, fields(database = %config.database_name), err(Display))]
pub async fn connect(config: &AppConfig) -> Result<Client> {
  let mut options = ClientOptions::parse(&config.mongodb_uri)
    .await
    .map_err(|e| AppError::connection("Invalid MONGODB_URI", e))?;
  options.app_name = Some(APP_NAME.to_string());
  options.connect_timeout = Some(config.connect_timeout);
  options.server_selection_timeout = Some(config.connect_timeout);

  let client = Client::with_options(options).map_err(|e| AppError::connection("Failed to build client", e))?;

  client
    .database(&config.database_name)
    .run_command(doc! { "ping": 1 })
    .await
    .map_err(|e| AppError::connection("Failed to ping MongoDB", e))?;

  info!("Connected to MongoDB successfully.");
  Ok(client)
}
