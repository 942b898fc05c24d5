// bootstrap/src/main.rs

//! Prepares the order service's MongoDB database: validated `orders` and
//! `carts` collections plus their indexes. Safe to run on every deploy under
//! the default `idempotent` mode.

mod config;
mod db;
mod errors;

use crate::config::AppConfig;
use crate::errors::Result as AppResult;

use schema_init::{MongoStore, SchemaInitializer, SetupReport};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
  // Logs go to stderr; stdout carries only the completion line.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE)
    .with_writer(std::io::stderr)
    .init();

  match run().await {
    Ok(report) => {
      if let Some(message) = &report.completion {
        println!("{}", message);
      }
      tracing::info!(
        created = ?report.collections_created,
        skipped = ?report.collections_skipped,
        indexes_created = report.indexes_created.len(),
        indexes_skipped = report.indexes_skipped.len(),
        "Schema initialization finished."
      );
      ExitCode::SUCCESS
    }
    Err(e) => {
      tracing::error!(error = %e, "Schema initialization failed.");
      ExitCode::FAILURE
    }
  }
}

async fn run() -> AppResult<SetupReport> {
  let app_config = AppConfig::from_env()?;
  let client = db::connect(&app_config).await?;

  let store = Arc::new(MongoStore::new(client.database(&app_config.database_name)));
  let result = SchemaInitializer::new(app_config.setup_options()).run(store).await;

  client.shutdown().await;
  Ok(result?)
}
