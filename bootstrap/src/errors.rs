// bootstrap/src/errors.rs

use schema_init::SetupError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Connection Error: {message}. Source: {source}")]
  Connection {
    message: String,
    #[source]
    source: mongodb::error::Error,
  },

  #[error("Schema Setup Error: {source}")]
  Setup {
    #[from]
    source: SetupError,
  },
}

impl AppError {
  pub fn connection(message: impl Into<String>, source: mongodb::error::Error) -> Self {
    AppError::Connection {
      message: message.into(),
      source,
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
