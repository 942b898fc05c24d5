// schema_init/src/error.rs
use anyhow::Error as AnyhowError;
use mongodb::error::Error as MongoError;
use thiserror::Error;

use crate::schema::Violation;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Handler missing for non-optional step: {step_name}")]
    HandlerMissing { step_name: String },

    #[error("Collection '{collection}' already exists")]
    CollectionExists { collection: String },

    #[error("Database '{database}' is already initialized (existing collections: {})", .existing.join(", "))]
    AlreadyInitialized { database: String, existing: Vec<String> },

    #[error("Collection '{collection}' exists without the expected validator; update it with collMod or drop it before re-running")]
    ValidatorMismatch { collection: String },

    #[error("Collection '{collection}' has no index on '{field}'")]
    MissingIndex { collection: String, field: String },

    #[error("Document rejected by the '{collection}' validator: {violation}")]
    DocumentRejected {
        collection: String,
        violation: Violation,
    },

    #[error("Unknown collection: {collection}")]
    UnknownCollection { collection: String },

    #[error("Database operation '{operation}' failed. Source: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: MongoError,
    },

    #[error("Schema store failure. Source: {source}")]
    Store {
        #[source]
        source: AnyhowError,
    },

    #[error("Unknown re-run policy '{0}' (expected 'idempotent' or 'strict')")]
    UnknownPolicy(String),
}

impl SetupError {
  /// Wraps a driver error with the operation that produced it.
  pub fn database(operation: &'static str, source: MongoError) -> Self {
    SetupError::Database { operation, source }
  }
}

// Stores that are not backed by the driver report through anyhow.
impl From<AnyhowError> for SetupError {
  fn from(err: AnyhowError) -> Self {
    match err.downcast::<SetupError>() {
      Ok(setup_err) => setup_err,
      Err(source) => SetupError::Store { source },
    }
  }
}

pub type SetupResult<T, E = SetupError> = std::result::Result<T, E>;
