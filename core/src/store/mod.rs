// schema_init/src/store/mod.rs

//! The database operations the initializer needs, behind one trait.
//!
//! `MongoStore` talks to a live server. `MemoryStore` keeps everything in
//! process and enforces the same field rules on insert, which is what the
//! test suite runs against.

use crate::error::SetupResult;
use crate::schema::{CollectionSchema, IndexSpec};
use async_trait::async_trait;
use mongodb::bson::Document;

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Schema operations against one named database.
#[async_trait]
pub trait SchemaStore: Send + Sync {
  /// Name of the database this store is bound to.
  fn database_name(&self) -> &str;

  async fn collection_names(&self) -> SetupResult<Vec<String>>;

  /// Creates the collection with `schema`'s validator. Fails with
  /// `SetupError::CollectionExists` if it is already there.
  async fn create_collection(&self, schema: &CollectionSchema) -> SetupResult<()>;

  /// The validator an existing collection carries, `None` if it has none.
  async fn collection_validator(&self, collection: &str) -> SetupResult<Option<Document>>;

  /// Key pattern of every index on `collection`, `_id` included.
  async fn index_keys(&self, collection: &str) -> SetupResult<Vec<Document>>;

  /// Creates the index and returns its name.
  async fn create_index(&self, spec: &IndexSpec) -> SetupResult<String>;
}
