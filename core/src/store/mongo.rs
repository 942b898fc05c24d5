// schema_init/src/store/mongo.rs

use crate::error::{SetupError, SetupResult};
use crate::schema::{CollectionSchema, IndexSpec};
use crate::store::SchemaStore;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::results::CollectionSpecification;
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::{Database, IndexModel};
use tracing::{debug, instrument};

/// Server error code for creating a collection that already exists.
const NAMESPACE_EXISTS: i32 = 48;

/// `SchemaStore` over a driver `Database` handle.
#[derive(Debug, Clone)]
pub struct MongoStore {
  db: Database,
}

impl MongoStore {
  pub fn new(db: Database) -> Self {
    Self { db }
  }
}

fn is_namespace_exists(err: &MongoError) -> bool {
  matches!(err.kind.as_ref(), ErrorKind::Command(command_err) if command_err.code == NAMESPACE_EXISTS)
}

#[async_trait]
impl SchemaStore for MongoStore {
  fn database_name(&self) -> &str {
    self.db.name()
  }

  #[instrument(skip(self), fields(database = %self.db.name()), err)]
  async fn collection_names(&self) -> SetupResult<Vec<String>> {
    self
      .db
      .list_collection_names()
      .await
      .map_err(|e| SetupError::database("list_collection_names", e))
  }

  #[instrument(skip_all, fields(database = %self.db.name(), collection = %schema.name()), err)]
  async fn create_collection(&self, schema: &CollectionSchema) -> SetupResult<()> {
    let validator = schema.validator();
    debug!(%validator, "Creating collection with validator.");
    match self.db.create_collection(schema.name()).validator(validator).await {
      Ok(()) => Ok(()),
      Err(e) if is_namespace_exists(&e) => Err(SetupError::CollectionExists {
        collection: schema.name().to_string(),
      }),
      Err(e) => Err(SetupError::database("create_collection", e)),
    }
  }

  #[instrument(skip(self), fields(database = %self.db.name()), err)]
  async fn collection_validator(&self, collection: &str) -> SetupResult<Option<Document>> {
    let specs: Vec<CollectionSpecification> = self
      .db
      .list_collections()
      .filter(doc! { "name": collection })
      .await
      .map_err(|e| SetupError::database("list_collections", e))?
      .try_collect()
      .await
      .map_err(|e| SetupError::database("list_collections", e))?;

    match specs.into_iter().next() {
      Some(spec) => Ok(spec.options.validator),
      None => Err(SetupError::UnknownCollection {
        collection: collection.to_string(),
      }),
    }
  }

  #[instrument(skip(self), fields(database = %self.db.name()), err)]
  async fn index_keys(&self, collection: &str) -> SetupResult<Vec<Document>> {
    let models: Vec<IndexModel> = self
      .db
      .collection::<Document>(collection)
      .list_indexes()
      .await
      .map_err(|e| SetupError::database("list_indexes", e))?
      .try_collect()
      .await
      .map_err(|e| SetupError::database("list_indexes", e))?;

    Ok(models.into_iter().map(|model| model.keys).collect())
  }

  #[instrument(skip_all, fields(database = %self.db.name(), collection = %spec.collection, field = %spec.field), err)]
  async fn create_index(&self, spec: &IndexSpec) -> SetupResult<String> {
    self
      .db
      .collection::<Document>(&spec.collection)
      .create_index(spec.to_model())
      .await
      .map(|created| created.index_name)
      .map_err(|e| SetupError::database("create_index", e))
  }
}
