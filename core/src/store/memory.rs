// schema_init/src/store/memory.rs

use crate::error::{SetupError, SetupResult};
use crate::schema::{CollectionSchema, IndexSpec};
use crate::store::SchemaStore;
use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Every collection gets this index on creation, as on a real server.
const ID_INDEX: &str = "_id_";

#[derive(Debug)]
struct MemoryCollection {
  /// `None` for a collection created without a validator.
  schema: Option<CollectionSchema>,
  /// (name, key pattern), `_id_` first.
  indexes: Vec<(String, Document)>,
  documents: Vec<Document>,
}

impl MemoryCollection {
  fn new(schema: Option<CollectionSchema>) -> Self {
    Self {
      schema,
      indexes: vec![(ID_INDEX.to_string(), doc! { "_id": 1 })],
      documents: Vec::new(),
    }
  }
}

/// In-process `SchemaStore`.
///
/// Collections keep the schema they were created with and `insert` enforces
/// it through `CollectionSchema::evaluate`, so documents are admitted or
/// rejected by the same rules the server-side validator is built from.
#[derive(Debug)]
pub struct MemoryStore {
  database: String,
  collections: Mutex<BTreeMap<String, MemoryCollection>>,
}

impl MemoryStore {
  pub fn new(database: impl Into<String>) -> Self {
    Self {
      database: database.into(),
      collections: Mutex::new(BTreeMap::new()),
    }
  }

  /// Inserts a document after checking it against the collection's rules.
  pub fn insert(&self, collection: &str, document: Document) -> SetupResult<()> {
    let mut collections = self.collections.lock();
    let target = collections
      .get_mut(collection)
      .ok_or_else(|| SetupError::UnknownCollection {
        collection: collection.to_string(),
      })?;

    if let Err(violation) = target.schema.as_ref().map_or(Ok(()), |schema| schema.evaluate(&document)) {
      warn!(%collection, %violation, "Document rejected.");
      return Err(SetupError::DocumentRejected {
        collection: collection.to_string(),
        violation,
      });
    }
    target.documents.push(document);
    Ok(())
  }

  /// Creates a collection with no validator, the way the server does on the
  /// first insert into a missing collection.
  pub fn create_implicit(&self, collection: &str) -> SetupResult<()> {
    let mut collections = self.collections.lock();
    if collections.contains_key(collection) {
      return Err(SetupError::CollectionExists {
        collection: collection.to_string(),
      });
    }
    collections.insert(collection.to_string(), MemoryCollection::new(None));
    Ok(())
  }

  pub fn document_count(&self, collection: &str) -> usize {
    self
      .collections
      .lock()
      .get(collection)
      .map_or(0, |c| c.documents.len())
  }

  /// The schema a collection was created with.
  pub fn schema_of(&self, collection: &str) -> Option<CollectionSchema> {
    self.collections.lock().get(collection).and_then(|c| c.schema.clone())
  }

  pub fn index_names(&self, collection: &str) -> Vec<String> {
    self
      .collections
      .lock()
      .get(collection)
      .map(|c| c.indexes.iter().map(|(name, _)| name.clone()).collect())
      .unwrap_or_default()
  }
}

#[async_trait]
impl SchemaStore for MemoryStore {
  fn database_name(&self) -> &str {
    &self.database
  }

  async fn collection_names(&self) -> SetupResult<Vec<String>> {
    Ok(self.collections.lock().keys().cloned().collect())
  }

  async fn create_collection(&self, schema: &CollectionSchema) -> SetupResult<()> {
    let mut collections = self.collections.lock();
    if collections.contains_key(schema.name()) {
      return Err(SetupError::CollectionExists {
        collection: schema.name().to_string(),
      });
    }
    collections.insert(schema.name().to_string(), MemoryCollection::new(Some(schema.clone())));
    debug!(database = %self.database, collection = %schema.name(), "Collection created in memory.");
    Ok(())
  }

  async fn collection_validator(&self, collection: &str) -> SetupResult<Option<Document>> {
    let collections = self.collections.lock();
    let target = collections
      .get(collection)
      .ok_or_else(|| SetupError::UnknownCollection {
        collection: collection.to_string(),
      })?;
    Ok(target.schema.as_ref().map(CollectionSchema::validator))
  }

  async fn index_keys(&self, collection: &str) -> SetupResult<Vec<Document>> {
    let collections = self.collections.lock();
    let target = collections
      .get(collection)
      .ok_or_else(|| SetupError::UnknownCollection {
        collection: collection.to_string(),
      })?;
    Ok(target.indexes.iter().map(|(_, keys)| keys.clone()).collect())
  }

  // Creating an index whose name already exists is a no-op, as on the server.
  async fn create_index(&self, spec: &IndexSpec) -> SetupResult<String> {
    let mut collections = self.collections.lock();
    let target = collections
      .get_mut(&spec.collection)
      .ok_or_else(|| SetupError::UnknownCollection {
        collection: spec.collection.clone(),
      })?;

    let name = spec.name();
    if !target.indexes.iter().any(|(existing, _)| *existing == name) {
      target.indexes.push((name.clone(), spec.keys()));
    }
    Ok(name)
  }
}
