// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use async_trait::async_trait;
use mongodb::bson::{doc, DateTime, Document};
use schema_init::{
  CollectionSchema, ContextData, IndexSpec, MemoryStore, SchemaStore, SetupError, SetupResult, StepControl,
  DATABASE_NAME,
};
use std::sync::Arc;
use tracing::Level;

// --- Pipeline test context ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Setup framework error: {0}")]
  Setup(String), // Stored as its Debug text so it can be compared

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<SetupError> for TestError {
  fn from(err: SetupError) -> Self {
    TestError::Setup(format!("{:?}", err))
  }
}

pub fn create_simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> schema_init::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(StepControl::Stop);
      }
      Ok(StepControl::Continue)
    })
  })
}

pub fn create_failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> schema_init::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(error_message.to_string()))
    })
  })
}

// --- Tracing, initialized once per test binary ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Store fixtures ---
pub fn memory_store() -> Arc<MemoryStore> {
  Arc::new(MemoryStore::new(DATABASE_NAME))
}

pub fn valid_order() -> Document {
  doc! {
    "user_id": "u1",
    "project_id": "p1",
    "quantity": 5,
    "status": "pending",
    "created_at": DateTime::now(),
  }
}

pub fn valid_cart() -> Document {
  doc! {
    "user_id": "u1",
    "items": [],
    "created_at": DateTime::now(),
  }
}

/// Which store operation `FailingStore` breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
  ListCollections,
  CreateCollection(&'static str),
  CreateIndex(&'static str),
  /// Reports success for index creation on this collection without creating anything.
  SilentIndex(&'static str),
  /// Another run creates this collection between inspection and creation.
  CreatedConcurrently(&'static str),
}

/// Delegates to a `MemoryStore` except for one operation, which fails the
/// way an unreachable server or missing privilege would surface.
pub struct FailingStore {
  pub inner: Arc<MemoryStore>,
  pub fail_on: FailOn,
}

impl FailingStore {
  fn failure(&self) -> SetupError {
    SetupError::from(anyhow::anyhow!("simulated failure on {:?}", self.fail_on))
  }
}

#[async_trait]
impl SchemaStore for FailingStore {
  fn database_name(&self) -> &str {
    self.inner.database_name()
  }

  async fn collection_names(&self) -> SetupResult<Vec<String>> {
    if self.fail_on == FailOn::ListCollections {
      return Err(self.failure());
    }
    self.inner.collection_names().await
  }

  async fn create_collection(&self, schema: &CollectionSchema) -> SetupResult<()> {
    if matches!(self.fail_on, FailOn::CreateCollection(name) if name == schema.name()) {
      return Err(self.failure());
    }
    if matches!(self.fail_on, FailOn::CreatedConcurrently(name) if name == schema.name()) {
      self.inner.create_collection(schema).await?;
    }
    self.inner.create_collection(schema).await
  }

  async fn collection_validator(&self, collection: &str) -> SetupResult<Option<Document>> {
    self.inner.collection_validator(collection).await
  }

  async fn index_keys(&self, collection: &str) -> SetupResult<Vec<Document>> {
    self.inner.index_keys(collection).await
  }

  async fn create_index(&self, spec: &IndexSpec) -> SetupResult<String> {
    if matches!(self.fail_on, FailOn::CreateIndex(name) if name == spec.collection) {
      return Err(self.failure());
    }
    if matches!(self.fail_on, FailOn::SilentIndex(name) if name == spec.collection) {
      return Ok(spec.name());
    }
    self.inner.create_index(spec).await
  }
}
