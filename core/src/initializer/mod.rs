// schema_init/src/initializer/mod.rs

//! The schema initializer: a pipeline that prepares `carbon_clear_orders`.
//!
//! Steps, in order:
//!
//! | step | does |
//! |---|---|
//! | `inspect_database` | lists existing collections, their validators and indexes; fails early under `RerunPolicy::Strict` or on a validator mismatch |
//! | `create_orders_collection` | creates `orders` with its validator (skipped if present) |
//! | `create_carts_collection` | creates `carts` with its validator (skipped if present) |
//! | `create_orders_indexes` | one ascending index per field in `ORDER_INDEX_FIELDS` |
//! | `create_carts_indexes` | one ascending index per field in `CART_INDEX_FIELDS` |
//! | `verify_indexes` | optional; re-reads index metadata and fails on a gap |
//! | `report_completion` | logs and records the completion message |
//!
//! Any store failure aborts the run where it happened. Nothing is rolled back.

mod steps;

use crate::catalog::{self, CARTS, ORDERS};
use crate::core::{ContextData, RunOutcome, SkipCondition};
use crate::error::{SetupError, SetupResult};
use crate::pipeline::Pipeline;
use crate::schema::{CollectionSchema, IndexSpec};
use crate::store::SchemaStore;
use mongodb::bson::Document;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const STEP_INSPECT: &str = "inspect_database";
pub const STEP_CREATE_ORDERS: &str = "create_orders_collection";
pub const STEP_CREATE_CARTS: &str = "create_carts_collection";
pub const STEP_INDEX_ORDERS: &str = "create_orders_indexes";
pub const STEP_INDEX_CARTS: &str = "create_carts_indexes";
pub const STEP_VERIFY: &str = "verify_indexes";
pub const STEP_REPORT: &str = "report_completion";

/// What to do when the database has already been initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RerunPolicy {
  /// Create only what is missing. Existing collections are not modified and
  /// must already carry the expected validator.
  #[default]
  Idempotent,
  /// Refuse to touch a database where either collection exists.
  Strict,
}

impl FromStr for RerunPolicy {
  type Err = SetupError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "idempotent" => Ok(RerunPolicy::Idempotent),
      "strict" => Ok(RerunPolicy::Strict),
      other => Err(SetupError::UnknownPolicy(other.to_string())),
    }
  }
}

impl fmt::Display for RerunPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RerunPolicy::Idempotent => f.write_str("idempotent"),
      RerunPolicy::Strict => f.write_str("strict"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupOptions {
  pub policy: RerunPolicy,
  /// Registers the `verify_indexes` step.
  pub verify_indexes: bool,
}

impl Default for SetupOptions {
  fn default() -> Self {
    Self {
      policy: RerunPolicy::Idempotent,
      verify_indexes: true,
    }
  }
}

/// What a run did. Index entries read `<collection>.<index name>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
  pub database: String,
  pub collections_created: Vec<String>,
  pub collections_skipped: Vec<String>,
  pub indexes_created: Vec<String>,
  pub indexes_skipped: Vec<String>,
  pub completion: Option<String>,
}

impl SetupReport {
  pub fn is_complete(&self) -> bool {
    self.completion.is_some()
  }
}

/// Context shared by the initializer's steps.
pub struct SetupCtxData {
  pub store: Arc<dyn SchemaStore>,
  pub options: SetupOptions,
  pub schemas: Vec<CollectionSchema>,
  pub indexes: Vec<IndexSpec>,
  /// Filled by `inspect_database`.
  pub existing_collections: Vec<String>,
  /// Index key sets of collections that existed before the run.
  pub existing_index_keys: HashMap<String, Vec<Document>>,
  pub report: SetupReport,
}

impl SetupCtxData {
  pub fn new(store: Arc<dyn SchemaStore>, options: SetupOptions) -> Self {
    let report = SetupReport {
      database: store.database_name().to_string(),
      ..SetupReport::default()
    };
    Self {
      store,
      options,
      schemas: catalog::collections(),
      indexes: [ORDERS, CARTS].into_iter().flat_map(catalog::indexes_for).collect(),
      existing_collections: Vec::new(),
      existing_index_keys: HashMap::new(),
      report,
    }
  }

  pub fn schema(&self, collection: &str) -> SetupResult<&CollectionSchema> {
    self
      .schemas
      .iter()
      .find(|s| s.name() == collection)
      .ok_or_else(|| SetupError::UnknownCollection {
        collection: collection.to_string(),
      })
  }

  pub fn indexes_of(&self, collection: &str) -> Vec<IndexSpec> {
    self
      .indexes
      .iter()
      .filter(|spec| spec.collection == collection)
      .cloned()
      .collect()
  }
}

fn collection_exists(collection: &'static str) -> SkipCondition<SetupCtxData> {
  Arc::new(move |ctx: ContextData<SetupCtxData>| {
    ctx.read().existing_collections.iter().any(|c| c == collection)
  })
}

/// Builds the step pipeline for `options`.
pub fn build_pipeline(options: &SetupOptions) -> Pipeline<SetupCtxData, SetupError> {
  let mut pipeline = Pipeline::<SetupCtxData, SetupError>::new(&[
    (STEP_INSPECT, false, None),
    (STEP_CREATE_ORDERS, false, Some(collection_exists(ORDERS))),
    (STEP_CREATE_CARTS, false, Some(collection_exists(CARTS))),
    (STEP_INDEX_ORDERS, false, None),
    (STEP_INDEX_CARTS, false, None),
    (STEP_VERIFY, true, None),
    (STEP_REPORT, false, None),
  ]);

  pipeline.on_root(STEP_INSPECT, steps::inspect_database);
  pipeline.on_root(STEP_CREATE_ORDERS, |ctx| steps::create_collection(ctx, ORDERS));
  pipeline.on_root(STEP_CREATE_CARTS, |ctx| steps::create_collection(ctx, CARTS));
  pipeline.on_root(STEP_INDEX_ORDERS, |ctx| steps::create_indexes(ctx, ORDERS));
  pipeline.on_root(STEP_INDEX_CARTS, |ctx| steps::create_indexes(ctx, CARTS));
  if options.verify_indexes {
    pipeline.on_root(STEP_VERIFY, steps::verify_indexes);
  }
  pipeline.on_root(STEP_REPORT, steps::report_completion);

  pipeline
}

/// Runs the setup pipeline against a store.
pub struct SchemaInitializer {
  options: SetupOptions,
  pipeline: Pipeline<SetupCtxData, SetupError>,
}

impl SchemaInitializer {
  pub fn new(options: SetupOptions) -> Self {
    Self {
      pipeline: build_pipeline(&options),
      options,
    }
  }

  pub fn pipeline(&self) -> &Pipeline<SetupCtxData, SetupError> {
    &self.pipeline
  }

  #[instrument(
        name = "SchemaInitializer::run",
        skip_all,
        fields(database = %store.database_name(), policy = %self.options.policy),
        err(Display)
    )]
  pub async fn run(&self, store: Arc<dyn SchemaStore>) -> SetupResult<SetupReport> {
    let ctx_data = ContextData::new(SetupCtxData::new(store, self.options));

    match self.pipeline.run(ctx_data.clone()).await? {
      RunOutcome::Completed => info!("Schema initialization pipeline completed."),
      RunOutcome::Stopped => warn!("Schema initialization pipeline stopped before completion."),
    }

    let report = ctx_data.map_read(|data| &data.report).clone();
    Ok(report)
  }
}

impl Default for SchemaInitializer {
  fn default() -> Self {
    Self::new(SetupOptions::default())
  }
}

/// Initializes the store's database with default options and `policy`.
pub async fn initialize(store: Arc<dyn SchemaStore>, policy: RerunPolicy) -> SetupResult<SetupReport> {
  SchemaInitializer::new(SetupOptions {
    policy,
    ..SetupOptions::default()
  })
  .run(store)
  .await
}
