// schema_init/src/lib.rs

//! schema_init: prepares the `carbon_clear_orders` MongoDB database for the
//! order service.
//!
//! Running the initializer:
//!  - creates the `orders` and `carts` collections with `$jsonSchema` validators,
//!  - creates standalone ascending single-field indexes on both,
//!  - verifies the resulting index metadata,
//!  - reports a completion message.
//!
//! The work is expressed as a step pipeline (named steps with before/on/after
//! handlers, skip conditions and optional steps) running over a shared
//! context. Re-runs are governed by `RerunPolicy`: create only what is
//! missing, or refuse to touch an initialized database.

pub mod catalog;
pub mod core;
pub mod error;
pub mod initializer;
pub mod pipeline;
pub mod schema;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{RunOutcome, StepControl};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{SetupError, SetupResult};

pub use crate::catalog::{OrderStatus, COMPLETION_MESSAGE, DATABASE_NAME};
pub use crate::initializer::{initialize, RerunPolicy, SchemaInitializer, SetupOptions, SetupReport};
pub use crate::schema::{BsonKind, CollectionSchema, FieldRule, IndexSpec, Violation};
pub use crate::store::{MemoryStore, MongoStore, SchemaStore};

/*
    Typical use:
    1. Obtain a `mongodb::Database` for the target database name.
    2. Wrap it: `Arc::new(MongoStore::new(db))`.
    3. `initialize(store, RerunPolicy::Idempotent).await?` and inspect the
       returned `SetupReport`.
*/
