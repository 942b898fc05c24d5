// schema_init/src/schema/mod.rs

//! Declarative collection rules and index definitions.
//!
//! A `CollectionSchema` is a list of `FieldRule`s. The same rules produce the
//! `$jsonSchema` validator handed to MongoDB and drive the in-process
//! evaluator used by `MemoryStore`, so adding a field means adding one rule.

pub mod index;
pub mod rules;

pub use index::{Direction, IndexSpec};
pub use rules::{BsonKind, CollectionSchema, FieldRule, Violation};
