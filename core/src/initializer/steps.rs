// schema_init/src/initializer/steps.rs

//! Handlers for the initializer's steps.
//!
//! Each handler copies what it needs out of the context under a read lock,
//! drops the guard, awaits the store, then records results under a write lock.

use super::{RerunPolicy, SetupCtxData};
use crate::catalog::COMPLETION_MESSAGE;
use crate::core::{ContextData, StepControl};
use crate::error::{SetupError, SetupResult};
use mongodb::bson::Document;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

#[instrument(name = "step::inspect_database", skip_all, err)]
pub(super) async fn inspect_database(ctx_data: ContextData<SetupCtxData>) -> SetupResult<StepControl> {
  let (store, policy, targets) = {
    let guard = ctx_data.read();
    let targets: Vec<(String, Document)> = guard.schemas.iter().map(|s| (s.name.clone(), s.validator())).collect();
    (guard.store.clone(), guard.options.policy, targets)
  }; // guard dropped

  let existing = store.collection_names().await?;
  let (present, expected_validators): (Vec<String>, Vec<Document>) =
    targets.into_iter().filter(|(name, _)| existing.contains(name)).unzip();
  debug!(?existing, ?present, "Inspected database.");

  if policy == RerunPolicy::Strict && !present.is_empty() {
    warn!(?present, "Refusing to re-initialize under the strict policy.");
    return Err(SetupError::AlreadyInitialized {
      database: store.database_name().to_string(),
      existing: present,
    });
  }

  // Existing collections are kept as they are, but only if they already
  // enforce the expected rules.
  let mut index_keys = HashMap::new();
  for (collection, expected) in present.iter().zip(&expected_validators) {
    if store.collection_validator(collection).await?.as_ref() != Some(expected) {
      warn!(%collection, "Existing collection does not carry the expected validator.");
      return Err(SetupError::ValidatorMismatch {
        collection: collection.clone(),
      });
    }
    index_keys.insert(collection.clone(), store.index_keys(collection).await?);
    info!(%collection, "Collection already exists, creation will be skipped.");
  }

  {
    let mut guard = ctx_data.write();
    guard.existing_collections = existing;
    guard.existing_index_keys = index_keys;
    guard.report.collections_skipped = present;
  }
  Ok(StepControl::Continue)
}

#[instrument(name = "step::create_collection", skip(ctx_data), err)]
pub(super) async fn create_collection(
  ctx_data: ContextData<SetupCtxData>,
  collection: &'static str,
) -> SetupResult<StepControl> {
  let (store, schema, policy) = {
    let guard = ctx_data.read();
    (guard.store.clone(), guard.schema(collection).cloned(), guard.options.policy)
  };
  let schema = schema?;

  match store.create_collection(&schema).await {
    Ok(()) => {
      info!(%collection, required = ?schema.required_fields(), "Collection created with validator.");
      ctx_data.write().report.collections_created.push(collection.to_string());
    }
    // Created by a concurrent run after inspection.
    Err(SetupError::CollectionExists { .. }) if policy == RerunPolicy::Idempotent => {
      warn!(%collection, "Collection appeared after inspection, creation skipped.");
      ctx_data.write().report.collections_skipped.push(collection.to_string());
    }
    Err(e) => return Err(e),
  }
  Ok(StepControl::Continue)
}

#[instrument(name = "step::create_indexes", skip(ctx_data), err)]
pub(super) async fn create_indexes(
  ctx_data: ContextData<SetupCtxData>,
  collection: &'static str,
) -> SetupResult<StepControl> {
  let (store, specs, existing_keys) = {
    let guard = ctx_data.read();
    (
      guard.store.clone(),
      guard.indexes_of(collection),
      guard.existing_index_keys.get(collection).cloned().unwrap_or_default(),
    )
  };

  let mut created = Vec::new();
  let mut skipped = Vec::new();
  for spec in &specs {
    if existing_keys.iter().any(|keys| spec.is_covered_by(keys)) {
      debug!(%collection, field = %spec.field, "Index already present.");
      skipped.push(format!("{}.{}", collection, spec.name()));
      continue;
    }
    let name = store.create_index(spec).await?;
    info!(%collection, index = %name, "Index created.");
    created.push(format!("{}.{}", collection, name));
  }

  {
    let mut guard = ctx_data.write();
    guard.report.indexes_created.extend(created);
    guard.report.indexes_skipped.extend(skipped);
  }
  Ok(StepControl::Continue)
}

#[instrument(name = "step::verify_indexes", skip_all, err)]
pub(super) async fn verify_indexes(ctx_data: ContextData<SetupCtxData>) -> SetupResult<StepControl> {
  let (store, specs) = {
    let guard = ctx_data.read();
    (guard.store.clone(), guard.indexes.clone())
  };

  let mut listed: HashMap<String, Vec<Document>> = HashMap::new();
  for spec in &specs {
    if !listed.contains_key(&spec.collection) {
      let keys = store.index_keys(&spec.collection).await?;
      listed.insert(spec.collection.clone(), keys);
    }
    let covered = listed
      .get(&spec.collection)
      .map_or(false, |all| all.iter().any(|keys| spec.is_covered_by(keys)));
    if !covered {
      return Err(SetupError::MissingIndex {
        collection: spec.collection.clone(),
        field: spec.field.clone(),
      });
    }
  }
  debug!(checked = specs.len(), "All expected indexes present.");
  Ok(StepControl::Continue)
}

#[instrument(name = "step::report_completion", skip_all)]
pub(super) async fn report_completion(ctx_data: ContextData<SetupCtxData>) -> SetupResult<StepControl> {
  let mut guard = ctx_data.write();
  info!(database = %guard.report.database, "{}", COMPLETION_MESSAGE);
  guard.report.completion = Some(COMPLETION_MESSAGE.to_string());
  Ok(StepControl::Continue)
}
