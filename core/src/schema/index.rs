// schema_init/src/schema/index.rs

use mongodb::bson::{Bson, Document};
use mongodb::IndexModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Ascending,
  Descending,
}

impl Direction {
  pub fn value(self) -> i32 {
    match self {
      Direction::Ascending => 1,
      Direction::Descending => -1,
    }
  }
}

/// A standalone single-field index on one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
  pub collection: String,
  pub field: String,
  pub direction: Direction,
}

impl IndexSpec {
  pub fn ascending(collection: impl Into<String>, field: impl Into<String>) -> Self {
    Self {
      collection: collection.into(),
      field: field.into(),
      direction: Direction::Ascending,
    }
  }

  /// Key document, e.g. `{ "user_id": 1 }`.
  pub fn keys(&self) -> Document {
    let mut keys = Document::new();
    keys.insert(self.field.clone(), self.direction.value());
    keys
  }

  /// The name MongoDB generates for this key pattern (`user_id_1`).
  pub fn name(&self) -> String {
    format!("{}_{}", self.field, self.direction.value())
  }

  /// True when an existing index's key pattern is exactly this field in this
  /// direction. The server may report the direction as int, long or double.
  pub fn is_covered_by(&self, keys: &Document) -> bool {
    let direction = match keys.get(&self.field) {
      Some(Bson::Int32(v)) => f64::from(*v),
      Some(Bson::Int64(v)) => *v as f64,
      Some(Bson::Double(v)) => *v,
      _ => return false,
    };
    keys.len() == 1 && direction == f64::from(self.direction.value())
  }

  pub fn to_model(&self) -> IndexModel {
    IndexModel::builder().keys(self.keys()).build()
  }
}
