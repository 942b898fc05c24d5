// schema_init/src/schema/rules.rs

use mongodb::bson::{Bson, Document};
use thiserror::Error;

/// BSON types a field rule can require, named by their `$jsonSchema` alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BsonKind {
  String,
  /// Any numeric type: int, long, double or decimal.
  Number,
  Date,
  Array,
  Object,
  Bool,
}

impl BsonKind {
  pub fn alias(self) -> &'static str {
    match self {
      BsonKind::String => "string",
      BsonKind::Number => "number",
      BsonKind::Date => "date",
      BsonKind::Array => "array",
      BsonKind::Object => "object",
      BsonKind::Bool => "bool",
    }
  }

  pub fn matches(self, value: &Bson) -> bool {
    match self {
      BsonKind::String => matches!(value, Bson::String(_)),
      BsonKind::Number => matches!(
        value,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_)
      ),
      BsonKind::Date => matches!(value, Bson::DateTime(_)),
      BsonKind::Array => matches!(value, Bson::Array(_)),
      BsonKind::Object => matches!(value, Bson::Document(_)),
      BsonKind::Bool => matches!(value, Bson::Boolean(_)),
    }
  }
}

/// Why a document failed its collection's rules.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
  #[error("required field '{field}' is missing")]
  MissingField { field: String },

  #[error("field '{field}' must be of type {expected}, found {found}")]
  TypeMismatch {
    field: String,
    expected: &'static str,
    found: &'static str,
  },

  #[error("field '{field}' must be at least {minimum}, found {found}")]
  BelowMinimum { field: String, minimum: i32, found: f64 },

  #[error("field '{field}' must be one of [{}], found '{found}'", .allowed.join(", "))]
  NotInEnum {
    field: String,
    allowed: Vec<String>,
    found: String,
  },
}

/// Constraint on a single top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
  pub name: String,
  pub kind: BsonKind,
  pub required: bool,
  pub minimum: Option<i32>,
  pub allowed: Vec<String>,
  pub description: String,
}

impl FieldRule {
  pub fn new(name: impl Into<String>, kind: BsonKind) -> Self {
    Self {
      name: name.into(),
      kind,
      required: false,
      minimum: None,
      allowed: Vec::new(),
      description: String::new(),
    }
  }

  pub fn string(name: impl Into<String>) -> Self {
    Self::new(name, BsonKind::String)
  }

  pub fn number(name: impl Into<String>) -> Self {
    Self::new(name, BsonKind::Number)
  }

  pub fn date(name: impl Into<String>) -> Self {
    Self::new(name, BsonKind::Date)
  }

  pub fn array(name: impl Into<String>) -> Self {
    Self::new(name, BsonKind::Array)
  }

  pub fn required(mut self) -> Self {
    self.required = true;
    self
  }

  pub fn minimum(mut self, minimum: i32) -> Self {
    self.minimum = Some(minimum);
    self
  }

  pub fn one_of<I, S>(mut self, values: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.allowed = values.into_iter().map(Into::into).collect();
    self
  }

  pub fn describe(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  /// The `properties.<name>` entry of the `$jsonSchema`.
  pub fn property(&self) -> Document {
    let mut property = Document::new();
    property.insert("bsonType", self.kind.alias());
    if let Some(minimum) = self.minimum {
      property.insert("minimum", minimum);
    }
    if !self.allowed.is_empty() {
      property.insert("enum", self.allowed.clone());
    }
    if !self.description.is_empty() {
      property.insert("description", self.description.clone());
    }
    property
  }

  /// Checks a present value. Presence itself is checked by `CollectionSchema`.
  ///
  /// Decimal values satisfy the `number` type but are not compared against
  /// `minimum` in-process.
  pub fn check(&self, value: &Bson) -> Result<(), Violation> {
    if !self.kind.matches(value) {
      return Err(Violation::TypeMismatch {
        field: self.name.clone(),
        expected: self.kind.alias(),
        found: type_name(value),
      });
    }
    if let (Some(minimum), Some(found)) = (self.minimum, numeric_value(value)) {
      // NaN sorts below every number on the server.
      if found.is_nan() || found < f64::from(minimum) {
        return Err(Violation::BelowMinimum {
          field: self.name.clone(),
          minimum,
          found,
        });
      }
    }
    if !self.allowed.is_empty() {
      let found = match value {
        Bson::String(s) => s.clone(),
        other => other.to_string(),
      };
      if !self.allowed.contains(&found) {
        return Err(Violation::NotInEnum {
          field: self.name.clone(),
          allowed: self.allowed.clone(),
          found,
        });
      }
    }
    Ok(())
  }
}

/// Named set of field rules for one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSchema {
  pub name: String,
  pub fields: Vec<FieldRule>,
}

impl CollectionSchema {
  pub fn new(name: impl Into<String>, fields: Vec<FieldRule>) -> Self {
    Self {
      name: name.into(),
      fields,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Required field names, in declaration order.
  pub fn required_fields(&self) -> Vec<&str> {
    self
      .fields
      .iter()
      .filter(|f| f.required)
      .map(|f| f.name.as_str())
      .collect()
  }

  /// The body of the `$jsonSchema` operator.
  pub fn json_schema(&self) -> Document {
    let mut properties = Document::new();
    for field in &self.fields {
      properties.insert(field.name.clone(), field.property());
    }

    let mut schema = Document::new();
    schema.insert("bsonType", BsonKind::Object.alias());
    schema.insert("required", self.required_fields());
    schema.insert("properties", properties);
    schema
  }

  /// The collection validator: `{ "$jsonSchema": { ... } }`.
  pub fn validator(&self) -> Document {
    let mut validator = Document::new();
    validator.insert("$jsonSchema", self.json_schema());
    validator
  }

  /// Applies the rules the way the server-side validator does: required
  /// fields must be present, declared fields that are present must satisfy
  /// their rule, undeclared fields are allowed.
  pub fn evaluate(&self, document: &Document) -> Result<(), Violation> {
    for field in &self.fields {
      match document.get(&field.name) {
        Some(value) => field.check(value)?,
        None if field.required => {
          return Err(Violation::MissingField {
            field: field.name.clone(),
          })
        }
        None => {}
      }
    }
    Ok(())
  }
}

fn numeric_value(value: &Bson) -> Option<f64> {
  match value {
    Bson::Int32(v) => Some(f64::from(*v)),
    Bson::Int64(v) => Some(*v as f64),
    Bson::Double(v) => Some(*v),
    _ => None,
  }
}

fn type_name(value: &Bson) -> &'static str {
  match value {
    Bson::String(_) => "string",
    Bson::Int32(_) => "int",
    Bson::Int64(_) => "long",
    Bson::Double(_) => "double",
    Bson::Decimal128(_) => "decimal",
    Bson::DateTime(_) => "date",
    Bson::Timestamp(_) => "timestamp",
    Bson::Array(_) => "array",
    Bson::Document(_) => "object",
    Bson::Boolean(_) => "bool",
    Bson::Null => "null",
    Bson::ObjectId(_) => "objectId",
    _ => "other",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use mongodb::bson::{doc, DateTime};

  fn sample() -> CollectionSchema {
    CollectionSchema::new(
      "things",
      vec![
        FieldRule::string("name").required().describe("Name is required"),
        FieldRule::number("count").required().minimum(1),
        FieldRule::string("state").one_of(["on", "off"]),
        FieldRule::date("seen_at"),
      ],
    )
  }

  #[test]
  fn validator_wraps_json_schema_with_required_in_declaration_order() {
    let validator = sample().validator();
    let schema = validator.get_document("$jsonSchema").unwrap();
    assert_eq!(schema.get_str("bsonType").unwrap(), "object");
    assert_eq!(schema.get_array("required").unwrap(), &vec![Bson::from("name"), Bson::from("count")]);

    let properties = schema.get_document("properties").unwrap();
    assert_eq!(
      properties.get_document("name").unwrap(),
      &doc! { "bsonType": "string", "description": "Name is required" }
    );
    assert_eq!(properties.get_document("count").unwrap(), &doc! { "bsonType": "number", "minimum": 1 });
    assert_eq!(
      properties.get_document("state").unwrap(),
      &doc! { "bsonType": "string", "enum": ["on", "off"] }
    );
  }

  #[test]
  fn evaluate_allows_undeclared_fields_and_missing_optionals() {
    let document = doc! { "name": "a", "count": 2_i64, "extra": true };
    assert_eq!(sample().evaluate(&document), Ok(()));
  }

  #[test]
  fn evaluate_reports_first_violation() {
    let schema = sample();
    assert_eq!(
      schema.evaluate(&doc! { "count": 1 }),
      Err(Violation::MissingField { field: "name".into() })
    );
    assert_eq!(
      schema.evaluate(&doc! { "name": "a", "count": 0.5 }),
      Err(Violation::BelowMinimum {
        field: "count".into(),
        minimum: 1,
        found: 0.5
      })
    );
    assert!(matches!(
      schema.evaluate(&doc! { "name": "a", "count": 1, "state": "dim" }),
      Err(Violation::NotInEnum { .. })
    ));
    assert_eq!(
      schema.evaluate(&doc! { "name": "a", "count": 1, "seen_at": "yesterday" }),
      Err(Violation::TypeMismatch {
        field: "seen_at".into(),
        expected: "date",
        found: "string"
      })
    );
    assert_eq!(
      schema.evaluate(&doc! { "name": "a", "count": 1, "seen_at": DateTime::now() }),
      Ok(())
    );
  }

  #[test]
  fn null_does_not_satisfy_an_optional_typed_field() {
    let document = doc! { "name": "a", "count": 1, "seen_at": Bson::Null };
    assert!(matches!(
      sample().evaluate(&document),
      Err(Violation::TypeMismatch { found: "null", .. })
    ));
  }
}
