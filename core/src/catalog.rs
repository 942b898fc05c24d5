// schema_init/src/catalog.rs

//! The order service's collections, their validation rules and indexes.

use crate::schema::{CollectionSchema, FieldRule, IndexSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Database the order service stores orders and carts in.
pub const DATABASE_NAME: &str = "carbon_clear_orders";

pub const ORDERS: &str = "orders";
pub const CARTS: &str = "carts";

pub const COMPLETION_MESSAGE: &str = "MongoDB initialization completed for order service";

/// Fields of `orders` that get a standalone ascending index each.
pub const ORDER_INDEX_FIELDS: &[&str] = &["user_id", "project_id", "status", "created_at"];
/// Fields of `carts` that get a standalone ascending index each.
pub const CART_INDEX_FIELDS: &[&str] = &["user_id", "created_at"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Completed,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Completed => "completed",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

fn user_id() -> FieldRule {
  FieldRule::string("user_id")
    .required()
    .describe("User ID is required and must be a string")
}

fn created_at() -> FieldRule {
  FieldRule::date("created_at").required().describe("Created at must be a date")
}

// Optional everywhere; nothing checks it is set on update.
fn updated_at() -> FieldRule {
  FieldRule::date("updated_at").describe("Updated at must be a date")
}

pub fn orders_schema() -> CollectionSchema {
  CollectionSchema::new(
    ORDERS,
    vec![
      user_id(),
      FieldRule::string("project_id")
        .required()
        .describe("Project ID is required and must be a string"),
      FieldRule::number("quantity")
        .required()
        .minimum(1)
        .describe("Quantity must be a positive number"),
      FieldRule::string("status")
        .required()
        .one_of(OrderStatus::ALL.iter().map(|s| s.as_str()))
        .describe("Status must be one of the enum values"),
      created_at(),
      updated_at(),
    ],
  )
}

pub fn carts_schema() -> CollectionSchema {
  CollectionSchema::new(
    CARTS,
    vec![
      user_id(),
      FieldRule::array("items").required().describe("Items must be an array"),
      created_at(),
      updated_at(),
    ],
  )
}

/// Both collections, in creation order.
pub fn collections() -> Vec<CollectionSchema> {
  vec![orders_schema(), carts_schema()]
}

pub fn indexes_for(collection: &str) -> Vec<IndexSpec> {
  let fields = match collection {
    ORDERS => ORDER_INDEX_FIELDS,
    CARTS => CART_INDEX_FIELDS,
    _ => &[],
  };
  fields.iter().map(|field| IndexSpec::ascending(collection, *field)).collect()
}
