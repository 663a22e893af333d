//! # Custom Resource Definitions
//!
//! CRD types for the Schema Registry Controller.
//!
//! ## Module Structure
//!
//! - `registry.rs` - `SchemaRegistry` spec and the auth strategy sum type
//! - `schema.rs` - `Schema` spec, schema formats and references
//! - `status.rs` - Status types and condition helpers for both kinds

mod registry;
mod schema;
mod status;

// Re-export all public types
pub use registry::{RegistryAuth, SchemaRegistry, SchemaRegistrySpec};
pub use schema::{Schema, SchemaReference, SchemaRegistryRef, SchemaSpec, SchemaType};
pub use status::{
    find_condition, set_condition, Condition, ConditionStatus, ConnectionStatus,
    SchemaRegistryStatus, SchemaStatus,
};
