//! Schema Registry Controller Library
//!
//! This library provides the core functionality for the Schema Registry Controller:
//! two reconcilers that keep `SchemaRegistry` connections and `Schema` subjects in
//! sync with a Confluent-compatible Schema Registry.
//!
//! ## Quick Start
//!
//! ```rust
//! use schema_registry_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod registry;
pub mod runtime;
