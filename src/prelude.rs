//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ## Usage
//!
//! ```rust
//! use schema_registry_controller::prelude::*;
//! ```
//!
//! This brings into scope:
//! - All CRD types (`SchemaRegistry`, `Schema`, status types)
//! - The registry client and its `SchemaRegistryApi` trait
//! - Reconciler types (`Reconciler`, `ReconcilerError`, etc.)
//! - Config types (`ControllerConfig`)
//! - Common error types

// CRD types - most commonly used
pub use crate::crd::*;

// Registry client - the seam reconcilers call through
pub use crate::registry::{RegisterResult, SchemaRegistryApi, SchemaRegistryClient};

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    reconcile_registry, reconcile_schema, BackoffState, Reconciler, ReconcilerError,
};

// Credential resolution
pub use crate::controller::credentials::{resolve_credentials, CredentialBundle, SecretLookup};

// Config types - for configuration management
pub use crate::config::{ControllerConfig, LogFormat};

// Common error types
pub use crate::controller::credentials::CredentialError;
pub use crate::controller::reconciler::ClientBuildError;
pub use crate::registry::RegistryError;
