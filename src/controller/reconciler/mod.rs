//! # Reconciler
//!
//! Reconciliation logic for `SchemaRegistry` and `Schema` resources.
//!
//! - [`connectivity`]: probes each registry and publishes reachability
//! - [`schema`]: registers each schema and removes its subject on deletion
//! - [`lifecycle`]: finalizer stages for `Schema`
//! - [`client`]: builds a registry client from a `SchemaRegistry`
//! - [`validation`]: field-level spec validation shared by both reconcilers
//!
//! ## Reconciliation Flow
//!
//! 1. Validate the spec
//! 2. Resolve credentials from Secrets in the registry's namespace
//! 3. Call the registry
//! 4. Re-read the resource and write status against its `resourceVersion`
//! 5. Requeue: health-check interval for registries, retry interval for
//!    failed registrations, none after a successful registration

pub mod client;
pub mod connectivity;
pub mod lifecycle;
pub mod schema;
pub mod status;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{build_registry_client, client_for_schema, ClientBuildError};
pub use connectivity::{reconcile_registry, ConnectivityOutcome};
pub use lifecycle::LifecycleStage;
pub use schema::{reconcile_schema, CleanupOutcome, SchemaOutcome};
pub use types::{BackoffState, Reconciler, ReconcilerError};
pub use validation::{
    validate_registry_spec, validate_schema_spec, validate_schema_update, FieldError,
    FieldErrorKind, FieldErrors,
};
