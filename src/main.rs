//! # Schema Registry Controller
//!
//! A Kubernetes controller that manages Confluent-compatible Schema Registry
//! connections and schema subjects declaratively.
//!
//! ## Overview
//!
//! This controller provides declarative schema management by:
//!
//! 1. **Probing registries** - `SchemaRegistry` resources are health-checked on a
//!    timer and report `Ready` with a connection status
//! 2. **Registering schemas** - `Schema` resources are registered under their subject,
//!    with an optional per-subject compatibility level
//! 3. **Cleaning up** - a finalizer deletes the subject when a `Schema` is removed
//! 4. **Routing changes** - Secret and `SchemaRegistry` changes re-trigger their dependents
//!
//! ## Features
//!
//! - **Auth strategies**: none, basic, bearer, and mTLS, resolved from Kubernetes Secrets
//! - **Multi-namespace**: watches all namespaces unless `WATCH_NAMESPACE` is set
//! - **Prometheus metrics**: Exposes metrics for monitoring and observability
//! - **Health probes**: HTTP endpoints for liveness and readiness checks

use anyhow::Result;
use schema_registry_controller::observability;
use schema_registry_controller::runtime::initialization::initialize;
use schema_registry_controller::runtime::watch_loop::run_watch_loop;

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    let result = run_watch_loop(init.reconciler, init.server_state).await;

    // Flush traces even when the watch loop failed
    observability::shutdown_otel(init.otel_tracer_provider);

    result
}
