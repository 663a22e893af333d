//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! environment variables where applicable (see [`crate::config::ControllerConfig`]).

/// API group of both custom resources
pub const API_GROUP: &str = "registry.strimzi.io";

/// Finalizer guarding remote subject cleanup for `Schema` resources
pub const SCHEMA_FINALIZER: &str = "registry.strimzi.io/schema-finalizer";

/// Field manager used for status and finalizer patches
pub const FIELD_MANAGER: &str = "schema-registry-controller";

/// Condition type published on both resource kinds
pub const READY_CONDITION: &str = "Ready";

/// Media type required by the Schema Registry REST API for request bodies
pub const SCHEMA_REGISTRY_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Interval between connectivity probes of a `SchemaRegistry` (5 minutes)
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 300;

/// Retry delay after a failed schema registration (1 minute)
pub const DEFAULT_REGISTRATION_RETRY_SECS: u64 = 60;

/// Requeue delay after an optimistic-concurrency conflict on a write
pub const DEFAULT_CONFLICT_REQUEUE_SECS: u64 = 5;

/// Request timeout against the Schema Registry when the resource leaves it unset or zero
pub const DEFAULT_REGISTRY_TIMEOUT_SECS: u64 = 30;

/// Fibonacci backoff bounds for unexpected reconcile errors (minutes)
pub const ERROR_BACKOFF_MIN_MINUTES: u64 = 1;
pub const ERROR_BACKOFF_MAX_MINUTES: u64 = 10;

/// Default parallelism across distinct resource keys
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Secret keys read by the credential resolver
pub const SECRET_KEY_USERNAME: &str = "username";
pub const SECRET_KEY_PASSWORD: &str = "password";
pub const SECRET_KEY_TOKEN: &str = "token";
pub const SECRET_KEY_TLS_CERT: &str = "tls.crt";
pub const SECRET_KEY_TLS_KEY: &str = "tls.key";
pub const SECRET_KEY_CA_CERT: &str = "ca.crt";
