//! # Observability
//!
//! Observability modules for metrics and tracing.
//!
//! - `metrics`: Prometheus metrics collection
//! - `otel`: Optional Datadog trace export

pub mod metrics;
pub mod otel;

pub use otel::{init_otel, shutdown_otel, TracerProviderHandle};
