//! # OpenTelemetry Support
//!
//! Optional Datadog trace export through `datadog-opentelemetry`.
//!
//! Export is enabled only when `DD_API_KEY` is present. The remaining `DD_*`
//! variables are filled with defaults when unset:
//!
//! | Variable             | Default                                   |
//! |----------------------|-------------------------------------------|
//! | `DD_SERVICE`         | `schema-registry-controller`              |
//! | `DD_VERSION`         | `<crate version>-<git hash>`              |
//! | `DD_SITE`            | `datadoghq.com`                           |
//! | `DD_TRACE_AGENT_URL` | `http://localhost:8126`                   |

use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

const DEFAULT_SERVICE_NAME: &str = "schema-registry-controller";
const DEFAULT_SITE: &str = "datadoghq.com";
const DEFAULT_AGENT_URL: &str = "http://localhost:8126";

/// Tracer provider handle for graceful shutdown
#[derive(Debug)]
pub enum TracerProviderHandle {
    Datadog(opentelemetry_sdk::trace::SdkTracerProvider),
}

/// Initialize Datadog tracing if `DD_API_KEY` is set
///
/// Returns `Ok(None)` when export is not configured.
///
/// # Errors
///
/// Reserved for initialization failures of the exporter.
pub fn init_otel() -> Result<Option<TracerProviderHandle>> {
    if std::env::var("DD_API_KEY").is_err() {
        info!("No OpenTelemetry configuration provided, skipping Otel initialization");
        return Ok(None);
    }

    info!("DD_API_KEY found in environment, initializing Datadog tracing...");
    set_default_env("DD_SERVICE", DEFAULT_SERVICE_NAME);
    set_default_env(
        "DD_VERSION",
        &format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("BUILD_GIT_HASH")),
    );
    set_default_env("DD_SITE", DEFAULT_SITE);
    set_default_env("DD_TRACE_AGENT_URL", DEFAULT_AGENT_URL);

    info!(
        "Initializing Datadog OpenTelemetry tracing: service={}, version={}, env={:?}, site={}",
        std::env::var("DD_SERVICE").unwrap_or_default(),
        std::env::var("DD_VERSION").unwrap_or_default(),
        std::env::var("DD_ENV").ok(),
        std::env::var("DD_SITE").unwrap_or_default()
    );

    let tracer_provider = datadog_opentelemetry::tracing().init();

    info!("✅ Datadog OpenTelemetry tracing initialized successfully");
    info!(
        "   Traces will be sent to: {}",
        std::env::var("DD_TRACE_AGENT_URL").unwrap_or_default()
    );

    Ok(Some(TracerProviderHandle::Datadog(tracer_provider)))
}

// Runs before any worker threads read the environment
fn set_default_env(key: &str, value: &str) {
    if std::env::var(key).is_err() {
        std::env::set_var(key, value);
    }
}

/// Flush pending spans and shut the tracer provider down
pub fn shutdown_otel(tracer_provider: Option<TracerProviderHandle>) {
    let Some(TracerProviderHandle::Datadog(provider)) = tracer_provider else {
        return;
    };

    info!("Shutting down Datadog tracer provider...");
    if let Err(e) = provider.shutdown_with_timeout(Duration::from_secs(5)) {
        warn!("Error shutting down Datadog tracer provider: {}", e);
    } else {
        info!("✅ Datadog tracer provider shut down successfully");
    }
}
