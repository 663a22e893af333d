//! # Initialization
//!
//! Controller initialization logic including rustls setup, OpenTelemetry,
//! tracing, metrics, server startup, and Kubernetes client setup.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use kube::api::{Api, ListParams};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use crate::config::{ControllerConfig, LogFormat};
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::crd::{Schema, SchemaRegistry};
use crate::observability;
use crate::runtime::watch_loop::scoped_api;

/// Everything the watch loop needs
pub struct InitializationResult {
    pub client: Client,
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
    /// OpenTelemetry tracer provider (if initialized)
    pub otel_tracer_provider: Option<observability::TracerProviderHandle>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.ready())
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - OpenTelemetry initialization
/// - Tracing subscriber setup
/// - Metrics registration
/// - HTTP server startup
/// - Kubernetes client creation
/// - Startup summary of existing resources
///
/// # Errors
///
/// Fails when metrics cannot be registered, the probes server does not come
/// up in time, or no Kubernetes client can be built.
pub async fn initialize() -> Result<InitializationResult> {
    // Must run before anything builds a TLS config
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install rustls crypto provider: {e:?}"))?;

    let config = Arc::new(ControllerConfig::from_env());

    let otel_tracer_provider =
        observability::init_otel().context("Failed to initialize OpenTelemetry")?;
    init_tracing(config.log_format, otel_tracer_provider.is_some());

    info!("Starting Schema Registry Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        watch_namespace = config.watch_namespace.as_deref().unwrap_or("<all>"),
        health_check_interval_secs = config.health_check_interval_secs,
        registration_retry_secs = config.registration_retry_secs,
        max_concurrent_reconciliations = config.max_concurrent_reconciliations,
        "Loaded controller configuration"
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::new());
    let server_state_clone = Arc::clone(&server_state);
    let server_port = config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    wait_for_server_ready(
        &server_state,
        &server_handle,
        Duration::from_secs(config.server_startup_timeout_secs),
        Duration::from_millis(config.server_poll_interval_ms),
    )
    .await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    summarize_existing::<SchemaRegistry>(scoped_api(&client, &config)).await;
    summarize_existing::<Schema>(scoped_api(&client, &config)).await;

    let reconciler = Arc::new(Reconciler::new(client.clone(), config));

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        reconciler,
        server_state,
        otel_tracer_provider,
    })
}

fn init_tracing(log_format: LogFormat, otel_initialized: bool) {
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "schema_registry_controller=info".into())
    };

    let result = match log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .try_init(),
    };

    // datadog-opentelemetry may already have installed a global subscriber
    if let Err(e) = result {
        if otel_initialized {
            warn!("Tracing subscriber init returned error (may already be initialized by Datadog): {}", e);
        } else {
            eprintln!("Failed to initialize tracing subscriber: {e}");
        }
    }
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    startup_timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let start_time = Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        // Set by start_server once bound
        if server_state.ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Log how many resources of kind `K` already exist, grouped by namespace
///
/// The controllers' initial list reconciles them; this only checks that the
/// CRD is queryable and gives operators a startup summary.
async fn summarize_existing<K>(api: Api<K>)
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + std::fmt::Debug,
{
    let kind = K::kind(&());
    let span = tracing::span!(
        tracing::Level::INFO,
        "controller.startup.list_existing",
        resource.kind = &*kind
    );
    let _guard = span.enter();

    let list = match api.list(&ListParams::default()).await {
        Ok(list) => list,
        Err(e) => {
            warn!(
                "Could not list {} resources (is the CRD installed?): {}",
                kind, e
            );
            return;
        }
    };

    if list.items.is_empty() {
        info!("No existing {} resources found, watch will pick up new resources", kind);
        return;
    }

    let mut by_namespace: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for item in &list.items {
        by_namespace
            .entry(item.namespace().unwrap_or_default())
            .or_default()
            .push(item.name_any());
    }

    info!("Startup Resource Summary");
    info!("Resource Kind: {}", kind);
    info!("Total Resources: {}", list.items.len());
    info!("Namespaces: {}", by_namespace.len());
    for (namespace, mut names) in by_namespace {
        names.sort();
        let shown = if names.len() <= 3 {
            names.join(", ")
        } else {
            format!("{}, ... ({} total)", names[..3].join(", "), names.len())
        };
        info!("Namespace: {}", namespace);
        info!("  Resources ({}): {}", names.len(), shown);
    }
}
