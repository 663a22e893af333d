//! # Watch Loop
//!
//! Runs the `SchemaRegistry` and `Schema` controllers side by side.
//!
//! - `SchemaRegistry` reconciles on its own changes, on its timer, and when a
//!   Secret named by its auth changes.
//! - `Schema` reconciles on its own changes and when the `SchemaRegistry` it
//!   references changes.

use std::future::{ready, Future};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use kube::{Client, Resource};
use kube_runtime::controller::{self, Action};
use kube_runtime::reflector::ObjectRef;
use kube_runtime::{watcher, Controller};
use tokio::sync::watch;
use tracing::{debug, info, warn, Instrument};

use crate::config::ControllerConfig;
use crate::controller::reconciler::{
    reconcile_registry, reconcile_schema, Reconciler, ReconcilerError,
};
use crate::controller::routing::{registries_for_secret, schemas_for_registry};
use crate::controller::server::ServerState;
use crate::crd::{Schema, SchemaRegistry};
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};

/// Delay before restarting controllers whose streams ended unexpectedly
const WATCH_RESTART_DELAY: Duration = Duration::from_secs(5);

/// Api scoped to `WATCH_NAMESPACE`, or cluster-wide when unset
pub fn scoped_api<K>(client: &Client, config: &ControllerConfig) -> Api<K>
where
    K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    K::DynamicType: Default,
{
    match config.watch_namespace.as_deref() {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    }
}

/// Run both controllers until a shutdown signal is received
///
/// # Errors
///
/// Currently never fails; controllers restart when their streams end.
pub async fn run_watch_loop(reconciler: Arc<Reconciler>, server_state: Arc<ServerState>) -> Result<()> {
    info!("Starting controller watch loop...");

    // Readiness is cleared before the controllers are told to drain
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(mark_not_ready_on(
        Arc::clone(&server_state),
        shutdown_signal(),
        shutdown_tx,
    ));

    loop {
        if !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let watch_span = tracing::span!(
            tracing::Level::INFO,
            "controller.watch",
            operation = "watch_loop"
        );

        async {
            futures::join!(
                run_registry_controller(Arc::clone(&reconciler), shutdown_rx.clone()),
                run_schema_controller(Arc::clone(&reconciler), shutdown_rx.clone()),
            )
        }
        .instrument(watch_span)
        .await;

        if !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            WATCH_RESTART_DELAY.as_secs()
        );
        tokio::time::sleep(WATCH_RESTART_DELAY).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}

/// Resolves on SIGTERM (pod shutdown) or SIGINT
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
                return;
            }
            Err(e) => warn!("Failed to install SIGTERM handler, listening for SIGINT only: {}", e),
        }
    }
    let _ = tokio::signal::ctrl_c().await;
}

/// Wait for `signal`, fail readiness, then tell the controllers to drain
async fn mark_not_ready_on<F>(server_state: Arc<ServerState>, signal: F, shutdown: watch::Sender<bool>)
where
    F: Future<Output = ()>,
{
    signal.await;
    info!("Received shutdown signal, initiating graceful shutdown...");
    server_state.set_ready(false);
    let _ = shutdown.send(true);
    info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
}

/// Resolves once shutdown has been requested
async fn shutdown_requested(mut shutdown: watch::Receiver<bool>) {
    if shutdown.wait_for(|requested| *requested).await.is_err() {
        // Sender gone without a signal; never shut down from here
        std::future::pending::<()>().await;
    }
}

fn controller_config(config: &ControllerConfig) -> controller::Config {
    controller::Config::default().concurrency(config.max_concurrent_reconciliations)
}

async fn run_registry_controller(reconciler: Arc<Reconciler>, shutdown: watch::Receiver<bool>) {
    let client = reconciler.client.clone();
    let config = Arc::clone(&reconciler.config);
    let registries: Api<SchemaRegistry> = scoped_api(&client, &config);
    let secrets: Api<Secret> = scoped_api(&client, &config);

    let controller = Controller::new(registries, watcher::Config::default().any_semantic())
        .with_config(controller_config(&config));
    let store = controller.store();

    controller
        .watches(secrets, watcher::Config::default(), move |secret: Secret| {
            let dependents = registries_for_secret(&store.state(), &secret);
            log_routed("Secret", &secret, &dependents);
            dependents
        })
        .graceful_shutdown_on(shutdown_requested(shutdown))
        .run(
            reconcile_registry,
            |obj, error, ctx| handle_reconciliation_error(obj, error, ctx),
            reconciler,
        )
        .for_each(|result| {
            log_result(SchemaRegistry::kind(&()).as_ref(), result);
            ready(())
        })
        .await;
}

async fn run_schema_controller(reconciler: Arc<Reconciler>, shutdown: watch::Receiver<bool>) {
    let client = reconciler.client.clone();
    let config = Arc::clone(&reconciler.config);
    let schemas: Api<Schema> = scoped_api(&client, &config);
    let registries: Api<SchemaRegistry> = scoped_api(&client, &config);

    let controller = Controller::new(schemas, watcher::Config::default().any_semantic())
        .with_config(controller_config(&config));
    let store = controller.store();

    controller
        .watches(registries, watcher::Config::default(), move |registry: SchemaRegistry| {
            let dependents = schemas_for_registry(&store.state(), &registry);
            log_routed("SchemaRegistry", &registry, &dependents);
            dependents
        })
        .graceful_shutdown_on(shutdown_requested(shutdown))
        .run(
            reconcile_schema,
            |obj, error, ctx| handle_reconciliation_error(obj, error, ctx),
            reconciler,
        )
        .for_each(|result| {
            log_result(Schema::kind(&()).as_ref(), result);
            ready(())
        })
        .await;
}

fn log_routed<D, K>(source_kind: &str, source: &D, dependents: &[ObjectRef<K>])
where
    D: Resource,
    K: Resource<DynamicType = ()>,
{
    if dependents.is_empty() {
        return;
    }
    debug!(
        source.kind = source_kind,
        source.name = source.meta().name.as_deref().unwrap_or("unknown"),
        dependents = dependents.len(),
        "Change routed to dependent {} resources",
        K::kind(&())
    );
}

type ControllerResult<K> = Result<(ObjectRef<K>, Action), controller::Error<ReconcilerError, watcher::Error>>;

fn log_result<K>(kind: &str, result: ControllerResult<K>)
where
    K: Resource<DynamicType = ()>,
{
    match result {
        Ok((object, _)) => {
            debug!(resource.kind = kind, resource.name = %object.name, "watch.event.success");
        }
        // Already logged and requeued by the error policy
        Err(controller::Error::ReconcilerFailed(_, object)) => {
            debug!(resource.kind = kind, resource.name = %object.name, "watch.event.reconcile_failed");
        }
        Err(e) => handle_watch_stream_error(kind, &format!("{e:?}")),
    }
}
