//! # Connectivity Reconciler
//!
//! Probes each `SchemaRegistry` and publishes whether it is reachable.
//!
//! Every outcome, including bad specs and missing secrets, is reported through
//! status rather than as a reconcile error, and the registry is probed again
//! after the health-check interval.
//!
//! The status write is skipped when nothing but `lastChecked` would change and
//! the previous check is younger than the interval. The write itself fires a
//! watch event; without the skip every write would schedule another probe.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use kube::{Api, ResourceExt};
use kube_runtime::controller::Action;
use tracing::{debug, info, warn, Instrument};

use super::client::{build_registry_client, ClientBuildError};
use super::status::{ready_condition, write_status};
use super::types::{Reconciler, ReconcilerError};
use crate::crd::{set_condition, ConnectionStatus, SchemaRegistry, SchemaRegistryStatus};
use crate::observability::metrics;
use crate::registry::SchemaRegistryApi;

pub const KIND: &str = "SchemaRegistry";

// A timer requeue can fire slightly before the interval has elapsed
const PERIODIC_TOLERANCE: Duration = Duration::from_secs(2);

/// Result of one connectivity probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityOutcome {
    Connected,
    ConnectionFailed(String),
    AuthLoadFailed(String),
    ClientCreateFailed(String),
    InvalidSpec(String),
}

impl ConnectivityOutcome {
    /// Condition reason
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ConnectivityOutcome::Connected => "Connected",
            ConnectivityOutcome::ConnectionFailed(_) => "ConnectionFailed",
            ConnectivityOutcome::AuthLoadFailed(_) => "AuthLoadFailed",
            ConnectivityOutcome::ClientCreateFailed(_) => "ClientCreateFailed",
            ConnectivityOutcome::InvalidSpec(_) => "InvalidSpec",
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            ConnectivityOutcome::Connected => "Successfully connected to Schema Registry",
            ConnectivityOutcome::ConnectionFailed(message)
            | ConnectivityOutcome::AuthLoadFailed(message)
            | ConnectivityOutcome::ClientCreateFailed(message)
            | ConnectivityOutcome::InvalidSpec(message) => message,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectivityOutcome::Connected)
    }

    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        if self.is_connected() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Unreachable
        }
    }
}

impl From<&ClientBuildError> for ConnectivityOutcome {
    fn from(error: &ClientBuildError) -> Self {
        match error {
            ClientBuildError::InvalidSpec(errors) => ConnectivityOutcome::InvalidSpec(errors.to_string()),
            ClientBuildError::Credentials(e) => ConnectivityOutcome::AuthLoadFailed(e.to_string()),
            ClientBuildError::Client(e) => ConnectivityOutcome::ClientCreateFailed(e.to_string()),
            // Not produced when building from a registry object directly
            ClientBuildError::RegistryNotFound { .. } | ClientBuildError::RegistryLookup(_) => {
                ConnectivityOutcome::ClientCreateFailed(error.to_string())
            }
        }
    }
}

/// Run the health check
pub async fn probe(api: &dyn SchemaRegistryApi) -> ConnectivityOutcome {
    match api.health_check().await {
        Ok(()) => ConnectivityOutcome::Connected,
        Err(e) => ConnectivityOutcome::ConnectionFailed(e.to_string()),
    }
}

/// Status after `outcome`, starting from the previously published one
#[must_use]
pub fn registry_status_for(
    previous: Option<&SchemaRegistryStatus>,
    outcome: &ConnectivityOutcome,
    generation: Option<i64>,
    now: DateTime<Utc>,
) -> SchemaRegistryStatus {
    let mut status = previous.cloned().unwrap_or_default();
    status.connection_status = Some(outcome.connection_status());
    status.last_checked = Some(now.to_rfc3339());
    status.observed_generation = generation;
    set_condition(
        &mut status.conditions,
        ready_condition(
            outcome.is_connected(),
            outcome.reason(),
            outcome.message(),
            generation,
        ),
    );
    status
}

/// Whether `next` must be written over `previous`
///
/// True when anything besides `lastChecked` differs, or when the previous
/// check is at least `interval` old.
#[must_use]
pub fn needs_status_write(
    previous: Option<&SchemaRegistryStatus>,
    next: &SchemaRegistryStatus,
    now: DateTime<Utc>,
    interval: Duration,
) -> bool {
    let Some(previous) = previous else {
        return true;
    };

    let material_change = SchemaRegistryStatus {
        last_checked: None,
        ..previous.clone()
    } != SchemaRegistryStatus {
        last_checked: None,
        ..next.clone()
    };
    if material_change {
        return true;
    }

    let Some(last_checked) = previous
        .last_checked
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
    else {
        return true;
    };

    let age = now.signed_duration_since(last_checked.with_timezone(&Utc));
    let due = chrono::Duration::from_std(interval.saturating_sub(PERIODIC_TOLERANCE))
        .unwrap_or_else(|_| chrono::Duration::zero());
    age >= due
}

/// Reconcile one `SchemaRegistry`
///
/// # Errors
///
/// Only Kubernetes API failures while re-reading or writing status.
pub async fn reconcile_registry(
    registry: Arc<SchemaRegistry>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let name = registry.name_any();
    let namespace = registry.namespace().unwrap_or_default();
    let span = tracing::span!(
        tracing::Level::INFO,
        "controller.watch.reconcile",
        resource.kind = KIND,
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        resource.generation = registry.metadata.generation.unwrap_or(0),
    );

    async move {
        let start = Instant::now();
        metrics::increment_reconciliations(KIND);

        let outcome = match build_registry_client(&ctx.client, &registry, &ctx.config).await {
            Ok(client) => probe(&client).await,
            Err(e) => ConnectivityOutcome::from(&e),
        };

        match &outcome {
            ConnectivityOutcome::Connected => {
                info!("✅ SchemaRegistry {}/{} is reachable", namespace, name);
            }
            failed => {
                warn!(
                    reason = failed.reason(),
                    "❌ SchemaRegistry {}/{} is unreachable: {}",
                    namespace,
                    name,
                    failed.message()
                );
            }
        }

        let api: Api<SchemaRegistry> = Api::namespaced(ctx.client.clone(), &namespace);
        let Some(current) = api.get_opt(&name).await? else {
            debug!("SchemaRegistry {}/{} was deleted during the probe", namespace, name);
            metrics::remove_registry_connected(&namespace, &name);
            ctx.reset_backoff(KIND, &namespace, &name);
            return Ok(Action::await_change());
        };

        let now = Utc::now();
        let interval = ctx.config.health_check_interval();
        let status = registry_status_for(
            current.status.as_ref(),
            &outcome,
            current.metadata.generation,
            now,
        );
        if needs_status_write(current.status.as_ref(), &status, now, interval) {
            write_status(
                &api,
                &name,
                current.metadata.resource_version.as_deref(),
                &status,
            )
            .await?;
        } else {
            debug!("Connectivity unchanged since last check, status not rewritten");
        }

        metrics::set_registry_connected(&namespace, &name, outcome.is_connected());
        metrics::observe_reconciliation_duration(KIND, start.elapsed().as_secs_f64());
        ctx.reset_backoff(KIND, &namespace, &name);

        info!(
            "📅 Next health check for {}/{} in {}s (trigger source: timer-based)",
            namespace,
            name,
            interval.as_secs()
        );
        metrics::increment_requeues_total("health-check");
        Ok(Action::requeue(interval))
    }
    .instrument(span)
    .await
}
