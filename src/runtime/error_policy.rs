//! # Error Policy
//!
//! Requeue decisions for failed reconciliations and watch stream errors.
//!
//! Write conflicts are retried after a short fixed delay. Every other error
//! advances a Fibonacci backoff kept per resource, which a successful
//! reconcile resets.

use std::sync::Arc;
use std::time::Duration;

use kube::{Resource, ResourceExt};
use kube_runtime::controller::Action;
use tracing::{error, info, warn};

use crate::controller::reconciler::{BackoffState, Reconciler, ReconcilerError};
use crate::observability::metrics;

/// Fallback delay when the backoff table cannot be locked
const FALLBACK_BACKOFF_SECS: u64 = 60;

/// Handle a reconciliation error for any resource kind
pub fn handle_reconciliation_error<K>(obj: Arc<K>, error: &ReconcilerError, ctx: Arc<Reconciler>) -> Action
where
    K: Resource<DynamicType = ()>,
{
    let kind = K::kind(&());
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.kind = &*kind,
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        error = %error
    );
    let _error_guard = error_span.enter();

    metrics::increment_reconciliation_errors(&kind);

    if error.is_conflict() {
        let delay = ctx.config.conflict_requeue();
        warn!(
            "⚠️  Write conflict on {} {}/{}, retrying in {}s (trigger source: conflict)",
            kind,
            namespace,
            name,
            delay.as_secs()
        );
        metrics::increment_requeues_total("conflict");
        return Action::requeue(delay);
    }

    error!("Reconciliation error for {} {}/{}: {:?}", kind, namespace, name, error);

    let resource_key = Reconciler::backoff_key(&kind, &namespace, &name);
    let (backoff_seconds, error_count) = next_backoff(&ctx, resource_key);

    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::seconds(i64::try_from(backoff_seconds).unwrap_or(i64::MAX));

    info!(
        "🔄 Retrying with Fibonacci backoff: {}s (error count: {}, trigger source: error-backoff)",
        backoff_seconds, error_count
    );
    info!(
        "📅 Next retry scheduled: {} (in {}s, trigger source: error-backoff)",
        next_trigger_time.to_rfc3339(),
        backoff_seconds
    );

    metrics::increment_requeues_total("error-backoff");
    Action::requeue(Duration::from_secs(backoff_seconds))
}

fn next_backoff(ctx: &Reconciler, resource_key: String) -> (u64, u32) {
    match ctx.backoff_states.lock() {
        Ok(mut states) => {
            let state = states.entry(resource_key).or_insert_with(BackoffState::default);
            state.increment_error();
            (state.backoff.next_backoff_seconds(), state.error_count)
        }
        Err(e) => {
            warn!("Failed to lock backoff_states: {}, using default backoff", e);
            (FALLBACK_BACKOFF_SECS, 0)
        }
    }
}

/// Log a watch stream error with its likely cause
///
/// The controller's watchers already retry with their own backoff; this only
/// classifies the error for operators.
pub fn handle_watch_stream_error(kind: &str, error_string: &str) {
    let error_span = tracing::span!(
        tracing::Level::WARN,
        "controller.watch.error",
        resource.kind = kind,
        error = %error_string
    );
    let _error_guard = error_span.enter();

    let is_not_found = error_string.contains("ObjectNotFound")
        || error_string.contains("404")
        || error_string.contains("not found");
    let is_unauthorized =
        (error_string.contains("401") || error_string.contains("Unauthorized")) && !is_not_found;
    let is_forbidden = error_string.contains("403") || error_string.contains("Forbidden");
    let is_expired = error_string.contains("410") || error_string.contains("too old resource version");

    if is_unauthorized || is_forbidden {
        error!(
            "❌ Watch on {} rejected by the API server - check the controller's RBAC (kubectl auth can-i list {} --as=system:serviceaccount:<namespace>:schema-registry-controller)",
            kind,
            kind.to_lowercase()
        );
    } else if is_expired {
        warn!("Watch resource version expired (410), watch will restart");
    } else if is_not_found {
        warn!(
            "{} not found (404) - the CRD may not be installed. Error: {}",
            kind, error_string
        );
    } else {
        error!("Controller stream error: {}", error_string);
    }
}
