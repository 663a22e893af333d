//! # Schema Lifecycle Reconciler
//!
//! Registers each `Schema` under its subject and removes the subject when
//! the resource is deleted.
//!
//! Registration, compatibility, and client failures land in the `Ready`
//! condition and are retried on a fixed interval. Only Kubernetes API
//! failures and a registry that refuses deletion become reconcile errors.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use kube::{Api, ResourceExt};
use kube_runtime::controller::Action;
use tracing::{debug, info, warn, Instrument};

use super::client::{client_for_schema, ClientBuildError};
use super::lifecycle::{add_finalizer, has_finalizer, remove_finalizer, LifecycleStage};
use super::status::{ready_condition, write_status};
use super::types::{Reconciler, ReconcilerError};
use super::validation::validate_schema_spec;
use crate::crd::{set_condition, Schema, SchemaSpec, SchemaStatus};
use crate::observability::metrics;
use crate::registry::{RegisterResult, RegisterSchemaRequest, RegistryError, SchemaRegistryApi};

pub const KIND: &str = "Schema";

/// Result of one registration attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOutcome {
    Registered(RegisterResult),
    InvalidSpec(String),
    ClientBuildFailed(String),
    RegistrationFailed(String),
}

impl SchemaOutcome {
    /// Condition reason
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            SchemaOutcome::Registered(_) => "Registered",
            SchemaOutcome::InvalidSpec(_) => "InvalidSpec",
            SchemaOutcome::ClientBuildFailed(_) => "ClientBuildFailed",
            SchemaOutcome::RegistrationFailed(_) => "RegistrationFailed",
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            SchemaOutcome::Registered(RegisterResult {
                id,
                version: Some(version),
            }) => format!("Schema registered with ID {id}, version {version}"),
            SchemaOutcome::Registered(RegisterResult { id, version: None }) => {
                format!("Schema registered with ID {id}")
            }
            SchemaOutcome::InvalidSpec(message)
            | SchemaOutcome::ClientBuildFailed(message)
            | SchemaOutcome::RegistrationFailed(message) => message.clone(),
        }
    }
}

/// Register `spec` and apply its compatibility level
///
/// A failed compatibility update is logged and counted but does not fail
/// the registration.
pub async fn register(api: &dyn SchemaRegistryApi, spec: &SchemaSpec) -> SchemaOutcome {
    let request = RegisterSchemaRequest::from(spec);
    info!(
        schema.subject = %spec.subject,
        schema.r#type = %spec.schema_type,
        "Registering schema"
    );

    let result = match api.register_schema(&spec.subject, &request).await {
        Ok(result) => result,
        Err(e) => {
            warn!(schema.subject = %spec.subject, "❌ Failed to register schema: {}", e);
            return SchemaOutcome::RegistrationFailed(e.to_string());
        }
    };

    if let Some(level) = spec.compatibility_level.as_deref().filter(|l| !l.is_empty()) {
        if let Err(e) = api.set_compatibility(&spec.subject, level).await {
            warn!(
                schema.subject = %spec.subject,
                compatibility = level,
                "⚠️  Failed to set compatibility level, schema stays registered: {}",
                e
            );
            metrics::increment_compatibility_failures();
        }
    }

    SchemaOutcome::Registered(result)
}

/// Status after `outcome`, starting from the previously published one
///
/// Failures only replace the `Ready` condition. `registeredAt` is kept when
/// a registration reports the same ID and version for the same generation.
#[must_use]
pub fn schema_status_for(
    previous: Option<&SchemaStatus>,
    outcome: &SchemaOutcome,
    generation: Option<i64>,
    finalizer_present: bool,
    now: DateTime<Utc>,
) -> SchemaStatus {
    let mut status = previous.cloned().unwrap_or_default();
    status.finalizer_present = finalizer_present;

    if let SchemaOutcome::Registered(result) = outcome {
        let same_schema = status.schema_id == Some(result.id);
        let version = result
            .version
            .or_else(|| status.version.filter(|_| same_schema));
        let unchanged = same_schema
            && status.version == version
            && status.observed_generation == generation
            && status.registered_at.is_some();

        status.schema_id = Some(result.id);
        status.version = version;
        status.observed_generation = generation;
        if !unchanged {
            status.registered_at = Some(now.to_rfc3339());
        }
    }

    set_condition(
        &mut status.conditions,
        ready_condition(
            matches!(outcome, SchemaOutcome::Registered(_)),
            outcome.reason(),
            outcome.message(),
            generation,
        ),
    );
    status
}

/// What deletion should do with the finalizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Subject removed (or already absent)
    Deleted,
    /// Registry unusable; release the finalizer without remote cleanup
    Skipped { reason: &'static str, detail: String },
    /// Keep the finalizer and try again
    Retry(String),
}

impl CleanupOutcome {
    /// Classify a failure to obtain a client during deletion
    ///
    /// A registry that is gone or misconfigured cannot be fixed by waiting,
    /// so the finalizer is released. Transient API and secret read failures
    /// are retried.
    #[must_use]
    pub fn from_build_error(error: &ClientBuildError) -> Self {
        if error.is_transient() {
            CleanupOutcome::Retry(error.to_string())
        } else {
            CleanupOutcome::Skipped {
                reason: error.reason(),
                detail: error.to_string(),
            }
        }
    }
}

/// Delete `subject` from the registry
///
/// Only a registry that answers with an error status keeps the finalizer.
/// An unreachable registry releases it without remote cleanup.
pub async fn delete(api: &dyn SchemaRegistryApi, subject: &str) -> CleanupOutcome {
    match api.delete_subject(subject).await {
        Ok(()) => CleanupOutcome::Deleted,
        Err(e @ (RegistryError::Transport { .. } | RegistryError::InvalidEndpoint(_))) => {
            CleanupOutcome::Skipped {
                reason: "unreachable",
                detail: e.to_string(),
            }
        }
        Err(e) => CleanupOutcome::Retry(e.to_string()),
    }
}

/// Reconcile one `Schema`
///
/// # Errors
///
/// Kubernetes API failures, write conflicts, and refused subject deletions.
pub async fn reconcile_schema(
    schema: Arc<Schema>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let name = schema.name_any();
    let namespace = schema.namespace().unwrap_or_default();
    let stage = LifecycleStage::of(&schema);
    let span = tracing::span!(
        tracing::Level::INFO,
        "controller.watch.reconcile",
        resource.kind = KIND,
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        resource.generation = schema.metadata.generation.unwrap_or(0),
        lifecycle.stage = ?stage,
    );

    async move {
        let start = Instant::now();
        metrics::increment_reconciliations(KIND);
        let api: Api<Schema> = Api::namespaced(ctx.client.clone(), &namespace);

        let action = match stage {
            LifecycleStage::Removed => Action::await_change(),
            LifecycleStage::Cleanup => cleanup(&api, &schema, &ctx).await?,
            LifecycleStage::AttachFinalizer => {
                add_finalizer(&api, &schema).await?;
                match api.get_opt(&name).await? {
                    Some(fresh) if LifecycleStage::of(&fresh) == LifecycleStage::Reconcile => {
                        apply(&api, &fresh, &ctx).await?
                    }
                    _ => Action::await_change(),
                }
            }
            LifecycleStage::Reconcile => apply(&api, &schema, &ctx).await?,
        };

        metrics::observe_reconciliation_duration(KIND, start.elapsed().as_secs_f64());
        ctx.reset_backoff(KIND, &namespace, &name);
        Ok(action)
    }
    .instrument(span)
    .await
}

/// Register the schema and publish the outcome
async fn apply(
    api: &Api<Schema>,
    schema: &Schema,
    ctx: &Reconciler,
) -> Result<Action, ReconcilerError> {
    let name = schema.name_any();

    let outcome = match validate_schema_spec(&schema.spec) {
        Err(errors) => {
            warn!("❌ Schema {} has an invalid spec: {}", name, errors);
            SchemaOutcome::InvalidSpec(errors.to_string())
        }
        Ok(()) => match client_for_schema(&ctx.client, schema, &ctx.config).await {
            Ok(client) => register(&client, &schema.spec).await,
            Err(e) => {
                warn!(reason = e.reason(), "❌ Failed to build Schema Registry client: {}", e);
                SchemaOutcome::ClientBuildFailed(e.to_string())
            }
        },
    };

    let Some(current) = api.get_opt(&name).await? else {
        debug!("Schema {} was deleted during registration", name);
        return Ok(Action::await_change());
    };
    if current.metadata.deletion_timestamp.is_some() {
        debug!("Schema {} is being deleted, cleanup runs next", name);
        return Ok(Action::await_change());
    }

    let status = schema_status_for(
        current.status.as_ref(),
        &outcome,
        current.metadata.generation,
        has_finalizer(&current),
        Utc::now(),
    );
    if current.status.as_ref() == Some(&status) {
        debug!("Schema {} status unchanged, not rewritten", name);
    } else {
        write_status(api, &name, current.metadata.resource_version.as_deref(), &status).await?;
    }

    if let SchemaOutcome::Registered(result) = outcome {
        metrics::increment_schemas_registered();
        info!(
            schema.subject = %schema.spec.subject,
            schema.id = result.id,
            schema.version = ?result.version,
            "✅ Schema successfully registered"
        );
        Ok(Action::await_change())
    } else {
        let retry = ctx.config.registration_retry();
        info!(
            "📅 Retrying registration of {} in {}s (trigger source: registration-retry)",
            name,
            retry.as_secs()
        );
        metrics::increment_requeues_total("registration-retry");
        Ok(Action::requeue(retry))
    }
}

/// Remove the subject from the registry, then release the finalizer
async fn cleanup(
    api: &Api<Schema>,
    schema: &Schema,
    ctx: &Reconciler,
) -> Result<Action, ReconcilerError> {
    let subject = schema.spec.subject.clone();
    info!(schema.subject = %subject, "Deleting schema subject from registry");

    let outcome = if subject.is_empty() {
        CleanupOutcome::Skipped {
            reason: "invalid_spec",
            detail: "subject is empty".to_string(),
        }
    } else {
        match client_for_schema(&ctx.client, schema, &ctx.config).await {
            Ok(client) => delete(&client, &subject).await,
            Err(e) => CleanupOutcome::from_build_error(&e),
        }
    };

    match outcome {
        CleanupOutcome::Deleted => {
            info!(schema.subject = %subject, "✅ Subject deleted from registry");
        }
        CleanupOutcome::Skipped { reason, detail } => {
            warn!(
                schema.subject = %subject,
                reason,
                "⚠️  Could not reach registry during deletion, skipping registry cleanup: {}",
                detail
            );
            metrics::increment_cleanup_skipped(reason);
        }
        CleanupOutcome::Retry(message) => {
            return Err(ReconcilerError::Cleanup { subject, message });
        }
    }

    remove_finalizer(api, schema).await?;
    Ok(Action::await_change())
}
