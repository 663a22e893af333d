//! # Schema Lifecycle
//!
//! The finalizer state machine for `Schema` resources.
//!
//! | deletion requested | finalizer present | stage             |
//! |--------------------|-------------------|-------------------|
//! | no                 | no                | `AttachFinalizer` |
//! | no                 | yes               | `Reconcile`       |
//! | yes                | yes               | `Cleanup`         |
//! | yes                | no                | `Removed`         |
//!
//! Finalizer writes carry the observed `resourceVersion`, so a concurrent
//! change to the list is rejected instead of overwritten.

use kube::api::{Patch, PatchParams};
use kube::{Api, ResourceExt};
use serde_json::json;
use tracing::{debug, info};

use super::types::ReconcilerError;
use crate::constants::{FIELD_MANAGER, SCHEMA_FINALIZER};
use crate::crd::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStage {
    AttachFinalizer,
    Reconcile,
    Cleanup,
    Removed,
}

impl LifecycleStage {
    #[must_use]
    pub fn from_flags(deletion_requested: bool, finalizer_present: bool) -> Self {
        match (deletion_requested, finalizer_present) {
            (false, false) => LifecycleStage::AttachFinalizer,
            (false, true) => LifecycleStage::Reconcile,
            (true, true) => LifecycleStage::Cleanup,
            (true, false) => LifecycleStage::Removed,
        }
    }

    #[must_use]
    pub fn of(schema: &Schema) -> Self {
        Self::from_flags(
            schema.metadata.deletion_timestamp.is_some(),
            has_finalizer(schema),
        )
    }
}

#[must_use]
pub fn has_finalizer(schema: &Schema) -> bool {
    schema.finalizers().iter().any(|f| f == SCHEMA_FINALIZER)
}

/// Finalizer list with ours appended (no duplicates)
#[must_use]
pub fn finalizers_with(current: &[String]) -> Vec<String> {
    let mut finalizers = current.to_vec();
    if !finalizers.iter().any(|f| f == SCHEMA_FINALIZER) {
        finalizers.push(SCHEMA_FINALIZER.to_string());
    }
    finalizers
}

/// Finalizer list with ours removed; other controllers' entries are kept
#[must_use]
pub fn finalizers_without(current: &[String]) -> Vec<String> {
    current
        .iter()
        .filter(|f| f.as_str() != SCHEMA_FINALIZER)
        .cloned()
        .collect()
}

async fn patch_finalizers(
    api: &Api<Schema>,
    schema: &Schema,
    finalizers: Vec<String>,
) -> Result<(), kube::Error> {
    let patch = json!({
        "metadata": {
            "finalizers": finalizers,
            "resourceVersion": schema.resource_version(),
        }
    });
    api.patch(
        &schema.name_any(),
        &PatchParams::apply(FIELD_MANAGER),
        &Patch::Merge(&patch),
    )
    .await
    .map(|_| ())
}

/// Attach the cleanup finalizer
///
/// # Errors
///
/// [`ReconcilerError::Conflict`] when the resource changed since it was read.
pub async fn add_finalizer(api: &Api<Schema>, schema: &Schema) -> Result<(), ReconcilerError> {
    let name = schema.name_any();
    patch_finalizers(api, schema, finalizers_with(schema.finalizers()))
        .await
        .map_err(|e| ReconcilerError::from_write(e, format!("Schema {name}")))?;
    info!(resource.name = %name, "Added finalizer {}", SCHEMA_FINALIZER);
    Ok(())
}

/// Release the cleanup finalizer so the API server can delete the resource
///
/// # Errors
///
/// [`ReconcilerError::Conflict`] when the resource changed since it was read.
pub async fn remove_finalizer(api: &Api<Schema>, schema: &Schema) -> Result<(), ReconcilerError> {
    let name = schema.name_any();
    match patch_finalizers(api, schema, finalizers_without(schema.finalizers())).await {
        Ok(()) => {
            info!(resource.name = %name, "Removed finalizer {}", SCHEMA_FINALIZER);
            Ok(())
        }
        Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
            debug!(resource.name = %name, "Schema already gone, finalizer needs no removal");
            Ok(())
        }
        Err(e) => Err(ReconcilerError::from_write(e, format!("Schema {name}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{SchemaRegistryRef, SchemaSpec, SchemaType};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

    fn schema(deleting: bool, finalizers: &[&str]) -> Schema {
        let mut schema = Schema::new(
            "users",
            SchemaSpec {
                subject: "users-value".to_string(),
                schema_type: SchemaType::Avro,
                schema: "\"string\"".to_string(),
                references: Vec::new(),
                registry_ref: SchemaRegistryRef {
                    name: "main".to_string(),
                    namespace: None,
                },
                compatibility_level: None,
            },
        );
        schema.metadata.finalizers = Some(finalizers.iter().map(ToString::to_string).collect());
        if deleting {
            schema.metadata.deletion_timestamp = Some(Time(chrono::Utc::now()));
        }
        schema
    }

    #[test]
    fn test_stage_from_flags_covers_all_combinations() {
        assert_eq!(
            LifecycleStage::from_flags(false, false),
            LifecycleStage::AttachFinalizer
        );
        assert_eq!(
            LifecycleStage::from_flags(false, true),
            LifecycleStage::Reconcile
        );
        assert_eq!(
            LifecycleStage::from_flags(true, true),
            LifecycleStage::Cleanup
        );
        assert_eq!(
            LifecycleStage::from_flags(true, false),
            LifecycleStage::Removed
        );
    }

    #[test]
    fn test_stage_of_resource_ignores_foreign_finalizers() {
        assert_eq!(
            LifecycleStage::of(&schema(false, &["example.com/other"])),
            LifecycleStage::AttachFinalizer
        );
        assert_eq!(
            LifecycleStage::of(&schema(true, &["example.com/other", SCHEMA_FINALIZER])),
            LifecycleStage::Cleanup
        );
        assert_eq!(
            LifecycleStage::of(&schema(true, &["example.com/other"])),
            LifecycleStage::Removed
        );
    }

    #[test]
    fn test_finalizer_list_edits() {
        let current = vec!["example.com/other".to_string()];

        let added = finalizers_with(&current);
        assert_eq!(added, vec!["example.com/other", SCHEMA_FINALIZER]);
        assert_eq!(finalizers_with(&added), added);

        assert_eq!(finalizers_without(&added), current);
        assert!(finalizers_without(&[]).is_empty());
    }
}
