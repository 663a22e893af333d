//! # Dependency Routing
//!
//! Maps a changed dependency to the resources that must be reconciled again.
//!
//! - A Secret change re-queues every `SchemaRegistry` in the same namespace
//!   whose auth names that Secret.
//! - A `SchemaRegistry` change re-queues every `Schema` whose `registryRef`
//!   resolves to it.
//!
//! Both functions are pure so they can run inside `Controller::watches`
//! mappers against the reflector stores.

use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use kube_runtime::reflector::ObjectRef;
use std::sync::Arc;

use crate::crd::{Schema, SchemaRegistry};

/// Registries whose credentials come from `secret`
pub fn registries_for_secret<'a, I>(registries: I, secret: &Secret) -> Vec<ObjectRef<SchemaRegistry>>
where
    I: IntoIterator<Item = &'a Arc<SchemaRegistry>>,
{
    let (Some(secret_name), Some(secret_namespace)) =
        (secret.metadata.name.as_deref(), secret.metadata.namespace.as_deref())
    else {
        return Vec::new();
    };

    registries
        .into_iter()
        .filter(|registry| registry.namespace().as_deref() == Some(secret_namespace))
        .filter(|registry| {
            registry
                .spec
                .auth
                .as_ref()
                .is_some_and(|auth| auth.references_secret(secret_name))
        })
        .map(|registry| ObjectRef::from_obj(registry.as_ref()))
        .collect()
}

/// Schemas registered against `registry`
pub fn schemas_for_registry<'a, I>(schemas: I, registry: &SchemaRegistry) -> Vec<ObjectRef<Schema>>
where
    I: IntoIterator<Item = &'a Arc<Schema>>,
{
    let registry_name = registry.name_any();
    let Some(registry_namespace) = registry.namespace() else {
        return Vec::new();
    };

    schemas
        .into_iter()
        .filter(|schema| {
            let schema_namespace = schema.namespace().unwrap_or_default();
            let registry_ref = &schema.spec.registry_ref;
            registry_ref.name == registry_name
                && registry_ref.effective_namespace(&schema_namespace) == registry_namespace
        })
        .map(|schema| ObjectRef::from_obj(schema.as_ref()))
        .collect()
}
