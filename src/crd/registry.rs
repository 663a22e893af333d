//! # SchemaRegistry Spec
//!
//! Connection settings for one Schema Registry endpoint.

use serde::{Deserialize, Serialize};

/// SchemaRegistry Custom Resource Definition
///
/// Declares how to reach a Confluent-compatible Schema Registry. The controller
/// probes it periodically and publishes the outcome in status.
///
/// # Example
///
/// ```yaml
/// apiVersion: registry.strimzi.io/v1alpha1
/// kind: SchemaRegistry
/// metadata:
///   name: main
///   namespace: kafka
/// spec:
///   url: https://schema-registry.kafka.svc:8081
///   auth:
///     type: BASIC
///     secretRef: schema-registry-credentials
///   timeout: 10
/// ```
#[derive(kube::CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "SchemaRegistry",
    group = "registry.strimzi.io",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::SchemaRegistryStatus",
    shortname = "sr",
    printcolumn = r#"{"name":"URL", "type":"string", "jsonPath":".spec.url"}, {"name":"Connection", "type":"string", "jsonPath":".status.connectionStatus"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Last Checked", "type":"date", "jsonPath":".status.lastChecked"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRegistrySpec {
    /// Base URL of the registry, e.g. `http://schema-registry:8081`
    pub url: String,
    /// Authentication strategy; absent means no authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<RegistryAuth>,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure_skip_verify: bool,
    /// Request timeout in seconds; absent or 0 uses the controller default (30s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Authentication strategy for a registry
///
/// Secrets are looked up in the SchemaRegistry's own namespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistryAuth {
    None,
    /// Secret keys: `username`, `password`
    #[serde(rename_all = "camelCase")]
    Basic { secret_ref: String },
    /// Secret key: `token`
    #[serde(rename_all = "camelCase")]
    Bearer { secret_ref: String },
    /// Secret keys: `tls.crt`, `tls.key`; optional CA secret key `ca.crt`
    #[serde(rename_all = "camelCase")]
    Mtls {
        cert_secret_ref: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ca_secret_ref: Option<String>,
    },
}

impl RegistryAuth {
    /// Wire name of the strategy
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryAuth::None => "NONE",
            RegistryAuth::Basic { .. } => "BASIC",
            RegistryAuth::Bearer { .. } => "BEARER",
            RegistryAuth::Mtls { .. } => "MTLS",
        }
    }

    /// Names of every secret this strategy reads
    #[must_use]
    pub fn secret_names(&self) -> Vec<&str> {
        match self {
            RegistryAuth::None => Vec::new(),
            RegistryAuth::Basic { secret_ref } | RegistryAuth::Bearer { secret_ref } => {
                vec![secret_ref.as_str()]
            }
            RegistryAuth::Mtls {
                cert_secret_ref,
                ca_secret_ref,
            } => std::iter::once(cert_secret_ref.as_str())
                .chain(ca_secret_ref.as_deref())
                .collect(),
        }
    }

    /// Whether `secret_name` is referenced by this strategy
    #[must_use]
    pub fn references_secret(&self, secret_name: &str) -> bool {
        self.secret_names()
            .iter()
            .any(|name| !name.is_empty() && *name == secret_name)
    }
}
