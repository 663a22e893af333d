//! # Registry Client Construction
//!
//! Validate a `SchemaRegistry`, resolve its credentials, and bind a
//! [`SchemaRegistryClient`] to it. Shared by the connectivity probe and the
//! schema lifecycle.

use kube::{Api, Client, ResourceExt};
use thiserror::Error;
use tracing::debug;

use super::validation::{validate_registry_spec, FieldErrors};
use crate::config::ControllerConfig;
use crate::controller::credentials::{resolve_credentials, CredentialError, SecretLookup};
use crate::crd::{Schema, SchemaRegistry};
use crate::registry::{RegistryError, SchemaRegistryClient};

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid SchemaRegistry spec: {0}")]
    InvalidSpec(FieldErrors),

    #[error("SchemaRegistry {namespace}/{name} not found")]
    RegistryNotFound { namespace: String, name: String },

    #[error("failed to get SchemaRegistry: {0}")]
    RegistryLookup(#[source] kube::Error),

    #[error("failed to load auth config: {0}")]
    Credentials(#[from] CredentialError),

    #[error("failed to create Schema Registry client: {0}")]
    Client(#[from] RegistryError),
}

impl ClientBuildError {
    /// Whether retrying without a change to any resource could succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ClientBuildError::RegistryLookup(_) => true,
            ClientBuildError::Credentials(e) => !e.is_configuration_error(),
            ClientBuildError::InvalidSpec(_)
            | ClientBuildError::RegistryNotFound { .. }
            | ClientBuildError::Client(_) => false,
        }
    }

    /// Short label for logs and metrics
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ClientBuildError::InvalidSpec(_) => "invalid_spec",
            ClientBuildError::RegistryNotFound { .. } => "registry_not_found",
            ClientBuildError::RegistryLookup(_) => "registry_lookup",
            ClientBuildError::Credentials(_) => "credentials",
            ClientBuildError::Client(_) => "client",
        }
    }
}

/// Build a client for `registry` using secrets from its namespace
///
/// # Errors
///
/// Fails on an invalid spec, unresolvable credentials, or a malformed endpoint.
pub async fn build_registry_client<L>(
    lookup: &L,
    registry: &SchemaRegistry,
    config: &ControllerConfig,
) -> Result<SchemaRegistryClient, ClientBuildError>
where
    L: SecretLookup + ?Sized,
{
    validate_registry_spec(&registry.spec).map_err(ClientBuildError::InvalidSpec)?;

    let namespace = registry.namespace().unwrap_or_default();
    let credentials = resolve_credentials(lookup, &namespace, registry.spec.auth.as_ref()).await?;
    debug!(
        registry.name = %registry.name_any(),
        auth.r#type = credentials.auth_type(),
        "Resolved registry credentials"
    );

    let client = SchemaRegistryClient::new(
        &registry.spec.url,
        credentials,
        config.registry_timeout(registry.spec.timeout),
        registry.spec.insecure_skip_verify,
    )?;
    Ok(client)
}

/// Fetch the `SchemaRegistry` a `Schema` points at
///
/// # Errors
///
/// [`ClientBuildError::RegistryNotFound`] when it does not exist, and
/// [`ClientBuildError::RegistryLookup`] for any other API failure.
pub async fn fetch_referenced_registry(
    client: &Client,
    schema: &Schema,
) -> Result<SchemaRegistry, ClientBuildError> {
    let schema_namespace = schema.namespace().unwrap_or_default();
    let registry_ref = &schema.spec.registry_ref;
    let namespace = registry_ref.effective_namespace(&schema_namespace);

    let registries: Api<SchemaRegistry> = Api::namespaced(client.clone(), namespace);
    match registries.get_opt(&registry_ref.name).await {
        Ok(Some(registry)) => Ok(registry),
        Ok(None) => Err(ClientBuildError::RegistryNotFound {
            namespace: namespace.to_string(),
            name: registry_ref.name.clone(),
        }),
        Err(e) => Err(ClientBuildError::RegistryLookup(e)),
    }
}

/// Resolve the registry referenced by `schema` and build a client for it
///
/// # Errors
///
/// See [`fetch_referenced_registry`] and [`build_registry_client`].
pub async fn client_for_schema(
    client: &Client,
    schema: &Schema,
    config: &ControllerConfig,
) -> Result<SchemaRegistryClient, ClientBuildError> {
    let registry = fetch_referenced_registry(client, schema).await?;
    build_registry_client(client, &registry, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::credentials::SecretData;
    use crate::crd::{RegistryAuth, SchemaRegistrySpec};
    use async_trait::async_trait;

    struct NoSecrets;

    #[async_trait]
    impl SecretLookup for NoSecrets {
        async fn get_secret_data(
            &self,
            _namespace: &str,
            _name: &str,
        ) -> anyhow::Result<Option<SecretData>> {
            Ok(None)
        }
    }

    fn registry(url: &str, auth: Option<RegistryAuth>) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new(
            "main",
            SchemaRegistrySpec {
                url: url.to_string(),
                auth,
                insecure_skip_verify: false,
                timeout: None,
            },
        );
        registry.metadata.namespace = Some("kafka".to_string());
        registry
    }

    #[tokio::test]
    async fn test_invalid_spec_is_rejected_before_secrets_are_read() {
        let err = build_registry_client(&NoSecrets, &registry("", None), &ControllerConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientBuildError::InvalidSpec(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_missing_secret_is_a_credentials_error() {
        let err = build_registry_client(
            &NoSecrets,
            &registry(
                "http://registry:8081",
                Some(RegistryAuth::Basic {
                    secret_ref: "creds".to_string(),
                }),
            ),
            &ControllerConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ClientBuildError::Credentials(CredentialError::SecretNotFound { .. })
        ));
        assert_eq!(err.reason(), "credentials");
    }

    #[tokio::test]
    async fn test_anonymous_registry_builds() {
        let client = build_registry_client(
            &NoSecrets,
            &registry("https://registry.example.com/api/", None),
            &ControllerConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(client.base_url(), "https://registry.example.com/api/");
    }
}
