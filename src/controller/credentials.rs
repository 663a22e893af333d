//! # Credential Resolver
//!
//! Turns a `SchemaRegistry` auth strategy plus its secret references into a
//! transport-ready [`CredentialBundle`].
//!
//! Secrets are read from the registry's own namespace on every reconcile.
//! Nothing is cached, so a rotated secret takes effect on the next reconcile.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

use crate::constants::{
    SECRET_KEY_CA_CERT, SECRET_KEY_PASSWORD, SECRET_KEY_TLS_CERT, SECRET_KEY_TLS_KEY,
    SECRET_KEY_TOKEN, SECRET_KEY_USERNAME,
};
use crate::crd::RegistryAuth;

/// Byte-valued data map of a Kubernetes Secret
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// Namespace-scoped secret reads
///
/// `Ok(None)` means the secret does not exist.
#[async_trait]
pub trait SecretLookup: Send + Sync {
    async fn get_secret_data(&self, namespace: &str, name: &str) -> Result<Option<SecretData>>;
}

#[async_trait]
impl SecretLookup for Client {
    async fn get_secret_data(&self, namespace: &str, name: &str) -> Result<Option<SecretData>> {
        let secrets: Api<Secret> = Api::namespaced(self.clone(), namespace);
        let secret = secrets.get_opt(name).await?;
        Ok(secret.map(|secret| {
            secret
                .data
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, value.0))
                .collect()
        }))
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("auth type {auth_type} requires a non-empty {field}")]
    MissingAuthConfig {
        auth_type: &'static str,
        field: &'static str,
    },

    #[error("secret {namespace}/{name} not found")]
    SecretNotFound { namespace: String, name: String },

    #[error("secret {secret} has no key {key:?}")]
    MissingKey { secret: String, key: &'static str },

    #[error("secret {secret} key {key:?} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        secret: String,
        key: &'static str,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("secret {secret} holds an unusable certificate: {message}")]
    InvalidCertificate { secret: String, message: String },

    #[error("failed to read secret {secret}: {message}")]
    Lookup { secret: String, message: String },
}

impl CredentialError {
    /// True when fixing the resource or its secrets is required, false for
    /// transient API failures.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, CredentialError::Lookup { .. })
    }
}

/// Resolved credentials for one registry, owned by a single reconcile
///
/// Text secrets are wiped from memory when the bundle is dropped.
pub enum CredentialBundle {
    None,
    Basic {
        username: Zeroizing<String>,
        password: Zeroizing<String>,
    },
    Bearer {
        token: Zeroizing<String>,
    },
    Mtls {
        identity: reqwest::Identity,
        ca_certificates: Vec<reqwest::Certificate>,
    },
}

impl CredentialBundle {
    /// Wire name of the strategy the bundle was resolved from
    #[must_use]
    pub fn auth_type(&self) -> &'static str {
        match self {
            CredentialBundle::None => "NONE",
            CredentialBundle::Basic { .. } => "BASIC",
            CredentialBundle::Bearer { .. } => "BEARER",
            CredentialBundle::Mtls { .. } => "MTLS",
        }
    }
}

impl std::fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialBundle::None => f.write_str("CredentialBundle::None"),
            CredentialBundle::Basic { username, .. } => f
                .debug_struct("CredentialBundle::Basic")
                .field("username", &username.as_str())
                .field("password", &"***")
                .finish(),
            CredentialBundle::Bearer { .. } => f
                .debug_struct("CredentialBundle::Bearer")
                .field("token", &"***")
                .finish(),
            CredentialBundle::Mtls {
                ca_certificates, ..
            } => f
                .debug_struct("CredentialBundle::Mtls")
                .field("identity", &"***")
                .field("ca_certificates", &ca_certificates.len())
                .finish(),
        }
    }
}

/// Resolve the credentials for `auth` from secrets in `namespace`
///
/// An absent auth block is the same as `NONE`.
///
/// # Errors
///
/// Returns a [`CredentialError`]; every variant except `Lookup` is a
/// configuration problem.
pub async fn resolve_credentials<L>(
    lookup: &L,
    namespace: &str,
    auth: Option<&RegistryAuth>,
) -> Result<CredentialBundle, CredentialError>
where
    L: SecretLookup + ?Sized,
{
    let Some(auth) = auth else {
        return Ok(CredentialBundle::None);
    };

    debug!(auth.r#type = auth.as_str(), namespace, "Resolving registry credentials");

    match auth {
        RegistryAuth::None => Ok(CredentialBundle::None),
        RegistryAuth::Basic { secret_ref } => {
            require_ref("BASIC", "secretRef", secret_ref)?;
            let data = fetch_secret(lookup, namespace, secret_ref).await?;
            Ok(CredentialBundle::Basic {
                username: text_value(&data, secret_ref, SECRET_KEY_USERNAME)?,
                password: text_value(&data, secret_ref, SECRET_KEY_PASSWORD)?,
            })
        }
        RegistryAuth::Bearer { secret_ref } => {
            require_ref("BEARER", "secretRef", secret_ref)?;
            let data = fetch_secret(lookup, namespace, secret_ref).await?;
            Ok(CredentialBundle::Bearer {
                token: text_value(&data, secret_ref, SECRET_KEY_TOKEN)?,
            })
        }
        RegistryAuth::Mtls {
            cert_secret_ref,
            ca_secret_ref,
        } => {
            require_ref("MTLS", "certSecretRef", cert_secret_ref)?;
            let data = fetch_secret(lookup, namespace, cert_secret_ref).await?;
            let identity = client_identity(&data, cert_secret_ref)?;

            let ca_certificates = match ca_secret_ref.as_deref().filter(|name| !name.is_empty()) {
                Some(ca_ref) => {
                    let ca_data = fetch_secret(lookup, namespace, ca_ref).await?;
                    ca_bundle(&ca_data, ca_ref)?
                }
                None => Vec::new(),
            };

            Ok(CredentialBundle::Mtls {
                identity,
                ca_certificates,
            })
        }
    }
}

fn require_ref(
    auth_type: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), CredentialError> {
    if value.trim().is_empty() {
        return Err(CredentialError::MissingAuthConfig { auth_type, field });
    }
    Ok(())
}

async fn fetch_secret<L>(
    lookup: &L,
    namespace: &str,
    name: &str,
) -> Result<SecretData, CredentialError>
where
    L: SecretLookup + ?Sized,
{
    match lookup.get_secret_data(namespace, name).await {
        Ok(Some(data)) => Ok(data),
        Ok(None) => Err(CredentialError::SecretNotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }),
        Err(e) => Err(CredentialError::Lookup {
            secret: format!("{namespace}/{name}"),
            message: format!("{e:#}"),
        }),
    }
}

fn raw_value<'a>(
    data: &'a SecretData,
    secret: &str,
    key: &'static str,
) -> Result<&'a [u8], CredentialError> {
    data.get(key)
        .map(Vec::as_slice)
        .ok_or_else(|| CredentialError::MissingKey {
            secret: secret.to_string(),
            key,
        })
}

fn text_value(
    data: &SecretData,
    secret: &str,
    key: &'static str,
) -> Result<Zeroizing<String>, CredentialError> {
    let bytes = raw_value(data, secret, key)?;
    let text = std::str::from_utf8(bytes).map_err(|source| CredentialError::InvalidUtf8 {
        secret: secret.to_string(),
        key,
        source,
    })?;
    Ok(Zeroizing::new(text.to_string()))
}

fn client_identity(data: &SecretData, secret: &str) -> Result<reqwest::Identity, CredentialError> {
    let cert = raw_value(data, secret, SECRET_KEY_TLS_CERT)?;
    let key = raw_value(data, secret, SECRET_KEY_TLS_KEY)?;

    // rustls wants certificate chain and private key in one PEM buffer
    let mut pem = Zeroizing::new(Vec::with_capacity(cert.len() + key.len() + 1));
    pem.extend_from_slice(cert);
    if !cert.ends_with(b"\n") {
        pem.push(b'\n');
    }
    pem.extend_from_slice(key);

    reqwest::Identity::from_pem(&pem).map_err(|e| CredentialError::InvalidCertificate {
        secret: secret.to_string(),
        message: e.to_string(),
    })
}

fn ca_bundle(data: &SecretData, secret: &str) -> Result<Vec<reqwest::Certificate>, CredentialError> {
    // A CA secret without ca.crt leaves the default trust roots in place
    let Some(pem) = data.get(SECRET_KEY_CA_CERT) else {
        return Ok(Vec::new());
    };

    let certificates =
        reqwest::Certificate::from_pem_bundle(pem).map_err(|e| CredentialError::InvalidCertificate {
            secret: secret.to_string(),
            message: e.to_string(),
        })?;

    if certificates.is_empty() {
        return Err(CredentialError::InvalidCertificate {
            secret: secret.to_string(),
            message: format!("{SECRET_KEY_CA_CERT} contains no PEM certificates"),
        });
    }

    Ok(certificates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct InMemorySecrets {
        secrets: HashMap<(String, String), SecretData>,
        failing: bool,
    }

    impl InMemorySecrets {
        fn with(mut self, namespace: &str, name: &str, entries: &[(&str, &[u8])]) -> Self {
            let data = entries
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.to_vec()))
                .collect();
            self.secrets
                .insert((namespace.to_string(), name.to_string()), data);
            self
        }
    }

    #[async_trait]
    impl SecretLookup for InMemorySecrets {
        async fn get_secret_data(&self, namespace: &str, name: &str) -> Result<Option<SecretData>> {
            if self.failing {
                anyhow::bail!("secrets is forbidden");
            }
            Ok(self
                .secrets
                .get(&(namespace.to_string(), name.to_string()))
                .cloned())
        }
    }

    #[tokio::test]
    async fn test_absent_and_none_auth_resolve_to_empty_bundle() {
        let lookup = InMemorySecrets::default();
        let absent = resolve_credentials(&lookup, "kafka", None).await.unwrap();
        assert!(matches!(absent, CredentialBundle::None));

        let none = resolve_credentials(&lookup, "kafka", Some(&RegistryAuth::None))
            .await
            .unwrap();
        assert_eq!(none.auth_type(), "NONE");
    }

    #[tokio::test]
    async fn test_basic_reads_username_and_password() {
        let lookup = InMemorySecrets::default().with(
            "kafka",
            "creds",
            &[("username", b"svc"), ("password", b"s3cret")],
        );
        let auth = RegistryAuth::Basic {
            secret_ref: "creds".to_string(),
        };

        match resolve_credentials(&lookup, "kafka", Some(&auth)).await.unwrap() {
            CredentialBundle::Basic { username, password } => {
                assert_eq!(username.as_str(), "svc");
                assert_eq!(password.as_str(), "s3cret");
            }
            other => panic!("unexpected bundle: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_secrets_are_read_from_registry_namespace_only() {
        let lookup = InMemorySecrets::default().with("other", "token", &[("token", b"abc")]);
        let auth = RegistryAuth::Bearer {
            secret_ref: "token".to_string(),
        };

        let err = resolve_credentials(&lookup, "kafka", Some(&auth))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::SecretNotFound { .. }));
        assert!(err.is_configuration_error());
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let lookup = InMemorySecrets::default().with("kafka", "creds", &[("username", b"svc")]);
        let auth = RegistryAuth::Basic {
            secret_ref: "creds".to_string(),
        };

        let err = resolve_credentials(&lookup, "kafka", Some(&auth))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CredentialError::MissingKey {
                key: "password",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_non_utf8_token_is_rejected() {
        let lookup = InMemorySecrets::default().with("kafka", "token", &[("token", &[0xff, 0xfe])]);
        let auth = RegistryAuth::Bearer {
            secret_ref: "token".to_string(),
        };

        let err = resolve_credentials(&lookup, "kafka", Some(&auth))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidUtf8 { key: "token", .. }));
        assert!(err.to_string().contains("index 0"));
    }

    #[tokio::test]
    async fn test_empty_secret_ref_is_rejected_before_lookup() {
        let lookup = InMemorySecrets {
            failing: true,
            ..Default::default()
        };
        let auth = RegistryAuth::Basic {
            secret_ref: String::new(),
        };

        let err = resolve_credentials(&lookup, "kafka", Some(&auth))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::MissingAuthConfig { .. }));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_not_configuration_error() {
        let lookup = InMemorySecrets {
            failing: true,
            ..Default::default()
        };
        let auth = RegistryAuth::Bearer {
            secret_ref: "token".to_string(),
        };

        let err = resolve_credentials(&lookup, "kafka", Some(&auth))
            .await
            .unwrap_err();
        assert!(!err.is_configuration_error());
        assert!(err.to_string().contains("forbidden"));
    }

    #[tokio::test]
    async fn test_malformed_client_certificate_is_rejected() {
        let lookup = InMemorySecrets::default().with(
            "kafka",
            "client-cert",
            &[("tls.crt", b"not a certificate"), ("tls.key", b"not a key")],
        );
        let auth = RegistryAuth::Mtls {
            cert_secret_ref: "client-cert".to_string(),
            ca_secret_ref: None,
        };

        let err = resolve_credentials(&lookup, "kafka", Some(&auth))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCertificate { .. }));
    }

    #[tokio::test]
    async fn test_mtls_requires_both_key_and_certificate() {
        let lookup =
            InMemorySecrets::default().with("kafka", "client-cert", &[("tls.crt", b"pem")]);
        let auth = RegistryAuth::Mtls {
            cert_secret_ref: "client-cert".to_string(),
            ca_secret_ref: None,
        };

        let err = resolve_credentials(&lookup, "kafka", Some(&auth))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CredentialError::MissingKey { key: "tls.key", .. }
        ));
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let bundle = CredentialBundle::Basic {
            username: Zeroizing::new("svc".to_string()),
            password: Zeroizing::new("s3cret".to_string()),
        };
        let rendered = format!("{bundle:?}");
        assert!(rendered.contains("svc"));
        assert!(!rendered.contains("s3cret"));
    }
}
