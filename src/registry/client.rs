//! # Schema Registry REST Client
//!
//! `reqwest` client bound to one registry endpoint and one credential bundle.
//!
//! The client holds no state between calls besides the connection pool.
//! Every call is a future, so dropping it aborts the in-flight request.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use tracing::{debug, info_span, warn, Instrument};
use zeroize::Zeroizing;

use super::requests::{CompatibilityRequest, RegisterSchemaRequest};
use super::responses::{RegisterSchemaResponse, SchemaVersionResponse};
use super::{RegisterResult, RegistryError, SchemaRegistryApi};
use crate::constants::SCHEMA_REGISTRY_CONTENT_TYPE;
use crate::controller::credentials::CredentialBundle;
use crate::observability::metrics;

/// Schema Registry REST client
pub struct SchemaRegistryClient {
    http_client: Client,
    base_url: Url,
}

impl std::fmt::Debug for SchemaRegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistryClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SchemaRegistryClient {
    /// Create a client for `base_url`
    ///
    /// Basic and bearer credentials become a default `Authorization` header;
    /// an mTLS identity and CA certificates are installed in the TLS layer.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidEndpoint`] when the URL is not an
    /// absolute `http(s)` URL or the TLS material is rejected.
    pub fn new(
        base_url: &str,
        credentials: CredentialBundle,
        timeout: Duration,
        insecure_skip_verify: bool,
    ) -> Result<Self, RegistryError> {
        let base_url = parse_base_url(base_url)?;

        let mut builder = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .danger_accept_invalid_certs(insecure_skip_verify);

        match credentials {
            CredentialBundle::None => {}
            CredentialBundle::Basic { username, password } => {
                let raw = Zeroizing::new(format!("{}:{}", username.as_str(), password.as_str()));
                let value = Zeroizing::new(format!(
                    "Basic {}",
                    general_purpose::STANDARD.encode(raw.as_bytes())
                ));
                builder = builder.default_headers(authorization_header(&value)?);
            }
            CredentialBundle::Bearer { token } => {
                let value = Zeroizing::new(format!("Bearer {}", token.as_str()));
                builder = builder.default_headers(authorization_header(&value)?);
            }
            CredentialBundle::Mtls {
                identity,
                ca_certificates,
            } => {
                builder = builder.identity(identity);
                for certificate in ca_certificates {
                    builder = builder.add_root_certificate(certificate);
                }
            }
        }

        let http_client = builder
            .build()
            .map_err(|e| RegistryError::InvalidEndpoint(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Base URL of the registry (for testing)
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build `base_url` + `segments`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                RegistryError::InvalidEndpoint(format!(
                    "{} cannot be used as a base URL",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http_client.request(method, url)
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, RegistryError> {
        request
            .send()
            .await
            .map_err(|source| RegistryError::Transport { operation, source })
    }

    async fn status_error(operation: &'static str, response: Response) -> RegistryError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        RegistryError::Status {
            operation,
            status,
            body,
        }
    }

    /// Latest version registered under `subject`
    async fn latest_version(&self, subject: &str) -> Result<SchemaVersionResponse, RegistryError> {
        const OPERATION: &str = "get_latest_version";
        let url = self.endpoint(&["subjects", subject, "versions", "latest"])?;
        let response = self.send(OPERATION, self.request(Method::GET, url)).await?;

        if response.status() != StatusCode::OK {
            return Err(Self::status_error(OPERATION, response).await);
        }

        response
            .json::<SchemaVersionResponse>()
            .await
            .map_err(|source| RegistryError::Decode {
                operation: OPERATION,
                source,
            })
    }
}

#[async_trait]
impl SchemaRegistryApi for SchemaRegistryClient {
    async fn health_check(&self) -> Result<(), RegistryError> {
        const OPERATION: &str = "health_check";
        let span = info_span!("registry.health_check", registry.url = self.base_url.as_str());

        timed(OPERATION, async {
            let url = self.endpoint(&["subjects"])?;
            let response = self.send(OPERATION, self.request(Method::GET, url)).await?;
            if response.status() != StatusCode::OK {
                return Err(Self::status_error(OPERATION, response).await);
            }
            Ok(())
        })
        .instrument(span)
        .await
    }

    async fn register_schema(
        &self,
        subject: &str,
        request: &RegisterSchemaRequest,
    ) -> Result<RegisterResult, RegistryError> {
        const OPERATION: &str = "register_schema";
        let span = info_span!(
            "registry.register_schema",
            registry.url = self.base_url.as_str(),
            schema.subject = subject,
            schema.r#type = request.schema_type.as_str()
        );

        async {
            let registered = timed(OPERATION, async {
                let url = self.endpoint(&["subjects", subject, "versions"])?;
                let response = self
                    .send(
                        OPERATION,
                        self.request(Method::POST, url)
                            .header(CONTENT_TYPE, SCHEMA_REGISTRY_CONTENT_TYPE)
                            .json(request),
                    )
                    .await?;

                if !response.status().is_success() {
                    return Err(Self::status_error(OPERATION, response).await);
                }

                response
                    .json::<RegisterSchemaResponse>()
                    .await
                    .map_err(|source| RegistryError::Decode {
                        operation: OPERATION,
                        source,
                    })
            })
            .await?;

            // The register response carries only the ID; the version needs a second read
            let version = match timed("get_latest_version", self.latest_version(subject)).await {
                Ok(latest) => {
                    if latest.id != registered.id {
                        debug!(
                            schema.id = registered.id,
                            latest.id = latest.id,
                            "Latest version belongs to a different schema ID"
                        );
                    }
                    Some(latest.version)
                }
                Err(e) => {
                    warn!(error = %e, "Registered schema but could not read its version");
                    None
                }
            };

            Ok(RegisterResult {
                id: registered.id,
                version,
            })
        }
        .instrument(span)
        .await
    }

    async fn set_compatibility(&self, subject: &str, level: &str) -> Result<(), RegistryError> {
        const OPERATION: &str = "set_compatibility";
        let span = info_span!(
            "registry.set_compatibility",
            registry.url = self.base_url.as_str(),
            schema.subject = subject,
            compatibility = level
        );

        timed(OPERATION, async {
            let url = self.endpoint(&["config", subject])?;
            let body = CompatibilityRequest {
                compatibility: level.to_string(),
            };
            let response = self
                .send(
                    OPERATION,
                    self.request(Method::PUT, url)
                        .header(CONTENT_TYPE, SCHEMA_REGISTRY_CONTENT_TYPE)
                        .json(&body),
                )
                .await?;

            if !response.status().is_success() {
                return Err(Self::status_error(OPERATION, response).await);
            }
            Ok(())
        })
        .instrument(span)
        .await
    }

    async fn delete_subject(&self, subject: &str) -> Result<(), RegistryError> {
        const OPERATION: &str = "delete_subject";
        let span = info_span!(
            "registry.delete_subject",
            registry.url = self.base_url.as_str(),
            schema.subject = subject
        );

        timed(OPERATION, async {
            let url = self.endpoint(&["subjects", subject])?;
            let response = self
                .send(OPERATION, self.request(Method::DELETE, url))
                .await?;

            // Already gone
            if response.status() == StatusCode::NOT_FOUND {
                debug!("Subject does not exist, nothing to delete");
                return Ok(());
            }
            if !response.status().is_success() {
                return Err(Self::status_error(OPERATION, response).await);
            }
            Ok(())
        })
        .instrument(span)
        .await
    }
}

/// Run `call` and record its outcome and duration
async fn timed<T, F>(operation: &'static str, call: F) -> Result<T, RegistryError>
where
    F: std::future::Future<Output = Result<T, RegistryError>>,
{
    let start = Instant::now();
    let result = call.await;
    let outcome = match &result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    metrics::record_registry_operation(operation, outcome, start.elapsed().as_secs_f64());
    result
}

fn parse_base_url(raw: &str) -> Result<Url, RegistryError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| RegistryError::InvalidEndpoint(format!("{raw:?} is not a valid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(RegistryError::InvalidEndpoint(format!(
            "{raw:?} must use http or https"
        )));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(RegistryError::InvalidEndpoint(format!(
            "{raw:?} has no host"
        )));
    }
    Ok(url)
}

fn authorization_header(value: &str) -> Result<HeaderMap, RegistryError> {
    let mut header = HeaderValue::from_str(value).map_err(|e| {
        RegistryError::InvalidEndpoint(format!(
            "credentials contain characters not allowed in an HTTP header: {e}"
        ))
    })?;
    header.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, header);
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> SchemaRegistryClient {
        SchemaRegistryClient::new(url, CredentialBundle::None, Duration::from_secs(5), false)
            .unwrap()
    }

    #[test]
    fn test_rejects_malformed_urls() {
        for url in ["", "schema-registry:8081", "ftp://registry", "not a url"] {
            let result =
                SchemaRegistryClient::new(url, CredentialBundle::None, Duration::from_secs(5), false);
            assert!(
                matches!(result, Err(RegistryError::InvalidEndpoint(_))),
                "{url:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_subject_is_a_single_encoded_segment() {
        let client = client("http://registry:8081");
        let url = client
            .endpoint(&["subjects", "team/orders value", "versions"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://registry:8081/subjects/team%2Forders%20value/versions"
        );
    }

    #[test]
    fn test_base_path_and_trailing_slash_are_preserved() {
        let client = client("https://gateway.example.com/registry/");
        let url = client.endpoint(&["config", "users-value"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gateway.example.com/registry/config/users-value"
        );
    }

    #[test]
    fn test_header_rejects_control_characters() {
        let err = authorization_header("Bearer abc\ndef").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidEndpoint(ref message)
            if message.contains("not allowed in an HTTP header: ")));
        assert!(authorization_header("Bearer abc").is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_registry_is_transport_error() {
        let client = SchemaRegistryClient::new(
            "http://127.0.0.1:1",
            CredentialBundle::None,
            Duration::from_secs(2),
            false,
        )
        .unwrap();

        let err = client.health_check().await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Transport {
                operation: "health_check",
                ..
            }
        ));
    }
}
