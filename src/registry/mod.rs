//! # Schema Registry Client
//!
//! Client for the Confluent-compatible Schema Registry REST API.
//!
//! This module provides:
//! - [`SchemaRegistryApi`], the seam the reconcilers call through
//! - [`SchemaRegistryClient`], the `reqwest` implementation bound to one endpoint
//! - Request/response bodies and the [`RegistryError`] classification
//!
//! Wire contract:
//!
//! | Operation         | Request                                   | Success      |
//! |-------------------|-------------------------------------------|--------------|
//! | Health check      | `GET /subjects`                           | 200          |
//! | Register schema   | `POST /subjects/{subject}/versions`       | 200 `{id}`   |
//! | Latest version    | `GET /subjects/{subject}/versions/latest` | 200          |
//! | Set compatibility | `PUT /config/{subject}`                   | 200          |
//! | Delete subject    | `DELETE /subjects/{subject}`              | 200 or 404   |

mod client;
mod error;
mod requests;
mod responses;

use async_trait::async_trait;

pub use client::SchemaRegistryClient;
pub use error::RegistryError;
pub use requests::{CompatibilityRequest, RegisterSchemaRequest, SchemaReferenceBody};
pub use responses::{RegisterSchemaResponse, SchemaVersionResponse};

/// Outcome of a successful registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterResult {
    /// Globally unique schema ID assigned by the registry
    pub id: i64,
    /// Latest version under the subject; `None` when the follow-up lookup failed
    pub version: Option<i64>,
}

/// Operations the controller performs against a Schema Registry
#[async_trait]
pub trait SchemaRegistryApi: Send + Sync {
    /// Probe reachability and authorization
    async fn health_check(&self) -> Result<(), RegistryError>;

    /// Register `request` under `subject`
    ///
    /// Registering content that already exists returns the existing ID.
    async fn register_schema(
        &self,
        subject: &str,
        request: &RegisterSchemaRequest,
    ) -> Result<RegisterResult, RegistryError>;

    /// Set the compatibility level of `subject`
    async fn set_compatibility(&self, subject: &str, level: &str) -> Result<(), RegistryError>;

    /// Delete every version of `subject`; an unknown subject is not an error
    async fn delete_subject(&self, subject: &str) -> Result<(), RegistryError>;
}
