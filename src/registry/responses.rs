//! # Response Types
//!
//! Schema Registry REST API response bodies. Unknown fields are ignored.

use serde::Deserialize;

/// Body returned by `POST /subjects/{subject}/versions`
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterSchemaResponse {
    pub id: i64,
}

/// Body returned by `GET /subjects/{subject}/versions/latest`
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaVersionResponse {
    pub id: i64,
    pub version: i64,
    #[serde(default)]
    #[allow(dead_code, reason = "part of the response contract, not read by the controller")]
    pub schema: Option<String>,
}
