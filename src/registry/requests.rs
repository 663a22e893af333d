//! # Request Types
//!
//! Schema Registry REST API request bodies.
//!
//! All bodies are sent with `Content-Type: application/vnd.schemaregistry.v1+json`.

use serde::Serialize;

use crate::crd::{SchemaReference, SchemaSpec};

/// Body of `POST /subjects/{subject}/versions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSchemaRequest {
    /// Schema document as text
    pub schema: String,
    /// `AVRO`, `JSON` or `PROTOBUF`
    pub schema_type: String,
    /// Omitted from the body when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SchemaReferenceBody>,
}

/// Reference entry inside a register request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaReferenceBody {
    pub name: String,
    pub subject: String,
    pub version: i32,
}

impl From<&SchemaReference> for SchemaReferenceBody {
    fn from(reference: &SchemaReference) -> Self {
        Self {
            name: reference.name.clone(),
            subject: reference.subject.clone(),
            version: reference.version,
        }
    }
}

impl From<&SchemaSpec> for RegisterSchemaRequest {
    fn from(spec: &SchemaSpec) -> Self {
        Self {
            schema: spec.schema.clone(),
            schema_type: spec.schema_type.as_str().to_string(),
            references: spec.references.iter().map(SchemaReferenceBody::from).collect(),
        }
    }
}

/// Body of `PUT /config/{subject}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityRequest {
    pub compatibility: String,
}
