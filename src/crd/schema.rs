//! # Schema Spec
//!
//! One subject registered in a Schema Registry.

use serde::{Deserialize, Serialize};

/// Schema Custom Resource Definition
///
/// Registers `schema` under `subject` in the registry named by `registryRef`.
/// Deleting the resource deletes the subject from the registry.
///
/// # Example
///
/// ```yaml
/// apiVersion: registry.strimzi.io/v1alpha1
/// kind: Schema
/// metadata:
///   name: users-value
///   namespace: kafka
/// spec:
///   subject: users-value
///   schemaType: AVRO
///   schema: |
///     {"type":"record","name":"User","fields":[{"name":"id","type":"string"}]}
///   registryRef:
///     name: main
///   compatibilityLevel: BACKWARD
/// ```
#[derive(kube::CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Schema",
    group = "registry.strimzi.io",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::SchemaStatus",
    shortname = "sch",
    printcolumn = r#"{"name":"Subject", "type":"string", "jsonPath":".spec.subject"}, {"name":"Type", "type":"string", "jsonPath":".spec.schemaType"}, {"name":"ID", "type":"integer", "jsonPath":".status.schemaId"}, {"name":"Version", "type":"integer", "jsonPath":".status.version"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSpec {
    /// Registry subject name; immutable once created
    pub subject: String,
    /// Schema format; immutable once created
    #[serde(default)]
    pub schema_type: SchemaType,
    /// Schema document as text
    pub schema: String,
    /// Schemas this one imports, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SchemaReference>,
    /// SchemaRegistry to register against
    pub registry_ref: SchemaRegistryRef,
    /// Compatibility rule applied to the subject after registration.
    /// One of BACKWARD, BACKWARD_TRANSITIVE, FORWARD, FORWARD_TRANSITIVE,
    /// FULL, FULL_TRANSITIVE, NONE. Sent verbatim; the registry rejects others.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility_level: Option<String>,
}

/// Schema format understood by the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    #[default]
    Avro,
    Json,
    Protobuf,
}

impl SchemaType {
    /// Wire name of the format
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Avro => "AVRO",
            SchemaType::Json => "JSON",
            SchemaType::Protobuf => "PROTOBUF",
        }
    }

    /// Whether the schema text must be a JSON document
    #[must_use]
    pub fn is_json_encoded(&self) -> bool {
        matches!(self, SchemaType::Avro | SchemaType::Json)
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to another registered schema
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaReference {
    /// Import name used inside the referencing schema
    pub name: String,
    /// Subject of the referenced schema
    pub subject: String,
    /// Version of the referenced schema (1 or greater)
    pub version: i32,
}

/// Pointer to a SchemaRegistry resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRegistryRef {
    pub name: String,
    /// Defaults to the Schema's own namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl SchemaRegistryRef {
    /// Namespace of the referenced registry given the referencing Schema's namespace
    #[must_use]
    pub fn effective_namespace<'a>(&'a self, schema_namespace: &'a str) -> &'a str {
        self.namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(schema_namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_type_defaults_to_avro() {
        let spec: SchemaSpec = serde_json::from_value(json!({
            "subject": "users-value",
            "schema": "{\"type\":\"string\"}",
            "registryRef": {"name": "main"}
        }))
        .unwrap();
        assert_eq!(spec.schema_type, SchemaType::Avro);
        assert!(spec.references.is_empty());
        assert!(spec.compatibility_level.is_none());
    }

    #[test]
    fn test_schema_type_wire_names() {
        let parsed: SchemaType = serde_json::from_value(json!("PROTOBUF")).unwrap();
        assert_eq!(parsed, SchemaType::Protobuf);
        assert_eq!(serde_json::to_value(SchemaType::Json).unwrap(), json!("JSON"));
        assert!(!SchemaType::Protobuf.is_json_encoded());
    }

    #[test]
    fn test_registry_ref_namespace_defaults_to_schema_namespace() {
        let local = SchemaRegistryRef {
            name: "main".to_string(),
            namespace: None,
        };
        assert_eq!(local.effective_namespace("kafka"), "kafka");

        let remote = SchemaRegistryRef {
            name: "main".to_string(),
            namespace: Some("platform".to_string()),
        };
        assert_eq!(remote.effective_namespace("kafka"), "platform");
    }
}
