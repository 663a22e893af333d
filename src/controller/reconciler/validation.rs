//! # Validation
//!
//! Validates `SchemaRegistry` and `Schema` specs.
//!
//! Every check runs and every violation is reported, so a user fixing a
//! resource sees all problems at once. The same functions back the
//! reconcilers' pre-flight check.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::crd::{RegistryAuth, SchemaRegistrySpec, SchemaSpec};

static HTTP_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://.+").expect("Failed to compile URL regex - this should never happen")
});

/// Category of a field violation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    Required,
    Invalid,
    Forbidden,
}

impl FieldErrorKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldErrorKind::Required => "Required value",
            FieldErrorKind::Invalid => "Invalid value",
            FieldErrorKind::Forbidden => "Forbidden",
        }
    }
}

/// One violation at a JSON path such as `spec.references[0].version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub kind: FieldErrorKind,
    pub detail: String,
}

impl FieldError {
    fn required(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FieldErrorKind::Required,
            detail: detail.into(),
        }
    }

    fn invalid(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FieldErrorKind::Invalid,
            detail: detail.into(),
        }
    }

    fn forbidden(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FieldErrorKind::Forbidden,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.path, self.kind.as_str(), self.detail)
    }
}

/// Non-empty list of violations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether any violation is reported at `path`
    #[must_use]
    pub fn has_path(&self, path: &str) -> bool {
        self.0.iter().any(|e| e.path == path)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        if rendered.len() == 1 {
            f.write_str(&rendered[0])
        } else {
            write!(f, "[{}]", rendered.join(", "))
        }
    }
}

impl std::error::Error for FieldErrors {}

fn into_result(errors: Vec<FieldError>) -> Result<(), FieldErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(FieldErrors(errors))
    }
}

/// Validate a `SchemaRegistry` spec
///
/// # Errors
///
/// Returns every violation found.
pub fn validate_registry_spec(spec: &SchemaRegistrySpec) -> Result<(), FieldErrors> {
    let mut errors = Vec::new();

    let url = spec.url.trim();
    if url.is_empty() {
        errors.push(FieldError::required("spec.url", "url must not be empty"));
    } else if !HTTP_URL.is_match(url) {
        errors.push(FieldError::invalid(
            "spec.url",
            format!("{url:?} must start with http:// or https://"),
        ));
    }

    match &spec.auth {
        None | Some(RegistryAuth::None) => {}
        Some(RegistryAuth::Basic { secret_ref }) => {
            if secret_ref.trim().is_empty() {
                errors.push(FieldError::required(
                    "spec.auth.secretRef",
                    "secretRef must not be empty when auth type is BASIC",
                ));
            }
        }
        Some(RegistryAuth::Bearer { secret_ref }) => {
            if secret_ref.trim().is_empty() {
                errors.push(FieldError::required(
                    "spec.auth.secretRef",
                    "secretRef must not be empty when auth type is BEARER",
                ));
            }
        }
        Some(RegistryAuth::Mtls {
            cert_secret_ref, ..
        }) => {
            if cert_secret_ref.trim().is_empty() {
                errors.push(FieldError::required(
                    "spec.auth.certSecretRef",
                    "certSecretRef must not be empty when auth type is MTLS",
                ));
            }
        }
    }

    into_result(errors)
}

/// Validate a `Schema` spec
///
/// # Errors
///
/// Returns every violation found.
pub fn validate_schema_spec(spec: &SchemaSpec) -> Result<(), FieldErrors> {
    let mut errors = Vec::new();

    if spec.subject.is_empty() {
        errors.push(FieldError::required(
            "spec.subject",
            "subject must not be empty",
        ));
    }

    if spec.schema.is_empty() {
        errors.push(FieldError::required(
            "spec.schema",
            "schema content must not be empty",
        ));
    } else if spec.schema_type.is_json_encoded()
        && serde_json::from_str::<serde_json::Value>(&spec.schema).is_err()
    {
        errors.push(FieldError::invalid(
            "spec.schema",
            format!("{} schema must be valid JSON", spec.schema_type),
        ));
    }

    if spec.registry_ref.name.is_empty() {
        errors.push(FieldError::required(
            "spec.registryRef.name",
            "registryRef.name must not be empty",
        ));
    }

    for (index, reference) in spec.references.iter().enumerate() {
        let path = format!("spec.references[{index}]");
        if reference.name.is_empty() {
            errors.push(FieldError::required(
                format!("{path}.name"),
                "reference name must not be empty",
            ));
        }
        if reference.subject.is_empty() {
            errors.push(FieldError::required(
                format!("{path}.subject"),
                "reference subject must not be empty",
            ));
        }
        if reference.version < 1 {
            errors.push(FieldError::invalid(
                format!("{path}.version"),
                format!("reference version must be >= 1, got {}", reference.version),
            ));
        }
    }

    into_result(errors)
}

/// Validate an update from `old` to `new`
///
/// `subject` and `schemaType` cannot change after creation.
///
/// # Errors
///
/// Returns the immutability violations plus every violation of `new`.
pub fn validate_schema_update(old: &SchemaSpec, new: &SchemaSpec) -> Result<(), FieldErrors> {
    let mut errors = Vec::new();

    if old.subject != new.subject {
        errors.push(FieldError::forbidden(
            "spec.subject",
            "subject is immutable and cannot be changed after creation",
        ));
    }
    if old.schema_type != new.schema_type {
        errors.push(FieldError::forbidden(
            "spec.schemaType",
            "schemaType is immutable and cannot be changed after creation",
        ));
    }

    if let Err(FieldErrors(spec_errors)) = validate_schema_spec(new) {
        errors.extend(spec_errors);
    }

    into_result(errors)
}
