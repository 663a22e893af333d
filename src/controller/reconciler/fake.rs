//! In-memory registry double for reconciler tests

use std::sync::Mutex;

use async_trait::async_trait;

use crate::registry::{RegisterResult, RegisterSchemaRequest, RegistryError, SchemaRegistryApi};

/// Scripted registry: each `*_failure` holds the HTTP status to fail with
#[derive(Debug)]
pub(crate) struct FakeRegistry {
    pub health_failure: Option<u16>,
    pub register_failure: Option<u16>,
    pub compatibility_failure: Option<u16>,
    pub delete_failure: Option<u16>,
    pub register_result: RegisterResult,
    pub calls: Mutex<Vec<String>>,
}

impl Default for FakeRegistry {
    fn default() -> Self {
        Self {
            health_failure: None,
            register_failure: None,
            compatibility_failure: None,
            delete_failure: None,
            register_result: RegisterResult {
                id: 42,
                version: Some(3),
            },
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeRegistry {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn outcome(operation: &'static str, failure: Option<u16>) -> Result<(), RegistryError> {
        match failure {
            Some(status) => Err(RegistryError::Status {
                operation,
                status,
                body: format!("{{\"error_code\":{status},\"message\":\"scripted failure\"}}"),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SchemaRegistryApi for FakeRegistry {
    async fn health_check(&self) -> Result<(), RegistryError> {
        self.record("health_check".to_string());
        Self::outcome("health_check", self.health_failure)
    }

    async fn register_schema(
        &self,
        subject: &str,
        request: &RegisterSchemaRequest,
    ) -> Result<RegisterResult, RegistryError> {
        self.record(format!("register_schema {subject} {}", request.schema_type));
        Self::outcome("register_schema", self.register_failure)?;
        Ok(self.register_result)
    }

    async fn set_compatibility(&self, subject: &str, level: &str) -> Result<(), RegistryError> {
        self.record(format!("set_compatibility {subject} {level}"));
        Self::outcome("set_compatibility", self.compatibility_failure)
    }

    async fn delete_subject(&self, subject: &str) -> Result<(), RegistryError> {
        self.record(format!("delete_subject {subject}"));
        Self::outcome("delete_subject", self.delete_failure)
    }
}
