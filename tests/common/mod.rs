//! Common test utilities for integration tests
//!
//! Provides shared initialization code, including rustls crypto provider setup
//! and an in-memory secret store.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::collections::BTreeMap;
use std::sync::Once;

use async_trait::async_trait;
use schema_registry_controller::controller::credentials::{SecretData, SecretLookup};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once per test binary.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        // We use ring as the crypto provider (matches main application)
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

/// Secrets keyed by `(namespace, name)`
#[derive(Debug, Default)]
pub struct InMemorySecrets {
    secrets: BTreeMap<(String, String), SecretData>,
}

impl InMemorySecrets {
    pub fn with(mut self, namespace: &str, name: &str, data: &[(&str, &str)]) -> Self {
        let data = data
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.as_bytes().to_vec()))
            .collect();
        self.secrets
            .insert((namespace.to_string(), name.to_string()), data);
        self
    }
}

#[async_trait]
impl SecretLookup for InMemorySecrets {
    async fn get_secret_data(
        &self,
        namespace: &str,
        name: &str,
    ) -> anyhow::Result<Option<SecretData>> {
        Ok(self
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}

/// Strip the trailing slash `pact_consumer` leaves on mock server URLs
pub fn base_url(url: &impl ToString) -> String {
    let mut base_url = url.to_string();
    if base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}
