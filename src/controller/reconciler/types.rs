//! # Types
//!
//! Shared context and error types for both reconcilers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use kube::Client;
use thiserror::Error;

use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// A status or finalizer write lost an optimistic-concurrency race
    #[error("conflict writing {resource}: {source}")]
    Conflict {
        resource: String,
        #[source]
        source: kube::Error,
    },

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// The registry was reachable but refused to delete the subject
    #[error("failed to delete subject {subject:?} from registry: {message}")]
    Cleanup { subject: String, message: String },
}

impl ReconcilerError {
    /// Classify a failed write: 409 becomes [`ReconcilerError::Conflict`]
    pub fn from_write(error: kube::Error, resource: impl Into<String>) -> Self {
        match error {
            kube::Error::Api(ref api_err) if api_err.code == 409 => ReconcilerError::Conflict {
                resource: resource.into(),
                source: error,
            },
            other => ReconcilerError::Kube(other),
        }
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, ReconcilerError::Conflict { .. })
    }
}

/// Per-resource error backoff
#[derive(Debug, Clone, Default)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }

    pub fn reset(&mut self) {
        self.backoff.reset();
        self.error_count = 0;
    }
}

/// Context handed to every reconcile
pub struct Reconciler {
    pub client: Client,
    pub config: Arc<ControllerConfig>,
    // Keyed by "Kind/namespace/name"; owned by the error policy
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(client: Client, config: Arc<ControllerConfig>) -> Self {
        Self {
            client,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Key used for the backoff table
    #[must_use]
    pub fn backoff_key(kind: &str, namespace: &str, name: &str) -> String {
        format!("{kind}/{namespace}/{name}")
    }

    /// Forget accumulated errors after a successful reconcile
    ///
    /// The entry is dropped so deleted resources do not linger in the table.
    pub fn reset_backoff(&self, kind: &str, namespace: &str, name: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(&Self::backoff_key(kind, namespace, name));
        }
    }
}
