//! # Status
//!
//! Ready condition builder and the status write shared by both reconcilers.

use kube::api::{Patch, PatchParams};
use kube::{Api, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::types::ReconcilerError;
use crate::constants::{FIELD_MANAGER, READY_CONDITION};
use crate::crd::{Condition, ConditionStatus};

/// Build the `Ready` condition for `generation`
///
/// The transition time is left unset; `set_condition` fills it in.
pub fn ready_condition(
    ready: bool,
    reason: &str,
    message: impl Into<String>,
    generation: Option<i64>,
) -> Condition {
    Condition {
        r#type: READY_CONDITION.to_string(),
        status: ConditionStatus::from(ready),
        reason: reason.to_string(),
        message: message.into(),
        observed_generation: generation,
        last_transition_time: None,
    }
}

/// Write `status` with a merge patch pinned to `resource_version`
///
/// A stale `resource_version` is rejected by the API server with 409 and
/// surfaces as [`ReconcilerError::Conflict`]. A resource deleted meanwhile
/// is not an error.
pub async fn write_status<K, S>(
    api: &Api<K>,
    name: &str,
    resource_version: Option<&str>,
    status: &S,
) -> Result<(), ReconcilerError>
where
    K: Resource + Clone + DeserializeOwned + std::fmt::Debug,
    S: Serialize,
{
    let patch = status_patch(resource_version, status);

    match api
        .patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
        .await
    {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
            debug!(resource.name = name, "Resource deleted before status write, skipping");
            Ok(())
        }
        Err(e) => Err(ReconcilerError::from_write(e, name)),
    }
}

/// Merge patch body for a status write
///
/// `null` fields in `status` delete the stored value.
fn status_patch<S: Serialize>(resource_version: Option<&str>, status: &S) -> serde_json::Value {
    json!({
        "metadata": { "resourceVersion": resource_version },
        "status": status,
    })
}
