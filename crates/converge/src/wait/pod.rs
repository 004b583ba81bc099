//! Pod readiness waits.

use crate::client::{ConditionKind, Phase, ResourceClient, ResourceDescriptor, ResourceKind};
use crate::error::{ReadinessError, WaitError};
use crate::poll::PollConfig;
use crate::selector::Selector;

use super::{wait_for_labeled_absence, wait_for_labeled_count};

/// Whether one pod is running and reports `Ready`.
///
/// Succeeded or failed pods are not ready under this rule even though
/// they are terminal; a workload wait wants live serving pods.
pub fn pod_running_ready(pod: &ResourceDescriptor) -> Result<(), ReadinessError> {
    if pod.phase != Phase::Running {
        return Err(ReadinessError::PhaseMismatch {
            name: pod.name.clone(),
            expected: Phase::Running,
            actual: pod.phase,
        });
    }
    if !pod.is_condition_true(ConditionKind::Ready) {
        return Err(ReadinessError::ConditionNotTrue {
            name: pod.name.clone(),
            condition: ConditionKind::Ready.to_string(),
        });
    }
    Ok(())
}

/// Waits until exactly `want_count` pods match the selector and each is
/// running and ready.
pub async fn wait_for_pods_running_ready<C: ResourceClient>(
    client: &C,
    namespace: &str,
    selector: &Selector,
    want_count: usize,
    config: &PollConfig,
) -> Result<Vec<ResourceDescriptor>, WaitError> {
    wait_for_labeled_count(
        client,
        ResourceKind::Pod,
        namespace,
        selector,
        want_count,
        pod_running_ready,
        config,
    )
    .await
}

/// Waits until no pod matches the selector.
pub async fn wait_for_pods_deleted<C: ResourceClient>(
    client: &C,
    namespace: &str,
    selector: &Selector,
    config: &PollConfig,
) -> Result<(), WaitError> {
    wait_for_labeled_absence(client, ResourceKind::Pod, namespace, selector, config).await
}
