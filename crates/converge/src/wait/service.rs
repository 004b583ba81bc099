//! Service existence waits.

use crate::client::{ResourceClient, ResourceKind};
use crate::error::WaitError;
use crate::poll::PollConfig;
use crate::selector::Selector;

use super::{wait_for_labeled_absence, wait_for_labeled_presence, wait_for_named_existence};

/// Waits until the named service exists (`exists == true`) or is gone
/// (`exists == false`).
pub async fn wait_for_service<C: ResourceClient>(
    client: &C,
    namespace: &str,
    name: &str,
    exists: bool,
    config: &PollConfig,
) -> Result<(), WaitError> {
    wait_for_named_existence(client, ResourceKind::Service, namespace, name, exists, config).await
}

/// Waits until some service matches the selector, or none does.
///
/// Any non-zero number of matching services counts as present.
pub async fn wait_for_service_with_selector<C: ResourceClient>(
    client: &C,
    namespace: &str,
    selector: &Selector,
    exists: bool,
    config: &PollConfig,
) -> Result<(), WaitError> {
    if exists {
        wait_for_labeled_presence(client, ResourceKind::Service, namespace, selector, config).await
    } else {
        wait_for_labeled_absence(client, ResourceKind::Service, namespace, selector, config).await
    }
}
