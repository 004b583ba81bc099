//! Definition registration waits.
//!
//! Registration of a new resource definition is announced as a discrete
//! event, so this wait consumes the watch stream instead of polling the
//! collection.

use std::time::Duration;

use crate::client::{ResourceClient, ResourceDescriptor, ResourceKind};
use crate::watch::{block_until_event, EventKind, WatchError};

/// Blocks until the named definition registration is announced.
///
/// The watch is opened fresh and cancelled before returning, whatever
/// the outcome. The first event must be the registration of `name`.
pub async fn wait_for_crd_added<C: ResourceClient>(
    client: &C,
    name: &str,
    timeout: Duration,
) -> Result<ResourceDescriptor, WatchError> {
    // server-side budget mirrors the client-side one
    let budget_secs = u32::try_from(timeout.as_secs()).unwrap_or(u32::MAX).max(1);

    let desc = block_until_event(
        || client.open_watch(ResourceKind::CustomResourceDefinition, budget_secs),
        EventKind::Added,
        timeout,
    )
    .await?;

    if desc.name != name {
        return Err(WatchError::WrongSubject {
            want: name.to_owned(),
            got: desc.name,
        });
    }
    Ok(desc)
}
