//! Namespace teardown waits.

use std::sync::Mutex;

use crate::client::{ResourceClient, ResourceKind};
use crate::error::{ClientError, WaitError};
use crate::poll::{poll_until, ConditionOutcome, PollConfig};

/// Waits until every named namespace is gone.
///
/// Namespaces are cluster scoped, so there is no enclosing namespace
/// argument. An empty name list is trivially satisfied.
pub async fn wait_for_namespaces_deleted<C: ResourceClient>(
    client: &C,
    names: &[&str],
    config: &PollConfig,
) -> Result<(), WaitError> {
    let last_observed = Mutex::new(String::from("nothing observed yet"));

    let outcome = poll_until(config, || {
        let last_observed = &last_observed;
        async move {
            let mut remaining: Vec<String> = Vec::new();
            for name in names {
                match client.get(ResourceKind::Namespace, "", name).await {
                    Ok(desc) => remaining.push(format!("{name}({})", desc.phase)),
                    Err(ClientError::NotFound) => {}
                    Err(err) => return Err(err),
                }
            }
            if remaining.is_empty() {
                return Ok(true);
            }
            *last_observed.lock().unwrap() = format!("still present: {}", remaining.join(", "));
            Ok(false)
        }
    })
    .await;

    match outcome {
        ConditionOutcome::Satisfied => Ok(()),
        ConditionOutcome::TimedOut => Err(WaitError::TimedOut {
            subject: format!("namespaces [{}] to be deleted", names.join(", ")),
            timeout: config.timeout,
            last_observed: last_observed.into_inner().unwrap(),
        }),
        ConditionOutcome::FatalError(err) => Err(err.into()),
    }
}
