//! Persistent volume claim phase waits.

use crate::client::{Phase, ResourceClient, ResourceKind};
use crate::error::WaitError;
use crate::poll::PollConfig;

use super::{wait_for_named_existence, wait_for_phases};

/// Waits until the named claim reaches `phase`.
pub async fn wait_for_pvc_phase<C: ResourceClient>(
    client: &C,
    namespace: &str,
    name: &str,
    phase: Phase,
    config: &PollConfig,
) -> Result<(), WaitError> {
    wait_for_phases(
        client,
        ResourceKind::PersistentVolumeClaim,
        namespace,
        &[name],
        &[phase],
        false,
        config,
    )
    .await
}

/// Waits until the named claims reach `phase`.
///
/// With `match_any` one claim in phase is enough; otherwise all of them
/// must get there. An empty name list is rejected.
pub async fn wait_for_pvcs_phase<C: ResourceClient>(
    client: &C,
    namespace: &str,
    names: &[&str],
    phase: Phase,
    match_any: bool,
    config: &PollConfig,
) -> Result<(), WaitError> {
    wait_for_phases(
        client,
        ResourceKind::PersistentVolumeClaim,
        namespace,
        names,
        &[phase],
        match_any,
        config,
    )
    .await
}

/// Waits until the named claim is gone.
pub async fn wait_for_pvc_deleted<C: ResourceClient>(
    client: &C,
    namespace: &str,
    name: &str,
    config: &PollConfig,
) -> Result<(), WaitError> {
    wait_for_named_existence(
        client,
        ResourceKind::PersistentVolumeClaim,
        namespace,
        name,
        false,
        config,
    )
    .await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::client::ResourceDescriptor;
    use crate::error::ClientError;
    use crate::fixture::ScriptedClient;

    fn quick() -> PollConfig {
        PollConfig::new(Duration::from_millis(5), Duration::from_millis(500)).expect("config")
    }

    fn pvc(name: &str, phase: Phase) -> ResourceDescriptor {
        ResourceDescriptor::new("default", name, phase)
    }

    #[fluvio_future::test]
    async fn test_single_claim_binds() {
        //given
        let client = ScriptedClient::new();
        client.script_get("data-0", Ok(pvc("data-0", Phase::Pending)));
        client.script_get("data-0", Ok(pvc("data-0", Phase::Bound)));

        //when
        let result =
            wait_for_pvc_phase(&client, "default", "data-0", Phase::Bound, &quick()).await;

        //then
        assert!(result.is_ok());
    }

    #[fluvio_future::test]
    async fn test_all_claims_must_bind() {
        //given: data-1 stays pending
        let client = ScriptedClient::new();
        client.script_get("data-0", Ok(pvc("data-0", Phase::Bound)));
        client.script_get("data-1", Ok(pvc("data-1", Phase::Pending)));

        //when
        let result = wait_for_pvcs_phase(
            &client,
            "default",
            &["data-0", "data-1"],
            Phase::Bound,
            false,
            &quick(),
        )
        .await;

        //then
        assert!(matches!(result, Err(WaitError::TimedOut { .. })));
    }

    #[fluvio_future::test]
    async fn test_no_claim_names_is_an_error() {
        let client = ScriptedClient::new();
        let result =
            wait_for_pvcs_phase(&client, "default", &[], Phase::Bound, true, &quick()).await;
        assert!(matches!(result, Err(WaitError::InvalidArgument(_))));
    }

    #[fluvio_future::test]
    async fn test_claim_deletion() {
        //given
        let client = ScriptedClient::new();
        client.script_get("data-0", Ok(pvc("data-0", Phase::Bound)));
        client.script_get("data-0", Err(ClientError::NotFound));

        //when
        let result = wait_for_pvc_deleted(&client, "default", "data-0", &quick()).await;

        //then
        assert!(result.is_ok());
    }
}
