//! Convergence waits over resource collections.
//!
//! The generic waits in this module pair one query shape with one
//! satisfaction rule; the kind-specific modules underneath bind them to
//! concrete resource kinds and readiness predicates. Every wait runs on
//! [`poll_until`](crate::poll::poll_until) and therefore shares its
//! retry classification and timing rules.

pub mod crd;
pub mod namespace;
pub mod pod;
pub mod pvc;
pub mod service;

use std::sync::Mutex;

use tracing::debug;

use crate::client::{Phase, ResourceClient, ResourceDescriptor, ResourceKind};
use crate::error::{ClientError, ReadinessError, WaitError};
use crate::poll::{poll_until, ConditionOutcome, PollConfig};
use crate::selector::Selector;

/// Waits until exactly `want_count` resources matching the selector
/// pass the `ready` predicate.
///
/// Entries failing the predicate do not count but do not fail the wait
/// either; their diagnostics surface in the timeout report. The ready
/// count must match exactly; overshooting keeps the wait pending the
/// same as undershooting, since extra ready resources usually mean a
/// stale generation is still terminating. On success the ready entries
/// are returned for the caller to inspect.
pub async fn wait_for_labeled_count<C, R>(
    client: &C,
    kind: ResourceKind,
    namespace: &str,
    selector: &Selector,
    want_count: usize,
    ready: R,
    config: &PollConfig,
) -> Result<Vec<ResourceDescriptor>, WaitError>
where
    C: ResourceClient,
    R: Fn(&ResourceDescriptor) -> Result<(), ReadinessError>,
{
    let state = Mutex::new((String::from("nothing observed yet"), Vec::new()));

    let outcome = poll_until(config, || {
        let state = &state;
        let ready = &ready;
        async move {
            let snapshot = client.list(kind, namespace, selector).await?;

            let observed = snapshot.len();
            let mut ready_items = Vec::with_capacity(observed);
            let mut shortfalls: Vec<String> = Vec::new();
            for item in snapshot.items {
                match ready(&item) {
                    Ok(()) => ready_items.push(item),
                    Err(why) => shortfalls.push(why.to_string()),
                }
            }

            let ready_count = ready_items.len();
            if ready_count == want_count {
                state.lock().unwrap().1 = ready_items;
                return Ok(true);
            }

            let summary = if shortfalls.is_empty() {
                format!("{ready_count} ready of {observed} matching, want exactly {want_count}")
            } else {
                format!(
                    "{ready_count} ready of {observed} matching, want exactly {want_count}; not ready: {}",
                    shortfalls.join("; ")
                )
            };
            debug!(%kind, namespace, selector = %selector, %summary, "still converging");
            state.lock().unwrap().0 = summary;
            Ok(false)
        }
    })
    .await;

    match outcome {
        ConditionOutcome::Satisfied => Ok(state.into_inner().unwrap().1),
        ConditionOutcome::TimedOut => Err(WaitError::TimedOut {
            subject: format!(
                "exactly {want_count} ready {kind}(s) matching '{selector}' in '{namespace}'"
            ),
            timeout: config.timeout,
            last_observed: state.into_inner().unwrap().0,
        }),
        ConditionOutcome::FatalError(err) => Err(err.into()),
    }
}

/// Waits until no resource matches the selector.
///
/// A `NotFound` from the collection query counts as absence, not as a
/// failure.
pub async fn wait_for_labeled_absence<C: ResourceClient>(
    client: &C,
    kind: ResourceKind,
    namespace: &str,
    selector: &Selector,
    config: &PollConfig,
) -> Result<(), WaitError> {
    let last_observed = Mutex::new(String::from("nothing observed yet"));

    let outcome = poll_until(config, || {
        let last_observed = &last_observed;
        async move {
            let snapshot = match client.list(kind, namespace, selector).await {
                Ok(snapshot) => snapshot,
                Err(ClientError::NotFound) => return Ok(true),
                Err(err) => return Err(err),
            };
            if snapshot.is_empty() {
                return Ok(true);
            }
            *last_observed.lock().unwrap() = format!("{} still present", snapshot.len());
            Ok(false)
        }
    })
    .await;

    finish_unit(
        outcome,
        config,
        || format!("no {kind}(s) matching '{selector}' in '{namespace}'"),
        last_observed,
    )
}

/// Waits until at least one resource matches the selector.
///
/// The complement of [`wait_for_labeled_absence`]: any non-zero number
/// of matches satisfies it.
pub async fn wait_for_labeled_presence<C: ResourceClient>(
    client: &C,
    kind: ResourceKind,
    namespace: &str,
    selector: &Selector,
    config: &PollConfig,
) -> Result<(), WaitError> {
    let last_observed = Mutex::new(String::from("nothing observed yet"));

    let outcome = poll_until(config, || {
        let last_observed = &last_observed;
        async move {
            let snapshot = match client.list(kind, namespace, selector).await {
                Ok(snapshot) => snapshot,
                Err(ClientError::NotFound) => {
                    *last_observed.lock().unwrap() = String::from("not found");
                    return Ok(false);
                }
                Err(err) => return Err(err),
            };
            if snapshot.is_empty() {
                *last_observed.lock().unwrap() = String::from("0 matching");
                return Ok(false);
            }
            Ok(true)
        }
    })
    .await;

    finish_unit(
        outcome,
        config,
        || format!("at least one {kind} matching '{selector}' in '{namespace}'"),
        last_observed,
    )
}

/// Waits until a named resource exists, or until it does not.
///
/// With `exists == false` a `NotFound` on the very first probe
/// satisfies the wait immediately; the first evaluation never sleeps.
pub async fn wait_for_named_existence<C: ResourceClient>(
    client: &C,
    kind: ResourceKind,
    namespace: &str,
    name: &str,
    exists: bool,
    config: &PollConfig,
) -> Result<(), WaitError> {
    let last_observed = Mutex::new(String::from("nothing observed yet"));

    let outcome = poll_until(config, || {
        let last_observed = &last_observed;
        async move {
            match client.get(kind, namespace, name).await {
                Ok(desc) => {
                    if exists {
                        return Ok(true);
                    }
                    *last_observed.lock().unwrap() =
                        format!("present, phase {}", desc.phase);
                    Ok(false)
                }
                Err(ClientError::NotFound) => {
                    if !exists {
                        return Ok(true);
                    }
                    *last_observed.lock().unwrap() = String::from("not found");
                    Ok(false)
                }
                Err(err) => Err(err),
            }
        }
    })
    .await;

    finish_unit(
        outcome,
        config,
        || {
            let want = if exists { "exist" } else { "be gone" };
            format!("{kind} '{namespace}/{name}' to {want}")
        },
        last_observed,
    )
}

/// Waits until named resources reach one of the wanted phases.
///
/// With `match_any` a single resource in a wanted phase satisfies the
/// wait; otherwise every named resource must be there. A resource that
/// does not exist yet simply counts as not-in-phase. An empty name list
/// has no basis to converge and is rejected up front.
pub async fn wait_for_phases<C: ResourceClient>(
    client: &C,
    kind: ResourceKind,
    namespace: &str,
    names: &[&str],
    wanted: &[Phase],
    match_any: bool,
    config: &PollConfig,
) -> Result<(), WaitError> {
    if names.is_empty() {
        return Err(WaitError::InvalidArgument(
            "at least one resource name is required".to_owned(),
        ));
    }
    if wanted.is_empty() {
        return Err(WaitError::InvalidArgument(
            "at least one wanted phase is required".to_owned(),
        ));
    }

    let last_observed = Mutex::new(String::from("nothing observed yet"));

    let outcome = poll_until(config, || {
        let last_observed = &last_observed;
        async move {
            let mut matched = 0usize;
            let mut report: Vec<String> = Vec::with_capacity(names.len());
            for name in names {
                match client.get(kind, namespace, name).await {
                    Ok(desc) => {
                        if wanted.contains(&desc.phase) {
                            matched += 1;
                        }
                        report.push(format!("{name}={}", desc.phase));
                    }
                    Err(ClientError::NotFound) => report.push(format!("{name}=missing")),
                    Err(err) => return Err(err),
                }
            }
            let satisfied = if match_any {
                matched > 0
            } else {
                matched == names.len()
            };
            if satisfied {
                return Ok(true);
            }
            *last_observed.lock().unwrap() = report.join(", ");
            Ok(false)
        }
    })
    .await;

    finish_unit(
        outcome,
        config,
        || {
            let scope = if match_any { "any of" } else { "all of" };
            let phases: Vec<String> = wanted.iter().map(ToString::to_string).collect();
            format!(
                "{scope} [{}] ({kind}) in '{namespace}' to reach phase {}",
                names.join(", "),
                phases.join("/")
            )
        },
        last_observed,
    )
}

/// Waits until one named resource reaches one of the wanted phases.
pub async fn wait_for_phase<C: ResourceClient>(
    client: &C,
    kind: ResourceKind,
    namespace: &str,
    name: &str,
    wanted: &[Phase],
    config: &PollConfig,
) -> Result<(), WaitError> {
    wait_for_phases(client, kind, namespace, &[name], wanted, false, config).await
}

/// Maps a unit-valued poll outcome to the wait result.
fn finish_unit(
    outcome: ConditionOutcome,
    config: &PollConfig,
    subject: impl FnOnce() -> String,
    last_observed: Mutex<String>,
) -> Result<(), WaitError> {
    match outcome {
        ConditionOutcome::Satisfied => Ok(()),
        ConditionOutcome::TimedOut => Err(WaitError::TimedOut {
            subject: subject(),
            timeout: config.timeout,
            last_observed: last_observed.into_inner().unwrap(),
        }),
        ConditionOutcome::FatalError(err) => Err(err.into()),
    }
}
