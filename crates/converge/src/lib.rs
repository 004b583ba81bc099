//! Convergence waits for control-plane acceptance tests.
//!
//! An acceptance test drives a control plane toward a desired state and
//! then has to block until the system actually converges. This crate is
//! that waiting half: label [`Selector`]s to scope collection queries,
//! a retry classification over client failures, one polling primitive
//! with explicit timing, kind-specific convergence waits, and a
//! watch-based wait for transitions announced as discrete events.
//!
//! # Example
//!
//! Waiting for a workload to scale to three ready pods:
//!
//! ```
//! use std::time::Duration;
//! use converge::{PollConfig, ResourceClient, Selector, WaitError};
//! use converge::wait::pod::wait_for_pods_running_ready;
//! # async fn example<C: ResourceClient>(client: &C) -> Result<(), WaitError> {
//! let selector = Selector::new().equals("app", "operator").unwrap();
//! let config = PollConfig::new(Duration::from_secs(2), Duration::from_secs(120)).unwrap();
//! let pods = wait_for_pods_running_ready(client, "default", &selector, 3, &config).await?;
//! assert_eq!(pods.len(), 3);
//! # Ok(())
//! # }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

mod client;
mod error;
mod poll;
mod selector;
mod watch;

pub mod wait;

#[cfg(test)]
mod fixture;

pub use client::{
    delete_best_effort, Condition, ConditionKind, Phase, ResourceClient, ResourceDescriptor,
    ResourceKind, ResourceSnapshot,
};
pub use error::{ClientError, ReadinessError, WaitError};
pub use poll::{poll_until, ConditionOutcome, PollConfig, PollConfigBuilder, PollConfigBuilderError};
pub use selector::{Operator, Requirement, Selector, SelectorError};
pub use watch::{block_until_event, EventKind, EventSource, WatchError, WatchEvent};
