//! The single reusable polling primitive.
//!
//! Every higher-level wait in this crate is one `step` closure handed
//! to [`poll_until`]; what to check lives in the closure, while how
//! long to keep trying and which failures excuse a retry live here.

use std::env;
use std::future::Future;
use std::time::{Duration, Instant};

use derive_builder::Builder;
use fluvio_future::timer::sleep;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::ClientError;

/// Default cadence between condition evaluations.
static DEFAULT_INTERVAL_MS: Lazy<u64> =
    Lazy::new(|| interval_ms_from(&env::var("CONVERGE_POLL_INTERVAL_MS").unwrap_or_default()));

// a zero interval would busy-loop, clamp to 1ms
fn interval_ms_from(raw: &str) -> u64 {
    raw.parse().unwrap_or(2_000).max(1)
}

/// Default budget for one convergence wait.
static DEFAULT_TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| {
    let var_value = env::var("CONVERGE_POLL_TIMEOUT").unwrap_or_default();
    var_value.parse().unwrap_or(60)
});

/// Timing parameters for one convergence wait.
///
/// Immutable once built and passed explicitly at every call site;
/// there is no process-wide polling state. With `timeout < interval`
/// the condition is evaluated exactly once.
#[derive(Builder, Debug, Clone, Copy, PartialEq, Eq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct PollConfig {
    /// Cadence between evaluations.
    #[builder(default = "Duration::from_millis(*DEFAULT_INTERVAL_MS)")]
    pub interval: Duration,
    /// Total budget before the wait gives up.
    #[builder(default = "Duration::from_secs(*DEFAULT_TIMEOUT_SECS)")]
    pub timeout: Duration,
}

impl PollConfig {
    pub fn builder() -> PollConfigBuilder {
        PollConfigBuilder::default()
    }

    /// Convenience constructor for explicit timing.
    pub fn new(interval: Duration, timeout: Duration) -> Result<Self, PollConfigBuilderError> {
        Self::builder().interval(interval).timeout(timeout).build()
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::builder().build().expect("defaults are valid")
    }
}

impl PollConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(interval) = self.interval {
            if interval.is_zero() {
                return Err("poll interval must be greater than zero".to_owned());
            }
        }
        Ok(())
    }
}

/// Terminal result of one [`poll_until`] invocation.
///
/// Exactly one outcome is produced per invocation; a fresh call starts
/// a fresh timing window.
#[derive(Debug)]
pub enum ConditionOutcome {
    /// The condition held.
    Satisfied,
    /// The budget ran out before the condition ever held.
    TimedOut,
    /// A non-retryable failure aborted the poll.
    FatalError(ClientError),
}

impl ConditionOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

/// Repeatedly evaluates `step` until it reports done, a fatal error
/// surfaces, or the budget is exhausted.
///
/// The first evaluation fires immediately. Retryable errors are logged
/// and swallowed; they consume nothing beyond the shared budget. A
/// non-retryable error stops the poll at once, forfeiting any
/// remaining budget.
pub async fn poll_until<F, Fut>(config: &PollConfig, mut step: F) -> ConditionOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, ClientError>>,
{
    let started = Instant::now();
    loop {
        match step().await {
            Ok(true) => return ConditionOutcome::Satisfied,
            Ok(false) => {}
            Err(err) if err.is_retryable() => {
                debug!(%err, "transient failure, continuing to poll");
            }
            Err(err) => {
                debug!(%err, "fatal failure, aborting poll");
                return ConditionOutcome::FatalError(err);
            }
        }

        // next evaluation would land past the budget
        if started.elapsed() + config.interval > config.timeout {
            return ConditionOutcome::TimedOut;
        }
        sleep(config.interval).await;
    }
}
