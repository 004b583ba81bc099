//! Watch-until-event: consume an event stream instead of polling.
//!
//! Used where the interesting state change is announced as a discrete
//! event, typically a definition registration showing up. The stream is
//! opened fresh per invocation and cancelled exactly once before the
//! result is handed back, whatever the outcome.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use fluvio_future::timer::sleep;
use tracing::debug;

use crate::client::ResourceDescriptor;
use crate::error::ClientError;

/// Lifecycle transition a watch event announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Modified,
    Deleted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        };
        write!(f, "{name}")
    }
}

/// One event delivered by a watch stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Added(ResourceDescriptor),
    Modified(ResourceDescriptor),
    Deleted(ResourceDescriptor),
    /// The server pushed an error frame onto the stream.
    Error(String),
}

impl WatchEvent {
    /// The transition this event announces, if it is not an error frame.
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            Self::Added(_) => Some(EventKind::Added),
            Self::Modified(_) => Some(EventKind::Modified),
            Self::Deleted(_) => Some(EventKind::Deleted),
            Self::Error(_) => None,
        }
    }
}

/// A cancellable stream of watch events.
///
/// `next_event` returns `None` once the stream ends, including after
/// the server-side watch budget expires. `cancel` releases the
/// server-side watch; calling it more than once is a bug in the
/// consumer, not the source.
#[async_trait]
pub trait EventSource: Send {
    async fn next_event(&mut self) -> Option<WatchEvent>;

    fn cancel(&mut self);
}

/// Why a watch-until-event wait did not produce the wanted event.
#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    /// The stream could not be opened at all.
    #[error("failed to open watch")]
    Open(#[from] ClientError),

    /// The first event was a different transition than the wanted one.
    #[error("expected {want} event, got {got}")]
    UnexpectedEvent { want: EventKind, got: EventKind },

    /// The first event announced the wanted transition on a different
    /// resource than the wanted one.
    #[error("event was for '{got}', expected '{want}'")]
    WrongSubject { want: String, got: String },

    /// The server pushed an error frame as the first event.
    #[error("watch stream reported error: {0}")]
    StreamError(String),

    /// The stream ended before delivering any event.
    #[error("watch stream closed without delivering an event")]
    StreamClosed,

    /// No event arrived within the budget.
    #[error("no event within {0:?}")]
    TimedOut(Duration),
}

/// Opens a watch and blocks until its first event, which must be the
/// wanted transition.
///
/// A non-matching first event is a failure rather than something to
/// skip past: the caller asked to observe one specific transition on a
/// freshly opened stream, so anything else means the premise was wrong.
pub async fn block_until_event<S, F, Fut>(
    open: F,
    want: EventKind,
    timeout: Duration,
) -> Result<ResourceDescriptor, WatchError>
where
    S: EventSource,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<S, ClientError>>,
{
    use tokio::select;

    let mut source = open().await?;
    debug!(%want, ?timeout, "watch opened, waiting for first event");

    let mut timer = sleep(timeout);
    let result = select! {
        _ = &mut timer => Err(WatchError::TimedOut(timeout)),
        event = source.next_event() => match event {
            None => Err(WatchError::StreamClosed),
            Some(event) => classify(event, want),
        },
    };
    source.cancel();

    if let Ok(desc) = &result {
        debug!(name = %desc.name, %want, "wanted event observed");
    }
    result
}

fn classify(event: WatchEvent, want: EventKind) -> Result<ResourceDescriptor, WatchError> {
    let (got, desc) = match event {
        WatchEvent::Error(message) => return Err(WatchError::StreamError(message)),
        WatchEvent::Added(desc) => (EventKind::Added, desc),
        WatchEvent::Modified(desc) => (EventKind::Modified, desc),
        WatchEvent::Deleted(desc) => (EventKind::Deleted, desc),
    };
    if got == want {
        Ok(desc)
    } else {
        Err(WatchError::UnexpectedEvent { want, got })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::Ordering;

    use crate::client::Phase;
    use crate::fixture::ChannelSource;

    fn crd(name: &str) -> ResourceDescriptor {
        ResourceDescriptor::new("", name, Phase::Active)
    }

    const BUDGET: Duration = Duration::from_millis(500);

    #[fluvio_future::test]
    async fn test_first_matching_event_is_returned() {
        //given
        let (sender, source, cancels) = ChannelSource::bounded(4);
        sender
            .send(WatchEvent::Added(crd("alerts.synopsys.com")))
            .await
            .expect("send");

        //when
        let result = block_until_event(
            || async move { Ok::<_, ClientError>(source) },
            EventKind::Added,
            BUDGET,
        )
        .await;

        //then
        let desc = result.expect("added event");
        assert_eq!(desc.name, "alerts.synopsys.com");
        assert_eq!(cancels.load(Ordering::SeqCst), 1);
    }

    #[fluvio_future::test]
    async fn test_mismatched_first_event_fails() {
        //given
        let (sender, source, cancels) = ChannelSource::bounded(4);
        sender
            .send(WatchEvent::Deleted(crd("alerts.synopsys.com")))
            .await
            .expect("send");

        //when
        let result = block_until_event(
            || async move { Ok::<_, ClientError>(source) },
            EventKind::Added,
            BUDGET,
        )
        .await;

        //then
        match result {
            Err(WatchError::UnexpectedEvent { want, got }) => {
                assert_eq!(want, EventKind::Added);
                assert_eq!(got, EventKind::Deleted);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
        assert_eq!(cancels.load(Ordering::SeqCst), 1);
    }

    #[fluvio_future::test]
    async fn test_error_frame_fails() {
        //given
        let (sender, source, cancels) = ChannelSource::bounded(4);
        sender
            .send(WatchEvent::Error("410 gone".to_owned()))
            .await
            .expect("send");

        //when
        let result = block_until_event(
            || async move { Ok::<_, ClientError>(source) },
            EventKind::Added,
            BUDGET,
        )
        .await;

        //then
        assert!(matches!(result, Err(WatchError::StreamError(_))));
        assert_eq!(cancels.load(Ordering::SeqCst), 1);
    }

    #[fluvio_future::test]
    async fn test_closed_stream_fails() {
        //given: sender dropped before any event
        let (sender, source, cancels) = ChannelSource::bounded(4);
        drop(sender);

        //when
        let result = block_until_event(
            || async move { Ok::<_, ClientError>(source) },
            EventKind::Added,
            BUDGET,
        )
        .await;

        //then
        assert!(matches!(result, Err(WatchError::StreamClosed)));
        assert_eq!(cancels.load(Ordering::SeqCst), 1);
    }

    #[fluvio_future::test]
    async fn test_silent_stream_times_out() {
        //given: sender alive but never sends
        let (_sender, source, cancels) = ChannelSource::bounded(4);

        //when
        let result = block_until_event(
            || async move { Ok::<_, ClientError>(source) },
            EventKind::Added,
            Duration::from_millis(20),
        )
        .await;

        //then
        assert!(matches!(result, Err(WatchError::TimedOut(_))));
        assert_eq!(cancels.load(Ordering::SeqCst), 1);
    }

    #[fluvio_future::test]
    async fn test_open_failure_propagates() {
        let result = block_until_event(
            || async { Err::<ChannelSource, _>(ClientError::AuthorizationDenied("rbac".into())) },
            EventKind::Added,
            BUDGET,
        )
        .await;

        assert!(matches!(result, Err(WatchError::Open(_))));
    }
}
