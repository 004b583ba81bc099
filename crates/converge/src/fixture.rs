//! Test doubles for driving the engine without a control plane.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::client::{ResourceClient, ResourceDescriptor, ResourceKind, ResourceSnapshot};
use crate::error::ClientError;
use crate::selector::Selector;
use crate::watch::{EventSource, WatchEvent};

/// Channel-backed watch stream.
///
/// Cancellations are counted so tests can assert the stream is released
/// exactly once.
pub(crate) struct ChannelSource {
    receiver: async_channel::Receiver<WatchEvent>,
    cancels: Arc<AtomicUsize>,
}

impl ChannelSource {
    pub(crate) fn bounded(
        capacity: usize,
    ) -> (
        async_channel::Sender<WatchEvent>,
        Self,
        Arc<AtomicUsize>,
    ) {
        let (sender, receiver) = async_channel::bounded(capacity);
        let cancels = Arc::new(AtomicUsize::new(0));
        let source = Self {
            receiver,
            cancels: cancels.clone(),
        };
        (sender, source, cancels)
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn next_event(&mut self) -> Option<WatchEvent> {
        self.receiver.recv().await.ok()
    }

    fn cancel(&mut self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.receiver.close();
    }
}

#[derive(Default)]
struct Script {
    lists: VecDeque<Result<ResourceSnapshot, ClientError>>,
    gets: HashMap<String, VecDeque<Result<ResourceDescriptor, ClientError>>>,
    delete_failures: HashMap<String, ClientError>,
    deleted: Vec<(ResourceKind, String, String)>,
    list_selectors: Vec<String>,
    watch: Option<ChannelSource>,
}

/// [`ResourceClient`] that replays scripted responses.
///
/// Responses are consumed in order; the final response of a queue is
/// sticky and repeats for every call after the script runs out, so a
/// poll loop can keep observing a settled state.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    script: Mutex<Script>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script_list(&self, response: Result<Vec<ResourceDescriptor>, ClientError>) {
        let mut script = self.script.lock().expect("script lock");
        script.lists.push_back(response.map(Into::into));
    }

    pub(crate) fn script_get(
        &self,
        name: &str,
        response: Result<ResourceDescriptor, ClientError>,
    ) {
        let mut script = self.script.lock().expect("script lock");
        script.gets.entry(name.to_owned()).or_default().push_back(response);
    }

    pub(crate) fn fail_delete(&self, name: &str, error: ClientError) {
        let mut script = self.script.lock().expect("script lock");
        script.delete_failures.insert(name.to_owned(), error);
    }

    pub(crate) fn set_watch(&self, source: ChannelSource) {
        self.script.lock().expect("script lock").watch = Some(source);
    }

    pub(crate) fn deleted(&self) -> Vec<(ResourceKind, String, String)> {
        self.script.lock().expect("script lock").deleted.clone()
    }

    pub(crate) fn list_selectors(&self) -> Vec<String> {
        self.script.lock().expect("script lock").list_selectors.clone()
    }
}

fn pop_sticky<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait]
impl ResourceClient for ScriptedClient {
    type Watch = ChannelSource;

    async fn list(
        &self,
        _kind: ResourceKind,
        _namespace: &str,
        selector: &Selector,
    ) -> Result<ResourceSnapshot, ClientError> {
        let mut script = self.script.lock().expect("script lock");
        script.list_selectors.push(selector.serialize());
        pop_sticky(&mut script.lists)
            .unwrap_or_else(|| Err(ClientError::Other("no scripted list response".to_owned())))
    }

    async fn get(
        &self,
        _kind: ResourceKind,
        _namespace: &str,
        name: &str,
    ) -> Result<ResourceDescriptor, ClientError> {
        let mut script = self.script.lock().expect("script lock");
        match script.gets.get_mut(name) {
            Some(queue) => pop_sticky(queue)
                .unwrap_or_else(|| Err(ClientError::Other("scripted get ran dry".to_owned()))),
            None => Err(ClientError::NotFound),
        }
    }

    async fn open_watch(
        &self,
        _kind: ResourceKind,
        _timeout_secs: u32,
    ) -> Result<Self::Watch, ClientError> {
        let mut script = self.script.lock().expect("script lock");
        script
            .watch
            .take()
            .ok_or_else(|| ClientError::Other("no scripted watch".to_owned()))
    }

    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        let mut script = self.script.lock().expect("script lock");
        if let Some(error) = script.delete_failures.get(name) {
            return Err(error.clone());
        }
        script
            .deleted
            .push((kind, namespace.to_owned(), name.to_owned()));
        Ok(())
    }
}
