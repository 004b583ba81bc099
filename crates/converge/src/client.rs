//! Boundary to the control-plane client.
//!
//! The engine never talks to a control plane directly; it drives any
//! implementation of [`ResourceClient`]. Resource state crosses the
//! boundary as fixed, typed descriptors rather than dynamic maps so
//! that predicate code stays exhaustive and type-checked.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::selector::Selector;
use crate::watch::EventSource;

/// The resource collections the engine knows how to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Pod,
    Service,
    PersistentVolumeClaim,
    Namespace,
    CustomResourceDefinition,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pod => "pod",
            Self::Service => "service",
            Self::PersistentVolumeClaim => "persistentvolumeclaim",
            Self::Namespace => "namespace",
            Self::CustomResourceDefinition => "customresourcedefinition",
        };
        write!(f, "{name}")
    }
}

/// Coarse lifecycle phase of a resource.
///
/// One enum covers every kind the engine observes; predicates match on
/// the variants relevant to their kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
    Bound,
    Lost,
    Active,
    Terminating,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
            Self::Bound => "Bound",
            Self::Lost => "Lost",
            Self::Active => "Active",
            Self::Terminating => "Terminating",
        };
        write!(f, "{name}")
    }
}

/// Condition flags a descriptor may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    Ready,
    ContainersReady,
    Initialized,
    Scheduled,
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ready => "Ready",
            Self::ContainersReady => "ContainersReady",
            Self::Initialized => "Initialized",
            Self::Scheduled => "Scheduled",
        };
        write!(f, "{name}")
    }
}

/// One condition flag on a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub kind: ConditionKind,
    pub status: bool,
}

/// Point-in-time view of a single resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub namespace: String,
    pub name: String,
    pub phase: Phase,
    pub conditions: Vec<Condition>,
    pub labels: BTreeMap<String, String>,
}

impl ResourceDescriptor {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, phase: Phase) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            phase,
            conditions: vec![],
            labels: BTreeMap::new(),
        }
    }

    pub fn with_condition(mut self, kind: ConditionKind, status: bool) -> Self {
        self.conditions.push(Condition { kind, status });
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Looks up a condition flag; absent conditions yield `None`.
    pub fn condition(&self, kind: ConditionKind) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.kind == kind)
    }

    /// Whether the given condition is present and true.
    pub fn is_condition_true(&self, kind: ConditionKind) -> bool {
        self.condition(kind).map(|c| c.status).unwrap_or(false)
    }
}

/// Resources returned by one collection query.
///
/// A snapshot is owned by the poll tick that fetched it and discarded
/// once the predicate has looked at it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub items: Vec<ResourceDescriptor>,
}

impl ResourceSnapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl From<Vec<ResourceDescriptor>> for ResourceSnapshot {
    fn from(items: Vec<ResourceDescriptor>) -> Self {
        Self { items }
    }
}

/// Generic query/watch/delete access to named resource collections.
///
/// This is the full surface the engine consumes; the system under test
/// provides the implementation.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    type Watch: EventSource;

    /// Lists a collection, filtered by `selector`.
    async fn list(
        &self,
        kind: ResourceKind,
        namespace: &str,
        selector: &Selector,
    ) -> Result<ResourceSnapshot, ClientError>;

    /// Retrieves a single named resource.
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<ResourceDescriptor, ClientError>;

    /// Opens an event stream over a collection.
    ///
    /// `timeout_secs` is the server-side watch budget; the stream ends
    /// when it expires.
    async fn open_watch(
        &self,
        kind: ResourceKind,
        timeout_secs: u32,
    ) -> Result<Self::Watch, ClientError>;

    /// Deletes a single named resource.
    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClientError>;
}

/// Best-effort cleanup delete: failures are logged, never propagated.
pub async fn delete_best_effort<C: ResourceClient>(
    client: &C,
    kind: ResourceKind,
    namespace: &str,
    name: &str,
) {
    match client.delete(kind, namespace, name).await {
        Ok(()) => debug!(%kind, namespace, name, "deleted"),
        Err(ClientError::NotFound) => debug!(%kind, namespace, name, "already gone"),
        Err(err) => warn!(%kind, namespace, name, %err, "cleanup delete failed"),
    }
}
