/// Core domain types.
///
/// Pure data. Flag transitions live in `state` and `transitions`.

use serde::{Deserialize, Serialize};

use crate::events::EventKind;
use crate::keys::VertexKey;

// ── Vertex ─────────────────────────────────────────────────────────

/// A transaction in the tracked DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    /// Full-length identifier as delivered by the event source.
    pub id: String,
    pub key: VertexKey,
    pub tag: Option<String>,
    pub trunk: Option<VertexKey>,
    pub branch: Option<VertexKey>,
    pub solid: bool,
    pub confirmed: bool,
    pub conflicting: bool,
    pub milestone: bool,
    pub tip: bool,
    pub selected: bool,
    pub highlighted: bool,
    /// Arrival sequence number assigned by the eviction window.
    pub arrival: u64,
}

impl Vertex {
    /// Parent references, trunk first. A branch equal to the trunk is
    /// reported once.
    pub fn parents(&self) -> impl Iterator<Item = &VertexKey> {
        let branch = match (&self.trunk, &self.branch) {
            (Some(t), Some(b)) if t == b => None,
            (_, b) => b.as_ref(),
        };
        self.trunk.iter().chain(branch)
    }

    /// True if `key` is the trunk or branch of this vertex.
    pub fn references(&self, key: &VertexKey) -> bool {
        self.trunk.as_ref() == Some(key) || self.branch.as_ref() == Some(key)
    }

    /// Confirmed or conflicting; either state is final.
    pub fn is_decided(&self) -> bool {
        self.confirmed || self.conflicting
    }
}

// ── Transition outcome ─────────────────────────────────────────────

/// Why an event left the store untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Derived event for an id the store does not hold.
    UnknownVertex,
    /// The engine is not collecting.
    NotCollecting,
}

/// Structured outcome of applying one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionResult {
    pub event_kind: EventKind,
    pub applied: bool,
    pub dropped: Option<DropReason>,
    /// True if the event admitted a vertex that was not stored before.
    pub admitted: bool,
    /// Keys removed by the eviction window while processing the event.
    pub evicted: Vec<VertexKey>,
    /// Vertices marked confirmed by this event.
    pub newly_confirmed: usize,
    /// Vertices marked conflicting by this event.
    pub newly_conflicting: usize,
}

impl TransitionResult {
    pub(crate) fn applied(event_kind: EventKind) -> Self {
        Self {
            event_kind,
            applied: true,
            dropped: None,
            admitted: false,
            evicted: Vec::new(),
            newly_confirmed: 0,
            newly_conflicting: 0,
        }
    }

    pub(crate) fn dropped(event_kind: EventKind, reason: DropReason) -> Self {
        Self {
            applied: false,
            dropped: Some(reason),
            ..Self::applied(event_kind)
        }
    }
}
