/// Inbound event definitions.
///
/// Events are pure data. They carry the state reported by the node and
/// contain no transition logic.

use serde::{Deserialize, Serialize};

/// Closed set of events the engine handles, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TangleEvent {
    VertexCreated(VertexData),
    SolidityChanged {
        id: String,
    },
    ConfirmationChanged {
        id: String,
        #[serde(default)]
        excluded_ids: Vec<String>,
    },
    MilestoneMarked {
        id: String,
    },
    TipStatusChanged {
        id: String,
        is_tip: bool,
    },
}

/// Discriminant of a [`TangleEvent`], used in results and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    VertexCreated,
    SolidityChanged,
    ConfirmationChanged,
    MilestoneMarked,
    TipStatusChanged,
}

impl TangleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TangleEvent::VertexCreated(_) => EventKind::VertexCreated,
            TangleEvent::SolidityChanged { .. } => EventKind::SolidityChanged,
            TangleEvent::ConfirmationChanged { .. } => EventKind::ConfirmationChanged,
            TangleEvent::MilestoneMarked { .. } => EventKind::MilestoneMarked,
            TangleEvent::TipStatusChanged { .. } => EventKind::TipStatusChanged,
        }
    }

    /// Identifier of the vertex the event is about.
    pub fn id(&self) -> &str {
        match self {
            TangleEvent::VertexCreated(data) => &data.id,
            TangleEvent::SolidityChanged { id }
            | TangleEvent::ConfirmationChanged { id, .. }
            | TangleEvent::MilestoneMarked { id }
            | TangleEvent::TipStatusChanged { id, .. } => id,
        }
    }

    pub fn solidity(id: &str) -> Self {
        TangleEvent::SolidityChanged { id: id.to_string() }
    }

    pub fn confirmation(id: &str, excluded_ids: &[&str]) -> Self {
        TangleEvent::ConfirmationChanged {
            id: id.to_string(),
            excluded_ids: excluded_ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn milestone(id: &str) -> Self {
        TangleEvent::MilestoneMarked { id: id.to_string() }
    }

    pub fn tip_status(id: &str, is_tip: bool) -> Self {
        TangleEvent::TipStatusChanged {
            id: id.to_string(),
            is_tip,
        }
    }
}

/// Payload of a `vertex_created` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexData {
    pub id: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub trunk: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub solid: bool,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub conflicting: bool,
    #[serde(default)]
    pub milestone: bool,
    #[serde(default)]
    pub tip: bool,
}

impl VertexData {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn with_trunk(mut self, trunk: &str) -> Self {
        self.trunk = Some(trunk.to_string());
        self
    }

    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branch = Some(branch.to_string());
        self
    }

    pub fn solid(mut self) -> Self {
        self.solid = true;
        self
    }

    pub fn confirmed(mut self) -> Self {
        self.confirmed = true;
        self
    }

    pub fn conflicting(mut self) -> Self {
        self.conflicting = true;
        self
    }

    pub fn milestone(mut self) -> Self {
        self.milestone = true;
        self
    }

    pub fn tip(mut self) -> Self {
        self.tip = true;
        self
    }

    pub fn into_event(self) -> TangleEvent {
        TangleEvent::VertexCreated(self)
    }
}
