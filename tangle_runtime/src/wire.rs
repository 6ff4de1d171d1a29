/// Websocket frame codec.
///
/// The dashboard hub sends `{"type": <topic>, "data": {...}}` frames. The
/// visualizer consumes topics 8 to 12; every other topic decodes to
/// [`Decoded::Ignored`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use tangle_engine::{TangleEvent, VertexData};

use crate::error::WireError;

/// Length the hub truncates parent and info ids to.
pub const VISUALIZER_ID_LENGTH: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Topic {
    Vertex,
    SolidInfo,
    ConfirmedInfo,
    MilestoneInfo,
    TipInfo,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::Vertex,
        Topic::SolidInfo,
        Topic::ConfirmedInfo,
        Topic::MilestoneInfo,
        Topic::TipInfo,
    ];

    pub fn from_code(code: u8) -> Option<Topic> {
        match code {
            8 => Some(Topic::Vertex),
            9 => Some(Topic::SolidInfo),
            10 => Some(Topic::ConfirmedInfo),
            11 => Some(Topic::MilestoneInfo),
            12 => Some(Topic::TipInfo),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Topic::Vertex => 8,
            Topic::SolidInfo => 9,
            Topic::ConfirmedInfo => 10,
            Topic::MilestoneInfo => 11,
            Topic::TipInfo => 12,
        }
    }
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Events(Topic, Vec<TangleEvent>),
    /// Topic outside the visualizer set.
    Ignored(u8),
}

#[derive(Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    code: u8,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct WireVertex {
    id: String,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    trunk_id: Option<String>,
    #[serde(default)]
    branch_id: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    is_solid: bool,
    #[serde(default, alias = "is_referenced")]
    is_confirmed: bool,
    #[serde(default)]
    is_conflicting: bool,
    #[serde(default)]
    is_milestone: bool,
    #[serde(default)]
    is_tip: bool,
}

#[derive(Deserialize)]
struct WireMeta {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct WireConfirmation {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    ids: Vec<String>,
    #[serde(default)]
    excluded_ids: Vec<String>,
}

#[derive(Deserialize)]
struct WireTip {
    #[serde(default)]
    id: Option<String>,
    is_tip: bool,
}

/// Decode one text frame.
pub fn decode_frame(text: &str) -> Result<Decoded, WireError> {
    let frame: Frame = serde_json::from_str(text).map_err(WireError::Frame)?;
    let Some(topic) = Topic::from_code(frame.code) else {
        return Ok(Decoded::Ignored(frame.code));
    };
    let events = decode_payload(topic, frame.data)?;
    Ok(Decoded::Events(topic, events))
}

fn decode_payload(topic: Topic, data: Value) -> Result<Vec<TangleEvent>, WireError> {
    let payload_err = |source: serde_json::Error| WireError::Payload { topic, source };
    let events = match topic {
        Topic::Vertex => {
            let v: WireVertex = serde_json::from_value(data).map_err(payload_err)?;
            let mut parents = v.parents.into_iter();
            let trunk = v.trunk_id.or_else(|| parents.next());
            let branch = v.branch_id.or_else(|| parents.next());
            vec![TangleEvent::VertexCreated(VertexData {
                id: v.id,
                tag: v.tag,
                trunk,
                branch,
                solid: v.is_solid,
                confirmed: v.is_confirmed,
                conflicting: v.is_conflicting,
                milestone: v.is_milestone,
                tip: v.is_tip,
            })]
        }
        Topic::SolidInfo => {
            let m: WireMeta = serde_json::from_value(data).map_err(payload_err)?;
            let id = m.id.ok_or(WireError::MissingId(topic))?;
            vec![TangleEvent::SolidityChanged { id }]
        }
        Topic::MilestoneInfo => {
            let m: WireMeta = serde_json::from_value(data).map_err(payload_err)?;
            let id = m.id.ok_or(WireError::MissingId(topic))?;
            vec![TangleEvent::MilestoneMarked { id }]
        }
        Topic::ConfirmedInfo => {
            let c: WireConfirmation = serde_json::from_value(data).map_err(payload_err)?;
            let ids: Vec<String> = c.id.into_iter().chain(c.ids).collect();
            if ids.is_empty() {
                return Err(WireError::MissingId(topic));
            }
            ids.into_iter()
                .map(|id| TangleEvent::ConfirmationChanged {
                    id,
                    excluded_ids: c.excluded_ids.clone(),
                })
                .collect()
        }
        Topic::TipInfo => {
            let t: WireTip = serde_json::from_value(data).map_err(payload_err)?;
            let id = t.id.ok_or(WireError::MissingId(topic))?;
            vec![TangleEvent::TipStatusChanged { id, is_tip: t.is_tip }]
        }
    };
    Ok(events)
}

/// Encode an event as a wire frame.
pub fn encode_event(event: &TangleEvent) -> Value {
    let (topic, data) = match event {
        TangleEvent::VertexCreated(v) => (
            Topic::Vertex,
            json!({
                "id": v.id,
                "tag": v.tag,
                "trunk_id": v.trunk,
                "branch_id": v.branch,
                "is_solid": v.solid,
                "is_confirmed": v.confirmed,
                "is_conflicting": v.conflicting,
                "is_milestone": v.milestone,
                "is_tip": v.tip,
            }),
        ),
        TangleEvent::SolidityChanged { id } => (Topic::SolidInfo, json!({ "id": id })),
        TangleEvent::ConfirmationChanged { id, excluded_ids } => (
            Topic::ConfirmedInfo,
            json!({ "ids": [id], "excluded_ids": excluded_ids }),
        ),
        TangleEvent::MilestoneMarked { id } => (Topic::MilestoneInfo, json!({ "id": id })),
        TangleEvent::TipStatusChanged { id, is_tip } => {
            (Topic::TipInfo, json!({ "id": id, "is_tip": is_tip }))
        }
    };
    json!({ "type": topic.code(), "data": data })
}

/// Encode an event as one line of a frame log.
pub fn encode_frame(event: &TangleEvent) -> String {
    encode_event(event).to_string()
}
