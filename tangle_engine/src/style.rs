/// Visual attributes derived from vertex state.
///
/// All functions here are pure: the same vertex and palette always yield
/// the same style.

use serde::{Deserialize, Serialize};

use crate::domain::Vertex;
use crate::error::StyleError;

pub const SIZE_SMALL: u32 = 10;
pub const SIZE_MEDIUM: u32 = 20;
pub const SIZE_BIG: u32 = 30;

/// RGBA color packed as `0xRRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    /// Opaque color from a `0xRRGGBB` literal.
    pub const fn rgb(hex: u32) -> Self {
        Color((hex << 8) | 0xff)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse(value: &str) -> Result<Self, StyleError> {
        let digits = value
            .strip_prefix('#')
            .ok_or_else(|| StyleError::MissingHash(value.to_string()))?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StyleError::BadDigit(value.to_string()));
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => digits.to_string(),
            _ => return Err(StyleError::BadLength(value.to_string())),
        };
        let rgba = u32::from_str_radix(&expanded, 16)
            .map_err(|_| StyleError::BadDigit(value.to_string()))?;
        if expanded.len() == 8 {
            Ok(Color(rgba))
        } else {
            Ok(Color::rgb(rgba))
        }
    }

    /// `#rrggbbaa`
    pub fn to_hex(&self) -> String {
        format!("#{:08x}", self.0)
    }
}

/// Colors used for nodes and edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub solid: Color,
    pub unsolid: Color,
    pub confirmed: Color,
    pub conflicting: Color,
    pub milestone: Color,
    pub tip: Color,
    pub unknown: Color,
    pub highlighted: Color,
    pub selected: Color,
    pub link: Color,
    pub link_approvers: Color,
    pub link_approvees: Color,
}

impl Default for Palette {
    // Solarized
    fn default() -> Self {
        Self {
            solid: Color::rgb(0x268bd2),
            unsolid: Color::rgb(0x657b83),
            confirmed: Color::rgb(0x5ce000),
            conflicting: Color::rgb(0xd17300),
            milestone: Color::rgb(0xdc322f),
            tip: Color::rgb(0x00d1a4),
            unknown: Color::rgb(0xb58900),
            highlighted: Color::rgb(0xd33682),
            selected: Color::rgb(0xfdf6e3),
            link: Color::rgb(0x586e75),
            link_approvers: Color::rgb(0xff5aaa),
            link_approvees: Color::rgb(0xffc306),
        }
    }
}

/// Color and size of a rendered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub color: Color,
    pub size: u32,
}

/// Color of a rendered edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub color: Color,
}

/// Edge coloring roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTone {
    Default,
    /// Edge inside the future cone of the selection.
    Approvers,
    /// Edge inside the past cone of the selection.
    Approvees,
}

/// Node style by priority: selected > highlighted > milestone > tip >
/// conflicting > confirmed > solid > unsolid. `None` is a placeholder
/// for a referenced but unknown vertex.
pub fn node_style(vertex: Option<&Vertex>, palette: &Palette) -> NodeStyle {
    let Some(v) = vertex else {
        return NodeStyle {
            color: palette.unknown,
            size: SIZE_SMALL,
        };
    };

    let color = if v.selected {
        palette.selected
    } else if v.highlighted {
        palette.highlighted
    } else if v.milestone {
        palette.milestone
    } else if v.tip {
        palette.tip
    } else if v.conflicting {
        palette.conflicting
    } else if v.confirmed {
        palette.confirmed
    } else if v.solid {
        palette.solid
    } else {
        palette.unsolid
    };

    let size = if v.selected || v.highlighted || v.milestone {
        SIZE_BIG
    } else {
        SIZE_MEDIUM
    };

    NodeStyle { color, size }
}

pub fn edge_style(tone: EdgeTone, palette: &Palette) -> EdgeStyle {
    let color = match tone {
        EdgeTone::Default => palette.link,
        EdgeTone::Approvers => palette.link_approvers,
        EdgeTone::Approvees => palette.link_approvees,
    };
    EdgeStyle { color }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::VertexKey;

    fn plain() -> Vertex {
        Vertex {
            id: "v".into(),
            key: VertexKey::from("v"),
            tag: None,
            trunk: None,
            branch: None,
            solid: false,
            confirmed: false,
            conflicting: false,
            milestone: false,
            tip: false,
            selected: false,
            highlighted: false,
            arrival: 0,
        }
    }

    #[test]
    fn parse_short_and_long_forms() {
        assert_eq!(Color::parse("#fff").unwrap(), Color(0xffffffff));
        assert_eq!(Color::parse("#268bd2").unwrap(), Color(0x268bd2ff));
        assert_eq!(Color::parse("#268bd280").unwrap(), Color(0x268bd280));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(matches!(Color::parse("268bd2"), Err(StyleError::MissingHash(_))));
        assert!(matches!(Color::parse("#12345"), Err(StyleError::BadLength(_))));
        assert!(matches!(Color::parse("#zzzzzz"), Err(StyleError::BadDigit(_))));
    }

    #[test]
    fn hex_round_trip() {
        let c = Color::rgb(0x5ce000);
        assert_eq!(c.to_hex(), "#5ce000ff");
        assert_eq!(Color::parse(&c.to_hex()).unwrap(), c);
    }

    #[test]
    fn priority_order() {
        let p = Palette::default();
        let mut v = plain();
        assert_eq!(node_style(Some(&v), &p).color, p.unsolid);
        v.solid = true;
        assert_eq!(node_style(Some(&v), &p).color, p.solid);
        v.confirmed = true;
        assert_eq!(node_style(Some(&v), &p).color, p.confirmed);
        v.conflicting = true;
        assert_eq!(node_style(Some(&v), &p).color, p.conflicting);
        v.tip = true;
        assert_eq!(node_style(Some(&v), &p).color, p.tip);
        v.milestone = true;
        assert_eq!(node_style(Some(&v), &p), NodeStyle { color: p.milestone, size: SIZE_BIG });
        v.highlighted = true;
        assert_eq!(node_style(Some(&v), &p).color, p.highlighted);
        v.selected = true;
        assert_eq!(node_style(Some(&v), &p).color, p.selected);
    }

    #[test]
    fn placeholder_is_small_and_unknown() {
        let p = Palette::default();
        assert_eq!(
            node_style(None, &p),
            NodeStyle { color: p.unknown, size: SIZE_SMALL }
        );
        assert_eq!(node_style(Some(&plain()), &p).size, SIZE_MEDIUM);
    }

    #[test]
    fn edge_tones() {
        let p = Palette::default();
        assert_eq!(edge_style(EdgeTone::Default, &p).color, p.link);
        assert_eq!(edge_style(EdgeTone::Approvers, &p).color, p.link_approvers);
        assert_eq!(edge_style(EdgeTone::Approvees, &p).color, p.link_approvees);
    }
}
