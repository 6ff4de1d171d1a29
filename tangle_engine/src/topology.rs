/// Topology adapter.
///
/// Mirrors the vertex store as renderable nodes and edges and is the only
/// code that talks to the [`Renderer`]. Forward references are drawn as
/// placeholder nodes: an edge to an unknown vertex creates a placeholder,
/// the placeholder is promoted in place when the vertex arrives, and it is
/// removed once its last incoming edge is gone.

use std::collections::{BTreeMap, HashMap};

use crate::domain::Vertex;
use crate::graph::Edge;
use crate::keys::VertexKey;
use crate::style::{edge_style, node_style, EdgeStyle, EdgeTone, NodeStyle, Palette};

/// Rendering collaborator.
pub trait Renderer {
    fn add_node(&mut self, key: &VertexKey, style: NodeStyle);
    fn remove_node(&mut self, key: &VertexKey);
    fn add_edge(&mut self, edge: &Edge, style: EdgeStyle);
    fn remove_edge(&mut self, edge: &Edge);
    fn set_node_style(&mut self, key: &VertexKey, style: NodeStyle);
    fn set_edge_style(&mut self, edge: &Edge, style: EdgeStyle);

    fn pause(&mut self) {}
    fn resume(&mut self) {}
}

/// Renderer that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn add_node(&mut self, _: &VertexKey, _: NodeStyle) {}
    fn remove_node(&mut self, _: &VertexKey) {}
    fn add_edge(&mut self, _: &Edge, _: EdgeStyle) {}
    fn remove_edge(&mut self, _: &Edge) {}
    fn set_node_style(&mut self, _: &VertexKey, _: NodeStyle) {}
    fn set_edge_style(&mut self, _: &Edge, _: EdgeStyle) {}
}

/// One call made on a [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCommand {
    AddNode(VertexKey, NodeStyle),
    RemoveNode(VertexKey),
    AddEdge(Edge, EdgeStyle),
    RemoveEdge(Edge),
    SetNodeStyle(VertexKey, NodeStyle),
    SetEdgeStyle(Edge, EdgeStyle),
    Pause,
    Resume,
}

/// Renderer that records every command and keeps the resulting scene.
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    pub commands: Vec<RenderCommand>,
    pub nodes: BTreeMap<VertexKey, NodeStyle>,
    pub edges: BTreeMap<Edge, EdgeStyle>,
    pub paused: bool,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_node(&self, key: &str) -> bool {
        self.nodes.contains_key(&VertexKey::from(key))
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges
            .contains_key(&Edge::new(VertexKey::from(from), VertexKey::from(to)))
    }

    pub fn edge_style(&self, from: &str, to: &str) -> Option<EdgeStyle> {
        self.edges
            .get(&Edge::new(VertexKey::from(from), VertexKey::from(to)))
            .copied()
    }
}

impl Renderer for RecordingRenderer {
    fn add_node(&mut self, key: &VertexKey, style: NodeStyle) {
        self.nodes.insert(key.clone(), style);
        self.commands.push(RenderCommand::AddNode(key.clone(), style));
    }

    fn remove_node(&mut self, key: &VertexKey) {
        self.nodes.remove(key);
        self.commands.push(RenderCommand::RemoveNode(key.clone()));
    }

    fn add_edge(&mut self, edge: &Edge, style: EdgeStyle) {
        self.edges.insert(edge.clone(), style);
        self.commands.push(RenderCommand::AddEdge(edge.clone(), style));
    }

    fn remove_edge(&mut self, edge: &Edge) {
        self.edges.remove(edge);
        self.commands.push(RenderCommand::RemoveEdge(edge.clone()));
    }

    fn set_node_style(&mut self, key: &VertexKey, style: NodeStyle) {
        self.nodes.insert(key.clone(), style);
        self.commands.push(RenderCommand::SetNodeStyle(key.clone(), style));
    }

    fn set_edge_style(&mut self, edge: &Edge, style: EdgeStyle) {
        self.edges.insert(edge.clone(), style);
        self.commands.push(RenderCommand::SetEdgeStyle(edge.clone(), style));
    }

    fn pause(&mut self) {
        self.paused = true;
        self.commands.push(RenderCommand::Pause);
    }

    fn resume(&mut self) {
        self.paused = false;
        self.commands.push(RenderCommand::Resume);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Backed by a stored vertex.
    Vertex,
    /// Target of a reference to a vertex that is not stored.
    Placeholder,
}

#[derive(Debug, Clone, Copy)]
struct NodeEntry {
    kind: NodeKind,
    style: NodeStyle,
}

#[derive(Debug)]
pub struct Topology<R: Renderer> {
    renderer: R,
    palette: Palette,
    nodes: HashMap<VertexKey, NodeEntry>,
    edges: HashMap<Edge, EdgeStyle>,
    outgoing: HashMap<VertexKey, Vec<Edge>>,
    incoming: HashMap<VertexKey, Vec<Edge>>,
}

impl<R: Renderer> Topology<R> {
    pub fn new(renderer: R, palette: Palette) -> Self {
        Self {
            renderer,
            palette,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn node_kind(&self, key: &VertexKey) -> Option<NodeKind> {
        self.nodes.get(key).map(|n| n.kind)
    }

    pub fn node_style(&self, key: &VertexKey) -> Option<NodeStyle> {
        self.nodes.get(key).map(|n| n.style)
    }

    pub fn edge_style(&self, edge: &Edge) -> Option<EdgeStyle> {
        self.edges.get(edge).copied()
    }

    pub fn has_edge(&self, edge: &Edge) -> bool {
        self.edges.contains_key(edge)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&VertexKey, NodeKind)> {
        self.nodes.iter().map(|(k, n)| (k, n.kind))
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.keys()
    }

    /// Edges pointing at `key`.
    pub fn incoming(&self, key: &VertexKey) -> &[Edge] {
        self.incoming.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Draw or redraw a stored vertex and the edges to its parents.
    pub fn draw_vertex(&mut self, vertex: &Vertex) {
        let style = node_style(Some(vertex), &self.palette);
        match self.nodes.get_mut(&vertex.key) {
            Some(entry) => {
                entry.kind = NodeKind::Vertex;
                if entry.style != style {
                    entry.style = style;
                    self.renderer.set_node_style(&vertex.key, style);
                }
            }
            None => {
                self.nodes.insert(
                    vertex.key.clone(),
                    NodeEntry {
                        kind: NodeKind::Vertex,
                        style,
                    },
                );
                self.renderer.add_node(&vertex.key, style);
            }
        }
        for parent in vertex.parents() {
            self.ensure_edge(Edge::new(vertex.key.clone(), parent.clone()));
        }
    }

    /// Update the style of an already drawn vertex.
    pub fn restyle(&mut self, vertex: &Vertex) {
        let style = node_style(Some(vertex), &self.palette);
        if let Some(entry) = self.nodes.get_mut(&vertex.key) {
            if entry.style != style {
                entry.style = style;
                self.renderer.set_node_style(&vertex.key, style);
            }
        }
    }

    /// Add `edge` if absent, creating a placeholder for an unknown target.
    pub fn ensure_edge(&mut self, edge: Edge) {
        if self.edges.contains_key(&edge) {
            return;
        }
        if !self.nodes.contains_key(&edge.to) {
            let style = node_style(None, &self.palette);
            self.nodes.insert(
                edge.to.clone(),
                NodeEntry {
                    kind: NodeKind::Placeholder,
                    style,
                },
            );
            self.renderer.add_node(&edge.to, style);
        }
        let style = edge_style(EdgeTone::Default, &self.palette);
        self.renderer.add_edge(&edge, style);
        self.outgoing.entry(edge.from.clone()).or_default().push(edge.clone());
        self.incoming.entry(edge.to.clone()).or_default().push(edge.clone());
        self.edges.insert(edge, style);
    }

    pub fn set_edge_tone(&mut self, edge: &Edge, tone: EdgeTone) {
        let style = edge_style(tone, &self.palette);
        if let Some(current) = self.edges.get_mut(edge) {
            if *current != style {
                *current = style;
                self.renderer.set_edge_style(edge, style);
            }
        }
    }

    /// Remove a node (vertex or placeholder) with all incident edges.
    /// Placeholders left without incoming edges are removed as well.
    pub fn remove_node(&mut self, key: &VertexKey) -> bool {
        if self.nodes.remove(key).is_none() {
            return false;
        }
        for edge in self.incoming.remove(key).unwrap_or_default() {
            self.edges.remove(&edge);
            if let Some(list) = self.outgoing.get_mut(&edge.from) {
                list.retain(|e| *e != edge);
                if list.is_empty() {
                    self.outgoing.remove(&edge.from);
                }
            }
            self.renderer.remove_edge(&edge);
        }
        for edge in self.outgoing.remove(key).unwrap_or_default() {
            self.edges.remove(&edge);
            if let Some(list) = self.incoming.get_mut(&edge.to) {
                list.retain(|e| *e != edge);
                if list.is_empty() {
                    self.incoming.remove(&edge.to);
                }
            }
            self.renderer.remove_edge(&edge);
            self.collect_placeholder(&edge.to);
        }
        self.renderer.remove_node(key);
        true
    }

    pub fn pause(&mut self) {
        self.renderer.pause();
    }

    pub fn resume(&mut self) {
        self.renderer.resume();
    }

    /// Remove every edge and node from the renderer.
    pub fn clear(&mut self) {
        for edge in self.edges.keys() {
            self.renderer.remove_edge(edge);
        }
        for key in self.nodes.keys() {
            self.renderer.remove_node(key);
        }
        self.nodes.clear();
        self.edges.clear();
        self.outgoing.clear();
        self.incoming.clear();
    }

    fn collect_placeholder(&mut self, key: &VertexKey) {
        let orphaned = matches!(
            self.nodes.get(key),
            Some(NodeEntry { kind: NodeKind::Placeholder, .. })
        ) && !self.incoming.contains_key(key);
        if orphaned {
            self.nodes.remove(key);
            self.renderer.remove_node(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(id: &str, trunk: Option<&str>, branch: Option<&str>) -> Vertex {
        Vertex {
            id: id.into(),
            key: VertexKey::from(id),
            tag: None,
            trunk: trunk.map(VertexKey::from),
            branch: branch.map(VertexKey::from),
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

    fn topology() -> Topology<RecordingRenderer> {
        Topology::new(RecordingRenderer::new(), Palette::default())
    }

    #[test]
    fn forward_reference_creates_placeholder() {
        let mut t = topology();
        t.draw_vertex(&vertex("b", Some("a"), None));
        assert_eq!(t.node_kind(&VertexKey::from("a")), Some(NodeKind::Placeholder));
        assert_eq!(
            t.node_style(&VertexKey::from("a")),
            Some(node_style(None, &Palette::default()))
        );
        assert!(t.renderer().has_edge("b", "a"));
    }

    #[test]
    fn placeholder_promoted_on_arrival() {
        let mut t = topology();
        t.draw_vertex(&vertex("b", Some("a"), None));
        t.draw_vertex(&vertex("a", None, None));
        assert_eq!(t.node_kind(&VertexKey::from("a")), Some(NodeKind::Vertex));
        assert_eq!(t.node_count(), 2);
        assert_eq!(t.edge_count(), 1);
        let adds = t
            .renderer()
            .commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::AddNode(k, _) if k.as_str() == "a"))
            .count();
        assert_eq!(adds, 1);
    }

    #[test]
    fn identical_parents_draw_one_edge() {
        let mut t = topology();
        t.draw_vertex(&vertex("b", Some("a"), Some("a")));
        assert_eq!(t.edge_count(), 1);
    }

    #[test]
    fn removing_child_collects_orphaned_placeholder() {
        let mut t = topology();
        t.draw_vertex(&vertex("b", Some("a"), None));
        t.draw_vertex(&vertex("c", Some("a"), None));
        t.remove_node(&VertexKey::from("b"));
        assert!(t.renderer().has_node("a"));
        t.remove_node(&VertexKey::from("c"));
        assert!(!t.renderer().has_node("a"));
        assert_eq!(t.node_count(), 0);
        assert_eq!(t.edge_count(), 0);
    }

    #[test]
    fn removing_parent_drops_incoming_edges() {
        let mut t = topology();
        t.draw_vertex(&vertex("a", None, None));
        t.draw_vertex(&vertex("b", Some("a"), None));
        t.remove_node(&VertexKey::from("a"));
        assert!(!t.renderer().has_edge("b", "a"));
        assert!(t.renderer().has_node("b"));
        assert!(t.incoming(&VertexKey::from("a")).is_empty());
    }

    #[test]
    fn edge_tone_changes_once() {
        let mut t = topology();
        t.draw_vertex(&vertex("b", Some("a"), None));
        let edge = Edge::new(VertexKey::from("b"), VertexKey::from("a"));
        t.set_edge_tone(&edge, EdgeTone::Approvees);
        t.set_edge_tone(&edge, EdgeTone::Approvees);
        let sets = t
            .renderer()
            .commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::SetEdgeStyle(..)))
            .count();
        assert_eq!(sets, 1);
        assert_eq!(
            t.renderer().edge_style("b", "a").map(|s| s.color),
            Some(Palette::default().link_approvees)
        );
    }

    #[test]
    fn clear_empties_renderer() {
        let mut t = topology();
        t.draw_vertex(&vertex("b", Some("a"), None));
        t.clear();
        assert!(t.renderer().nodes.is_empty());
        assert!(t.renderer().edges.is_empty());
        assert_eq!(t.node_count(), 0);
    }
}
