/// Selection and search.
///
/// At most one vertex is selected. Hover selects transiently, click pins.
/// Selecting colors the edges of both cones and records their sizes;
/// releasing restores the default edge color along the same cones.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::TangleEngine;
use crate::graph::{walk, Direction, Visit};
use crate::keys::VertexKey;
use crate::style::EdgeTone;
use crate::topology::Renderer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub key: VertexKey,
    /// Set by click; a pinned selection ignores hover.
    pub pinned: bool,
    /// Future cone size, the selected vertex excluded.
    pub approvers: usize,
    /// Past cone size, the selected vertex excluded.
    pub approvees: usize,
}

/// Search box text and the filter last applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    input: String,
    filter: String,
}

impl SearchState {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Substring match against id or tag. An empty filter matches nothing.
    pub fn matches(&self, id: &str, tag: Option<&str>) -> bool {
        if self.filter.is_empty() {
            return false;
        }
        id.contains(&self.filter) || tag.map_or(false, |t| t.contains(&self.filter))
    }
}

impl<R: Renderer> TangleEngine<R> {
    /// Select a stored vertex. Returns false for unknown ids and for
    /// placeholders.
    pub fn select(&mut self, id: &str, pinned: bool) -> bool {
        let key = self.key_for(id);
        if !self.store.contains(key.as_str()) {
            return false;
        }
        self.release_selection();

        self.store.set_selected(key.as_str(), true);
        if let Some(v) = self.store.get(key.as_str()) {
            self.topology.restyle(v);
        }
        let approvers = self.tone_cone(&key, Direction::Future, EdgeTone::Approvers);
        let approvees = self.tone_cone(&key, Direction::Past, EdgeTone::Approvees);
        debug!(key = %key, pinned, approvers, approvees, "vertex selected");
        self.selection = Some(Selection {
            key,
            pinned,
            approvers,
            approvees,
        });
        true
    }

    /// Clear an unpinned selection. Returns true if something was cleared.
    pub fn clear_selection(&mut self) -> bool {
        match &self.selection {
            Some(s) if !s.pinned => {
                self.release_selection();
                true
            }
            _ => false,
        }
    }

    /// Pointer entered a node.
    pub fn on_hover(&mut self, id: &str) {
        if self.selection.as_ref().map_or(false, |s| s.pinned) {
            return;
        }
        self.select(id, false);
    }

    /// Pointer left a node.
    pub fn on_hover_end(&mut self) {
        self.clear_selection();
    }

    /// Click pins the vertex; clicking the pinned vertex again unpins it.
    pub fn on_click(&mut self, id: &str) {
        let key = self.key_for(id);
        let toggles_off = matches!(&self.selection, Some(s) if s.pinned && s.key == key);
        if toggles_off {
            self.release_selection();
        } else {
            self.select(id, true);
        }
    }

    /// Explorer route to open for a double-clicked node.
    pub fn on_double_click(&self, id: &str) -> Option<String> {
        self.explorer_path(id)
    }

    /// Clear the selection regardless of pin state.
    pub(crate) fn release_selection(&mut self) {
        let Some(selection) = self.selection.take() else {
            return;
        };
        let key = selection.key;
        if self.store.set_selected(key.as_str(), false).is_some() {
            if let Some(v) = self.store.get(key.as_str()) {
                self.topology.restyle(v);
            }
        }
        self.tone_cone(&key, Direction::Future, EdgeTone::Default);
        self.tone_cone(&key, Direction::Past, EdgeTone::Default);
        debug!(key = %key, "selection released");
    }

    /// Color the edges of one cone. Returns the cone size without `key`.
    fn tone_cone(&mut self, key: &VertexKey, direction: Direction, tone: EdgeTone) -> usize {
        let topology = &mut self.topology;
        let stats = walk(
            &self.store,
            key,
            direction,
            |_| Visit::Continue,
            |edge| topology.set_edge_tone(edge, tone),
        );
        stats.visited.saturating_sub(1)
    }

    // ── Search ─────────────────────────────────────────────────────

    /// Set the search box text. Nothing is highlighted until applied.
    pub fn update_search(&mut self, input: &str) {
        self.search.input = input.trim().to_string();
    }

    /// Apply the current search text. Returns the number of vertices whose
    /// highlight changed.
    pub fn search_and_highlight(&mut self) -> usize {
        self.search.filter = self.search.input.clone();
        let search = &self.search;
        let changed = self
            .store
            .rehighlight(|v| search.matches(&v.id, v.tag.as_deref()));
        for key in &changed {
            if let Some(v) = self.store.get(key.as_str()) {
                self.topology.restyle(v);
            }
        }
        debug!(filter = %self.search.filter, changed = changed.len(), "search applied");
        changed.len()
    }

    /// Empty the search box and remove all highlights.
    pub fn clear_search(&mut self) -> usize {
        self.search.input.clear();
        self.search_and_highlight()
    }
}
