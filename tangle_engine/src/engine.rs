/// Tangle engine.
///
/// Top-level orchestrator. Routes events to `transitions`, interaction to
/// `selection`, and optionally validates invariants after every event.
/// Single-threaded: every method takes `&mut self` and completes
/// synchronously.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::counters::AggregateCounts;
use crate::domain::{DropReason, TransitionResult, Vertex};
use crate::error::ConfigError;
use crate::events::TangleEvent;
use crate::graph::{self, Direction, Visit};
use crate::invariants::validate_invariants;
use crate::keys::VertexKey;
use crate::selection::{SearchState, Selection};
use crate::state::VertexStore;
use crate::topology::{NullRenderer, Renderer, Topology};
use crate::transitions;
use crate::window::EvictionWindow;

/// Route of the explorer page for a transaction.
pub const EXPLORER_TX_ROUTE: &str = "/explorer/tx/";

pub struct TangleEngine<R: Renderer = NullRenderer> {
    pub(crate) config: EngineConfig,
    pub(crate) store: VertexStore,
    pub(crate) window: EvictionWindow,
    pub(crate) topology: Topology<R>,
    pub(crate) selection: Option<Selection>,
    pub(crate) search: SearchState,
    pub(crate) collecting: bool,
    pub(crate) paused: bool,
    pub(crate) dropped_events: u64,
}

impl TangleEngine<NullRenderer> {
    /// Engine with default configuration and no renderer.
    pub fn headless() -> Self {
        Self::new(NullRenderer)
    }
}

impl<R: Renderer> TangleEngine<R> {
    /// Engine with default configuration. Not collecting until `start`.
    pub fn new(renderer: R) -> Self {
        let config = EngineConfig::default();
        let palette = crate::style::Palette::default();
        Self {
            window: EvictionWindow::new(config.capacity),
            config,
            store: VertexStore::new(),
            topology: Topology::new(renderer, palette),
            selection: None,
            search: SearchState::default(),
            collecting: false,
            paused: false,
            dropped_events: 0,
        }
    }

    /// Engine with a validated configuration.
    pub fn with_config(config: EngineConfig, renderer: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let palette = config.palette.resolve()?;
        Ok(Self {
            window: EvictionWindow::new(config.capacity),
            config,
            store: VertexStore::new(),
            topology: Topology::new(renderer, palette),
            selection: None,
            search: SearchState::default(),
            collecting: false,
            paused: false,
            dropped_events: 0,
        })
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Begin accepting events.
    pub fn start(&mut self) {
        info!(capacity = self.window.capacity(), "tangle engine collecting");
        self.collecting = true;
    }

    /// Stop accepting events and drop all state.
    pub fn stop(&mut self) {
        info!(vertices = self.store.len(), "tangle engine stopped");
        self.collecting = false;
        if self.paused {
            self.topology.resume();
            self.paused = false;
        }
        self.selection = None;
        self.dropped_events = 0;
        self.topology.clear();
        self.store.clear();
        self.window.clear();
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// Toggle the render loop.
    pub fn pause_resume(&mut self) {
        if self.paused {
            self.topology.resume();
            self.paused = false;
        } else {
            self.topology.pause();
            self.paused = true;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // ── Events ─────────────────────────────────────────────────────

    /// Apply one event. Events are ignored while not collecting.
    pub fn apply_event(&mut self, event: &TangleEvent) -> TransitionResult {
        if !self.collecting {
            debug!(kind = ?event.kind(), "engine not collecting, ignoring event");
            return TransitionResult::dropped(event.kind(), DropReason::NotCollecting);
        }
        let result = transitions::apply_event(self, event);
        if self.config.check_invariants {
            validate_invariants(self);
        }
        result
    }

    /// Apply events in order.
    pub fn apply_sequence(&mut self, events: &[TangleEvent]) -> Vec<TransitionResult> {
        events.iter().map(|e| self.apply_event(e)).collect()
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Store key for an identifier under the configured key length.
    pub fn key_for(&self, id: &str) -> VertexKey {
        VertexKey::derive(id, self.config.key_length)
    }

    pub fn get(&self, id: &str) -> Option<&Vertex> {
        self.store.get(self.key_for(id).as_str())
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn counts(&self) -> AggregateCounts {
        self.store.counts()
    }

    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    /// Change the window capacity. A lower capacity is enforced at the
    /// next vertex admission.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.window.set_capacity(capacity, self.store.len());
        self.config.capacity = capacity;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &VertexStore {
        &self.store
    }

    pub fn window(&self) -> &EvictionWindow {
        &self.window
    }

    pub fn topology(&self) -> &Topology<R> {
        &self.topology
    }

    pub fn renderer(&self) -> &R {
        self.topology.renderer()
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        self.topology.renderer_mut()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Stored vertices in the cone of `id`, `id` first, in walk order.
    pub fn cone(&self, id: &str, direction: Direction) -> Vec<VertexKey> {
        graph::cone(&self.store, &self.key_for(id), direction)
    }

    /// [`cone`](Self::cone) limited to `budget` vertices. The flag is set
    /// when the walk stopped with vertices still queued.
    pub fn cone_bounded(&self, id: &str, direction: Direction, budget: usize) -> (Vec<VertexKey>, bool) {
        let mut keys = Vec::new();
        let stats = graph::walk_bounded(
            &self.store,
            &self.key_for(id),
            direction,
            budget,
            |key| {
                keys.push(key.clone());
                Visit::Continue
            },
            |_| {},
        );
        (keys, stats.truncated)
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    /// Explorer route for the vertex behind a node, opened on double click.
    pub fn explorer_path(&self, id: &str) -> Option<String> {
        self.get(id).map(|v| format!("{}{}", EXPLORER_TX_ROUTE, v.id))
    }

    /// Snapshot of everything the UI displays.
    pub fn observe(&self) -> Observation {
        Observation {
            size: self.store.len(),
            counts: self.store.counts(),
            selection: self.selection.as_ref().map(|s| SelectionView {
                id: self
                    .store
                    .get(s.key.as_str())
                    .map(|v| v.id.clone())
                    .unwrap_or_else(|| s.key.as_str().to_string()),
                pinned: s.pinned,
                approvers: s.approvers,
                approvees: s.approvees,
            }),
            search: self.search.input().to_string(),
            search_filter: self.search.filter().to_string(),
            capacity: self.window.capacity(),
            paused: self.paused,
            collecting: self.collecting,
            dropped_events: self.dropped_events,
        }
    }
}

/// Observable engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub size: usize,
    pub counts: AggregateCounts,
    pub selection: Option<SelectionView>,
    pub search: String,
    pub search_filter: String,
    pub capacity: usize,
    pub paused: bool,
    pub collecting: bool,
    pub dropped_events: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionView {
    pub id: String,
    pub pinned: bool,
    pub approvers: usize,
    pub approvees: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::VertexData;
    use crate::topology::{RecordingRenderer, RenderCommand};

    fn engine() -> TangleEngine<RecordingRenderer> {
        let mut e = TangleEngine::new(RecordingRenderer::new());
        e.start();
        e
    }

    #[test]
    fn events_ignored_until_started() {
        let mut e = TangleEngine::headless();
        let result = e.apply_event(&VertexData::new("a").into_event());
        assert_eq!(result.dropped, Some(DropReason::NotCollecting));
        assert!(e.is_empty());
        e.start();
        assert!(e.apply_event(&VertexData::new("a").into_event()).applied);
        assert_eq!(e.len(), 1);
    }

    #[test]
    fn stop_resets_everything() {
        let mut e = engine();
        e.apply_event(&VertexData::new("a").solid().tip().into_event());
        e.apply_event(&VertexData::new("b").with_trunk("a").into_event());
        e.select("a", true);
        e.stop();
        assert!(e.is_empty());
        assert_eq!(e.counts(), AggregateCounts::default());
        assert!(e.selection().is_none());
        assert!(e.renderer().nodes.is_empty());
        assert!(!e.is_collecting());
    }

    #[test]
    fn pause_resume_toggles_renderer() {
        let mut e = engine();
        e.pause_resume();
        assert!(e.is_paused() && e.renderer().paused);
        e.pause_resume();
        assert!(!e.is_paused() && !e.renderer().paused);
        assert_eq!(
            &e.renderer().commands[..],
            &[RenderCommand::Pause, RenderCommand::Resume]
        );
    }

    #[test]
    fn explorer_path_uses_full_id() {
        let mut e = engine();
        e.apply_event(&VertexData::new("abcdef0123456789").into_event());
        assert_eq!(
            e.explorer_path("abcdef0123456789").as_deref(),
            Some("/explorer/tx/abcdef0123456789")
        );
        assert!(e.explorer_path("nope").is_none());
    }

    #[test]
    fn observation_reflects_state() {
        let mut e = engine();
        e.apply_event(&VertexData::new("a").solid().into_event());
        e.update_search("  a ");
        e.set_capacity(10);
        let obs = e.observe();
        assert_eq!(obs.size, 1);
        assert_eq!(obs.counts.solid, 1);
        assert_eq!(obs.search, "a");
        assert_eq!(obs.search_filter, "");
        assert_eq!(obs.capacity, 10);
        assert!(obs.collecting && !obs.paused);
    }

    #[test]
    fn cone_query_follows_direction() {
        let mut e = engine();
        e.apply_event(&VertexData::new("a").into_event());
        e.apply_event(&VertexData::new("b").with_trunk("a").into_event());
        let past: Vec<String> = e.cone("b", Direction::Past).iter().map(|k| k.as_str().to_string()).collect();
        assert_eq!(past, vec!["b", "a"]);
        assert_eq!(e.cone("b", Direction::Future).len(), 1);
        assert!(e.cone("zz", Direction::Past).is_empty());
    }

    #[test]
    fn bounded_cone_reports_truncation() {
        let mut e = engine();
        e.apply_event(&VertexData::new("a").into_event());
        e.apply_event(&VertexData::new("b").with_trunk("a").into_event());
        e.apply_event(&VertexData::new("c").with_trunk("b").into_event());
        let (keys, truncated) = e.cone_bounded("c", Direction::Past, 2);
        assert_eq!(keys.len(), 2);
        assert!(truncated);
        let (keys, truncated) = e.cone_bounded("c", Direction::Past, 10);
        assert_eq!(keys.len(), 3);
        assert!(!truncated);
    }

    #[test]
    fn with_config_rejects_bad_palette() {
        let mut config = EngineConfig::default();
        config.palette.tip = Some("#12".into());
        assert!(TangleEngine::with_config(config, NullRenderer).is_err());
    }
}
