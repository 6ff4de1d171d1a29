/// Tangle transition logic.
///
/// ALL store mutation driven by events lives here. Every handler keeps the
/// store, the eviction window and the topology in step before returning.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::config::EvictionPolicy;
use crate::domain::{DropReason, TransitionResult, Vertex};
use crate::engine::TangleEngine;
use crate::events::{EventKind, TangleEvent, VertexData};
use crate::graph::{ConeWalker, Direction, Edge};
use crate::keys::VertexKey;
use crate::topology::Renderer;

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Apply `event` to the engine state in place.
pub(crate) fn apply_event<R: Renderer>(
    engine: &mut TangleEngine<R>,
    event: &TangleEvent,
) -> TransitionResult {
    match event {
        TangleEvent::VertexCreated(data) => apply_vertex_created(engine, data),
        TangleEvent::SolidityChanged { id } => apply_solidity_changed(engine, id),
        TangleEvent::ConfirmationChanged { id, excluded_ids } => {
            apply_confirmation_changed(engine, id, excluded_ids)
        }
        TangleEvent::MilestoneMarked { id } => apply_milestone_marked(engine, id),
        TangleEvent::TipStatusChanged { id, is_tip } => {
            apply_tip_status_changed(engine, id, *is_tip)
        }
    }
}

// ---------------------------------------------------------------------------
// Individual transition handlers (private)
// ---------------------------------------------------------------------------

fn apply_vertex_created<R: Renderer>(
    engine: &mut TangleEngine<R>,
    data: &VertexData,
) -> TransitionResult {
    let mut result = TransitionResult::applied(EventKind::VertexCreated);
    let key = engine.key_for(&data.id);
    let vertex = Vertex {
        id: data.id.clone(),
        key: key.clone(),
        tag: data.tag.clone(),
        trunk: data.trunk.as_deref().map(|t| engine.key_for(t)),
        branch: data.branch.as_deref().map(|b| engine.key_for(b)),
        solid: data.solid,
        confirmed: data.confirmed && !data.conflicting,
        conflicting: data.conflicting,
        milestone: data.milestone,
        tip: data.tip,
        selected: false,
        highlighted: engine.search.matches(&data.id, data.tag.as_deref()),
        arrival: 0,
    };

    if engine.store.contains(key.as_str()) {
        if let Some(outcome) = engine.store.merge(vertex) {
            if outcome.parent_conflict {
                warn!(
                    key = %key,
                    trunk = ?data.trunk,
                    branch = ?data.branch,
                    "vertex re-announced with different parents, keeping stored ones"
                );
            }
        }
        if let Some(stored) = engine.store.get(key.as_str()) {
            engine.topology.draw_vertex(stored);
        }
        return result;
    }

    let mut vertex = vertex;
    vertex.arrival = engine.window.register(&key);
    engine.store.insert(vertex);
    if let Some(stored) = engine.store.get(key.as_str()) {
        engine.topology.draw_vertex(stored);
    }
    // Children that arrived while this vertex was absent.
    for child in engine.store.approvers(key.as_str()) {
        engine
            .topology
            .ensure_edge(Edge::new(child.clone(), key.clone()));
    }
    result.admitted = true;
    result.evicted = enforce_window(engine);
    result
}

fn apply_solidity_changed<R: Renderer>(engine: &mut TangleEngine<R>, id: &str) -> TransitionResult {
    let key = engine.key_for(id);
    match engine.store.mark_solid(key.as_str()) {
        None => drop_unknown(engine, EventKind::SolidityChanged, id),
        Some(changed) => {
            if changed {
                restyle(engine, &key);
            }
            TransitionResult::applied(EventKind::SolidityChanged)
        }
    }
}

/// Propagate a confirmation through the past cone of `id`.
///
/// Decided vertices are final and stop the walk. An excluded vertex is
/// marked conflicting and its own past is left alone.
fn apply_confirmation_changed<R: Renderer>(
    engine: &mut TangleEngine<R>,
    id: &str,
    excluded_ids: &[String],
) -> TransitionResult {
    let key = engine.key_for(id);
    if !engine.store.contains(key.as_str()) {
        return drop_unknown(engine, EventKind::ConfirmationChanged, id);
    }
    let excluded: HashSet<VertexKey> = excluded_ids.iter().map(|x| engine.key_for(x)).collect();
    let mut result = TransitionResult::applied(EventKind::ConfirmationChanged);

    let mut walker = ConeWalker::new(&engine.store, &key, Direction::Past);
    while let Some(next) = walker.next_node() {
        let decided = match engine.store.get(next.as_str()) {
            Some(v) => v.is_decided(),
            None => continue,
        };
        if decided {
            continue;
        }
        if excluded.contains(&next) {
            if engine.store.mark_conflicting(next.as_str()) {
                result.newly_conflicting += 1;
                restyle(engine, &next);
            }
            continue;
        }
        if engine.store.mark_confirmed(next.as_str()) {
            result.newly_confirmed += 1;
            restyle(engine, &next);
        }
        walker.expand(&engine.store, &next, |_| {});
    }

    debug!(
        key = %key,
        confirmed = result.newly_confirmed,
        conflicting = result.newly_conflicting,
        visited = walker.stats().visited,
        "confirmation propagated"
    );
    result
}

fn apply_milestone_marked<R: Renderer>(engine: &mut TangleEngine<R>, id: &str) -> TransitionResult {
    let key = engine.key_for(id);
    match engine.store.mark_milestone(key.as_str()) {
        None => drop_unknown(engine, EventKind::MilestoneMarked, id),
        Some(changed) => {
            if changed {
                restyle(engine, &key);
            }
            TransitionResult::applied(EventKind::MilestoneMarked)
        }
    }
}

fn apply_tip_status_changed<R: Renderer>(
    engine: &mut TangleEngine<R>,
    id: &str,
    is_tip: bool,
) -> TransitionResult {
    let key = engine.key_for(id);
    match engine.store.set_tip(key.as_str(), is_tip) {
        None => drop_unknown(engine, EventKind::TipStatusChanged, id),
        Some(changed) => {
            if changed {
                restyle(engine, &key);
            }
            TransitionResult::applied(EventKind::TipStatusChanged)
        }
    }
}

// ---------------------------------------------------------------------------
// Eviction
// ---------------------------------------------------------------------------

/// Evict oldest vertices until the store fits the window capacity.
/// Returns the removed keys in removal order.
pub(crate) fn enforce_window<R: Renderer>(engine: &mut TangleEngine<R>) -> Vec<VertexKey> {
    let mut evicted = Vec::new();
    while engine.window.over_capacity(engine.store.len()) {
        let Some((key, arrival)) = engine.window.pop_oldest() else {
            break;
        };
        let current = engine
            .store
            .get(key.as_str())
            .map(|v| v.arrival == arrival)
            .unwrap_or(false);
        if !current {
            continue;
        }
        let Some(vertex) = evict_vertex(engine, &key) else {
            continue;
        };
        evicted.push(key);

        for parent in vertex.parents() {
            match engine.config.eviction_policy {
                EvictionPolicy::Cascade => {
                    if evict_vertex(engine, parent).is_some() {
                        evicted.push(parent.clone());
                    } else {
                        engine.topology.remove_node(parent);
                    }
                }
                EvictionPolicy::RefCounted => {
                    let orphaned = engine.store.contains(parent.as_str())
                        && engine.store.approvers(parent.as_str()).is_empty();
                    if orphaned && evict_vertex(engine, parent).is_some() {
                        evicted.push(parent.clone());
                    }
                }
            }
        }
    }
    if !engine.window.over_capacity(engine.store.len()) {
        engine.window.mark_enforced();
    }
    evicted
}

/// Remove one stored vertex from the store and the topology, releasing the
/// selection first if it points at it.
fn evict_vertex<R: Renderer>(engine: &mut TangleEngine<R>, key: &VertexKey) -> Option<Vertex> {
    if !engine.store.contains(key.as_str()) {
        return None;
    }
    if engine.selection.as_ref().map(|s| &s.key) == Some(key) {
        engine.release_selection();
    }
    let vertex = engine.store.remove(key.as_str())?;
    engine.topology.remove_node(key);
    debug!(key = %key, arrival = vertex.arrival, "evicted vertex");
    Some(vertex)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn restyle<R: Renderer>(engine: &mut TangleEngine<R>, key: &VertexKey) {
    if let Some(v) = engine.store.get(key.as_str()) {
        engine.topology.restyle(v);
    }
}

fn drop_unknown<R: Renderer>(
    engine: &mut TangleEngine<R>,
    kind: EventKind,
    id: &str,
) -> TransitionResult {
    engine.dropped_events += 1;
    debug!(?kind, id, "dropping event for unknown vertex");
    TransitionResult::dropped(kind, DropReason::UnknownVertex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::counters::AggregateCounts;
    use crate::topology::{NodeKind, NullRenderer, RecordingRenderer};

    fn engine_with(capacity: usize, policy: EvictionPolicy) -> TangleEngine<RecordingRenderer> {
        let config = EngineConfig {
            capacity,
            eviction_policy: policy,
            check_invariants: true,
            ..EngineConfig::default()
        };
        let mut engine = TangleEngine::with_config(config, RecordingRenderer::new()).unwrap();
        engine.start();
        engine
    }

    fn engine() -> TangleEngine<RecordingRenderer> {
        engine_with(100, EvictionPolicy::Cascade)
    }

    fn create(engine: &mut TangleEngine<RecordingRenderer>, data: VertexData) -> TransitionResult {
        engine.apply_event(&data.into_event())
    }

    #[test]
    fn creation_admits_and_draws() {
        let mut e = engine();
        let result = create(&mut e, VertexData::new("a").solid().tip());
        assert!(result.admitted);
        assert_eq!(e.counts(), AggregateCounts { solid: 1, confirmed: 0, conflicting: 0, tips: 1 });
        assert!(e.renderer().has_node("a"));
    }

    #[test]
    fn conflicting_wins_over_confirmed_on_creation() {
        let mut e = engine();
        create(&mut e, VertexData::new("a").confirmed().conflicting());
        let a = e.get("a").unwrap();
        assert!(a.conflicting && !a.confirmed);
    }

    #[test]
    fn re_announcement_merges() {
        let mut e = engine();
        create(&mut e, VertexData::new("b"));
        let result = create(&mut e, VertexData::new("b").with_trunk("a").solid());
        assert!(!result.admitted);
        assert_eq!(e.len(), 1);
        assert_eq!(e.counts().solid, 1);
        assert!(e.renderer().has_edge("b", "a"));
        assert_eq!(e.window().queued(), 1);
    }

    #[test]
    fn derived_events_for_unknown_ids_are_dropped() {
        let mut e = engine();
        for event in [
            TangleEvent::solidity("x"),
            TangleEvent::confirmation("x", &[]),
            TangleEvent::milestone("x"),
            TangleEvent::tip_status("x", true),
        ] {
            let result = e.apply_event(&event);
            assert_eq!(result.dropped, Some(DropReason::UnknownVertex));
        }
        assert_eq!(e.dropped_events(), 4);
        assert!(e.is_empty());
    }

    #[test]
    fn solidity_counts_once() {
        let mut e = engine();
        create(&mut e, VertexData::new("a"));
        e.apply_event(&TangleEvent::solidity("a"));
        e.apply_event(&TangleEvent::solidity("a"));
        assert_eq!(e.counts().solid, 1);
    }

    #[test]
    fn tip_flips_both_ways() {
        let mut e = engine();
        create(&mut e, VertexData::new("a").tip());
        e.apply_event(&TangleEvent::tip_status("a", false));
        assert_eq!(e.counts().tips, 0);
        e.apply_event(&TangleEvent::tip_status("a", true));
        e.apply_event(&TangleEvent::tip_status("a", true));
        assert_eq!(e.counts().tips, 1);
    }

    #[test]
    fn confirmation_walks_past_cone() {
        let mut e = engine();
        create(&mut e, VertexData::new("a"));
        create(&mut e, VertexData::new("b").with_trunk("a"));
        create(&mut e, VertexData::new("c").with_trunk("b").with_branch("a"));
        let result = e.apply_event(&TangleEvent::confirmation("c", &[]));
        assert_eq!(result.newly_confirmed, 3);
        assert_eq!(e.counts().confirmed, 3);
    }

    #[test]
    fn excluded_vertex_becomes_conflicting_and_shields_its_past() {
        let mut e = engine();
        create(&mut e, VertexData::new("a"));
        create(&mut e, VertexData::new("b").with_trunk("a"));
        create(&mut e, VertexData::new("c").with_trunk("b"));
        let result = e.apply_event(&TangleEvent::confirmation("c", &["b"]));
        assert_eq!((result.newly_confirmed, result.newly_conflicting), (1, 1));
        assert!(e.get("b").unwrap().conflicting);
        let a = e.get("a").unwrap();
        assert!(!a.confirmed && !a.conflicting);
    }

    #[test]
    fn decided_vertices_stop_propagation() {
        let mut e = engine();
        create(&mut e, VertexData::new("a"));
        create(&mut e, VertexData::new("b").with_trunk("a").confirmed());
        create(&mut e, VertexData::new("c").with_trunk("b"));
        let result = e.apply_event(&TangleEvent::confirmation("c", &[]));
        assert_eq!(result.newly_confirmed, 1);
        assert!(!e.get("a").unwrap().confirmed);
    }

    #[test]
    fn cascade_evicts_parents_of_oldest() {
        let mut e = engine_with(2, EvictionPolicy::Cascade);
        create(&mut e, VertexData::new("a"));
        create(&mut e, VertexData::new("b").with_trunk("a"));
        create(&mut e, VertexData::new("c").with_trunk("b"));
        // a is oldest and has no parents
        assert_eq!(e.len(), 2);
        assert!(e.get("a").is_none());
        let result = create(&mut e, VertexData::new("d").with_trunk("c"));
        // b goes; cascade has nothing stored behind it
        assert_eq!(result.evicted, vec![VertexKey::from("b")]);
        assert!(e.get("c").is_some() && e.get("d").is_some());
    }

    #[test]
    fn cascade_removes_referenced_parent() {
        let mut e = engine_with(2, EvictionPolicy::Cascade);
        create(&mut e, VertexData::new("b").with_trunk("a"));
        create(&mut e, VertexData::new("a"));
        let result = create(&mut e, VertexData::new("c"));
        assert_eq!(result.evicted, vec![VertexKey::from("b"), VertexKey::from("a")]);
        assert_eq!(e.len(), 1);
        assert!(!e.renderer().has_node("a"));
    }

    #[test]
    fn ref_counted_evicts_oldest_even_if_referenced() {
        let mut e = engine_with(2, EvictionPolicy::RefCounted);
        create(&mut e, VertexData::new("a"));
        create(&mut e, VertexData::new("b").with_trunk("a"));
        create(&mut e, VertexData::new("c").with_trunk("a"));
        assert!(e.get("a").is_none());
        assert_eq!(e.len(), 2);
        assert!(!e.renderer().has_edge("b", "a"));
    }

    #[test]
    fn ref_counted_keeps_referenced_parent() {
        let mut e = engine_with(2, EvictionPolicy::RefCounted);
        create(&mut e, VertexData::new("b").with_trunk("a"));
        create(&mut e, VertexData::new("a"));
        let result = create(&mut e, VertexData::new("c").with_trunk("a"));
        assert_eq!(result.evicted, vec![VertexKey::from("b")]);
        assert!(e.get("a").is_some() && e.get("c").is_some());
        assert!(e.renderer().has_edge("c", "a"));
    }

    #[test]
    fn ref_counted_collects_orphaned_parent() {
        let mut e = engine_with(2, EvictionPolicy::RefCounted);
        create(&mut e, VertexData::new("b").with_trunk("a"));
        create(&mut e, VertexData::new("a"));
        let result = create(&mut e, VertexData::new("c"));
        // b evicted, a lost its only approver
        assert_eq!(result.evicted, vec![VertexKey::from("b"), VertexKey::from("a")]);
    }

    #[test]
    fn placeholder_follows_forward_reference() {
        let mut e = engine();
        create(&mut e, VertexData::new("b").with_trunk("a"));
        let a = VertexKey::from("a");
        assert!(e.get("a").is_none());
        assert_eq!(e.topology().node_kind(&a), Some(NodeKind::Placeholder));
        create(&mut e, VertexData::new("a"));
        assert_eq!(e.topology().node_kind(&a), Some(NodeKind::Vertex));
    }

    #[test]
    fn re_admitted_vertex_restores_child_edges() {
        let mut e = engine_with(3, EvictionPolicy::RefCounted);
        create(&mut e, VertexData::new("a"));
        create(&mut e, VertexData::new("b").with_trunk("a"));
        create(&mut e, VertexData::new("c"));
        create(&mut e, VertexData::new("d"));
        assert!(e.get("a").is_none());
        assert!(!e.renderer().has_edge("b", "a"));
        e.set_capacity(4);
        create(&mut e, VertexData::new("a"));
        assert_eq!(e.len(), 4);
        assert!(e.renderer().has_edge("b", "a"));
    }

    #[test]
    fn capacity_lowering_waits_for_next_admission() {
        let mut e = engine_with(10, EvictionPolicy::RefCounted);
        for id in ["a", "b", "c", "d"] {
            create(&mut e, VertexData::new(id));
        }
        e.set_capacity(2);
        assert_eq!(e.len(), 4);
        assert!(e.window().shrink_pending());
        e.apply_event(&TangleEvent::solidity("a"));
        assert_eq!(e.len(), 4);
        create(&mut e, VertexData::new("e"));
        assert_eq!(e.len(), 2);
        assert!(!e.window().shrink_pending());
        assert!(e.get("d").is_some() && e.get("e").is_some());
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut e = engine_with(0, EvictionPolicy::Cascade);
        let result = create(&mut e, VertexData::new("a"));
        assert!(result.admitted);
        assert_eq!(result.evicted, vec![VertexKey::from("a")]);
        assert!(e.is_empty());
        assert_eq!(e.counts(), AggregateCounts::default());
    }

    #[test]
    fn evicting_selected_vertex_clears_selection() {
        let mut e = engine_with(1, EvictionPolicy::Cascade);
        create(&mut e, VertexData::new("a"));
        e.select("a", true);
        create(&mut e, VertexData::new("b"));
        assert!(e.selection().is_none());
    }

    #[test]
    fn truncated_keys_merge_identifiers() {
        let config = EngineConfig {
            key_length: Some(3),
            ..EngineConfig::default()
        };
        let mut e = TangleEngine::with_config(config, NullRenderer).unwrap();
        e.start();
        e.apply_event(&VertexData::new("abcdef").into_event());
        e.apply_event(&VertexData::new("abcxyz").solid().into_event());
        assert_eq!(e.len(), 1);
        assert_eq!(e.get("abc").unwrap().id, "abcxyz");
        assert_eq!(e.counts().solid, 1);
    }
}
