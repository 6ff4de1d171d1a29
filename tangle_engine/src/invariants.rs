/// Tangle engine invariant checks.
///
/// Hard-fail validation. `validate_invariants` panics on the first
/// failure; `try_validate_invariants` reports it instead.

use std::collections::HashSet;

use crate::counters::AggregateCounts;
use crate::engine::TangleEngine;
use crate::error::InvariantViolation;
use crate::graph::Edge;
use crate::keys::VertexKey;
use crate::topology::{NodeKind, Renderer};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every check. Panics on the first failure.
pub fn validate_invariants<R: Renderer>(engine: &TangleEngine<R>) {
    if let Err(violation) = try_validate_invariants(engine) {
        panic!("Invariant violation: {}", violation);
    }
}

/// Non-panicking variant of `validate_invariants`.
pub fn try_validate_invariants<R: Renderer>(
    engine: &TangleEngine<R>,
) -> Result<(), InvariantViolation> {
    check_key_derivation(engine)?;
    check_counters(engine)?;
    check_capacity(engine)?;
    check_decided_exclusive(engine)?;
    check_approver_index(engine)?;
    check_window_coverage(engine)?;
    check_topology(engine)?;
    check_selection(engine)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

/// Every stored key is derived from the vertex id.
fn check_key_derivation<R: Renderer>(engine: &TangleEngine<R>) -> Result<(), InvariantViolation> {
    for v in engine.store().iter() {
        if engine.key_for(&v.id) != v.key {
            return Err(InvariantViolation::new(
                "key_derivation",
                format!("vertex {:?} stored under key {:?}", v.id, v.key.as_str()),
            ));
        }
    }
    Ok(())
}

/// Incremental counters equal a full recount.
fn check_counters<R: Renderer>(engine: &TangleEngine<R>) -> Result<(), InvariantViolation> {
    let stored = engine.store().counts();
    let actual = AggregateCounts::recount(engine.store().iter());
    if stored != actual {
        return Err(InvariantViolation::new(
            "counters",
            format!("counters {:?} but recount gives {:?}", stored, actual),
        ));
    }
    Ok(())
}

/// Store size within capacity, unless a lowered capacity awaits the next
/// admission.
fn check_capacity<R: Renderer>(engine: &TangleEngine<R>) -> Result<(), InvariantViolation> {
    let window = engine.window();
    if !window.shrink_pending() && engine.len() > window.capacity() {
        return Err(InvariantViolation::new(
            "capacity",
            format!("{} vertices stored, capacity {}", engine.len(), window.capacity()),
        ));
    }
    Ok(())
}

/// No vertex is both confirmed and conflicting.
fn check_decided_exclusive<R: Renderer>(engine: &TangleEngine<R>) -> Result<(), InvariantViolation> {
    if let Some(v) = engine.store().iter().find(|v| v.confirmed && v.conflicting) {
        return Err(InvariantViolation::new(
            "decided_exclusive",
            format!("vertex {} is confirmed and conflicting", v.key),
        ));
    }
    Ok(())
}

/// The approver index lists exactly the stored vertices referencing each key.
fn check_approver_index<R: Renderer>(engine: &TangleEngine<R>) -> Result<(), InvariantViolation> {
    let store = engine.store();
    for v in store.iter() {
        for parent in v.parents() {
            if !store.approvers(parent.as_str()).contains(&v.key) {
                return Err(InvariantViolation::new(
                    "approver_index",
                    format!("{} references {} but is not indexed", v.key, parent),
                ));
            }
        }
    }
    for (parent, approvers) in store.approver_index() {
        if approvers.is_empty() {
            return Err(InvariantViolation::new(
                "approver_index",
                format!("empty approver list kept for {}", parent),
            ));
        }
        let mut seen = HashSet::new();
        for child in approvers {
            let references = store
                .get(child.as_str())
                .map(|c| c.references(parent))
                .unwrap_or(false);
            if !references || !seen.insert(child) {
                return Err(InvariantViolation::new(
                    "approver_index",
                    format!("stale or duplicate approver {} of {}", child, parent),
                ));
            }
        }
    }
    Ok(())
}

/// Every stored vertex has a live window entry with its arrival number.
fn check_window_coverage<R: Renderer>(engine: &TangleEngine<R>) -> Result<(), InvariantViolation> {
    let entries: HashSet<(&VertexKey, u64)> = engine.window().entries().collect();
    for v in engine.store().iter() {
        if !entries.contains(&(&v.key, v.arrival)) {
            return Err(InvariantViolation::new(
                "window_coverage",
                format!("vertex {} (arrival {}) missing from window", v.key, v.arrival),
            ));
        }
    }
    Ok(())
}

/// Rendered nodes and edges mirror the store.
fn check_topology<R: Renderer>(engine: &TangleEngine<R>) -> Result<(), InvariantViolation> {
    let store = engine.store();
    let topology = engine.topology();

    for v in store.iter() {
        if topology.node_kind(&v.key) != Some(NodeKind::Vertex) {
            return Err(InvariantViolation::new(
                "topology_nodes",
                format!("stored vertex {} is not drawn as a vertex", v.key),
            ));
        }
        for parent in v.parents() {
            if store.contains(parent.as_str())
                && !topology.has_edge(&Edge::new(v.key.clone(), parent.clone()))
            {
                return Err(InvariantViolation::new(
                    "topology_edges",
                    format!("missing edge {} -> {}", v.key, parent),
                ));
            }
        }
    }

    for (key, kind) in topology.nodes() {
        let stored = store.contains(key.as_str());
        let consistent = match kind {
            NodeKind::Vertex => stored,
            NodeKind::Placeholder => !stored && !topology.incoming(key).is_empty(),
        };
        if !consistent {
            return Err(InvariantViolation::new(
                "topology_nodes",
                format!("node {} ({:?}) out of sync with the store", key, kind),
            ));
        }
    }

    for edge in topology.edges() {
        let backed = store
            .get(edge.from.as_str())
            .map(|v| v.references(&edge.to))
            .unwrap_or(false);
        if !backed || topology.node_kind(&edge.to).is_none() {
            return Err(InvariantViolation::new(
                "topology_edges",
                format!("edge {} -> {} has no backing reference", edge.from, edge.to),
            ));
        }
    }
    Ok(())
}

/// At most one vertex is selected, and it is the recorded selection.
fn check_selection<R: Renderer>(engine: &TangleEngine<R>) -> Result<(), InvariantViolation> {
    let selected: Vec<&VertexKey> = engine
        .store()
        .iter()
        .filter(|v| v.selected)
        .map(|v| &v.key)
        .collect();
    let expected: Vec<&VertexKey> = engine.selection().map(|s| &s.key).into_iter().collect();
    if selected != expected {
        return Err(InvariantViolation::new(
            "selection",
            format!(
                "selected vertices {:?} but selection is {:?}",
                selected.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
                expected.iter().map(|k| k.as_str()).collect::<Vec<_>>()
            ),
        ));
    }
    Ok(())
}
