/// Drift detection: determinism verification and state comparison.

use std::collections::BTreeSet;

use serde::Serialize;

use tangle_engine::config::EngineConfig;
use tangle_engine::topology::Renderer;
use tangle_engine::{Observation, TangleEngine, TangleEvent, VertexKey};

use crate::error::ReplayError;
use crate::replay;

/// Replay the same events twice and require identical hashes. Panics on
/// a mismatch; returns the hash otherwise.
pub fn verify_determinism(config: &EngineConfig, events: &[TangleEvent]) -> Result<String, ReplayError> {
    let hash1 = replay::rebuild_hash(config, events)?;
    let hash2 = replay::rebuild_hash(config, events)?;

    if hash1 != hash2 {
        panic!(
            "DETERMINISM FAILURE: two replays produced different hashes.\n\
             Run 1: {}\n\
             Run 2: {}",
            hash1, hash2
        );
    }
    Ok(hash1)
}

/// Value on both sides and the signed change from `a` to `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delta {
    pub a: i64,
    pub b: i64,
    pub delta: i64,
}

impl Delta {
    fn of(a: usize, b: usize) -> Self {
        let (a, b) = (a as i64, b as i64);
        Self { a, b, delta: b - a }
    }
}

/// Differences between two observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservationDrift {
    pub size: Delta,
    pub solid: Delta,
    pub confirmed: Delta,
    pub conflicting: Delta,
    pub tips: Delta,
    pub capacity: Delta,
    pub dropped_events: Delta,
}

impl ObservationDrift {
    pub fn is_zero(&self) -> bool {
        [
            self.size,
            self.solid,
            self.confirmed,
            self.conflicting,
            self.tips,
            self.capacity,
            self.dropped_events,
        ]
        .iter()
        .all(|d| d.delta == 0)
    }
}

pub fn compare_observations(a: &Observation, b: &Observation) -> ObservationDrift {
    ObservationDrift {
        size: Delta::of(a.size, b.size),
        solid: Delta::of(a.counts.solid, b.counts.solid),
        confirmed: Delta::of(a.counts.confirmed, b.counts.confirmed),
        conflicting: Delta::of(a.counts.conflicting, b.counts.conflicting),
        tips: Delta::of(a.counts.tips, b.counts.tips),
        capacity: Delta::of(a.capacity, b.capacity),
        dropped_events: Delta::of(a.dropped_events as usize, b.dropped_events as usize),
    }
}

/// Structured comparison of two engines' stored vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub observation: ObservationDrift,
    /// Stored in `b` only.
    pub added: Vec<VertexKey>,
    /// Stored in `a` only.
    pub removed: Vec<VertexKey>,
    /// Stored in both, with differing flags.
    pub changed: Vec<VertexKey>,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.observation.is_zero() && self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

pub fn compare_engines<A: Renderer, B: Renderer>(a: &TangleEngine<A>, b: &TangleEngine<B>) -> DriftReport {
    let keys_a: BTreeSet<&VertexKey> = a.store().iter().map(|v| &v.key).collect();
    let keys_b: BTreeSet<&VertexKey> = b.store().iter().map(|v| &v.key).collect();

    let added = keys_b.difference(&keys_a).map(|k| (*k).clone()).collect();
    let removed = keys_a.difference(&keys_b).map(|k| (*k).clone()).collect();

    let mut changed = Vec::new();
    for key in keys_a.intersection(&keys_b) {
        let (va, vb) = match (a.store().get(key.as_str()), b.store().get(key.as_str())) {
            (Some(va), Some(vb)) => (va, vb),
            _ => continue,
        };
        let flags = |v: &tangle_engine::domain::Vertex| {
            (v.solid, v.confirmed, v.conflicting, v.milestone, v.tip, v.trunk.clone(), v.branch.clone())
        };
        if flags(va) != flags(vb) {
            changed.push((*key).clone());
        }
    }

    DriftReport {
        observation: compare_observations(&a.observe(), &b.observe()),
        added,
        removed,
        changed,
    }
}
