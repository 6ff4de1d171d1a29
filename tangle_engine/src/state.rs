/// Vertex store.
///
/// Owns vertex records, the approver (child) index and the aggregate
/// counters. Every mutation that changes a counted predicate goes through
/// this type, so the counters move in the same call as the flags.

use std::collections::HashMap;

use crate::counters::AggregateCounts;
use crate::domain::Vertex;
use crate::graph::{ConeGraph, Direction};
use crate::keys::VertexKey;

/// Result of merging a repeated `vertex_created` into a stored vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// A previously missing parent reference was filled in.
    pub parents_changed: bool,
    /// The update named a different parent than the stored one; the
    /// stored reference was kept.
    pub parent_conflict: bool,
}

#[derive(Debug, Default)]
pub struct VertexStore {
    vertices: HashMap<VertexKey, Vertex>,
    /// Parent key -> keys of stored vertices referencing it, in the order
    /// they were indexed. Entries may exist for keys that are not stored.
    approvers: HashMap<VertexKey, Vec<VertexKey>>,
    counts: AggregateCounts,
}

impl VertexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Vertex> {
        self.vertices.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vertices.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    pub fn counts(&self) -> AggregateCounts {
        self.counts
    }

    /// Stored vertices that reference `key` as trunk or branch.
    pub fn approvers(&self, key: &str) -> &[VertexKey] {
        self.approvers.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Full approver index, for consistency checks.
    pub fn approver_index(&self) -> impl Iterator<Item = (&VertexKey, &[VertexKey])> {
        self.approvers.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Insert a vertex that is not yet stored.
    pub fn insert(&mut self, vertex: Vertex) {
        debug_assert!(!self.vertices.contains_key(&vertex.key));
        self.counts.admit(&vertex);
        self.index_parents(&vertex);
        self.vertices.insert(vertex.key.clone(), vertex);
    }

    /// Merge `update` into the stored vertex with the same key, moving
    /// flags only in their allowed directions. Returns `None` if the key
    /// is not stored.
    pub fn merge(&mut self, update: Vertex) -> Option<MergeOutcome> {
        let existing = self.vertices.get_mut(&update.key)?;
        let mut outcome = MergeOutcome::default();
        let mut added_parents = Vec::new();

        for (slot, incoming) in [
            (&mut existing.trunk, update.trunk),
            (&mut existing.branch, update.branch),
        ] {
            match incoming {
                Some(parent) if slot.is_none() => {
                    added_parents.push(parent.clone());
                    *slot = Some(parent);
                    outcome.parents_changed = true;
                }
                Some(parent) if slot.as_ref() != Some(&parent) => {
                    outcome.parent_conflict = true;
                }
                _ => {}
            }
        }

        existing.id = update.id;
        if update.tag.is_some() {
            existing.tag = update.tag;
        }
        if update.solid && !existing.solid {
            existing.solid = true;
            self.counts.solid += 1;
        }
        if !existing.is_decided() {
            if update.conflicting {
                existing.conflicting = true;
                self.counts.conflicting += 1;
            } else if update.confirmed {
                existing.confirmed = true;
                self.counts.confirmed += 1;
            }
        }
        existing.milestone |= update.milestone;
        self.counts.flip_tip(existing.tip, update.tip);
        existing.tip = update.tip;
        existing.highlighted = update.highlighted;

        let key = existing.key.clone();
        for parent in added_parents {
            self.index_approver(parent, &key);
        }
        Some(outcome)
    }

    /// Remove a vertex, retiring its counters and its approver entries.
    pub fn remove(&mut self, key: &str) -> Option<Vertex> {
        let vertex = self.vertices.remove(key)?;
        self.counts.retire(&vertex);
        for parent in vertex.parents() {
            if let Some(list) = self.approvers.get_mut(parent) {
                list.retain(|k| *k != vertex.key);
                if list.is_empty() {
                    self.approvers.remove(parent);
                }
            }
        }
        Some(vertex)
    }

    /// Drop everything, counters included.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.approvers.clear();
        self.counts = AggregateCounts::default();
    }

    /// `None` if unknown, otherwise whether the flag changed.
    pub fn mark_solid(&mut self, key: &str) -> Option<bool> {
        let v = self.vertices.get_mut(key)?;
        if v.solid {
            return Some(false);
        }
        v.solid = true;
        self.counts.solid += 1;
        Some(true)
    }

    pub fn mark_milestone(&mut self, key: &str) -> Option<bool> {
        let v = self.vertices.get_mut(key)?;
        let changed = !v.milestone;
        v.milestone = true;
        Some(changed)
    }

    pub fn set_tip(&mut self, key: &str, is_tip: bool) -> Option<bool> {
        let v = self.vertices.get_mut(key)?;
        let was_tip = v.tip;
        v.tip = is_tip;
        self.counts.flip_tip(was_tip, is_tip);
        Some(was_tip != is_tip)
    }

    /// Mark an undecided vertex confirmed. False if unknown or decided.
    pub fn mark_confirmed(&mut self, key: &str) -> bool {
        match self.vertices.get_mut(key) {
            Some(v) if !v.is_decided() => {
                v.confirmed = true;
                self.counts.confirmed += 1;
                true
            }
            _ => false,
        }
    }

    /// Mark an undecided vertex conflicting. False if unknown or decided.
    pub fn mark_conflicting(&mut self, key: &str) -> bool {
        match self.vertices.get_mut(key) {
            Some(v) if !v.is_decided() => {
                v.conflicting = true;
                self.counts.conflicting += 1;
                true
            }
            _ => false,
        }
    }

    pub fn set_selected(&mut self, key: &str, selected: bool) -> Option<bool> {
        let v = self.vertices.get_mut(key)?;
        let changed = v.selected != selected;
        v.selected = selected;
        Some(changed)
    }

    /// Recompute `highlighted` for every vertex. Returns the keys whose
    /// flag changed.
    pub fn rehighlight(&mut self, matches: impl Fn(&Vertex) -> bool) -> Vec<VertexKey> {
        let mut changed = Vec::new();
        for v in self.vertices.values_mut() {
            let highlighted = matches(v);
            if v.highlighted != highlighted {
                v.highlighted = highlighted;
                changed.push(v.key.clone());
            }
        }
        changed
    }

    fn index_parents(&mut self, vertex: &Vertex) {
        for parent in vertex.parents() {
            self.index_approver(parent.clone(), &vertex.key);
        }
    }

    fn index_approver(&mut self, parent: VertexKey, child: &VertexKey) {
        let list = self.approvers.entry(parent).or_default();
        if !list.contains(child) {
            list.push(child.clone());
        }
    }
}

impl ConeGraph for VertexStore {
    fn contains_vertex(&self, key: &VertexKey) -> bool {
        self.vertices.contains_key(key)
    }

    fn neighbors(&self, key: &VertexKey, direction: Direction) -> Vec<VertexKey> {
        match direction {
            Direction::Past => self
                .vertices
                .get(key)
                .map(|v| v.parents().cloned().collect())
                .unwrap_or_default(),
            Direction::Future => self.approvers(key.as_str()).to_vec(),
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

    #[test]
    fn insert_indexes_approvers() {
        let mut store = VertexStore::new();
        store.insert(vertex("a", None, None));
        store.insert(vertex("b", Some("a"), Some("a")));
        store.insert(vertex("c", Some("a"), Some("b")));
        let approvers: Vec<&str> = store.approvers("a").iter().map(|k| k.as_str()).collect();
        assert_eq!(approvers, vec!["b", "c"]);
        assert_eq!(store.approvers("b").len(), 1);
    }

    #[test]
    fn remove_unindexes_and_retires() {
        let mut store = VertexStore::new();
        let mut a = vertex("a", None, None);
        a.solid = true;
        a.tip = true;
        store.insert(a);
        store.insert(vertex("b", Some("a"), None));
        store.remove("b").unwrap();
        assert!(store.approvers("a").is_empty());
        store.remove("a").unwrap();
        assert_eq!(store.counts(), AggregateCounts::default());
        assert!(store.remove("a").is_none());
    }

    #[test]
    fn solid_marks_once() {
        let mut store = VertexStore::new();
        store.insert(vertex("a", None, None));
        assert_eq!(store.mark_solid("a"), Some(true));
        assert_eq!(store.mark_solid("a"), Some(false));
        assert_eq!(store.mark_solid("zz"), None);
        assert_eq!(store.counts().solid, 1);
    }

    #[test]
    fn decided_is_set_once() {
        let mut store = VertexStore::new();
        store.insert(vertex("a", None, None));
        assert!(store.mark_conflicting("a"));
        assert!(!store.mark_confirmed("a"));
        assert!(!store.mark_conflicting("a"));
        let counts = store.counts();
        assert_eq!((counts.confirmed, counts.conflicting), (0, 1));
    }

    #[test]
    fn merge_is_monotonic() {
        let mut store = VertexStore::new();
        let mut a = vertex("a", None, None);
        a.solid = true;
        a.confirmed = true;
        store.insert(a);

        let mut update = vertex("a", Some("p"), None);
        update.conflicting = true;
        update.tip = true;
        let outcome = store.merge(update).unwrap();

        let a = store.get("a").unwrap();
        assert!(a.solid && a.confirmed && !a.conflicting && a.tip);
        assert!(outcome.parents_changed);
        assert_eq!(store.approvers("p").len(), 1);
        assert_eq!(
            store.counts(),
            AggregateCounts { solid: 1, confirmed: 1, conflicting: 0, tips: 1 }
        );
    }

    #[test]
    fn merge_keeps_conflicting_parent() {
        let mut store = VertexStore::new();
        store.insert(vertex("a", Some("p"), None));
        let outcome = store.merge(vertex("a", Some("q"), None)).unwrap();
        assert!(outcome.parent_conflict);
        assert_eq!(store.get("a").unwrap().trunk, Some(VertexKey::from("p")));
        assert!(store.approvers("q").is_empty());
    }

    #[test]
    fn cone_graph_neighbors() {
        let mut store = VertexStore::new();
        store.insert(vertex("a", None, None));
        store.insert(vertex("b", Some("a"), Some("x")));
        let past = store.neighbors(&VertexKey::from("b"), Direction::Past);
        assert_eq!(past, vec![VertexKey::from("a"), VertexKey::from("x")]);
        let future = store.neighbors(&VertexKey::from("a"), Direction::Future);
        assert_eq!(future, vec![VertexKey::from("b")]);
    }
}
