/// Aggregate counters over the vertex store.
///
/// Maintained incrementally by the store. `recount` is a full scan and is
/// only used to check the incremental values.

use serde::{Deserialize, Serialize};

use crate::domain::Vertex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCounts {
    pub solid: usize,
    pub confirmed: usize,
    pub conflicting: usize,
    pub tips: usize,
}

impl AggregateCounts {
    /// Count every predicate `vertex` satisfies.
    pub fn admit(&mut self, vertex: &Vertex) {
        if vertex.solid {
            self.solid += 1;
        }
        if vertex.confirmed {
            self.confirmed += 1;
        }
        if vertex.conflicting {
            self.conflicting += 1;
        }
        if vertex.tip {
            self.tips += 1;
        }
    }

    /// Uncount every predicate `vertex` satisfies.
    pub fn retire(&mut self, vertex: &Vertex) {
        if vertex.solid {
            self.solid = decrement(self.solid, "solid");
        }
        if vertex.confirmed {
            self.confirmed = decrement(self.confirmed, "confirmed");
        }
        if vertex.conflicting {
            self.conflicting = decrement(self.conflicting, "conflicting");
        }
        if vertex.tip {
            self.tips = decrement(self.tips, "tips");
        }
    }

    /// Apply a tip flip of an already counted vertex.
    pub fn flip_tip(&mut self, was_tip: bool, is_tip: bool) {
        match (was_tip, is_tip) {
            (false, true) => self.tips += 1,
            (true, false) => self.tips = decrement(self.tips, "tips"),
            _ => {}
        }
    }

    /// Full scan.
    pub fn recount<'a>(vertices: impl IntoIterator<Item = &'a Vertex>) -> Self {
        let mut counts = Self::default();
        for v in vertices {
            counts.admit(v);
        }
        counts
    }
}

fn decrement(value: usize, counter: &str) -> usize {
    match value.checked_sub(1) {
        Some(result) => result,
        None => panic!("Counter underflow: {} counter is already 0", counter),
    }
}
