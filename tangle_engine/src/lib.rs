#![forbid(unsafe_code)]

//! Tangle visualizer state engine.
//!
//! Maintains a bounded, incrementally updated view of a two-parent
//! transaction DAG fed by a live event stream, and keeps an external
//! renderable graph in sync with it.

pub mod keys;
pub mod domain;
pub mod events;
pub mod error;
pub mod config;
pub mod style;
pub mod counters;
pub mod state;
pub mod window;
pub mod graph;
pub mod topology;
pub mod transitions;
pub mod selection;
pub mod invariants;
pub mod hashing;
pub mod engine;

pub use engine::{Observation, TangleEngine};
pub use events::{TangleEvent, VertexData};
pub use keys::VertexKey;
