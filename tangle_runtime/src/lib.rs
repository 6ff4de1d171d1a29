#![forbid(unsafe_code)]

//! Tangle runtime.
//!
//! Feeds the tangle engine from the node's websocket frames, replays
//! recorded frame logs and compares engine states.
//!
//! No domain logic lives here; transitions and invariants are delegated
//! to `tangle_engine`.

pub mod error;
pub mod config;
pub mod wire;
pub mod session;
pub mod replay;
pub mod drift;
