use std::fs;
use std::str::FromStr;

use tangle_engine::config::{EngineConfig, EvictionPolicy};
use tangle_engine::topology::RecordingRenderer;
use tangle_engine::{TangleEngine, TangleEvent};
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|l| Level::from_str(&l).ok())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).with_test_writer().init();
}

/// Started engine that checks invariants after every event.
#[allow(unused)]
pub fn checked_engine(capacity: usize, policy: EvictionPolicy) -> TangleEngine<RecordingRenderer> {
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

#[allow(unused)]
pub fn load_events(path: &str) -> Vec<TangleEvent> {
    let data = fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e));
    serde_json::from_str(&data).expect("Failed to parse events JSON")
}

/// Small deterministic generator so property runs are reproducible.
#[allow(unused)]
pub struct Lcg(u64);

#[allow(unused)]
impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    pub fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }

    pub fn chance(&mut self, percent: u64) -> bool {
        self.below(100) < percent
    }
}
