/// Session: one engine fed by one subscription.
///
/// The subscription owns the attach/detach lifecycle. Attaching starts the
/// engine collecting; detaching stops it and drops all state. Frames for
/// topics outside the subscription are counted and skipped.
///
/// Decode-before-apply order:
///   1. wire::decode_frame(frame): malformed frames never reach the engine
///   2. engine.apply_event(event): once per decoded event, in order

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{info, warn};

use tangle_engine::domain::TransitionResult;
use tangle_engine::hashing::canonical_hash;
use tangle_engine::topology::{NullRenderer, Renderer};
use tangle_engine::{Observation, TangleEngine, TangleEvent};

use crate::error::SessionError;
use crate::wire::{decode_frame, Decoded, Topic};

/// Topic set plus attach state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    topics: BTreeSet<Topic>,
    attached: bool,
}

impl Subscription {
    /// Detached subscription over `topics`.
    pub fn new(topics: impl IntoIterator<Item = Topic>) -> Self {
        Self {
            topics: topics.into_iter().collect(),
            attached: false,
        }
    }

    /// Every visualizer topic.
    pub fn visualizer() -> Self {
        Self::new(Topic::ALL)
    }

    pub fn accepts(&self, topic: Topic) -> bool {
        self.topics.contains(&topic)
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn topics(&self) -> impl Iterator<Item = Topic> + '_ {
        self.topics.iter().copied()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub frames: u64,
    /// Frames for topics outside the subscription.
    pub ignored_frames: u64,
    pub malformed_frames: u64,
    pub events: u64,
    pub applied: u64,
    pub dropped: u64,
    pub evicted: u64,
}

pub struct Session<R: Renderer = NullRenderer> {
    engine: TangleEngine<R>,
    subscription: Subscription,
    stats: SessionStats,
}

impl<R: Renderer> Session<R> {
    pub fn new(engine: TangleEngine<R>, subscription: Subscription) -> Self {
        Self {
            engine,
            subscription,
            stats: SessionStats::default(),
        }
    }

    /// Attach the subscription and start collecting.
    pub fn attach(&mut self) {
        if self.subscription.attached {
            return;
        }
        self.subscription.attached = true;
        self.engine.start();
        let topics: Vec<u8> = self.subscription.topics().map(Topic::code).collect();
        info!(?topics, "visualizer subscription attached");
    }

    /// Detach the subscription and reset the engine.
    pub fn detach(&mut self) {
        if !self.subscription.attached {
            return;
        }
        self.subscription.attached = false;
        self.engine.stop();
        info!(frames = self.stats.frames, "visualizer subscription detached");
    }

    /// Decode one text frame and apply its events.
    pub fn feed(&mut self, frame: &str) -> Result<Vec<TransitionResult>, SessionError> {
        if !self.subscription.attached {
            return Err(SessionError::Detached);
        }
        self.stats.frames += 1;
        let decoded = match decode_frame(frame) {
            Ok(decoded) => decoded,
            Err(err) => {
                self.stats.malformed_frames += 1;
                warn!(error = %err, "dropping malformed frame");
                return Err(err.into());
            }
        };
        match decoded {
            Decoded::Events(topic, events) if self.subscription.accepts(topic) => {
                Ok(events.iter().map(|e| self.apply(e)).collect())
            }
            Decoded::Events(..) | Decoded::Ignored(_) => {
                self.stats.ignored_frames += 1;
                Ok(Vec::new())
            }
        }
    }

    /// Apply an already decoded event.
    pub fn dispatch(&mut self, event: &TangleEvent) -> Result<TransitionResult, SessionError> {
        if !self.subscription.attached {
            return Err(SessionError::Detached);
        }
        Ok(self.apply(event))
    }

    fn apply(&mut self, event: &TangleEvent) -> TransitionResult {
        let result = self.engine.apply_event(event);
        self.stats.events += 1;
        if result.applied {
            self.stats.applied += 1;
        } else {
            self.stats.dropped += 1;
        }
        self.stats.evicted += result.evicted.len() as u64;
        result
    }

    pub fn engine(&self) -> &TangleEngine<R> {
        &self.engine
    }

    /// Engine access for interaction (hover, click, search, capacity).
    pub fn engine_mut(&mut self) -> &mut TangleEngine<R> {
        &mut self.engine
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn observe(&self) -> Observation {
        self.engine.observe()
    }

    pub fn current_hash(&self) -> String {
        canonical_hash(&self.engine)
    }
}
