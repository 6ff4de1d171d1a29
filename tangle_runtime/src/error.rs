use std::path::PathBuf;

use tangle_engine::error::ConfigError;
use thiserror::Error;

use crate::wire::Topic;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed frame: {0}")]
    Frame(#[source] serde_json::Error),
    #[error("malformed {topic:?} payload: {source}")]
    Payload {
        topic: Topic,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0:?} payload carries no vertex id")]
    MissingId(Topic),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("subscription is detached")]
    Detached,
    #[error(transparent)]
    Wire(#[from] WireError),
}

#[derive(Debug, Error)]
pub enum RuntimeConfigError {
    #[error(transparent)]
    Engine(#[from] ConfigError),
    #[error("topic {0} is not a visualizer topic")]
    Topic(u8),
    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {source}")]
    Wire {
        line: usize,
        #[source]
        source: WireError,
    },
    #[error(transparent)]
    Session(SessionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
