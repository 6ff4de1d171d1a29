/// Runtime configuration: the engine section plus logging and the topic
/// subscription.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::Level;

use tangle_engine::config::EngineConfig;
use tangle_engine::error::ConfigError;

use crate::error::RuntimeConfigError;
use crate::session::Subscription;
use crate::wire::{Topic, VISUALIZER_ID_LENGTH};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Keys default to the feed's short id length unless `key_length` is
    /// given, `null` meaning full ids.
    #[serde(deserialize_with = "engine_section")]
    pub engine: EngineConfig,
    pub log_level: String,
    /// Wire topic codes to consume.
    pub topics: Vec<u8>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                key_length: Some(VISUALIZER_ID_LENGTH),
                ..EngineConfig::default()
            },
            log_level: "info".to_string(),
            topics: Topic::ALL.iter().map(|t| t.code()).collect(),
        }
    }
}

fn engine_section<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EngineConfig, D::Error> {
    let mut section = Map::<String, Value>::deserialize(deserializer)?;
    section
        .entry("key_length")
        .or_insert_with(|| Value::from(VISUALIZER_ID_LENGTH));
    EngineConfig::deserialize(Value::Object(section)).map_err(serde::de::Error::custom)
}

impl RuntimeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, RuntimeConfigError> {
        let config: RuntimeConfig = serde_json::from_str(json).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, RuntimeConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), RuntimeConfigError> {
        self.engine.validate()?;
        self.level()?;
        self.subscription()?;
        Ok(())
    }

    pub fn level(&self) -> Result<Level, RuntimeConfigError> {
        Level::from_str(&self.log_level).map_err(|_| RuntimeConfigError::LogLevel(self.log_level.clone()))
    }

    /// Detached subscription over the configured topics.
    pub fn subscription(&self) -> Result<Subscription, RuntimeConfigError> {
        let topics = self
            .topics
            .iter()
            .map(|&code| Topic::from_code(code).ok_or(RuntimeConfigError::Topic(code)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Subscription::new(topics))
    }
}
