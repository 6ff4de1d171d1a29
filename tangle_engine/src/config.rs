/// Engine configuration.
///
/// Every field has a default; a config file only names what it changes.
/// Palette overrides are validated at load time, so a malformed color
/// never reaches the renderer.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::style::{Color, Palette};

/// Default upper bound on stored vertices.
pub const DEFAULT_CAPACITY: usize = 5000;

/// What happens to the parents of an evicted vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Remove both parents unconditionally, bounding the view to the
    /// youngest subtrees.
    #[default]
    Cascade,
    /// Remove a parent only once no stored vertex references it.
    RefCounted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub capacity: usize,
    /// Truncate identifiers to this many characters to form store keys.
    /// `None` keys by the full identifier.
    pub key_length: Option<usize>,
    pub eviction_policy: EvictionPolicy,
    /// Run the full invariant suite after every event.
    pub check_invariants: bool,
    pub palette: PaletteConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            key_length: None,
            eviction_policy: EvictionPolicy::default(),
            check_invariants: false,
            palette: PaletteConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_length == Some(0) {
            return Err(ConfigError::KeyLength);
        }
        self.palette.resolve()?;
        Ok(())
    }
}

/// Optional hex overrides on top of the default palette.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaletteConfig {
    pub solid: Option<String>,
    pub unsolid: Option<String>,
    pub confirmed: Option<String>,
    pub conflicting: Option<String>,
    pub milestone: Option<String>,
    pub tip: Option<String>,
    pub unknown: Option<String>,
    pub highlighted: Option<String>,
    pub selected: Option<String>,
    pub link: Option<String>,
    pub link_approvers: Option<String>,
    pub link_approvees: Option<String>,
}

impl PaletteConfig {
    pub fn resolve(&self) -> Result<Palette, ConfigError> {
        let mut palette = Palette::default();
        let entries: [(&'static str, &Option<String>, &mut Color); 12] = [
            ("solid", &self.solid, &mut palette.solid),
            ("unsolid", &self.unsolid, &mut palette.unsolid),
            ("confirmed", &self.confirmed, &mut palette.confirmed),
            ("conflicting", &self.conflicting, &mut palette.conflicting),
            ("milestone", &self.milestone, &mut palette.milestone),
            ("tip", &self.tip, &mut palette.tip),
            ("unknown", &self.unknown, &mut palette.unknown),
            ("highlighted", &self.highlighted, &mut palette.highlighted),
            ("selected", &self.selected, &mut palette.selected),
            ("link", &self.link, &mut palette.link),
            ("link_approvers", &self.link_approvers, &mut palette.link_approvers),
            ("link_approvees", &self.link_approvees, &mut palette.link_approvees),
        ];
        for (field, value, slot) in entries {
            if let Some(value) = value {
                *slot = Color::parse(value)
                    .map_err(|source| ConfigError::Palette { field, source })?;
            }
        }
        Ok(palette)
    }
}
