/// Vertex identifiers and the keys derived from them.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Length of the short identifier used for display.
pub const SHORT_ID_LENGTH: usize = 7;

/// Canonical store key of a vertex.
///
/// Derived from the full identifier by optional truncation. With no
/// truncation configured the key is the identifier itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexKey(String);

impl VertexKey {
    /// Derive the key for `id`, truncated to `key_length` characters if set.
    pub fn derive(id: &str, key_length: Option<usize>) -> Self {
        match key_length {
            Some(len) => VertexKey(truncate_id(id, len).to_string()),
            None => VertexKey(id.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for labels and logs.
    pub fn short(&self) -> &str {
        truncate_id(&self.0, SHORT_ID_LENGTH)
    }
}

impl fmt::Display for VertexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short())
    }
}

impl Borrow<str> for VertexKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VertexKey {
    fn from(id: &str) -> Self {
        VertexKey(id.to_string())
    }
}

/// First `len` characters of `id`, never splitting a character.
pub fn truncate_id(id: &str, len: usize) -> &str {
    match id.char_indices().nth(len) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}
