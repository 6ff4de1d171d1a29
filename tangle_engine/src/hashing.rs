/// Canonical hashing of the vertex store.
///
/// Deterministic canonical serialization + SHA-256 hashing, used to compare
/// two engines fed the same events.
///
/// Rules:
///   - Vertices sorted by key (UTF-8 byte order)
///   - Fixed field order per vertex
///   - Interaction flags (selected, highlighted) excluded
///   - Arrival numbers excluded; window order is kept as a key list
///   - UTF-8 JSON, no whitespace

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::engine::TangleEngine;
use crate::topology::Renderer;

/// Canonical serialization to UTF-8 JSON bytes.
pub fn canonical_serialize<R: Renderer>(engine: &TangleEngine<R>) -> Vec<u8> {
    build_canonical_value(engine).to_string().into_bytes()
}

/// SHA-256 of the canonical serialization. Lowercase hex string.
pub fn canonical_hash<R: Renderer>(engine: &TangleEngine<R>) -> String {
    let digest = Sha256::digest(canonical_serialize(engine));
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Field order: capacity, counts, vertices, window
fn build_canonical_value<R: Renderer>(engine: &TangleEngine<R>) -> Value {
    let store = engine.store();

    let mut vertices: Vec<_> = store.iter().collect();
    vertices.sort_by(|a, b| a.key.cmp(&b.key));
    let vertices: Vec<Value> = vertices
        .into_iter()
        .map(|v| {
            let mut m = Map::new();
            m.insert("key".into(), Value::String(v.key.as_str().to_string()));
            m.insert("id".into(), Value::String(v.id.clone()));
            m.insert("tag".into(), v.tag.clone().map_or(Value::Null, Value::String));
            m.insert("trunk".into(), opt_key(v.trunk.as_ref().map(|k| k.as_str())));
            m.insert("branch".into(), opt_key(v.branch.as_ref().map(|k| k.as_str())));
            m.insert("solid".into(), Value::Bool(v.solid));
            m.insert("confirmed".into(), Value::Bool(v.confirmed));
            m.insert("conflicting".into(), Value::Bool(v.conflicting));
            m.insert("milestone".into(), Value::Bool(v.milestone));
            m.insert("tip".into(), Value::Bool(v.tip));
            Value::Object(m)
        })
        .collect();

    // Live window entries, oldest first.
    let window: Vec<Value> = engine
        .window()
        .entries()
        .filter(|(k, arrival)| store.get(k.as_str()).map(|v| v.arrival) == Some(*arrival))
        .map(|(k, _)| Value::String(k.as_str().to_string()))
        .collect();

    let counts = store.counts();
    let mut counts_map = Map::new();
    counts_map.insert("solid".into(), Value::from(counts.solid));
    counts_map.insert("confirmed".into(), Value::from(counts.confirmed));
    counts_map.insert("conflicting".into(), Value::from(counts.conflicting));
    counts_map.insert("tips".into(), Value::from(counts.tips));

    let mut root = Map::new();
    root.insert("capacity".into(), Value::from(engine.capacity()));
    root.insert("counts".into(), Value::Object(counts_map));
    root.insert("vertices".into(), Value::Array(vertices));
    root.insert("window".into(), Value::Array(window));
    Value::Object(root)
}

fn opt_key(key: Option<&str>) -> Value {
    key.map_or(Value::Null, |k| Value::String(k.to_string()))
}
