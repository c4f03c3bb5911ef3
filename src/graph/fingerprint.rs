use crate::graph::model::{EdgeDef, GraphDef, NodeDef};
use crate::scene::model::Scene;
use serde::Serialize;
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x5d1c_3a7f_09be_4e21;

/// Stable 128-bit structural fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint {
    /// High 64 bits.
    pub hi: u64,
    /// Low 64 bits.
    pub lo: u64,
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

/// Fingerprint of the nodes and edges of a graph, in their given order.
///
/// Node payloads are hashed through their canonical JSON encoding (object keys sorted), so two
/// graphs that differ only in payload key order share a fingerprint.
pub fn fingerprint_graph(graph: &GraphDef) -> Fingerprint {
    let mut h = StableHasher::new();
    h.write_len(graph.nodes.len());
    for n in &graph.nodes {
        write_node(&mut h, n);
    }
    h.write_len(graph.edges.len());
    for e in &graph.edges {
        write_edge(&mut h, e);
    }
    h.finish()
}

/// Fingerprint of a compiled scene's canonical JSON encoding.
pub fn fingerprint_scene(scene: &Scene) -> Fingerprint {
    let mut h = StableHasher::new();
    h.write_json(scene);
    h.finish()
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_len(&mut self, len: usize) {
        self.write_u64(u64::try_from(len).unwrap_or(u64::MAX));
    }

    fn write_str(&mut self, s: &str) {
        self.write_len(s.len());
        self.write_bytes(s.as_bytes());
    }

    fn write_json<T: Serialize>(&mut self, v: &T) {
        match serde_json::to_vec(v) {
            Ok(bytes) => {
                self.write_len(bytes.len());
                self.write_bytes(&bytes);
            }
            // Non-string map keys are the only failure; hash a marker instead.
            Err(_) => self.write_u64(u64::MAX),
        }
    }

    fn finish(self) -> Fingerprint {
        let v = self.inner.digest128();
        Fingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

fn write_node(h: &mut StableHasher, n: &NodeDef) {
    h.write_str(n.id.as_str());
    h.write_str(&n.name);
    h.write_str(&n.kind);
    h.write_json(&n.data);
}

fn write_edge(h: &mut StableHasher, e: &EdgeDef) {
    h.write_str(e.id.as_str());
    h.write_str(e.source.as_str());
    h.write_str(e.source_port.as_str());
    h.write_str(e.target.as_str());
    h.write_str(e.target_port.as_str());
}

#[cfg(test)]
#[path = "../../tests/unit/graph/fingerprint.rs"]
mod tests;
