use crate::foundation::error::{NodeflowError, NodeflowResult};
use crate::foundation::ids::{EdgeId, NodeId, PortId};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Editor graph as serialized by the node editor.
///
/// Layout fields (node positions, viewport state) are ignored on input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDef {
    /// All nodes in the graph.
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    /// All directed edges.
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
}

impl GraphDef {
    /// Parse a graph from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> NodeflowResult<Self> {
        serde_json::from_reader(r).map_err(|e| NodeflowError::serde(format!("parse graph JSON: {e}")))
    }

    /// Parse a graph from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> NodeflowResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            NodeflowError::validation(format!("open graph JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }
}

/// One raw node. `data` is interpreted per `type` when the graph is indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDef {
    /// Stable node id.
    pub id: NodeId,
    /// Display name shown by the editor.
    #[serde(default)]
    pub name: String,
    /// Node type tag, e.g. `geometry` or `scene`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// One raw edge between an output port and an input port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDef {
    /// Stable edge id.
    pub id: EdgeId,
    /// Source node.
    pub source: NodeId,
    /// Output port on the source node.
    #[serde(default)]
    pub source_port: PortId,
    /// Target node.
    pub target: NodeId,
    /// Input port on the target node.
    #[serde(default)]
    pub target_port: PortId,
}
