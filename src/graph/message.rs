use super::{Connection, FlowGraph, Node};
use crate::error::GraphError;
use serde::{Deserialize, Serialize};

/// The object exchanged with the flow runtime: the whole graph in one message.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FlowMessage {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl FlowMessage {
    /// Parses a flow message. Node-level problems such as an unknown type or
    /// an invalid rule surface as a parse error.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(|e| GraphError::JsonParseError(e.to_string()))
    }

    /// Parses and validates a flow message into a graph.
    pub fn into_graph(self) -> Result<FlowGraph, GraphError> {
        FlowGraph::from_message(self)
    }
}

impl From<&FlowGraph> for FlowMessage {
    fn from(graph: &FlowGraph) -> Self {
        graph.to_message()
    }
}
