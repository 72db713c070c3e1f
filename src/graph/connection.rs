use serde::{Deserialize, Serialize};

/// A directed edge between two nodes, addressed by label.
///
/// Connections leaving a switch carry the index of the output they leave from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    pub from: String,
    pub to: String,
    #[serde(
        rename = "outputIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub output_index: Option<usize>,
}

impl Connection {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            output_index: None,
        }
    }

    pub fn from_output(from: &str, to: &str, index: usize) -> Self {
        Self {
            output_index: Some(index),
            ..Self::new(from, to)
        }
    }

    /// The output this connection leaves from. Nodes other than switches have
    /// a single output, 0.
    pub fn output(&self) -> usize {
        self.output_index.unwrap_or(0)
    }
}
