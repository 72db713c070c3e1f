//! The messaging bridge between the editor and the flow runtime.
//!
//! Outbound, the whole graph goes out as one `{ nodes, connections }` object
//! per send, fire-and-forget. Inbound, the runtime pushes status messages whose
//! latest `payload` is shown verbatim.

use crate::error::BridgeError;
use crate::graph::FlowMessage;
use serde_json::Value as Json;
use std::io::Write;

/// Something that can carry a flow to the runtime.
pub trait Bridge {
    fn send(&mut self, message: &FlowMessage) -> Result<(), BridgeError>;
}

/// Writes one compact JSON object per line.
#[derive(Debug)]
pub struct JsonLinesBridge<W: Write> {
    writer: W,
    sent: usize,
}

impl<W: Write> JsonLinesBridge<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, sent: 0 }
    }

    /// Number of messages written so far.
    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Bridge for JsonLinesBridge<W> {
    fn send(&mut self, message: &FlowMessage) -> Result<(), BridgeError> {
        let line = serde_json::to_string(message)?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        self.sent += 1;
        tracing::info!(
            "Sent flow with {} nodes and {} connections",
            message.nodes.len(),
            message.connections.len()
        );
        Ok(())
    }
}

/// Keeps the most recent status payload received from the runtime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusBoard {
    latest: Option<Json>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the `payload` of an inbound message. Returns whether the
    /// message carried one.
    pub fn receive(&mut self, message: &Json) -> bool {
        match message.get("payload") {
            Some(payload) => {
                self.latest = Some(payload.clone());
                true
            }
            None => {
                tracing::warn!("Ignoring status message without a payload");
                false
            }
        }
    }

    pub fn latest(&self) -> Option<&Json> {
        self.latest.as_ref()
    }

    /// The latest payload as shown to the user: strings as-is, anything else
    /// as compact JSON.
    pub fn display(&self) -> Option<String> {
        self.latest.as_ref().map(|payload| match payload {
            Json::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}
