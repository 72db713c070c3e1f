//! The HTTP trigger pair that feeds camera alerts into a flow.

use super::{FlowGraph, FunctionNode, HttpInNode, NodeKind};

pub const RECEIVE_ALERT_LABEL: &str = "Receive alert";
pub const EXTRACT_ALERT_LABEL: &str = "extract api data";

const RECEIVE_ALERT_URL: &str = "/receive-alert";

/// Runtime function body: alert fields go to flow context, file attributes
/// stay on the message.
const EXTRACT_ALERT_FUNC: &str = r#"
const alert = msg.payload || {};
flow.set("message", alert.message || "No message");
flow.set("timestamp", alert.timestamp || new Date().toISOString());
flow.set("cameraName", alert.cameraName);
flow.set("area", alert.area);
flow.set("temperature", alert.temperature);
flow.set("humidity", alert.humidity);

msg.filedata = Buffer.from(alert.filedata, 'base64');
msg.filename = alert.filename;
msg.filetype = alert.filetype;

return msg;
"#;

impl FlowGraph {
    pub fn has_receive_alert_trigger(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| matches!(n.kind, NodeKind::HttpIn(_)) && n.label == RECEIVE_ALERT_LABEL)
            && self.extractor_index().is_some()
    }

    /// Adds the `Receive alert` HTTP endpoint and its extraction function,
    /// unless they are already present. Returns whether anything was added.
    pub fn add_receive_alert_trigger(&mut self) -> bool {
        if self.has_receive_alert_trigger() {
            tracing::debug!("Receive-alert trigger already present");
            return false;
        }

        let function = self.push_node(
            EXTRACT_ALERT_LABEL.to_string(),
            NodeKind::Function(FunctionNode {
                func: EXTRACT_ALERT_FUNC.to_string(),
                outputs: 1,
                wires: vec![Vec::new()],
            }),
        );
        let function_id = self.nodes[function].id.clone();
        self.push_node(
            RECEIVE_ALERT_LABEL.to_string(),
            NodeKind::HttpIn(HttpInNode {
                url: RECEIVE_ALERT_URL.to_string(),
                method: "post".to_string(),
                upload: true,
                wires: vec![vec![function_id]],
            }),
        );
        self.rewire_triggers();
        true
    }

    /// Points the extraction function at every gate and switch currently in
    /// the graph.
    pub fn rewire_triggers(&mut self) {
        let Some(index) = self.extractor_index() else {
            return;
        };
        let targets: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| n.is_gate() || n.is_switch())
            .map(|n| n.id.clone())
            .collect();
        tracing::debug!("Wiring '{}' to {} nodes", EXTRACT_ALERT_LABEL, targets.len());

        if let NodeKind::Function(function) = &mut self.nodes[index].kind {
            match function.wires.first_mut() {
                Some(first) => *first = targets,
                None => function.wires.push(targets),
            }
        }
    }

    fn extractor_index(&self) -> Option<usize> {
        self.nodes.iter().position(|n| {
            matches!(n.kind, NodeKind::Function(_)) && n.label == EXTRACT_ALERT_LABEL
        })
    }
}
