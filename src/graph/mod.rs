//! The in-memory flow graph edited by a single session.
//!
//! [`FlowGraph`] is an explicit store: every editing operation takes it by
//! reference. Nodes are addressed by their unique, user-visible label.
//! Operations that reference a node which does not exist are silent no-ops,
//! while malformed user input is rejected before anything is mutated.

use crate::error::GraphError;
use crate::rule::{PropertyScope, Rule, RuleDefinition};
use ahash::AHashSet;
use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

mod action;
mod connection;
mod message;
mod node;
mod trigger;

pub use action::{EmailAction, PREPARE_EMAIL_LABEL, SEND_EMAIL_LABEL};
pub use connection::*;
pub use message::*;
pub use node::*;
pub use trigger::{EXTRACT_ALERT_LABEL, RECEIVE_ALERT_LABEL};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowGraph {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a graph from a wire message, rejecting messages that break the
    /// graph invariants.
    pub fn from_message(message: FlowMessage) -> Result<Self, GraphError> {
        let graph = Self {
            nodes: message.nodes,
            connections: message.connections,
        };
        graph.validate()?;
        Ok(graph)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, label: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.label == label)
    }

    fn node_mut(&mut self, label: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.label == label)
    }

    /// Connections leaving the node labelled `label`.
    pub fn outgoing<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.from == label)
    }

    pub fn add_inject(&mut self, payload: bool) -> &Node {
        let count = self.count_nodes(|n| matches!(n.kind, NodeKind::Inject(_)));
        let label = self.next_label("Inject", count);
        let index = self.push_node(label, NodeKind::Inject(InjectNode { payload }));
        &self.nodes[index]
    }

    pub fn add_switch(&mut self) -> &Node {
        let count = self.count_nodes(Node::is_switch);
        let label = self.next_label("Switch", count);
        let index = self.push_node(label, NodeKind::Switch(SwitchNode::default()));
        self.rewire_triggers();
        &self.nodes[index]
    }

    /// Adds an AND or OR gate. `gate_type` is user input and is rejected unless
    /// it reads `and` or `or`.
    pub fn add_gate(&mut self, gate_type: &str) -> Result<&Node, GraphError> {
        let gate_type = GateType::parse(gate_type).inspect_err(|e| {
            tracing::warn!("Rejected gate: {}", e);
        })?;
        // Gates share one counter regardless of their type.
        let count = self.count_nodes(|n| n.label.starts_with("Gate_"));
        let label = self.next_label("Gate", count);
        let index = self.push_node(label, NodeKind::Gate(GateNode::new(gate_type)));
        self.rewire_triggers();
        Ok(&self.nodes[index])
    }

    pub fn add_debug(&mut self) -> &Node {
        let count = self.count_nodes(|n| matches!(n.kind, NodeKind::Debug));
        let label = self.next_label("Debug", count);
        let index = self.push_node(label, NodeKind::Debug);
        &self.nodes[index]
    }

    /// Connects two nodes by label. Unknown or identical endpoints and
    /// duplicate connections are ignored; returns whether a connection was added.
    ///
    /// Switches route by output, so their connections go through
    /// [`FlowGraph::connect_output`] or [`FlowGraph::configure_switch`].
    pub fn connect(&mut self, from: &str, to: &str) -> bool {
        if self.node(from).is_some_and(Node::is_switch) {
            tracing::debug!("Ignoring connection {} → {}: switch needs an output", from, to);
            return false;
        }
        self.add_connection(Connection::new(from, to))
    }

    /// Connects output `output` of the switch `from` to `to`. Ignored unless
    /// `from` is a switch with that output.
    pub fn connect_output(&mut self, from: &str, output: usize, to: &str) -> bool {
        let outputs = match self.node(from).and_then(Node::as_switch) {
            Some(switch) => switch.outputs(),
            None => return false,
        };
        if output >= outputs {
            tracing::debug!(
                "Ignoring connection from {} output {}: only {} outputs",
                from,
                output,
                outputs
            );
            return false;
        }
        self.add_connection(Connection::from_output(from, to, output))
    }

    fn add_connection(&mut self, connection: Connection) -> bool {
        let (from, to) = (connection.from.as_str(), connection.to.as_str());
        if from.is_empty() || to.is_empty() || from == to {
            return false;
        }
        if self.node(from).is_none() || self.node(to).is_none() {
            tracing::debug!("Ignoring connection {} → {}: unknown endpoint", from, to);
            return false;
        }
        if self.connections.contains(&connection) {
            return false;
        }
        tracing::debug!("Connected {} → {}", from, to);
        self.connections.push(connection);
        true
    }

    /// Saves a switch configuration.
    ///
    /// `property` is copied into every rule, the output count follows the rule
    /// count, and the switch's outgoing connections are replaced by one
    /// connection per entry of `wiring` (entry `i` wires output `i`).
    pub fn configure_switch(
        &mut self,
        label: &str,
        property: &str,
        rules: Vec<RuleDefinition>,
        wiring: &[Option<String>],
    ) -> Result<(), GraphError> {
        if !self.node(label).is_some_and(Node::is_switch) {
            tracing::debug!("Ignoring switch configuration for unknown node '{}'", label);
            return Ok(());
        }

        let rules = validate_rules(label, rules, |mut definition| {
            definition.property = property.to_string();
            definition.property_type = PropertyScope::Msg;
            definition
        })?;
        let outputs = rules.len();

        let wired: Vec<Connection> = wiring
            .iter()
            .take(outputs)
            .enumerate()
            .filter_map(|(index, target)| {
                let target = target.as_deref().filter(|t| !t.is_empty() && *t != label)?;
                match self.node(target) {
                    Some(_) => Some(Connection::from_output(label, target, index)),
                    None => {
                        tracing::debug!("Ignoring wire to unknown node '{}'", target);
                        None
                    }
                }
            })
            .collect();

        if let Some(NodeKind::Switch(switch)) = self.node_mut(label).map(|n| &mut n.kind) {
            switch.property = property.to_string();
            switch.rules = rules;
        }
        self.connections.retain(|c| c.from != label);
        self.connections.extend(wired);

        tracing::info!("Configured switch '{}' with {} outputs", label, outputs);
        Ok(())
    }

    /// Saves a gate configuration. Every rule reads from the flow store.
    pub fn configure_gate(
        &mut self,
        label: &str,
        output_topic: &str,
        emit_only_if_true: bool,
        rules: Vec<RuleDefinition>,
    ) -> Result<(), GraphError> {
        if !self.node(label).is_some_and(Node::is_gate) {
            tracing::debug!("Ignoring gate configuration for unknown node '{}'", label);
            return Ok(());
        }

        let rules = validate_rules(label, rules, |definition| {
            definition.with_scope(PropertyScope::Flow)
        })?;
        let rule_count = rules.len();

        if let Some(NodeKind::Gate(gate)) = self.node_mut(label).map(|n| &mut n.kind) {
            gate.output_topic = output_topic.to_string();
            gate.emit_only_if_true = emit_only_if_true;
            gate.rules = rules;
        }

        tracing::info!("Configured gate '{}' with {} rules", label, rule_count);
        Ok(())
    }

    /// Discards every node and connection.
    pub fn clear(&mut self) {
        tracing::info!(
            "Clearing {} nodes and {} connections",
            self.nodes.len(),
            self.connections.len()
        );
        self.nodes.clear();
        self.connections.clear();
    }

    pub fn to_message(&self) -> FlowMessage {
        FlowMessage {
            nodes: self.nodes.clone(),
            connections: self.connections.clone(),
        }
    }

    /// Renders the graph as the JSON object sent to the runtime.
    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        let message = self.to_message();
        if pretty {
            serde_json::to_string_pretty(&message)
        } else {
            serde_json::to_string(&message)
        }
    }

    /// Checks label uniqueness and that every connection points at existing
    /// nodes and, for switches, at an existing output.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut labels = AHashSet::new();
        for node in &self.nodes {
            if !labels.insert(node.label.as_str()) {
                return Err(GraphError::DuplicateLabel(node.label.clone()));
            }
        }

        for connection in &self.connections {
            let source = self
                .node(&connection.from)
                .ok_or_else(|| GraphError::DanglingConnection(connection.from.clone()))?;
            if self.node(&connection.to).is_none() {
                return Err(GraphError::DanglingConnection(connection.to.clone()));
            }
            if let Some(switch) = source.as_switch() {
                let index = connection
                    .output_index
                    .ok_or_else(|| GraphError::MissingOutputIndex(connection.from.clone()))?;
                if index >= switch.outputs() {
                    return Err(GraphError::OutputIndexOutOfRange {
                        from: connection.from.clone(),
                        index,
                        outputs: switch.outputs(),
                    });
                }
            }
        }
        Ok(())
    }

    fn count_nodes(&self, predicate: impl Fn(&Node) -> bool) -> usize {
        self.nodes.iter().filter(|&n| predicate(n)).count()
    }

    /// `<prefix>_<count + 1>`, bumped past any label already taken.
    fn next_label(&self, prefix: &str, count: usize) -> String {
        (count + 1..)
            .map(|n| format!("{}_{}", prefix, n))
            .find(|label| self.node(label).is_none())
            .unwrap_or_else(|| format!("{}_{}", prefix, generate_id("n")))
    }

    /// Appends a node with a fresh id and returns its index.
    fn push_node(&mut self, label: String, kind: NodeKind) -> usize {
        let prefix = match &kind {
            NodeKind::HttpIn(_) => "httpin",
            NodeKind::Function(_) => "func",
            NodeKind::Email(_) => "emaildyn",
            other => other.type_name(),
        };
        let node = Node {
            id: generate_id(prefix),
            label,
            kind,
        };
        tracing::info!("Added {} node '{}'", node.type_name(), node.label);
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

/// Validates a batch of rule definitions after `prepare` has normalized each
/// one. Nothing is returned unless every rule is valid.
fn validate_rules(
    label: &str,
    definitions: Vec<RuleDefinition>,
    prepare: impl Fn(RuleDefinition) -> RuleDefinition,
) -> Result<Vec<Rule>, GraphError> {
    definitions
        .into_iter()
        .enumerate()
        .map(|(index, definition)| {
            Rule::try_from(prepare(definition)).map_err(|source| {
                tracing::warn!("Rejected rule {} of '{}': {}", index, label, source);
                GraphError::InvalidRule {
                    label: label.to_string(),
                    index,
                    source,
                }
            })
        })
        .collect()
}

/// `<prefix>_<unix millis>_<random below 100000>`.
pub(crate) fn generate_id(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let salt: u32 = rand::rng().random_range(0..100_000);
    format!("{}_{}_{}", prefix, millis, salt)
}
