use super::{Context, Verdict, explain};
use crate::graph::{Connection, FlowGraph, GateNode, GateType, Node, NodeKind, SwitchNode};
use crate::rule::Rule;
use ahash::AHashMap;
use itertools::Itertools;
use serde_json::Value as Json;

/// Which outputs of a switch fire for one message. Output `i` belongs to rule `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchRouting {
    pub verdicts: Vec<Verdict>,
}

impl SwitchRouting {
    /// Indexes of every output that fires, in order.
    pub fn fired(&self) -> Vec<usize> {
        self.verdicts.iter().positions(|v| v.passed).collect()
    }

    pub fn is_fired(&self, output: usize) -> bool {
        self.verdicts.get(output).is_some_and(|v| v.passed)
    }

    /// The connections of switch `label` that carry the message.
    pub fn targets<'g>(&self, graph: &'g FlowGraph, label: &'g str) -> Vec<&'g Connection> {
        graph
            .outgoing(label)
            .filter(|c| self.is_fired(c.output()))
            .collect()
    }
}

/// Result of a gate evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    pub passed: bool,
    pub verdicts: Vec<Verdict>,
    /// The message the gate sends on, if any.
    pub emission: Option<Json>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutcome {
    Switch(SwitchRouting),
    Gate(GateOutcome),
    /// Nodes without rules pass the message on untouched.
    Passthrough,
}

/// Evaluates switch and gate nodes, remembering each node's previous payload
/// for `prev` rules.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    previous: AHashMap<String, Json>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self, node_id: &str) -> Option<&Json> {
        self.previous.get(node_id)
    }

    pub fn remember(&mut self, node_id: &str, payload: Json) {
        self.previous.insert(node_id.to_string(), payload);
    }

    /// Forgets every remembered payload.
    pub fn reset(&mut self) {
        self.previous.clear();
    }

    /// Evaluates every rule of a switch independently; no rule short-circuits
    /// another.
    pub fn route(
        &mut self,
        node_id: &str,
        switch: &SwitchNode,
        message: &Json,
        flow: &Json,
    ) -> SwitchRouting {
        let verdicts = self.judge(node_id, &switch.rules, message, flow);
        let routing = SwitchRouting { verdicts };
        tracing::debug!("Switch '{}' fired outputs {:?}", node_id, routing.fired());
        routing
    }

    /// Combines the gate's rules with AND or OR and decides what to emit.
    ///
    /// A passing gate emits the held message tagged with the output topic. A
    /// failing gate emits nothing when `emit_only_if_true` is set and the
    /// tagged message otherwise.
    pub fn gate(&mut self, node_id: &str, gate: &GateNode, message: &Json, flow: &Json) -> GateOutcome {
        let verdicts = self.judge(node_id, &gate.rules, message, flow);
        let passed = match gate.gate_type {
            GateType::And => verdicts.iter().all(|v| v.passed),
            GateType::Or => verdicts.iter().any(|v| v.passed),
        };
        let emission = (passed || !gate.emit_only_if_true).then(|| tag(message, &gate.output_topic));
        tracing::debug!(
            "Gate '{}' ({}) {}; emitting: {}",
            node_id,
            gate.gate_type,
            if passed { "passed" } else { "failed" },
            emission.is_some()
        );
        GateOutcome {
            passed,
            verdicts,
            emission,
        }
    }

    pub fn process(&mut self, node: &Node, message: &Json, flow: &Json) -> NodeOutcome {
        match &node.kind {
            NodeKind::Switch(switch) => {
                NodeOutcome::Switch(self.route(&node.id, switch, message, flow))
            }
            NodeKind::Gate(gate) => NodeOutcome::Gate(self.gate(&node.id, gate, message, flow)),
            _ => NodeOutcome::Passthrough,
        }
    }

    /// Explains every rule, then stores the current payload for nodes that
    /// compare against the previous one. An absent payload keeps the old value.
    fn judge(&mut self, node_id: &str, rules: &[Rule], message: &Json, flow: &Json) -> Vec<Verdict> {
        let context =
            Context::new(message, flow).with_previous(self.previous.get(node_id));
        let verdicts = rules.iter().map(|rule| explain(rule, &context)).collect();

        let current = rules
            .iter()
            .find(|rule| rule.uses_previous())
            .and_then(|rule| context.payload(rule.scope()))
            .cloned();
        if let Some(payload) = current {
            self.remember(node_id, payload);
        }
        verdicts
    }
}

/// Copy of `message` with `topic` set, unless the topic is empty.
fn tag(message: &Json, topic: &str) -> Json {
    let mut held = message.clone();
    if let (false, Json::Object(map)) = (topic.is_empty(), &mut held) {
        map.insert("topic".to_string(), Json::String(topic.to_string()));
    }
    held
}
