//! Common test utilities for building rules, graphs and runtime stores.
use flowgate::prelude::*;
use serde_json::{Value as Json, json};

/// Builds a validated message-scoped rule, panicking on invalid input.
#[allow(dead_code)]
pub fn rule(property: &str, comparator: Comparator, value: &str, value_type: ValueType) -> Rule {
    Rule::try_from(RuleDefinition::new(property, comparator, value, value_type))
        .expect("test rule should be valid")
}

/// Builds a validated flow-scoped rule, as gate rules are stored.
#[allow(dead_code)]
pub fn flow_rule(
    property: &str,
    comparator: Comparator,
    value: &str,
    value_type: ValueType,
) -> Rule {
    Rule::try_from(
        RuleDefinition::new(property, comparator, value, value_type)
            .with_scope(PropertyScope::Flow),
    )
    .expect("test rule should be valid")
}

/// Evaluates `rule` against a message with an empty flow store.
#[allow(dead_code)]
pub fn holds(rule: &Rule, message: &Json) -> bool {
    evaluate(rule, &Context::message_only(message))
}

/// A camera alert as stored in flow context by the receive-alert trigger.
#[allow(dead_code)]
pub fn camera_alert() -> Json {
    json!({
        "message": "Motion detected",
        "cameraName": "cam-1",
        "area": "kitchen",
        "temperature": 35,
        "humidity": 40
    })
}

/// A switch on `area` with `eq kitchen` / `eq garage`, each output wired to
/// its own debug node.
///
/// Returns the graph and the labels `(switch, kitchen_debug, garage_debug)`.
#[allow(dead_code)]
pub fn create_area_switch() -> (FlowGraph, String, String, String) {
    let mut graph = FlowGraph::new();
    let switch = graph.add_switch().label.clone();
    let kitchen = graph.add_debug().label.clone();
    let garage = graph.add_debug().label.clone();

    graph
        .configure_switch(
            &switch,
            "area",
            vec![
                RuleDefinition::new("", Comparator::Eq, "kitchen", ValueType::Str),
                RuleDefinition::new("", Comparator::Eq, "garage", ValueType::Str),
            ],
            &[Some(kitchen.clone()), Some(garage.clone())],
        )
        .expect("switch configuration should be valid");

    (graph, switch, kitchen, garage)
}

/// A gate of the given type with `temperature gt 30` and `area eq kitchen`.
#[allow(dead_code)]
pub fn create_gate(gate_type: &str, topic: &str, emit_only_if_true: bool) -> (FlowGraph, String) {
    let mut graph = FlowGraph::new();
    let gate = graph
        .add_gate(gate_type)
        .expect("gate type should be valid")
        .label
        .clone();
    graph
        .configure_gate(
            &gate,
            topic,
            emit_only_if_true,
            vec![
                RuleDefinition::new("temperature", Comparator::Gt, "30", ValueType::Num),
                RuleDefinition::new("area", Comparator::Eq, "kitchen", ValueType::Str),
            ],
        )
        .expect("gate configuration should be valid");
    (graph, gate)
}
