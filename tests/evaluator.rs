//! Tests for rule evaluation and node-level switch/gate semantics.
mod common;
use common::*;
use flowgate::prelude::*;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_eq_str_matches_exact_text() {
    let rule = rule("area", Comparator::Eq, "kitchen", ValueType::Str);
    assert!(holds(&rule, &json!({ "area": "kitchen" })));
    assert!(!holds(&rule, &json!({ "area": "garage" })));
    assert!(!holds(&rule, &json!({ "area": "Kitchen" })));
    assert!(!holds(&rule, &json!({})));
}

#[test]
fn test_numeric_greater_than() {
    let rule = rule("temperature", Comparator::Gt, "30", ValueType::Num);
    assert!(holds(&rule, &json!({ "temperature": 35 })));
    assert!(holds(&rule, &json!({ "temperature": "35" })));
    assert!(!holds(&rule, &json!({ "temperature": 30 })));
    assert!(!holds(&rule, &json!({ "temperature": "abc" })));
    assert!(!holds(&rule, &json!({})));
}

#[test]
fn test_unparsable_literal_only_satisfies_neq() {
    let message = json!({ "temperature": 35 });
    for comparator in [
        Comparator::Eq,
        Comparator::Lt,
        Comparator::Lte,
        Comparator::Gt,
        Comparator::Gte,
    ] {
        let rule = rule("temperature", comparator, "warm", ValueType::Num);
        assert!(!holds(&rule, &message), "{:?} should be false", comparator);
    }
    let neq = rule("temperature", Comparator::Neq, "warm", ValueType::Num);
    assert!(holds(&neq, &message));
}

#[test]
fn test_inclusive_numeric_comparisons() {
    let message = json!({ "humidity": 40 });
    assert!(holds(&rule("humidity", Comparator::Gte, "40", ValueType::Num), &message));
    assert!(holds(&rule("humidity", Comparator::Lte, "40", ValueType::Num), &message));
    assert!(!holds(&rule("humidity", Comparator::Lt, "40", ValueType::Num), &message));
    assert!(holds(&rule("humidity", Comparator::Eq, "40.0", ValueType::Num), &message));
}

#[test]
fn test_bool_value_type() {
    let rule = rule("armed", Comparator::Eq, "true", ValueType::Bool);
    assert!(holds(&rule, &json!({ "armed": true })));
    assert!(holds(&rule, &json!({ "armed": "TRUE" })));
    assert!(!holds(&rule, &json!({ "armed": false })));
    assert!(!holds(&rule, &json!({ "armed": 1 })));

    // Anything other than "true" reads as false.
    let off = common::rule("armed", Comparator::Eq, "yes", ValueType::Bool);
    assert!(holds(&off, &json!({ "armed": false })));
}

#[test]
fn test_string_comparisons_are_lexicographic() {
    let rule = rule("camera", Comparator::Lt, "m", ValueType::Str);
    assert!(holds(&rule, &json!({ "camera": "garage" })));
    assert!(!holds(&rule, &json!({ "camera": "porch" })));

    // Numbers compared as strings use their text form.
    let text = common::rule("count", Comparator::Lt, "9", ValueType::Str);
    assert!(holds(&text, &json!({ "count": 10 })));
}

#[test]
fn test_missing_or_null_is_unequal_to_any_literal() {
    let empty = rule("label", Comparator::Eq, "", ValueType::Str);
    assert!(!holds(&empty, &json!({})));
    assert!(!holds(&empty, &json!({ "label": null })));
    assert!(holds(&empty, &json!({ "label": "" })));

    let neq = rule("label", Comparator::Neq, "x", ValueType::Str);
    assert!(holds(&neq, &json!({})));
}

#[test]
fn test_nested_property_paths() {
    let rule = rule("payload.readings[1].value", Comparator::Gt, "5", ValueType::Num);
    let message = json!({ "payload": { "readings": [{ "value": 1 }, { "value": 9 }] } });
    assert!(holds(&rule, &message));
    assert!(!holds(&rule, &json!({ "payload": { "readings": [{ "value": 9 }] } })));
}

#[test]
fn test_between_numeric_is_inclusive() {
    let rule = Rule::try_from(RuleDefinition::between(
        "temperature",
        "20",
        ValueType::Num,
        "30",
        BoundType::Num,
    ))
    .unwrap();
    assert!(holds(&rule, &json!({ "temperature": 20 })));
    assert!(holds(&rule, &json!({ "temperature": 25.5 })));
    assert!(holds(&rule, &json!({ "temperature": 30 })));
    assert!(!holds(&rule, &json!({ "temperature": 31 })));
    assert!(!holds(&rule, &json!({ "temperature": "hot" })));
}

#[test]
fn test_between_reversed_bounds_are_not_swapped() {
    let rule = Rule::try_from(RuleDefinition::between(
        "temperature",
        "30",
        ValueType::Num,
        "20",
        BoundType::Num,
    ))
    .unwrap();
    assert!(!holds(&rule, &json!({ "temperature": 25 })));
    assert!(!holds(&rule, &json!({ "temperature": 20 })));
    assert!(!holds(&rule, &json!({ "temperature": 30 })));
}

#[test]
fn test_between_lexical_and_mixed_bounds() {
    let lexical = Rule::try_from(RuleDefinition::between(
        "area",
        "b",
        ValueType::Str,
        "h",
        BoundType::Str,
    ))
    .unwrap();
    assert!(holds(&lexical, &json!({ "area": "garage" })));
    assert!(!holds(&lexical, &json!({ "area": "kitchen" })));

    // One numeric bound makes the whole comparison numeric.
    let mixed = Rule::try_from(RuleDefinition::between(
        "count",
        "9",
        ValueType::Str,
        "20",
        BoundType::Num,
    ))
    .unwrap();
    assert!(holds(&mixed, &json!({ "count": 15 })));
    assert!(!holds(&mixed, &json!({ "count": 100 })));
}

#[test]
fn test_prev_reads_remembered_payload() {
    let same = rule("temperature", Comparator::Eq, "", ValueType::Prev);
    assert_eq!(same.property(), "payload");
    assert!(same.uses_previous());

    let message = json!({ "payload": 35 });
    let previous = json!(35);
    let context = Context::message_only(&message).with_previous(Some(&previous));
    assert!(evaluate(&same, &context));

    let older = json!(30);
    let context = Context::message_only(&message).with_previous(Some(&older));
    assert!(!evaluate(&same, &context));

    let increased = rule("", Comparator::Lt, "", ValueType::Prev);
    assert!(evaluate(&increased, &context));
}

#[test]
fn test_prev_without_memory_is_unequal() {
    let eq = rule("payload", Comparator::Eq, "", ValueType::Prev);
    let neq = rule("payload", Comparator::Neq, "", ValueType::Prev);
    let message = json!({ "payload": 35 });
    assert!(!holds(&eq, &message));
    assert!(holds(&neq, &message));
}

#[test]
fn test_flow_scoped_rules_read_flow_store() {
    let rule = flow_rule("area", Comparator::Eq, "kitchen", ValueType::Str);
    let message = json!({ "area": "garage" });
    let flow = camera_alert();
    assert!(evaluate(&rule, &Context::new(&message, &flow)));
    assert!(!holds(&rule, &message));
}

#[test]
fn test_expression_rules() {
    let rule = Rule::try_from(RuleDefinition::expression(
        r#"payload.temperature > 30 and payload.area = "kitchen""#,
    ))
    .unwrap();
    let message = json!({ "payload": camera_alert() });
    assert!(holds(&rule, &message));
    assert!(!holds(&rule, &json!({ "payload": { "temperature": 20, "area": "kitchen" } })));
}

#[test]
fn test_expression_truthiness_and_type_errors() {
    let present = Rule::try_from(RuleDefinition::expression("payload.area")).unwrap();
    assert!(holds(&present, &json!({ "payload": { "area": "kitchen" } })));
    assert!(!holds(&present, &json!({ "payload": { "area": "" } })));
    assert!(!holds(&present, &json!({ "payload": {} })));

    let broken = Rule::try_from(RuleDefinition::expression("payload.area + 1 > 0")).unwrap();
    assert!(!holds(&broken, &json!({ "payload": { "area": "kitchen" } })));
}

#[test]
fn test_explain_describes_operands() {
    let message = json!({ "temperature": 35 });
    let rule = rule("temperature", Comparator::Gt, "30", ValueType::Num);
    let verdict = explain(&rule, &Context::message_only(&message));
    assert!(verdict.passed);
    assert_eq!(verdict.reason, "msg.temperature (was 35) > 30");

    let missing = explain(&rule, &Context::message_only(&json!({})));
    assert!(!missing.passed);
    assert_eq!(missing.reason, "msg.temperature (was absent) > 30");
}

#[test]
fn test_explain_expression_uses_trace() {
    let rule = Rule::try_from(RuleDefinition::expression("payload.temperature > 30")).unwrap();
    let message = json!({ "payload": { "temperature": 35 } });
    let verdict = explain(&rule, &Context::message_only(&message));
    assert!(verdict.passed);
    assert_eq!(verdict.reason, "payload.temperature (was 35) > 30");
}

#[test]
fn test_switch_fires_matching_output_only() {
    let (graph, switch, kitchen, _garage) = create_area_switch();
    let node = graph.node(&switch).unwrap();
    let mut evaluator = Evaluator::new();

    let NodeOutcome::Switch(routing) =
        evaluator.process(node, &json!({ "area": "kitchen" }), &json!({}))
    else {
        panic!("expected a switch outcome");
    };
    assert_eq!(routing.fired(), vec![0]);
    assert!(routing.is_fired(0));
    assert!(!routing.is_fired(1));

    let targets = routing.targets(&graph, &switch);
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].to, kitchen);
}

#[test]
fn test_switch_evaluates_every_rule() {
    let mut graph = FlowGraph::new();
    let switch = graph.add_switch().label.clone();
    graph
        .configure_switch(
            &switch,
            "temperature",
            vec![
                RuleDefinition::new("", Comparator::Gt, "10", ValueType::Num),
                RuleDefinition::new("", Comparator::Gt, "20", ValueType::Num),
                RuleDefinition::new("", Comparator::Gt, "40", ValueType::Num),
            ],
            &[],
        )
        .unwrap();

    let switch_node = graph.node(&switch).unwrap();
    let mut evaluator = Evaluator::new();
    let routing = evaluator.route(
        &switch_node.id,
        switch_node.as_switch().unwrap(),
        &json!({ "temperature": 25 }),
        &json!({}),
    );
    assert_eq!(routing.fired(), vec![0, 1]);
    assert_eq!(routing.verdicts.len(), 3);
}

#[test]
fn test_and_gate_requires_all_rules() {
    let (graph, gate) = create_gate("and", "alerts", true);
    let node = graph.node(&gate).unwrap();
    let message = json!({ "payload": "motion" });
    let mut evaluator = Evaluator::new();

    let NodeOutcome::Gate(outcome) = evaluator.process(node, &message, &camera_alert()) else {
        panic!("expected a gate outcome");
    };
    assert!(outcome.passed);
    assert_eq!(
        outcome.emission,
        Some(json!({ "payload": "motion", "topic": "alerts" }))
    );

    let cold = json!({ "area": "kitchen", "temperature": 12 });
    let NodeOutcome::Gate(outcome) = evaluator.process(node, &message, &cold) else {
        panic!("expected a gate outcome");
    };
    assert!(!outcome.passed);
    assert_eq!(outcome.emission, None);
}

#[test]
fn test_or_gate_requires_one_rule() {
    let (graph, gate) = create_gate("or", "alerts", true);
    let node = graph.node(&gate).unwrap();
    let gate_node = node.as_gate().unwrap();
    let message = json!({ "payload": "motion" });
    let mut evaluator = Evaluator::new();

    let one = json!({ "area": "garage", "temperature": 35 });
    assert!(evaluator.gate(&node.id, gate_node, &message, &one).passed);

    let none = json!({ "area": "garage", "temperature": 12 });
    let outcome = evaluator.gate(&node.id, gate_node, &message, &none);
    assert!(!outcome.passed);
    assert!(outcome.verdicts.iter().all(|v| !v.passed));
}

#[test]
fn test_failed_gate_still_emits_when_not_only_if_true() {
    let (graph, gate) = create_gate("and", "alerts", false);
    let node = graph.node(&gate).unwrap();
    let message = json!({ "payload": "motion" });
    let mut evaluator = Evaluator::new();

    let NodeOutcome::Gate(outcome) = evaluator.process(node, &message, &json!({})) else {
        panic!("expected a gate outcome");
    };
    assert!(!outcome.passed);
    assert_eq!(
        outcome.emission,
        Some(json!({ "payload": "motion", "topic": "alerts" }))
    );
}

#[test]
fn test_empty_gates() {
    let mut graph = FlowGraph::new();
    let and = graph.add_gate("and").unwrap().label.clone();
    let or = graph.add_gate("or").unwrap().label.clone();
    let mut evaluator = Evaluator::new();
    let message = json!({ "payload": 1 });

    let and_node = graph.node(&and).unwrap();
    let or_node = graph.node(&or).unwrap();
    let and_outcome = evaluator.gate(&and_node.id, and_node.as_gate().unwrap(), &message, &json!({}));
    let or_outcome = evaluator.gate(&or_node.id, or_node.as_gate().unwrap(), &message, &json!({}));
    assert!(and_outcome.passed);
    assert!(!or_outcome.passed);
    // No topic configured: the held message is emitted unchanged.
    assert_eq!(and_outcome.emission, Some(message));
}

#[test]
fn test_evaluator_remembers_previous_payload() {
    let mut graph = FlowGraph::new();
    let switch = graph.add_switch().label.clone();
    graph
        .configure_switch(
            &switch,
            "payload",
            vec![RuleDefinition::new("", Comparator::Neq, "", ValueType::Prev)],
            &[],
        )
        .unwrap();
    let node = graph.node(&switch).unwrap();
    let mut evaluator = Evaluator::new();
    let changed = |outcome: NodeOutcome| match outcome {
        NodeOutcome::Switch(routing) => routing.is_fired(0),
        _ => panic!("expected a switch outcome"),
    };

    assert!(changed(evaluator.process(node, &json!({ "payload": 30 }), &json!({}))));
    assert_eq!(evaluator.previous(&node.id), Some(&json!(30)));

    assert!(!changed(evaluator.process(node, &json!({ "payload": 30 }), &json!({}))));
    assert!(changed(evaluator.process(node, &json!({ "payload": 31 }), &json!({}))));

    // A message without a payload leaves the memory alone.
    evaluator.process(node, &json!({ "other": true }), &json!({}));
    assert_eq!(evaluator.previous(&node.id), Some(&json!(31)));

    evaluator.reset();
    assert_eq!(evaluator.previous(&node.id), None);
}

#[test]
fn test_nodes_without_rules_pass_through() {
    let mut graph = FlowGraph::new();
    let debug = graph.add_debug().label.clone();
    let mut evaluator = Evaluator::new();
    let outcome = evaluator.process(graph.node(&debug).unwrap(), &json!({}), &json!({}));
    assert_eq!(outcome, NodeOutcome::Passthrough);
}

#[test]
fn test_sample_context_supplies_previous() {
    let sample: SampleContext = serde_json::from_value(json!({
        "msg": { "payload": 35 },
        "previous": 35
    }))
    .unwrap();
    let rule = rule("payload", Comparator::Eq, "", ValueType::Prev);
    assert!(evaluate(&rule, &sample.context()));
    assert_eq!(sample.flow, serde_json::Value::Null);
}

#[test]
fn test_sample_context_loads_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let sample_path = temp_dir.path().join("context.json");
    std::fs::write(
        &sample_path,
        r#"{ "msg": { "payload": 31, "area": "kitchen" }, "flow": { "temperature": 35 }, "previous": 30 }"#,
    )
    .unwrap();

    let sample = SampleContext::from_file(&sample_path).unwrap();
    assert_eq!(sample.previous, Some(json!(30)));
    let context = sample.context();
    assert!(evaluate(&rule("area", Comparator::Eq, "kitchen", ValueType::Str), &context));
    assert!(evaluate(&flow_rule("temperature", Comparator::Gt, "30", ValueType::Num), &context));
    assert!(evaluate(&rule("payload", Comparator::Lt, "", ValueType::Prev), &context));

    let minimal = temp_dir.path().join("minimal.json");
    std::fs::write(&minimal, r#"{ "msg": { "payload": 1 } }"#).unwrap();
    let sample = SampleContext::from_file(&minimal).unwrap();
    assert_eq!(sample.flow, serde_json::Value::Null);
    assert_eq!(sample.previous, None);

    let broken = temp_dir.path().join("broken.json");
    std::fs::write(&broken, "{ msg: ").unwrap();
    assert!(SampleContext::from_file(&broken).is_err());
    assert!(SampleContext::from_file(temp_dir.path().join("missing.json")).is_err());
}
