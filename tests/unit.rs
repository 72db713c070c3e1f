//! Unit tests for values, paths, traces and the runtime surfaces.
use flowgate::config::{DEFAULT_CLICK_URL, DEFAULT_NOTIFICATION_IMAGE};
use flowgate::path::{PathSegment, PropertyPath};
use flowgate::prelude::*;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_value_display() {
    assert_eq!(format!("{}", Value::Number(42.0)), "42");
    assert_eq!(format!("{}", Value::Number(2.5)), "2.5");
    assert_eq!(format!("{}", Value::Bool(true)), "true");
    assert_eq!(format!("{}", Value::Null), "null");
    assert_eq!(format!("{}", Value::String("kitchen".into())), "\"kitchen\"");
    assert_eq!(
        format!("{}", Value::Array(vec![Value::Number(1.0), Value::Number(2.0)])),
        "[1, 2]"
    );
}

#[test]
fn test_value_truthiness() {
    assert!(!Value::Undefined.is_truthy());
    assert!(!Value::Number(0.0).is_truthy());
    assert!(!Value::String(String::new()).is_truthy());
    assert!(!Value::Array(vec![Value::Bool(false)]).is_truthy());
    assert!(Value::Number(-1.0).is_truthy());
    assert!(Value::from_json(Some(&json!({ "a": 1 }))).is_truthy());
    assert_eq!(Value::from_json(None), Value::Undefined);
}

#[test]
fn test_property_path_parsing() {
    let path = PropertyPath::parse(r#"payload.readings[0]["sensor id"]"#).unwrap();
    assert_eq!(
        path.segments(),
        &[
            PathSegment::Key("payload".to_string()),
            PathSegment::Key("readings".to_string()),
            PathSegment::Index(0),
            PathSegment::Key("sensor id".to_string()),
        ]
    );

    assert_eq!(PropertyPath::parse(" area ").unwrap().to_string(), "area");
    assert_eq!(PropertyPath::parse("a[2].b").unwrap().to_string(), "a[2].b");
    assert_eq!(PropertyPath::root().to_string(), "$");

    for malformed in ["", ".a", "a.", "a..b", "[0]", "a[x]", "a[0", "a[0]b"] {
        assert!(PropertyPath::parse(malformed).is_none(), "'{}' should not parse", malformed);
    }
}

#[test]
fn test_property_path_resolution() {
    let store = json!({ "payload": { "readings": [{ "value": 7 }], "area": "kitchen" } });
    let resolve = |text: &str| PropertyPath::parse(text).unwrap().resolve(&store).cloned();

    assert_eq!(resolve("payload.area"), Some(json!("kitchen")));
    assert_eq!(resolve("payload.readings[0].value"), Some(json!(7)));
    assert_eq!(resolve("payload.readings[3].value"), None);
    assert_eq!(resolve("payload.area.length"), None);
    assert_eq!(PropertyPath::root().resolve(&store), Some(&store));
}

#[test]
fn test_trace_formatter_short_circuit() {
    let trace = EvaluationTrace::BinaryOp {
        op_symbol: "or",
        left: Box::new(EvaluationTrace::Leaf {
            source: "true".to_string(),
            value: Value::Bool(true),
        }),
        right: Box::new(EvaluationTrace::NotEvaluated),
        outcome: Value::Bool(true),
    };

    let formatted = TraceFormatter::format_trace(&trace);
    assert_eq!(formatted, "true"); // Should only show the decisive part
}

#[test]
fn test_trace_formatter_parenthesizes_lower_precedence() {
    let input = |path: &str, value: f64| EvaluationTrace::Input {
        path: path.to_string(),
        value: Value::Number(value),
    };
    let sum = EvaluationTrace::BinaryOp {
        op_symbol: "+",
        left: Box::new(input("a", 1.0)),
        right: Box::new(input("b", 2.0)),
        outcome: Value::Number(3.0),
    };
    let product = EvaluationTrace::BinaryOp {
        op_symbol: "*",
        left: Box::new(sum),
        right: Box::new(EvaluationTrace::Leaf {
            source: "2".to_string(),
            value: Value::Number(2.0),
        }),
        outcome: Value::Number(6.0),
    };
    assert_eq!(
        TraceFormatter::format_trace(&product),
        "(a (was 1) + b (was 2)) * 2"
    );
}

#[test]
fn test_notification_prefers_data_over_notification() {
    let defaults = NotificationDefaults::default();
    let payload = json!({
        "data": { "title": "Camera alert", "url": "/alerts/1" },
        "notification": { "title": "Ignored", "body": "Motion in kitchen", "icon": "/icon.png" }
    });
    let notification = Notification::from_push(&payload, &defaults);

    assert_eq!(notification.title, "Camera alert");
    assert_eq!(notification.body, "Motion in kitchen");
    assert_eq!(notification.icon.as_deref(), Some("/icon.png"));
    assert_eq!(notification.image, DEFAULT_NOTIFICATION_IMAGE);
    assert_eq!(notification.url, "/alerts/1");
    assert!(!notification.require_interaction);
    assert_eq!(notification.click_target(&defaults), DEFAULT_CLICK_URL);
}

#[test]
fn test_notification_defaults_and_empty_fields() {
    let defaults = NotificationDefaults::default();
    let empty = Notification::from_push(&json!({}), &defaults);
    assert_eq!(empty.title, "Notification");
    assert_eq!(empty.body, "");
    assert_eq!(empty.icon, None);
    assert_eq!(empty.url, "/test/");

    let blank = json!({
        "data": { "title": "", "image": "" },
        "notification": { "title": "Fallback", "click_action": "/open" }
    });
    let notification = Notification::from_push(&blank, &defaults);
    assert_eq!(notification.title, "Fallback");
    assert_eq!(notification.image, DEFAULT_NOTIFICATION_IMAGE);
    assert_eq!(notification.url, "/open");
}

#[test]
fn test_notification_serializes_camel_case() {
    let notification = Notification::from_push(&json!({}), &NotificationDefaults::default());
    let wire = serde_json::to_value(&notification).unwrap();
    assert_eq!(wire["requireInteraction"], false);
    assert!(wire.get("icon").is_none());
}

#[test]
fn test_status_board_keeps_latest_payload() {
    let mut board = StatusBoard::new();
    assert_eq!(board.display(), None);

    assert!(board.receive(&json!({ "payload": "deployed" })));
    assert_eq!(board.display().as_deref(), Some("deployed"));

    assert!(!board.receive(&json!({ "topic": "status" })));
    assert_eq!(board.display().as_deref(), Some("deployed"));

    assert!(board.receive(&json!({ "payload": { "ok": true } })));
    assert_eq!(board.display().as_deref(), Some(r#"{"ok":true}"#));
    assert_eq!(board.latest(), Some(&json!({ "ok": true })));
}

#[test]
fn test_config_from_toml_fills_defaults() {
    let config = EditorConfig::from_toml(
        r#"
        [notification]
        title = "Alert"

        [graph]
        pretty_json = false
        "#,
    )
    .unwrap();
    assert_eq!(config.notification.title, "Alert");
    assert_eq!(config.notification.click_url, DEFAULT_CLICK_URL);
    assert!(!config.graph.pretty_json);

    let empty = EditorConfig::from_toml("").unwrap();
    assert_eq!(empty, EditorConfig::default());
    assert!(empty.graph.pretty_json);
}

#[test]
fn test_config_errors_and_fallback() {
    assert!(matches!(
        EditorConfig::from_toml("[graph]\npretty_json = 3"),
        Err(ConfigError::Parse { .. })
    ));
    assert!(matches!(
        EditorConfig::from_file("does/not/exist.toml"),
        Err(ConfigError::Read { .. })
    ));
    assert_eq!(
        EditorConfig::load_or_default("does/not/exist.toml"),
        EditorConfig::default()
    );
}

#[test]
fn test_config_loads_partial_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("flowgate.toml");
    std::fs::write(
        &config_path,
        "[notification]\ntitle = \"Camera alert\"\n\n[graph]\npretty_json = false\n",
    )
    .unwrap();

    let config = EditorConfig::from_file(&config_path).unwrap();
    assert_eq!(config.notification.title, "Camera alert");
    assert_eq!(config.notification.image, DEFAULT_NOTIFICATION_IMAGE);
    assert_eq!(config.notification.click_url, DEFAULT_CLICK_URL);
    assert!(!config.graph.pretty_json);
    assert_eq!(EditorConfig::load_or_default(&config_path), config);

    let graph_only = temp_dir.path().join("graph.toml");
    std::fs::write(&graph_only, "[graph]\npretty_json = false\n").unwrap();
    let config = EditorConfig::from_file(&graph_only).unwrap();
    assert_eq!(config.notification, NotificationDefaults::default());

    let broken = temp_dir.path().join("broken.toml");
    std::fs::write(&broken, "[graph\n").unwrap();
    assert!(matches!(
        EditorConfig::from_file(&broken),
        Err(ConfigError::Parse { .. })
    ));
    assert_eq!(EditorConfig::load_or_default(&broken), EditorConfig::default());
}

#[test]
fn test_config_toml_round_trip() {
    let mut config = EditorConfig::default();
    config.notification.click_url = "/dashboard/".to_string();
    let text = config.to_toml().unwrap();
    assert_eq!(EditorConfig::from_toml(&text).unwrap(), config);
}
