use clap::{Parser, Subcommand};
use flowgate::prelude::*;
use std::fs;
use std::time::Instant;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Inspect, evaluate and send flows built for the node-based editor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the editor configuration TOML file
    #[arg(short, long, default_value = "flowgate.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a flow JSON file and list its nodes
    Check {
        /// Path to the flow JSON file
        flow_path: String,
    },
    /// Evaluate the switch and gate nodes of a flow against a sample context
    Eval {
        /// Path to the flow JSON file
        flow_path: String,
        /// Optional path to a `{ msg, flow, previous }` JSON file
        context_path: Option<String>,
        /// Only evaluate the node with this label
        #[arg(short, long)]
        node: Option<String>,
    },
    /// Extract the notification shown for a push payload
    Notify {
        /// Path to the push payload JSON file
        payload_path: String,
    },
    /// Write a flow to stdout as one JSON line, as the bridge sends it
    Send {
        /// Path to the flow JSON file
        flow_path: String,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,flowgate=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = EditorConfig::load_or_default(&cli.config);

    match cli.command {
        Command::Check { flow_path } => run_check(&flow_path, &config),
        Command::Eval {
            flow_path,
            context_path,
            node,
        } => run_eval(&flow_path, context_path.as_deref(), node.as_deref()),
        Command::Notify { payload_path } => run_notify(&payload_path, &config),
        Command::Send { flow_path } => run_send(&flow_path),
    }
}

fn load_graph(flow_path: &str) -> FlowGraph {
    let flow_json = fs::read_to_string(flow_path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read flow file '{}': {}", flow_path, e))
    });
    FlowMessage::from_json(&flow_json)
        .and_then(FlowGraph::from_message)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid flow '{}': {}", flow_path, e)))
}

fn run_check(flow_path: &str, config: &EditorConfig) {
    let start = Instant::now();
    let graph = load_graph(flow_path);
    let duration = start.elapsed();

    println!("\nFlow is valid ({:?})", duration);
    println!("\n--- Nodes ---");
    for node in graph.nodes() {
        println!("  {}", node.summary());
        for (index, rule) in node.kind.rules().iter().enumerate() {
            match rule.condition() {
                Condition::Expression(expression) => {
                    println!("    [{}] {}", index, expression);
                    print!("{}", expression.display_tree());
                }
                _ => println!(
                    "    [{}] {}.{} {} {}",
                    index,
                    rule.scope().as_str(),
                    rule.property(),
                    rule.comparator().as_str(),
                    rule.definition().value
                ),
            }
        }
    }

    println!("\n--- Connections ---");
    for connection in graph.connections() {
        match connection.output_index {
            Some(index) => println!("  {}[{}] -> {}", connection.from, index, connection.to),
            None => println!("  {} -> {}", connection.from, connection.to),
        }
    }

    if config.graph.pretty_json {
        match graph.to_json(true) {
            Ok(json) => println!("\n--- Preview ---\n{}", json),
            Err(e) => exit_with_error(&format!("Failed to render flow: {}", e)),
        }
    }
}

fn run_eval(flow_path: &str, context_path: Option<&str>, only: Option<&str>) {
    let graph = load_graph(flow_path);
    let sample = match context_path {
        Some(path) => SampleContext::from_file(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load context from '{}': {}", path, e))
        }),
        None => {
            println!("No context file provided. Using a sample camera alert.");
            SampleContext::default()
        }
    };

    let nodes: Vec<&Node> = match only {
        Some(label) => vec![graph.node(label).unwrap_or_else(|| {
            exit_with_error(&format!("No node labelled '{}'", label))
        })],
        None => graph
            .nodes()
            .iter()
            .filter(|n| n.is_switch() || n.is_gate())
            .collect(),
    };
    if nodes.is_empty() {
        println!("Flow has no switch or gate nodes.");
    }

    let mut evaluator = Evaluator::new();
    for node in nodes {
        if let Some(previous) = sample.previous.clone() {
            evaluator.remember(&node.id, previous);
        }

        let start = Instant::now();
        let outcome = evaluator.process(node, &sample.msg, &sample.flow);
        let duration = start.elapsed();

        println!("\nEvaluated {} in {:?}", node.summary(), duration);
        match outcome {
            NodeOutcome::Switch(routing) => {
                print_verdicts(&routing.verdicts);
                let targets = routing.targets(&graph, &node.label);
                if targets.is_empty() {
                    println!("  -> No output fired");
                }
                for connection in targets {
                    println!("  -> Output {} to {}", connection.output(), connection.to);
                }
            }
            NodeOutcome::Gate(gate) => {
                print_verdicts(&gate.verdicts);
                println!("  -> Gate {}", if gate.passed { "passed" } else { "failed" });
                match gate.emission {
                    Some(message) => println!("  -> Emits: {}", message),
                    None => println!("  -> Emits nothing"),
                }
            }
            NodeOutcome::Passthrough => println!("  -> Node has no rules; message passes through"),
        }
    }
}

fn print_verdicts(verdicts: &[Verdict]) {
    for (index, verdict) in verdicts.iter().enumerate() {
        let mark = if verdict.passed { "pass" } else { "fail" };
        println!("  [{}] {}: {}", index, mark, verdict.reason);
    }
}

fn run_notify(payload_path: &str, config: &EditorConfig) {
    let payload = fs::read_to_string(payload_path)
        .map_err(|e| e.to_string())
        .and_then(|content| {
            serde_json::from_str::<serde_json::Value>(&content).map_err(|e| e.to_string())
        })
        .unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load payload '{}': {}", payload_path, e))
        });

    let notification = Notification::from_push(&payload, &config.notification);
    match serde_json::to_string_pretty(&notification) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with_error(&format!("Failed to render notification: {}", e)),
    }
    println!("Click opens: {}", notification.click_target(&config.notification));
}

fn run_send(flow_path: &str) {
    let graph = load_graph(flow_path);
    let mut bridge = JsonLinesBridge::new(std::io::stdout());
    if let Err(e) = bridge.send(&graph.to_message()) {
        exit_with_error(&format!("Failed to send flow: {}", e));
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
