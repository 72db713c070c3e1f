//! # Flowgate - Rule Model and Flow Graph Store for Node-Based Editors
//!
//! **Flowgate** is the core of a visual flow editor: the typed condition rules
//! used by switch and gate nodes, the semantics of those nodes, and the
//! in-memory graph that is serialized to JSON and handed to an external flow
//! runtime. It does not execute flows; it evaluates a single node's rules
//! against a context you supply.
//!
//! ## Core Workflow
//!
//! 1.  **Build a Graph**: Add inject, switch, gate and debug nodes to a `FlowGraph` and connect them by label.
//! 2.  **Configure Nodes**: Save rules into switches and gates. Rules are validated when they are saved, so evaluation never rejects a rule.
//! 3.  **Evaluate**: Run a switch or gate against a message and flow store with an `Evaluator`, which also remembers each node's previous payload.
//! 4.  **Send**: Serialize the graph to the runtime's `{ nodes, connections }` JSON through a `Bridge`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowgate::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let mut graph = FlowGraph::new();
//!     let switch = graph.add_switch().label.clone();
//!     let kitchen = graph.add_debug().label.clone();
//!     let garage = graph.add_debug().label.clone();
//!
//!     // Rule i drives output i.
//!     graph.configure_switch(
//!         &switch,
//!         "area",
//!         vec![
//!             RuleDefinition::new("", Comparator::Eq, "kitchen", ValueType::Str),
//!             RuleDefinition::new("", Comparator::Eq, "garage", ValueType::Str),
//!         ],
//!         &[Some(kitchen.clone()), Some(garage)],
//!     )?;
//!
//!     let node = graph.node(&switch).ok_or("switch missing")?;
//!     let message = json!({ "area": "kitchen" });
//!     let mut evaluator = Evaluator::new();
//!     if let NodeOutcome::Switch(routing) = evaluator.process(node, &message, &json!({})) {
//!         for verdict in &routing.verdicts {
//!             println!("{} -> {}", verdict.reason, verdict.passed);
//!         }
//!         let targets = routing.targets(&graph, &switch);
//!         assert_eq!(targets[0].to, kitchen);
//!     }
//!
//!     // Hand the graph to the runtime, one JSON object per line.
//!     let mut bridge = JsonLinesBridge::new(std::io::stdout());
//!     bridge.send(&graph.to_message())?;
//!     Ok(())
//! }
//! ```

pub mod ast;
pub mod bridge;
pub mod compiler;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod notification;
pub mod path;
pub mod prelude;
pub mod rule;
pub mod trace;
