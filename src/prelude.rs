//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the flowgate crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowgate::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let sample = SampleContext::from_file("path/to/context.json")?;
//! let rule = Rule::try_from(RuleDefinition::new(
//!     "temperature",
//!     Comparator::Gt,
//!     "30",
//!     ValueType::Num,
//! ))?;
//!
//! let verdict = explain(&rule, &sample.context());
//! println!("{} -> {}", verdict.reason, verdict.passed);
//! # Ok(())
//! # }
//! ```

// Rules and evaluation
pub use crate::evaluator::{
    Context, Evaluator, GateOutcome, NodeOutcome, SwitchRouting, Verdict, evaluate, explain,
};
pub use crate::rule::{
    BoundType, Comparator, Condition, PropertyScope, Rule, RuleDefinition, ValueType,
};

// Graph store
pub use crate::graph::{
    Connection, EmailAction, FlowGraph, FlowMessage, GateType, Node, NodeKind,
};

// Expressions
pub use crate::ast::{EvaluationTrace, Expression, Value};
pub use crate::compiler::{CompiledExpression, compile};
pub use crate::trace::TraceFormatter;

// Runtime surfaces
pub use crate::bridge::{Bridge, JsonLinesBridge, StatusBoard};
pub use crate::config::{EditorConfig, NotificationDefaults};
pub use crate::data::SampleContext;
pub use crate::notification::Notification;

// Error types
pub use crate::error::{BridgeError, CompileError, ConfigError, GraphError, RuleError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
