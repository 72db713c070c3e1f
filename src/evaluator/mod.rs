//! Rule evaluation against a runtime context.
//!
//! [`evaluate`] decides whether a single rule holds; [`explain`] additionally
//! renders why. Node-level semantics (switch routing, gate combination and
//! the previous-payload memory) live in [`Evaluator`].

use crate::ast::EvaluationTrace;
use crate::compiler::CompiledExpression;
use crate::rule::{Comparison, Condition, Operand, PropertyScope, Rule, Subject};
use crate::trace::TraceFormatter;
use serde_json::Value as Json;
use std::cmp::Ordering;

mod engine;
mod node;

use engine::AstEngine;
pub use node::{Evaluator, GateOutcome, NodeOutcome, SwitchRouting};

static NULL: Json = Json::Null;

/// The stores a rule reads from: the message, the flow context and the
/// node's remembered previous payload.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    message: &'a Json,
    flow: &'a Json,
    previous: Option<&'a Json>,
}

impl<'a> Context<'a> {
    pub fn new(message: &'a Json, flow: &'a Json) -> Self {
        Self {
            message,
            flow,
            previous: None,
        }
    }

    /// A context whose flow store is empty.
    pub fn message_only(message: &'a Json) -> Self {
        Self::new(message, &NULL)
    }

    pub fn with_previous(mut self, previous: Option<&'a Json>) -> Self {
        self.previous = previous;
        self
    }

    pub fn message(&self) -> &'a Json {
        self.message
    }

    pub fn flow(&self) -> &'a Json {
        self.flow
    }

    pub fn previous(&self) -> Option<&'a Json> {
        self.previous
    }

    pub fn store(&self, scope: PropertyScope) -> &'a Json {
        match scope {
            PropertyScope::Msg => self.message,
            PropertyScope::Flow => self.flow,
        }
    }

    /// The `payload` of the given store, if present.
    pub fn payload(&self, scope: PropertyScope) -> Option<&'a Json> {
        self.store(scope).get("payload")
    }
}

/// Outcome of a single rule with a human-readable reason.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub passed: bool,
    pub reason: String,
}

/// Decides whether `rule` holds in `context`.
///
/// Evaluation never fails: unparsable literals compare as `NaN`, absent
/// properties are unequal to everything, and an expression that hits a type
/// mismatch is false.
pub fn evaluate(rule: &Rule, context: &Context<'_>) -> bool {
    let left = resolve_left(rule, context);
    match rule.condition() {
        Condition::Compare {
            comparison,
            operand,
        } => compare(*comparison, operand, left, context.payload(rule.scope())),
        Condition::Between(range) => range.contains(left),
        Condition::Expression(expression) => run_expression(expression, context.message())
            .is_some_and(|trace| trace.get_outcome().is_truthy()),
    }
}

/// Like [`evaluate`], but also describes the values that decided the outcome.
pub fn explain(rule: &Rule, context: &Context<'_>) -> Verdict {
    let left = resolve_left(rule, context);
    let (passed, reason) = match rule.condition() {
        Condition::Compare {
            comparison,
            operand,
        } => {
            let current = context.payload(rule.scope());
            let right = match operand {
                Operand::CurrentPayload => format!("current payload ({})", describe(current)),
                other => other.to_string(),
            };
            (
                compare(*comparison, operand, left, current),
                format!("{} {} {}", subject_label(rule, left), comparison.symbol(), right),
            )
        }
        Condition::Between(range) => (
            range.contains(left),
            format!("{} between {}", subject_label(rule, left), range),
        ),
        Condition::Expression(expression) => match run_expression(expression, context.message()) {
            Some(trace) => (
                trace.get_outcome().is_truthy(),
                TraceFormatter::format_trace(&trace),
            ),
            None => (false, format!("{} (failed to evaluate)", expression)),
        },
    };
    Verdict { passed, reason }
}

fn resolve_left<'a>(rule: &Rule, context: &Context<'a>) -> Option<&'a Json> {
    match rule.subject() {
        Subject::Property(path) => path.resolve(context.store(rule.scope())),
        Subject::Previous => context.previous(),
        Subject::Message => Some(context.message()),
    }
}

fn compare(
    comparison: Comparison,
    operand: &Operand,
    left: Option<&Json>,
    current: Option<&Json>,
) -> bool {
    let order = || operand.order(left, current);
    match comparison {
        Comparison::Eq => operand.equals(left, current),
        Comparison::Neq => !operand.equals(left, current),
        Comparison::Lt => order() == Some(Ordering::Less),
        Comparison::Lte => matches!(order(), Some(Ordering::Less | Ordering::Equal)),
        Comparison::Gt => order() == Some(Ordering::Greater),
        Comparison::Gte => matches!(order(), Some(Ordering::Greater | Ordering::Equal)),
    }
}

fn run_expression(expression: &CompiledExpression, message: &Json) -> Option<EvaluationTrace> {
    AstEngine::new(expression.ast(), message)
        .evaluate()
        .inspect_err(|e| tracing::debug!("Expression '{}' failed: {}", expression, e))
        .ok()
}

fn subject_label(rule: &Rule, left: Option<&Json>) -> String {
    match rule.subject() {
        Subject::Previous => format!("previous payload ({})", describe(left)),
        _ => format!(
            "{}.{} (was {})",
            rule.scope().as_str(),
            rule.property().trim(),
            describe(left)
        ),
    }
}

fn describe(value: Option<&Json>) -> String {
    value.map_or_else(|| "absent".to_string(), Json::to_string)
}
