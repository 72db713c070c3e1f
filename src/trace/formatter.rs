use crate::ast::EvaluationTrace;
use itertools::Itertools;

/// Formats evaluation traces into human-readable strings
pub struct TraceFormatter;

impl TraceFormatter {
    /// Format an evaluation trace into a human-readable explanation.
    pub fn format_trace(trace: &EvaluationTrace) -> String {
        // Start the recursive formatting with the lowest possible parent precedence.
        Self::format_recursive(trace, 0)
    }

    /// Recursively formats the trace, adding parentheses only when necessary.
    fn format_recursive(trace: &EvaluationTrace, parent_precedence: u8) -> String {
        let current_precedence = trace.precedence();
        let needs_parens = current_precedence < parent_precedence;

        let mut result = String::new();
        if needs_parens {
            result.push('(');
        }

        match trace {
            EvaluationTrace::BinaryOp {
                op_symbol,
                left,
                right,
                ..
            } => {
                let left_str = Self::format_recursive(left, current_precedence);

                // For short-circuiting operators, only include the right side if it was evaluated.
                if !matches!(**right, EvaluationTrace::NotEvaluated) {
                    let right_str = Self::format_recursive(right, current_precedence + 1);
                    result.push_str(&format!("{} {} {}", left_str, op_symbol, right_str));
                } else {
                    result.push_str(&left_str);
                }
            }
            EvaluationTrace::UnaryOp {
                op_symbol, child, ..
            } => {
                let child_str = Self::format_recursive(child, current_precedence);
                result.push_str(&format!("{}{}", op_symbol, child_str));
            }
            EvaluationTrace::Call { name, args, .. } => {
                let args_str = args.iter().map(|a| Self::format_recursive(a, 0)).join(", ");
                result.push_str(&format!("${}({})", name, args_str));
            }
            EvaluationTrace::Array { items, .. } => {
                let items_str = items.iter().map(|i| Self::format_recursive(i, 0)).join(", ");
                result.push_str(&format!("[{}]", items_str));
            }
            EvaluationTrace::Input { path, value } => {
                result.push_str(&format!("{} (was {})", path, value));
            }
            EvaluationTrace::Leaf { source, .. } => result.push_str(source),
            EvaluationTrace::NotEvaluated => {}
        }

        if needs_parens {
            result.push(')');
        }
        result
    }
}
