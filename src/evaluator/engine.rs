use crate::ast::{EvaluationTrace, Expression, Function, Value};
use crate::compiler::MAX_EXPRESSION_DEPTH;
use crate::error::EvaluationError;
use serde_json::Value as Json;
use std::cmp::Ordering;

// This macro generates a match arm for a binary operation.
macro_rules! eval_op {
    ($self:ident, $l:ident, $r:ident, $d:ident, $op_str:expr, $op_fn:expr, number) => {
        $self.eval_arithmetic($l, $r, $d, $op_str, $op_fn)
    };
    ($self:ident, $l:ident, $r:ident, $d:ident, $op_str:expr, $op_fn:expr, ordering) => {
        $self.eval_ordering($l, $r, $d, $op_str, $op_fn)
    };
}

/// The core recursive engine for evaluating a compiled expression against a message.
pub(crate) struct AstEngine<'a> {
    expression: &'a Expression,
    message: &'a Json,
}

impl<'a> AstEngine<'a> {
    pub(crate) fn new(expression: &'a Expression, message: &'a Json) -> Self {
        Self {
            expression,
            message,
        }
    }

    /// Evaluates the AST and returns a trace of the execution.
    pub(crate) fn evaluate(&self) -> Result<EvaluationTrace, EvaluationError> {
        self.evaluate_recursive(self.expression, 1)
    }

    fn evaluate_recursive(
        &self,
        expr: &Expression,
        depth: usize,
    ) -> Result<EvaluationTrace, EvaluationError> {
        if depth > MAX_EXPRESSION_DEPTH {
            return Err(EvaluationError::TooDeep {
                max: MAX_EXPRESSION_DEPTH,
            });
        }
        let next = depth + 1;
        match expr {
            // --- Arithmetic Operations ---
            Expression::Sum(l, r) => eval_op!(self, l, r, next, "+", |a, b| a + b, number),
            Expression::Subtract(l, r) => eval_op!(self, l, r, next, "-", |a, b| a - b, number),
            Expression::Multiply(l, r) => eval_op!(self, l, r, next, "*", |a, b| a * b, number),
            Expression::Divide(l, r) => eval_op!(self, l, r, next, "/", |a, b| a / b, number),
            Expression::Modulo(l, r) => eval_op!(self, l, r, next, "%", |a, b| a % b, number),
            Expression::Negate(v) => {
                let child_trace = self.evaluate_recursive(v, next)?;
                let outcome = match child_trace.get_outcome() {
                    Value::Number(val) => Value::Number(-val),
                    Value::Undefined => Value::Undefined,
                    val => return Err(self.type_mismatch("-", "Number", val)),
                };
                Ok(EvaluationTrace::UnaryOp {
                    op_symbol: "-",
                    child: Box::new(child_trace),
                    outcome,
                })
            }
            Expression::Concat(l, r) => {
                let left_trace = self.evaluate_recursive(l, next)?;
                let right_trace = self.evaluate_recursive(r, next)?;
                let outcome = Value::String(format!(
                    "{}{}",
                    left_trace.get_outcome().to_plain_string(),
                    right_trace.get_outcome().to_plain_string()
                ));
                Ok(binary("&", left_trace, right_trace, outcome))
            }

            // --- Comparison Operations ---
            Expression::GreaterThan(l, r) => {
                eval_op!(self, l, r, next, ">", |o| o == Ordering::Greater, ordering)
            }
            Expression::GreaterThanOrEqual(l, r) => {
                eval_op!(self, l, r, next, ">=", |o| o != Ordering::Less, ordering)
            }
            Expression::SmallerThan(l, r) => {
                eval_op!(self, l, r, next, "<", |o| o == Ordering::Less, ordering)
            }
            Expression::SmallerThanOrEqual(l, r) => {
                eval_op!(self, l, r, next, "<=", |o| o != Ordering::Greater, ordering)
            }

            // --- Equality ---
            Expression::Equal(l, r) => {
                let left_trace = self.evaluate_recursive(l, next)?;
                let right_trace = self.evaluate_recursive(r, next)?;
                let (lv, rv) = (left_trace.get_outcome(), right_trace.get_outcome());
                let outcome = Value::Bool(!lv.is_undefined() && !rv.is_undefined() && lv == rv);
                Ok(binary("=", left_trace, right_trace, outcome))
            }
            Expression::NotEqual(l, r) => {
                let left_trace = self.evaluate_recursive(l, next)?;
                let right_trace = self.evaluate_recursive(r, next)?;
                let (lv, rv) = (left_trace.get_outcome(), right_trace.get_outcome());
                let outcome = Value::Bool(!lv.is_undefined() && !rv.is_undefined() && lv != rv);
                Ok(binary("!=", left_trace, right_trace, outcome))
            }
            Expression::In(l, r) => {
                let left_trace = self.evaluate_recursive(l, next)?;
                let right_trace = self.evaluate_recursive(r, next)?;
                let needle = left_trace.get_outcome();
                let found = match right_trace.get_outcome() {
                    Value::Array(items) => items.contains(&needle),
                    Value::Undefined => false,
                    single => single == needle,
                };
                let outcome = Value::Bool(!needle.is_undefined() && found);
                Ok(binary("in", left_trace, right_trace, outcome))
            }

            // --- Logical Operations  ---
            Expression::And(l, r) => {
                let left_trace = self.evaluate_recursive(l, next)?;
                if !left_trace.get_outcome().is_truthy() {
                    return Ok(binary(
                        "and",
                        left_trace,
                        EvaluationTrace::NotEvaluated,
                        Value::Bool(false),
                    ));
                }
                let right_trace = self.evaluate_recursive(r, next)?;
                let outcome = Value::Bool(right_trace.get_outcome().is_truthy());
                Ok(binary("and", left_trace, right_trace, outcome))
            }
            Expression::Or(l, r) => {
                let left_trace = self.evaluate_recursive(l, next)?;
                if left_trace.get_outcome().is_truthy() {
                    return Ok(binary(
                        "or",
                        left_trace,
                        EvaluationTrace::NotEvaluated,
                        Value::Bool(true),
                    ));
                }
                let right_trace = self.evaluate_recursive(r, next)?;
                let outcome = Value::Bool(right_trace.get_outcome().is_truthy());
                Ok(binary("or", left_trace, right_trace, outcome))
            }

            // --- Other Operations ---
            Expression::Call { function, args } => {
                let arg_traces = args
                    .iter()
                    .map(|a| self.evaluate_recursive(a, next))
                    .collect::<Result<Vec<_>, _>>()?;
                let values: Vec<Value> = arg_traces.iter().map(|t| t.get_outcome()).collect();
                let outcome = self.apply(*function, values)?;
                Ok(EvaluationTrace::Call {
                    name: function.name(),
                    args: arg_traces,
                    outcome,
                })
            }
            Expression::Array(items) => {
                let item_traces = items
                    .iter()
                    .map(|i| self.evaluate_recursive(i, next))
                    .collect::<Result<Vec<_>, _>>()?;
                let outcome = Value::Array(
                    item_traces
                        .iter()
                        .map(|t| t.get_outcome())
                        .filter(|v| !v.is_undefined())
                        .collect(),
                );
                Ok(EvaluationTrace::Array {
                    items: item_traces,
                    outcome,
                })
            }
            Expression::Literal(val) => Ok(EvaluationTrace::Leaf {
                source: val.to_string(),
                value: val.clone(),
            }),
            Expression::Path(path) => Ok(EvaluationTrace::Input {
                path: path.to_string(),
                value: Value::from_json(path.resolve(self.message)),
            }),
        }
    }

    fn apply(&self, function: Function, args: Vec<Value>) -> Result<Value, EvaluationError> {
        let mut args = args.into_iter();
        let first = args.next().unwrap_or(Value::Undefined);
        let outcome = match (function, first) {
            (Function::Not, v) => Value::Bool(!v.is_truthy()),
            (Function::Exists, v) => Value::Bool(!v.is_undefined()),
            (Function::Boolean, Value::Undefined) => Value::Undefined,
            (Function::Boolean, v) => Value::Bool(v.is_truthy()),
            (_, Value::Undefined) => Value::Undefined,
            (Function::Number, Value::Number(n)) => Value::Number(n),
            (Function::Number, Value::Bool(b)) => Value::Number(if b { 1.0 } else { 0.0 }),
            (Function::Number, Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(n) => Value::Number(n),
                Err(_) => {
                    return Err(self.type_mismatch("$number", "numeric String", Value::String(s)));
                }
            },
            (Function::String, v) => Value::String(v.to_plain_string()),
            (Function::Length, Value::String(s)) => Value::Number(s.chars().count() as f64),
            (Function::Lowercase, Value::String(s)) => Value::String(s.to_lowercase()),
            (Function::Uppercase, Value::String(s)) => Value::String(s.to_uppercase()),
            (Function::Contains, Value::String(s)) => match args.next().unwrap_or(Value::Undefined) {
                Value::String(pattern) => Value::Bool(s.contains(&pattern)),
                Value::Undefined => Value::Undefined,
                other => return Err(self.type_mismatch("$contains", "String", other)),
            },
            (function, other) => {
                let operation = format!("${}", function.name());
                let expected = if function == Function::Number {
                    "Number, Bool or String"
                } else {
                    "String"
                };
                return Err(self.type_mismatch(&operation, expected, other));
            }
        };
        Ok(outcome)
    }

    fn eval_arithmetic<F>(
        &self,
        l: &Expression,
        r: &Expression,
        depth: usize,
        op: &'static str,
        f: F,
    ) -> Result<EvaluationTrace, EvaluationError>
    where
        F: Fn(f64, f64) -> f64,
    {
        let left_trace = self.evaluate_recursive(l, depth)?;
        let right_trace = self.evaluate_recursive(r, depth)?;
        let outcome = match (left_trace.get_outcome(), right_trace.get_outcome()) {
            (Value::Number(lv), Value::Number(rv)) => Value::Number(f(lv, rv)),
            (Value::Undefined, _) | (_, Value::Undefined) => Value::Undefined,
            (Value::Number(_), r_val) => return Err(self.type_mismatch(op, "Number", r_val)),
            (l_val, _) => return Err(self.type_mismatch(op, "Number", l_val)),
        };
        Ok(binary(op, left_trace, right_trace, outcome))
    }

    fn eval_ordering<F>(
        &self,
        l: &Expression,
        r: &Expression,
        depth: usize,
        op: &'static str,
        f: F,
    ) -> Result<EvaluationTrace, EvaluationError>
    where
        F: Fn(Ordering) -> bool,
    {
        let left_trace = self.evaluate_recursive(l, depth)?;
        let right_trace = self.evaluate_recursive(r, depth)?;
        let outcome = match (left_trace.get_outcome(), right_trace.get_outcome()) {
            (Value::Number(lv), Value::Number(rv)) => {
                Value::Bool(lv.partial_cmp(&rv).is_some_and(&f))
            }
            (Value::String(lv), Value::String(rv)) => Value::Bool(f(lv.cmp(&rv))),
            (Value::Undefined, _) | (_, Value::Undefined) => Value::Bool(false),
            (l_val @ (Value::Number(_) | Value::String(_)), r_val) => {
                return Err(self.type_mismatch(op, l_val.type_name(), r_val));
            }
            (l_val, _) => return Err(self.type_mismatch(op, "Number or String", l_val)),
        };
        Ok(binary(op, left_trace, right_trace, outcome))
    }

    fn type_mismatch(&self, op: &str, expected: &str, found: Value) -> EvaluationError {
        EvaluationError::TypeMismatch {
            operation: op.to_string(),
            expected: expected.to_string(),
            found,
        }
    }
}

fn binary(
    op_symbol: &'static str,
    left: EvaluationTrace,
    right: EvaluationTrace,
    outcome: Value,
) -> EvaluationTrace {
    EvaluationTrace::BinaryOp {
        op_symbol,
        left: Box::new(left),
        right: Box::new(right),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_evaluation_stops_past_max_depth() {
        let mut expression = Expression::Literal(Value::Number(1.0));
        for _ in 0..MAX_EXPRESSION_DEPTH + 8 {
            expression = Expression::Negate(Box::new(expression));
        }
        let message = json!({});
        let result = AstEngine::new(&expression, &message).evaluate();
        assert!(matches!(result, Err(EvaluationError::TooDeep { max }) if max == MAX_EXPRESSION_DEPTH));
    }
}
