use super::Value;

/// A record of how an expression was evaluated, including intermediate values.
#[derive(Debug, Clone)]
pub enum EvaluationTrace {
    BinaryOp {
        op_symbol: &'static str,
        left: Box<EvaluationTrace>,
        right: Box<EvaluationTrace>,
        outcome: Value,
    },
    UnaryOp {
        op_symbol: &'static str,
        child: Box<EvaluationTrace>,
        outcome: Value,
    },
    Call {
        name: &'static str,
        args: Vec<EvaluationTrace>,
        outcome: Value,
    },
    Array {
        items: Vec<EvaluationTrace>,
        outcome: Value,
    },
    /// A value read from the message.
    Input {
        path: String,
        value: Value,
    },
    Leaf {
        source: String,
        value: Value,
    },
    NotEvaluated,
}

impl EvaluationTrace {
    pub fn get_outcome(&self) -> Value {
        match self {
            EvaluationTrace::BinaryOp { outcome, .. }
            | EvaluationTrace::UnaryOp { outcome, .. }
            | EvaluationTrace::Call { outcome, .. }
            | EvaluationTrace::Array { outcome, .. } => outcome.clone(),
            EvaluationTrace::Input { value, .. } | EvaluationTrace::Leaf { value, .. } => {
                value.clone()
            }
            EvaluationTrace::NotEvaluated => Value::Undefined,
        }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            EvaluationTrace::BinaryOp { op_symbol, .. } => match *op_symbol {
                "or" => 1,
                "and" => 2,
                "=" | "!=" | ">" | ">=" | "<" | "<=" | "in" => 3,
                "+" | "-" | "&" => 4,
                "*" | "/" | "%" => 5,
                _ => 0,
            },
            EvaluationTrace::UnaryOp { .. } => 6,
            EvaluationTrace::Call { .. }
            | EvaluationTrace::Array { .. }
            | EvaluationTrace::Input { .. }
            | EvaluationTrace::Leaf { .. }
            | EvaluationTrace::NotEvaluated => 7,
        }
    }
}
