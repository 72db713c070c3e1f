//! Compilation of expression rule sources into ASTs.
//!
//! Expression rules carry a JSONata-style source string. It is compiled once,
//! when the rule is constructed, so that a malformed expression is reported to
//! the user at configuration time instead of silently failing at evaluation.
//!
//! The grammar lives in `expression.pest` and is compiled by `pest_derive`.

use crate::ast::{DisplayExpression, Expression};
use crate::error::CompileError;
use crate::path::PropertyPath;
use std::fmt;

mod parser;

/// Deepest expression tree accepted by the compiler and the engine.
pub const MAX_EXPRESSION_DEPTH: usize = 128;

/// An expression source together with its compiled AST.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    source: String,
    ast: Expression,
}

impl CompiledExpression {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expression {
        &self.ast
    }

    /// The message paths the expression reads.
    pub fn referenced_paths(&self) -> Vec<&PropertyPath> {
        let mut paths = Vec::new();
        self.ast.collect_paths(&mut paths);
        paths
    }

    /// Renders the AST as an indented tree.
    pub fn display_tree(&self) -> String {
        DisplayExpression { expr: &self.ast }.to_string()
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Compiles an expression source string.
///
/// # Example
///
/// ```rust
/// use flowgate::compiler::compile;
///
/// let expr = compile("payload.temperature > 30 and $exists(payload.area)").unwrap();
/// assert_eq!(expr.referenced_paths().len(), 2);
/// ```
pub fn compile(source: &str) -> Result<CompiledExpression, CompileError> {
    let ast = parser::parse(source)?;
    tracing::trace!(source, "compiled expression");
    Ok(CompiledExpression {
        source: source.to_string(),
        ast,
    })
}
