use super::Value;
use crate::path::PropertyPath;
use std::fmt;

/// Built-in functions available to expression rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Not,
    Exists,
    Boolean,
    Number,
    String,
    Length,
    Lowercase,
    Uppercase,
    Contains,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "not" => Some(Function::Not),
            "exists" => Some(Function::Exists),
            "boolean" => Some(Function::Boolean),
            "number" => Some(Function::Number),
            "string" => Some(Function::String),
            "length" => Some(Function::Length),
            "lowercase" => Some(Function::Lowercase),
            "uppercase" => Some(Function::Uppercase),
            "contains" => Some(Function::Contains),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Not => "not",
            Function::Exists => "exists",
            Function::Boolean => "boolean",
            Function::Number => "number",
            Function::String => "string",
            Function::Length => "length",
            Function::Lowercase => "lowercase",
            Function::Uppercase => "uppercase",
            Function::Contains => "contains",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::Contains => 2,
            _ => 1,
        }
    }
}

/// The Abstract Syntax Tree of a compiled expression rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    // Arithmetic
    Sum(Box<Expression>, Box<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Multiply(Box<Expression>, Box<Expression>),
    Divide(Box<Expression>, Box<Expression>),
    Modulo(Box<Expression>, Box<Expression>),
    Negate(Box<Expression>),
    Concat(Box<Expression>, Box<Expression>),

    // Logical
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),

    // Comparison
    Equal(Box<Expression>, Box<Expression>),
    NotEqual(Box<Expression>, Box<Expression>),
    GreaterThan(Box<Expression>, Box<Expression>),
    GreaterThanOrEqual(Box<Expression>, Box<Expression>),
    SmallerThan(Box<Expression>, Box<Expression>),
    SmallerThanOrEqual(Box<Expression>, Box<Expression>),
    In(Box<Expression>, Box<Expression>),

    Call {
        function: Function,
        args: Vec<Expression>,
    },
    Array(Vec<Expression>),

    // Leaf nodes
    Literal(Value),
    Path(PropertyPath),
}

impl Expression {
    /// Collects every message path the expression reads.
    pub fn collect_paths<'a>(&'a self, paths: &mut Vec<&'a PropertyPath>) {
        match self {
            Expression::Path(path) => paths.push(path),
            Expression::Sum(l, r)
            | Expression::Subtract(l, r)
            | Expression::Multiply(l, r)
            | Expression::Divide(l, r)
            | Expression::Modulo(l, r)
            | Expression::Concat(l, r)
            | Expression::And(l, r)
            | Expression::Or(l, r)
            | Expression::Equal(l, r)
            | Expression::NotEqual(l, r)
            | Expression::GreaterThan(l, r)
            | Expression::GreaterThanOrEqual(l, r)
            | Expression::SmallerThan(l, r)
            | Expression::SmallerThanOrEqual(l, r)
            | Expression::In(l, r) => {
                l.collect_paths(paths);
                r.collect_paths(paths);
            }
            Expression::Negate(v) => v.collect_paths(paths),
            Expression::Call { args, .. } | Expression::Array(args) => {
                args.iter().for_each(|a| a.collect_paths(paths));
            }
            Expression::Literal(_) => {}
        }
    }
}

/// A wrapper to display an expression as an indented tree.
pub struct DisplayExpression<'a> {
    pub expr: &'a Expression,
}

impl<'a> fmt::Display for DisplayExpression<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_as_tree(self.expr, f, "", true)
    }
}

impl<'a> DisplayExpression<'a> {
    fn fmt_as_tree(
        &self,
        expr: &Expression,
        f: &mut fmt::Formatter<'_>,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let node_marker = if is_last { "└── " } else { "├── " };
        write!(f, "{}{}", prefix, node_marker)?;

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });

        match expr {
            Expression::Literal(v) => writeln!(f, "Literal: {}", v)?,
            Expression::Path(p) => writeln!(f, "Path: {}", p)?,
            Expression::Negate(v) => {
                writeln!(f, "Negate (-)")?;
                self.fmt_as_tree(v, f, &child_prefix, true)?;
            }
            Expression::Call { function, args } => {
                writeln!(f, "Call: ${}", function.name())?;
                self.fmt_children(args, f, &child_prefix)?;
            }
            Expression::Array(items) => {
                writeln!(f, "Array")?;
                self.fmt_children(items, f, &child_prefix)?;
            }
            Expression::Sum(l, r) => self.fmt_binary(f, "Sum (+)", l, r, &child_prefix)?,
            Expression::Subtract(l, r) => self.fmt_binary(f, "Subtract (-)", l, r, &child_prefix)?,
            Expression::Multiply(l, r) => self.fmt_binary(f, "Multiply (*)", l, r, &child_prefix)?,
            Expression::Divide(l, r) => self.fmt_binary(f, "Divide (/)", l, r, &child_prefix)?,
            Expression::Modulo(l, r) => self.fmt_binary(f, "Modulo (%)", l, r, &child_prefix)?,
            Expression::Concat(l, r) => self.fmt_binary(f, "Concat (&)", l, r, &child_prefix)?,
            Expression::And(l, r) => self.fmt_binary(f, "And (and)", l, r, &child_prefix)?,
            Expression::Or(l, r) => self.fmt_binary(f, "Or (or)", l, r, &child_prefix)?,
            Expression::Equal(l, r) => self.fmt_binary(f, "Equal (=)", l, r, &child_prefix)?,
            Expression::NotEqual(l, r) => {
                self.fmt_binary(f, "NotEqual (!=)", l, r, &child_prefix)?
            }
            Expression::GreaterThan(l, r) => {
                self.fmt_binary(f, "GreaterThan (>)", l, r, &child_prefix)?
            }
            Expression::GreaterThanOrEqual(l, r) => {
                self.fmt_binary(f, "GreaterThanOrEqual (>=)", l, r, &child_prefix)?
            }
            Expression::SmallerThan(l, r) => {
                self.fmt_binary(f, "SmallerThan (<)", l, r, &child_prefix)?
            }
            Expression::SmallerThanOrEqual(l, r) => {
                self.fmt_binary(f, "SmallerThanOrEqual (<=)", l, r, &child_prefix)?
            }
            Expression::In(l, r) => self.fmt_binary(f, "In (in)", l, r, &child_prefix)?,
        }
        Ok(())
    }

    fn fmt_binary(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        l: &Expression,
        r: &Expression,
        prefix: &str,
    ) -> fmt::Result {
        writeln!(f, "{}", name)?;
        self.fmt_as_tree(l, f, prefix, false)?;
        self.fmt_as_tree(r, f, prefix, true)?;
        Ok(())
    }

    fn fmt_children(
        &self,
        children: &[Expression],
        f: &mut fmt::Formatter<'_>,
        prefix: &str,
    ) -> fmt::Result {
        for (i, child) in children.iter().enumerate() {
            self.fmt_as_tree(child, f, prefix, i + 1 == children.len())?;
        }
        Ok(())
    }
}
