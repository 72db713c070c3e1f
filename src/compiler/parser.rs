use super::MAX_EXPRESSION_DEPTH;
use crate::ast::{Expression, Function, Value};
use crate::error::CompileError;
use crate::path::{PathSegment, PropertyPath};
use pest::Parser;
use pest::error::InputLocation;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "compiler/expression.pest"]
struct ExpressionParser;

type Pair<'a> = pest::iterators::Pair<'a, Rule>;

/// A built subtree and its height, so depth is bounded while folding.
struct Built {
    expr: Expression,
    height: usize,
}

impl Built {
    fn leaf(expr: Expression) -> Self {
        Self { expr, height: 1 }
    }

    fn parent(expr: Expression, child_height: usize) -> Result<Self, CompileError> {
        let height = child_height + 1;
        if height > MAX_EXPRESSION_DEPTH {
            return Err(CompileError::TooDeep {
                max: MAX_EXPRESSION_DEPTH,
            });
        }
        Ok(Self { expr, height })
    }
}

/// Parses an expression source into its AST.
pub(super) fn parse(source: &str) -> Result<Expression, CompileError> {
    if source.trim().is_empty() {
        return Err(CompileError::Empty);
    }
    // The generated parser recurses once per bracket level.
    if nesting_depth(source) > MAX_EXPRESSION_DEPTH {
        return Err(CompileError::TooDeep {
            max: MAX_EXPRESSION_DEPTH,
        });
    }

    let mut pairs = ExpressionParser::parse(Rule::expression, source).map_err(syntax_error)?;
    let root = pairs
        .next()
        .and_then(|expression| expression.into_inner().next())
        .ok_or_else(|| CompileError::Syntax {
            position: 0,
            message: "expected an expression".to_string(),
        })?;
    build(root).map(|built| built.expr)
}

fn build(pair: Pair<'_>) -> Result<Built, CompileError> {
    match pair.as_rule() {
        Rule::or_expr | Rule::and_expr | Rule::cmp_expr | Rule::add_expr | Rule::mul_expr => {
            build_chain(pair)
        }
        Rule::unary => build_unary(pair),
        Rule::number => {
            let text = pair.as_str();
            let number = text.parse::<f64>().map_err(|_| CompileError::Syntax {
                position: pair.as_span().start(),
                message: format!("invalid number '{}'", text),
            })?;
            Ok(Built::leaf(Expression::Literal(Value::Number(number))))
        }
        Rule::string => Ok(Built::leaf(Expression::Literal(Value::String(
            string_text(pair),
        )))),
        Rule::bool_literal => Ok(Built::leaf(Expression::Literal(Value::Bool(
            pair.as_str() == "true",
        )))),
        Rule::null_literal => Ok(Built::leaf(Expression::Literal(Value::Null))),
        Rule::call => build_call(pair),
        Rule::path | Rule::root_path => build_path(pair),
        Rule::array => {
            let (items, height) = build_all(pair.into_inner())?;
            Built::parent(Expression::Array(items), height)
        }
        other => Err(CompileError::Syntax {
            position: pair.as_span().start(),
            message: format!("unexpected {}", describe(&other)),
        }),
    }
}

/// Folds `operand (op operand)*` to the left.
fn build_chain(pair: Pair<'_>) -> Result<Built, CompileError> {
    let end = pair.as_span().end();
    let mut inner = pair.into_inner();
    let mut lhs = match inner.next() {
        Some(first) => build(first)?,
        None => return Err(missing_operand(end)),
    };

    while let Some(op) = inner.next() {
        let rhs = match inner.next() {
            Some(operand) => build(operand)?,
            None => return Err(missing_operand(end)),
        };
        let (l, r) = (Box::new(lhs.expr), Box::new(rhs.expr));
        let expr = match op.as_str() {
            "or" => Expression::Or(l, r),
            "and" => Expression::And(l, r),
            "=" => Expression::Equal(l, r),
            "!=" => Expression::NotEqual(l, r),
            "<" => Expression::SmallerThan(l, r),
            "<=" => Expression::SmallerThanOrEqual(l, r),
            ">" => Expression::GreaterThan(l, r),
            ">=" => Expression::GreaterThanOrEqual(l, r),
            "in" => Expression::In(l, r),
            "+" => Expression::Sum(l, r),
            "-" => Expression::Subtract(l, r),
            "&" => Expression::Concat(l, r),
            "*" => Expression::Multiply(l, r),
            "/" => Expression::Divide(l, r),
            "%" => Expression::Modulo(l, r),
            other => {
                return Err(CompileError::Syntax {
                    position: op.as_span().start(),
                    message: format!("unknown operator '{}'", other),
                });
            }
        };
        lhs = Built::parent(expr, lhs.height.max(rhs.height))?;
    }

    Ok(lhs)
}

fn build_unary(pair: Pair<'_>) -> Result<Built, CompileError> {
    let end = pair.as_span().end();
    let mut negations = 0;
    let mut operand = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::op_neg => negations += 1,
            _ => operand = Some(build(inner)?),
        }
    }

    let mut built = operand.ok_or_else(|| missing_operand(end))?;
    for _ in 0..negations {
        built = Built::parent(Expression::Negate(Box::new(built.expr)), built.height)?;
    }
    Ok(built)
}

fn build_call(pair: Pair<'_>) -> Result<Built, CompileError> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .map(|function| function.as_str().trim_start_matches('$').to_string())
        .unwrap_or_default();
    let function =
        Function::from_name(&name).ok_or_else(|| CompileError::UnknownFunction(name.clone()))?;

    let (args, height) = build_all(inner)?;
    if args.len() != function.arity() {
        return Err(CompileError::ArityMismatch {
            name,
            expected: function.arity(),
            found: args.len(),
        });
    }
    Built::parent(Expression::Call { function, args }, height)
}

/// Builds every pair, returning the expressions and their tallest height.
fn build_all<'a>(
    pairs: impl Iterator<Item = Pair<'a>>,
) -> Result<(Vec<Expression>, usize), CompileError> {
    let mut height = 0;
    let mut items = Vec::new();
    for pair in pairs {
        let built = build(pair)?;
        height = height.max(built.height);
        items.push(built.expr);
    }
    Ok((items, height))
}

fn build_path(pair: Pair<'_>) -> Result<Built, CompileError> {
    let mut segments = Vec::new();
    for step in pair.into_inner() {
        match step.as_rule() {
            Rule::name => segments.push(PathSegment::Key(name_text(step))),
            Rule::key_step => {
                if let Some(name) = step.into_inner().next() {
                    segments.push(PathSegment::Key(name_text(name)));
                }
            }
            Rule::index_step => {
                if let Some(selector) = step.into_inner().next() {
                    segments.push(index_segment(selector)?);
                }
            }
            _ => {}
        }
    }
    Ok(Built::leaf(Expression::Path(PropertyPath::from_segments(
        segments,
    ))))
}

fn index_segment(selector: Pair<'_>) -> Result<PathSegment, CompileError> {
    match selector.as_rule() {
        Rule::string => Ok(PathSegment::Key(string_text(selector))),
        _ => selector
            .as_str()
            .parse::<usize>()
            .map(PathSegment::Index)
            .map_err(|_| CompileError::Syntax {
                position: selector.as_span().start(),
                message: format!("array index '{}' is out of range", selector.as_str()),
            }),
    }
}

/// Text of a bare or backtick-quoted name.
fn name_text(pair: Pair<'_>) -> String {
    match pair.into_inner().next() {
        Some(inner) => inner.as_str().to_string(),
        None => String::new(),
    }
}

/// Unescaped contents of a quoted string.
fn string_text(pair: Pair<'_>) -> String {
    let raw = pair
        .into_inner()
        .next()
        .map(|inner| inner.as_str())
        .unwrap_or_default();

    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some(other) => text.push(other),
            None => {}
        }
    }
    text
}

/// Deepest bracket nesting outside string literals and quoted names.
fn nesting_depth(source: &str) -> usize {
    let (mut depth, mut deepest) = (0usize, 0usize);
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in source.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' && q != '`' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

fn missing_operand(position: usize) -> CompileError {
    CompileError::Syntax {
        position,
        message: "expected an operand".to_string(),
    }
}

fn syntax_error(error: pest::error::Error<Rule>) -> CompileError {
    let position = match error.location {
        InputLocation::Pos(position) => position,
        InputLocation::Span((start, _)) => start,
    };
    let error = error.renamed_rules(describe);
    CompileError::Syntax {
        position,
        message: error.variant.message().into_owned(),
    }
}

fn describe(rule: &Rule) -> String {
    match rule {
        Rule::EOI => "end of expression",
        Rule::number | Rule::index => "a number",
        Rule::string | Rule::double_quoted | Rule::single_quoted => "a string",
        Rule::bool_literal | Rule::null_literal => "a literal",
        Rule::name | Rule::bare_name | Rule::quoted_name | Rule::key_step => "a property name",
        Rule::path | Rule::root_path | Rule::root | Rule::index_step => "a path",
        Rule::call | Rule::function => "a function call",
        Rule::array => "an array",
        Rule::op_or | Rule::op_and | Rule::op_cmp | Rule::op_add | Rule::op_mul => "an operator",
        Rule::op_neg | Rule::unary => "a value",
        _ => "an expression",
    }
    .to_string()
}
