use crate::ast::Value;
use thiserror::Error;

/// Errors raised while constructing a rule from its raw description.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("Comparator '{comparator}' cannot be used with value type '{value_type}'")]
    IncompatibleValueType {
        comparator: String,
        value_type: String,
    },

    #[error("Comparator 'btwn' requires a second value and a 'str' or 'num' second type")]
    MissingUpperBound,

    #[error("Expression rules are only allowed on switch nodes")]
    ExpressionNotAllowed,

    #[error("Rule property must not be empty")]
    EmptyProperty,

    #[error("Invalid property path '{0}'")]
    InvalidProperty(String),

    #[error("Invalid expression: {0}")]
    Expression(#[from] CompileError),
}

/// Errors that can occur while compiling an expression string into an AST.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Unknown function '${0}'")]
    UnknownFunction(String),

    #[error("Function '${name}' takes {expected} argument(s), but received {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Expression is empty")]
    Empty,

    #[error("Expression nests deeper than {max} levels")]
    TooDeep { max: usize },
}

/// Errors that can occur while evaluating a compiled expression.
///
/// These never escape a rule evaluation: a failing expression makes its rule fail.
#[derive(Error, Debug, Clone)]
pub enum EvaluationError {
    #[error(
        "Type mismatch during operation '{operation}': expected {expected}, but found value '{found}'"
    )]
    TypeMismatch {
        operation: String,
        expected: String,
        found: Value,
    },

    #[error("Expression nests deeper than {max} levels")]
    TooDeep { max: usize },
}

/// Errors surfaced by graph editing operations and wire validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Invalid gate type '{0}', expected 'and' or 'or'")]
    InvalidGateType(String),

    #[error("Required field '{0}' is empty")]
    EmptyField(&'static str),

    #[error("Duplicate node label '{0}'")]
    DuplicateLabel(String),

    #[error("Unknown node type '{0}'")]
    UnknownNodeType(String),

    #[error("Switch '{label}' declares {outputs} outputs but has {rules} rules")]
    OutputCountMismatch {
        label: String,
        outputs: usize,
        rules: usize,
    },

    #[error("Connection from '{from}' uses output {index}, but the switch only has {outputs}")]
    OutputIndexOutOfRange {
        from: String,
        index: usize,
        outputs: usize,
    },

    #[error("Connection from switch '{0}' does not name an output")]
    MissingOutputIndex(String),

    #[error("Connection references unknown node '{0}'")]
    DanglingConnection(String),

    #[error("Rule {index} of node '{label}' is invalid: {source}")]
    InvalidRule {
        label: String,
        index: usize,
        #[source]
        source: RuleError,
    },

    #[error("Failed to parse flow JSON: {0}")]
    JsonParseError(String),
}

/// Errors raised when handing a flow to the messaging bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to serialize flow message: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write flow message: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading editor configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config file '{path}': {message}")]
    Parse { path: String, message: String },
}
