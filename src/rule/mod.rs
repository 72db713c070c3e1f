//! Typed condition rules shared by switch and gate nodes.
//!
//! A [`RuleDefinition`] is the loosely-typed wire form. Converting it into a
//! [`Rule`] validates the combination of comparator and value types once, and
//! pre-resolves literals, property paths and expressions, so that evaluation
//! never has to reject a rule.

use crate::compiler::{CompiledExpression, compile};
use crate::error::RuleError;
use crate::path::PropertyPath;
use serde::{Deserialize, Serialize};

mod definition;
mod operand;

pub use definition::*;
pub use operand::{Operand, Range};

/// What the left-hand side of a rule reads.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    /// A property path in the rule's scope.
    Property(PropertyPath),
    /// The node's remembered previous payload.
    Previous,
    /// The whole message, for expression rules.
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Neq => "!=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
        }
    }
}

/// The condition a rule tests, one variant per comparator kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        comparison: Comparison,
        operand: Operand,
    },
    Between(Range),
    Expression(CompiledExpression),
}

/// A validated rule.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "RuleDefinition", into = "RuleDefinition")]
pub struct Rule {
    definition: RuleDefinition,
    subject: Subject,
    condition: Condition,
}

impl Rule {
    pub fn definition(&self) -> &RuleDefinition {
        &self.definition
    }

    pub fn property(&self) -> &str {
        &self.definition.property
    }

    pub fn scope(&self) -> PropertyScope {
        self.definition.property_type
    }

    pub fn comparator(&self) -> Comparator {
        self.definition.comparator
    }

    pub fn value_type(&self) -> ValueType {
        self.definition.value_type
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Whether the rule reads the node's previous payload.
    pub fn uses_previous(&self) -> bool {
        matches!(self.subject, Subject::Previous)
    }
}

impl TryFrom<RuleDefinition> for Rule {
    type Error = RuleError;

    fn try_from(mut definition: RuleDefinition) -> Result<Self, Self::Error> {
        if definition.value_type == ValueType::Prev {
            definition.property = "payload".to_string();
        }
        if definition.comparator != Comparator::Between {
            definition.value2 = None;
            definition.value2_type = None;
        }

        let incompatible = |d: &RuleDefinition| RuleError::IncompatibleValueType {
            comparator: d.comparator.as_str().to_string(),
            value_type: d.value_type.as_str().to_string(),
        };

        if definition.comparator == Comparator::Expression {
            if definition.value_type != ValueType::Jsonata {
                return Err(incompatible(&definition));
            }
            if definition.property_type != PropertyScope::Msg {
                return Err(RuleError::ExpressionNotAllowed);
            }
            let expression = compile(&definition.value)?;
            return Ok(Self {
                definition,
                subject: Subject::Message,
                condition: Condition::Expression(expression),
            });
        }
        if definition.value_type == ValueType::Jsonata {
            return Err(incompatible(&definition));
        }

        let compare = |comparison: Comparison| Condition::Compare {
            comparison,
            operand: Operand::from_literal(&definition.value, definition.value_type),
        };

        let condition = match definition.comparator {
            Comparator::Eq => compare(Comparison::Eq),
            Comparator::Neq => compare(Comparison::Neq),
            Comparator::Lt => compare(Comparison::Lt),
            Comparator::Lte => compare(Comparison::Lte),
            Comparator::Gt => compare(Comparison::Gt),
            Comparator::Gte => compare(Comparison::Gte),
            Comparator::Between => {
                if !matches!(definition.value_type, ValueType::Str | ValueType::Num) {
                    return Err(incompatible(&definition));
                }
                let (Some(high), Some(high_type)) = (&definition.value2, definition.value2_type)
                else {
                    return Err(RuleError::MissingUpperBound);
                };
                let low_is_numeric = definition.value_type == ValueType::Num;
                Condition::Between(Range::new(
                    &definition.value,
                    low_is_numeric,
                    high,
                    high_type == BoundType::Num,
                ))
            }
            Comparator::Expression => return Err(incompatible(&definition)),
        };

        let subject = if definition.value_type == ValueType::Prev {
            Subject::Previous
        } else {
            let property = definition.property.trim();
            if property.is_empty() {
                return Err(RuleError::EmptyProperty);
            }
            Subject::Property(
                PropertyPath::parse(property)
                    .ok_or_else(|| RuleError::InvalidProperty(property.to_string()))?,
            )
        };

        Ok(Self {
            definition,
            subject,
            condition,
        })
    }
}

impl From<Rule> for RuleDefinition {
    fn from(rule: Rule) -> Self {
        rule.definition
    }
}
