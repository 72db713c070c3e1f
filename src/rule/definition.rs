use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;

/// Which store a rule's property is read from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PropertyScope {
    /// Message-scoped, used by switch rules.
    #[default]
    Msg,
    /// Flow-scoped, used by gate rules.
    Flow,
}

impl PropertyScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyScope::Msg => "msg",
            PropertyScope::Flow => "flow",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    #[serde(rename = "eq")]
    Eq,
    #[serde(rename = "neq")]
    Neq,
    #[serde(rename = "lt")]
    Lt,
    #[serde(rename = "lte")]
    Lte,
    #[serde(rename = "gt")]
    Gt,
    #[serde(rename = "gte")]
    Gte,
    #[serde(rename = "btwn")]
    Between,
    #[serde(rename = "jsonata_exp", alias = "jsonata")]
    Expression,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Eq => "eq",
            Comparator::Neq => "neq",
            Comparator::Lt => "lt",
            Comparator::Lte => "lte",
            Comparator::Gt => "gt",
            Comparator::Gte => "gte",
            Comparator::Between => "btwn",
            Comparator::Expression => "jsonata_exp",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Str,
    Num,
    Bool,
    /// Compare against the node's remembered previous payload.
    Prev,
    Jsonata,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Str => "str",
            ValueType::Num => "num",
            ValueType::Bool => "bool",
            ValueType::Prev => "prev",
            ValueType::Jsonata => "jsonata",
        }
    }
}

/// Type of the upper bound of a `btwn` rule.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BoundType {
    Str,
    Num,
}

/// The wire form of a rule, as exchanged with the flow runtime.
///
/// Field names follow the runtime's short keys (`t`, `v`, `vt`, `v2`, `v2t`);
/// the long names are accepted when reading.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RuleDefinition {
    #[serde(default)]
    pub property: String,
    #[serde(rename = "propertyType", default)]
    pub property_type: PropertyScope,
    #[serde(rename = "t", alias = "comparator")]
    pub comparator: Comparator,
    #[serde(rename = "v", alias = "value", default, deserialize_with = "literal_text")]
    pub value: String,
    #[serde(rename = "vt", alias = "valueType")]
    pub value_type: ValueType,
    #[serde(
        rename = "v2",
        alias = "value2",
        default,
        deserialize_with = "optional_literal_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub value2: Option<String>,
    #[serde(
        rename = "v2t",
        alias = "value2Type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub value2_type: Option<BoundType>,
}

impl RuleDefinition {
    /// A single-operand rule on `property`.
    pub fn new(
        property: &str,
        comparator: Comparator,
        value: &str,
        value_type: ValueType,
    ) -> Self {
        Self {
            property: property.to_string(),
            property_type: PropertyScope::Msg,
            comparator,
            value: value.to_string(),
            value_type,
            value2: None,
            value2_type: None,
        }
    }

    /// A `btwn` rule with both bounds.
    pub fn between(
        property: &str,
        low: &str,
        low_type: ValueType,
        high: &str,
        high_type: BoundType,
    ) -> Self {
        Self {
            value2: Some(high.to_string()),
            value2_type: Some(high_type),
            ..Self::new(property, Comparator::Between, low, low_type)
        }
    }

    /// A `jsonata_exp` rule evaluating `source` against the message.
    pub fn expression(source: &str) -> Self {
        Self::new("payload", Comparator::Expression, source, ValueType::Jsonata)
    }

    pub fn with_scope(mut self, scope: PropertyScope) -> Self {
        self.property_type = scope;
        self
    }
}

/// Accepts any JSON primitive for a literal and keeps its text form.
fn literal_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Json::deserialize(deserializer)? {
        Json::Null => String::new(),
        Json::String(s) => s,
        other => other.to_string(),
    })
}

fn optional_literal_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Json>::deserialize(deserializer)? {
        None | Some(Json::Null) => None,
        Some(Json::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
