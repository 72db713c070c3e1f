use crate::error::GraphError;
use crate::rule::{Rule, RuleDefinition};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical combination applied by a gate node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateType {
    And,
    Or,
}

impl GateType {
    /// Parses user input, ignoring case and surrounding whitespace.
    pub fn parse(text: &str) -> Result<Self, GraphError> {
        match text.trim().to_lowercase().as_str() {
            "and" => Ok(GateType::And),
            "or" => Ok(GateType::Or),
            _ => Err(GraphError::InvalidGateType(text.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GateType::And => "and",
            GateType::Or => "or",
        }
    }
}

impl fmt::Display for GateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InjectNode {
    pub payload: bool,
}

/// Routes a message to one output per passing rule.
///
/// The output count is not stored: it is always the number of rules.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SwitchNode {
    pub property: String,
    pub rules: Vec<Rule>,
}

impl SwitchNode {
    pub fn outputs(&self) -> usize {
        self.rules.len()
    }
}

/// Emits its held message when the AND/OR combination of its rules holds.
#[derive(Debug, Clone, PartialEq)]
pub struct GateNode {
    pub gate_type: GateType,
    pub rules: Vec<Rule>,
    pub output_topic: String,
    pub emit_only_if_true: bool,
}

impl GateNode {
    pub fn new(gate_type: GateType) -> Self {
        Self {
            gate_type,
            rules: Vec::new(),
            output_topic: String::new(),
            emit_only_if_true: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpInNode {
    pub url: String,
    pub method: String,
    pub upload: bool,
    pub wires: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub func: String,
    pub outputs: usize,
    pub wires: Vec<Vec<String>>,
}

/// The runtime's dynamic mail sender; SMTP settings arrive on the message.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailNode {
    pub smtp_server: String,
    pub smtp_port: String,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub secure: bool,
    pub tls_reject_unauthorized: bool,
    pub wires: Vec<Vec<String>>,
}

impl Default for EmailNode {
    fn default() -> Self {
        Self {
            smtp_server: String::new(),
            smtp_port: "587".to_string(),
            smtp_user: String::new(),
            smtp_pass: String::new(),
            secure: false,
            tls_reject_unauthorized: false,
            wires: vec![Vec::new()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Inject(InjectNode),
    Switch(SwitchNode),
    Gate(GateNode),
    Debug,
    HttpIn(HttpInNode),
    Function(FunctionNode),
    Email(EmailNode),
}

impl NodeKind {
    /// The `type` string the flow runtime knows this node by.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Inject(_) => "inject",
            NodeKind::Switch(_) => "switch",
            NodeKind::Gate(gate) => match gate.gate_type {
                GateType::And => "and-gate",
                GateType::Or => "or-gate",
            },
            NodeKind::Debug => "debug",
            NodeKind::HttpIn(_) => "http in",
            NodeKind::Function(_) => "function",
            NodeKind::Email(_) => "email-dynamic",
        }
    }

    /// The rules of a switch or gate node.
    pub fn rules(&self) -> &[Rule] {
        match self {
            NodeKind::Switch(switch) => &switch.rules,
            NodeKind::Gate(gate) => &gate.rules,
            _ => &[],
        }
    }
}

/// A node of the flow graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "NodeRecord", into = "NodeRecord")]
pub struct Node {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn is_switch(&self) -> bool {
        matches!(self.kind, NodeKind::Switch(_))
    }

    pub fn is_gate(&self) -> bool {
        matches!(self.kind, NodeKind::Gate(_))
    }

    pub fn as_switch(&self) -> Option<&SwitchNode> {
        match &self.kind {
            NodeKind::Switch(switch) => Some(switch),
            _ => None,
        }
    }

    pub fn as_gate(&self) -> Option<&GateNode> {
        match &self.kind {
            NodeKind::Gate(gate) => Some(gate),
            _ => None,
        }
    }

    /// One-line summary, as shown in the editor's node list.
    pub fn summary(&self) -> String {
        let extra = match &self.kind {
            NodeKind::Gate(gate) => {
                format!("[{} rules] → topic=\"{}\"", gate.rules.len(), gate.output_topic)
            }
            NodeKind::Switch(switch) => {
                format!("[{} rules] → outputs={}", switch.rules.len(), switch.outputs())
            }
            NodeKind::Inject(inject) => format!("payload={}", inject.payload),
            _ => String::new(),
        };
        format!("{} ({}) {}", self.label, self.type_name(), extra)
            .trim_end()
            .to_string()
    }
}

// --- Wire record ---
// The runtime expects one flat object per node, with the fields of its type.

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct NodeRecord {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rules: Option<Vec<RuleDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outputs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gate_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emit_only_if_true: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upload: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    func: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    smtp_server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    smtp_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    smtp_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    smtp_pass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tls_reject_unauthorized: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wires: Option<Vec<Vec<String>>>,
}

impl From<Node> for NodeRecord {
    fn from(node: Node) -> Self {
        let mut record = NodeRecord {
            node_type: node.type_name().to_string(),
            id: node.id,
            label: node.label,
            ..Default::default()
        };
        match node.kind {
            NodeKind::Inject(inject) => record.payload = Some(inject.payload),
            NodeKind::Switch(switch) => {
                record.outputs = Some(switch.outputs());
                record.property = Some(switch.property);
                record.rules = Some(switch.rules.into_iter().map(Into::into).collect());
            }
            NodeKind::Gate(gate) => {
                record.gate_type = Some(gate.gate_type.as_str().to_string());
                record.rules = Some(gate.rules.into_iter().map(Into::into).collect());
                record.output_topic = Some(gate.output_topic);
                record.emit_only_if_true = Some(gate.emit_only_if_true);
            }
            NodeKind::Debug => {}
            NodeKind::HttpIn(http) => {
                record.name = Some(record.label.clone());
                record.url = Some(http.url);
                record.method = Some(http.method);
                record.upload = Some(http.upload);
                record.wires = Some(http.wires);
            }
            NodeKind::Function(function) => {
                record.name = Some(record.label.clone());
                record.func = Some(function.func);
                record.outputs = Some(function.outputs);
                record.wires = Some(function.wires);
            }
            NodeKind::Email(email) => {
                record.name = Some(String::new());
                record.smtp_server = Some(email.smtp_server);
                record.smtp_port = Some(email.smtp_port);
                record.smtp_user = Some(email.smtp_user);
                record.smtp_pass = Some(email.smtp_pass);
                record.secure = Some(email.secure);
                record.tls_reject_unauthorized = Some(email.tls_reject_unauthorized);
                record.wires = Some(email.wires);
            }
        }
        record
    }
}

impl TryFrom<NodeRecord> for Node {
    type Error = GraphError;

    fn try_from(record: NodeRecord) -> Result<Self, Self::Error> {
        if record.id.trim().is_empty() {
            return Err(GraphError::EmptyField("id"));
        }
        if record.label.trim().is_empty() {
            return Err(GraphError::EmptyField("label"));
        }

        let kind = match record.node_type.as_str() {
            "inject" => NodeKind::Inject(InjectNode {
                payload: record.payload.unwrap_or(false),
            }),
            "switch" => {
                let rules = build_rules(&record.label, record.rules)?;
                if let Some(outputs) = record.outputs.filter(|o| *o != rules.len()) {
                    return Err(GraphError::OutputCountMismatch {
                        label: record.label,
                        outputs,
                        rules: rules.len(),
                    });
                }
                NodeKind::Switch(SwitchNode {
                    property: record.property.unwrap_or_default(),
                    rules,
                })
            }
            "gate" | "and-gate" | "or-gate" => {
                let gate_type = match (&record.gate_type, record.node_type.as_str()) {
                    (Some(text), _) => GateType::parse(text)?,
                    (None, "and-gate") => GateType::And,
                    (None, "or-gate") => GateType::Or,
                    (None, _) => return Err(GraphError::EmptyField("gateType")),
                };
                NodeKind::Gate(GateNode {
                    gate_type,
                    rules: build_rules(&record.label, record.rules)?,
                    output_topic: record.output_topic.unwrap_or_default(),
                    emit_only_if_true: record.emit_only_if_true.unwrap_or(false),
                })
            }
            "debug" => NodeKind::Debug,
            "http in" => NodeKind::HttpIn(HttpInNode {
                url: record.url.unwrap_or_default(),
                method: record.method.unwrap_or_else(|| "get".to_string()),
                upload: record.upload.unwrap_or(false),
                wires: record.wires.unwrap_or_default(),
            }),
            "function" => NodeKind::Function(FunctionNode {
                func: record.func.unwrap_or_default(),
                outputs: record.outputs.unwrap_or(1),
                wires: record.wires.unwrap_or_default(),
            }),
            "email-dynamic" => {
                let defaults = EmailNode::default();
                NodeKind::Email(EmailNode {
                    smtp_server: record.smtp_server.unwrap_or_default(),
                    smtp_port: record.smtp_port.unwrap_or(defaults.smtp_port),
                    smtp_user: record.smtp_user.unwrap_or_default(),
                    smtp_pass: record.smtp_pass.unwrap_or_default(),
                    secure: record.secure.unwrap_or(false),
                    tls_reject_unauthorized: record.tls_reject_unauthorized.unwrap_or(false),
                    wires: record.wires.unwrap_or(defaults.wires),
                })
            }
            other => return Err(GraphError::UnknownNodeType(other.to_string())),
        };

        Ok(Node {
            id: record.id,
            label: record.label,
            kind,
        })
    }
}

fn build_rules(
    label: &str,
    definitions: Option<Vec<RuleDefinition>>,
) -> Result<Vec<Rule>, GraphError> {
    definitions
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, definition)| {
            Rule::try_from(definition).map_err(|source| GraphError::InvalidRule {
                label: label.to_string(),
                index,
                source,
            })
        })
        .collect()
}
