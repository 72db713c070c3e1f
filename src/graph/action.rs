//! The send-email action: a function node that fills in SMTP settings on the
//! message, wired to the runtime's dynamic mail sender.

use super::{EmailNode, FlowGraph, FunctionNode, NodeKind};
use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

pub const PREPARE_EMAIL_LABEL: &str = "prepare email";
pub const SEND_EMAIL_LABEL: &str = "Send Email (dynamic)";

const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

fn default_smtp_server() -> String {
    DEFAULT_SMTP_SERVER.to_string()
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

/// Mail account and recipient for the send-email action.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailAction {
    pub userid: String,
    pub password: String,
    pub to: String,
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
}

impl EmailAction {
    pub fn new(userid: &str, password: &str, to: &str) -> Self {
        Self {
            userid: userid.trim().to_string(),
            password: password.to_string(),
            to: to.trim().to_string(),
            smtp_server: default_smtp_server(),
            smtp_port: DEFAULT_SMTP_PORT,
        }
    }

    /// Rejects an action with an empty account, password or recipient.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.userid.trim().is_empty() {
            return Err(GraphError::EmptyField("userid"));
        }
        if self.password.is_empty() {
            return Err(GraphError::EmptyField("password"));
        }
        if self.to.trim().is_empty() {
            return Err(GraphError::EmptyField("to"));
        }
        Ok(())
    }

    /// Runtime function body setting `msg.smtp`, the addresses, and fallback
    /// subject and body.
    fn function_body(&self) -> String {
        let quote = |text: &str| Json::String(text.to_string()).to_string();
        let server = if self.smtp_server.trim().is_empty() {
            DEFAULT_SMTP_SERVER
        } else {
            self.smtp_server.trim()
        };
        format!(
            r#"msg.smtp = msg.smtp || {{}};
msg.smtp.auth = msg.smtp.auth || {{}};
msg.smtp.tls = msg.smtp.tls || {{}};

msg.smtp.host = {host};
msg.smtp.port = {port};
msg.smtp.secure = false;
msg.smtp.auth.user = {user};
msg.smtp.auth.pass = {pass};
msg.smtp.tls.rejectUnauthorized = false;

msg.to = {to};
msg.from = {user};
msg.topic = msg.topic || "Alert";
msg.payload = msg.payload || "An alert was received.";

return msg;
"#,
            host = quote(server),
            port = self.smtp_port,
            user = quote(&self.userid),
            pass = quote(&self.password),
            to = quote(&self.to),
        )
    }
}

impl FlowGraph {
    pub fn has_email_action(&self) -> bool {
        self.preparer_index().is_some()
    }

    /// Adds the send-email action, or refreshes the settings of the one
    /// already present. Nothing changes when the action is incomplete.
    pub fn add_email_action(&mut self, action: &EmailAction) -> Result<(), GraphError> {
        action.validate().inspect_err(|e| {
            tracing::warn!("Rejected email action: {}", e);
        })?;

        if let Some(index) = self.preparer_index() {
            if let NodeKind::Function(function) = &mut self.nodes[index].kind {
                function.func = action.function_body();
            }
            tracing::info!("Updated email action for {}", action.to);
            return Ok(());
        }

        let sender = self.push_node(
            SEND_EMAIL_LABEL.to_string(),
            NodeKind::Email(EmailNode::default()),
        );
        let sender_id = self.nodes[sender].id.clone();
        self.push_node(
            PREPARE_EMAIL_LABEL.to_string(),
            NodeKind::Function(FunctionNode {
                func: action.function_body(),
                outputs: 1,
                wires: vec![vec![sender_id]],
            }),
        );
        tracing::info!("Added email action for {}", action.to);
        Ok(())
    }

    fn preparer_index(&self) -> Option<usize> {
        self.nodes.iter().position(|n| {
            matches!(n.kind, NodeKind::Function(_)) && n.label == PREPARE_EMAIL_LABEL
        })
    }
}
