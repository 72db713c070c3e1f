use crate::evaluator::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Value as Json, json};
use std::fs;
use std::path::Path;

/// Runtime stores loaded from JSON, used to try rules outside a running flow.
///
/// ```json
/// { "msg": { "payload": 35 }, "flow": { "temperature": 35 }, "previous": 30 }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SampleContext {
    #[serde(default)]
    pub msg: Json,
    #[serde(default)]
    pub flow: Json,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Json>,
}

impl SampleContext {
    /// Load sample stores from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let data = serde_json::from_str(&content)?;
        Ok(data)
    }

    pub fn context(&self) -> Context<'_> {
        Context::new(&self.msg, &self.flow).with_previous(self.previous.as_ref())
    }
}

impl Default for SampleContext {
    /// A camera alert as the receive-alert trigger would store it.
    fn default() -> Self {
        let alert = json!({
            "message": "Motion detected",
            "cameraName": "cam-1",
            "area": "kitchen",
            "temperature": 35,
            "humidity": 40
        });
        Self {
            msg: json!({ "payload": alert, "area": "kitchen", "temperature": 35 }),
            flow: alert,
            previous: None,
        }
    }
}
