//! Extraction of displayable notifications from push payloads.
//!
//! A push payload may carry a `data` object, a `notification` object, or both.
//! Every field is looked up in `data` first, then in `notification`, then in
//! the configured defaults. Empty strings count as missing.

use crate::config::NotificationDefaults;
use serde::Serialize;
use serde_json::Value as Json;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Where the notification points; distinct from the fixed click target.
    pub url: String,
    pub require_interaction: bool,
}

impl Notification {
    pub fn from_push(payload: &Json, defaults: &NotificationDefaults) -> Self {
        let data = payload.get("data");
        let notification = payload.get("notification");
        let pick = |data_key: &str, notification_key: &str| {
            field(data, data_key).or_else(|| field(notification, notification_key))
        };

        let extracted = Self {
            title: pick("title", "title").unwrap_or_else(|| defaults.title.clone()),
            body: pick("body", "body").unwrap_or_default(),
            image: pick("image", "image").unwrap_or_else(|| defaults.image.clone()),
            icon: pick("icon", "icon"),
            url: pick("url", "click_action").unwrap_or_else(|| defaults.click_url.clone()),
            require_interaction: false,
        };
        tracing::debug!("Extracted notification '{}'", extracted.title);
        extracted
    }

    /// The page opened when the notification is clicked. It is always the
    /// configured click URL, whatever the payload's `url` says.
    pub fn click_target<'a>(&self, defaults: &'a NotificationDefaults) -> &'a str {
        &defaults.click_url
    }
}

/// A truthy scalar field of `object`, in text form.
fn field(object: Option<&Json>, key: &str) -> Option<String> {
    match object?.get(key)? {
        Json::String(s) if s.is_empty() => None,
        Json::String(s) => Some(s.clone()),
        Json::Number(n) if n.as_f64() == Some(0.0) => None,
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}
