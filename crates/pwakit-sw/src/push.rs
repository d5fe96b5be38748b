//! Push payload decoding and notification display.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::WorkerConfig;
use crate::env::Environment;
use crate::error::Result;
use crate::types::NotificationId;

/// Inbound push payload: `{ title?, body?, conversationId? }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    /// A JSON string or number; numbers keep their textual form.
    pub conversation_id: Option<String>,
}

impl PushPayload {
    /// Decode a raw payload.
    ///
    /// Only bytes that are not JSON are rejected. Fields of the wrong type,
    /// or a document that is not an object, read as absent.
    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(bytes)?;
        Ok(Self::from_value(&value))
    }

    fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_owned);
        let conversation_id = match value.get("conversationId") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };

        Self {
            title: text("title"),
            body: text("body"),
            conversation_id: conversation_id.filter(|id| !id.is_empty()),
        }
    }
}

/// Opaque data attached to a notification for the click router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// A notification ready for display. Built fresh per push, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDescriptor {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub data: NotificationData,
    #[serde(rename = "vibrate")]
    pub vibration_pattern: Vec<u32>,
}

impl NotificationDescriptor {
    /// Build from a payload, filling gaps from the config.
    pub fn from_payload(payload: PushPayload, config: &WorkerConfig) -> Self {
        Self {
            title: payload
                .title
                .unwrap_or_else(|| config.default_title.clone()),
            body: payload.body.unwrap_or_else(|| config.default_body.clone()),
            icon: config.icon.clone(),
            badge: config.badge.clone(),
            data: NotificationData {
                conversation_id: payload.conversation_id,
            },
            vibration_pattern: config.vibration_pattern.clone(),
        }
    }
}

/// Result of handling a push event.
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    /// The event carried no payload.
    NoPayload,
    /// The payload could not be decoded. No notification was shown.
    Dropped { reason: String },
    /// A notification was displayed.
    Shown {
        id: NotificationId,
        notification: NotificationDescriptor,
    },
}

/// Turns push payloads into displayed notifications.
#[derive(Debug, Clone)]
pub struct PushDispatcher {
    config: WorkerConfig,
}

impl PushDispatcher {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// Handle a push event.
    ///
    /// A malformed payload never surfaces as an error; it is reported with a
    /// warning and a [`PushOutcome::Dropped`]. Display failures do propagate.
    pub async fn handle<E: Environment + ?Sized>(
        &self,
        payload: Option<&[u8]>,
        env: &E,
    ) -> Result<PushOutcome> {
        let Some(bytes) = payload else {
            debug!("Push without payload");
            return Ok(PushOutcome::NoPayload);
        };

        let payload = match PushPayload::parse(bytes) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, len = bytes.len(), "Dropping malformed push payload");
                return Ok(PushOutcome::Dropped {
                    reason: e.to_string(),
                });
            }
        };

        let notification = NotificationDescriptor::from_payload(payload, &self.config);
        let id = env.show_notification(&notification).await?;
        debug!(
            %id,
            title = %notification.title,
            conversation = ?notification.data.conversation_id,
            "Notification shown"
        );

        Ok(PushOutcome::Shown { id, notification })
    }
}
