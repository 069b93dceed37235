use core::fmt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

pub const PAYLOAD_VERSION: u8 = 2;
pub const SIGNATURE_VERSION: u8 = 1;

/// Default event cause reported to the broker.
pub const PHYSICAL_INTERACTION: &str = "PHYSICAL_INTERACTION";

/// Fresh opaque correlation id for a message.
pub fn reply_token() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(rename = "HMAC")]
    pub hmac: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Header {
    #[serde(rename = "payloadVersion")]
    pub payload_version: u8,
    #[serde(rename = "signatureVersion")]
    pub signature_version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            payload_version: PAYLOAD_VERSION,
            signature_version: SIGNATURE_VERSION,
            signature: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Request,
    Response,
    Event,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Request => write!(f, "request"),
            MessageType::Response => write!(f, "response"),
            MessageType::Event => write!(f, "event"),
        }
    }
}

/// Structured reason attached to an event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cause {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payload {
    pub action: String,
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "instanceId", default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: u64,
    #[serde(rename = "replyToken")]
    pub reply_token: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Cause>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub header: Header,
    pub payload: Payload,
}

impl Message {
    pub fn parse(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Response skeleton echoing the request's routing fields.
    ///
    /// Starts out failed with a placeholder message; the dispatcher flips
    /// `success` once a handler has run.
    pub fn response_to(request: &Message) -> Self {
        Self {
            header: Header::default(),
            payload: Payload {
                action: request.payload.action.clone(),
                device_id: request.payload.device_id.clone(),
                instance_id: request.payload.instance_id.clone(),
                created_at: 0,
                reply_token: request.payload.reply_token.clone(),
                kind: MessageType::Response,
                value: json!({}),
                success: Some(false),
                message: Some("OK".to_string()),
                cause: None,
            },
        }
    }

    /// Unsolicited state notification for a device.
    pub fn event(device_id: &str, action: &str, instance: Option<&str>, cause: &str) -> Self {
        Self {
            header: Header::default(),
            payload: Payload {
                action: action.to_string(),
                device_id: device_id.to_string(),
                instance_id: instance.map(str::to_string),
                created_at: 0,
                reply_token: reply_token(),
                kind: MessageType::Event,
                value: json!({}),
                success: None,
                message: None,
                cause: Some(Cause {
                    kind: cause.to_string(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIRE_REQUEST: &str = r#"{
        "header": {"payloadVersion": 2, "signatureVersion": 1,
                   "signature": {"HMAC": "abc="}},
        "payload": {"action": "setRangeValue",
                    "deviceId": "aabbccddeeff001122334455",
                    "instanceId": "",
                    "createdAt": 1700000000,
                    "replyToken": "tok-1",
                    "type": "request",
                    "value": {"rangeValue": 2}}
    }"#;

    #[test]
    fn parses_wire_request() {
        let msg = match Message::parse(WIRE_REQUEST) {
            Ok(m) => m,
            Err(e) => panic!("parse failed: {e}"),
        };
        assert_eq!(msg.payload.kind, MessageType::Request);
        assert_eq!(msg.payload.action, "setRangeValue");
        assert_eq!(msg.payload.instance_id.as_deref(), Some(""));
        assert_eq!(msg.payload.value["rangeValue"], 2);
        assert_eq!(
            msg.header.signature.map(|s| s.hmac).as_deref(),
            Some("abc=")
        );
    }

    #[test]
    fn response_echoes_routing_fields() {
        let request = match Message::parse(WIRE_REQUEST) {
            Ok(m) => m,
            Err(e) => panic!("parse failed: {e}"),
        };
        let response = Message::response_to(&request);
        assert_eq!(response.payload.kind, MessageType::Response);
        assert_eq!(response.payload.action, "setRangeValue");
        assert_eq!(response.payload.reply_token, "tok-1");
        assert_eq!(response.payload.success, Some(false));
        assert_eq!(response.payload.message.as_deref(), Some("OK"));
        assert!(response.payload.value.is_object());
    }

    #[test]
    fn event_carries_cause_and_fresh_token() {
        let a = Message::event("aabbccddeeff001122334455", "setPowerState", None, "PHYSICAL_INTERACTION");
        let b = Message::event("aabbccddeeff001122334455", "setPowerState", None, "PHYSICAL_INTERACTION");
        assert_eq!(a.payload.kind, MessageType::Event);
        assert_eq!(
            a.payload.cause.as_ref().map(|c| c.kind.as_str()),
            Some("PHYSICAL_INTERACTION")
        );
        assert_ne!(a.payload.reply_token, b.payload.reply_token);
    }

    #[test]
    fn serialization_uses_wire_names() {
        let event = Message::event("d", "setBrightness", Some("lamp"), "APP_INTERACTION");
        let text = match event.to_json() {
            Ok(t) => t,
            Err(e) => panic!("serialize failed: {e}"),
        };
        assert!(text.contains("\"payloadVersion\":2"));
        assert!(text.contains("\"instanceId\":\"lamp\""));
        assert!(text.contains("\"replyToken\""));
        assert!(text.contains("\"type\":\"event\""));
        assert!(text.contains("\"cause\":{\"type\":\"APP_INTERACTION\"}"));
        // Unset response-only fields stay off the wire.
        assert!(!text.contains("\"success\""));
        assert!(!text.contains("\"signature\""));
    }
}
