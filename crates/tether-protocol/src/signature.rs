use crate::{Message, ProtocolError, Signature};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Longest possible bare `{"timestamp": <uint>}` probe.
const TIMESTAMP_PROBE_MAX_LEN: usize = 26;

/// True for the minimal unsigned clock-sync message delivered right after
/// the connection is established. It carries no payload to sign.
pub fn is_timestamp_probe(raw: &str) -> bool {
    raw.starts_with("{\"timestamp\":") && raw.len() <= TIMESTAMP_PROBE_MAX_LEN
}

/// Base64 HMAC-SHA256 tag over the payload bytes.
pub fn calculate_signature(key: &str, payload: &str) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(key.as_bytes()) else {
        // HMAC accepts keys of any length; new_from_slice cannot fail.
        return String::new();
    };
    mac.update(payload.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// The raw `"payload": { ... }` object substring of a serialized message.
///
/// The tag must be computed over the exact bytes the peer produced, so this
/// scans the text instead of re-serializing: find the payload key at brace
/// depth 1, then take the balanced object, skipping strings and escapes.
pub fn extract_payload(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut key_at = None;

    for (i, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => {
                if !in_string && depth == 1 && raw[i..].starts_with("\"payload\"") {
                    key_at = Some(i + "\"payload\"".len());
                }
                in_string = !in_string;
            }
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => depth = depth.saturating_sub(1),
            _ => {}
        }
        if key_at.is_some() && !in_string {
            break;
        }
    }

    let after_key = key_at?;
    let colon = raw[after_key..].find(':')? + after_key;
    let start = colon + 1 + raw[colon + 1..].find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Sign a message for transmission: tag the payload section and return the
/// final serialized text with the tag in `header.signature.HMAC`.
pub fn sign(key: &str, message: &Message) -> crate::Result<String> {
    let payload = serde_json::to_string(&message.payload)?;
    let mut signed = message.clone();
    signed.header.signature = Some(Signature {
        hmac: calculate_signature(key, &payload),
    });
    signed.to_json()
}

/// Check a received message's signature against the raw payload bytes.
///
/// Timestamp probes pass unconditionally. Anything else must carry a
/// signature matching the recomputed tag; mismatches are dropped by the
/// caller with no response.
pub fn verify(key: &str, raw: &str) -> bool {
    if is_timestamp_probe(raw) {
        return true;
    }
    match check_signature(key, raw) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::debug!(error = %e, "unverifiable message");
            false
        }
    }
}

fn check_signature(key: &str, raw: &str) -> crate::Result<bool> {
    let carried = carried_signature(raw)?;
    let payload = extract_payload(raw).ok_or(ProtocolError::MissingPayload)?;
    Ok(calculate_signature(key, payload) == carried)
}

fn carried_signature(raw: &str) -> crate::Result<String> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    value["header"]["signature"]["HMAC"]
        .as_str()
        .map(str::to_string)
        .ok_or(ProtocolError::MissingSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageType;

    const KEY: &str = "7e8f1c22-4a6d-4b9e-8c15-d4a0fe31c2aa";

    fn sample_message() -> Message {
        let mut event = Message::event(
            "aabbccddeeff001122334455",
            "setRangeValue",
            None,
            "PHYSICAL_INTERACTION",
        );
        event.payload.created_at = 1_700_000_000;
        event.payload.value = serde_json::json!({"rangeValue": 3});
        event
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let text = match sign(KEY, &sample_message()) {
            Ok(t) => t,
            Err(e) => panic!("sign failed: {e}"),
        };
        assert!(verify(KEY, &text));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let text = match sign(KEY, &sample_message()) {
            Ok(t) => t,
            Err(e) => panic!("sign failed: {e}"),
        };
        assert!(!verify("another-key", &text));
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let text = match sign(KEY, &sample_message()) {
            Ok(t) => t,
            Err(e) => panic!("sign failed: {e}"),
        };
        let tampered = text.replace("\"rangeValue\":3", "\"rangeValue\":9");
        assert_ne!(text, tampered);
        assert!(!verify(KEY, &tampered));
    }

    #[test]
    fn unsigned_message_fails_verification() {
        let text = match sample_message().to_json() {
            Ok(t) => t,
            Err(e) => panic!("serialize failed: {e}"),
        };
        assert!(!verify(KEY, &text));
    }

    #[test]
    fn message_without_payload_section_fails_verification() {
        // Carries a signature but nothing to verify it against.
        let raw = r#"{"header":{"payloadVersion":2,"signatureVersion":1,"signature":{"HMAC":"abc="}}}"#;
        assert!(!verify(KEY, raw));
    }

    #[test]
    fn timestamp_probe_bypasses_verification() {
        assert!(is_timestamp_probe("{\"timestamp\":1700000000}"));
        assert!(verify(KEY, "{\"timestamp\":1700000000}"));
        // Over the length bound it is no longer a probe.
        assert!(!is_timestamp_probe("{\"timestamp\":17000000000000000000000}"));
    }

    #[test]
    fn extract_payload_matches_serialized_section() {
        let message = sample_message();
        let payload_json = match serde_json::to_string(&message.payload) {
            Ok(t) => t,
            Err(e) => panic!("serialize failed: {e}"),
        };
        let text = match message.to_json() {
            Ok(t) => t,
            Err(e) => panic!("serialize failed: {e}"),
        };
        assert_eq!(extract_payload(&text), Some(payload_json.as_str()));
    }

    #[test]
    fn extract_payload_skips_braces_inside_strings() {
        let raw = r#"{"header":{"note":"{not payload}"},"payload":{"action":"a{b}c","type":"request"}}"#;
        assert_eq!(
            extract_payload(raw),
            Some(r#"{"action":"a{b}c","type":"request"}"#)
        );
    }

    #[test]
    fn signed_text_still_parses_as_message() {
        let text = match sign(KEY, &sample_message()) {
            Ok(t) => t,
            Err(e) => panic!("sign failed: {e}"),
        };
        let parsed = match Message::parse(&text) {
            Ok(m) => m,
            Err(e) => panic!("parse failed: {e}"),
        };
        assert_eq!(parsed.payload.kind, MessageType::Event);
        assert!(parsed.header.signature.is_some());
    }
}
