//! `~m~<len>~m~<payload>` framing used by the chart socket.

use serde_json::{json, Value};

const FRAME_MARKER: &str = "~m~";
const HEARTBEAT_PREFIX: &str = "~h~";

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Keep-alive; the payload is echoed back verbatim.
    Heartbeat(String),
    /// `{"m": method, "p": params}`.
    Message { method: String, params: Value },
    /// Anything else, e.g. the session banner sent on connect.
    Other(Value),
}

/// Wrap a payload. The length counts UTF-16 units, matching the server.
pub fn encode_frame(payload: &str) -> String {
    format!(
        "{FRAME_MARKER}{}{FRAME_MARKER}{payload}",
        payload.encode_utf16().count()
    )
}

pub fn encode_message(method: &str, params: Value) -> String {
    encode_frame(&json!({ "m": method, "p": params }).to_string())
}

/// Split one websocket text message into its packets. Undecodable payloads are skipped.
pub fn parse_frames(raw: &str) -> Vec<Packet> {
    split_payloads(raw)
        .into_iter()
        .filter(|payload| !payload.is_empty())
        .filter_map(|payload| {
            if payload.starts_with(HEARTBEAT_PREFIX) {
                return Some(Packet::Heartbeat(payload.to_string()));
            }
            let value: Value = serde_json::from_str(payload).ok()?;
            match value.get("m").and_then(Value::as_str) {
                Some(method) => Some(Packet::Message {
                    method: method.to_string(),
                    params: value.get("p").cloned().unwrap_or(Value::Null),
                }),
                None => Some(Packet::Other(value)),
            }
        })
        .collect()
}

fn split_payloads(raw: &str) -> Vec<&str> {
    let mut payloads = Vec::new();
    let mut rest = raw;
    let mut current: Option<usize> = None;
    let mut offset = 0;

    while let Some(found) = rest.find(FRAME_MARKER) {
        let start = offset + found;
        let Some(header_len) = header_length(&raw[start..]) else {
            let step = found + FRAME_MARKER.len();
            offset += step;
            rest = &rest[step..];
            continue;
        };

        if let Some(payload_start) = current.take() {
            payloads.push(&raw[payload_start..start]);
        }
        current = Some(start + header_len);
        offset = start + header_len;
        rest = &raw[offset..];
    }

    if let Some(payload_start) = current {
        payloads.push(&raw[payload_start..]);
    }
    payloads
}

/// Length of a `~m~<digits>~m~` header at the start of `s`, if there is one.
fn header_length(s: &str) -> Option<usize> {
    let after = s.strip_prefix(FRAME_MARKER)?;
    let digits = after.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    after[digits..].strip_prefix(FRAME_MARKER)?;
    Some(FRAME_MARKER.len() * 2 + digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_count_utf16_units() {
        assert_eq!(encode_frame("~h~3"), "~m~4~m~~h~3");
        assert_eq!(encode_frame("é"), "~m~1~m~é");
        assert_eq!(
            encode_message("set_auth_token", json!(["unauthorized_user_token"])),
            r#"~m~54~m~{"m":"set_auth_token","p":["unauthorized_user_token"]}"#
        );
    }

    #[test]
    fn splits_batched_packets() {
        let raw = r#"~m~4~m~~h~7~m~35~m~{"m":"du","p":["cs_1",{"x":"~m~"}]}"#;
        let packets = parse_frames(raw);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0], Packet::Heartbeat("~h~7".to_string()));
        assert_eq!(
            packets[1],
            Packet::Message {
                method: "du".to_string(),
                params: json!(["cs_1", { "x": "~m~" }]),
            }
        );
    }

    #[test]
    fn keeps_non_method_payloads_and_skips_garbage() {
        let raw = r#"~m~18~m~{"session_id":"x"}~m~3~m~{{{"#;
        let packets = parse_frames(raw);
        assert_eq!(packets, [Packet::Other(json!({ "session_id": "x" }))]);
    }
}
