//! Wire-format decoding for engine replies. Providers embed a JSON
//! object somewhere in free-form text; we take the first balanced
//! `{…}` or `[…]`, repair bare newlines inside string literals, and
//! unmarshal the structured reply.

use serde::{Deserialize, Deserializer};

use crate::error::{CoreError, Result};
use crate::interfaces::engines::{EmotionDelta, EngineReply};

/// First balanced JSON object or array embedded in `text`, tracking
/// string state so braces inside literals do not count.
pub fn extract_balanced_json(text: &str) -> Option<&str> {
    let mut start: Option<usize> = None;
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if start.is_none() {
            match ch {
                '{' => {
                    start = Some(idx);
                    stack.push('}');
                }
                '[' => {
                    start = Some(idx);
                    stack.push(']');
                }
                _ => {}
            }
            continue;
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return None;
                }
                if stack.is_empty() {
                    let begin = start.unwrap_or(0);
                    return Some(&text[begin..idx + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Rewrites bare CR / LF / CRLF inside string literals to the two-byte
/// `\n` escape. Newlines outside strings pass through untouched.
pub fn sanitize_newlines_in_strings(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = json.chars().peekable();

    while let Some(ch) = chars.next() {
        if !in_string {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
            continue;
        }

        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }

        match ch {
            '\\' => {
                escaped = true;
                out.push(ch);
            }
            '"' => {
                in_string = false;
                out.push(ch);
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }

    out
}

/// Accepts `5`, `-3`, `5.0` or `"+5"` for affection deltas; providers
/// are not consistent about the sign prefix.
pub fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| serde::de::Error::custom("numeric delta out of range")),
        serde_json::Value::String(s) => {
            let trimmed = s.trim().trim_start_matches('+');
            trimmed
                .parse::<i64>()
                .map_err(|_| serde::de::Error::custom(format!("bad delta string {s:?}")))
        }
        other => Err(serde::de::Error::custom(format!(
            "delta must be number or string, got {other}"
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct WireReply {
    dialogue: String,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    scene_description: Option<String>,
    #[serde(default)]
    emotion_delta: Option<serde_json::Value>,
}

/// A malformed delta never fails the reply; it degrades to no delta, so
/// the relationship engine applies 0 and keeps the mood.
fn lenient_delta(value: serde_json::Value) -> Option<EmotionDelta> {
    let obj = value.as_object()?;
    let affection_delta = match obj.get("affection_delta") {
        None | Some(serde_json::Value::Null) => 0,
        Some(serde_json::Value::Number(n)) => {
            n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?
        }
        Some(serde_json::Value::String(s)) => {
            s.trim().trim_start_matches('+').parse::<i64>().ok()?
        }
        Some(_) => return None,
    };
    let mood = match obj.get("mood") {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        _ => None,
    };
    Some(EmotionDelta {
        affection_delta,
        mood,
    })
}

/// Full decode path: extract, sanitise, unmarshal. Anything that does
/// not yield a non-empty dialogue is an upstream parse failure.
pub fn decode_reply(raw: &str) -> Result<EngineReply> {
    let extracted = extract_balanced_json(raw)
        .ok_or_else(|| CoreError::UpstreamParse("no JSON object in reply".to_string()))?;
    let sanitized = sanitize_newlines_in_strings(extracted);
    let wire: WireReply = serde_json::from_str(&sanitized)
        .map_err(|e| CoreError::UpstreamParse(format!("bad reply shape: {e}")))?;

    if wire.dialogue.trim().is_empty() {
        return Err(CoreError::UpstreamParse("empty dialogue".to_string()));
    }

    Ok(EngineReply {
        dialogue: wire.dialogue,
        action: wire.action.filter(|s| !s.trim().is_empty()),
        scene_description: wire.scene_description.filter(|s| !s.trim().is_empty()),
        emotion_delta: wire.emotion_delta.and_then(lenient_delta),
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_balanced_object() {
        let text = "Sure! Here you go: {\"a\": {\"b\": 1}} trailing";
        assert_eq!(extract_balanced_json(text), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn extracts_array() {
        assert_eq!(extract_balanced_json("x [1, 2] y"), Some("[1, 2]"));
    }

    #[test]
    fn braces_inside_strings_do_not_count() {
        let text = r#"{"a": "close } brace", "b": 2}"#;
        assert_eq!(extract_balanced_json(text), Some(text));
    }

    #[test]
    fn escaped_quote_keeps_string_state() {
        let text = r#"{"a": "quote \" and } brace"}"#;
        assert_eq!(extract_balanced_json(text), Some(text));
    }

    #[test]
    fn mismatched_closer_yields_none() {
        assert_eq!(extract_balanced_json("{ (]"), None);
        assert_eq!(extract_balanced_json("{\"a\": [1}"), None);
    }

    #[test]
    fn no_json_yields_none() {
        assert_eq!(extract_balanced_json("plain prose only"), None);
    }

    #[test]
    fn sanitises_newlines_only_inside_strings() {
        let input = "{\n  \"a\": \"line one\nline two\"\n}";
        let out = sanitize_newlines_in_strings(input);
        assert_eq!(out, "{\n  \"a\": \"line one\\nline two\"\n}");
    }

    #[test]
    fn sanitises_crlf_as_single_escape() {
        let input = "{\"a\": \"x\r\ny\"}";
        assert_eq!(sanitize_newlines_in_strings(input), "{\"a\": \"x\\ny\"}");
    }

    #[test]
    fn decode_accepts_embedded_reply_with_string_delta() {
        let raw = "of course!\n{\"dialogue\": \"hi\", \"emotion_delta\": {\"affection_delta\": \"+2\", \"mood\": \"happy\"}}";
        let reply = decode_reply(raw).unwrap();
        assert_eq!(reply.dialogue, "hi");
        let delta = reply.emotion_delta.unwrap();
        assert_eq!(delta.affection_delta, 2);
        assert_eq!(delta.mood.as_deref(), Some("happy"));
    }

    #[test]
    fn decode_repairs_bare_newline_in_dialogue() {
        let raw = "{\"dialogue\": \"first\nsecond\"}";
        let reply = decode_reply(raw).unwrap();
        assert_eq!(reply.dialogue, "first\nsecond");
    }

    #[test]
    fn malformed_delta_is_dropped_not_fatal() {
        let raw = r#"{"dialogue": "hi there", "emotion_delta": {"affection_delta": "lots"}}"#;
        let reply = decode_reply(raw).unwrap();
        assert_eq!(reply.dialogue, "hi there");
        assert!(reply.emotion_delta.is_none());
    }

    #[test]
    fn non_object_delta_is_dropped() {
        let raw = r#"{"dialogue": "hi", "emotion_delta": "very positive"}"#;
        let reply = decode_reply(raw).unwrap();
        assert!(reply.emotion_delta.is_none());
    }

    #[test]
    fn non_string_mood_is_dropped_but_delta_kept() {
        let raw = r#"{"dialogue": "hi", "emotion_delta": {"affection_delta": 2, "mood": 5}}"#;
        let delta = decode_reply(raw).unwrap().emotion_delta.unwrap();
        assert_eq!(delta.affection_delta, 2);
        assert!(delta.mood.is_none());
    }

    #[test]
    fn decode_rejects_prose() {
        let err = decode_reply("I cannot answer in JSON today.").unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_PARSE_ERROR");
    }

    #[test]
    fn decode_rejects_empty_dialogue() {
        let err = decode_reply("{\"dialogue\": \"  \"}").unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_PARSE_ERROR");
    }
}
