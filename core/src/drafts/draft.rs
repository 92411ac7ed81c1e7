// Draft payload: an unsent message composition

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where the draft is addressed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DraftTarget {
    Stream {
        stream: String,
        /// Topic within the stream
        subject: String,
    },
    Private {
        /// Comma-separated recipient emails
        private_message_recipient: String,
    },
}

/// A draft is a flat JSON object: the target's fields, `content`, an
/// optional `updatedAt`, and whatever else the client put there (`reply_to`
/// and the like), which is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Draft {
    pub target: DraftTarget,
    pub content: String,
    /// Epoch milliseconds of the last add or edit, stamped by the store
    pub updated_at: Option<u64>,
    /// Fields this crate does not interpret
    pub extra: Map<String, Value>,
}

const CONTENT: &str = "content";
const UPDATED_AT: &str = "updatedAt";

impl TryFrom<Map<String, Value>> for Draft {
    type Error = String;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let target: DraftTarget =
            serde_json::from_value(Value::Object(fields.clone())).map_err(|e| e.to_string())?;
        if let Ok(Value::Object(known)) = serde_json::to_value(&target) {
            for key in known.keys() {
                fields.remove(key);
            }
        }

        let content = match fields.remove(CONTENT) {
            Some(Value::String(content)) => content,
            Some(other) => return Err(format!("draft content must be a string, got {}", other)),
            None => return Err("draft has no content".to_string()),
        };
        let updated_at = match fields.remove(UPDATED_AT) {
            None | Some(Value::Null) => None,
            Some(stamp) => Some(epoch_millis(&stamp).ok_or_else(|| format!("bad {}: {}", UPDATED_AT, stamp))?),
        };

        Ok(Self {
            target,
            content,
            updated_at,
            extra: fields,
        })
    }
}

impl From<Draft> for Map<String, Value> {
    fn from(draft: Draft) -> Self {
        let mut fields = draft.extra;
        if let Ok(Value::Object(target)) = serde_json::to_value(&draft.target) {
            fields.extend(target);
        }
        fields.insert(CONTENT.to_string(), Value::String(draft.content));
        if let Some(stamp) = draft.updated_at {
            fields.insert(UPDATED_AT.to_string(), Value::from(stamp));
        }
        fields
    }
}

// JS hands timestamps over as doubles
fn epoch_millis(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}

impl Draft {
    pub fn stream(stream: impl Into<String>, subject: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            target: DraftTarget::Stream {
                stream: stream.into(),
                subject: subject.into(),
            },
            content: content.into(),
            updated_at: None,
            extra: Map::new(),
        }
    }

    pub fn private(recipients: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            target: DraftTarget::Private {
                private_message_recipient: recipients.into(),
            },
            content: content.into(),
            updated_at: None,
            extra: Map::new(),
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.target, DraftTarget::Stream { .. })
    }

    /// Whether the draft names a complete destination: a stream and topic, or
    /// at least one private recipient.
    pub fn is_addressed(&self) -> bool {
        match &self.target {
            DraftTarget::Stream { stream, subject } => !stream.is_empty() && !subject.is_empty(),
            DraftTarget::Private {
                private_message_recipient,
            } => !private_message_recipient.trim().is_empty(),
        }
    }

    /// Individual recipient emails of a private draft
    pub fn recipients(&self) -> Vec<&str> {
        match &self.target {
            DraftTarget::Stream { .. } => Vec::new(),
            DraftTarget::Private {
                private_message_recipient,
            } => private_message_recipient
                .split(',')
                .map(str::trim)
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_draft_json_shape() {
        let draft = Draft::stream("general", "lunch", "noon?");
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["type"], "stream");
        assert_eq!(json["stream"], "general");
        assert_eq!(json["subject"], "lunch");
        assert_eq!(json["content"], "noon?");
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn test_private_draft_from_json() {
        let json = r#"{
            "type": "private",
            "private_message_recipient": "alice@example.com, bob@example.com",
            "reply_to": "alice@example.com, bob@example.com",
            "content": "hi",
            "updatedAt": 1500000000000
        }"#;
        let draft: Draft = serde_json::from_str(json).unwrap();
        assert!(!draft.is_stream());
        assert_eq!(draft.updated_at, Some(1_500_000_000_000));
        assert_eq!(draft.recipients(), vec!["alice@example.com", "bob@example.com"]);
        assert_eq!(draft.extra["reply_to"], "alice@example.com, bob@example.com");
    }

    #[test]
    fn test_client_fields_survive_roundtrip() {
        let json = serde_json::json!({
            "type": "stream",
            "stream": "general",
            "subject": "lunch",
            "content": "noon?",
            "reply_to": "alice@example.com",
            "draft_flags": {"pinned": true},
            "updatedAt": 1500000000000u64
        });
        let draft: Draft = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(draft.extra.len(), 2);
        assert!(draft.extra.get("stream").is_none());
        assert_eq!(serde_json::to_value(&draft).unwrap(), json);
    }

    #[test]
    fn test_float_timestamp_accepted() {
        let json = r#"{"type": "private", "private_message_recipient": "a@example.com",
            "content": "hi", "updatedAt": 1500000000000.0}"#;
        let draft: Draft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.updated_at, Some(1_500_000_000_000));
    }

    #[test]
    fn test_missing_content_rejected() {
        let json = r#"{"type": "stream", "stream": "general", "subject": "lunch"}"#;
        assert!(serde_json::from_str::<Draft>(json).is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let json = r#"{"type": "broadcast", "content": "x"}"#;
        assert!(serde_json::from_str::<Draft>(json).is_err());
    }

    #[test]
    fn test_is_addressed() {
        assert!(Draft::stream("general", "lunch", "").is_addressed());
        assert!(!Draft::stream("general", "", "text").is_addressed());
        assert!(!Draft::stream("", "lunch", "text").is_addressed());
        assert!(Draft::private("alice@example.com", "").is_addressed());
        assert!(!Draft::private("  ", "text").is_addressed());
    }
}
