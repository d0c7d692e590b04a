use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

fn default_prompt() -> String {
    "a silent pond".to_string()
}

/// A prompt handed from `interpret_poetry` to the next `generate_poetry` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptData {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl PromptData {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// What a poet is asked to write about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    Text(String),
    Data(PromptData),
}

impl PromptInput {
    pub fn prompt(&self) -> &str {
        match self {
            PromptInput::Text(text) => text,
            PromptInput::Data(data) => &data.prompt,
        }
    }
}

impl From<&str> for PromptInput {
    fn from(value: &str) -> Self {
        PromptInput::Text(value.to_string())
    }
}

impl From<String> for PromptInput {
    fn from(value: String) -> Self {
        PromptInput::Text(value)
    }
}

impl From<PromptData> for PromptInput {
    fn from(value: PromptData) -> Self {
        PromptInput::Data(value)
    }
}

/// Message body. A JSON string is poem text, a JSON object is prompt data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Prompt(PromptData),
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Prompt(_) => None,
        }
    }

    /// The text an interpreting poet reads: the poem itself, or the prompt string.
    pub fn readable_text(&self) -> &str {
        match self {
            Payload::Text(text) => text,
            Payload::Prompt(data) => &data.prompt,
        }
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<PromptData> for Payload {
    fn from(value: PromptData) -> Self {
        Payload::Prompt(value)
    }
}

/// The record written to a recipient's mailbox slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub sender_id: String,
    pub recipient_id: String,
    pub message_type: String,
    pub payload: Payload,
    pub timestamp: String,
}

impl Message {
    pub fn new(
        sender_id: impl Into<String>,
        recipient_id: impl Into<String>,
        message_type: impl Into<String>,
        payload: impl Into<Payload>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            recipient_id: recipient_id.into(),
            message_type: message_type.into(),
            payload: payload.into(),
            timestamp: utc_timestamp(),
        }
    }
}

/// Current UTC time as ISO 8601 with microseconds and a `Z` suffix.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_payload_serializes_as_plain_string() {
        let msg = Message::new("alpha", "beta", "initial_poem", "Old pond.\nA frog.");
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["payload"], json!("Old pond.\nA frog."));
        assert_eq!(value["sender_id"], json!("alpha"));
        assert!(msg.timestamp.ends_with('Z'));
    }

    #[test]
    fn prompt_payload_defaults_missing_prompt() {
        let payload: Payload = serde_json::from_value(json!({"reference": "still water"})).unwrap();

        assert_eq!(
            payload,
            Payload::Prompt(PromptData::new("a silent pond").with_reference("still water"))
        );
        assert_eq!(payload.readable_text(), "a silent pond");
        assert!(payload.as_text().is_none());
    }

    #[test]
    fn timestamp_parses_as_rfc3339() {
        let stamp = utc_timestamp();
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}
