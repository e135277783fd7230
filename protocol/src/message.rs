use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// One entry of the conversation log.
///
/// Only `hidden` is interpreted here; the payload is carried through
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// When `true` the message is excluded from the context handed to the
    /// model. It is still rendered, with a hidden marker.
    #[serde(default)]
    pub hidden: bool,

    #[serde(default)]
    pub payload: JsonValue,
}

impl ChatMessage {
    pub fn new(payload: JsonValue) -> Self {
        Self {
            hidden: false,
            payload,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(JsonValue::String(text.into()))
    }
}
