//! JSON wire types for the chat endpoint.
//!
//! Responses come in two shapes: the chat object itself, or an envelope
//! `{"response": "<json string>"}` whose string holds the chat object. [`decode_chat_response`]
//! handles both in one place.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::InferenceError;

const MAX_ENVELOPE_DEPTH: usize = 4;

/// Single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role (`user`, `assistant`, ...).
    pub role: String,
    /// Message text.
    pub content: String,
}

/// Body of `POST /api/chat/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation; always a single user message here.
    pub messages: Vec<ChatMessage>,
    /// Streaming is never requested.
    pub stream: bool,
}

impl ChatRequest {
    /// Build a non-streaming request carrying `text` as the only user message.
    pub fn user(model: &str, text: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: text.to_string(),
            }],
            stream: false,
        }
    }
}

/// Decoded chat response.
///
/// Only `message.content` is interpreted. Every other field is kept as the raw JSON value the
/// service sent, so an unexpected type there never rejects an otherwise usable answer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatResponse {
    /// Model that produced the answer.
    #[serde(default)]
    pub model: Option<Value>,
    /// Creation timestamp as reported by the service.
    #[serde(default)]
    pub created_at: Option<Value>,
    /// Raw `message` value; validated by [`ChatResponse::into_content`].
    #[serde(default)]
    pub message: Option<Value>,
    /// Whether generation finished.
    #[serde(default)]
    pub done: Option<Value>,
    /// Opaque conversation context.
    #[serde(default)]
    pub context: Option<Value>,
    /// Total request duration.
    #[serde(default)]
    pub total_duration: Option<Value>,
    /// Model load duration.
    #[serde(default)]
    pub load_duration: Option<Value>,
    /// Prompt tokens evaluated.
    #[serde(default)]
    pub prompt_eval_count: Option<Value>,
    /// Prompt evaluation duration.
    #[serde(default)]
    pub prompt_eval_duration: Option<Value>,
    /// Tokens generated.
    #[serde(default)]
    pub eval_count: Option<Value>,
    /// Generation duration.
    #[serde(default)]
    pub eval_duration: Option<Value>,
    /// Why generation stopped.
    #[serde(default)]
    pub done_reason: Option<Value>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WirePayload {
    Envelope { response: String },
    Direct(ChatResponse),
}

impl ChatResponse {
    /// Extract `message.content`, failing structurally when it is missing or malformed.
    pub fn into_content(self) -> Result<String, InferenceError> {
        let message = match self.message {
            None | Some(Value::Null) => {
                return Err(InferenceError::Structural(
                    "response carries no message".into(),
                ));
            }
            Some(message) => message,
        };

        match serde_json::from_value::<ResponseMessage>(message) {
            Ok(ResponseMessage {
                content: Some(content),
                ..
            }) => Ok(content),
            Ok(_) => Err(InferenceError::Structural(
                "message carries no content".into(),
            )),
            Err(error) => Err(InferenceError::Structural(format!(
                "message is malformed: {error}"
            ))),
        }
    }
}

/// Decode a response body in either the direct or the envelope shape.
///
/// An envelope is unwrapped recursively (up to a small fixed depth) and its payload decoded as
/// the same schema. An empty envelope string decodes to an empty response, which then fails
/// structurally on extraction.
pub fn decode_chat_response(body: &[u8]) -> Result<ChatResponse, InferenceError> {
    let value: Value = serde_json::from_slice(body).map_err(|error| {
        InferenceError::MalformedResponse(format!("invalid JSON body: {error}"))
    })?;
    decode_value(value, 0)
}

fn decode_value(value: Value, depth: usize) -> Result<ChatResponse, InferenceError> {
    if !value.is_object() {
        return Err(InferenceError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }

    match serde_json::from_value::<WirePayload>(value) {
        Ok(WirePayload::Direct(response)) => Ok(response),
        Ok(WirePayload::Envelope { response }) => {
            if depth >= MAX_ENVELOPE_DEPTH {
                return Err(InferenceError::MalformedResponse(
                    "response envelope nested too deeply".into(),
                ));
            }
            if response.trim().is_empty() {
                return Ok(ChatResponse::default());
            }
            let inner: Value = serde_json::from_str(&response).map_err(|error| {
                InferenceError::MalformedResponse(format!(
                    "envelope payload is not valid JSON: {error}"
                ))
            })?;
            decode_value(inner, depth + 1)
        }
        Err(error) => Err(InferenceError::MalformedResponse(format!(
            "unexpected response fields: {error}"
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
