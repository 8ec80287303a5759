//! Wire types for the `generateContent` method

use crate::{Result, YukkiError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A role-tagged list of parts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Content without a role (system instruction, TTS input)
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

/// Either text or inline binary data
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        alias = "inline_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData::encode(mime_type, bytes)),
        }
    }
}

/// Base64 payload with its MIME type
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(alias = "mime_type")]
    pub mime_type: String,
    pub data: String,
}

impl InlineData {
    pub fn encode(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Decode the base64 payload
    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.data.trim())
            .map_err(|e| YukkiError::InvalidResponse(format!("Invalid base64 payload: {}", e)))
    }
}

/// The parts of a `generateContent` response we read
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateResponse {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| YukkiError::InvalidResponse(format!("Unexpected response shape: {}", e)))
    }

    fn first_parts(&self) -> Result<&[Part]> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .ok_or_else(|| YukkiError::InvalidResponse("Response has no candidates".into()))
    }

    /// Concatenated text of the first candidate
    pub fn text(&self) -> Result<String> {
        let text: String = self
            .first_parts()?
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            return Err(YukkiError::InvalidResponse("Response contains no text".into()));
        }
        Ok(text)
    }

    /// First inline payload of the first candidate
    pub fn inline_data(&self) -> Result<&InlineData> {
        self.first_parts()?
            .iter()
            .find_map(|p| p.inline_data.as_ref())
            .ok_or_else(|| YukkiError::InvalidResponse("Response contains no audio data".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_part_serialization_skips_empty_fields() {
        let text = serde_json::to_value(Part::text("hi")).unwrap();
        assert_eq!(text, json!({"text": "hi"}));

        let inline = serde_json::to_value(Part::inline("image/png", &[1, 2, 3])).unwrap();
        assert_eq!(
            inline,
            json!({"inlineData": {"mimeType": "image/png", "data": "AQID"}})
        );
    }

    #[test]
    fn test_text_joins_parts() {
        let response = GenerateResponse::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "world"}]}}]
        }))
        .unwrap();
        assert_eq!(response.text().unwrap(), "Hello, world");
    }

    #[test]
    fn test_missing_candidates() {
        let response = GenerateResponse::from_value(json!({"promptFeedback": {}})).unwrap();
        assert!(matches!(response.text(), Err(YukkiError::InvalidResponse(_))));
        assert!(response.inline_data().is_err());
    }

    #[test]
    fn test_candidate_without_text() {
        let response = GenerateResponse::from_value(json!({
            "candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "audio/L16", "data": ""}}]}}]
        }))
        .unwrap();
        assert!(response.text().is_err());
        assert_eq!(response.inline_data().unwrap().mime_type, "audio/L16");
    }

    #[test]
    fn test_snake_case_alias() {
        let response = GenerateResponse::from_value(json!({
            "candidates": [{"content": {"parts": [{"inline_data": {"mime_type": "audio/L16;rate=8000", "data": "AAA="}}]}}]
        }))
        .unwrap();
        let data = response.inline_data().unwrap();
        assert_eq!(data.decode().unwrap(), vec![0, 0]);
    }

    #[test]
    fn test_bad_base64() {
        let data = InlineData {
            mime_type: "audio/L16".into(),
            data: "!!!".into(),
        };
        assert!(matches!(data.decode(), Err(YukkiError::InvalidResponse(_))));
    }
}
