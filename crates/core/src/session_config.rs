//! The `session.update` negotiation message sent upstream right after connect.
//!
//! Each [`RelayMode`] maps to one fixed [`SessionConfig`]. Voice-only fields are
//! optional and skipped on serialization, so the text configuration never carries
//! audio settings.

use crate::mode::RelayMode;
use serde::Serialize;

const VOICE_INSTRUCTIONS: &str = "你是一個友善且充滿活力的AI助手。請務必用繁體中文進行對話，語調自然流暢。請快速且簡潔地回應，避免過長的回答。";
const TEXT_INSTRUCTIONS: &str = "你是一個友善且充滿活力的AI助手。請務必用繁體中文進行對話。你可以使用 Markdown 格式來美化回應內容，包括標題、列表、程式碼區塊等。回應要詳細且有用。";

/// Messages the relay itself originates towards the upstream provider.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionConfig },
}

impl ClientEvent {
    /// Serializes the event into the text frame sent upstream.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Audio,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Alloy,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Pcm16,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AudioTranscription {
    pub model: String,
    pub language: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnDetection {
    ServerVad {
        threshold: f64,
        prefix_padding_ms: u32,
        silence_duration_ms: u32,
    },
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    None,
}

/// The `session` body of a `session.update` event.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub modalities: Vec<Modality>,
    pub instructions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<Voice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<AudioFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<AudioFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<AudioTranscription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,
    pub temperature: f64,
    pub max_response_output_tokens: u32,
    /// Always empty: tool calling is disabled.
    pub tools: Vec<serde_json::Value>,
    pub tool_choice: ToolChoice,
}

impl SessionConfig {
    pub fn for_mode(mode: RelayMode) -> Self {
        match mode {
            RelayMode::Voice => Self::voice(),
            RelayMode::Text => Self::text(),
        }
    }

    fn voice() -> Self {
        Self {
            modalities: vec![Modality::Text, Modality::Audio],
            instructions: VOICE_INSTRUCTIONS.to_string(),
            voice: Some(Voice::Alloy),
            input_audio_format: Some(AudioFormat::Pcm16),
            output_audio_format: Some(AudioFormat::Pcm16),
            input_audio_transcription: Some(AudioTranscription {
                model: "whisper-1".to_string(),
                language: "zh".to_string(),
            }),
            turn_detection: Some(TurnDetection::ServerVad {
                threshold: 0.6,
                prefix_padding_ms: 200,
                silence_duration_ms: 150,
            }),
            temperature: 0.7,
            max_response_output_tokens: 2048,
            tools: Vec::new(),
            tool_choice: ToolChoice::None,
        }
    }

    fn text() -> Self {
        Self {
            modalities: vec![Modality::Text],
            instructions: TEXT_INSTRUCTIONS.to_string(),
            voice: None,
            input_audio_format: None,
            output_audio_format: None,
            input_audio_transcription: None,
            turn_detection: None,
            temperature: 0.8,
            max_response_output_tokens: 4096,
            tools: Vec::new(),
            tool_choice: ToolChoice::None,
        }
    }
}

/// Builds the negotiation envelope for `mode`.
pub fn session_update(mode: RelayMode) -> ClientEvent {
    ClientEvent::SessionUpdate {
        session: SessionConfig::for_mode(mode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn as_value(mode: RelayMode) -> Value {
        let text = session_update(mode).to_json().unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_voice_session_update_literals() {
        let value = as_value(RelayMode::Voice);
        assert_eq!(value["type"], "session.update");

        let session = &value["session"];
        assert_eq!(session["modalities"], json!(["text", "audio"]));
        assert_eq!(session["instructions"], VOICE_INSTRUCTIONS);
        assert_eq!(session["voice"], "alloy");
        assert_eq!(session["input_audio_format"], "pcm16");
        assert_eq!(session["output_audio_format"], "pcm16");
        assert_eq!(
            session["input_audio_transcription"],
            json!({"model": "whisper-1", "language": "zh"})
        );
        assert_eq!(
            session["turn_detection"],
            json!({
                "type": "server_vad",
                "threshold": 0.6,
                "prefix_padding_ms": 200,
                "silence_duration_ms": 150
            })
        );
        assert_eq!(session["temperature"], json!(0.7));
        assert_eq!(session["max_response_output_tokens"], 2048);
        assert_eq!(session["tools"], json!([]));
        assert_eq!(session["tool_choice"], "none");
    }

    #[test]
    fn test_text_session_update_omits_voice_fields() {
        let value = as_value(RelayMode::Text);
        let session = value["session"].as_object().unwrap();

        let mut keys: Vec<&str> = session.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "instructions",
                "max_response_output_tokens",
                "modalities",
                "temperature",
                "tool_choice",
                "tools",
            ]
        );
        assert_eq!(session["modalities"], json!(["text"]));
        assert_eq!(session["instructions"], TEXT_INSTRUCTIONS);
        assert_eq!(session["temperature"], json!(0.8));
        assert_eq!(session["max_response_output_tokens"], 4096);
    }

    #[test]
    fn test_temperature_serializes_exactly() {
        let text = session_update(RelayMode::Voice).to_json().unwrap();
        assert!(text.contains("\"temperature\":0.7"));
        assert!(text.contains("\"threshold\":0.6"));
    }

    #[test]
    fn test_session_update_is_deterministic() {
        assert_eq!(
            session_update(RelayMode::Text),
            session_update(RelayMode::Text)
        );
        assert_ne!(
            session_update(RelayMode::Voice),
            session_update(RelayMode::Text)
        );
    }
}
