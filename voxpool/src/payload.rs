//! Per-kind typed payload schemas.
//!
//! The untyped `data` field on a submitted task is validated once, at the
//! worker boundary, before any handler ever sees it. A validation failure
//! becomes an `error` [`crate::wire::WireResult`], never a panic.

use serde::{Deserialize, Serialize};

use crate::error::PoolError;
use crate::model::WorkerKind;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SttPayload {
    pub audio: String,
    pub language: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TtsPayload {
    pub text: String,
    pub model: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub speed: Option<f32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HfTtsPayload {
    pub text: String,
    pub model: String,
    pub voice_prompt: String,
}

/// Free-form generation request; `vllm` payloads are deliberately untyped
/// since the request shape is model-specific rather than fixed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VllmPayload(pub serde_json::Value);

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClonePayload {
    CreateInstant {
        name: String,
        audio: String,
    },
    CreateProfessional {
        name: String,
        audio_samples: Vec<String>,
    },
    CreateSynthetic {
        name: String,
        description: String,
    },
    GetStatus {
        clone_id: String,
    },
}

/// Validates and deserializes a kind's opaque JSON payload into its typed
/// schema. Errors become `InvalidPayload`, surfaced as an `error`
/// `WireResult` by the worker loop rather than propagated up.
pub fn validate(kind: WorkerKind, payload: &serde_json::Value) -> Result<(), PoolError> {
    let invalid = |reason: String| PoolError::InvalidPayload { kind, reason };

    match kind {
        WorkerKind::Stt => {
            serde_json::from_value::<SttPayload>(payload.clone()).map_err(|e| invalid(e.to_string()))?;
        }
        WorkerKind::Tts => {
            serde_json::from_value::<TtsPayload>(payload.clone()).map_err(|e| invalid(e.to_string()))?;
        }
        WorkerKind::HfTts => {
            serde_json::from_value::<HfTtsPayload>(payload.clone())
                .map_err(|e| invalid(e.to_string()))?;
        }
        WorkerKind::Vllm => {
            if !payload.is_object() {
                return Err(invalid("vllm payload must be a JSON object".to_string()));
            }
        }
        WorkerKind::Clone => {
            serde_json::from_value::<ClonePayload>(payload.clone()).map_err(|_| {
                invalid(format!(
                    "Unknown voice cloning action: {}",
                    payload
                        .get("action")
                        .and_then(|v| v.as_str())
                        .unwrap_or("<missing>")
                ))
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stt_payload_requires_audio_and_language() {
        let ok = json!({"audio": "AAAA", "language": "en"});
        assert!(validate(WorkerKind::Stt, &ok).is_ok());

        let missing = json!({"audio": "AAAA"});
        assert!(validate(WorkerKind::Stt, &missing).is_err());
    }

    #[test]
    fn tts_payload_optional_fields_default() {
        let minimal = json!({"text": "hi", "model": "m1"});
        assert!(validate(WorkerKind::Tts, &minimal).is_ok());
    }

    #[test]
    fn vllm_payload_accepts_any_object() {
        let req = json!({"prompt": "hello", "max_tokens": 16});
        assert!(validate(WorkerKind::Vllm, &req).is_ok());

        let not_object = json!("just a string");
        assert!(validate(WorkerKind::Vllm, &not_object).is_err());
    }

    #[test]
    fn clone_payload_rejects_unknown_action() {
        let bogus = json!({"action": "bogus"});
        let err = validate(WorkerKind::Clone, &bogus).unwrap_err();
        assert!(err.to_string().contains("Unknown voice cloning action"));
    }

    #[test]
    fn clone_payload_accepts_get_status() {
        let req = json!({"action": "get_status", "clone_id": "c1"});
        assert!(validate(WorkerKind::Clone, &req).is_ok());
    }
}
