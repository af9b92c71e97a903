//! Task handlers.
//!
//! Real model inference is out of scope here. Handlers are deterministic
//! mock implementations that validate their typed payload and return a
//! schema-correct, fabricated result — the handler *contract* is real and
//! tested; the model weights behind it are not this crate's concern.

use serde_json::json;

use crate::error::PoolError;
use crate::model::WorkerKind;
use crate::payload::{ClonePayload, HfTtsPayload, SttPayload, TtsPayload, VllmPayload};

/// A per-kind task executor, constructed once per worker process and reused
/// across every task the worker dequeues.
pub trait Handler: Send {
    fn call(&mut self, payload: &serde_json::Value) -> Result<serde_json::Value, PoolError>;
}

/// Raised by a [`HandlerFactory`] when a handler cannot be constructed.
/// This is terminal for the worker process: it is not a per-task error.
#[derive(Debug, thiserror::Error)]
#[error("handler initialization failed: {0}")]
pub struct HandlerInitError(pub String);

pub type HandlerFactory = fn() -> Result<Box<dyn Handler>, HandlerInitError>;

/// Looks up the handler factory bound to a [`WorkerKind`]. A typed table
/// rather than a string-keyed branch-on-kind: adding a kind is a one-line
/// entry here plus a `Handler` implementation.
pub fn factory_for(kind: WorkerKind) -> HandlerFactory {
    match kind {
        WorkerKind::Stt => || Ok(Box::new(SttHandler) as Box<dyn Handler>),
        WorkerKind::Tts => || Ok(Box::new(TtsHandler) as Box<dyn Handler>),
        WorkerKind::HfTts => || Ok(Box::new(HfTtsHandler) as Box<dyn Handler>),
        WorkerKind::Vllm => || Ok(Box::new(VllmHandler) as Box<dyn Handler>),
        WorkerKind::Clone => || Ok(Box::new(CloneHandler::default()) as Box<dyn Handler>),
    }
}

struct SttHandler;

impl Handler for SttHandler {
    fn call(&mut self, payload: &serde_json::Value) -> Result<serde_json::Value, PoolError> {
        let p: SttPayload = serde_json::from_value(payload.clone())
            .map_err(|e| PoolError::InvalidPayload { kind: WorkerKind::Stt, reason: e.to_string() })?;
        let decoded_len = base64_decoded_len(&p.audio);
        Ok(json!({
            "transcript": format!("[mock transcript, {} bytes of audio, lang={}]", decoded_len, p.language),
            "language": p.language,
        }))
    }
}

struct TtsHandler;

impl Handler for TtsHandler {
    fn call(&mut self, payload: &serde_json::Value) -> Result<serde_json::Value, PoolError> {
        let p: TtsPayload = serde_json::from_value(payload.clone())
            .map_err(|e| PoolError::InvalidPayload { kind: WorkerKind::Tts, reason: e.to_string() })?;
        Ok(json!({
            "audio": mock_audio_base64(p.text.len()),
            "voice": p.voice.unwrap_or_else(|| "default".to_string()),
            "speed": p.speed.unwrap_or(1.0),
        }))
    }
}

struct HfTtsHandler;

impl Handler for HfTtsHandler {
    fn call(&mut self, payload: &serde_json::Value) -> Result<serde_json::Value, PoolError> {
        let p: HfTtsPayload = serde_json::from_value(payload.clone())
            .map_err(|e| PoolError::InvalidPayload { kind: WorkerKind::HfTts, reason: e.to_string() })?;
        Ok(json!({
            "audio": mock_audio_base64(p.text.len() + p.voice_prompt.len()),
            "format": "wav",
            "sample_rate": 24_000,
        }))
    }
}

struct VllmHandler;

impl Handler for VllmHandler {
    fn call(&mut self, payload: &serde_json::Value) -> Result<serde_json::Value, PoolError> {
        let _: VllmPayload = VllmPayload(payload.clone());
        let prompt = payload.get("prompt").and_then(|v| v.as_str()).unwrap_or("");
        Ok(json!({
            "text": format!("[mock completion for prompt of {} chars]", prompt.len()),
            "finish_reason": "stop",
        }))
    }
}

#[derive(Default)]
struct CloneHandler {
    next_id: u32,
}

impl Handler for CloneHandler {
    fn call(&mut self, payload: &serde_json::Value) -> Result<serde_json::Value, PoolError> {
        let action: ClonePayload = serde_json::from_value(payload.clone()).map_err(|_| {
            PoolError::InvalidPayload {
                kind: WorkerKind::Clone,
                reason: format!(
                    "Unknown voice cloning action: {}",
                    payload.get("action").and_then(|v| v.as_str()).unwrap_or("<missing>")
                ),
            }
        })?;

        Ok(match action {
            ClonePayload::CreateInstant { name, .. } => {
                self.next_id += 1;
                json!({"clone_id": format!("instant-{}", self.next_id), "name": name, "kind": "instant"})
            }
            ClonePayload::CreateProfessional { name, audio_samples } => {
                self.next_id += 1;
                json!({
                    "clone_id": format!("pro-{}", self.next_id),
                    "name": name,
                    "kind": "professional",
                    "samples_used": audio_samples.len(),
                })
            }
            ClonePayload::CreateSynthetic { name, description } => {
                self.next_id += 1;
                json!({
                    "clone_id": format!("synthetic-{}", self.next_id),
                    "name": name,
                    "description": description,
                    "kind": "synthetic",
                })
            }
            ClonePayload::GetStatus { clone_id } => {
                json!({"clone_id": clone_id, "status": "ready"})
            }
        })
    }
}

fn base64_decoded_len(s: &str) -> usize {
    (s.len() * 3) / 4
}

fn mock_audio_base64(seed: usize) -> String {
    use std::fmt::Write;
    let mut hex = String::new();
    for i in 0..16 {
        let _ = write!(hex, "{:02x}", (seed.wrapping_add(i)) % 256);
    }
    format!("bW9jay1hdWRpbw_{hex}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stt_handler_returns_transcript() {
        let mut h = (factory_for(WorkerKind::Stt))().unwrap();
        let out = h.call(&json!({"audio": "AAAA", "language": "en"})).unwrap();
        assert!(out["transcript"].as_str().unwrap().contains("lang=en"));
    }

    #[test]
    fn tts_handler_defaults_voice_and_speed() {
        let mut h = (factory_for(WorkerKind::Tts))().unwrap();
        let out = h.call(&json!({"text": "hello", "model": "m1"})).unwrap();
        assert_eq!(out["voice"], "default");
        assert_eq!(out["speed"], 1.0);
    }

    #[test]
    fn clone_handler_rejects_unknown_action() {
        let mut h = (factory_for(WorkerKind::Clone))().unwrap();
        let err = h.call(&json!({"action": "bogus"})).unwrap_err();
        assert!(err.to_string().contains("Unknown voice cloning action"));
    }

    #[test]
    fn clone_handler_create_instant_assigns_id() {
        let mut h = (factory_for(WorkerKind::Clone))().unwrap();
        let out = h
            .call(&json!({"action": "create_instant", "name": "alice", "audio": "AAAA"}))
            .unwrap();
        assert_eq!(out["kind"], "instant");
    }
}
