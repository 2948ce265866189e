use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::{client::KoboldClient, error::Result};

/// Speech to text through the server's Whisper model.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TranscribeRequest {
    /// Base64 encoded audio, 16 kHz WAV works best.
    pub audio_data: String,
    /// Text that primes the transcription, such as expected vocabulary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub suppress_non_speech: bool,
}

impl TranscribeRequest {
    pub fn from_bytes(audio: &[u8]) -> Self {
        Self {
            audio_data: STANDARD.encode(audio),
            prompt: None,
            suppress_non_speech: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TranscribeResponse {
    pub text: String,
}

impl KoboldClient {
    pub async fn transcribe(&self, request: &TranscribeRequest) -> Result<TranscribeResponse> {
        self.api.post("api/extra/transcribe", request).await
    }
}
