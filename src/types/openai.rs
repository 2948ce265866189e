use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{KoboldError, Result};

/// Body of the OpenAI compatible `v1/completions` route.
///
/// As with [`GenerationRequest`](super::generation::GenerationRequest), the
/// `stream` flag is added by the call, not stored here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Builder)]
#[builder(derive(Debug, Clone))]
pub struct OpenAiCompletionRequest {
    /// KoboldCpp serves one model and ignores the name.
    #[builder(into, default = "koboldcpp".to_string())]
    pub model: String,

    #[builder(into)]
    pub prompt: String,

    #[builder(default = 80)]
    pub max_tokens: u32,

    #[builder(default = 0.7)]
    pub temperature: f32,

    #[builder(default = 0.9)]
    pub top_p: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

impl OpenAiCompletionRequest {
    pub fn new<S: Into<String>>(prompt: S) -> Self {
        Self::builder().prompt(prompt).build()
    }

    pub fn validate(&self) -> Result<()> {
        if self.prompt.is_empty() {
            return Err(KoboldError::InvalidRequest(
                "prompt cannot be empty".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(KoboldError::InvalidRequest(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(KoboldError::InvalidRequest(
                "temperature must be non-negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(KoboldError::InvalidRequest(
                "top_p must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct OpenAiCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<OpenAiCompletionChoice>,
}

impl OpenAiCompletionResponse {
    /// Text of the first choice, empty when there is none.
    pub fn text(&self) -> String {
        self.choices
            .first()
            .map(|c| c.text.clone())
            .unwrap_or_default()
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct OpenAiCompletionChoice {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub finish_reason: Option<String>,
}
