use std::{collections::HashMap, ops::Not};

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{KoboldError, Result};

/// Body of the native generate routes (`api/v1/generate`,
/// `api/extra/generate/stream`).
///
/// There is no `stream` field: the streaming call adds `"stream": true` to the
/// wire body itself, leaving this value untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Builder)]
#[builder(derive(Debug, Clone))]
pub struct GenerationRequest {
    /// Text the model continues from. Must not be empty.
    #[builder(into)]
    pub prompt: String,

    /// Number of tokens to generate. Must be greater than zero.
    #[builder(default = 80)]
    pub max_length: u32,

    /// Overrides the context size the server was launched with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_context_length: Option<u32>,

    /// Sampling temperature. Must be finite and non-negative.
    #[builder(default = 0.7)]
    pub temperature: f32,

    /// Nucleus sampling threshold in `[0, 1]`.
    #[builder(default = 0.9)]
    pub top_p: f32,

    #[builder(default = 40)]
    pub top_k: u32,

    #[builder(default = 0.0)]
    pub top_a: f32,

    /// Minimum probability relative to the top token, in `[0, 1]`.
    #[builder(default = 0.0)]
    pub min_p: f32,

    #[builder(default = 1.0)]
    pub typical: f32,

    /// Tail free sampling.
    #[builder(default = 1.0)]
    pub tfs: f32,

    /// Repetition penalty.
    #[builder(default = 1.1)]
    pub rep_pen: f32,

    /// How many trailing tokens the repetition penalty looks at.
    #[builder(default = 320)]
    pub rep_pen_range: u32,

    #[builder(default = 1.0)]
    pub rep_pen_slope: f32,

    #[builder(default = 0.0)]
    pub presence_penalty: f32,

    /// 0 disables mirostat, 1 and 2 select the algorithm version.
    #[builder(default = 0)]
    pub mirostat: u8,

    #[builder(default = 5.0)]
    pub mirostat_tau: f32,

    #[builder(default = 0.1)]
    pub mirostat_eta: f32,

    /// Strings that end generation when produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequence: Option<Vec<String>>,

    /// Strip the matched stop sequence from the output.
    #[builder(default = true)]
    pub trim_stop: bool,

    /// GBNF grammar constraining the output.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub grammar: Option<String>,

    #[serde(default, skip_serializing_if = "<&bool>::not")]
    #[builder(default)]
    pub grammar_retain_state: bool,

    /// Text always kept at the top of the context.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub memory: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub banned_tokens: Option<Vec<String>>,

    /// Token id (as a string) to bias.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<HashMap<String, f32>>,

    /// Base64 encoded images for vision models.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,

    /// `-1` picks a random seed.
    #[builder(default = -1)]
    pub seed: i64,

    /// Stop the server from printing the prompt and output to its console.
    #[serde(default, skip_serializing_if = "<&bool>::not")]
    #[builder(default)]
    pub quiet: bool,

    #[builder(default = true)]
    pub allow_eos_token: bool,

    #[serde(default, skip_serializing_if = "<&bool>::not")]
    #[builder(default)]
    pub bypass_eos_token: bool,

    #[serde(default, skip_serializing_if = "<&bool>::not")]
    #[builder(default)]
    pub render_special: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampler_order: Option<Vec<u8>>,

    #[builder(default = 0.0)]
    pub dynatemp_range: f32,

    #[builder(default = 1.0)]
    pub dynatemp_exponent: f32,

    #[builder(default = 0.0)]
    pub smoothing_factor: f32,

    /// Key identifying this generation for `abort_generate` and
    /// `pending_output` on a multi-user server.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub genkey: Option<String>,
}

impl GenerationRequest {
    /// Request with every sampler at its default.
    pub fn new<S: Into<String>>(prompt: S) -> Self {
        Self::builder().prompt(prompt).build()
    }

    /// Client side checks run before any generate call touches the network.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.is_empty() {
            return Err(invalid("prompt cannot be empty"));
        }
        if self.max_length == 0 {
            return Err(invalid("max_length must be greater than 0"));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(invalid("temperature must be non-negative"));
        }
        check_unit("top_p", self.top_p)?;
        check_unit("min_p", self.min_p)?;
        Ok(())
    }
}

fn check_unit(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(&format!("{name} must be between 0 and 1")))
    }
}

fn invalid(msg: &str) -> KoboldError {
    KoboldError::InvalidRequest(msg.to_string())
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    #[serde(default)]
    pub results: Vec<GenerationResult>,
}

impl GenerationResponse {
    /// Text of the first result.
    pub fn text(&self) -> Option<&str> {
        self.results.first().map(|r| r.text.as_str())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GenerationResult {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Body of `api/extra/abort` and `api/extra/generate/check`.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct GenKeyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genkey: Option<String>,
}
