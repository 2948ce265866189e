use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{client::KoboldClient, error::Result};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CountTokensRequest {
    pub prompt: String,
    /// Count special tokens such as BOS.
    pub special: bool,
}

impl CountTokensRequest {
    pub fn new<S: Into<String>>(prompt: S) -> Self {
        Self {
            prompt: prompt.into(),
            special: true,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CountTokensResponse {
    pub value: usize,
    pub ids: Vec<u32>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DetokenizeRequest {
    pub ids: Vec<u32>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DetokenizeResponse {
    pub result: String,
    pub success: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LastLogProbsResponse {
    pub logprobs: Option<LogProbs>,
}

/// Log probabilities of the last generation, in both the chat style
/// `content` list and the legacy completion arrays.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LogProbs {
    pub content: Vec<LogProbItem>,
    pub tokens: Vec<String>,
    pub token_logprobs: Vec<f32>,
    pub top_logprobs: Vec<HashMap<String, f32>>,
    pub text_offset: Vec<u32>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LogProbItem {
    pub token: String,
    pub logprob: f32,
    pub bytes: Vec<u8>,
    pub top_logprobs: Vec<TopLogProb>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TopLogProb {
    pub token: String,
    pub logprob: f32,
    pub bytes: Vec<u8>,
}

impl KoboldClient {
    pub async fn count_tokens(&self, request: &CountTokensRequest) -> Result<CountTokensResponse> {
        self.api.post("api/extra/tokencount", request).await
    }

    pub async fn detokenize(&self, request: &DetokenizeRequest) -> Result<DetokenizeResponse> {
        self.api.post("api/extra/detokenize", request).await
    }

    pub async fn last_logprobs(&self) -> Result<LastLogProbsResponse> {
        self.api.get("api/extra/last_logprobs").await
    }
}
