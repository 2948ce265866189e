//! Text generation: native blocking and streaming calls, the OpenAI
//! compatible completion route, and generation control by genkey.

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{
    client::KoboldClient,
    error::{KoboldError, Result},
    stream::{frame::FrameKind, TokenStream},
    types::{
        generation::{GenKeyRequest, GenerationRequest, GenerationResponse},
        openai::{OpenAiCompletionRequest, OpenAiCompletionResponse},
    },
};

pub const GENERATE_PATH: &str = "api/v1/generate";
pub const GENERATE_STREAM_PATH: &str = "api/extra/generate/stream";
pub const ABORT_PATH: &str = "api/extra/abort";
pub const GENERATE_CHECK_PATH: &str = "api/extra/generate/check";
pub const OPENAI_COMPLETIONS_PATH: &str = "v1/completions";

#[derive(Deserialize, Debug)]
struct AbortResponse {
    #[serde(default)]
    success: serde_json::Value,
}

impl KoboldClient {
    /// Generate the whole completion in one response.
    ///
    /// Fails with [`KoboldError::EmptyResults`] when the server answers
    /// without any result.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        request.validate()?;
        let response: GenerationResponse = self.api.post(GENERATE_PATH, request).await?;
        if response.results.is_empty() {
            crate::error!("Generate returned no results");
            return Err(KoboldError::EmptyResults);
        }
        Ok(response)
    }

    /// Stream tokens as the server produces them.
    ///
    /// The request is validated and sent with `"stream": true`; `request`
    /// itself is left as is. Non-success statuses fail here with
    /// [`KoboldError::StreamRequestFailed`] before any token is read.
    /// Cancelling `cancel` ends the returned stream without an error. It does
    /// not stop generation on the server; call
    /// [`abort_generate`](Self::abort_generate) for that.
    pub async fn generate_stream(
        &self,
        request: &GenerationRequest,
        cancel: CancellationToken,
    ) -> Result<TokenStream> {
        request.validate()?;
        self.api
            .post_stream(GENERATE_STREAM_PATH, request, FrameKind::Native, cancel)
            .await
    }

    /// Ask the server to stop the generation running under `genkey` (or the
    /// only one, when `None`). Returns whether the server reported success.
    pub async fn abort_generate(&self, genkey: Option<&str>) -> Result<bool> {
        let body = GenKeyRequest {
            genkey: genkey.map(str::to_string),
        };
        let response: AbortResponse = self.api.post(ABORT_PATH, &body).await?;
        let aborted = match &response.success {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::String(s) => s == "true",
            _ => false,
        };
        crate::debug!("Abort requested, success: {}", aborted);
        Ok(aborted)
    }

    /// Text generated so far by a running generation. Empty when nothing is
    /// pending.
    pub async fn pending_output(&self, genkey: Option<&str>) -> Result<String> {
        let body = GenKeyRequest {
            genkey: genkey.map(str::to_string),
        };
        let response: GenerationResponse = self.api.post(GENERATE_CHECK_PATH, &body).await?;
        Ok(response.text().unwrap_or_default().to_string())
    }

    /// Completion through the OpenAI compatible route. Returns the first
    /// choice's text.
    pub async fn openai_completion(&self, request: &OpenAiCompletionRequest) -> Result<String> {
        request.validate()?;
        let body = crate::codec::WithStream::new(request, false);
        let response: OpenAiCompletionResponse =
            self.api.post(OPENAI_COMPLETIONS_PATH, &body).await?;
        Ok(response.text())
    }

    /// Streaming variant of [`openai_completion`](Self::openai_completion),
    /// with the same reader semantics as
    /// [`generate_stream`](Self::generate_stream).
    pub async fn openai_completion_stream(
        &self,
        request: &OpenAiCompletionRequest,
        cancel: CancellationToken,
    ) -> Result<TokenStream> {
        request.validate()?;
        self.api
            .post_stream(
                OPENAI_COMPLETIONS_PATH,
                request,
                FrameKind::OpenAiCompletion,
                cancel,
            )
            .await
    }
}
