//! kobold_client – typed async client for [KoboldCpp](https://github.com/LostRuins/koboldcpp)
//! ===========================================================================================
//!
//! ## Streaming First
//! - **Token streams** – [`KoboldClient::generate_stream`] returns a [`TokenStream`] that yields
//!   decoded tokens as the server emits them over server-sent events.
//! - **Cooperative cancellation** – Every stream observes a [`CancellationToken`]; cancelling stops
//!   the read loop promptly without draining the body.
//! - **Forgiving reader** – A malformed frame is logged and skipped, it never aborts a healthy stream.
//!
//! ## Fully Typed
//! - **Requests** – [`GenerationRequest`] carries every KoboldCpp sampler knob behind a `bon` builder
//!   and is validated before anything touches the network.
//! - **Errors** – One error type, [`KoboldError`], carries status code and body for failed calls.
//!
//! ---
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use kobold_client::*;
//!
//! #[tokio::main]
//! async fn main() -> kobold_client::Result<()> {
//!     let client = KoboldClient::builder()
//!         .with_base_url("http://localhost:5001")
//!         .init()?;
//!
//!     let request = GenerationRequest::builder()
//!         .prompt("Tell me a joke about Rust.")
//!         .max_length(64)
//!         .build();
//!
//!     let mut tokens = client
//!         .generate_stream(&request, CancellationToken::new())
//!         .await?;
//!     while let Some(token) = tokens.next().await {
//!         print!("{}", token?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ### Endpoints ⇄ Typed Helpers
//! | HTTP Route                            | Helper on `KoboldClient`     | Request type                | Response type              |
//! |---------------------------------------|------------------------------|-----------------------------|----------------------------|
//! | `POST /api/extra/generate/stream`     | `generate_stream()`          | [`GenerationRequest`]       | [`TokenStream`]            |
//! | `POST /api/v1/generate`               | `generate()`                 | [`GenerationRequest`]       | [`GenerationResponse`]     |
//! | `POST /api/extra/abort`               | `abort_generate()`           | genkey                      | `bool`                     |
//! | `POST /api/extra/generate/check`      | `pending_output()`           | genkey                      | `String`                   |
//! | `POST /api/extra/tokencount`          | `count_tokens()`             | [`CountTokensRequest`]      | [`CountTokensResponse`]    |
//! | `POST /api/extra/detokenize`          | `detokenize()`               | [`DetokenizeRequest`]       | [`DetokenizeResponse`]     |
//! | `GET  /api/extra/last_logprobs`       | `last_logprobs()`            | –                           | [`LastLogProbsResponse`]   |
//! | `GET  /api/v1/model` …                | `model_info()` …             | –                           | [`ModelInfo`] …            |
//! | `/api/extra/multiplayer/*`            | `multiplayer_*()`            | see [`endpoints::multiplayer`] |                         |
//! | `/sdapi/v1/*`                         | `text_to_image()` …          | see [`endpoints::image`]    |                            |
//! | `POST /api/extra/transcribe`          | `transcribe()`               | [`TranscribeRequest`]       | [`TranscribeResponse`]     |
//! | `POST /api/extra/websearch`           | `web_search()`               | query                       | `Vec<WebSearchResult>`     |
//! | `POST /v1/completions`                | `openai_completion*()`       | [`OpenAiCompletionRequest`] | `String` / [`TokenStream`] |

#[allow(unused_imports)]
pub(crate) use tracing::{debug, error, info, span, trace, warn, Level};

pub mod client;
pub mod codec;
pub mod endpoints;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod stream;
pub mod types;

pub use client::{
    config::{ApiConfig, KoboldApiConfigTrait},
    KoboldClient, KoboldClientBuilder,
};
pub use endpoints::{image::*, info::*, multiplayer::*, tokens::*, transcribe::*, web_search::*};
pub use error::{KoboldError, Result};
pub use logging::{LoggingConfig, LoggingConfigTrait};
pub use stream::{
    frame::{FrameKind, SseLine, StreamFrame},
    TokenStream,
};
pub use tokio_util::sync::CancellationToken;
pub use types::{generation::*, openai::*};
