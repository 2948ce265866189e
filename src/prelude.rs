pub use crate::{
    client::config::{ApiConfig, KoboldApiConfigTrait},
    error::{KoboldError, Result},
    logging::LoggingConfigTrait,
    stream::TokenStream,
    types::{generation::GenerationRequest, openai::OpenAiCompletionRequest},
    KoboldClient,
};
pub use futures::StreamExt;
#[cfg(test)]
pub use serial_test::serial;
pub use tokio_util::sync::CancellationToken;
