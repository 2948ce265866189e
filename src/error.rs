#[derive(Debug, thiserror::Error)]
pub enum KoboldError {
    /// Underlying error from reqwest library after an API call was made
    #[error("http error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// The streaming endpoint answered with a non-success status before any token was read
    #[error("stream request failed with status {status}: {body}")]
    StreamRequestFailed { status: u16, body: String },
    /// A plain request/response call answered with a non-success status
    #[error("request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },
    /// The connection broke while a token stream was being read
    #[error("stream interrupted: {0}")]
    StreamInterrupted(#[source] std::io::Error),
    /// Error when a request cannot be serialized
    #[error("failed to serialize api request: {0}")]
    JSONSerialize(serde_json::Error),
    /// Error when a response cannot be deserialized into a Rust type
    #[error("failed to deserialize api response: {0}")]
    JSONDeserialize(serde_json::Error),
    /// Error from client side validation
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("server returned no generation results")]
    EmptyResults,
    /// Image or audio payload returned by the server is not valid base64
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Builder, url or logger setup failed
    #[error("client setup error: {0}")]
    Setup(String),
}

pub type Result<T, E = KoboldError> = std::result::Result<T, E>;

impl KoboldError {
    /// Status code carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::StreamRequestFailed { status, .. } | Self::RequestFailed { status, .. } => {
                Some(*status)
            }
            Self::Reqwest(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw response body carried by the error, for diagnostics.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::StreamRequestFailed { body, .. } | Self::RequestFailed { body, .. } => {
                Some(body.as_str())
            }
            _ => None,
        }
    }
}

pub(crate) fn map_deserialization_error(e: serde_json::Error, bytes: &[u8]) -> KoboldError {
    tracing::error!(
        "failed deserialization of: {}",
        String::from_utf8_lossy(bytes)
    );
    KoboldError::JSONDeserialize(e)
}

pub(crate) fn map_serialization_error(e: serde_json::Error) -> KoboldError {
    tracing::error!("failed serialization: {}", e);
    KoboldError::JSONSerialize(e)
}
