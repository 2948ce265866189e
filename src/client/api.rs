use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Serialize};
use tokio_util::{codec::FramedRead, io::StreamReader, sync::CancellationToken};
use url::Url;

use super::config::ApiConfig;
use crate::{
    codec::{self, CONTENT_TYPE_JSON},
    error::{KoboldError, Result},
    stream::{frame::FrameKind, line::BodyLineCodec, TokenStream},
};

pub const CONTENT_TYPE_EVENT_STREAM: &str = "text/event-stream";

#[derive(Debug, Clone)]
pub(crate) struct ApiClient {
    http_client: reqwest::Client,
    base_url: Url,
    pub config: ApiConfig,
    pub backoff: backoff::ExponentialBackoff,
}

impl ApiClient {
    pub fn new(http_client: reqwest::Client, base_url: Url, config: ApiConfig) -> Self {
        let backoff = backoff::ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(250))
            .with_max_elapsed_time(Some(config.retry_max_elapsed))
            .build();
        Self {
            http_client,
            base_url,
            config,
            backoff,
        }
    }

    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| KoboldError::Setup(format!("invalid endpoint path {path}: {e}")))
    }

    /// Make a GET request to {path} and deserialize the response body
    pub(crate) async fn get<O>(&self, path: &str) -> Result<O>
    where
        O: DeserializeOwned,
    {
        let bytes = self.get_raw(path).await?;
        codec::decode(&bytes)
    }

    /// Make a GET request to {path} and return the body as text
    pub(crate) async fn get_text(&self, path: &str) -> Result<String> {
        let bytes = self.get_raw(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn get_raw(&self, path: &str) -> Result<Bytes> {
        let url = self.url(path)?;
        let request_maker = || async {
            Ok(self
                .http_client
                .get(url.clone())
                .headers(self.config.headers())
                .build()?)
        };
        self.execute_raw(request_maker).await
    }

    /// Make a POST request to {path} and deserialize the response body
    pub(crate) async fn post<I, O>(&self, path: &str, request: &I) -> Result<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let url = self.url(path)?;
        let serialized_request = codec::encode(request)?;
        crate::trace!("Serialized request: {}", serialized_request);
        let request_maker = || async {
            Ok(self
                .http_client
                .post(url.clone())
                .headers(self.config.headers())
                .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
                .body(serialized_request.clone())
                .build()?)
        };
        let bytes = self.execute_raw(request_maker).await?;
        crate::trace!("Serialized response: {}", String::from_utf8_lossy(&bytes));
        codec::decode(&bytes)
    }

    /// Execute a HTTP request and retry while the server reports it is busy
    ///
    /// request_maker rebuilds the request for each attempt, since a
    /// `reqwest::Request` is consumed by `execute`.
    async fn execute_raw<M, Fut>(&self, request_maker: M) -> Result<Bytes>
    where
        M: Fn() -> Fut,
        Fut: core::future::Future<Output = Result<reqwest::Request>>,
    {
        let client = self.http_client.clone();

        backoff::future::retry(self.backoff.clone(), || async {
            let request = request_maker().await.map_err(backoff::Error::Permanent)?;
            let response = client
                .execute(request)
                .await
                .map_err(KoboldError::Reqwest)
                .map_err(backoff::Error::Permanent)?;

            let status = response.status();
            let bytes = response
                .bytes()
                .await
                .map_err(KoboldError::Reqwest)
                .map_err(backoff::Error::Permanent)?;

            if !status.is_success() {
                let err = KoboldError::RequestFailed {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                };
                if is_busy(status) {
                    crate::warn!("Server busy, retrying: {}", err);
                    return Err(backoff::Error::Transient {
                        err,
                        retry_after: None,
                    });
                }
                crate::error!("{}", err);
                return Err(backoff::Error::Permanent(err));
            }

            crate::debug!("Response status: {}", status);
            Ok(bytes)
        })
        .await
    }

    /// Status check without retries or body decoding.
    pub(crate) async fn probe(&self, path: &str) -> Result<bool> {
        let response = self
            .http_client
            .get(self.url(path)?)
            .headers(self.config.headers())
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    /// POST {path} asking for an event stream and hand the body to a
    /// [`TokenStream`] once the headers are in.
    ///
    /// Never retried. Cancellation observed before the headers arrive yields
    /// an empty stream.
    pub(crate) async fn post_stream<I>(
        &self,
        path: &str,
        request: &I,
        kind: FrameKind,
        cancel: CancellationToken,
    ) -> Result<TokenStream>
    where
        I: Serialize + ?Sized,
    {
        let serialized_request = codec::encode(&codec::WithStream::new(request, true))?;
        crate::trace!("Serialized stream request: {}", serialized_request);

        let pending = self
            .http_client
            .post(self.url(path)?)
            .headers(self.config.headers())
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(ACCEPT, CONTENT_TYPE_EVENT_STREAM)
            .body(serialized_request)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                crate::debug!("Stream cancelled while awaiting headers");
                return Ok(TokenStream::empty());
            }
            response = pending => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = KoboldError::StreamRequestFailed {
                status: status.as_u16(),
                body,
            };
            crate::error!("{}", err);
            return Err(err);
        }
        crate::debug!("Stream opened with status {}", status);

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other));
        let lines = FramedRead::new(StreamReader::new(bytes), BodyLineCodec::new());

        Ok(TokenStream::from_lines(lines, kind, cancel))
    }
}

/// KoboldCpp answers 503 while another generation holds the lock.
fn is_busy(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
}
