//! Server-sent-event token reader.
//!
//! A [`TokenStream`] walks the response body one line at a time and yields
//! the text of every `data: ` frame that carries a non-empty token. It ends
//! on `data: [DONE]`, on end of body, or as soon as its
//! [`CancellationToken`] fires. A broken connection surfaces once as
//! [`KoboldError::StreamInterrupted`] and ends the stream; tokens already
//! yielded stand.

pub mod frame;
pub mod line;

use std::{
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::{KoboldError, Result};
use frame::{FrameKind, SseLine};

/// Pause taken on a keep-alive line before reading on.
pub const HEARTBEAT_PAUSE: Duration = Duration::from_millis(50);

type BoxedTokens = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[must_use = "streams do nothing unless polled"]
pub struct TokenStream {
    inner: BoxedTokens,
}

impl TokenStream {
    /// Reader over any source of body lines. The HTTP path feeds it a
    /// `FramedRead<_, BodyLineCodec>`; tests feed it canned lines.
    pub fn from_lines<L>(lines: L, kind: FrameKind, cancel: CancellationToken) -> Self
    where
        L: Stream<Item = std::io::Result<String>> + Send + 'static,
    {
        let inner = async_stream::stream! {
            let mut lines = std::pin::pin!(lines);
            loop {
                if cancel.is_cancelled() {
                    crate::debug!("Token stream cancelled");
                    break;
                }
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        crate::debug!("Token stream cancelled while reading");
                        break;
                    }
                    next = lines.next() => next,
                };
                let line = match next {
                    None => {
                        crate::debug!("Token stream reached end of body");
                        break;
                    }
                    Some(Err(e)) => {
                        crate::error!("Token stream interrupted: {}", e);
                        yield Err(KoboldError::StreamInterrupted(e));
                        break;
                    }
                    Some(Ok(line)) => line,
                };
                crate::trace!("Stream line: {:?}", line);

                match SseLine::parse(&line) {
                    SseLine::Heartbeat => {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {
                                crate::debug!("Token stream cancelled during heartbeat");
                                break;
                            }
                            _ = tokio::time::sleep(HEARTBEAT_PAUSE) => {}
                        }
                    }
                    SseLine::Ignored => {}
                    SseLine::Done => {
                        crate::debug!("Token stream received [DONE]");
                        break;
                    }
                    SseLine::Data(payload) => {
                        if let Some(token) = kind.decode(payload) {
                            crate::debug!("Token: {:?}", token);
                            yield Ok(token);
                        }
                    }
                }
            }
        };
        Self {
            inner: Box::pin(inner),
        }
    }

    /// A stream that ends immediately.
    pub fn empty() -> Self {
        Self {
            inner: Box::pin(futures::stream::empty()),
        }
    }

    /// Drains the stream and concatenates every token.
    pub async fn collect_text(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(token) = self.next().await {
            text.push_str(&token?);
        }
        Ok(text)
    }
}

impl Stream for TokenStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStream").finish_non_exhaustive()
    }
}
