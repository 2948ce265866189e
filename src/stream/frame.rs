use serde::Deserialize;

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";

/// One line of an event-stream body, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// Blank or whitespace-only keep-alive.
    Heartbeat,
    /// Payload following `data: `.
    Data(&'a str),
    /// `data: [DONE]`
    Done,
    /// Comments, `event:` lines and anything else.
    Ignored,
}

impl<'a> SseLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            return SseLine::Heartbeat;
        }
        match line.strip_prefix(DATA_PREFIX) {
            Some(payload) if payload.trim() == DONE_SENTINEL => SseLine::Done,
            Some(payload) => SseLine::Data(payload),
            None => SseLine::Ignored,
        }
    }
}

/// Token frame sent by `api/extra/generate/stream`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamFrame {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiCompletionFrame {
    #[serde(default)]
    choices: Vec<OpenAiCompletionFrameChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiCompletionFrameChoice {
    #[serde(default)]
    text: Option<String>,
}

/// Which payload shape the `data: ` lines carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// `{"token": "...", "finish_reason": ...}`
    Native,
    /// `{"choices": [{"text": "..."}]}` from `v1/completions`.
    OpenAiCompletion,
}

impl FrameKind {
    /// Token carried by `payload`, or `None` when the frame is malformed or
    /// has nothing to yield. Malformed frames are logged and never fail.
    pub fn decode(self, payload: &str) -> Option<String> {
        let token = match self {
            FrameKind::Native => match serde_json::from_str::<StreamFrame>(payload) {
                Ok(frame) => {
                    if let Some(reason) = &frame.finish_reason {
                        crate::debug!("Stream frame finish_reason: {}", reason);
                    }
                    frame.token
                }
                Err(e) => {
                    crate::warn!("Skipping malformed stream frame {:?}: {}", payload, e);
                    return None;
                }
            },
            FrameKind::OpenAiCompletion => {
                match serde_json::from_str::<OpenAiCompletionFrame>(payload) {
                    Ok(frame) => frame.choices.into_iter().next().and_then(|c| c.text),
                    Err(e) => {
                        crate::warn!("Skipping malformed completion frame {:?}: {}", payload, e);
                        return None;
                    }
                }
            }
        };
        token.filter(|t| !t.is_empty())
    }
}
