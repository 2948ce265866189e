//! Shared story editing for KoboldAI Lite multiplayer sessions.

use serde::{Deserialize, Serialize};

use crate::{client::KoboldClient, error::Result};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MultiplayerStatusRequest {
    pub sender: String,
    #[serde(rename = "senderbusy")]
    pub sender_busy: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MultiplayerStatusResponse {
    pub turn_major: i64,
    pub turn_minor: i64,
    pub idle: bool,
    pub data_format: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MultiplayerStoryRequest {
    /// Replace the whole story rather than append.
    pub full_update: bool,
    pub data_format: String,
    pub sender: String,
    pub data: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MultiplayerStoryResponse {
    pub success: bool,
    pub turn_major: i64,
    pub turn_minor: i64,
    pub idle: bool,
    pub data_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl KoboldClient {
    pub async fn multiplayer_status(
        &self,
        request: &MultiplayerStatusRequest,
    ) -> Result<MultiplayerStatusResponse> {
        self.api.post("api/extra/multiplayer/status", request).await
    }

    /// The story as stored by the server, returned verbatim.
    pub async fn multiplayer_story(&self) -> Result<String> {
        self.api.get_text("api/extra/multiplayer/getstory").await
    }

    pub async fn set_multiplayer_story(
        &self,
        request: &MultiplayerStoryRequest,
    ) -> Result<MultiplayerStoryResponse> {
        let response: MultiplayerStoryResponse = self
            .api
            .post("api/extra/multiplayer/setstory", request)
            .await?;
        if let Some(error) = &response.error {
            crate::warn!("Multiplayer story update rejected: {}", error);
        }
        Ok(response)
    }
}
