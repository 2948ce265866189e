use serde::{Deserialize, Serialize};

use crate::{client::KoboldClient, error::Result};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Loaded model, e.g. `koboldcpp/Mistral-7B-Instruct`.
    pub result: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct VersionInfo {
    /// KoboldAI API version implemented by the server.
    pub result: String,
}

/// `api/extra/version`: server build and the optional features it was
/// launched with.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ExtraVersionInfo {
    pub result: String,
    pub version: String,
    /// Launched with `--password`.
    pub protected: bool,
    pub txt2img: bool,
    pub vision: bool,
    pub transcribe: bool,
    pub multiplayer: bool,
    pub websearch: bool,
}

/// `api/extra/perf`: statistics about the last generation and server load.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PerfInfo {
    /// Seconds spent processing the last prompt.
    pub last_process: f64,
    /// Seconds spent generating the last output.
    pub last_eval: f64,
    pub last_token_count: u64,
    pub last_seed: i64,
    pub total_gens: u64,
    pub stop_reason: i32,
    pub total_img_gens: u64,
    pub queue: u32,
    pub idle: u8,
    pub hordeexitcounter: i64,
    pub uptime: f64,
    pub idletime: f64,
    pub quiet: bool,
}

impl PerfInfo {
    pub fn is_idle(&self) -> bool {
        self.idle != 0
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ServerProperties {
    pub chat_template: String,
    pub total_slots: u32,
    pub default_generation_settings: DefaultGenerationSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DefaultGenerationSettings {
    pub n_ctx: u32,
}

impl KoboldClient {
    pub async fn model_info(&self) -> Result<ModelInfo> {
        self.api.get("api/v1/model").await
    }

    pub async fn version_info(&self) -> Result<VersionInfo> {
        self.api.get("api/v1/info/version").await
    }

    pub async fn extra_version_info(&self) -> Result<ExtraVersionInfo> {
        self.api.get("api/extra/version").await
    }

    pub async fn perf_info(&self) -> Result<PerfInfo> {
        self.api.get("api/extra/perf").await
    }

    pub async fn server_properties(&self) -> Result<ServerProperties> {
        self.api.get("props").await
    }
}
