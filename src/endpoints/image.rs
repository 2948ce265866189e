//! Stable Diffusion routes, served under the A1111 compatible `sdapi/v1`
//! prefix when KoboldCpp is launched with an image model.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::{
    client::KoboldClient,
    error::{KoboldError, Result},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Builder)]
#[builder(derive(Debug, Clone))]
pub struct TextToImageRequest {
    #[builder(into)]
    pub prompt: String,

    #[builder(into, default)]
    pub negative_prompt: String,

    #[builder(default = 7.0)]
    pub cfg_scale: f32,

    #[builder(default = 20)]
    pub steps: u32,

    #[builder(default = 512)]
    pub width: u32,

    #[builder(default = 512)]
    pub height: u32,

    #[builder(default = -1)]
    pub seed: i64,

    #[builder(into, default = "euler_a".to_string())]
    pub sampler_name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ImageToImageRequest {
    #[serde(flatten)]
    pub generation: TextToImageRequest,
    /// Base64 encoded source images.
    pub init_images: Vec<String>,
    pub denoising_strength: f32,
}

impl ImageToImageRequest {
    pub fn new(generation: TextToImageRequest, init_image: &[u8]) -> Self {
        Self {
            generation,
            init_images: vec![STANDARD.encode(init_image)],
            denoising_strength: 0.75,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ImageGenerationResponse {
    /// Base64 encoded PNGs.
    pub images: Vec<String>,
    pub parameters: serde_json::Value,
    pub info: String,
}

impl ImageGenerationResponse {
    pub fn decode_images(&self) -> Result<Vec<Vec<u8>>> {
        self.images
            .iter()
            .map(|image| STANDARD.decode(image).map_err(KoboldError::from))
            .collect()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InterrogateRequest {
    /// Base64 encoded image.
    pub image: String,
}

impl InterrogateRequest {
    pub fn from_bytes(image: &[u8]) -> Self {
        Self {
            image: STANDARD.encode(image),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct InterrogateResponse {
    pub caption: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SdSampler {
    pub name: String,
    pub aliases: Vec<String>,
    pub options: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SdModel {
    pub title: String,
    pub model_name: String,
    pub hash: Option<String>,
    pub filename: String,
}

impl KoboldClient {
    pub async fn text_to_image(&self, request: &TextToImageRequest) -> Result<ImageGenerationResponse> {
        self.api.post("sdapi/v1/txt2img", request).await
    }

    pub async fn image_to_image(
        &self,
        request: &ImageToImageRequest,
    ) -> Result<ImageGenerationResponse> {
        self.api.post("sdapi/v1/img2img", request).await
    }

    /// Caption an image with the server's vision model.
    pub async fn interrogate(&self, request: &InterrogateRequest) -> Result<InterrogateResponse> {
        self.api.post("sdapi/v1/interrogate", request).await
    }

    pub async fn sd_samplers(&self) -> Result<Vec<SdSampler>> {
        self.api.get("sdapi/v1/samplers").await
    }

    pub async fn sd_models(&self) -> Result<Vec<SdModel>> {
        self.api.get("sdapi/v1/sd-models").await
    }
}
