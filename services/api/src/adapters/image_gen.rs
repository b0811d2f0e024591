//! services/api/src/adapters/image_gen.rs
//!
//! This module contains the adapter for OpenAI's image generation endpoint.
//! It implements the `ImageGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::images::{CreateImageRequestArgs, Image, ImageModel, ImageResponseFormat, ImageSize},
    Client,
};
use async_trait::async_trait;
use study_assistant_core::ports::{ImageGenerationService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ImageGenerationService` port using the OpenAI images API.
#[derive(Clone)]
pub struct OpenAiImageAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiImageAdapter {
    /// Creates a new `OpenAiImageAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `ImageGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ImageGenerationService for OpenAiImageAdapter {
    /// Generates one image and returns its URL, or a data URI when the API inlines it.
    async fn generate_image(&self, prompt: &str) -> PortResult<String> {
        let request = CreateImageRequestArgs::default()
            .prompt(prompt)
            .model(ImageModel::Other(self.model.clone()))
            .n(1)
            .size(ImageSize::S1024x1024)
            .response_format(ImageResponseFormat::Url)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .images()
            .generate(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let image = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| PortError::Unexpected("Image API returned no images.".to_string()))?;

        let image: &Image = &image;
        match image {
            Image::Url { url, .. } => Ok(url.clone()),
            Image::B64Json { b64_json, .. } => Ok(format!("data:image/png;base64,{}", b64_json)),
        }
    }
}
