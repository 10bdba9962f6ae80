use crate::{
    errors::EnrichError,
    providers::{CaptionModel, CaptionOptions},
    types::Image,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops::FilterType, ImageFormat};
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

const CAPTION_INSTRUCTION: &str =
    "Describe this image in one short sentence. Reply with the description only.";

// --- OpenAI-compatible vision request and response structures ---

#[derive(Serialize)]
struct VisionRequest<'a> {
    messages: Vec<VisionMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct VisionMessage {
    role: &'static str,
    content: Vec<VisionContent>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum VisionContent {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize, Debug)]
struct VisionResponse {
    choices: Vec<VisionChoice>,
}

#[derive(Deserialize, Debug)]
struct VisionChoice {
    message: VisionResponseMessage,
}

#[derive(Deserialize, Debug)]
struct VisionResponseMessage {
    content: String,
}

// --- Vision Caption Provider implementation ---

/// A captioning model served behind an OpenAI-compatible chat endpoint.
///
/// Sampling is temperature-based, so two calls on the same image may return
/// different captions. Chat endpoints have no beam search, so
/// `CaptionOptions::num_beams` is ignored here.
#[derive(Clone, Debug)]
pub struct VisionCaptionProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl VisionCaptionProvider {
    /// Creates a new `VisionCaptionProvider`.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Result<Self, EnrichError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(EnrichError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }

    /// Downscales the image to fit `input_size` and encodes it as a PNG data URL.
    fn encode_image(image: &Image, input_size: u32) -> Result<String, EnrichError> {
        let resized;
        let image = if input_size > 0 && (image.width() > input_size || image.height() > input_size)
        {
            resized = image.resize(input_size, input_size, FilterType::Triangle);
            &resized
        } else {
            image
        };

        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }
}

#[async_trait]
impl CaptionModel for VisionCaptionProvider {
    async fn caption(
        &self,
        image: &Image,
        options: &CaptionOptions,
    ) -> Result<String, EnrichError> {
        let data_url = Self::encode_image(image, options.input_size)?;

        let request_body = VisionRequest {
            messages: vec![VisionMessage {
                role: "user",
                content: vec![
                    VisionContent::Text {
                        text: CAPTION_INSTRUCTION.to_string(),
                    },
                    VisionContent::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            model: self.model.as_deref(),
            temperature: options.temperature,
            max_tokens: options.max_length,
            stream: false,
        };

        let mut request_builder = self.client.post(&self.api_url);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        debug!(api_url = %self.api_url, "--> Sending image to caption model");

        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(EnrichError::ModelRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EnrichError::ModelApi(error_text));
        }

        let vision_response: VisionResponse = response
            .json()
            .await
            .map_err(EnrichError::ModelDeserialization)?;

        let caption = vision_response
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();

        Ok(caption)
    }
}
