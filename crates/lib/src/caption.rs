//! # Caption Stage
//!
//! Wraps a `CaptionModel` so that any model failure becomes an absent
//! description instead of an error.

use crate::{
    config::CaptionConfig,
    providers::{CaptionModel, CaptionOptions},
    types::Image,
};
use tracing::{error, info};

/// Produces a natural-language description of an image.
#[derive(Debug, Clone)]
pub struct CaptionGenerator {
    options: CaptionOptions,
}

impl CaptionGenerator {
    pub fn new(config: &CaptionConfig) -> Self {
        Self {
            options: CaptionOptions {
                max_length: config.max_length,
                num_beams: config.num_beams,
                temperature: config.temperature,
                input_size: config.input_size,
            },
        }
    }

    pub fn options(&self) -> &CaptionOptions {
        &self.options
    }

    /// Returns the caption, or `None` if the model fails or answers with
    /// blank text.
    pub async fn generate(&self, model: &dyn CaptionModel, image: &Image) -> Option<String> {
        match model.caption(image, &self.options).await {
            Ok(caption) => {
                let caption = caption.trim();
                if caption.is_empty() {
                    info!("Caption model returned no text");
                    None
                } else {
                    info!("Generated image caption: {caption}");
                    Some(caption.to_string())
                }
            }
            Err(e) => {
                error!("Error generating image description: {e}");
                None
            }
        }
    }
}
