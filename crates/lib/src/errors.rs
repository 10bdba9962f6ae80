use thiserror::Error;

/// Custom error types for the enrichment library.
#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("Model '{model}' is not loaded")]
    ModelNotReady { model: &'static str },
    #[error("Failed to load model '{model}': {reason}")]
    ModelLoad { model: &'static str, reason: String },
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to model API: {0}")]
    ModelRequest(reqwest::Error),
    #[error("Failed to deserialize model API response: {0}")]
    ModelDeserialization(reqwest::Error),
    #[error("Model API returned an error: {0}")]
    ModelApi(String),
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OCR backend failed: {0}")]
    OcrBackend(String),
    #[error("An unexpected internal error occurred: {0}")]
    Internal(#[from] anyhow::Error),
}
