//! # Text Extraction Stage
//!
//! Prepares a page image for OCR and normalises the recognised text:
//! 1.  Convert to single-channel grayscale.
//! 2.  Denoise with a median filter.
//! 3.  Binarise at the Otsu level (no manual threshold).
//! 4.  Hand the bitmap to the OCR backend.
//! 5.  Collapse all whitespace runs into single spaces and trim.

use crate::{
    config::OcrConfig,
    providers::{OcrBackend, OcrOptions},
    types::Image,
};
use image::GrayImage;
use imageproc::{contrast::otsu_level, filter::median_filter};
use tracing::{error, info, warn};

/// Extracts printed or handwritten text from an image.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    options: OcrOptions,
    denoise_radius: u32,
}

impl TextExtractor {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            options: OcrOptions {
                lang: config.lang.clone(),
                psm: config.psm,
            },
            denoise_radius: config.denoise_radius,
        }
    }

    /// Grayscale, denoise and binarise `image` for recognition.
    pub fn preprocess(&self, image: &Image) -> GrayImage {
        let gray = image.to_luma8();
        let denoised = if self.denoise_radius > 0 {
            median_filter(&gray, self.denoise_radius, self.denoise_radius)
        } else {
            gray
        };
        binarize(&denoised)
    }

    /// Returns the cleaned OCR text, or `None` when there is no backend, the
    /// backend fails, or nothing but whitespace was recognised.
    pub async fn extract(&self, backend: Option<&dyn OcrBackend>, image: &Image) -> Option<String> {
        let Some(backend) = backend else {
            warn!("OCR backend not available, skipping text extraction");
            return None;
        };

        let page = self.preprocess(image);
        if is_uniform(&page) {
            info!("No text extracted from image (blank page)");
            return None;
        }

        let raw = match backend.recognize(&page, &self.options).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Error extracting text from image: {e}");
                return None;
            }
        };

        let text = clean_ocr_text(&raw);
        if text.is_empty() {
            info!("No text extracted from image");
            None
        } else {
            let preview: String = text.chars().take(100).collect();
            info!("Extracted text: {preview}...");
            Some(text)
        }
    }
}

/// Thresholds a grayscale image at its Otsu level. Pixels brighter than the
/// level become white, the rest black.
pub fn binarize(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > level { 255 } else { 0 };
    }
    out
}

fn is_uniform(page: &GrayImage) -> bool {
    let mut pixels = page.pixels();
    match pixels.next() {
        Some(first) => pixels.all(|p| p == first),
        None => true,
    }
}

/// Collapses every run of whitespace (including newlines) into one space.
pub fn clean_ocr_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
