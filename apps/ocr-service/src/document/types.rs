//! Document types
//!
//! Values passed between the normalizer, the encoder and the OCR provider.

use std::path::Path;

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Media types the HTTP boundary accepts
pub const ACCEPTED_MEDIA_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "application/pdf",
    "image/tiff",
    "image/bmp",
];

/// How a source document is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Pdf,
    Raster,
}

impl MediaKind {
    /// Classify a declared media type. Anything that is not a PDF is handed to
    /// the raster decoder, which sniffs the real format from the bytes.
    pub fn from_media_type(media_type: &str) -> Self {
        if normalize_media_type(media_type) == "application/pdf" {
            MediaKind::Pdf
        } else {
            MediaKind::Raster
        }
    }

    /// Classify by file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => MediaKind::Pdf,
            _ => MediaKind::Raster,
        }
    }
}

/// Lowercased media type without parameters (`image/PNG; x=y` -> `image/png`)
pub fn normalize_media_type(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether the HTTP boundary accepts this media type
pub fn is_accepted_media_type(media_type: &str) -> bool {
    let normalized = normalize_media_type(media_type);
    ACCEPTED_MEDIA_TYPES.contains(&normalized.as_str())
}

/// Uploaded file, alive for the duration of one request
#[derive(Debug)]
pub struct SourceDocument {
    pub bytes: Vec<u8>,
    pub kind: MediaKind,
}

impl SourceDocument {
    pub fn new(bytes: Vec<u8>, media_type: &str) -> Self {
        Self {
            bytes,
            kind: MediaKind::from_media_type(media_type),
        }
    }
}

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Decoded bitmap after the first size cap, with its perceptual hash
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bitmap: RgbImage,
    /// 64-bit DCT hash as 16 hex characters
    pub phash: String,
}

impl NormalizedImage {
    pub fn dimensions(&self) -> ImageDimensions {
        ImageDimensions {
            width: self.bitmap.width(),
            height: self.bitmap.height(),
        }
    }
}

/// JPEG payload ready for the OCR provider
#[derive(Debug, Clone)]
pub struct EncodedPayload {
    /// `data:image/jpeg;base64,...`
    pub data_uri: String,
    /// Size of the JPEG before base64
    pub byte_len: usize,
    pub quality: u8,
    pub dimensions: ImageDimensions,
}
