//! Document error types
//!
//! Failures while turning an uploaded file into an OCR-ready payload.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    /// Source bytes could not be decoded as an image or PDF
    #[error("Could not read document: {0}")]
    Decode(String),

    /// Header dimensions exceed the decode ceiling
    #[error("Image is too large to process: {width}x{height} exceeds {max_pixels} pixels")]
    DimensionsTooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    /// PDF opened but produced no page to render
    #[error("Could not convert PDF to image: document has no pages")]
    EmptyPdf,

    /// JPEG could not be brought under the size budget
    #[error("Image could not be compressed below {limit} bytes (smallest attempt was {size} bytes at quality {quality})")]
    PayloadTooLarge {
        size: usize,
        limit: usize,
        quality: u8,
    },

    /// JPEG encoder failure
    #[error("Image encoding error: {0}")]
    Encode(String),
}

/// Result type alias for document operations
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::Decode(format!("PDF error: {}", err))
    }
}

impl From<image::ImageError> for DocumentError {
    fn from(err: image::ImageError) -> Self {
        DocumentError::Decode(err.to_string())
    }
}
