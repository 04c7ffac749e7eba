//! Document preparation
//!
//! Decoding, normalization and payload encoding for uploaded documents.
//!
//! - `normalize`: image or first PDF page to a capped RGB bitmap plus pHash
//! - `encode`: bitmap to a size-budgeted JPEG data URI

mod encode;
mod error;
mod normalize;
mod pdf;
pub mod phash;
mod types;

pub use encode::{EncoderSettings, PayloadEncoder, DATA_URI_PREFIX, MAX_PAYLOAD_BYTES};
pub use error::{DocumentError, DocumentResult};
pub use normalize::{fit_within, ImageNormalizer};
pub use types::{
    is_accepted_media_type, normalize_media_type, EncodedPayload, ImageDimensions, MediaKind,
    NormalizedImage, SourceDocument, ACCEPTED_MEDIA_TYPES,
};
