//! JPEG payload encoding
//!
//! Shrinks and recompresses a normalized bitmap until it fits the provider's
//! upload budget, then wraps it in a base64 data URI.

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;

use super::error::{DocumentError, DocumentResult};
use super::normalize::fit_within;
use super::types::{EncodedPayload, ImageDimensions, NormalizedImage};

/// OCR.space rejects uploads over 1MB on the free tier
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

pub const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Clone)]
pub struct EncoderSettings {
    pub max_bytes: usize,
    pub max_dimension: u32,
    pub initial_quality: u8,
    pub min_quality: u8,
    pub quality_step: u8,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            max_bytes: MAX_PAYLOAD_BYTES,
            max_dimension: 1500,
            initial_quality: 70,
            min_quality: 10,
            quality_step: 10,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PayloadEncoder {
    settings: EncoderSettings,
}

impl PayloadEncoder {
    pub fn new(settings: EncoderSettings) -> Self {
        Self { settings }
    }

    pub fn encode(&self, image: &NormalizedImage) -> DocumentResult<EncodedPayload> {
        let resized = fit_within(
            image.bitmap.width(),
            image.bitmap.height(),
            self.settings.max_dimension.max(1),
        )
        .map(|(width, height)| {
            tracing::info!(width, height, "Image resized for upload");
            imageops::resize(&image.bitmap, width, height, FilterType::Triangle)
        });
        let bitmap = resized.as_ref().unwrap_or(&image.bitmap);

        let (buffer, quality) = self.compress(bitmap)?;

        tracing::info!(
            size_kb = buffer.len() as f64 / 1024.0,
            quality,
            "Encoded image"
        );

        let data_uri = format!(
            "{}{}",
            DATA_URI_PREFIX,
            base64::engine::general_purpose::STANDARD.encode(&buffer)
        );

        Ok(EncodedPayload {
            data_uri,
            byte_len: buffer.len(),
            quality,
            dimensions: ImageDimensions {
                width: bitmap.width(),
                height: bitmap.height(),
            },
        })
    }

    /// Lower JPEG quality step by step until the output fits the budget
    fn compress(&self, bitmap: &RgbImage) -> DocumentResult<(Vec<u8>, u8)> {
        let settings = &self.settings;
        let step = settings.quality_step.max(1);

        let mut quality = settings.initial_quality.clamp(1, 100);
        let mut buffer = encode_jpeg(bitmap, quality)?;

        while buffer.len() > settings.max_bytes && quality > settings.min_quality {
            quality = quality.saturating_sub(step).max(settings.min_quality).max(1);
            tracing::debug!(size = buffer.len(), quality, "Payload over budget, lowering quality");
            buffer = encode_jpeg(bitmap, quality)?;
        }

        if buffer.len() > settings.max_bytes {
            return Err(DocumentError::PayloadTooLarge {
                size: buffer.len(),
                limit: settings.max_bytes,
                quality,
            });
        }

        Ok((buffer, quality))
    }
}

fn encode_jpeg(bitmap: &RgbImage, quality: u8) -> DocumentResult<Vec<u8>> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(bitmap)
        .map_err(|e| DocumentError::Encode(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb};

    fn normalized(bitmap: RgbImage) -> NormalizedImage {
        NormalizedImage {
            bitmap,
            phash: "0000000000000000".to_string(),
        }
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 96])
        })
    }

    fn noise(width: u32, height: u32) -> RgbImage {
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let bytes = state.to_le_bytes();
            Rgb([bytes[0], bytes[3], bytes[6]])
        })
    }

    fn decode_payload(payload: &EncodedPayload) -> Vec<u8> {
        let encoded = payload.data_uri.strip_prefix(DATA_URI_PREFIX).unwrap();
        base64::engine::general_purpose::STANDARD.decode(encoded).unwrap()
    }

    #[test]
    fn test_large_bitmap_is_resized_and_within_budget() {
        let encoder = PayloadEncoder::default();
        let payload = encoder.encode(&normalized(gradient(3000, 2000))).unwrap();

        assert_eq!(payload.dimensions, ImageDimensions { width: 1500, height: 1000 });
        assert!(payload.byte_len <= MAX_PAYLOAD_BYTES);
        assert_eq!(payload.quality, 70);

        let jpeg = decode_payload(&payload);
        assert_eq!(jpeg.len(), payload.byte_len);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (1500, 1000));
    }

    #[test]
    fn test_small_bitmap_keeps_dimensions() {
        let encoder = PayloadEncoder::default();
        let payload = encoder.encode(&normalized(gradient(640, 480))).unwrap();

        assert_eq!(payload.dimensions, ImageDimensions { width: 640, height: 480 });
        assert!(payload.data_uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_quality_lowered_until_budget_met() {
        let bitmap = noise(256, 256);
        let at_start = encode_jpeg(&bitmap, 70).unwrap().len();
        let at_floor = encode_jpeg(&bitmap, 10).unwrap().len();
        assert!(at_floor < at_start);

        let encoder = PayloadEncoder::new(EncoderSettings {
            max_bytes: at_floor,
            ..EncoderSettings::default()
        });
        let payload = encoder.encode(&normalized(bitmap)).unwrap();

        assert!(payload.byte_len <= at_floor);
        assert!(payload.quality < 70);
    }

    #[test]
    fn test_high_entropy_image_over_budget_fails() {
        let encoder = PayloadEncoder::new(EncoderSettings {
            max_bytes: 1024,
            ..EncoderSettings::default()
        });

        match encoder.encode(&normalized(noise(256, 256))) {
            Err(DocumentError::PayloadTooLarge { size, limit, quality }) => {
                assert!(size > limit);
                assert_eq!(limit, 1024);
                assert_eq!(quality, 10);
            }
            other => panic!("expected PayloadTooLarge, got {:?}", other.map(|p| p.byte_len)),
        }
    }
}
