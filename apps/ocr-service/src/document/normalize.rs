//! Image normalization
//!
//! Turns an uploaded image or PDF into a size-capped RGB bitmap and its
//! perceptual hash. Both decode branches produce RGB channel order.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Limits, RgbImage};

use crate::config::ImagingConfig;

use super::error::{DocumentError, DocumentResult};
use super::pdf;
use super::phash::perceptual_hash;
use super::types::{MediaKind, NormalizedImage, SourceDocument};

/// Allocation allowance per source pixel: 16-bit RGBA output plus decoder
/// working buffers
const DECODE_BYTES_PER_PIXEL: u64 = 16;

/// Allocation floor so small images keep room for fixed decoder state
const DECODE_ALLOC_FLOOR: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    pdf_dpi: f32,
    max_dimension: u32,
    max_source_pixels: u64,
}

impl ImageNormalizer {
    pub fn new(config: &ImagingConfig) -> Self {
        Self {
            pdf_dpi: config.pdf_dpi,
            max_dimension: config.max_image_dimension.max(1),
            max_source_pixels: config.max_source_pixels,
        }
    }

    pub fn normalize(&self, source: &SourceDocument) -> DocumentResult<NormalizedImage> {
        let bitmap = match source.kind {
            MediaKind::Pdf => {
                tracing::info!(dpi = self.pdf_dpi, "Rendering first PDF page");
                let page = pdf::render_first_page(&source.bytes, self.pdf_dpi)?;
                self.cap(DynamicImage::ImageRgb8(page))
            }
            MediaKind::Raster => self.load_raster(&source.bytes)?,
        };

        let phash = perceptual_hash(&bitmap);
        tracing::info!(
            width = bitmap.width(),
            height = bitmap.height(),
            phash = %phash,
            "Image normalized"
        );

        Ok(NormalizedImage { bitmap, phash })
    }

    fn load_raster(&self, data: &[u8]) -> DocumentResult<RgbImage> {
        // Header-only read; the dimensions bound everything the full decode may allocate
        let (width, height) = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| DocumentError::Decode(e.to_string()))?
            .into_dimensions()?;

        let pixels = u64::from(width) * u64::from(height);
        if pixels > self.max_source_pixels {
            tracing::warn!(width, height, max_pixels = self.max_source_pixels, "Image rejected before decode");
            return Err(DocumentError::DimensionsTooLarge {
                width,
                height,
                max_pixels: self.max_source_pixels,
            });
        }

        tracing::debug!(width, height, "Raster dimensions read");

        let mut limits = Limits::default();
        limits.max_image_width = Some(width);
        limits.max_image_height = Some(height);
        limits.max_alloc = Some(pixels.saturating_mul(DECODE_BYTES_PER_PIXEL).max(DECODE_ALLOC_FLOOR));

        let mut reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| DocumentError::Decode(e.to_string()))?;
        reader.limits(limits);

        Ok(self.cap(reader.decode()?))
    }

    /// Downscale so neither side exceeds the cap, consuming the full-size image
    fn cap(&self, image: DynamicImage) -> RgbImage {
        let (width, height) = (image.width(), image.height());
        match fit_within(width, height, self.max_dimension) {
            Some((new_width, new_height)) => {
                tracing::info!(
                    from_width = width,
                    from_height = height,
                    to_width = new_width,
                    to_height = new_height,
                    "Image resized"
                );
                image
                    .resize_exact(new_width, new_height, FilterType::Lanczos3)
                    .into_rgb8()
            }
            None => image.into_rgb8(),
        }
    }
}

/// Target size keeping aspect ratio when the larger side exceeds `cap`.
/// Returns `None` when the image already fits.
pub fn fit_within(width: u32, height: u32, cap: u32) -> Option<(u32, u32)> {
    let larger = width.max(height);
    if larger <= cap {
        return None;
    }

    let scaled = |side: u32| ((u64::from(side) * u64::from(cap)) / u64::from(larger)).max(1) as u32;
    Some((scaled(width), scaled(height)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn normalizer(max_dimension: u32) -> ImageNormalizer {
        ImageNormalizer::new(&ImagingConfig {
            max_image_dimension: max_dimension,
            ..ImagingConfig::default()
        })
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(100, 50, 200), None);
        assert_eq!(fit_within(2000, 1000, 2000), None);
        assert_eq!(fit_within(4000, 3000, 2000), Some((2000, 1500)));
        assert_eq!(fit_within(1000, 3000, 1500), Some((500, 1500)));
        assert_eq!(fit_within(10_000, 1, 100), Some((100, 1)));
    }

    #[test]
    fn test_small_image_kept() {
        let source = SourceDocument::new(encode_png(320, 200), "image/png");
        let normalized = normalizer(2000).normalize(&source).unwrap();

        assert_eq!(normalized.bitmap.dimensions(), (320, 200));
        assert_eq!(normalized.phash.len(), 16);
    }

    #[test]
    fn test_large_image_capped() {
        let source = SourceDocument::new(encode_png(900, 300), "image/png");
        let normalized = normalizer(600).normalize(&source).unwrap();

        assert_eq!(normalized.bitmap.dimensions(), (600, 200));
    }

    #[test]
    fn test_declared_type_does_not_matter_for_rasters() {
        let source = SourceDocument::new(encode_png(64, 64), "image/jpeg");
        assert!(normalizer(2000).normalize(&source).is_ok());
    }

    #[test]
    fn test_garbage_bytes_fail_with_decode_error() {
        let source = SourceDocument::new(b"definitely not an image".to_vec(), "image/png");
        let result = normalizer(2000).normalize(&source);
        assert!(matches!(result, Err(DocumentError::Decode(_))));
    }

    #[test]
    fn test_pdf_branch_is_capped() {
        let source = SourceDocument::new(pdf::letter_pdf(1), "application/pdf");
        let normalized = normalizer(800).normalize(&source).unwrap();

        // 1275x1650 render at 150 DPI, scaled so the height hits the cap
        let (width, height) = normalized.bitmap.dimensions();
        assert_eq!(height, 800);
        assert!((617..=619).contains(&width), "width was {}", width);
        assert_eq!(normalized.phash.len(), 16);
    }

    #[test]
    fn test_oversized_header_rejected_before_decode() {
        let source = SourceDocument::new(encode_png(900, 300), "image/png");
        let normalizer = ImageNormalizer::new(&ImagingConfig {
            max_source_pixels: 100_000,
            ..ImagingConfig::default()
        });

        let result = normalizer.normalize(&source);
        assert!(matches!(
            result,
            Err(DocumentError::DimensionsTooLarge { width: 900, height: 300, max_pixels: 100_000 })
        ));
    }

    #[test]
    fn test_image_at_pixel_ceiling_decodes() {
        let source = SourceDocument::new(encode_png(400, 250), "image/png");
        let normalizer = ImageNormalizer::new(&ImagingConfig {
            max_source_pixels: 100_000,
            ..ImagingConfig::default()
        });

        assert_eq!(normalizer.normalize(&source).unwrap().bitmap.dimensions(), (400, 250));
    }

    #[test]
    fn test_garbage_pdf_fails_with_decode_error() {
        let source = SourceDocument::new(b"%PDF-1.4 truncated".to_vec(), "application/pdf");
        let result = normalizer(2000).normalize(&source);
        assert!(matches!(
            result,
            Err(DocumentError::Decode(_)) | Err(DocumentError::EmptyPdf)
        ));
    }
}
