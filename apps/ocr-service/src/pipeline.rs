//! Document pipeline
//!
//! Runs one uploaded document through normalization, payload encoding, the
//! OCR provider, identifier extraction and contract preparation.

use std::path::Path;
use std::sync::Arc;

use crate::config::ImagingConfig;
use crate::contract::{prepare, ContractPayload};
use crate::document::{
    EncodedPayload, EncoderSettings, ImageDimensions, ImageNormalizer, MediaKind, PayloadEncoder,
    SourceDocument,
};
use crate::error::{PipelineError, Result};
use crate::extract::{extract, ExtractionResult};
use crate::ocr::OcrProvider;

/// Output of the CPU-bound preparation stage
struct PreparedImage {
    payload: EncodedPayload,
    dimensions: ImageDimensions,
    phash: String,
}

#[derive(Clone)]
pub struct DocumentPipeline {
    normalizer: ImageNormalizer,
    encoder: PayloadEncoder,
    provider: Arc<dyn OcrProvider>,
}

impl DocumentPipeline {
    pub fn new(config: &ImagingConfig, provider: Arc<dyn OcrProvider>) -> Self {
        let settings = EncoderSettings {
            max_dimension: config.max_upload_dimension,
            ..EncoderSettings::default()
        };
        Self::with_encoder_settings(config, settings, provider)
    }

    pub fn with_encoder_settings(
        config: &ImagingConfig,
        settings: EncoderSettings,
        provider: Arc<dyn OcrProvider>,
    ) -> Self {
        Self {
            normalizer: ImageNormalizer::new(config),
            encoder: PayloadEncoder::new(settings),
            provider,
        }
    }

    /// Process an in-memory upload with the declared media type
    pub async fn process(&self, bytes: Vec<u8>, media_type: &str) -> Result<ContractPayload> {
        let source = SourceDocument::new(bytes, media_type);
        let result = self.analyze(source).await?;
        prepare(&result)
    }

    /// Process a file on disk; `.pdf` files take the PDF branch
    pub async fn process_file(&self, path: &Path) -> Result<ContractPayload> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::Decode(format!("Could not read {}: {}", path.display(), e)))?;

        let source = SourceDocument {
            bytes,
            kind: MediaKind::from_path(path),
        };
        let result = self.analyze(source).await?;
        prepare(&result)
    }

    /// Everything up to the extraction result, without contract preparation
    pub async fn analyze(&self, source: SourceDocument) -> Result<ExtractionResult> {
        tracing::info!(bytes = source.bytes.len(), kind = ?source.kind, "Processing document");

        let prepared = self.prepare_image(source).await?;
        tracing::info!(
            bytes = prepared.payload.byte_len,
            quality = prepared.payload.quality,
            provider = self.provider.name(),
            "Submitting image for OCR"
        );

        let response = self.provider.submit(&prepared.payload).await?;

        let mut result = extract(&response, prepared.dimensions);
        result.phash = Some(prepared.phash);
        Ok(result)
    }

    /// Decode, cap and encode on the blocking pool
    async fn prepare_image(&self, source: SourceDocument) -> Result<PreparedImage> {
        let normalizer = self.normalizer.clone();
        let encoder = self.encoder.clone();

        tokio::task::spawn_blocking(move || -> Result<PreparedImage> {
            let normalized = normalizer.normalize(&source)?;
            // The upload buffer is no longer needed once decoded
            drop(source);

            let payload = encoder.encode(&normalized)?;
            Ok(PreparedImage {
                payload,
                dimensions: normalized.dimensions(),
                phash: normalized.phash,
            })
        })
        .await
        .map_err(|e| PipelineError::Internal(format!("Image task failed: {}", e)))?
    }
}
