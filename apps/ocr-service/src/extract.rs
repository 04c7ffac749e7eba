//! Identifier extraction from OCR text
//!
//! Finds the first 12-digit run (Aadhaar number) in the provider's text and
//! hashes the full text. A response without a match is a normal result, not
//! an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::document::ImageDimensions;
use crate::hash::sha256_hex;
use crate::ocr::OcrResponse;

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{12}").expect("identifier pattern is valid"));

pub const NO_TEXT_FOUND: &str = "No text found in image";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionMetadata {
    /// Provider-reported processing time in seconds
    pub processing_time: f64,
    pub image_dimensions: ImageDimensions,
    pub ocr_engine: Option<i64>,
    pub is_error: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DebugInfo {
    /// All parsed text, one segment per line
    pub raw_text: Option<String>,
    /// Every 12-digit run in match order
    pub found_digits: Vec<String>,
    pub error: Option<String>,
    /// Provider `ErrorMessage`, passed through
    pub error_message: Option<String>,
    pub ocr_exit_code: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub metadata: ExtractionMetadata,
    /// `dddd dddd dddd`
    pub aadhaar_number: Option<String>,
    /// 1.0 when an identifier was found, 0.0 otherwise
    pub confidence: f64,
    pub debug_info: DebugInfo,
    /// SHA-256 hex of `debug_info.raw_text`
    pub document_hash: Option<String>,
    pub phash: Option<String>,
}

/// Build an extraction result from a provider response.
///
/// `dimensions` only feeds the metadata block.
pub fn extract(response: &OcrResponse, dimensions: ImageDimensions) -> ExtractionResult {
    let mut result = ExtractionResult {
        metadata: ExtractionMetadata {
            processing_time: response.processing_time_secs(),
            image_dimensions: dimensions,
            ocr_engine: response.ocr_exit_code,
            is_error: response.is_errored_on_processing,
        },
        aadhaar_number: None,
        confidence: 0.0,
        debug_info: DebugInfo::default(),
        document_hash: None,
        phash: None,
    };

    if response.is_errored_on_processing {
        let message = response
            .error_message
            .clone()
            .unwrap_or_else(|| "Unknown error".to_string());
        tracing::error!(error = %message, "OCR API error");
        result.debug_info.error = Some(message);
        return result;
    }

    let raw_text = join_segments(response);
    tracing::info!(chars = raw_text.chars().count(), "Extracted text");

    let found_digits = find_identifier_candidates(&raw_text);
    if let Some(formatted) = found_digits.first().and_then(|m| format_identifier(m)) {
        tracing::info!(identifier = %mask_identifier(&formatted), "Found identifier");
        result.aadhaar_number = Some(formatted);
        result.confidence = 1.0;
    }

    if response.parsed_results.is_empty() {
        tracing::warn!("No text found in image");
        result.debug_info.error = Some(NO_TEXT_FOUND.to_string());
    }

    result.document_hash = Some(sha256_hex(&raw_text));
    result.debug_info.raw_text = Some(raw_text);
    result.debug_info.found_digits = found_digits;
    result.debug_info.error_message = response.error_message.clone();
    result.debug_info.ocr_exit_code = response.ocr_exit_code;

    result
}

/// Every parsed segment followed by a newline
fn join_segments(response: &OcrResponse) -> String {
    response
        .parsed_results
        .iter()
        .fold(String::new(), |mut text, segment| {
            text.push_str(&segment.parsed_text);
            text.push('\n');
            text
        })
}

/// All non-overlapping 12-digit runs, in order
pub fn find_identifier_candidates(text: &str) -> Vec<String> {
    IDENTIFIER_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Strip non-digits and format as `dddd dddd dddd` if exactly 12 remain
pub fn format_identifier(candidate: &str) -> Option<String> {
    let digits: Vec<char> = candidate.chars().filter(|c| c.is_numeric()).collect();
    if digits.len() != 12 {
        return None;
    }

    let groups: Vec<String> = digits.chunks(4).map(|chunk| chunk.iter().collect()).collect();
    Some(groups.join(" "))
}

/// Last four digits only, for logs
fn mask_identifier(formatted: &str) -> String {
    let tail: String = formatted.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("XXXX XXXX {}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> ImageDimensions {
        ImageDimensions { width: 800, height: 600 }
    }

    #[test]
    fn test_identifier_found_and_formatted() {
        let response = OcrResponse::with_text(["Header line\n123456789012\nMore text"]);
        let result = extract(&response, dims());

        assert_eq!(result.aadhaar_number.as_deref(), Some("1234 5678 9012"));
        assert_eq!(result.confidence, 1.0);
        assert_eq!(
            result.debug_info.raw_text.as_deref(),
            Some("Header line\n123456789012\nMore text\n")
        );
        assert_eq!(result.debug_info.found_digits, vec!["123456789012".to_string()]);
        assert!(result.debug_info.error.is_none());
    }

    #[test]
    fn test_no_identifier_still_hashed() {
        let response = OcrResponse::with_text(["GOVERNMENT OF INDIA", "1234 5678 9012"]);
        let result = extract(&response, dims());

        assert_eq!(result.aadhaar_number, None);
        assert_eq!(result.confidence, 0.0);
        let raw_text = result.debug_info.raw_text.clone().unwrap();
        assert_eq!(raw_text, "GOVERNMENT OF INDIA\n1234 5678 9012\n");
        assert_eq!(result.document_hash, Some(sha256_hex(&raw_text)));
    }

    #[test]
    fn test_first_of_many_matches_wins() {
        let response = OcrResponse::with_text(["id 111122223333 alt 444455556666"]);
        let result = extract(&response, dims());

        assert_eq!(result.aadhaar_number.as_deref(), Some("1111 2222 3333"));
        assert_eq!(result.debug_info.found_digits.len(), 2);
    }

    #[test]
    fn test_longer_runs_split_without_overlap() {
        assert_eq!(
            find_identifier_candidates("1234567890123456789012345"),
            vec!["123456789012".to_string(), "345678901234".to_string()]
        );
        assert!(find_identifier_candidates("12345678901").is_empty());
    }

    #[test]
    fn test_segments_joined_across_results() {
        let response = OcrResponse::with_text(["123456", "789012"]);
        let result = extract(&response, dims());

        // A newline separates segments, so no 12-digit run spans them
        assert_eq!(result.aadhaar_number, None);
    }

    #[test]
    fn test_provider_error_is_zero_result() {
        let response = OcrResponse::errored("X");
        let result = extract(&response, dims());

        assert_eq!(result.aadhaar_number, None);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.debug_info.error.as_deref(), Some("X"));
        assert!(result.debug_info.raw_text.is_none());
        assert!(result.document_hash.is_none());
        assert!(result.metadata.is_error);
    }

    #[test]
    fn test_provider_error_without_message() {
        let response = OcrResponse {
            is_errored_on_processing: true,
            ..OcrResponse::default()
        };
        let result = extract(&response, dims());
        assert_eq!(result.debug_info.error.as_deref(), Some("Unknown error"));
    }

    #[test]
    fn test_empty_parsed_results() {
        let response = OcrResponse::with_text(Vec::<String>::new());
        let result = extract(&response, dims());

        assert_eq!(result.debug_info.error.as_deref(), Some(NO_TEXT_FOUND));
        assert_eq!(result.aadhaar_number, None);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.debug_info.raw_text.as_deref(), Some(""));
        assert_eq!(result.document_hash, Some(sha256_hex("")));
    }

    #[test]
    fn test_metadata_populated() {
        let response = OcrResponse {
            processing_time_ms: 1500.0,
            ..OcrResponse::with_text(["text"])
        };
        let result = extract(&response, dims());

        assert_eq!(result.metadata.processing_time, 1.5);
        assert_eq!(result.metadata.image_dimensions, dims());
        assert_eq!(result.metadata.ocr_engine, Some(1));
        assert!(!result.metadata.is_error);
    }

    #[test]
    fn test_format_identifier() {
        assert_eq!(format_identifier("123456789012").as_deref(), Some("1234 5678 9012"));
        assert_eq!(format_identifier("1234-5678-9012").as_deref(), Some("1234 5678 9012"));
        assert_eq!(format_identifier("12345"), None);
        assert_eq!(format_identifier("1234567890123"), None);
    }

    #[test]
    fn test_mask_identifier() {
        assert_eq!(mask_identifier("1234 5678 9012"), "XXXX XXXX 9012");
    }
}
