//! Contract payload preparation
//!
//! Packages an extraction result into the shape the verification contract
//! and the frontend consume.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::extract::ExtractionResult;
use crate::hash::{bytes32_to_hex, sha256_hex, to_bytes32};

/// Final response payload.
///
/// `name`, `contact_number` and `residence` are kept for consumers that still
/// read them; field-level extraction is disabled so they are always empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractPayload {
    /// `0x` + 64 hex characters
    pub document_hash: String,
    pub name: String,
    pub contact_number: String,
    pub residence: String,
    pub raw_text: String,
    /// 64 hex characters, no prefix
    pub hex_hash: String,
    pub phash: Option<String>,
}

/// Hash the extracted text and build the contract payload
pub fn prepare(result: &ExtractionResult) -> Result<ContractPayload, PipelineError> {
    let raw_text = result
        .debug_info
        .raw_text
        .as_deref()
        .filter(|text| !text.is_empty())
        .ok_or(PipelineError::NoTextFound)?;

    let hex_hash = sha256_hex(raw_text);
    let bytes32 = to_bytes32(&hex_hash)?;

    Ok(ContractPayload {
        document_hash: bytes32_to_hex(&bytes32),
        name: String::new(),
        contact_number: String::new(),
        residence: String::new(),
        raw_text: raw_text.to_string(),
        hex_hash,
        phash: result.phash.clone(),
    })
}
