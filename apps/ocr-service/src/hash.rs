//! Document digests in the shapes ledger contracts expect

use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashError {
    #[error("Hash must be 32 bytes (64 hex characters), got {0} characters")]
    InvalidLength(usize),

    #[error("Hash is not valid hex: {0}")]
    InvalidHex(String),
}

/// SHA-256 of the UTF-8 text as 64 lowercase hex characters
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Decode a 64-character hex digest (optionally `0x`-prefixed) into bytes32
pub fn to_bytes32(hex_hash: &str) -> Result<[u8; 32], HashError> {
    let digits = hex_hash.strip_prefix("0x").unwrap_or(hex_hash);
    if digits.len() != 64 {
        return Err(HashError::InvalidLength(digits.len()));
    }

    let mut bytes = [0u8; 32];
    hex::decode_to_slice(digits, &mut bytes).map_err(|e| HashError::InvalidHex(e.to_string()))?;
    Ok(bytes)
}

/// `0x`-prefixed hex rendering of a bytes32 value
pub fn bytes32_to_hex(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_is_idempotent() {
        let text = "GOVERNMENT OF INDIA\n1234 5678 9012\n";
        assert_eq!(sha256_hex(text), sha256_hex(text));
    }

    #[test]
    fn test_bytes32_round_trip() {
        let hex_hash = sha256_hex("some document text\n");
        let bytes = to_bytes32(&hex_hash).unwrap();
        let rendered = bytes32_to_hex(&bytes);

        assert_eq!(rendered.len(), 66);
        assert_eq!(&rendered[2..], hex_hash);
        assert_eq!(to_bytes32(&rendered).unwrap(), bytes);
    }

    #[test]
    fn test_bytes32_rejects_wrong_length() {
        assert_eq!(to_bytes32("abcd"), Err(HashError::InvalidLength(4)));
        assert_eq!(to_bytes32(&"a".repeat(66)), Err(HashError::InvalidLength(66)));
    }

    #[test]
    fn test_bytes32_rejects_non_hex() {
        assert!(matches!(to_bytes32(&"z".repeat(64)), Err(HashError::InvalidHex(_))));
    }
}
