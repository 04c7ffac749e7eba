//! OCR Module
//!
//! Delegates text recognition to an external provider.
//!
//! The provider is a trait object so the pipeline does not care which
//! service does the recognition. `OcrSpaceProvider` talks to the OCR.space
//! parse API with bounded, sequential retries on timeouts and connection
//! failures.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docguard_ocr::ocr::{OcrProvider, OcrSpaceProvider};
//!
//! let provider = OcrSpaceProvider::new(&config.ocr);
//! let response = provider.submit(&payload).await?;
//! ```

mod provider;
mod transport;
mod types;

pub use provider::{OcrProvider, OcrSpaceProvider, RetryPolicy};
pub use transport::{OcrTransport, ReqwestTransport, TransportError, TransportResponse};
pub use types::{error_message_text, OcrError, OcrOptions, OcrResponse, ParsedResult};

#[cfg(test)]
pub use provider::MockProvider;
