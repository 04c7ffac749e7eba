//! DocGuard OCR service
//!
//! Turns an uploaded identity document (image or PDF) into a verification
//! payload: the OCR text, its SHA-256 digest in `bytes32` form, a perceptual
//! hash of the image, and the 12-digit identifier when one is present.

pub mod config;
pub mod contract;
pub mod document;
pub mod error;
pub mod extract;
pub mod hash;
pub mod keep_alive;
pub mod ocr;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use config::Config;
pub use contract::ContractPayload;
pub use error::{ApiError, PipelineError};
pub use pipeline::DocumentPipeline;
pub use state::AppState;
