//! OCR Types
//!
//! Wire types for the OCR.space parse endpoint and provider errors.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Recognition options sent with every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOptions {
    /// Text-detection locale (e.g. "eng")
    pub language: String,
    /// Provider engine variant; engine 2 is the more accurate one
    pub engine: u8,
    /// Auto-rotate the image before recognition
    pub detect_orientation: bool,
    /// Upscale small text before recognition
    pub scale: bool,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            engine: 2,
            detect_orientation: true,
            scale: true,
        }
    }
}

/// Parse result returned by the provider.
///
/// Provider output is untrusted: every field is optional and wrongly-typed
/// values fall back to defaults instead of failing the whole response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OcrResponse {
    #[serde(default, deserialize_with = "lenient_parsed_results")]
    pub parsed_results: Vec<ParsedResult>,

    /// Milliseconds; the provider sends this as a string
    #[serde(
        default,
        rename = "ProcessingTimeInMilliseconds",
        deserialize_with = "lenient_f64"
    )]
    pub processing_time_ms: f64,

    #[serde(default, rename = "OCRExitCode", deserialize_with = "lenient_i64")]
    pub ocr_exit_code: Option<i64>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_errored_on_processing: bool,

    #[serde(default, deserialize_with = "lenient_message")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParsedResult {
    #[serde(default, deserialize_with = "lenient_string")]
    pub parsed_text: String,
}

impl ParsedResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            parsed_text: text.into(),
        }
    }
}

impl OcrResponse {
    /// Successful response carrying the given text segments
    pub fn with_text<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parsed_results: segments.into_iter().map(ParsedResult::new).collect(),
            ocr_exit_code: Some(1),
            ..Self::default()
        }
    }

    /// Response with the provider's error flag raised
    pub fn errored(message: impl Into<String>) -> Self {
        Self {
            is_errored_on_processing: true,
            error_message: Some(message.into()),
            ocr_exit_code: Some(3),
            ..Self::default()
        }
    }

    pub fn processing_time_secs(&self) -> f64 {
        self.processing_time_ms / 1000.0
    }
}

/// Flatten a provider `ErrorMessage`, which may be a string or a list of strings
pub fn error_message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        _ => None,
    }
}

fn lenient_parsed_results<'de, D>(deserializer: D) -> Result<Vec<ParsedResult>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items = match value {
        Some(Value::Array(items)) => items,
        _ => return Ok(Vec::new()),
    };

    // Entries that are not objects are skipped
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

fn lenient_message<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(error_message_text))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        _ => String::new(),
    })
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// Definitive application-level failure; never retried
    #[error("API request failed with status code: {status}{}", detail_suffix(.message))]
    Provider { status: u16, message: Option<String> },

    /// Every attempt hit a timeout or connection failure
    #[error("OCR provider unavailable after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: String },

    #[error("Failed to parse API response as JSON: {0}")]
    ResponseParse(String),

    /// Non-retryable transport failure (request construction, body read)
    #[error("OCR request failed: {0}")]
    Transport(String),
}

fn detail_suffix(message: &Option<String>) -> String {
    message
        .as_ref()
        .map(|m| format!(" ({})", m))
        .unwrap_or_default()
}
