//! Configuration management for the DocGuard OCR service

use std::env;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Default OCR.space endpoint
pub const DEFAULT_OCR_API_URL: &str = "https://api.ocr.space/parse/image";

/// Upload ceiling enforced at the HTTP boundary: 16MB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OCR_API_KEY environment variable is required for OCR processing")]
    MissingApiKey,

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub imaging: ImagingConfig,
    pub keep_alive: KeepAliveConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

/// Settings for the external OCR provider
#[derive(Clone, Deserialize)]
pub struct OcrConfig {
    pub api_key: String,
    pub api_url: String,
    /// Text-detection locale sent as `language`
    pub language: String,
    /// Provider engine variant sent as `OCREngine`
    pub engine: u8,
    /// Ask the provider to auto-rotate
    pub detect_orientation: bool,
    /// Ask the provider to upscale small text
    pub scale: bool,
    pub max_attempts: u32,
    pub base_delay_secs: u64,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl std::fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrConfig")
            .field("api_key", &self.masked_api_key())
            .field("api_url", &self.api_url)
            .field("language", &self.language)
            .field("engine", &self.engine)
            .field("detect_orientation", &self.detect_orientation)
            .field("scale", &self.scale)
            .field("max_attempts", &self.max_attempts)
            .field("base_delay_secs", &self.base_delay_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .finish()
    }
}

impl OcrConfig {
    /// First 8 characters of the key followed by an ellipsis, for logs
    pub fn masked_api_key(&self) -> String {
        let prefix: String = self.api_key.chars().take(8).collect();
        format!("{}...", prefix)
    }
}

/// Image preparation limits
///
/// `pdf_dpi` trades OCR accuracy for memory and transfer size: 150 DPI uses
/// roughly a quarter of the memory of 300 DPI.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagingConfig {
    pub pdf_dpi: f32,
    /// Cap applied right after decoding
    pub max_image_dimension: u32,
    /// Tighter cap applied before JPEG encoding
    pub max_upload_dimension: u32,
    /// Largest raster accepted for decoding, read from the header
    pub max_source_pixels: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeepAliveConfig {
    /// URL pinged periodically; disabled when unset
    pub url: Option<String>,
    pub interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            ocr: OcrConfig::default(),
            imaging: ImagingConfig::default(),
            keep_alive: KeepAliveConfig {
                url: None,
                interval_secs: 600,
            },
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig {
            api_key: String::new(),
            api_url: DEFAULT_OCR_API_URL.to_string(),
            language: "eng".to_string(),
            engine: 2,
            detect_orientation: true,
            scale: true,
            max_attempts: 3,
            base_delay_secs: 2,
            connect_timeout_secs: 15,
            read_timeout_secs: 45,
        }
    }
}

impl Default for ImagingConfig {
    fn default() -> Self {
        ImagingConfig {
            pdf_dpi: 150.0,
            max_image_dimension: 2000,
            max_upload_dimension: 1500,
            max_source_pixels: 50_000_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let api_key = lookup("OCR_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        // Hosting platforms commonly inject PORT
        let port = match lookup("SERVER_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => parse_value("SERVER_PORT", raw)?,
            None => defaults.server.port,
        };

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port,
                max_upload_bytes: var_or(&lookup, "MAX_UPLOAD_BYTES", defaults.server.max_upload_bytes)?,
            },
            ocr: OcrConfig {
                api_key,
                api_url: lookup("OCR_API_URL").unwrap_or(defaults.ocr.api_url),
                language: lookup("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
                engine: var_or(&lookup, "OCR_ENGINE", defaults.ocr.engine)?,
                detect_orientation: var_or(&lookup, "OCR_DETECT_ORIENTATION", defaults.ocr.detect_orientation)?,
                scale: var_or(&lookup, "OCR_SCALE", defaults.ocr.scale)?,
                max_attempts: var_or(&lookup, "OCR_MAX_ATTEMPTS", defaults.ocr.max_attempts)?,
                base_delay_secs: var_or(&lookup, "OCR_BASE_DELAY_SECS", defaults.ocr.base_delay_secs)?,
                connect_timeout_secs: var_or(&lookup, "OCR_CONNECT_TIMEOUT_SECS", defaults.ocr.connect_timeout_secs)?,
                read_timeout_secs: var_or(&lookup, "OCR_READ_TIMEOUT_SECS", defaults.ocr.read_timeout_secs)?,
            },
            imaging: ImagingConfig {
                pdf_dpi: var_or(&lookup, "PDF_RENDER_DPI", defaults.imaging.pdf_dpi)?,
                max_image_dimension: var_or(&lookup, "MAX_IMAGE_DIMENSION", defaults.imaging.max_image_dimension)?,
                max_upload_dimension: var_or(&lookup, "MAX_UPLOAD_DIMENSION", defaults.imaging.max_upload_dimension)?,
                max_source_pixels: var_or(&lookup, "MAX_SOURCE_PIXELS", defaults.imaging.max_source_pixels)?,
            },
            keep_alive: KeepAliveConfig {
                url: lookup("KEEP_ALIVE_URL").filter(|url| !url.trim().is_empty()),
                interval_secs: var_or(&lookup, "KEEP_ALIVE_INTERVAL_SECS", defaults.keep_alive.interval_secs)?,
            },
        })
    }
}

fn var_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => parse_value(key, raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));

        let result = Config::from_lookup(lookup_from(&[("OCR_API_KEY", "  ")]));
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&[("OCR_API_KEY", "K81234567890")])).unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.ocr.api_url, DEFAULT_OCR_API_URL);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.engine, 2);
        assert_eq!(config.ocr.max_attempts, 3);
        assert_eq!(config.ocr.base_delay_secs, 2);
        assert_eq!(config.imaging.max_image_dimension, 2000);
        assert_eq!(config.imaging.max_upload_dimension, 1500);
        assert_eq!(config.imaging.max_source_pixels, 50_000_000);
        assert!(config.keep_alive.url.is_none());
    }

    #[test]
    fn test_overrides_and_port_fallback() {
        let config = Config::from_lookup(lookup_from(&[
            ("OCR_API_KEY", "key"),
            ("PORT", "10000"),
            ("OCR_LANGUAGE", "hin"),
            ("PDF_RENDER_DPI", "200"),
            ("KEEP_ALIVE_URL", "https://example.com/health"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 10000);
        assert_eq!(config.ocr.language, "hin");
        assert_eq!(config.imaging.pdf_dpi, 200.0);
        assert_eq!(config.keep_alive.url.as_deref(), Some("https://example.com/health"));
    }

    #[test]
    fn test_invalid_number_reported() {
        let result = Config::from_lookup(lookup_from(&[
            ("OCR_API_KEY", "key"),
            ("OCR_MAX_ATTEMPTS", "three"),
        ]));

        match result {
            Err(ConfigError::InvalidValue { key, value }) => {
                assert_eq!(key, "OCR_MAX_ATTEMPTS");
                assert_eq!(value, "three");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_api_key_masked_in_debug() {
        let config = OcrConfig {
            api_key: "K8123456SECRETPART".to_string(),
            ..OcrConfig::default()
        };

        let debug = format!("{:?}", config);
        assert!(debug.contains("K8123456..."));
        assert!(!debug.contains("SECRETPART"));
    }
}
