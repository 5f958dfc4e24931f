//! Configuration management for the CCCD OCR server

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Error raised when an environment variable holds an unusable value
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub admission: AdmissionConfig,
    pub storage: StorageConfig,
    pub normalization: NormalizationConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body for uploads
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// OCR.space API key
    pub api_key: Option<String>,
    pub endpoint: String,
    /// OCR.space language code (`vnm` for Vietnamese)
    pub language: String,
    /// OCR.space engine number (1 or 2)
    pub engine: u8,
    /// Ask the OCR service to auto-orient the image
    pub detect_orientation: bool,
    /// Rotate portrait uploads to landscape before sending them
    pub auto_rotate: bool,
    /// Deadline for establishing the connection
    pub connect_timeout: Duration,
    /// Overall deadline of one OCR request, connect and upload included.
    /// Expiry after the connection is up is reported as a read timeout.
    pub read_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Requests admitted per window
    pub request_limit: usize,
    pub window: Duration,
    /// Concurrent OCR calls
    pub max_slots: usize,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Where uploaded images are staged during OCR
    pub upload_dir: PathBuf,
    /// Where generated spreadsheets are written
    pub export_dir: PathBuf,
    /// Age after which exports are swept; `None` keeps them forever
    pub export_ttl: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizationConfig {
    /// JSON rule table replacing the built-in one
    pub rules_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                max_upload_bytes: 10 * 1024 * 1024,
            },
            ocr: OcrConfig {
                api_key: None,
                endpoint: "https://api.ocr.space/parse/image".to_string(),
                language: "vnm".to_string(),
                engine: 1,
                detect_orientation: false,
                auto_rotate: false,
                connect_timeout: Duration::from_secs(5),
                read_timeout: Duration::from_secs(60),
            },
            admission: AdmissionConfig {
                request_limit: 3,
                window: Duration::from_secs(20),
                max_slots: 2,
            },
            storage: StorageConfig {
                upload_dir: env::temp_dir().join("cccd-ocr-uploads"),
                export_dir: PathBuf::from("./exports"),
                export_ttl: Some(Duration::from_secs(3600)),
            },
            normalization: NormalizationConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    ///
    /// Unset variables fall back to [`Config::default`]; set but malformed
    /// ones are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let export_ttl_secs: u64 = parse_or(
            &var,
            "EXPORT_TTL_SECS",
            defaults.storage.export_ttl.map_or(0, |ttl| ttl.as_secs()),
        )?;

        Ok(Config {
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_or(&var, "SERVER_PORT", defaults.server.port)?,
                max_upload_bytes: parse_or(
                    &var,
                    "MAX_UPLOAD_BYTES",
                    defaults.server.max_upload_bytes,
                )?,
            },
            ocr: OcrConfig {
                api_key: var("OCR_API_KEY"),
                endpoint: var("OCR_ENDPOINT").unwrap_or(defaults.ocr.endpoint),
                language: var("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
                engine: parse_or(&var, "OCR_ENGINE", defaults.ocr.engine)?,
                detect_orientation: flag_or(
                    &var,
                    "OCR_DETECT_ORIENTATION",
                    defaults.ocr.detect_orientation,
                )?,
                auto_rotate: flag_or(&var, "AUTO_ROTATE", defaults.ocr.auto_rotate)?,
                connect_timeout: Duration::from_secs(parse_or(
                    &var,
                    "OCR_CONNECT_TIMEOUT_SECS",
                    defaults.ocr.connect_timeout.as_secs(),
                )?),
                read_timeout: Duration::from_secs(parse_or(
                    &var,
                    "OCR_READ_TIMEOUT_SECS",
                    defaults.ocr.read_timeout.as_secs(),
                )?),
            },
            admission: AdmissionConfig {
                request_limit: parse_or(
                    &var,
                    "RATE_LIMIT_REQUESTS",
                    defaults.admission.request_limit,
                )?,
                window: Duration::from_secs(parse_or(
                    &var,
                    "RATE_LIMIT_WINDOW_SECS",
                    defaults.admission.window.as_secs(),
                )?),
                max_slots: positive_or(&var, "MAX_CONCURRENT_OCR", defaults.admission.max_slots)?,
            },
            storage: StorageConfig {
                upload_dir: var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.upload_dir),
                export_dir: var("EXPORT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.export_dir),
                export_ttl: (export_ttl_secs > 0).then(|| Duration::from_secs(export_ttl_secs)),
            },
            normalization: NormalizationConfig {
                rules_path: var("NORMALIZATION_RULES").map(PathBuf::from),
            },
        })
    }
}

fn parse_or<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: name,
            value: raw,
        }),
        None => Ok(default),
    }
}

/// Like [`parse_or`], but zero is rejected
fn positive_or<F>(var: &F, name: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(var, name, default)? {
        0 => Err(ConfigError::InvalidValue {
            var: name,
            value: "0".to_string(),
        }),
        n => Ok(n),
    }
}

fn flag_or<F>(var: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                var: name,
                value: raw,
            }),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.ocr.language, "vnm");
        assert!(config.ocr.api_key.is_none());
        assert_eq!(config.ocr.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.ocr.read_timeout, Duration::from_secs(60));
        assert_eq!(config.admission.request_limit, 3);
        assert_eq!(config.admission.window, Duration::from_secs(20));
        assert_eq!(config.admission.max_slots, 2);
        assert_eq!(config.storage.export_ttl, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("OCR_API_KEY", "secret"),
            ("SERVER_PORT", "8080"),
            ("RATE_LIMIT_REQUESTS", "10"),
            ("RATE_LIMIT_WINDOW_SECS", "60"),
            ("MAX_CONCURRENT_OCR", "4"),
            ("AUTO_ROTATE", "true"),
            ("EXPORT_TTL_SECS", "0"),
            ("NORMALIZATION_RULES", "/etc/cccd/rules.json"),
        ]))
        .unwrap();

        assert_eq!(config.ocr.api_key.as_deref(), Some("secret"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.admission.request_limit, 10);
        assert_eq!(config.admission.window, Duration::from_secs(60));
        assert_eq!(config.admission.max_slots, 4);
        assert!(config.ocr.auto_rotate);
        assert!(config.storage.export_ttl.is_none());
        assert_eq!(
            config.normalization.rules_path,
            Some(PathBuf::from("/etc/cccd/rules.json"))
        );
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = Config::from_lookup(lookup(&[("OCR_API_KEY", "  "), ("SERVER_PORT", "")]))
            .unwrap();
        assert!(config.ocr.api_key.is_none());
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_malformed_number_is_rejected() {
        let err = Config::from_lookup(lookup(&[("RATE_LIMIT_REQUESTS", "three")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { var: "RATE_LIMIT_REQUESTS", .. }
        ));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let err = Config::from_lookup(lookup(&[("MAX_CONCURRENT_OCR", "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { var: "MAX_CONCURRENT_OCR", .. }
        ));
    }

    #[test]
    fn test_malformed_flag_is_rejected() {
        let err = Config::from_lookup(lookup(&[("AUTO_ROTATE", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("AUTO_ROTATE"));
    }
}
