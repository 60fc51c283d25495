use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_STANDALONE_API_URL: &str = "http://localhost:3001/api";
pub const DEFAULT_MA_WINDOWS: [usize; 3] = [50, 100, 200];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("{0} is required when USE_STANDALONE_BACKEND is false")]
    Missing(&'static str),
}

/// Timeout and retry policy shared by every outbound HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionBackendConfig {
    pub url: String,
    pub api_key: Option<String>,
}

/// Server-side configuration, loaded once at start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub yahoo_base_url: String,
    /// `None` switches the server to mock predictions.
    pub prediction_backend: Option<PredictionBackendConfig>,
    pub http: HttpClientConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match non_empty(&lookup, "PORT") {
            Some(raw) => parse_value("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let yahoo_base_url = non_empty(&lookup, "YAHOO_BASE_URL")
            .unwrap_or_else(|| DEFAULT_YAHOO_BASE_URL.to_string());
        validate_url("YAHOO_BASE_URL", &yahoo_base_url)?;

        let prediction_backend = match non_empty(&lookup, "PYTHON_ML_API_URL") {
            Some(url) => {
                validate_url("PYTHON_ML_API_URL", &url)?;
                Some(PredictionBackendConfig {
                    url,
                    api_key: non_empty(&lookup, "PYTHON_ML_API_KEY"),
                })
            }
            None => None,
        };

        Ok(Self {
            port,
            yahoo_base_url: yahoo_base_url.trim_end_matches('/').to_string(),
            prediction_backend,
            http: http_config(&lookup)?,
        })
    }
}

/// Which deployment of the backend a client talks to.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayTarget {
    Standalone { base_url: String },
    Functions { base_url: String, anon_key: String },
}

/// Client-side configuration used by the CLI and the data gateways.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub target: GatewayTarget,
    pub http: HttpClientConfig,
    pub windows: Vec<usize>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let use_standalone = match non_empty(&lookup, "USE_STANDALONE_BACKEND") {
            Some(raw) => parse_value::<bool>("USE_STANDALONE_BACKEND", &raw.to_lowercase())?,
            None => false,
        };

        let target = if use_standalone {
            let base_url = non_empty(&lookup, "STANDALONE_API_URL")
                .unwrap_or_else(|| DEFAULT_STANDALONE_API_URL.to_string());
            validate_url("STANDALONE_API_URL", &base_url)?;
            GatewayTarget::Standalone {
                base_url: base_url.trim_end_matches('/').to_string(),
            }
        } else {
            let base_url =
                non_empty(&lookup, "FUNCTIONS_URL").ok_or(ConfigError::Missing("FUNCTIONS_URL"))?;
            validate_url("FUNCTIONS_URL", &base_url)?;
            let anon_key = non_empty(&lookup, "FUNCTIONS_ANON_KEY")
                .ok_or(ConfigError::Missing("FUNCTIONS_ANON_KEY"))?;
            GatewayTarget::Functions {
                base_url: base_url.trim_end_matches('/').to_string(),
                anon_key,
            }
        };

        let windows = match non_empty(&lookup, "MA_WINDOWS") {
            Some(raw) => parse_windows(&raw)?,
            None => DEFAULT_MA_WINDOWS.to_vec(),
        };

        Ok(Self {
            target,
            http: http_config(&lookup)?,
            windows,
        })
    }
}

/// Parses a comma separated list of positive window sizes, e.g. `50,100,200`.
pub fn parse_windows(raw: &str) -> Result<Vec<usize>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<usize>() {
            Ok(0) | Err(_) => Err(ConfigError::Invalid {
                key: "MA_WINDOWS",
                value: raw.to_string(),
                reason: format!("'{s}' is not a positive integer"),
            }),
            Ok(w) => Ok(w),
        })
        .collect()
}

fn http_config<F>(lookup: &F) -> Result<HttpClientConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = HttpClientConfig::default();

    let timeout = match non_empty(lookup, "HTTP_TIMEOUT_SECS") {
        Some(raw) => Duration::from_secs(parse_value("HTTP_TIMEOUT_SECS", &raw)?),
        None => defaults.timeout,
    };
    let max_retries = match non_empty(lookup, "HTTP_MAX_RETRIES") {
        Some(raw) => parse_value("HTTP_MAX_RETRIES", &raw)?,
        None => defaults.max_retries,
    };
    let retry_base_delay = match non_empty(lookup, "HTTP_RETRY_BASE_MS") {
        Some(raw) => Duration::from_millis(parse_value("HTTP_RETRY_BASE_MS", &raw)?),
        None => defaults.retry_base_delay,
    };

    Ok(HttpClientConfig {
        timeout,
        max_retries,
        retry_base_delay,
    })
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn validate_url(key: &'static str, raw: &str) -> Result<(), ConfigError> {
    url::Url::parse(raw).map(|_| ()).map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_config_defaults_to_mock_predictions() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.yahoo_base_url, DEFAULT_YAHOO_BASE_URL);
        assert!(config.prediction_backend.is_none());
        assert_eq!(config.http, HttpClientConfig::default());
    }

    #[test]
    fn app_config_reads_prediction_backend() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("PYTHON_ML_API_URL", "http://ml.internal:5000/predict"),
            ("PYTHON_ML_API_KEY", "s3cret"),
            ("HTTP_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.http.timeout, Duration::from_secs(3));
        let backend = config.prediction_backend.unwrap();
        assert_eq!(backend.url, "http://ml.internal:5000/predict");
        assert_eq!(backend.api_key.as_deref(), Some("s3cret"));
    }

    #[test]
    fn blank_prediction_url_means_mock_mode() {
        let config = AppConfig::from_lookup(lookup(&[("PYTHON_ML_API_URL", "  ")])).unwrap();
        assert!(config.prediction_backend.is_none());
    }

    #[test]
    fn app_config_rejects_bad_port() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn client_config_selects_standalone() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("USE_STANDALONE_BACKEND", "true"),
            ("STANDALONE_API_URL", "http://localhost:4000/api/"),
        ]))
        .unwrap();

        assert_eq!(
            config.target,
            GatewayTarget::Standalone {
                base_url: "http://localhost:4000/api".into()
            }
        );
        assert_eq!(config.windows, vec![50, 100, 200]);
    }

    #[test]
    fn client_config_requires_functions_settings() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("FUNCTIONS_URL"));

        let config = ClientConfig::from_lookup(lookup(&[
            ("FUNCTIONS_URL", "https://project.functions.example"),
            ("FUNCTIONS_ANON_KEY", "anon"),
            ("MA_WINDOWS", "20, 50"),
        ]))
        .unwrap();
        assert!(matches!(config.target, GatewayTarget::Functions { .. }));
        assert_eq!(config.windows, vec![20, 50]);
    }

    #[test]
    fn windows_must_be_positive() {
        assert!(parse_windows("50,0").is_err());
        assert!(parse_windows("50,-3").is_err());
        assert_eq!(parse_windows("5").unwrap(), vec![5]);
    }
}
