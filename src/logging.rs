use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("LOKI_ENABLED is true but LOKI_URL is not set")]
    MissingLokiUrl,
    #[error("invalid log filter '{0}'")]
    InvalidFilter(String),
    #[error("failed to set up Loki: {0}")]
    Loki(String),
    #[error("a global subscriber is already installed")]
    AlreadyInitialized,
}

/// Where the fmt layer writes. The CLI keeps stdout for its own output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
    pub output: LogOutput,
}

impl LoggingConfig {
    pub fn from_env(service_name: &str, output: LogOutput) -> Self {
        Self::from_lookup(service_name, output, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(service_name: &str, output: LogOutput, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            loki_enabled: lookup("LOKI_ENABLED")
                .and_then(|v| v.trim().to_lowercase().parse().ok())
                .unwrap_or(false),
            loki_url: lookup("LOKI_URL").filter(|v| !v.trim().is_empty()),
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| service_name.to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            output,
        }
    }

    pub fn validate(&self) -> Result<(), LoggingError> {
        if self.loki_enabled && self.loki_url.is_none() {
            return Err(LoggingError::MissingLokiUrl);
        }
        self.filter().map(|_| ())
    }

    fn filter(&self) -> Result<EnvFilter, LoggingError> {
        EnvFilter::try_new(&self.log_level)
            .map_err(|_| LoggingError::InvalidFilter(self.log_level.clone()))
    }
}

pub fn init_logging(config: LoggingConfig) -> Result<(), LoggingError> {
    config.validate()?;

    #[cfg(feature = "loki")]
    {
        if config.loki_enabled {
            if let Some(loki_url) = config.loki_url.clone() {
                return init_with_loki(&config, &loki_url);
            }
        }
    }

    tracing_subscriber::registry()
        .with(config.filter()?)
        .with(fmt_layer(config.output))
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    tracing::debug!("Console logging initialized for {}", config.service_name);
    Ok(())
}

fn fmt_layer<S>(output: LogOutput) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    match output {
        LogOutput::Stdout => tracing_subscriber::fmt::layer().boxed(),
        LogOutput::Stderr => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed(),
    }
}

#[cfg(feature = "loki")]
fn init_with_loki(config: &LoggingConfig, loki_url: &str) -> Result<(), LoggingError> {
    let url = url::Url::parse(loki_url).map_err(|e| LoggingError::Loki(e.to_string()))?;

    let (loki_layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)
        .and_then(|b| b.label("environment", &config.environment))
        .and_then(|b| b.build_url(url))
        .map_err(|e| LoggingError::Loki(e.to_string()))?;

    // Ships buffered events to Loki in the background
    tokio::spawn(task);

    tracing_subscriber::registry()
        .with(config.filter()?)
        .with(fmt_layer(config.output))
        .with(loki_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    tracing::info!("✅ Loki logging initialized at {}", loki_url);
    Ok(())
}
