use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// `RUST_LOG` wins over the configured filter, which wins over [`DEFAULT_FILTER`]
pub fn env_filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(logging.filter.as_deref().unwrap_or(DEFAULT_FILTER))
    })
}

pub fn init_tracing(logging: &LoggingConfig) {
    let (json, pretty) = match logging.format {
        LogFormat::Json => (Some(fmt::layer().json()), None),
        LogFormat::Pretty => (None, Some(fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(env_filter(logging))
        .with(json)
        .with(pretty)
        .init();
}
