//! Tracing Setup
//!
//! Installs the global `tracing` subscriber from [`LoggingConfig`].
//!
//! `RUST_LOG` replaces the configured filter entirely. Otherwise the
//! filter is the base level plus the configured per-module directives.
//!
//! # Usage
//!
//! ```rust,ignore
//! use settlement_engine::telemetry::init_tracing;
//!
//! let config = load_config(None)?;
//! init_tracing(&config.logging)?;
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::{ConfigError, LogFormat, LoggingConfig};

/// Filter from `RUST_LOG`, falling back to level plus directives.
fn env_filter(logging: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    Ok(logging
        .parsed_directives()?
        .into_iter()
        .fold(EnvFilter::new(&logging.level), EnvFilter::add_directive))
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_tracing(
    logging: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let span_events = if logging.span_timings {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(logging)?)
        .with_span_events(span_events);

    match logging.format {
        LogFormat::Pretty => builder.pretty().try_init()?,
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .try_init()?,
    }

    tracing::info!(
        level = %logging.level,
        format = %logging.format,
        directives = logging.directives.len(),
        "Tracing initialized"
    );
    Ok(())
}
