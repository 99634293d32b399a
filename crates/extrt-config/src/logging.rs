//! Centralized logging initialization, following
//! `mill-config::logging::initialize` in the teacher repo.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LogFormat};

/// Initialize the global `tracing` subscriber.
///
/// Environment variables (priority order):
/// - `RUST_LOG` — standard filter directive, wins over everything.
/// - `LOG_FORMAT` — overrides `config.logging.format` (`json` | `pretty`).
pub fn init(config: &Config) {
    let log_level = config
        .logging
        .level
        .parse()
        .unwrap_or(tracing::Level::INFO);

    let env_filter = EnvFilter::from_default_env().add_directive(log_level.into());

    let format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|f| match f.to_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "human" => Some(LogFormat::Pretty),
            _ => None,
        })
        .unwrap_or(config.logging.format);

    // Always write to stderr: extensions may talk JSON-RPC or similar over stdout.
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Build a span carrying an extension's identity, entered by every stage
/// while it processes that extension.
pub fn extension_span(id: &str, name: &str, stage: &str) -> tracing::Span {
    tracing::info_span!("extension", id = %id, name = %name, stage = %stage)
}
