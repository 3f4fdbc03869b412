// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Logging initialization and setup.

use crate::config::{LogConfig, LogError, LogFormat, LogOutput};
use std::io;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Initialize tracing with the specified format and optional log level.
///
/// Convenience wrapper over [`init_tracing_with_config`] for the common
/// case of a binary entrypoint.
pub fn init_tracing(format: LogFormat, level: Option<&str>) -> Result<(), LogError> {
    let config = LogConfig::new().with_format(format).with_level(level.unwrap_or("info"));
    init_tracing_with_config(config)
}

/// Initialize tracing with a detailed configuration.
///
/// Installs a global default subscriber; calling it twice in one process
/// fails, so the binary does this exactly once at startup.
pub fn init_tracing_with_config(config: LogConfig) -> Result<(), LogError> {
    let env_filter = build_env_filter(&config)?;
    let registry = Registry::default().with(env_filter);
    let ansi = config.use_color && config.format != LogFormat::Json;

    match config.format {
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(get_writer(&config.output))
                .with_target(config.include_targets)
                .with_span_events(FmtSpan::ACTIVE)
                .with_ansi(ansi)
                .pretty();
            if config.use_timestamps {
                registry.with(layer.with_timer(fmt::time::SystemTime)).init();
            } else {
                registry.with(layer.without_time()).init();
            }
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .with_writer(get_writer(&config.output))
                .with_target(config.include_targets)
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(ansi)
                .compact();
            if config.use_timestamps {
                registry.with(layer.with_timer(fmt::time::SystemTime)).init();
            } else {
                registry.with(layer.without_time()).init();
            }
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .with_writer(get_writer(&config.output))
                .json()
                .with_target(config.include_targets)
                .with_span_events(FmtSpan::FULL);
            if config.use_timestamps {
                registry.with(layer.with_timer(fmt::time::SystemTime)).init();
            } else {
                registry.with(layer.without_time()).init();
            }
        }
    }

    Ok(())
}

fn get_writer(output: &LogOutput) -> fn() -> Box<dyn io::Write + Send> {
    match output {
        LogOutput::Stderr => || Box::new(io::stderr()),
        LogOutput::Stdout => || Box::new(io::stdout()),
    }
}

fn build_env_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    let level_str = config.get_effective_level();

    EnvFilter::try_new(&level_str).map_err(|e| {
        LogError::ConfigError(format!("Failed to parse log filter '{level_str}': {e}"))
    })
}
