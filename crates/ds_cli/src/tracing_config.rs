//! Tracing setup for debugging conversions.
//!
//! The subscriber is only installed when `DESYNC_LOG` (or `RUST_LOG`) is
//! set. `DESYNC_LOG_FORMAT=json` switches from text lines to one JSON
//! object per event.
//!
//! ```bash
//! DESYNC_LOG=debug async-to-sync connection_async.py
//! DESYNC_LOG=ds_desugar=trace DESYNC_LOG_FORMAT=json async-to-sync cursor_async.py
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var("DESYNC_LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// `DESYNC_LOG` wins over `RUST_LOG` when both are set.
fn build_filter() -> EnvFilter {
    match std::env::var("DESYNC_LOG") {
        Ok(val) => EnvFilter::builder().parse_lossy(val),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Install the global subscriber, writing to stderr so stdout only ever
/// carries generated code.
pub fn init_tracing() {
    if std::env::var("DESYNC_LOG").is_err() && std::env::var("RUST_LOG").is_err() {
        return;
    }

    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
