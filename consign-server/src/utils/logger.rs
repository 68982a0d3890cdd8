//! Logging Infrastructure
//!
//! Structured logging setup:
//! - Console output filtered by `RUST_LOG` (default `info`)
//! - Daily rotating application logs under `{work_dir}/logs/app`

use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the logging system
///
/// Console layer plus a daily rotating JSON file layer under the
/// work directory. `RUST_LOG` overrides the default `info` level.
pub fn init_logger(work_dir: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer().with_target(true);

    let app_log_dir = Path::new(work_dir).join("logs").join("app");
    fs::create_dir_all(&app_log_dir)?;

    let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "app");
    let file_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::sync::Mutex::new(app_log));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer.with_filter(EnvFilter::new("info")))
        .try_init()?;

    Ok(())
}
