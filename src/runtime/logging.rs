use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::runtime::config;

/// Install the global subscriber, filtered by the configured level and `BLOCKBRIDGE_LOG`.
pub fn init() {
    let format = fmt::layer()
        .with_level(true)
        .with_target(true)
        .compact();

    let level: LevelFilter = config::config().log_level;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var("BLOCKBRIDGE_LOG")
        .from_env_lossy();

    if tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .try_init()
        .is_err()
    {
        debug!("logger already initialized");
    }
}
