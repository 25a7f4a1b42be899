//! Default layer: every key has a value before any file is read.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

use crate::poller::PollPolicy;

/// Config builder with the built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("api.base_url", "http://localhost:8000")?
        .set_default("api.connect_timeout_secs", 10)?
        .set_default("api.request_timeout_secs", 30)?
        .set_default(
            "polling.interval_ms",
            PollPolicy::DEFAULT_INTERVAL.as_millis() as u64,
        )?
        .set_default("polling.max_attempts", PollPolicy::DEFAULT_MAX_ATTEMPTS)?
        .set_default(
            "polling.max_consecutive_errors",
            PollPolicy::DEFAULT_MAX_CONSECUTIVE_ERRORS,
        )
}
