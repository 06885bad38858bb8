use anyhow::{Context, Result};
use flexi_logger::{Logger, LoggerHandle};

/// Starts logging to stderr, the level comes from `RUST_LOG` and defaults to `warn`.
///
/// Keep the returned handle alive until the program ends.
pub fn init() -> Result<LoggerHandle> {
    Logger::try_with_env_or_str("warn")
        .context("Failed to parse log specification.")?
        .log_to_stderr()
        .start()
        .context("Failed to start logger.")
}
