use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::cli::LogFormat;

const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber, writing to stderr.
///
/// `directive` wins over `RUST_LOG`; without either only warnings are shown.
pub fn init(directive: Option<&str>, format: LogFormat) -> Result<()> {
    let filter = match directive {
        Some(d) => EnvFilter::try_new(d).with_context(|| format!("invalid log filter `{d}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}
