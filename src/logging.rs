// src/logging.rs
// =============================================================================
// Diagnostics setup.
//
// The report goes to stdout and is often redirected into a Markdown file, so
// every log line is written to stderr instead. `RUST_LOG` wins when set;
// otherwise --debug turns on debug output for this crate only.
// =============================================================================

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn level_for(debug: bool) -> Level {
    if debug {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

pub fn default_directive(debug: bool) -> String {
    format!(
        "{}={}",
        env!("CARGO_CRATE_NAME"),
        level_for(debug).to_string().to_lowercase()
    )
}

pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    // try_init: a second call (e.g. from tests) is not an error worth dying for
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(level_for(true), Level::DEBUG);
        assert_eq!(level_for(false), Level::WARN);
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "fpm_scout=debug");
        assert_eq!(default_directive(false), "fpm_scout=warn");
    }
}
