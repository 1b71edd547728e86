use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Pick the log filter: `--debug` and `--quiet` win, then `RUST_LOG`, then
/// the configured `log_filter`.
pub fn filter_for(debug: bool, quiet: bool, configured: &str) -> EnvFilter {
    if debug {
        EnvFilter::new("customfields=debug,customfields_cli=debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured))
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays machine readable.
pub fn init(debug: bool, quiet: bool, configured: &str) {
    let filter = filter_for(debug, quiet, configured);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug)
                .without_time(),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_configuration() {
        let debug = filter_for(true, false, "warn").to_string();
        assert!(debug.contains("customfields=debug"));
        assert_eq!(filter_for(false, true, "warn").to_string(), "error");
    }
}
