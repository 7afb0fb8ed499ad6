use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `tinstore=debug`.
pub const LOG_ENV: &str = "TINSTORE_LOG";

/// Install a stderr subscriber so log lines never mix with rendered frames.
///
/// Without `TINSTORE_LOG` only warnings are shown. Set it to
/// `tinstore::devtools=info` to watch the counter's transitions.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}
