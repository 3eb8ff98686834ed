use env_logger::Env;

/// Initializes the global logger.
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this more than once is a no-op.
pub fn init(default_filter: &str) {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init();
}
