use tracing_subscriber::{fmt, EnvFilter};

/// Initialise logging on stderr so that stdout stays reserved for results.
///
/// An explicit level (flag or config) wins; otherwise `RUST_LOG` is honoured,
/// falling back to `info`.
pub fn init(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
