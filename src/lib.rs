pub mod config;
pub mod grade;
pub mod history;
pub mod paths;
pub mod render;

/// Install the stderr `tracing` subscriber used by the binaries.
///
/// `RUST_LOG` wins when set; otherwise `promptgrade=debug` with `verbose`
/// and `promptgrade=warn` without.
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "promptgrade=debug"
    } else {
        "promptgrade=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
