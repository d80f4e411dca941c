pub mod cmd;

use tracing_subscriber::EnvFilter;

// Logs go to stderr so batch output on stdout stays clean CSV.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(!cfg!(windows))
        .with_target(false)
        .compact()
        .init();
}
