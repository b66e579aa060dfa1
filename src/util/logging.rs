use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logs to stderr so tables and JSON on stdout stay clean. `RUST_LOG` overrides the level.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "info,idle_profit_finder=debug"
    } else {
        "warn,idle_profit_finder=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
