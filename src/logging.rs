use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise human-readable logging to stderr.
///
/// Level defaults to `INFO`; `RUST_LOG` overrides it (e.g.
/// `RUST_LOG=kistrader=debug`).
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init()
}
