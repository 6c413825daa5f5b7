use tracing_subscriber::{filter::LevelFilter, fmt, util::SubscriberInitExt, EnvFilter};

/// Logs to stderr at `INFO` unless `RUST_LOG` says otherwise. Safe to call twice.
pub fn init() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .finish()
        .try_init();
}
