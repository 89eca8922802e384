use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "warn,tariff_service=info";

/// Install the global fmt subscriber. A non-empty, valid `RUST_LOG` replaces the
/// `warn,tariff_service=info` default entirely.
pub fn init_tracing() {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(rust_log.as_deref()))
        .with_target(false)
        .init();
}

fn env_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}
