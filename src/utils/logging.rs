/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "player_data_source=info";

pub fn init_tracing() {
    init_tracing_with(DEFAULT_LOG_FILTER);
}

/// Install a fmt subscriber, preferring `RUST_LOG` over `fallback`.
///
/// Repeated initialisation is ignored.
pub fn init_tracing_with(fallback: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| fallback.into());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
