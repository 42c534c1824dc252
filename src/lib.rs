//! Player Data Source - HTTP helpers for media playback
//!
//! This library resolves the HTTP user agent for a media request, builds a
//! configured HTTP data-source factory and classifies URIs as HTTP(S) or local.

pub mod core;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{
    config::DataSourceSettings,
    data_source::{
        build_data_source_factory, DataSpec, HttpDataSource, HttpDataSourceConfig,
        HttpDataSourceFactory, OpenedSource, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT,
    },
    error_handling::DataSourceError,
    user_agent::{
        resolve_user_agent, resolve_user_agent_from_entries, AgentDefaults, StaticAgentDefaults,
        SystemAgentDefaults,
    },
};

pub use utils::validation::is_http;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize the library with default settings
pub fn init() -> anyhow::Result<()> {
    utils::logging::init_tracing();

    tracing::info!("📚 {} v{} initialized", NAME, VERSION);
    Ok(())
}
