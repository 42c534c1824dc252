//! Core data-source logic
//!
//! User-agent resolution, the HTTP data-source factory and its configuration.

pub mod config;
pub mod data_source;
pub mod error_handling;
pub mod user_agent;


#[cfg(test)]
mod data_source_network_tests;

// Re-export commonly used types
pub use config::DataSourceSettings;
pub use data_source::{build_data_source_factory, HttpDataSourceFactory};
pub use user_agent::resolve_user_agent;
