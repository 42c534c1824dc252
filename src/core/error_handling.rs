//! Error types for HTTP data sources
//!
//! The resolver, factory builder and URI classifier are total and never fail.
//! Errors only appear once a factory is turned into a live client and a
//! request is issued.

use reqwest::header::{InvalidHeaderName, InvalidHeaderValue};
use thiserror::Error;

/// Errors raised while creating or opening an HTTP data source
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("Invalid URI {uri:?}: {message}")]
    InvalidUri { uri: String, message: String },

    #[error("Unsupported scheme for HTTP data source: {uri:?}")]
    UnsupportedScheme { uri: String },

    #[error("Invalid header name {name:?}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: InvalidHeaderName,
    },

    #[error("Invalid value for header {name:?}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: InvalidHeaderValue,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Server responded with HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Requested position {position} is beyond the end of the resource")]
    PositionOutOfRange { position: u64 },
}

impl DataSourceError {
    /// Whether a caller may reasonably retry the same request
    pub fn is_retryable(&self) -> bool {
        match self {
            DataSourceError::Client(err) => err.is_timeout() || err.is_connect(),
            DataSourceError::HttpStatus { status } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DataSourceError>;
