//! Network utilities and helpers

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::core::error_handling::{DataSourceError, Result};

/// Maximum number of redirects followed for a single request
pub const MAX_REDIRECTS: usize = 20;

/// Convert plain string headers into a `HeaderMap`
pub fn headers_to_header_map(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|source| {
            DataSourceError::InvalidHeaderName {
                name: name.clone(),
                source,
            }
        })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|source| DataSourceError::InvalidHeaderValue {
                name: name.clone(),
                source,
            })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Build a `Range` header value for a byte window, if one is needed.
///
/// A zero position with no length reads the whole resource and needs no header.
pub fn range_header_value(position: u64, length: Option<u64>) -> Option<String> {
    match length {
        Some(len) if len > 0 => Some(format!(
            "bytes={}-{}",
            position,
            position.saturating_add(len - 1)
        )),
        _ if position > 0 => Some(format!("bytes={}-", position)),
        _ => None,
    }
}

/// Decide whether a redirect hop may be followed
pub fn redirect_allowed(allow_cross_protocol: bool, from: &Url, to: &Url) -> bool {
    allow_cross_protocol || from.scheme() == to.scheme()
}
