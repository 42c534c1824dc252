//! URI validation utilities

/// Extract the raw scheme of a URI without normalising its case.
///
/// The scheme is everything before the first `:`, as long as that `:` is not
/// preceded by a `/`, `?` or `#` and the scheme is not empty.
pub fn scheme_of(uri: &str) -> Option<&str> {
    let end = uri.find([':', '/', '?', '#'])?;
    if end == 0 || uri.as_bytes()[end] != b':' {
        return None;
    }
    Some(&uri[..end])
}

/// Check if a URI should be streamed over HTTP.
///
/// The comparison is case-sensitive: `HTTP://host` is not treated as HTTP.
pub fn is_http(uri: Option<&str>) -> bool {
    match uri.and_then(scheme_of) {
        Some(scheme) => scheme == "http" || scheme == "https",
        None => false,
    }
}
