//! User-agent resolution
//!
//! The effective user agent starts from an ambient default and can be
//! overridden by a `user-agent` entry in the caller's headers. The ambient
//! default is read through [`AgentDefaults`] on every call so the resolver
//! itself stays a pure function of its inputs.

use std::collections::HashMap;

/// Header key that overrides the default user agent (compared case-insensitively)
pub const USER_AGENT_HEADER: &str = "user-agent";

/// Environment variable holding the process-wide default HTTP agent
pub const HTTP_AGENT_ENV: &str = "HTTP_AGENT";

/// Source of the ambient default user agent
pub trait AgentDefaults {
    fn default_user_agent(&self) -> Option<String>;
}

/// Reads the default user agent from the process environment at call time
#[derive(Debug, Clone)]
pub struct SystemAgentDefaults {
    variable: String,
}

impl SystemAgentDefaults {
    pub fn new() -> Self {
        Self::with_variable(HTTP_AGENT_ENV)
    }

    pub fn with_variable(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl Default for SystemAgentDefaults {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentDefaults for SystemAgentDefaults {
    fn default_user_agent(&self) -> Option<String> {
        std::env::var(&self.variable).ok()
    }
}

/// A fixed default, e.g. taken from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticAgentDefaults(pub Option<String>);

impl AgentDefaults for StaticAgentDefaults {
    fn default_user_agent(&self) -> Option<String> {
        self.0.clone()
    }
}

impl<T: AgentDefaults + ?Sized> AgentDefaults for &T {
    fn default_user_agent(&self) -> Option<String> {
        (**self).default_user_agent()
    }
}

/// Resolve the effective user agent from `defaults` and optional `headers`.
///
/// Returns `None` when no default exists and no header overrides it.
pub fn resolve_user_agent<D>(defaults: &D, headers: Option<&HashMap<String, String>>) -> Option<String>
where
    D: AgentDefaults + ?Sized,
{
    match headers {
        Some(headers) => resolve_user_agent_from_entries(defaults, headers),
        None => defaults.default_user_agent(),
    }
}

/// Resolve the user agent from any sequence of header entries.
///
/// Every key equal to `user-agent` ignoring ASCII case overrides the value
/// seen so far, so with several differently-cased keys the last one in
/// iteration order wins.
pub fn resolve_user_agent_from_entries<D, I, K, V>(defaults: &D, entries: I) -> Option<String>
where
    D: AgentDefaults + ?Sized,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut user_agent = defaults.default_user_agent();
    for (key, value) in entries {
        if key.as_ref().eq_ignore_ascii_case(USER_AGENT_HEADER) {
            user_agent = Some(value.as_ref().to_string());
        }
    }
    user_agent
}
