//! Domain filtering.
//!
//! Decides whether a request URL should be timed at all, based on the
//! configured filter mode and domain pattern lists.
//!
//! Patterns are literal domain suffixes: `example.com` matches
//! `example.com` and any subdomain such as `api.example.com`, but not
//! `notexample.com`. There is no wildcard or regex syntax. A pattern that
//! could never be a hostname suffix (contains whitespace, a scheme, a path,
//! or a `*`) never matches.

use serde::{Deserialize, Serialize};
use tracing::trace;
use url::Url;

/// How the domain lists are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Track every http(s) request.
    #[default]
    All,
    /// Track only hosts matching the whitelist.
    Whitelist,
    /// Track everything except hosts matching the blacklist.
    Blacklist,
}

impl FilterMode {
    /// Parse a stored mode name. Unknown or empty names fall back to `All`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "whitelist" => FilterMode::Whitelist,
            "blacklist" => FilterMode::Blacklist,
            _ => FilterMode::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Whitelist => "whitelist",
            FilterMode::Blacklist => "blacklist",
        }
    }
}

/// Immutable snapshot of the filter settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterConfig {
    pub mode: FilterMode,
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
}

impl FilterConfig {
    /// A config that tracks everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// A config that only tracks the given domains.
    pub fn whitelist<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: FilterMode::Whitelist,
            whitelist: patterns.into_iter().map(Into::into).collect(),
            blacklist: Vec::new(),
        }
    }

    /// A config that tracks everything except the given domains.
    pub fn blacklist<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: FilterMode::Blacklist,
            whitelist: Vec::new(),
            blacklist: patterns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Whether `pattern` can possibly be a hostname suffix.
pub fn is_valid_pattern(pattern: &str) -> bool {
    !pattern.is_empty()
        && !pattern.starts_with('.')
        && !pattern.ends_with('.')
        && !pattern
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '*' | '?' | '#' | '@'))
}

/// Returns true if `hostname` equals one of the patterns or is a subdomain
/// of one, ignoring ASCII case.
pub fn matches<S: AsRef<str>>(hostname: &str, patterns: &[S]) -> bool {
    if hostname.is_empty() {
        return false;
    }

    patterns.iter().any(|pattern| {
        let pattern = pattern.as_ref();
        is_valid_pattern(pattern) && host_matches(hostname, pattern)
    })
}

fn host_matches(hostname: &str, pattern: &str) -> bool {
    if hostname.eq_ignore_ascii_case(pattern) {
        return true;
    }

    // Strict subdomain: "<label>." followed by the pattern.
    let Some(split) = hostname.len().checked_sub(pattern.len() + 1) else {
        return false;
    };
    hostname.is_char_boundary(split)
        && hostname.as_bytes()[split] == b'.'
        && hostname[split + 1..].eq_ignore_ascii_case(pattern)
}

/// Extract the hostname of an http(s) URL.
///
/// Returns `None` for other schemes, unparseable URLs, and URLs without a
/// host.
pub fn http_host(url: &str) -> Option<String> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            trace!(url, error = %e, "Ignoring unparseable URL");
            return None;
        }
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}

/// Returns the hostname to track for `url`, or `None` if the request should
/// not be tracked under `config`.
pub fn tracked_host(url: &str, config: &FilterConfig) -> Option<String> {
    let host = http_host(url)?;

    let track = match config.mode {
        FilterMode::All => true,
        FilterMode::Whitelist => {
            !config.whitelist.is_empty() && matches(&host, &config.whitelist)
        }
        FilterMode::Blacklist => !matches(&host, &config.blacklist),
    };

    track.then_some(host)
}

/// Whether a request for `url` should be timed under `config`.
pub fn should_track(url: &str, config: &FilterConfig) -> bool {
    tracked_host(url, config).is_some()
}
