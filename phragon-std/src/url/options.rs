//! Options consumed by [`UrlPattern::make_url`].
//!
//! [`UrlPattern::make_url`]: super::UrlPattern::make_url

use super::query::Nullable;
use phragon_core::{Params, Value};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// URL scheme used when a host is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// `http://`
    #[default]
    Http,
    /// `https://`
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        })
    }
}

/// A literal path: a string, or segments joined with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlPath {
    /// Used verbatim.
    Str(String),
    /// Joined with `/`.
    Segments(Vec<String>),
}

impl UrlPath {
    /// The path as one string.
    pub fn joined(&self) -> String {
        match self {
            UrlPath::Str(s) => s.clone(),
            UrlPath::Segments(segments) => segments.join("/"),
        }
    }
}

impl From<&str> for UrlPath {
    fn from(value: &str) -> Self {
        UrlPath::Str(value.to_string())
    }
}

impl From<String> for UrlPath {
    fn from(value: String) -> Self {
        UrlPath::Str(value)
    }
}

impl From<Vec<String>> for UrlPath {
    fn from(value: Vec<String>) -> Self {
        UrlPath::Segments(value)
    }
}

impl From<&[&str]> for UrlPath {
    fn from(value: &[&str]) -> Self {
        UrlPath::Segments(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for UrlPath {
    fn from(value: [&str; N]) -> Self {
        UrlPath::Segments(value.iter().map(|s| s.to_string()).collect())
    }
}

/// The query part of a URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Search {
    /// Appended verbatim (a leading `?` is tolerated).
    Raw(String),
    /// Serialized with [`build_query`](super::build_query).
    Query(serde_json::Value),
}

impl From<&str> for Search {
    fn from(value: &str) -> Self {
        Search::Raw(value.to_string())
    }
}

impl From<String> for Search {
    fn from(value: String) -> Self {
        Search::Raw(value)
    }
}

impl From<serde_json::Value> for Search {
    fn from(value: serde_json::Value) -> Self {
        Search::Query(value)
    }
}

/// Everything [`UrlPattern::make_url`](super::UrlPattern::make_url) needs to
/// build one URL.
///
/// # Example
///
/// ```rust,ignore
/// let url = urls.make_url(
///     &UrlOptions::named("user")
///         .param("id", 42)
///         .search(json!({"tab": "posts"}))
///         .hash("top"),
/// )?;
/// assert_eq!(url, "/user/42?tab=posts#top");
/// ```
#[derive(Clone, Default)]
pub struct UrlOptions {
    /// Route name to resolve through the registry.
    pub name: Option<String>,
    /// Literal path, used when no name is given.
    pub path: Option<UrlPath>,
    /// Host; prefixes `protocol://host[:port]`.
    pub host: Option<String>,
    /// Port appended to the host.
    pub port: Option<u16>,
    /// Scheme used with `host`.
    pub protocol: Protocol,
    /// Parameter values for the pattern.
    pub params: Option<Params>,
    /// Query part.
    pub search: Option<Search>,
    /// Fragment, with or without the leading `#`.
    pub hash: Option<String>,
    /// Reuse compiled ad hoc patterns for literal paths with params.
    pub cacheable: bool,
    /// Decides whether `null` query values are emitted.
    pub nullable: Option<Arc<Nullable>>,
}

impl UrlOptions {
    /// Options resolving a named route.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Options for a literal path.
    pub fn path(path: impl Into<UrlPath>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Set the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the scheme.
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Replace all parameter values.
    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Add one parameter value.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.get_or_insert_with(Params::new).insert(name, value);
        self
    }

    /// Set the query part.
    pub fn search(mut self, search: impl Into<Search>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Set the fragment.
    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Cache the ad hoc pattern compiled for a literal path.
    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    /// Emit `null` query values for which `predicate(value, key)` holds.
    pub fn nullable<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&serde_json::Value, &str) -> bool + Send + Sync + 'static,
    {
        self.nullable = Some(Arc::new(predicate));
        self
    }
}

impl fmt::Debug for UrlOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlOptions")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("protocol", &self.protocol)
            .field("params", &self.params)
            .field("search", &self.search)
            .field("hash", &self.hash)
            .field("cacheable", &self.cacheable)
            .field("nullable", &self.nullable.is_some())
            .finish()
    }
}
