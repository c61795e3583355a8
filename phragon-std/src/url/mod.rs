//! # URL Registry and Builder
//!
//! [`UrlPattern`] maps route names to compiled patterns and builds URLs from
//! them:
//!
//! ```rust,ignore
//! let urls = UrlPattern::new();
//! urls.set("user", "/user/{id:int}")?;
//!
//! let url = urls.make_url(
//!     &UrlOptions::named("user")
//!         .param("id", 42)
//!         .host("example.com")
//!         .protocol(Protocol::Https),
//! )?;
//! assert_eq!(url, "https://example.com/user/42");
//! ```

mod config;
mod options;
mod query;

pub use config::RouteDefinition;
pub use options::{Protocol, Search, UrlOptions, UrlPath};
pub use query::{MAX_DEPTH, Nullable, build_query};

use crate::{
    modifiers::ModifierRegistry,
    pattern::{Pattern, PatternCache},
};
use parking_lot::RwLock;
use phragon_core::{BuildError, Params, PatternError, PhragonError};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

/// Named route registry and URL builder.
///
/// Routes are normally registered once at startup and read from then on, but
/// every method takes `&self`, so the registry can live in an `Arc`.
#[derive(Debug, Default)]
pub struct UrlPattern {
    modifiers: ModifierRegistry,
    cache: PatternCache,
    routes: RwLock<HashMap<String, Arc<Pattern>>>,
}

impl UrlPattern {
    /// Create an empty registry using the built-in modifiers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry using a custom modifier set.
    pub fn with_modifiers(modifiers: ModifierRegistry) -> Self {
        Self {
            modifiers,
            cache: PatternCache::new(),
            routes: RwLock::default(),
        }
    }

    /// The modifiers templates are compiled with.
    pub fn modifiers(&self) -> &ModifierRegistry {
        &self.modifiers
    }

    /// Compile `template` and register it under `name`, replacing any previous
    /// route of that name.
    pub fn set(&self, name: impl Into<String>, template: &str) -> Result<(), PatternError> {
        let pattern = self.cache.get_or_compile(template, &self.modifiers)?;
        self.set_pattern(name, pattern);
        Ok(())
    }

    /// Register an already compiled pattern under `name`.
    pub fn set_pattern(&self, name: impl Into<String>, pattern: Arc<Pattern>) {
        let name = name.into();
        #[cfg(feature = "tracing")]
        tracing::debug!(route = %name, template = pattern.template(), "registered route");
        self.routes.write().insert(name, pattern);
    }

    /// The pattern registered under `name`, or `None`.
    pub fn get(&self, name: &str) -> Option<Arc<Pattern>> {
        self.routes.read().get(name).cloned()
    }

    /// Remove the route `name`, returning its pattern.
    pub fn del(&self, name: &str) -> Option<Arc<Pattern>> {
        let removed = self.routes.write().remove(name);
        #[cfg(feature = "tracing")]
        if removed.is_some() {
            tracing::debug!(route = name, "removed route");
        }
        removed
    }

    /// Whether a route named `name` is registered.
    pub fn has(&self, name: &str) -> bool {
        self.routes.read().contains_key(name)
    }

    /// Registered route names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.routes.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    /// Whether no route is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }

    /// Match `path` against the route `name`.
    pub fn matches(&self, name: &str, path: &str) -> Option<Params> {
        self.get(name)?.matches(path)
    }

    /// Register a route table.
    ///
    /// The whole table is compiled before anything is registered, so a bad
    /// entry leaves the registry untouched. Returns the number of routes added.
    pub fn load_routes<I>(&self, routes: I) -> Result<usize, PatternError>
    where
        I: IntoIterator<Item = RouteDefinition>,
    {
        let mut seen = HashSet::new();
        let mut compiled = Vec::new();
        for route in routes {
            if !seen.insert(route.name.clone()) {
                return Err(PatternError::DuplicateRoute(route.name));
            }
            let pattern = self.cache.get_or_compile(&route.path, &self.modifiers)?;
            compiled.push((route.name, pattern));
        }

        let count = compiled.len();
        for (name, pattern) in compiled {
            self.set_pattern(name, pattern);
        }
        Ok(count)
    }

    /// Register a route table given as a JSON array of `{name, path}` objects.
    pub fn load_routes_json(&self, json: &str) -> Result<usize, PhragonError> {
        let routes: Vec<RouteDefinition> =
            serde_json::from_str(json).map_err(|e| PhragonError::Custom(Box::new(e)))?;
        Ok(self.load_routes(routes)?)
    }

    /// Build a URL.
    ///
    /// The path comes from the named route (filled with `params`) or from the
    /// literal `path`; a literal path with `params` is compiled as an ad hoc
    /// pattern first. The result always starts with `/` unless it is already an
    /// absolute `http(s)://` URL; `host`, `search` and `hash` are added around it.
    pub fn make_url(&self, options: &UrlOptions) -> Result<String, BuildError> {
        let empty = Params::new();
        let params = options.params.as_ref();

        let mut url = match (&options.name, &options.path) {
            (Some(name), _) => {
                let pattern = self
                    .get(name)
                    .ok_or_else(|| BuildError::UnknownRoute(name.clone()))?;
                pattern.to_path(params.unwrap_or(&empty))?
            }
            (None, Some(path)) => {
                let path = path.joined();
                match params {
                    Some(params) => self.ad_hoc(&path, options.cacheable)?.to_path(params)?,
                    None => path,
                }
            }
            (None, None) => String::new(),
        };

        if !is_absolute(&url) {
            if !url.starts_with('/') {
                url.insert(0, '/');
            }
            if let Some(host) = &options.host {
                let origin = match options.port {
                    Some(port) => format!("{}://{host}:{port}", options.protocol),
                    None => format!("{}://{host}", options.protocol),
                };
                url.insert_str(0, &origin);
            }
        }

        let query = match &options.search {
            Some(Search::Raw(raw)) => raw.strip_prefix('?').unwrap_or(raw).to_string(),
            Some(Search::Query(value)) => build_query(value, options.nullable.as_deref()),
            None => String::new(),
        };
        if !query.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }

        if let Some(hash) = options.hash.as_deref().filter(|h| !h.is_empty()) {
            if !hash.starts_with('#') {
                url.push('#');
            }
            url.push_str(hash);
        }

        Ok(url)
    }

    fn ad_hoc(&self, template: &str, cacheable: bool) -> Result<Arc<Pattern>, PatternError> {
        if cacheable {
            self.cache.get_or_compile(template, &self.modifiers)
        } else {
            Pattern::compile(template, &self.modifiers).map(Arc::new)
        }
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> UrlPattern {
        let urls = UrlPattern::new();
        urls.set("home", "/").unwrap();
        urls.set("user", "/user/{id}").unwrap();
        urls.set("archive", "/archive/{year:int}/{month?}").unwrap();
        urls
    }

    #[test]
    fn test_registry_basics() {
        let urls = registry();
        assert!(urls.has("user"));
        assert!(urls.get("nope").is_none());
        assert_eq!(urls.names(), vec!["archive", "home", "user"]);

        assert!(urls.del("user").is_some());
        assert!(!urls.has("user"));
        assert!(urls.del("user").is_none());
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn test_set_rejects_bad_template() {
        let urls = UrlPattern::new();
        assert!(urls.set("bad", "/{x:nope}").is_err());
        assert!(!urls.has("bad"));
    }

    #[test]
    fn test_named_route() {
        let urls = registry();
        let url = urls
            .make_url(&UrlOptions::named("user").param("id", "42"))
            .unwrap();
        assert_eq!(url, "/user/42");

        let url = urls
            .make_url(&UrlOptions::named("archive").param("year", 2021))
            .unwrap();
        assert_eq!(url, "/archive/2021");
    }

    #[test]
    fn test_named_route_errors() {
        let urls = registry();
        assert_eq!(
            urls.make_url(&UrlOptions::named("missing")),
            Err(BuildError::UnknownRoute("missing".into()))
        );
        assert_eq!(
            urls.make_url(&UrlOptions::named("user")),
            Err(BuildError::MissingParam("id".into()))
        );
    }

    #[test]
    fn test_literal_paths() {
        let urls = UrlPattern::new();
        assert_eq!(urls.make_url(&UrlOptions::path("p")).unwrap(), "/p");
        assert_eq!(
            urls.make_url(&UrlOptions::path(["api", "v1", "items"])).unwrap(),
            "/api/v1/items"
        );
        assert_eq!(
            urls.make_url(&UrlOptions::path("https://cdn.example.com/x"))
                .unwrap(),
            "https://cdn.example.com/x"
        );
        assert_eq!(urls.make_url(&UrlOptions::default()).unwrap(), "/");
    }

    #[test]
    fn test_ad_hoc_pattern() {
        let urls = UrlPattern::new();
        let options = UrlOptions::path("/post/{slug}").param("slug", "hello world");
        assert_eq!(urls.make_url(&options).unwrap(), "/post/hello%20world");
        assert_eq!(urls.cache.len(), 0);

        let cached = options.cacheable(true);
        assert_eq!(urls.make_url(&cached).unwrap(), "/post/hello%20world");
        assert_eq!(urls.cache.len(), 1);
    }

    #[test]
    fn test_host_and_port() {
        let urls = registry();
        let url = urls
            .make_url(
                &UrlOptions::named("user")
                    .param("id", 7)
                    .host("example.com")
                    .port(8080),
            )
            .unwrap();
        assert_eq!(url, "http://example.com:8080/user/7");

        let url = urls
            .make_url(
                &UrlOptions::named("home")
                    .host("example.com")
                    .protocol(Protocol::Https),
            )
            .unwrap();
        assert_eq!(url, "https://example.com/");
    }

    #[test]
    fn test_search_and_hash() {
        let urls = UrlPattern::new();
        let url = urls
            .make_url(&UrlOptions::path("/p").search(json!({"a": 1, "b": [2, 3]})))
            .unwrap();
        assert_eq!(url, "/p?a=1&b[]=2&b[]=3");

        let url = urls
            .make_url(&UrlOptions::path("/p?x=1").search("?y=2").hash("top"))
            .unwrap();
        assert_eq!(url, "/p?x=1&y=2#top");

        let url = urls
            .make_url(&UrlOptions::path("/p").search(json!({})).hash("#frag"))
            .unwrap();
        assert_eq!(url, "/p#frag");
    }

    #[test]
    fn test_nullable_predicate() {
        let urls = UrlPattern::new();
        let options = UrlOptions::path("/p").search(json!({"a": null, "b": null}));
        assert_eq!(urls.make_url(&options).unwrap(), "/p");

        let options = options.nullable(|_, key| key == "b");
        assert_eq!(urls.make_url(&options).unwrap(), "/p?b=");
    }

    #[test]
    fn test_load_routes() {
        let urls = UrlPattern::new();
        let count = urls
            .load_routes_json(r#"[{"name": "a", "path": "/a"}, {"name": "b", "path": "/b/{x}"}]"#)
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(urls.matches("b", "/b/1"), Some(Params::new().with("x", "1")));
    }

    #[test]
    fn test_load_routes_rejects_duplicates() {
        let urls = UrlPattern::new();
        let err = urls
            .load_routes([
                RouteDefinition::new("a", "/a"),
                RouteDefinition::new("a", "/other"),
            ])
            .unwrap_err();
        assert_eq!(err, PatternError::DuplicateRoute("a".into()));
        assert!(urls.is_empty());
    }
}
