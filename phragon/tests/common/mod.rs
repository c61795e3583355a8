#![allow(dead_code)]

use phragon::{RouteDefinition, UrlPattern};
use std::{sync::Arc, time::Duration};

// ============================================================================
// Test Modules
// ============================================================================

/// A stand-in for an imported UI module.
#[derive(Debug, PartialEq, Eq)]
pub struct Page {
    pub title: &'static str,
}

pub type PageModule = Arc<Page>;

pub fn page(title: &'static str) -> PageModule {
    Arc::new(Page { title })
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

// ============================================================================
// Route Tables
// ============================================================================

pub fn blog_routes() -> Vec<RouteDefinition> {
    vec![
        RouteDefinition::new("home", "/"),
        RouteDefinition::new("user", "/user/{id:reg([0-9]+)}"),
        RouteDefinition::new("post", "/blog/{day:date(Y-m-d)}/{slug}"),
        RouteDefinition::new("archive", "/archive/{page:int(1, 500)?=1}"),
        RouteDefinition::new("feed", "/feed.{format:enum(rss, atom)}"),
    ]
}

pub fn blog_urls() -> UrlPattern {
    let urls = UrlPattern::new();
    urls.load_routes(blog_routes()).unwrap();
    urls
}
