//! Edge cache policy for rendered pages.

use std::time::Duration;

/// Whether, and for how long, shared caches may keep a rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CachePolicy {
    edge_ttl: Option<Duration>,
}

impl CachePolicy {
    /// A policy that forbids caching.
    pub fn none() -> Self {
        Self { edge_ttl: None }
    }

    /// A public policy letting edge caches keep the page for `ttl`.
    pub fn edge(ttl: Duration) -> Self {
        Self {
            edge_ttl: Some(ttl),
        }
    }

    /// Pick the edge policy when `use_edge_cache` is set, else no caching.
    pub fn for_flag(use_edge_cache: bool, ttl: Duration) -> Self {
        if use_edge_cache {
            Self::edge(ttl)
        } else {
            Self::none()
        }
    }

    /// Check if intermediaries may cache the page.
    pub fn allows_cdn_caching(&self) -> bool {
        self.edge_ttl.is_some()
    }

    /// Cache-Control header value.
    pub fn cache_control_header(&self) -> String {
        match self.edge_ttl {
            Some(ttl) => format!("public, max-age={}", ttl.as_secs()),
            None => "no-store".to_string(),
        }
    }
}
