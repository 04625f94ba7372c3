//! Response cache headers.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::policy::CachePolicy;

/// Builder for cache response headers.
#[derive(Debug, Default)]
pub struct CacheHeadersBuilder {
    cache_control: Option<String>,
    etag: Option<String>,
}

impl CacheHeadersBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set Cache-Control from policy.
    pub fn cache_control_from_policy(mut self, policy: &CachePolicy) -> Self {
        self.cache_control = Some(policy.cache_control_header());
        self
    }

    /// Set ETag header.
    pub fn etag(mut self, value: impl Into<String>) -> Self {
        self.etag = Some(value.into());
        self
    }

    /// Build the headers.
    pub fn build(self) -> Vec<(String, String)> {
        let mut headers = Vec::new();

        if let Some(cc) = self.cache_control {
            headers.push(("Cache-Control".to_string(), cc));
        }

        if let Some(etag) = self.etag {
            headers.push(("ETag".to_string(), format!("\"{}\"", etag)));
        }

        headers
    }
}

/// Generate a simple ETag from content.
pub fn generate_etag(content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}
