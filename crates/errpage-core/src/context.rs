//! Trusted per-request context.

use std::net::SocketAddr;

use http::header::{HeaderMap, HeaderName, InvalidHeaderName};
use serde_json::Value;

/// Maximum number of characters kept from the correlation header.
pub const RAY_ID_MAX_CHARS: usize = 16;

/// Default upstream correlation id header.
pub const DEFAULT_RAY_HEADER: &str = "cf-ray";

/// Default upstream forwarded client address header.
pub const DEFAULT_CLIENT_IP_HEADER: &str = "x-forwarded-for";

/// Key under which the correlation id is merged into page parameters.
pub const RAY_ID_KEY: &str = "ray_id";

/// Key under which the client address is merged into page parameters.
pub const CLIENT_IP_KEY: &str = "client_ip";

/// Request-scoped fields that override stored page parameters.
///
/// Always computed fresh per request; never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Upstream correlation id, at most 16 characters.
    pub ray_id: Option<String>,
    /// Client network address.
    pub client_ip: Option<String>,
}

impl RequestContext {
    /// Create a context from already-extracted values.
    pub fn new(ray_id: Option<String>, client_ip: Option<String>) -> Self {
        Self { ray_id, client_ip }
    }

    /// The context as `(key, value)` pairs, absent fields as `null`.
    pub fn fields(&self) -> [(&'static str, Value); 2] {
        [
            (RAY_ID_KEY, option_to_value(&self.ray_id)),
            (CLIENT_IP_KEY, option_to_value(&self.client_ip)),
        ]
    }
}

fn option_to_value(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

/// Extracts a [`RequestContext`] from inbound request metadata.
#[derive(Debug, Clone)]
pub struct ContextEnricher {
    ray_header: HeaderName,
    client_ip_header: HeaderName,
}

impl Default for ContextEnricher {
    fn default() -> Self {
        Self {
            ray_header: HeaderName::from_static(DEFAULT_RAY_HEADER),
            client_ip_header: HeaderName::from_static(DEFAULT_CLIENT_IP_HEADER),
        }
    }
}

impl ContextEnricher {
    /// Create an enricher reading the default trusted headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an enricher reading custom header names.
    pub fn with_headers(ray_header: &str, client_ip_header: &str) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            ray_header: HeaderName::from_bytes(ray_header.as_bytes())?,
            client_ip_header: HeaderName::from_bytes(client_ip_header.as_bytes())?,
        })
    }

    /// `Vary` value naming the headers a page's context is read from.
    ///
    /// Shared caches must key on these, or one client's ray id and address
    /// would be served to another.
    pub fn vary_header(&self) -> String {
        format!("{}, {}", self.ray_header, self.client_ip_header)
    }

    /// Build the context for one request.
    ///
    /// The client address comes from the forwarded header when it is present
    /// and non-empty, otherwise from the transport peer.
    pub fn enrich(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> RequestContext {
        let ray_id = header_str(headers, &self.ray_header)
            .map(|ray| ray.chars().take(RAY_ID_MAX_CHARS).collect());

        let client_ip = header_str(headers, &self.client_ip_header)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .or_else(|| peer.map(|addr| addr.ip().to_string()));

        RequestContext { ray_id, client_ip }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
