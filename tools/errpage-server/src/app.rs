//! HTTP routes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{ConnectInfo, Path, Request, State};
use axum::http::header::{CONTENT_TYPE, LOCATION, VARY};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use errpage_core::ContextEnricher;
use errpage_render::{ErrorPageRenderer, RenderedPage};
use errpage_resolver::{ExampleResolver, Resolution, DEFAULT_EXAMPLE, RENDERED_STATUS};
use errpage_store::{FsParameterStore, ResolutionCache};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

/// Resolver over the filesystem store and the built-in page template.
pub type AppResolver = ExampleResolver<FsParameterStore, ErrorPageRenderer>;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    resolver: Arc<AppResolver>,
    enricher: Arc<ContextEnricher>,
}

impl AppState {
    /// Create state from its parts.
    pub fn new(resolver: AppResolver, enricher: ContextEnricher) -> Self {
        Self {
            resolver: Arc::new(resolver),
            enricher: Arc::new(enricher),
        }
    }

    /// Build the store, cache, renderer and enricher described by `config`.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let store = FsParameterStore::new(&config.examples.dir);
        let cache = Arc::new(ResolutionCache::new(store));
        let renderer =
            ErrorPageRenderer::new(Duration::from_secs(config.examples.edge_cache_ttl_secs));
        let resolver = ExampleResolver::new(cache, renderer).with_edge_cache(config.examples.edge_cache);

        let enricher = ContextEnricher::with_headers(&config.headers.ray, &config.headers.client_ip)
            .context("Invalid trusted header name")?;

        Ok(Self::new(resolver, enricher))
    }

    /// The example resolver.
    pub fn resolver(&self) -> &AppResolver {
        &self.resolver
    }
}

/// Build the application router.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let prefix = config.server.url_prefix.as_str();

    Router::new()
        .route(&format!("{prefix}/health"), get(health))
        .route(&format!("{prefix}/examples"), get(default_example))
        .route(&format!("{prefix}/examples/"), get(default_example))
        .route(&format!("{prefix}/examples/{{*name}}"), get(named_example))
        .nest_service(&format!("{prefix}/editor"), ServeDir::new(&config.editor.dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn default_example(State(state): State<AppState>, req: Request) -> Response {
    serve_example(state, DEFAULT_EXAMPLE.to_string(), req).await
}

async fn named_example(
    State(state): State<AppState>,
    Path(name): Path<String>,
    req: Request,
) -> Response {
    serve_example(state, name, req).await
}

async fn serve_example(state: AppState, name: String, req: Request) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ctx = state.enricher.enrich(req.headers(), peer);
    let path = req.uri().path().to_string();

    // Store reads are blocking file I/O.
    let resolver = Arc::clone(&state.resolver);
    let outcome = tokio::task::spawn_blocking(move || resolver.resolve(&name, &ctx)).await;

    match outcome {
        Ok(Ok(Resolution::Redirect { location })) => {
            let target = redirect_target(&path, &location);
            tracing::info!(from = %path, to = %target, "redirecting example");
            redirect(&target)
        }
        Ok(Ok(Resolution::NotFound)) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        Ok(Ok(Resolution::Rendered(page))) => page_response(page, &state.enricher),
        Ok(Err(e)) => {
            tracing::error!(path = %path, error = %e, "failed to render example");
            internal_error()
        }
        Err(e) => {
            tracing::error!(path = %path, error = %e, "example resolution task failed");
            internal_error()
        }
    }
}

/// Replace the last segment of `path` with the encoded `location`.
pub fn redirect_target(path: &str, location: &str) -> String {
    let base = match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    };
    format!("{}{}", base, urlencoding::encode(location))
}

fn redirect(target: &str) -> Response {
    match HeaderValue::from_str(target) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(_) => internal_error(),
    }
}

fn page_response(page: RenderedPage, enricher: &ContextEnricher) -> Response {
    let shared = page.cache_policy.allows_cdn_caching();
    let mut response = (
        RENDERED_STATUS,
        [(CONTENT_TYPE, HeaderValue::from_static(page.content_type))],
        page.body,
    )
        .into_response();

    let headers = response.headers_mut();
    for (name, value) in page.headers {
        match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "dropping invalid response header"),
        }
    }

    // The page embeds per-request context.
    if shared {
        match HeaderValue::try_from(enricher.vary_header()) {
            Ok(value) => {
                headers.insert(VARY, value);
            }
            Err(e) => tracing::warn!(error = %e, "dropping invalid Vary header"),
        }
    }

    response
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_target_replaces_last_segment() {
        assert_eq!(redirect_target("/examples/Default", "default"), "/examples/default");
        assert_eq!(redirect_target("/cf/examples/a/B", "b"), "/cf/examples/a/b");
    }

    #[test]
    fn test_redirect_target_encodes() {
        assert_eq!(redirect_target("/examples/My%20Page", "my page"), "/examples/my%20page");
    }

    #[test]
    fn test_redirect_target_without_slash() {
        assert_eq!(redirect_target("", "x"), "/x");
    }
}
