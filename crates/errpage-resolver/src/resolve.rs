//! Resolution of a requested example name to a response outcome.

use std::sync::Arc;

use errpage_core::{CanonicalName, RequestContext};
use errpage_render::{PageRenderer, RenderError, RenderedPage};
use errpage_store::{ParameterStore, ResolutionCache};
use http::StatusCode;

/// Example served for the bare route.
pub const DEFAULT_EXAMPLE: &str = "default";

/// Status of a successfully rendered example. The page deliberately presents
/// as an upstream error.
pub const RENDERED_STATUS: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;

/// Terminal state of one resolution.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The display name was not lower-case; redirect to `location`
    /// (the lower-cased display name). No lookup was performed.
    Redirect { location: String },
    /// No usable parameter document exists.
    NotFound,
    /// Parameters were found and rendered.
    Rendered(RenderedPage),
}

impl Resolution {
    /// HTTP status for this outcome.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Redirect { .. } => StatusCode::FOUND,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Rendered(_) => RENDERED_STATUS,
        }
    }
}

/// Resolves raw example names through the cache and renderer.
pub struct ExampleResolver<S: ParameterStore, R: PageRenderer> {
    cache: Arc<ResolutionCache<S>>,
    renderer: R,
    use_edge_cache: bool,
}

impl<S: ParameterStore, R: PageRenderer> ExampleResolver<S, R> {
    /// Create a resolver. Rendered pages are edge-cacheable by default.
    pub fn new(cache: Arc<ResolutionCache<S>>, renderer: R) -> Self {
        Self {
            cache,
            renderer,
            use_edge_cache: true,
        }
    }

    /// Enable or disable the edge cache hint passed to the renderer.
    pub fn with_edge_cache(mut self, enabled: bool) -> Self {
        self.use_edge_cache = enabled;
        self
    }

    /// The resolution cache.
    pub fn cache(&self) -> &Arc<ResolutionCache<S>> {
        &self.cache
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Resolve `raw_name` for a request carrying `ctx`.
    ///
    /// Only renderer failures are errors; missing or malformed documents are
    /// a [`Resolution::NotFound`].
    pub fn resolve(&self, raw_name: &str, ctx: &RequestContext) -> Result<Resolution, RenderError> {
        let name = CanonicalName::parse(raw_name);

        if let Some(location) = name.redirect_target() {
            tracing::debug!(display = name.display(), %location, "redirecting to lower-case name");
            return Ok(Resolution::Redirect { location });
        }

        let lookup = self.cache.get_or_load(name.key());
        let cache_hit = lookup.is_hit();
        let Some(params) = lookup.record() else {
            tracing::debug!(key = name.key(), "example not found");
            return Ok(Resolution::NotFound);
        };

        let merged = params.merged_with(ctx);
        let page = self.renderer.render(&merged, self.use_edge_cache)?;
        tracing::debug!(key = name.key(), cache_hit, bytes = page.body.len(), "example rendered");
        Ok(Resolution::Rendered(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use errpage_core::{ContextEnricher, ParameterRecord};
    use errpage_render::{CachePolicy, ErrorPageRenderer, HTML_CONTENT_TYPE};
    use errpage_store::FsParameterStore;
    use http::{HeaderMap, HeaderValue};
    use serde_json::Value;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Renderer that records the merged parameters it receives.
    #[derive(Default)]
    struct RecordingRenderer {
        calls: Mutex<Vec<(ParameterRecord, bool)>>,
    }

    impl RecordingRenderer {
        fn last(&self) -> (ParameterRecord, bool) {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl PageRenderer for RecordingRenderer {
        fn render(&self, params: &ParameterRecord, use_edge_cache: bool) -> Result<RenderedPage, RenderError> {
            self.calls.lock().unwrap().push((params.clone(), use_edge_cache));
            let title = params.get_str("title").unwrap_or_default().to_string();
            Ok(RenderedPage {
                body: title,
                content_type: "text/plain",
                headers: Vec::new(),
                cache_policy: CachePolicy::none(),
            })
        }
    }

    struct FailingRenderer;

    impl PageRenderer for FailingRenderer {
        fn render(&self, _: &ParameterRecord, _: bool) -> Result<RenderedPage, RenderError> {
            Err(RenderError::InvalidParameter {
                key: "title".to_string(),
                expected: "a string",
            })
        }
    }

    fn resolver_with<R: PageRenderer>(
        docs: &[(&str, &str)],
        renderer: R,
    ) -> (TempDir, ExampleResolver<FsParameterStore, R>) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in docs {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let cache = Arc::new(ResolutionCache::new(FsParameterStore::new(dir.path())));
        (dir, ExampleResolver::new(cache, renderer))
    }

    fn load_count<R: PageRenderer>(resolver: &ExampleResolver<FsParameterStore, R>) -> u64 {
        resolver.cache().store().load_count()
    }

    // === Redirect Tests ===

    #[test]
    fn test_mixed_case_redirects_without_lookup() {
        let (_dir, resolver) = resolver_with(&[("default.json", "{}")], RecordingRenderer::default());

        let outcome = resolver.resolve("Default", &RequestContext::default()).unwrap();
        match &outcome {
            Resolution::Redirect { location } => assert_eq!(location, "default"),
            other => panic!("expected redirect, got {other:?}"),
        }
        assert_eq!(outcome.status(), StatusCode::FOUND);
        assert_eq!(load_count(&resolver), 0);
    }

    #[test]
    fn test_case_variants_redirect_to_same_target() {
        let (_dir, resolver) = resolver_with(&[], RecordingRenderer::default());
        for raw in ["DEFAULT", "Default", "dEfAuLt", "some/dir/DeFault"] {
            match resolver.resolve(raw, &RequestContext::default()).unwrap() {
                Resolution::Redirect { location } => assert_eq!(location, "default"),
                other => panic!("expected redirect for {raw}, got {other:?}"),
            }
        }
        assert_eq!(load_count(&resolver), 0);
    }

    // === Lookup Tests ===

    #[test]
    fn test_not_found_repeatedly_without_caching() {
        let (_dir, resolver) = resolver_with(&[], RecordingRenderer::default());

        for _ in 0..3 {
            let outcome = resolver.resolve("does-not-exist", &RequestContext::default()).unwrap();
            assert!(matches!(outcome, Resolution::NotFound));
            assert_eq!(outcome.status(), StatusCode::NOT_FOUND);
        }

        assert!(!resolver.cache().contains("doesnotexist"));
        assert!(resolver.cache().is_empty());
        assert_eq!(load_count(&resolver), 3);
    }

    #[test]
    fn test_non_word_characters_share_record() {
        let (_dir, resolver) =
            resolver_with(&[("example.json", r#"{"title":"Shared"}"#)], RecordingRenderer::default());

        let a = resolver.resolve("exa-mple", &RequestContext::default()).unwrap();
        let b = resolver.resolve("example", &RequestContext::default()).unwrap();

        for outcome in [a, b] {
            match outcome {
                Resolution::Rendered(page) => assert_eq!(page.body, "Shared"),
                other => panic!("expected render, got {other:?}"),
            }
        }
        assert_eq!(load_count(&resolver), 1);
    }

    #[test]
    fn test_second_request_served_from_cache() {
        let (_dir, resolver) =
            resolver_with(&[("default.json", r#"{"title":"X"}"#)], RecordingRenderer::default());

        let first_ctx = RequestContext::new(Some("one".into()), Some("1.1.1.1".into()));
        let second_ctx = RequestContext::new(Some("two".into()), Some("2.2.2.2".into()));

        resolver.resolve("default", &first_ctx).unwrap();
        let (first, _) = resolver.renderer().last();
        assert_eq!(load_count(&resolver), 1);

        resolver.resolve("default", &second_ctx).unwrap();
        let (second, _) = resolver.renderer().last();
        assert_eq!(load_count(&resolver), 1);
        assert_eq!(resolver.cache().stats().hits(), 1);

        assert_eq!(first.get_str("title"), second.get_str("title"));
        assert_eq!(second.get_str("ray_id"), Some("two"));
    }

    #[test]
    fn test_path_traversal_uses_last_component_only() {
        let (dir, resolver) = resolver_with(&[], RecordingRenderer::default());
        fs::write(dir.path().join("passwd.json"), r#"{"title":"inside"}"#).unwrap();

        match resolver.resolve("../../etc/passwd", &RequestContext::default()).unwrap() {
            Resolution::Rendered(page) => assert_eq!(page.body, "inside"),
            other => panic!("expected render, got {other:?}"),
        }
    }

    #[test]
    fn test_trailing_slash_is_not_found() {
        let (_dir, resolver) = resolver_with(&[("default.json", "{}")], RecordingRenderer::default());
        let outcome = resolver.resolve("default/", &RequestContext::default()).unwrap();
        assert!(matches!(outcome, Resolution::NotFound));
        assert_eq!(load_count(&resolver), 0);
    }

    // === Merge Tests ===

    #[test]
    fn test_context_overrides_stored_parameters() {
        let (_dir, resolver) = resolver_with(
            &[("default.json", r#"{"title":"X","ray_id":"stored","client_ip":"0.0.0.0"}"#)],
            RecordingRenderer::default(),
        );

        let ctx = RequestContext::new(Some("live".into()), None);
        resolver.resolve("default", &ctx).unwrap();

        let (merged, _) = resolver.renderer().last();
        assert_eq!(merged.get_str("ray_id"), Some("live"));
        assert_eq!(merged.get("client_ip"), Some(&Value::Null));
    }

    #[test]
    fn test_end_to_end_context_from_headers() {
        let (_dir, resolver) =
            resolver_with(&[("default.json", r#"{"title":"X"}"#)], RecordingRenderer::default());

        let mut headers = HeaderMap::new();
        headers.insert("cf-ray", HeaderValue::from_static("abcdef0123456789extra"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("9.9.9.9"));
        let ctx = ContextEnricher::new().enrich(&headers, None);

        let outcome = resolver.resolve("default", &ctx).unwrap();
        assert_eq!(outcome.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let (merged, use_edge_cache) = resolver.renderer().last();
        assert_eq!(merged.get_str("ray_id"), Some("abcdef0123456789"));
        assert_eq!(merged.get_str("client_ip"), Some("9.9.9.9"));
        assert_eq!(merged.get_str("title"), Some("X"));
        assert!(use_edge_cache);
    }

    #[test]
    fn test_edge_cache_flag_threaded_through() {
        let (_dir, resolver) = resolver_with(&[("default.json", "{}")], RecordingRenderer::default());
        let resolver = resolver.with_edge_cache(false);
        resolver.resolve("default", &RequestContext::default()).unwrap();
        assert!(!resolver.renderer().last().1);
    }

    // === Render Tests ===

    #[test]
    fn test_render_failure_propagates() {
        let (_dir, resolver) = resolver_with(&[("default.json", "{}")], FailingRenderer);
        assert!(resolver.resolve("default", &RequestContext::default()).is_err());
        assert!(resolver.cache().contains("default"));
    }

    #[test]
    fn test_html_renderer_produces_page() {
        let (_dir, resolver) =
            resolver_with(&[("default.json", r#"{"title":"X"}"#)], ErrorPageRenderer::default());

        match resolver.resolve("default", &RequestContext::default()).unwrap() {
            Resolution::Rendered(page) => {
                assert_eq!(page.content_type, HTML_CONTENT_TYPE);
                assert!(page.body.contains("X"));
                assert!(page.header("Cache-Control").unwrap().starts_with("public"));
            }
            other => panic!("expected render, got {other:?}"),
        }
    }
}
