//! HTML error page rendering.
//!
//! The page mimics an upstream-error screen: a header with the error title and
//! code, three status boxes (browser, edge, host), two prose columns and a
//! footer carrying the ray id and client address.

use std::time::Duration;

use errpage_core::ParameterRecord;
use serde_json::{Map, Value};

use crate::error::RenderError;
use crate::headers::{generate_etag, CacheHeadersBuilder};
use crate::policy::CachePolicy;

/// Content type of rendered pages.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Default edge cache lifetime for rendered pages.
pub const DEFAULT_EDGE_TTL: Duration = Duration::from_secs(300);

const DEFAULT_TITLE: &str = "Internal server error";
const DEFAULT_ERROR_CODE: &str = "500";
const DEFAULT_WHAT_HAPPENED: &str = "<p>There is an unknown connection issue between the edge network and the origin web server. As a result, the web page can not be displayed.</p>";
const DEFAULT_WHAT_CAN_I_DO: &str = "<p>Please try again in a few minutes.</p>";
const DEFAULT_BRAND_TEXT: &str = "Cloudflare";
const DEFAULT_BRAND_LINK: &str = "https://www.cloudflare.com/";

/// A rendered document ready to be sent.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Document body.
    pub body: String,
    /// Content type of `body`.
    pub content_type: &'static str,
    /// Extra response headers (cache control, etag).
    pub headers: Vec<(String, String)>,
    /// Policy that produced the cache headers.
    pub cache_policy: CachePolicy,
}

impl RenderedPage {
    /// Get a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Turns merged page parameters into a document.
pub trait PageRenderer: Send + Sync {
    /// Render `params`. When `use_edge_cache` is set the page is marked as
    /// publicly cacheable.
    fn render(&self, params: &ParameterRecord, use_edge_cache: bool)
        -> Result<RenderedPage, RenderError>;
}

/// Built-in HTML error page renderer.
#[derive(Debug, Clone)]
pub struct ErrorPageRenderer {
    edge_ttl: Duration,
}

impl Default for ErrorPageRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_EDGE_TTL)
    }
}

impl ErrorPageRenderer {
    /// Create a renderer whose edge-cached pages live for `edge_ttl`.
    pub fn new(edge_ttl: Duration) -> Self {
        Self { edge_ttl }
    }
}

impl PageRenderer for ErrorPageRenderer {
    fn render(
        &self,
        params: &ParameterRecord,
        use_edge_cache: bool,
    ) -> Result<RenderedPage, RenderError> {
        let body = PageView::from_params(params.as_map())?.to_html();

        let policy = CachePolicy::for_flag(use_edge_cache, self.edge_ttl);
        let headers = CacheHeadersBuilder::new()
            .cache_control_from_policy(&policy)
            .etag(generate_etag(&body))
            .build();

        Ok(RenderedPage {
            body,
            content_type: HTML_CONTENT_TYPE,
            headers,
            cache_policy: policy,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Error,
}

impl Status {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "ok" => Some(Self::Ok),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    fn class(&self) -> &'static str {
        match self {
            Self::Ok => "cf-ok",
            Self::Error => "cf-error",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            Self::Ok => "&#10004;",
            Self::Error => "&#10006;",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Browser,
    Edge,
    Host,
}

impl Source {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "browser" => Some(Self::Browser),
            "cloudflare" => Some(Self::Edge),
            "host" => Some(Self::Host),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct StatusBox {
    source: Source,
    status: Status,
    location: String,
    name: String,
    status_text: String,
}

impl StatusBox {
    fn defaults(source: Source) -> Self {
        let (status, location, name, status_text) = match source {
            Source::Browser => (Status::Ok, "You", "Browser", "Working"),
            Source::Edge => (Status::Ok, "Edge", DEFAULT_BRAND_TEXT, "Working"),
            Source::Host => (Status::Error, "Origin", "Host", "Error"),
        };
        Self {
            source,
            status,
            location: location.to_string(),
            name: name.to_string(),
            status_text: status_text.to_string(),
        }
    }

    fn from_params(params: &Map<String, Value>, key: &str, source: Source) -> Result<Self, RenderError> {
        let mut status_box = Self::defaults(source);
        let Some(obj) = object(params, key)? else {
            return Ok(status_box);
        };

        if let Some(value) = scalar(obj, "status", key)? {
            status_box.status = Status::parse(&value).ok_or_else(|| RenderError::InvalidStatus {
                key: key.to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(location) = scalar(obj, "location", key)? {
            status_box.location = location;
        }
        if let Some(name) = scalar(obj, "name", key)? {
            status_box.name = name;
        }
        if let Some(text) = scalar(obj, "status_text", key)? {
            status_box.status_text = text;
        }
        Ok(status_box)
    }

    fn to_html(&self, error_source: Source) -> String {
        let highlight = if self.source == error_source { " cf-error-source" } else { "" };
        format!(
            r#"<div class="cf-status-item {class}{highlight}">
        <div class="cf-icon">{icon}</div>
        <span class="cf-status-location">{location}</span>
        <span class="cf-status-name">{name}</span>
        <span class="cf-status-text">{text}</span>
      </div>"#,
            class = self.status.class(),
            icon = self.status.icon(),
            location = escape_html(&self.location),
            name = escape_html(&self.name),
            text = escape_html(&self.status_text),
        )
    }
}

#[derive(Debug, Clone)]
struct Link {
    text: String,
    href: String,
}

/// Typed view of the parameters the template understands.
#[derive(Debug, Clone)]
struct PageView {
    title: String,
    error_code: String,
    html_title: String,
    time: String,
    what_happened: String,
    what_can_i_do: String,
    ray_id: Option<String>,
    client_ip: Option<String>,
    boxes: [StatusBox; 3],
    error_source: Source,
    more_information: Option<Link>,
    perf_sec_by: Link,
}

impl PageView {
    fn from_params(params: &Map<String, Value>) -> Result<Self, RenderError> {
        let title = top_scalar(params, "title")?.unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let error_code =
            top_scalar(params, "error_code")?.unwrap_or_else(|| DEFAULT_ERROR_CODE.to_string());
        let html_title = top_scalar(params, "html_title")?
            .unwrap_or_else(|| format!("{}: {}", error_code, title));
        let time = top_scalar(params, "time")?.unwrap_or_else(current_time);

        let error_source = match top_scalar(params, "error_source")? {
            Some(value) => Source::parse(&value).ok_or_else(|| RenderError::InvalidParameter {
                key: "error_source".to_string(),
                expected: "one of \"browser\", \"cloudflare\" or \"host\"",
            })?,
            None => Source::Host,
        };

        let boxes = [
            StatusBox::from_params(params, "browser_status", Source::Browser)?,
            StatusBox::from_params(params, "cloudflare_status", Source::Edge)?,
            StatusBox::from_params(params, "host_status", Source::Host)?,
        ];

        Ok(Self {
            what_happened: top_scalar(params, "what_happened")?
                .unwrap_or_else(|| DEFAULT_WHAT_HAPPENED.to_string()),
            what_can_i_do: top_scalar(params, "what_can_i_do")?
                .unwrap_or_else(|| DEFAULT_WHAT_CAN_I_DO.to_string()),
            ray_id: top_scalar(params, "ray_id")?,
            client_ip: top_scalar(params, "client_ip")?,
            more_information: more_information(params)?,
            perf_sec_by: link(params, "perf_sec_by")?.unwrap_or_else(|| Link {
                text: DEFAULT_BRAND_TEXT.to_string(),
                href: DEFAULT_BRAND_LINK.to_string(),
            }),
            title,
            error_code,
            html_title,
            time,
            boxes,
            error_source,
        })
    }

    fn to_html(&self) -> String {
        let boxes: String = self
            .boxes
            .iter()
            .map(|b| b.to_html(self.error_source))
            .collect::<Vec<_>>()
            .join("\n      ");

        let more_info = self
            .more_information
            .as_ref()
            .map(|l| {
                format!(
                    r#"<p class="cf-more-info">Visit <a href="{}" target="_blank" rel="noopener noreferrer">{}</a> for more information.</p>"#,
                    escape_html(&l.href),
                    escape_html(&l.text)
                )
            })
            .unwrap_or_default();

        let mut footer = Vec::new();
        if let Some(ray) = &self.ray_id {
            footer.push(format!(
                r#"<span class="cf-footer-item">Ray ID: <strong>{}</strong></span>"#,
                escape_html(ray)
            ));
        }
        if let Some(ip) = &self.client_ip {
            footer.push(format!(
                r#"<span class="cf-footer-item">Your IP: <span class="cf-client-ip">{}</span></span>"#,
                escape_html(ip)
            ));
        }
        footer.push(format!(
            r#"<span class="cf-footer-item">Performance &amp; security by <a href="{}" target="_blank" rel="noopener noreferrer">{}</a></span>"#,
            escape_html(&self.perf_sec_by.href),
            escape_html(&self.perf_sec_by.text)
        ));

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex, nofollow">
    <title>{html_title}</title>
    <style>{style}</style>
</head>
<body>
  <div id="cf-wrapper">
    <header class="cf-header">
      <h1><span class="cf-error-type">{title}</span> <span class="cf-error-code">Error code {error_code}</span></h1>
      {more_info}
      <div class="cf-time">{time}</div>
    </header>
    <div class="cf-status-boxes">
      {boxes}
    </div>
    <section class="cf-details">
      <div class="cf-column">
        <h2>What happened?</h2>
        {what_happened}
      </div>
      <div class="cf-column">
        <h2>What can I do?</h2>
        {what_can_i_do}
      </div>
    </section>
    <footer class="cf-footer">
      {footer}
    </footer>
  </div>
</body>
</html>"#,
            html_title = escape_html(&self.html_title),
            style = STYLE,
            title = escape_html(&self.title),
            error_code = escape_html(&self.error_code),
            time = escape_html(&self.time),
            what_happened = self.what_happened,
            what_can_i_do = self.what_can_i_do,
            footer = footer.join(" &bull; "),
        )
    }
}

fn more_information(params: &Map<String, Value>) -> Result<Option<Link>, RenderError> {
    let Some(obj) = object(params, "more_information")? else {
        return Ok(Some(Link {
            text: "cloudflare.com".to_string(),
            href: DEFAULT_BRAND_LINK.to_string(),
        }));
    };

    match obj.get("hidden") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {}
        Some(Value::Bool(true)) => return Ok(None),
        Some(_) => {
            return Err(RenderError::InvalidParameter {
                key: "more_information.hidden".to_string(),
                expected: "a boolean",
            })
        }
    }

    Ok(Some(Link {
        text: scalar(obj, "text", "more_information")?.unwrap_or_else(|| "cloudflare.com".to_string()),
        href: scalar(obj, "link", "more_information")?
            .unwrap_or_else(|| DEFAULT_BRAND_LINK.to_string()),
    }))
}

fn link(params: &Map<String, Value>, key: &str) -> Result<Option<Link>, RenderError> {
    let Some(obj) = object(params, key)? else {
        return Ok(None);
    };
    Ok(Some(Link {
        text: scalar(obj, "text", key)?.unwrap_or_else(|| DEFAULT_BRAND_TEXT.to_string()),
        href: scalar(obj, "link", key)?.unwrap_or_else(|| DEFAULT_BRAND_LINK.to_string()),
    }))
}

fn top_scalar(params: &Map<String, Value>, key: &str) -> Result<Option<String>, RenderError> {
    scalar_value(params.get(key), key)
}

fn scalar(obj: &Map<String, Value>, field: &str, parent: &str) -> Result<Option<String>, RenderError> {
    scalar_value(obj.get(field), &format!("{}.{}", parent, field))
}

/// Strings, numbers and booleans render as text; `null` means "use the default".
fn scalar_value(value: Option<&Value>, key: &str) -> Result<Option<String>, RenderError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(RenderError::InvalidParameter {
            key: key.to_string(),
            expected: "a string, number or boolean",
        }),
    }
}

fn object<'a>(params: &'a Map<String, Value>, key: &str) -> Result<Option<&'a Map<String, Value>>, RenderError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(obj)) => Ok(Some(obj)),
        Some(_) => Err(RenderError::InvalidParameter {
            key: key.to_string(),
            expected: "an object",
        }),
    }
}

fn current_time() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// HTML escape to prevent XSS.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const STYLE: &str = r#"
body{margin:0;font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,Helvetica,Arial,sans-serif;color:#313131;background:#fff}
#cf-wrapper{max-width:960px;margin:0 auto;padding:2rem 1rem}
.cf-header h1{font-size:2.2rem;font-weight:300;margin:0 0 .5rem}
.cf-error-code{font-size:1.2rem;color:#999}
.cf-time,.cf-more-info{color:#666;font-size:.9rem}
.cf-status-boxes{display:flex;gap:1rem;margin:2rem 0;text-align:center}
.cf-status-item{flex:1;padding:1rem;border-radius:4px;background:#f7f7f7}
.cf-status-item span{display:block}
.cf-error-source{background:#fde8e8}
.cf-icon{font-size:2rem}
.cf-ok .cf-icon,.cf-ok .cf-status-text{color:#9bca3e}
.cf-error .cf-icon,.cf-error .cf-status-text{color:#bd2426}
.cf-status-name{font-size:1.3rem}
.cf-details{display:flex;gap:2rem;padding:1.5rem 0;border-top:1px solid #ebebeb}
.cf-column{flex:1}
.cf-footer{border-top:1px solid #ebebeb;padding-top:1rem;font-size:.8rem;color:#666;text-align:center}
"#;
