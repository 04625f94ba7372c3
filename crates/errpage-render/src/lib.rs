//! Error-page rendering for resolved examples.
//!
//! This crate provides:
//! - `PageRenderer` - Rendering collaborator interface
//! - `ErrorPageRenderer` - Built-in HTML error page template
//! - `CachePolicy` - Edge cache policy for rendered pages
//! - `CacheHeadersBuilder` - Response cache headers
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use errpage_render::{ErrorPageRenderer, PageRenderer};
//!
//! let renderer = ErrorPageRenderer::new(Duration::from_secs(300));
//! let page = renderer.render(&params, true)?;
//! assert_eq!(page.content_type, "text/html; charset=utf-8");
//! ```

mod error;
mod headers;
mod page;
mod policy;

pub use error::*;
pub use headers::*;
pub use page::*;
pub use policy::*;
