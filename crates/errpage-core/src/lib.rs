//! Core types for the error-page example server.
//!
//! This crate provides the fundamental types:
//! - `CanonicalName` - Safe lookup key derived from a raw path segment
//! - `ParameterRecord` - Ordered JSON parameters for one example page
//! - `RequestContext` - Trusted per-request fields merged into the page
//! - `ContextEnricher` - Extracts `RequestContext` from request metadata

mod context;
mod name;
mod params;

pub use context::*;
pub use name::*;
pub use params::*;
