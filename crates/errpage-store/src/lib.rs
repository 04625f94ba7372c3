//! Read-only parameter store and resolution cache for example pages.
//!
//! Provides a simple lookup path from canonical example name to parsed
//! parameters, with a process-lifetime cache in front of the store.
//!
//! # Example
//!
//! ```rust,ignore
//! use errpage_store::{FsParameterStore, ResolutionCache};
//!
//! let cache = ResolutionCache::new(FsParameterStore::new("data/examples"));
//!
//! // First lookup reads `data/examples/default.json`
//! let params = cache.get_or_load("default").record();
//!
//! // Later lookups are served from memory
//! let again = cache.get_or_load("default").record();
//! ```

mod cache;
mod error;
mod store;

pub use cache::{CacheStats, Lookup, ResolutionCache};
pub use error::StoreError;
pub use store::{FsParameterStore, ParameterStore, DOCUMENT_EXTENSION};
