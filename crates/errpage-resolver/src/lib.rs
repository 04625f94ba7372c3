//! Example name resolution pipeline.
//!
//! ```text
//! raw name ─► CanonicalName ─┬─► Redirect (case mismatch)
//!                            └─► ResolutionCache ─┬─► NotFound (404)
//!                                                 └─► merge RequestContext ─► render (500)
//! ```

mod resolve;

pub use resolve::*;
