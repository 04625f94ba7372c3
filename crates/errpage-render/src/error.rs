//! Render error types.

use thiserror::Error;

/// Errors raised while rendering a page.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A parameter has a type the template cannot use.
    #[error("Parameter `{key}` must be {expected}")]
    InvalidParameter { key: String, expected: &'static str },

    /// A status box declares an unknown status.
    #[error("Parameter `{key}` has unknown status {value:?} (expected \"ok\" or \"error\")")]
    InvalidStatus { key: String, value: String },
}
