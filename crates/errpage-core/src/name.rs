//! Example name canonicalization.
//!
//! A raw path segment goes through two independent steps:
//! - the display name keeps only the final path component and drives the
//!   redirect decision;
//! - the lookup key strips every non-word character and lower-cases, and is
//!   the only thing that ever reaches the parameter store.

/// Path separators accepted in a raw name. Everything up to the last one is dropped.
const SEPARATORS: [char; 2] = ['/', '\\'];

/// Keep only the final path component of `raw`.
///
/// `"a/b/Foo"` becomes `"Foo"`, and a trailing separator yields `""`.
pub fn display_name(raw: &str) -> &str {
    match raw.rfind(SEPARATORS) {
        Some(idx) => &raw[idx + 1..],
        None => raw,
    }
}

/// Returns true for letters, digits and underscore.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Derive the store lookup key: word characters only, lower-cased.
pub fn lookup_key(name: &str) -> String {
    name.chars()
        .filter(|c| is_word_char(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// A raw example name split into its display form and its lookup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalName {
    display: String,
    key: String,
    is_lowercase: bool,
}

impl CanonicalName {
    /// Canonicalize a raw path segment. Never fails.
    pub fn parse(raw: &str) -> Self {
        let display = display_name(raw);
        let lowered = display.to_lowercase();
        Self {
            is_lowercase: lowered == display,
            key: lookup_key(&lowered),
            display: display.to_string(),
        }
    }

    /// The final path component, case preserved.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// The word-character-only, lower-cased key used for store and cache lookups.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the display name already equals its lower-cased form.
    pub fn is_lowercase(&self) -> bool {
        self.is_lowercase
    }

    /// The lower-cased display name to redirect to, if a redirect is needed.
    pub fn redirect_target(&self) -> Option<String> {
        if self.is_lowercase {
            None
        } else {
            Some(self.display.to_lowercase())
        }
    }
}
