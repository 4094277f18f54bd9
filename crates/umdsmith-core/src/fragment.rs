//! Source inputs of a compilation.

use regex::Regex;
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::OnceLock;

/// One template file to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFragment {
    pub path: PathBuf,
    /// Path shown in markers and source maps; falls back to `path`.
    pub relative_path: Option<String>,
    pub content: String,
}

impl SourceFragment {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            relative_path: None,
            content: content.into(),
        }
    }

    pub fn with_relative_path(mut self, relative_path: impl Into<String>) -> Self {
        self.relative_path = Some(relative_path.into());
        self
    }

    pub fn display_path(&self) -> Cow<'_, str> {
        match &self.relative_path {
            Some(rel) => Cow::Borrowed(rel.as_str()),
            None => self.path.to_string_lossy(),
        }
    }
}

/// The runtime library text, loaded once per compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreSource {
    pub path: PathBuf,
    pub content: String,
}

impl CoreSource {
    pub fn display_path(&self) -> Cow<'_, str> {
        self.path.to_string_lossy()
    }
}

fn template_wrapper() -> &'static Regex {
    static WRAPPER: OnceLock<Regex> = OnceLock::new();
    WRAPPER.get_or_init(|| {
        Regex::new(
            r"(?s)^\s*module\.exports\s*=\s*function\s*[A-Za-z0-9_$]*\s*\([^)]*\)\s*\{(.*)\}\s*;?\s*$",
        )
        .expect("template wrapper pattern is valid")
    })
}

/// Strip a `module.exports = function(...) { ... }` wrapper, keeping the body.
///
/// Text that does not have that shape is returned unchanged.
pub fn unwrap_template_body(source: &str) -> Cow<'_, str> {
    match template_wrapper().captures(source).and_then(|c| c.get(1)) {
        Some(body) => Cow::Borrowed(body.as_str()),
        None => Cow::Borrowed(source),
    }
}
