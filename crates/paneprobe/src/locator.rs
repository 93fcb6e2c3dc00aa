//! Selectors and the page scripts that resolve them.
//!
//! Canvas-rendered apps mount their DOM inside open shadow roots (Flutter's
//! `flt-glass-pane` hosts one), so every query here walks shadow roots as
//! well as the light DOM.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Collects matches for a CSS selector across the document and every open shadow root.
const DEEP_QUERY_PRELUDE: &str = "const __ppAll = (sel) => { \
const found = []; const roots = [document]; \
while (roots.length) { const root = roots.pop(); \
found.push(...root.querySelectorAll(sel)); \
root.querySelectorAll('*').forEach((el) => { if (el.shadowRoot) roots.push(el.shadowRoot); }); } \
return found; };";

/// Rendered text of the page, shadow roots and accessibility labels included.
pub const PAGE_TEXT_SCRIPT: &str = "(() => { \
const parts = [document.body ? document.body.innerText : '']; \
const roots = [document]; \
while (roots.length) { const root = roots.pop(); \
root.querySelectorAll('*').forEach((el) => { \
if (el.shadowRoot) { roots.push(el.shadowRoot); parts.push(el.shadowRoot.textContent || ''); } \
const label = el.getAttribute && el.getAttribute('aria-label'); \
if (label) parts.push(label); }); } \
return parts.join('\\n'); })()";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g. `flt-glass-pane`, `[data-key="hello-again-text"]`)
    Css(String),
    /// Innermost elements whose text contains the string
    Text(String),
    /// CSS selector filtered by text content
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Narrow a CSS selector to elements containing `text`
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        match self {
            Self::Css(css) | Self::CssWithText { css, .. } => Self::CssWithText {
                css,
                text: text.into(),
            },
            Self::Text(_) => Self::Text(text.into()),
        }
    }

    /// Whether the selector carries anything to match on
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Css(s) | Self::Text(s) => s.trim().is_empty(),
            Self::CssWithText { css, text } => css.trim().is_empty() || text.is_empty(),
        }
    }

    /// JavaScript expression evaluating to the array of matching elements.
    ///
    /// Must be evaluated after [`DEEP_QUERY_PRELUDE`].
    fn matches_expr(&self) -> String {
        match self {
            Self::Css(css) => format!("__ppAll({})", js_string(css)),
            Self::Text(text) => {
                let t = js_string(text);
                format!(
                    "__ppAll('*').filter((el) => (el.textContent || '').includes({t}) \
                     && !Array.from(el.children).some((c) => (c.textContent || '').includes({t})))"
                )
            }
            Self::CssWithText { css, text } => format!(
                "__ppAll({}).filter((el) => (el.textContent || '').includes({}))",
                js_string(css),
                js_string(text)
            ),
        }
    }

    /// Script returning the number of matching elements
    #[must_use]
    pub fn to_count_script(&self) -> String {
        format!(
            "(() => {{ {DEEP_QUERY_PRELUDE} return {}.length; }})()",
            self.matches_expr()
        )
    }

    /// Script returning whether any matching element is rendered and not hidden
    #[must_use]
    pub fn to_visible_script(&self) -> String {
        format!(
            "(() => {{ {DEEP_QUERY_PRELUDE} return {}.some((el) => {{ \
             const r = el.getBoundingClientRect(); const s = getComputedStyle(el); \
             return r.width > 0 && r.height > 0 && s.display !== 'none' \
             && s.visibility !== 'hidden' && s.opacity !== '0'; }}); }})()",
            self.matches_expr()
        )
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "{css}"),
            Self::Text(text) => write!(f, "text={text:?}"),
            Self::CssWithText { css, text } => write!(f, "{css} with text {text:?}"),
        }
    }
}

impl From<&str> for Selector {
    fn from(css: &str) -> Self {
        Self::css(css)
    }
}

/// Quote a Rust string as a JavaScript string literal
fn js_string(s: &str) -> String {
    // JSON string literals are valid JavaScript string literals
    serde_json::Value::String(s.to_string()).to_string()
}
