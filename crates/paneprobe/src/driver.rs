//! Driver abstraction for browser automation.
//!
//! The harness only talks to a [`PageDriver`], so the CDP-backed
//! [`crate::Page`] and the scripted [`MockPage`] are interchangeable.

use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Abstract page driver used by the harness
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to URL and wait for the document to load
    async fn navigate(&mut self, url: &str) -> ProbeResult<()>;

    /// Count elements matching the selector
    async fn count(&self, selector: &Selector) -> ProbeResult<usize>;

    /// Whether any matching element is rendered with non-zero size and not hidden
    async fn is_visible(&self, selector: &Selector) -> ProbeResult<bool>;

    /// Rendered text of the whole page
    async fn page_text(&self) -> ProbeResult<String>;

    /// Get current URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Capture the viewport as PNG bytes
    async fn screenshot(&self) -> ProbeResult<Vec<u8>>;

    /// Close the page
    async fn close(&mut self) -> ProbeResult<()>;
}

/// An element in a [`MockPage`]
#[derive(Debug, Clone)]
pub struct MockElement {
    /// Selector this element answers to
    pub selector: Selector,
    /// Whether the element is rendered visibly
    pub visible: bool,
    /// Text contributed to the page
    pub text: String,
    /// Delay after navigation before the element is attached
    pub appears_after: Duration,
}

impl MockElement {
    /// Create a visible element present immediately after navigation
    #[must_use]
    pub fn new(selector: impl Into<Selector>) -> Self {
        Self {
            selector: selector.into(),
            visible: true,
            text: String::new(),
            appears_after: Duration::ZERO,
        }
    }

    /// Set the element's text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Mark the element hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Attach the element only after `delay`
    #[must_use]
    pub const fn appearing_after(mut self, delay: Duration) -> Self {
        self.appears_after = delay;
        self
    }
}

/// Scripted in-memory page for unit testing.
///
/// Elements become attached relative to the last successful navigation,
/// which lets tests model an app that takes time to boot.
#[derive(Debug, Default)]
pub struct MockPage {
    /// URLs that accept navigation; empty means every URL does
    pub reachable: Vec<String>,
    /// Elements the app renders
    pub elements: Vec<MockElement>,
    /// Screenshot bytes returned by [`PageDriver::screenshot`]
    pub screenshot_data: Vec<u8>,
    /// Call history for verification
    pub call_history: Vec<String>,
    /// When set, every page script fails with this message
    pub script_error: Option<String>,
    url: String,
    navigated_at: Option<Instant>,
}

impl MockPage {
    /// Create an empty mock page
    #[must_use]
    pub fn new() -> Self {
        Self {
            url: String::from("about:blank"),
            ..Self::default()
        }
    }

    /// Add an element
    #[must_use]
    pub fn with_element(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Restrict navigation to the given URL
    #[must_use]
    pub fn only_reachable(mut self, url: impl Into<String>) -> Self {
        self.reachable.push(url.into());
        self
    }

    /// Set mock screenshot bytes
    #[must_use]
    pub fn with_screenshot(mut self, png: Vec<u8>) -> Self {
        self.screenshot_data = png;
        self
    }

    /// Make every page script fail, as when the page navigates mid-check
    #[must_use]
    pub fn with_script_error(mut self, message: impl Into<String>) -> Self {
        self.script_error = Some(message.into());
        self
    }

    /// Check if a method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    fn scripts_available(&self) -> ProbeResult<()> {
        match self.script_error {
            Some(ref message) => Err(ProbeError::EvaluationError {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn attached(&self) -> impl Iterator<Item = &MockElement> {
        let since = self.navigated_at.map(|t| t.elapsed());
        self.elements
            .iter()
            .filter(move |e| since.is_some_and(|s| s >= e.appears_after))
    }

    fn matches(element: &MockElement, selector: &Selector) -> bool {
        match selector {
            Selector::Css(_) => element.selector == *selector,
            Selector::Text(text) => element.text.contains(text.as_str()),
            Selector::CssWithText { css, text } => {
                element.selector == Selector::Css(css.clone())
                    && element.text.contains(text.as_str())
            }
        }
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        self.call_history.push(format!("navigate:{url}"));
        if !self.reachable.is_empty() && !self.reachable.iter().any(|u| u == url) {
            return Err(ProbeError::Navigation {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_REFUSED".to_string(),
            });
        }
        self.url = url.to_string();
        self.navigated_at = Some(Instant::now());
        Ok(())
    }

    async fn count(&self, selector: &Selector) -> ProbeResult<usize> {
        self.scripts_available()?;
        Ok(self
            .attached()
            .filter(|e| Self::matches(e, selector))
            .count())
    }

    async fn is_visible(&self, selector: &Selector) -> ProbeResult<bool> {
        self.scripts_available()?;
        Ok(self
            .attached()
            .any(|e| e.visible && Self::matches(e, selector)))
    }

    async fn page_text(&self) -> ProbeResult<String> {
        self.scripts_available()?;
        Ok(self
            .attached()
            .filter(|e| e.visible)
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.url.clone())
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        if self.screenshot_data.is_empty() {
            return Err(ProbeError::ScreenshotError {
                message: "No mock screenshot set".to_string(),
            });
        }
        Ok(self.screenshot_data.clone())
    }

    async fn close(&mut self) -> ProbeResult<()> {
        self.call_history.push("close".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_element() -> MockElement {
        MockElement::new(r#"[data-key="hello-again-text"]"#).with_text("Hello Again!")
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_attached_before_navigation() {
        let page = MockPage::new().with_element(text_element());
        assert_eq!(
            page.count(&Selector::css(r#"[data-key="hello-again-text"]"#))
                .await
                .unwrap(),
            0
        );
        assert_eq!(page.page_text().await.unwrap(), "");
        assert_eq!(page.current_url().await.unwrap(), "about:blank");
    }

    #[tokio::test(start_paused = true)]
    async fn test_elements_attach_after_delay() {
        let mut page = MockPage::new().with_element(
            MockElement::new("flt-glass-pane").appearing_after(Duration::from_secs(3)),
        );
        page.navigate("http://127.0.0.1:8080").await.unwrap();
        let pane = Selector::css("flt-glass-pane");
        assert_eq!(page.count(&pane).await.unwrap(), 0);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(page.count(&pane).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_elements_are_not_visible_and_have_no_text() {
        let mut page = MockPage::new().with_element(text_element().hidden());
        page.navigate("http://127.0.0.1:8080").await.unwrap();
        let sel = Selector::css(r#"[data-key="hello-again-text"]"#);
        assert_eq!(page.count(&sel).await.unwrap(), 1);
        assert!(!page.is_visible(&sel).await.unwrap());
        assert!(!page.page_text().await.unwrap().contains("Hello Again!"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_selectors() {
        let mut page = MockPage::new().with_element(text_element());
        page.navigate("http://127.0.0.1:8080").await.unwrap();
        assert_eq!(page.count(&Selector::text("Again")).await.unwrap(), 1);
        let narrowed = Selector::css(r#"[data-key="hello-again-text"]"#).with_text("Bye");
        assert_eq!(page.count(&narrowed).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_navigation_fails() {
        let mut page = MockPage::new().only_reachable("http://127.0.0.1:8080");
        let err = page.navigate("http://127.0.0.1:9999").await.unwrap_err();
        assert!(matches!(err, ProbeError::Navigation { .. }));
        assert!(page.was_called("navigate:http://127.0.0.1:9999"));
        assert_eq!(page.current_url().await.unwrap(), "about:blank");
    }

    #[tokio::test]
    async fn test_screenshot_requires_data() {
        let page = MockPage::new();
        assert!(page.screenshot().await.is_err());
        let page = MockPage::new().with_screenshot(vec![0x89, b'P', b'N', b'G']);
        assert_eq!(page.screenshot().await.unwrap().len(), 4);
    }
}
