//! Retrying assertions against a live page.

use crate::driver::PageDriver;
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{wait_for, WaitOptions, WaitResult};

/// Expectations over one selector on a page
#[derive(Debug)]
pub struct Expect<'a, D: PageDriver + ?Sized> {
    driver: &'a D,
    selector: Selector,
}

/// Start an expectation on `selector`
pub fn expect<'a, D: PageDriver + ?Sized>(
    driver: &'a D,
    selector: impl Into<Selector>,
) -> Expect<'a, D> {
    Expect {
        driver,
        selector: selector.into(),
    }
}

impl<D: PageDriver + ?Sized> Expect<'_, D> {
    /// At least one matching element is attached within the timeout.
    ///
    /// Fails with [`ProbeError::Timeout`].
    pub async fn to_exist(&self, options: &WaitOptions) -> ProbeResult<WaitResult> {
        let description = format!("{} to exist", self.selector);
        let (driver, selector) = (self.driver, &self.selector);
        wait_for(&description, options, || async move {
            Ok::<_, ProbeError>(driver.count(selector).await? > 0)
        })
        .await
    }

    /// A matching element is visible within the timeout.
    ///
    /// Fails with [`ProbeError::AssertionFailed`], naming whether the element
    /// was missing or present but hidden, or the script error that kept the
    /// check from answering.
    pub async fn to_be_visible(&self, options: &WaitOptions) -> ProbeResult<WaitResult> {
        let description = format!("{} to be visible", self.selector);
        let (driver, selector) = (self.driver, &self.selector);
        let outcome = wait_for(&description, options, || async move {
            driver.is_visible(selector).await
        })
        .await;

        match outcome {
            Err(ProbeError::Timeout { ms, last_error, .. }) => {
                let state = match (last_error, self.driver.count(&self.selector).await) {
                    (Some(e), _) => format!("could not be checked: {e}"),
                    (None, Err(e)) => format!("could not be counted: {e}"),
                    (None, Ok(0)) => "was not found".to_string(),
                    (None, Ok(_)) => "was found but is not visible".to_string(),
                };
                Err(ProbeError::assertion(format!(
                    "expected {} to be visible within {ms}ms, but it {state}",
                    self.selector
                )))
            }
            other => other,
        }
    }
}

/// The rendered page contains `text` within the timeout.
///
/// Fails with [`ProbeError::AssertionFailed`].
pub async fn expect_page_text<D: PageDriver + ?Sized>(
    driver: &D,
    text: &str,
    options: &WaitOptions,
) -> ProbeResult<WaitResult> {
    let description = format!("page to contain {text:?}");
    let outcome = wait_for(&description, options, || async move {
        Ok::<_, ProbeError>(driver.page_text().await?.contains(text))
    })
    .await;

    match outcome {
        Err(ProbeError::Timeout { ms, last_error, .. }) => {
            let reason = last_error
                .map(|e| format!(" (last error: {e})"))
                .unwrap_or_default();
            Err(ProbeError::assertion(format!(
                "expected to find content {text:?} within {ms}ms but never did{reason}"
            )))
        }
        other => other,
    }
}
