//! Browser control for headless testing.
//!
//! With the `browser` feature this drives Chromium over the Chrome
//! `DevTools` Protocol via chromiumoxide. [`BrowserConfig`] is always
//! available so configuration can be parsed and validated without it.

use serde::{Deserialize, Serialize};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Timeout for individual CDP requests, navigation included
    pub request_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            sandbox: true,
            request_timeout_ms: 30_000,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::PageDriver;
    use crate::locator::{Selector, PAGE_TEXT_SCRIPT};
    use crate::result::{ProbeError, ProbeResult};
    use async_trait::async_trait;
    use base64::Engine;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use std::time::Duration;

    /// Browser instance with real CDP connection
    #[derive(Debug)]
    pub struct Browser {
        inner: CdpBrowser,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: BrowserConfig) -> ProbeResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .request_timeout(Duration::from_millis(config.request_timeout_ms));

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| ProbeError::BrowserLaunchError { message })?;

            let (inner, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                ProbeError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            // The handler stream must be polled for the connection to make progress
            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        tracing::debug!(error = %e, "CDP handler stopped");
                        break;
                    }
                }
            });

            tracing::info!(
                headless = config.headless,
                width = config.viewport_width,
                height = config.viewport_height,
                "browser launched"
            );

            Ok(Self { inner, handle })
        }

        /// Create a new blank page
        ///
        /// # Errors
        ///
        /// Returns error if page cannot be created
        pub async fn new_page(&self) -> ProbeResult<Page> {
            let inner = self
                .inner
                .new_page("about:blank")
                .await
                .map_err(|e| ProbeError::PageError {
                    message: e.to_string(),
                })?;
            Ok(Page {
                url: String::from("about:blank"),
                inner,
            })
        }

        /// Close the browser and wait for the process to exit.
        ///
        /// The CDP handler task is stopped whether or not the close
        /// command succeeds.
        ///
        /// # Errors
        ///
        /// Returns error if the browser refuses to close
        pub async fn close(mut self) -> ProbeResult<()> {
            let closed = self.inner.close().await;
            if let Err(ref e) = closed {
                tracing::warn!(error = %e, "browser close command failed");
            }
            match self.inner.wait().await {
                Ok(Some(status)) => tracing::debug!(%status, "browser process exited"),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "failed waiting for browser process"),
            }
            self.handle.abort();
            closed.map(drop).map_err(|e| ProbeError::PageError {
                message: format!("browser close failed: {e}"),
            })
        }
    }

    /// A browser page with real CDP connection
    #[derive(Debug)]
    pub struct Page {
        url: String,
        inner: CdpPage,
    }

    impl Page {
        async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> ProbeResult<T> {
            let params = EvaluateParams::builder()
                .expression(script)
                .return_by_value(true)
                .await_promise(true)
                .build()
                .map_err(|message| ProbeError::EvaluationError { message })?;
            let result = self
                .inner
                .evaluate_expression(params)
                .await
                .map_err(|e| ProbeError::EvaluationError {
                    message: e.to_string(),
                })?;
            result
                .into_value()
                .map_err(|e| ProbeError::EvaluationError {
                    message: e.to_string(),
                })
        }
    }

    #[async_trait]
    impl PageDriver for Page {
        async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
            self.inner
                .goto(url)
                .await
                .map_err(|e| ProbeError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            self.url = url.to_string();
            Ok(())
        }

        async fn count(&self, selector: &Selector) -> ProbeResult<usize> {
            self.eval(selector.to_count_script()).await
        }

        async fn is_visible(&self, selector: &Selector) -> ProbeResult<bool> {
            self.eval(selector.to_visible_script()).await
        }

        async fn page_text(&self) -> ProbeResult<String> {
            self.eval(PAGE_TEXT_SCRIPT.to_string()).await
        }

        async fn current_url(&self) -> ProbeResult<String> {
            let url = self
                .inner
                .url()
                .await
                .map_err(|e| ProbeError::PageError {
                    message: e.to_string(),
                })?;
            Ok(url.unwrap_or_else(|| self.url.clone()))
        }

        async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();

            let screenshot =
                self.inner
                    .execute(params)
                    .await
                    .map_err(|e| ProbeError::ScreenshotError {
                        message: e.to_string(),
                    })?;

            base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| ProbeError::ScreenshotError {
                    message: e.to_string(),
                })
        }

        async fn close(&mut self) -> ProbeResult<()> {
            self.inner
                .clone()
                .close()
                .await
                .map_err(|e| ProbeError::PageError {
                    message: e.to_string(),
                })
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, Page};
