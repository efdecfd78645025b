//! Headless Chromium renderer over the DevTools protocol.

use super::{NavigationResult, RenderContext, RenderError, Renderer, TableTarget, WaitStage};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Environment variable naming an explicit browser executable.
pub const CHROMIUM_PATH_ENV: &str = "VAULTWATCH_CHROMIUM_PATH";

/// Interval between readiness polls.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

const LAUNCH_ARGS: &[&str] = &["--disable-dev-shm-usage", "--disable-gpu"];

/// Locate a Chromium/Chrome executable.
///
/// Checks `VAULTWATCH_CHROMIUM_PATH`, then the usual binary names on `PATH`.
/// Returns `None` to let chromiumoxide run its own detection.
pub fn find_chromium() -> Option<PathBuf> {
    locate_chromium(std::env::var_os(CHROMIUM_PATH_ENV).map(PathBuf::from))
}

fn locate_chromium(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path);
        }
        debug!(
            "{CHROMIUM_PATH_ENV}={} does not exist, searching PATH",
            path.display()
        );
    }

    ["google-chrome", "chromium", "chromium-browser"]
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// A launched headless browser.
pub struct ChromiumRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Launch headless Chromium.
    pub async fn launch(executable: Option<PathBuf>) -> Result<Self, RenderError> {
        let mut builder = BrowserConfig::builder().no_sandbox();
        for arg in LAUNCH_ARGS {
            builder = builder.arg(*arg);
        }
        if let Some(path) = executable.or_else(find_chromium) {
            info!("using browser at {}", path.display());
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(RenderError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Browser(format!("launch failed: {e}")))?;

        // The CDP connection only makes progress while its handler is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler stopped: {e}");
                    break;
                }
            }
        });

        Ok(Self { browser, handler })
    }

    /// Close the browser and wait for the process to exit.
    pub async fn shutdown(mut self) -> Result<(), RenderError> {
        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| RenderError::Browser(e.to_string()));
        self.browser.wait().await.ok();
        self.handler.await.ok();
        closed
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>, RenderError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Browser(format!("opening tab: {e}")))?;
        Ok(Box::new(ChromiumContext { page }))
    }
}

/// One Chromium tab.
pub struct ChromiumContext {
    page: Page,
}

impl ChromiumContext {
    async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T, RenderError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| RenderError::Browser(format!("evaluate: {e}")))?
            .into_value::<T>()
            .map_err(|e| RenderError::Browser(format!("evaluate result: {e}")))
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(
        &mut self,
        url: &str,
        timeout_ms: u64,
    ) -> Result<NavigationResult, RenderError> {
        let start = Instant::now();

        match tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await {
            Err(_) => {
                return Err(RenderError::Timeout {
                    stage: WaitStage::Navigation,
                    timeout_ms,
                })
            }
            Ok(Err(e)) => return Err(RenderError::Navigation(e.to_string())),
            Ok(Ok(_)) => {}
        }

        let final_url = self
            .page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(NavigationResult {
            final_url,
            load_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn wait_for_network_idle(&mut self, timeout_ms: u64) -> Result<(), RenderError> {
        let settle = async {
            let mut last: Option<u64> = None;
            loop {
                let count: u64 = self.eval(RESOURCE_COUNT_JS).await?;
                if last == Some(count) {
                    return Ok::<(), RenderError>(());
                }
                last = Some(count);
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(Duration::from_millis(timeout_ms), settle)
            .await
            .unwrap_or(Err(RenderError::Timeout {
                stage: WaitStage::NetworkIdle,
                timeout_ms,
            }))
    }

    async fn wait_for_visible(
        &mut self,
        target: &TableTarget,
        timeout_ms: u64,
    ) -> Result<(), RenderError> {
        let script = match_script(target, true, "el => true");
        let this = &*self;
        let script = script.as_str();

        let deadline = Duration::from_millis(timeout_ms);
        let visible = poll_until(deadline, POLL_INTERVAL, move || async move {
            let matches: Vec<bool> = this.eval(script).await?;
            Ok::<bool, RenderError>(!matches.is_empty())
        })
        .await;

        if visible {
            Ok(())
        } else {
            Err(RenderError::Timeout {
                stage: WaitStage::Visibility,
                timeout_ms,
            })
        }
    }

    async fn outer_html(&mut self, target: &TableTarget) -> Result<Vec<String>, RenderError> {
        self.eval(&match_script(target, false, "el => el.outerHTML"))
            .await
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        self.page
            .close()
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))
    }
}

/// Poll `check` every `interval` until it reports true or `timeout` passes.
///
/// A failed check counts as "not yet": evaluation errors while a page swaps
/// its execution context are expected and only logged.
async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, RenderError>>,
{
    let poll = async {
        loop {
            match check().await {
                Ok(true) => return,
                Ok(false) => {}
                Err(e) => debug!("readiness check failed: {e}"),
            }
            tokio::time::sleep(interval).await;
        }
    };
    tokio::time::timeout(timeout, poll).await.is_ok()
}

const RESOURCE_COUNT_JS: &str = "performance.getEntriesByType('resource').length";

/// Build a script that maps `project` over the elements matching `target`.
///
/// Selector and text are embedded as JSON string literals.
fn match_script(target: &TableTarget, visible_only: bool, project: &str) -> String {
    let selector = serde_json::Value::from(target.selector.as_str());
    let text = match &target.text {
        Some(t) => serde_json::Value::from(t.to_lowercase()),
        None => serde_json::Value::Null,
    };

    format!(
        r#"(() => {{
    const text = {text};
    const visibleOnly = {visible_only};
    return Array.from(document.querySelectorAll({selector}))
        .filter(el => text === null || (el.textContent || '').toLowerCase().includes(text))
        .filter(el => {{
            if (!visibleOnly) return true;
            const rect = el.getBoundingClientRect();
            const style = window.getComputedStyle(el);
            return rect.width > 0 && rect.height > 0
                && style.visibility !== 'hidden' && style.display !== 'none';
        }})
        .map({project});
}})()"#
    )
}
