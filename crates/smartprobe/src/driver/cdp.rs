//! Chromium over CDP via chromiumoxide.
//!
//! Element queries run as generated JavaScript (see
//! [`ElementQuery::to_js`]); waits poll that JavaScript until the state holds
//! or the timeout expires.

use super::{ClickOptions, ElementState, MouseButton, PageDriver, SelectBy};
use crate::config::Settings;
use crate::locator::ElementQuery;
use crate::result::{ProbeError, ProbeResult};
use crate::session::Launcher;
use crate::wait::LoadState;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Upper bound for one script evaluation
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between state polls
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Quiet period that counts as network idle
const NETWORK_IDLE_QUIET: Duration = Duration::from_millis(500);

/// Browser names CDP can drive
pub const CHROMIUM_FAMILY: [&str; 5] =
    ["chromium", "chrome", "chrome-beta", "chrome-dev", "msedge"];

/// Page driver backed by a launched Chromium
pub struct ChromiumDriver {
    page: Page,
    browser: Mutex<Option<Browser>>,
    handler: JoinHandle<()>,
    slow_mo: Duration,
}

impl fmt::Debug for ChromiumDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromiumDriver")
            .field("slow_mo", &self.slow_mo)
            .finish_non_exhaustive()
    }
}

impl ChromiumDriver {
    /// Launch Chromium and open a blank page
    pub async fn launch(settings: &Settings) -> ProbeResult<Self> {
        let browser_settings = &settings.browser;
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(browser_settings.viewport_width, browser_settings.viewport_height)
            .args(browser_settings.args.clone());
        if !browser_settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &browser_settings.executable_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(ProbeError::session)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| {
                ProbeError::session(format!("failed to launch {}: {e}", browser_settings.name))
            })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler error (ignored): {e}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ProbeError::session(format!("failed to open page: {e}")))?;
        info!(
            browser = %browser_settings.name,
            headless = browser_settings.headless,
            "Browser launched"
        );

        Ok(Self {
            page,
            browser: Mutex::new(Some(browser)),
            handler,
            slow_mo: Duration::from_millis(browser_settings.slow_mo_ms),
        })
    }

    async fn pause(&self) {
        if !self.slow_mo.is_zero() {
            tokio::time::sleep(self.slow_mo).await;
        }
    }

    async fn eval(&self, script: &str) -> ProbeResult<Value> {
        let result = tokio::time::timeout(EVAL_TIMEOUT, self.page.evaluate(script))
            .await
            .map_err(|_| ProbeError::Timeout {
                ms: EVAL_TIMEOUT.as_millis() as u64,
            })?
            .map_err(|e| ProbeError::script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    /// Run `body` with `el` bound to the first match; fails if none
    async fn on_first(&self, query: &ElementQuery, body: &str) -> ProbeResult<Value> {
        let script = format!(
            "(() => {{ const el = ({})[0]; if (!el) throw new Error({}); {body} }})()",
            query.to_js(),
            Value::String(format!("no element matches {query}"))
        );
        self.eval(&script).await.map_err(|e| match e {
            ProbeError::Script { message } => ProbeError::driver(message),
            other => other,
        })
    }

    fn state_js(query: &ElementQuery, state: ElementState) -> String {
        let visible = "els.some(el => { const r = el.getBoundingClientRect(); \
                       const s = getComputedStyle(el); \
                       return r.width > 0 && r.height > 0 \
                       && s.visibility !== 'hidden' && s.display !== 'none'; })";
        let check = match state {
            ElementState::Visible => visible.to_string(),
            ElementState::Hidden => format!("!({visible})"),
            ElementState::Attached => "els.length > 0".to_string(),
            ElementState::Detached => "els.length === 0".to_string(),
        };
        format!("(() => {{ const els = {}; return {check}; }})()", query.to_js())
    }

    async fn poll<F, Fut>(timeout: Duration, mut check: F) -> ProbeResult<()>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = ProbeResult<bool>>,
    {
        tokio::time::timeout(timeout, Self::poll_until_true(&mut check))
            .await
            .map_err(|_| ProbeError::Timeout {
                ms: timeout.as_millis() as u64,
            })?
    }

    /// Resolves once the resource count has held still for `NETWORK_IDLE_QUIET`
    async fn network_quiet(&self) -> ProbeResult<()> {
        let mut last_count = None;
        let mut quiet_since = Instant::now();
        loop {
            let count = self
                .eval("performance.getEntriesByType('resource').length")
                .await?
                .as_u64();
            if count != last_count {
                last_count = count;
                quiet_since = Instant::now();
            } else if quiet_since.elapsed() >= NETWORK_IDLE_QUIET {
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn poll_until_true<F, Fut>(check: &mut F) -> ProbeResult<()>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = ProbeResult<bool>>,
    {
        loop {
            if check().await? {
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn goto(&self, url: &str) -> ProbeResult<()> {
        debug!(url, "goto");
        self.page
            .goto(url)
            .await
            .map_err(|e| ProbeError::navigation(url, e.to_string()))?;
        self.pause().await;
        Ok(())
    }

    async fn reload(&self) -> ProbeResult<()> {
        self.page
            .reload()
            .await
            .map_err(|e| ProbeError::driver(format!("reload failed: {e}")))?;
        Ok(())
    }

    async fn go_back(&self) -> ProbeResult<()> {
        self.eval("history.back(); null").await.map(|_| ())
    }

    async fn go_forward(&self) -> ProbeResult<()> {
        self.eval("history.forward(); null").await.map(|_| ())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(|e| ProbeError::driver(e.to_string()))?
            .unwrap_or_default())
    }

    async fn title(&self) -> ProbeResult<String> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(|e| ProbeError::driver(e.to_string()))?
            .unwrap_or_default())
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> ProbeResult<()> {
        let ready = match state {
            LoadState::DomContentLoaded => "document.readyState !== 'loading'",
            LoadState::Load | LoadState::NetworkIdle => "document.readyState === 'complete'",
        };
        let start = Instant::now();
        Self::poll(timeout, move || async move {
            Ok(self.eval(ready).await?.as_bool() == Some(true))
        })
        .await?;
        if state != LoadState::NetworkIdle {
            return Ok(());
        }

        let remaining = timeout.saturating_sub(start.elapsed());
        tokio::time::timeout(remaining, self.network_quiet())
            .await
            .map_err(|_| ProbeError::Timeout {
                ms: timeout.as_millis() as u64,
            })?
    }

    async fn evaluate(&self, script: &str) -> ProbeResult<Value> {
        self.eval(script).await
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> ProbeResult<()> {
        let bytes = self
            .page
            .screenshot(ScreenshotParams::builder().full_page(full_page).build())
            .await
            .map_err(|e| ProbeError::screenshot(e.to_string()))?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn wait_for(
        &self,
        query: &ElementQuery,
        state: ElementState,
        timeout: Duration,
    ) -> ProbeResult<()> {
        let script = Self::state_js(query, state);
        let script = script.as_str();
        Self::poll(timeout, move || async move {
            Ok(self.eval(script).await?.as_bool() == Some(true))
        })
        .await
    }

    async fn count(&self, query: &ElementQuery) -> ProbeResult<usize> {
        let value = self.eval(&format!("({}).length", query.to_js())).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn is_visible(&self, query: &ElementQuery) -> ProbeResult<bool> {
        let script = Self::state_js(&query.nth(0), ElementState::Visible);
        Ok(self.eval(&script).await?.as_bool() == Some(true))
    }

    async fn is_enabled(&self, query: &ElementQuery) -> ProbeResult<bool> {
        let value = self.on_first(query, "return !el.disabled;").await?;
        Ok(value.as_bool() == Some(true))
    }

    async fn is_editable(&self, query: &ElementQuery) -> ProbeResult<bool> {
        let value = self
            .on_first(
                query,
                "return !el.disabled && !el.readOnly && (el.isContentEditable || \
                 ['INPUT','TEXTAREA','SELECT'].includes(el.tagName));",
            )
            .await?;
        Ok(value.as_bool() == Some(true))
    }

    async fn click(&self, query: &ElementQuery, options: ClickOptions) -> ProbeResult<()> {
        let body = match (options.button, options.click_count) {
            (MouseButton::Right, _) => {
                "el.scrollIntoView({block: 'center'}); el.dispatchEvent(new \
                 MouseEvent('contextmenu', {bubbles: true, button: 2})); return null;"
            }
            (_, 2) => {
                "el.scrollIntoView({block: 'center'}); el.click(); el.click(); \
                 el.dispatchEvent(new MouseEvent('dblclick', {bubbles: true})); return null;"
            }
            _ => "el.scrollIntoView({block: 'center'}); el.click(); return null;",
        };
        self.on_first(query, body).await?;
        self.pause().await;
        Ok(())
    }

    async fn fill(&self, query: &ElementQuery, text: &str) -> ProbeResult<()> {
        let body = format!(
            "el.focus(); el.value = {}; el.dispatchEvent(new Event('input', {{bubbles: true}})); \
             el.dispatchEvent(new Event('change', {{bubbles: true}})); return null;",
            Value::String(text.to_string())
        );
        self.on_first(query, &body).await?;
        self.pause().await;
        Ok(())
    }

    async fn type_text(
        &self,
        query: &ElementQuery,
        text: &str,
        delay: Duration,
    ) -> ProbeResult<()> {
        for ch in text.chars() {
            let body = format!(
                "el.focus(); el.value += {}; el.dispatchEvent(new Event('input', {{bubbles: \
                 true}})); return null;",
                Value::String(ch.to_string())
            );
            self.on_first(query, &body).await?;
            tokio::time::sleep(delay).await;
        }
        self.on_first(query, "el.dispatchEvent(new Event('change', {bubbles: true})); return null;")
            .await
            .map(|_| ())
    }

    async fn clear(&self, query: &ElementQuery) -> ProbeResult<()> {
        self.on_first(
            query,
            "el.value = ''; el.dispatchEvent(new Event('input', {bubbles: true})); return null;",
        )
        .await
        .map(|_| ())
    }

    async fn select_option(&self, query: &ElementQuery, option: &SelectBy) -> ProbeResult<String> {
        let predicate = match option {
            SelectBy::Value(v) => format!("(o) => o.value === {}", Value::String(v.clone())),
            SelectBy::Label(l) => format!("(o) => o.label.trim() === {}", Value::String(l.clone())),
            SelectBy::Index(i) => format!("(o, i) => i === {i}"),
        };
        let body = format!(
            "const opt = Array.from(el.options || []).find({predicate}); \
             if (!opt) throw new Error('option not found'); \
             el.value = opt.value; el.dispatchEvent(new Event('change', {{bubbles: true}})); \
             return opt.value;"
        );
        let value = self.on_first(query, &body).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn set_checked(&self, query: &ElementQuery, checked: bool) -> ProbeResult<()> {
        let body = format!("if (el.checked !== {checked}) el.click(); return null;");
        self.on_first(query, &body).await.map(|_| ())
    }

    async fn hover(&self, query: &ElementQuery) -> ProbeResult<()> {
        self.on_first(
            query,
            "el.scrollIntoView({block: 'center'}); for (const t of ['mouseover', 'mouseenter', \
             'mousemove']) el.dispatchEvent(new MouseEvent(t, {bubbles: true})); return null;",
        )
        .await
        .map(|_| ())
    }

    async fn text_content(&self, query: &ElementQuery) -> ProbeResult<Option<String>> {
        let value = self.on_first(query, "return el.textContent;").await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn inner_text(&self, query: &ElementQuery) -> ProbeResult<String> {
        let value = self.on_first(query, "return el.innerText;").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(&self, query: &ElementQuery, name: &str) -> ProbeResult<Option<String>> {
        let body = format!("return el.getAttribute({});", Value::String(name.to_string()));
        let value = self.on_first(query, &body).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn input_value(&self, query: &ElementQuery) -> ProbeResult<String> {
        let value = self.on_first(query, "return el.value ?? '';").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn scroll_into_view(&self, query: &ElementQuery) -> ProbeResult<()> {
        self.on_first(query, "el.scrollIntoView({block: 'center'}); return null;")
            .await
            .map(|_| ())
    }

    async fn element_screenshot(&self, query: &ElementQuery, path: &Path) -> ProbeResult<()> {
        let rect = self
            .on_first(
                query,
                "el.scrollIntoView({block: 'center'}); const r = el.getBoundingClientRect(); \
                 return {x: r.x + window.scrollX, y: r.y + window.scrollY, \
                 width: r.width, height: r.height};",
            )
            .await?;
        let dim = |key: &str| rect.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        let clip = Viewport {
            x: dim("x"),
            y: dim("y"),
            width: dim("width").max(1.0),
            height: dim("height").max(1.0),
            scale: 1.0,
        };
        let bytes = self
            .page
            .screenshot(ScreenshotParams::builder().clip(clip).build())
            .await
            .map_err(|e| ProbeError::screenshot(e.to_string()))?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn close(&self) -> ProbeResult<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };
        let closed = browser.close().await;
        self.handler.abort();
        match closed {
            Ok(_) => {
                info!("Browser closed");
                Ok(())
            }
            Err(e) => {
                error!("Browser close failed: {e}");
                Err(ProbeError::session(e.to_string()))
            }
        }
    }
}

/// Launches [`ChromiumDriver`]s for Chromium-family browser names
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumLauncher;

impl ChromiumLauncher {
    /// Reject browsers CDP cannot drive
    pub fn check_browser(name: &str) -> ProbeResult<()> {
        if CHROMIUM_FAMILY.contains(&name) {
            Ok(())
        } else {
            Err(ProbeError::session(format!(
                "browser '{name}' is not supported by the CDP backend; use one of: {}",
                CHROMIUM_FAMILY.join(", ")
            )))
        }
    }
}

#[async_trait]
impl Launcher for ChromiumLauncher {
    async fn launch(&self, settings: &Settings) -> ProbeResult<Arc<dyn PageDriver>> {
        Self::check_browser(&settings.browser.name)?;
        Ok(Arc::new(ChromiumDriver::launch(settings).await?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_chromium_family_only() {
        ChromiumLauncher::check_browser("chromium").unwrap();
        ChromiumLauncher::check_browser("msedge").unwrap();
        let err = ChromiumLauncher::check_browser("firefox").unwrap_err();
        assert!(matches!(err, ProbeError::Session { .. }));
        assert!(ChromiumLauncher::check_browser("webkit").is_err());
    }

    #[test]
    fn test_state_js_shapes() {
        let q = ElementQuery::css("a.cart");
        assert!(ChromiumDriver::state_js(&q, ElementState::Attached).contains("els.length > 0"));
        assert!(ChromiumDriver::state_js(&q, ElementState::Hidden).contains("!(els.some"));
    }
}
