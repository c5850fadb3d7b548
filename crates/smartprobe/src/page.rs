//! Page Object Model support.
//!
//! Concrete pages embed a [`BasePage`] and implement [`PageObject`]. Every
//! element lookup goes through the page's [`LocatorResolver`].

use crate::config::Settings;
use crate::driver::{Element, PageDriver, SelectBy};
use crate::locator::{LocatorResolver, NamedLocator, ResolutionResult};
use crate::result::{ProbeError, ProbeResult};
use crate::screenshot::ScreenshotManager;
use crate::session::BrowserSession;
use crate::wait::{UrlPattern, WaitCondition, WaitOptions, WaitResult, Waiter};
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timeout for presence/visibility probes when the caller gives none
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;

/// Delay between keystrokes for [`BasePage::type_text`]
pub const DEFAULT_TYPE_DELAY_MS: u64 = 50;

/// A page or component of the site under test
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Shared page machinery
    fn base(&self) -> &BasePage;

    /// Name used in logs and screenshot names
    fn page_name(&self) -> &str {
        self.base().name()
    }

    /// Default URL of the page
    fn page_url(&self) -> &str {
        self.base().url()
    }

    /// Whether the page finished loading
    async fn is_loaded(&self) -> bool {
        self.base().is_page_loaded().await
    }
}

/// State and operations shared by every page
#[derive(Clone)]
pub struct BasePage {
    name: String,
    url: String,
    driver: Arc<dyn PageDriver>,
    resolver: LocatorResolver,
    waiter: Waiter,
    screenshots: Arc<ScreenshotManager>,
    settings: Arc<Settings>,
}

impl fmt::Debug for BasePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasePage")
            .field("name", &self.name)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl BasePage {
    /// Page bound to a session
    #[must_use]
    pub fn new(session: &BrowserSession, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_parts(
            session.driver().clone(),
            session.settings().clone(),
            session.screenshots().clone(),
            name,
            url,
        )
    }

    /// Page from explicit parts
    #[must_use]
    pub fn with_parts(
        driver: Arc<dyn PageDriver>,
        settings: Arc<Settings>,
        screenshots: Arc<ScreenshotManager>,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let resolver = LocatorResolver::new(driver.clone(), settings.locator)
            .with_screenshots(screenshots.clone());
        let waiter = Waiter::new(driver.clone(), WaitOptions::from(&settings.wait));
        Self {
            name: name.into(),
            url: url.into(),
            driver,
            resolver,
            waiter,
            screenshots,
            settings,
        }
    }

    /// Page name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn PageDriver> {
        &self.driver
    }

    /// Resolver
    #[must_use]
    pub const fn resolver(&self) -> &LocatorResolver {
        &self.resolver
    }

    /// Waiter
    #[must_use]
    pub const fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    /// Screenshot manager
    #[must_use]
    pub fn screenshots(&self) -> &Arc<ScreenshotManager> {
        &self.screenshots
    }

    /// Settings
    #[must_use]
    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    /// Empty locator with the configured timeout
    #[must_use]
    pub fn locator(&self, name: impl Into<String>) -> NamedLocator {
        self.resolver.locator(name)
    }

    /// Log a page action as `[{PAGE}] {action} - {details}`
    pub fn log_action(&self, action: &str, details: &str) {
        if details.is_empty() {
            info!("[{}] {action}", self.name);
        } else {
            info!("[{}] {action} - {details}", self.name);
        }
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Go to `url`, or the page's default URL, and wait for the load event
    pub async fn navigate(&self, url: Option<&str>) -> ProbeResult<()> {
        let target = url.unwrap_or(&self.url);
        if target.is_empty() {
            return Err(ProbeError::navigation(target, "no URL given and the page has no default"));
        }
        self.log_action("Navigate", target);
        self.driver.goto(target).await?;
        self.wait_for_page_load(None).await.map(|_| ())
    }

    /// Reload
    pub async fn refresh(&self) -> ProbeResult<()> {
        self.log_action("Refresh", "");
        self.driver.reload().await?;
        self.wait_for_page_load(None).await.map(|_| ())
    }

    /// History back
    pub async fn go_back(&self) -> ProbeResult<()> {
        self.log_action("Go back", "");
        self.driver.go_back().await
    }

    /// History forward
    pub async fn go_forward(&self) -> ProbeResult<()> {
        self.log_action("Go forward", "");
        self.driver.go_forward().await
    }

    /// Current URL
    pub async fn current_url(&self) -> ProbeResult<String> {
        self.driver.current_url().await
    }

    /// Document title
    pub async fn title(&self) -> ProbeResult<String> {
        self.driver.title().await
    }

    /// `document.readyState == "complete"`
    pub async fn is_page_loaded(&self) -> bool {
        match self.driver.evaluate("document.readyState").await {
            Ok(state) => state.as_str() == Some("complete"),
            Err(e) => {
                debug!(page = %self.name, error = %e, "readyState check failed");
                false
            }
        }
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Resolve or fail with `ElementNotFound`
    pub async fn find_element(
        &self,
        locator: &NamedLocator,
        wait_for_visible: bool,
    ) -> ProbeResult<Element> {
        self.resolver.find_or_raise(locator, wait_for_visible).await
    }

    /// Resolve, `None` when nothing matched
    pub async fn find_element_safe(
        &self,
        locator: &NamedLocator,
        wait_for_visible: bool,
    ) -> Option<Element> {
        self.resolver.resolve(locator, wait_for_visible).await.into_handle()
    }

    /// Full resolution trace
    pub async fn resolve_locator(
        &self,
        locator: &NamedLocator,
        wait_for_visible: bool,
    ) -> ResolutionResult {
        self.resolver.resolve(locator, wait_for_visible).await
    }

    /// Attached within `timeout_ms` (default 5000)
    pub async fn is_element_present(
        &self,
        locator: &NamedLocator,
        timeout_ms: Option<u64>,
    ) -> bool {
        self.resolver
            .is_present(locator, timeout_ms.unwrap_or(DEFAULT_PROBE_TIMEOUT_MS))
            .await
    }

    /// Visible within `timeout_ms` (default 5000)
    pub async fn is_element_visible(
        &self,
        locator: &NamedLocator,
        timeout_ms: Option<u64>,
    ) -> bool {
        self.resolver
            .is_visible(locator, timeout_ms.unwrap_or(DEFAULT_PROBE_TIMEOUT_MS))
            .await
    }

    /// Number of matches of the first strategy that resolves, 0 if none does
    pub async fn get_element_count(&self, locator: &NamedLocator) -> ProbeResult<usize> {
        match self.resolver.resolve(locator, false).await.into_handle() {
            Some(element) => element.count().await,
            None => Ok(0),
        }
    }

    /// Resolve, then wait for `condition` with the locator timeout
    pub async fn wait_for_element(
        &self,
        locator: &NamedLocator,
        condition: WaitCondition,
    ) -> ProbeResult<Element> {
        let element = self.find_element(locator, false).await?;
        self.waiter
            .wait_for(&element, condition, Some(Duration::from_millis(locator.timeout_ms())))
            .await?;
        Ok(element)
    }

    /// Resolve visible and wait until `action` can be performed
    async fn actionable(&self, locator: &NamedLocator, action: &str) -> ProbeResult<Element> {
        let element = self.find_element(locator, true).await?;
        self.waiter
            .smart_wait(&element, action, Some(Duration::from_millis(locator.timeout_ms())))
            .await?;
        Ok(element)
    }

    // =========================================================================
    // INTERACTION
    // =========================================================================

    /// Click
    pub async fn click(&self, locator: &NamedLocator) -> ProbeResult<()> {
        self.log_action("Click", locator.name());
        self.actionable(locator, "click").await?.click().await
    }

    /// Double click
    pub async fn double_click(&self, locator: &NamedLocator) -> ProbeResult<()> {
        self.log_action("Double click", locator.name());
        self.actionable(locator, "click").await?.double_click().await
    }

    /// Right click
    pub async fn right_click(&self, locator: &NamedLocator) -> ProbeResult<()> {
        self.log_action("Right click", locator.name());
        self.actionable(locator, "click").await?.right_click().await
    }

    /// Clear then fill
    pub async fn fill(&self, locator: &NamedLocator, text: &str) -> ProbeResult<()> {
        self.log_action("Fill", &format!("{} with '{text}'", locator.name()));
        let element = self.actionable(locator, "fill").await?;
        element.clear().await?;
        element.fill(text).await
    }

    /// Type key by key (50 ms between keys)
    pub async fn type_text(&self, locator: &NamedLocator, text: &str) -> ProbeResult<()> {
        self.log_action("Type", &format!("{} with '{text}'", locator.name()));
        self.actionable(locator, "type")
            .await?
            .type_text(text, Duration::from_millis(DEFAULT_TYPE_DELAY_MS))
            .await
    }

    /// Clear an input
    pub async fn clear(&self, locator: &NamedLocator) -> ProbeResult<()> {
        self.log_action("Clear", locator.name());
        self.actionable(locator, "clear").await?.clear().await
    }

    /// Select an option
    pub async fn select_option(
        &self,
        locator: &NamedLocator,
        option: &SelectBy,
    ) -> ProbeResult<String> {
        self.log_action("Select", &format!("{} option {option:?}", locator.name()));
        self.actionable(locator, "select").await?.select_option(option).await
    }

    /// Check a checkbox
    pub async fn check(&self, locator: &NamedLocator) -> ProbeResult<()> {
        self.log_action("Check", locator.name());
        self.actionable(locator, "check").await?.check().await
    }

    /// Uncheck a checkbox
    pub async fn uncheck(&self, locator: &NamedLocator) -> ProbeResult<()> {
        self.log_action("Uncheck", locator.name());
        self.actionable(locator, "uncheck").await?.uncheck().await
    }

    /// Hover
    pub async fn hover(&self, locator: &NamedLocator) -> ProbeResult<()> {
        self.log_action("Hover", locator.name());
        self.find_element(locator, true).await?.hover().await
    }

    /// Trimmed `textContent`, empty when absent
    pub async fn get_text(&self, locator: &NamedLocator) -> ProbeResult<String> {
        let text = self.find_element(locator, true).await?.text_content().await?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    /// Rendered text
    pub async fn get_inner_text(&self, locator: &NamedLocator) -> ProbeResult<String> {
        self.find_element(locator, true).await?.inner_text().await
    }

    /// Attribute value
    pub async fn get_attribute(
        &self,
        locator: &NamedLocator,
        name: &str,
    ) -> ProbeResult<Option<String>> {
        self.find_element(locator, false).await?.attribute(name).await
    }

    /// Input value
    pub async fn get_input_value(&self, locator: &NamedLocator) -> ProbeResult<String> {
        self.find_element(locator, false).await?.input_value().await
    }

    // =========================================================================
    // WAITS
    // =========================================================================

    /// Wait for the load event
    pub async fn wait_for_page_load(&self, timeout: Option<Duration>) -> ProbeResult<WaitResult> {
        self.waiter.wait_for_page_load(timeout).await
    }

    /// Wait for network idle
    pub async fn wait_for_network_idle(
        &self,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        self.waiter.wait_for_network_idle(timeout).await
    }

    /// Wait until the URL matches
    pub async fn wait_for_url(
        &self,
        pattern: &UrlPattern,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        self.waiter.wait_for_url(pattern, timeout).await
    }

    // =========================================================================
    // SCREENSHOTS AND SCRIPTS
    // =========================================================================

    /// Full-page screenshot named `{PAGE}_{name}`; failures are logged and
    /// yield `None`
    pub async fn capture_screenshot(&self, name: &str) -> Option<PathBuf> {
        let name = format!("{}_{name}", self.name);
        match self.screenshots.capture_page(self.driver.as_ref(), &name, true).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("[{}] Screenshot '{name}' failed: {e}", self.name);
                None
            }
        }
    }

    /// Screenshot of one element
    pub async fn capture_element_screenshot(
        &self,
        locator: &NamedLocator,
        name: &str,
    ) -> ProbeResult<PathBuf> {
        let element = self.find_element(locator, true).await?;
        self.screenshots
            .capture_element(&element, &format!("{}_{name}", self.name))
            .await
    }

    /// Evaluate JavaScript
    pub async fn execute_script(&self, script: &str) -> ProbeResult<serde_json::Value> {
        self.driver.evaluate(script).await
    }

    /// Scroll an element into view
    pub async fn scroll_to_element(&self, locator: &NamedLocator) -> ProbeResult<()> {
        self.find_element(locator, false).await?.scroll_into_view().await
    }

    /// Scroll to the top of the document
    pub async fn scroll_to_top(&self) -> ProbeResult<()> {
        self.driver.evaluate("window.scrollTo(0, 0)").await.map(|_| ())
    }

    /// Scroll to the bottom of the document
    pub async fn scroll_to_bottom(&self) -> ProbeResult<()> {
        self.driver
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};

    struct LoginPage {
        base: BasePage,
        username: NamedLocator,
        submit: NamedLocator,
    }

    impl PageObject for LoginPage {
        fn base(&self) -> &BasePage {
            &self.base
        }
    }

    fn setup() -> (Arc<MockDriver>, tempfile::TempDir, LoginPage) {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockDriver::new());
        let settings = Arc::new(
            Settings::new()
                .with_locator_timeout(200)
                .with_screenshots_dir(dir.path()),
        );
        let screenshots = Arc::new(ScreenshotManager::new(dir.path()));
        let base = BasePage::with_parts(
            mock.clone(),
            settings,
            screenshots,
            "LoginPage",
            "https://shop.test/login",
        );
        let page = LoginPage {
            username: base
                .locator("Username")
                .add_xpath("//input[@id='user']", "by id")
                .add_css("input[name='user']", "by name"),
            submit: base.locator("Submit").add_role("button[name=Sign in]", "role"),
            base,
        };
        (mock, dir, page)
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_default_and_explicit() {
            let (mock, _dir, page) = setup();
            page.base.navigate(None).await.unwrap();
            assert_eq!(page.base.current_url().await.unwrap(), "https://shop.test/login");
            page.base.navigate(Some("https://shop.test/help")).await.unwrap();
            page.base.go_back().await.unwrap();
            assert_eq!(page.base.current_url().await.unwrap(), "https://shop.test/login");
            assert_eq!(mock.call_count("wait_for_load_state:load"), 2);
        }

        #[tokio::test]
        async fn test_is_loaded_reads_ready_state() {
            let (mock, _dir, page) = setup();
            assert!(!page.is_loaded().await);
            mock.set_script_result("document.readyState", serde_json::json!("complete"));
            assert!(page.is_loaded().await);
            assert_eq!(page.page_name(), "LoginPage");
            assert_eq!(page.page_url(), "https://shop.test/login");
        }
    }

    mod interaction_tests {
        use super::*;

        #[tokio::test]
        async fn test_fill_uses_fallback_and_clears_first() {
            let (mock, _dir, page) = setup();
            mock.add_element("css=input[name='user']", MockElement::visible().with_value("stale"));
            page.base.fill(&page.username, "alice").await.unwrap();
            assert_eq!(page.base.get_input_value(&page.username).await.unwrap(), "alice");
            let history = mock.call_history();
            let clear = history.iter().position(|c| c.starts_with("clear:")).unwrap();
            let fill = history.iter().position(|c| c.starts_with("fill:")).unwrap();
            assert!(clear < fill);
        }

        #[tokio::test]
        async fn test_click_by_role() {
            let (mock, _dir, page) = setup();
            mock.add_element("role=button[name=\"Sign in\"]", MockElement::visible());
            page.base.click(&page.submit).await.unwrap();
            assert!(mock.was_called("click:role=button[name=\"Sign in\"]"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_disabled_button_times_out() {
            let (mock, _dir, page) = setup();
            mock.add_element("role=button[name=\"Sign in\"]", MockElement::visible().disabled());
            let err = page.base.click(&page.submit).await.unwrap_err();
            assert!(err.is_timeout());
            assert!(!mock.was_called("click:"));
        }

        #[tokio::test]
        async fn test_type_text_uses_delay() {
            let (mock, _dir, page) = setup();
            mock.add_element("xpath=//input[@id='user']", MockElement::visible());
            page.base.type_text(&page.username, "bob").await.unwrap();
            assert!(mock.was_called("type_text:xpath=//input[@id='user']:bob:50"));
        }

        #[tokio::test]
        async fn test_get_text_trims() {
            let (mock, _dir, page) = setup();
            mock.add_element(
                "xpath=//input[@id='user']",
                MockElement::visible().with_text("  hi \n"),
            );
            assert_eq!(page.base.get_text(&page.username).await.unwrap(), "hi");
        }
    }

    mod lookup_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_missing_element() {
            let (_mock, _dir, page) = setup();
            assert!(page.base.find_element_safe(&page.submit, true).await.is_none());
            assert!(!page.base.is_element_present(&page.submit, Some(100)).await);
            assert_eq!(page.base.get_element_count(&page.submit).await.unwrap(), 0);
            let err = page.base.find_element(&page.submit, true).await.unwrap_err();
            match err {
                ProbeError::ElementNotFound { artifact, .. } => {
                    let artifact = artifact.unwrap();
                    assert!(artifact.exists());
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_element_count() {
            let (mock, _dir, page) = setup();
            mock.add_element("css=input[name='user']", MockElement::visible().with_count(2));
            assert_eq!(page.base.get_element_count(&page.username).await.unwrap(), 2);
        }

        #[tokio::test]
        async fn test_screenshot_name_carries_page() {
            let (_mock, _dir, page) = setup();
            let path = page.base.capture_screenshot("after_login").await.unwrap();
            let file_name = path.file_name().unwrap().to_string_lossy();
            assert!(file_name.starts_with("LoginPage_after_login_"));
        }

        #[tokio::test]
        async fn test_screenshot_failure_is_none() {
            let (mock, _dir, page) = setup();
            mock.fail_screenshots(true);
            assert!(page.base.capture_screenshot("x").await.is_none());
        }
    }
}
