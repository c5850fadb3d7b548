//! Wait Mechanisms
//!
//! Polling waits over a [`PageDriver`]: element conditions, match counts,
//! text, URLs and page load states. Every wait is bounded; expiry is
//! [`ProbeError::Timeout`].

use crate::config::WaitSettings;
use crate::driver::{Element, ElementState, PageDriver};
use crate::result::{ProbeError, ProbeResult};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Default timeout for a page load (60 seconds)
pub const DEFAULT_PAGE_LOAD_TIMEOUT_MS: u64 = 60_000;

/// Default timeout for an element to load (15 seconds)
pub const DEFAULT_ELEMENT_LOAD_TIMEOUT_MS: u64 = 15_000;

// =============================================================================
// LOAD STATE
// =============================================================================

/// Page load states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded` event
    DomContentLoaded,
    /// Wait for network to be idle (no requests for 500ms)
    NetworkIdle,
}

impl LoadState {
    /// Get the event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "domcontentloaded",
            Self::NetworkIdle => "networkidle",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

// =============================================================================
// CONDITIONS
// =============================================================================

/// Element conditions a [`Waiter`] can wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitCondition {
    /// Rendered and visible
    Visible,
    /// Not visible or absent
    Hidden,
    /// Present in the DOM
    Attached,
    /// Absent from the DOM
    Detached,
    /// Enabled
    Enabled,
    /// Disabled
    Disabled,
    /// Accepts input
    Editable,
    /// Visible and enabled
    Clickable,
}

impl WaitCondition {
    /// Condition appropriate before performing `action`
    #[must_use]
    pub fn for_action(action: &str) -> Self {
        match action.to_ascii_lowercase().as_str() {
            "click" | "check" | "uncheck" | "double_click" | "right_click" => Self::Clickable,
            "fill" | "type" | "type_text" | "clear" => Self::Editable,
            "select" | "select_option" => Self::Enabled,
            _ => Self::Visible,
        }
    }

    const fn element_state(self) -> Option<ElementState> {
        match self {
            Self::Visible => Some(ElementState::Visible),
            Self::Hidden => Some(ElementState::Hidden),
            Self::Attached => Some(ElementState::Attached),
            Self::Detached => Some(ElementState::Detached),
            Self::Enabled | Self::Disabled | Self::Editable | Self::Clickable => None,
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Attached => "attached",
            Self::Detached => "detached",
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Editable => "editable",
            Self::Clickable => "clickable",
        };
        f.write_str(name)
    }
}

/// How an observed count is compared to the expected one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountComparison {
    /// `actual == expected`
    #[default]
    Equals,
    /// `actual > expected`
    GreaterThan,
    /// `actual < expected`
    LessThan,
    /// `actual >= expected`
    AtLeast,
}

impl CountComparison {
    /// Whether `actual` satisfies the comparison
    #[must_use]
    pub const fn holds(self, actual: usize, expected: usize) -> bool {
        match self {
            Self::Equals => actual == expected,
            Self::GreaterThan => actual > expected,
            Self::LessThan => actual < expected,
            Self::AtLeast => actual >= expected,
        }
    }
}

/// URL matcher
#[derive(Debug, Clone)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Contains substring
    Contains(String),
    /// Regex match
    Regex(regex::Regex),
}

impl UrlPattern {
    /// Compile a regex pattern
    pub fn regex(pattern: &str) -> ProbeResult<Self> {
        regex::Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|e| ProbeError::config(format!("invalid URL pattern '{pattern}': {e}")))
    }

    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Contains(pattern) => url.contains(pattern.as_str()),
            Self::Regex(re) => re.is_match(url),
        }
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "url == {p}"),
            Self::Contains(p) => write!(f, "url contains {p}"),
            Self::Regex(re) => write!(f, "url =~ {}", re.as_str()),
        }
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Page load timeout in milliseconds
    pub page_load_timeout_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            page_load_timeout_ms: DEFAULT_PAGE_LOAD_TIMEOUT_MS,
        }
    }
}

impl From<&WaitSettings> for WaitOptions {
    fn from(settings: &WaitSettings) -> Self {
        Self {
            timeout_ms: settings.default_timeout_ms,
            poll_interval_ms: settings.polling_interval_ms,
            page_load_timeout_ms: settings.page_load_timeout_ms,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

impl WaitResult {
    fn new(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            elapsed,
            waited_for: waited_for.into(),
        }
    }
}

// =============================================================================
// WAITER
// =============================================================================

/// Waiter for synchronization operations on one page
#[derive(Clone)]
pub struct Waiter {
    driver: Arc<dyn PageDriver>,
    options: WaitOptions,
}

impl fmt::Debug for Waiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter").field("options", &self.options).finish_non_exhaustive()
    }
}

impl Waiter {
    /// Create a waiter
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, options: WaitOptions) -> Self {
        Self { driver, options }
    }

    /// Default options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Poll `check` until it returns `true`; the whole wait, including a
    /// check that hangs, is cut off at `timeout`.
    ///
    /// Check errors count as "not yet": elements often do not exist at the
    /// start of the wait.
    async fn poll_until<F, Fut>(
        &self,
        description: &str,
        timeout: Duration,
        mut check: F,
    ) -> ProbeResult<WaitResult>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeResult<bool>>,
    {
        let start = Instant::now();
        let interval = self.options.poll_interval();
        let polling = async {
            loop {
                match check().await {
                    Ok(true) => return,
                    Ok(false) => {}
                    Err(e) => {
                        debug!(waiting_for = description, error = %e, "check failed, retrying");
                    }
                }
                tokio::time::sleep(interval).await;
            }
        };
        if tokio::time::timeout(timeout, polling).await.is_err() {
            warn!(
                waiting_for = description,
                timeout_ms = timeout.as_millis() as u64,
                "wait timed out"
            );
            return Err(ProbeError::Timeout {
                ms: timeout.as_millis() as u64,
            });
        }
        Ok(WaitResult::new(start.elapsed(), description))
    }

    /// Wait for an element condition
    pub async fn wait_for(
        &self,
        element: &Element,
        condition: WaitCondition,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        let timeout = timeout.unwrap_or_else(|| self.options.timeout());
        let description = format!("{} to be {condition}", element.query());
        debug!("Waiting for {description}");

        if let Some(state) = condition.element_state() {
            let start = Instant::now();
            element.wait_for(state, timeout).await?;
            return Ok(WaitResult::new(start.elapsed(), description));
        }

        self.poll_until(&description, timeout, || async move {
            Ok(match condition {
                WaitCondition::Enabled => element.is_enabled().await?,
                WaitCondition::Disabled => !element.is_enabled().await?,
                WaitCondition::Editable => element.is_editable().await?,
                _ => element.is_visible().await? && element.is_enabled().await?,
            })
        })
        .await
    }

    /// Wait until the number of matches satisfies `comparison`
    pub async fn wait_for_count(
        &self,
        element: &Element,
        expected: usize,
        comparison: CountComparison,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        let timeout = timeout.unwrap_or_else(|| self.options.timeout());
        let description = format!("{} count {comparison:?} {expected}", element.query());
        self.poll_until(&description, timeout, || async move {
            Ok(comparison.holds(element.count().await?, expected))
        })
        .await
    }

    /// Wait until the element's text contains (or equals) `text`
    pub async fn wait_for_text(
        &self,
        element: &Element,
        text: &str,
        exact: bool,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        let timeout = timeout.unwrap_or_else(|| self.options.timeout());
        let description = format!("{} text {text:?}", element.query());
        self.poll_until(&description, timeout, || async move {
            let content = element.text_content().await?.unwrap_or_default();
            let content = content.trim();
            Ok(if exact { content == text } else { content.contains(text) })
        })
        .await
    }

    /// Wait for the condition `action` needs, then return
    pub async fn smart_wait(
        &self,
        element: &Element,
        action: &str,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        self.wait_for(element, WaitCondition::for_action(action), timeout).await
    }

    /// Wait for a load state
    pub async fn wait_for_load_state(
        &self,
        state: LoadState,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        let timeout =
            timeout.unwrap_or_else(|| Duration::from_millis(self.options.page_load_timeout_ms));
        let start = Instant::now();
        self.driver.wait_for_load_state(state, timeout).await?;
        Ok(WaitResult::new(start.elapsed(), format!("load state {state}")))
    }

    /// Wait for the `load` event
    pub async fn wait_for_page_load(&self, timeout: Option<Duration>) -> ProbeResult<WaitResult> {
        self.wait_for_load_state(LoadState::Load, timeout).await
    }

    /// Wait for network idle
    pub async fn wait_for_network_idle(
        &self,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        self.wait_for_load_state(LoadState::NetworkIdle, timeout).await
    }

    /// Wait for `DOMContentLoaded`
    pub async fn wait_for_dom_ready(&self, timeout: Option<Duration>) -> ProbeResult<WaitResult> {
        self.wait_for_load_state(LoadState::DomContentLoaded, timeout).await
    }

    /// Wait until the current URL matches
    pub async fn wait_for_url(
        &self,
        pattern: &UrlPattern,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        let timeout = timeout.unwrap_or_else(|| self.options.timeout());
        let description = pattern.to_string();
        let driver = &self.driver;
        self.poll_until(&description, timeout, || async move {
            Ok(pattern.matches(&driver.current_url().await?))
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use crate::locator::ElementQuery;

    fn setup() -> (Arc<MockDriver>, Waiter) {
        let mock = Arc::new(MockDriver::new());
        let options = WaitOptions::new().with_timeout(2_000).with_poll_interval(100);
        let waiter = Waiter::new(mock.clone(), options);
        (mock, waiter)
    }

    fn element(mock: &Arc<MockDriver>, css: &str) -> Element {
        Element::new(mock.clone(), ElementQuery::css(css))
    }

    mod condition_tests {
        use super::*;

        #[test]
        fn test_for_action() {
            assert_eq!(WaitCondition::for_action("click"), WaitCondition::Clickable);
            assert_eq!(WaitCondition::for_action("check"), WaitCondition::Clickable);
            assert_eq!(WaitCondition::for_action("fill"), WaitCondition::Editable);
            assert_eq!(WaitCondition::for_action("TYPE"), WaitCondition::Editable);
            assert_eq!(WaitCondition::for_action("select"), WaitCondition::Enabled);
            assert_eq!(WaitCondition::for_action("hover"), WaitCondition::Visible);
        }

        #[test]
        fn test_count_comparison() {
            assert!(CountComparison::Equals.holds(3, 3));
            assert!(CountComparison::GreaterThan.holds(4, 3));
            assert!(!CountComparison::LessThan.holds(3, 3));
            assert!(CountComparison::AtLeast.holds(3, 3));
        }

        #[test]
        fn test_url_pattern() {
            let search = UrlPattern::Contains("/sch/".into());
            assert!(search.matches("https://www.ebay.com/sch/i.html"));
            assert!(UrlPattern::Exact("https://a.test".into()).matches("https://a.test"));
            let cart = UrlPattern::regex(r"cart|atc").unwrap();
            assert!(cart.matches("https://www.ebay.com/atc/myatc"));
            assert!(UrlPattern::regex("(").is_err());
        }

        #[test]
        fn test_options_from_settings() {
            let options = WaitOptions::from(&WaitSettings::default());
            assert_eq!(options.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
            assert_eq!(options.poll_interval(), Duration::from_millis(500));
        }
    }

    mod waiter_tests {
        use super::*;

        #[tokio::test]
        async fn test_clickable_element() {
            let (mock, waiter) = setup();
            mock.add_element("css=button", MockElement::visible());
            let button = element(&mock, "button");
            waiter.wait_for(&button, WaitCondition::Clickable, None).await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_disabled_element_is_not_clickable() {
            let (mock, waiter) = setup();
            mock.add_element("css=button", MockElement::visible().disabled());
            let button = element(&mock, "button");
            let err = waiter.wait_for(&button, WaitCondition::Clickable, None).await.unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { ms: 2_000 }));
            waiter.wait_for(&button, WaitCondition::Disabled, None).await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_visible_delegates_to_driver() {
            let (mock, waiter) = setup();
            let missing = element(&mock, "missing");
            let err = waiter
                .wait_for(&missing, WaitCondition::Visible, Some(Duration::from_millis(300)))
                .await
                .unwrap_err();
            assert!(err.is_timeout());
            assert!(mock.was_called("wait_for:css=missing:visible:300"));
        }

        #[tokio::test]
        async fn test_wait_for_count_and_text() {
            let (mock, waiter) = setup();
            mock.add_element(
                "css=li",
                MockElement::visible().with_count(4).with_text("  Added to cart "),
            );
            let rows = element(&mock, "li");
            waiter.wait_for_count(&rows, 3, CountComparison::AtLeast, None).await.unwrap();
            waiter.wait_for_text(&rows, "Added to cart", true, None).await.unwrap();
            waiter.wait_for_text(&rows, "Added", false, None).await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_url_times_out() {
            let (mock, waiter) = setup();
            mock.set_url("https://www.ebay.com/");
            let err = waiter
                .wait_for_url(&UrlPattern::Contains("cart".into()), None)
                .await
                .unwrap_err();
            assert!(err.is_timeout());
            mock.set_url("https://cart.ebay.com/");
            waiter
                .wait_for_url(&UrlPattern::Contains("cart".into()), None)
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_load_states_go_to_driver() {
            let (mock, waiter) = setup();
            waiter.wait_for_page_load(None).await.unwrap();
            waiter.wait_for_network_idle(None).await.unwrap();
            waiter.wait_for_dom_ready(None).await.unwrap();
            assert!(mock.was_called("wait_for_load_state:load"));
            assert!(mock.was_called("wait_for_load_state:networkidle"));
            assert!(mock.was_called("wait_for_load_state:domcontentloaded"));
        }
    }
}
