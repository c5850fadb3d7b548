//! Scripted in-memory page for tests.
//!
//! Elements are keyed by the query's display form (`css=a.cart`,
//! `xpath=//li >> nth=0 >> xpath=.//span`). A narrowed query (`>> nth=i`)
//! that has no entry of its own falls back to its unindexed entry.

use super::{ClickOptions, ElementState, PageDriver, SelectBy};
use crate::locator::ElementQuery;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::LoadState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// PNG file signature written by mock screenshots
const MOCK_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A scripted element
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    /// Number of live matches
    pub count: usize,
    /// Present in the DOM (independent of `count` to model stale references)
    pub attached: bool,
    /// Rendered and visible
    pub visible: bool,
    /// Enabled for interaction
    pub enabled: bool,
    /// Accepts text input
    pub editable: bool,
    /// Checked state
    pub checked: bool,
    /// `textContent`
    pub text: Option<String>,
    /// Input value
    pub value: String,
    /// Attributes
    pub attributes: HashMap<String, String>,
    /// `<option>` entries as `(value, label)`
    pub options: Vec<(String, String)>,
    /// Clicking navigates here
    pub navigates_to: Option<String>,
    /// Clicking adds these elements to the page
    pub reveals: Vec<(String, MockElement)>,
}

impl Default for MockElement {
    fn default() -> Self {
        Self::visible()
    }
}

impl MockElement {
    /// One visible, enabled, editable match
    #[must_use]
    pub fn visible() -> Self {
        Self {
            count: 1,
            attached: true,
            visible: true,
            enabled: true,
            editable: true,
            checked: false,
            text: None,
            value: String::new(),
            attributes: HashMap::new(),
            options: Vec::new(),
            navigates_to: None,
            reveals: Vec::new(),
        }
    }

    /// One attached but invisible match
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::visible()
        }
    }

    /// Attached reference that yields zero live matches
    #[must_use]
    pub fn stale() -> Self {
        Self {
            count: 0,
            visible: false,
            ..Self::visible()
        }
    }

    /// Set match count
    #[must_use]
    pub const fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set input value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add a `<select>` option
    #[must_use]
    pub fn with_option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push((value.into(), label.into()));
        self
    }

    /// Mark disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self.editable = false;
        self
    }

    /// Mark read-only
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    /// Navigate when clicked
    #[must_use]
    pub fn navigates_to(mut self, url: impl Into<String>) -> Self {
        self.navigates_to = Some(url.into());
        self
    }

    /// Add elements to the page when clicked
    #[must_use]
    pub fn reveals(mut self, key: impl Into<String>, element: Self) -> Self {
        self.reveals.push((key.into(), element));
        self
    }

    fn satisfies(&self, state: ElementState) -> bool {
        let visible = self.count > 0 && self.visible;
        match state {
            ElementState::Visible => visible,
            ElementState::Attached => self.attached,
            ElementState::Hidden => !visible,
            ElementState::Detached => !self.attached,
        }
    }
}

/// Elements and title served for a URL
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    url: String,
    title: String,
    elements: Vec<(String, MockElement)>,
}

impl MockPage {
    /// Page served at `url` (exact match, else longest prefix)
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            elements: Vec::new(),
        }
    }

    /// Set document title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Add an element
    #[must_use]
    pub fn with_element(mut self, key: impl Into<String>, element: MockElement) -> Self {
        self.elements.push((key.into(), element));
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    url: String,
    title: String,
    history: Vec<String>,
    history_index: usize,
    elements: HashMap<String, MockElement>,
    pages: Vec<MockPage>,
    unreachable: Vec<String>,
    failures: HashMap<String, String>,
    scripts: Vec<(String, serde_json::Value)>,
    stalled_load: bool,
    stalled_waits: Option<Duration>,
    fail_screenshots: bool,
    screenshots: Vec<PathBuf>,
    closed: bool,
    call_history: Vec<String>,
}

impl MockState {
    fn record(&mut self, call: String) {
        self.call_history.push(call);
    }

    fn lookup(&self, query: &ElementQuery) -> Option<MockElement> {
        let key = query.to_string();
        if let Some(element) = self.elements.get(&key) {
            return Some(element.clone());
        }
        let index = query.index()?;
        let base = self.elements.get(&query.unindexed().to_string())?;
        let mut element = base.clone();
        element.count = usize::from(index < base.count);
        element.attached = element.count > 0;
        Some(element)
    }

    fn lookup_mut(&mut self, query: &ElementQuery) -> Option<&mut MockElement> {
        let key = query.to_string();
        if self.elements.contains_key(&key) {
            return self.elements.get_mut(&key);
        }
        self.elements.get_mut(&query.unindexed().to_string())
    }

    fn check_failure(&self, query: &ElementQuery) -> ProbeResult<()> {
        match self.failures.get(&query.to_string()) {
            Some(message) => Err(ProbeError::driver(message.clone())),
            None => Ok(()),
        }
    }

    fn require(&self, query: &ElementQuery) -> ProbeResult<MockElement> {
        self.check_failure(query)?;
        self.lookup(query)
            .filter(|e| e.count > 0)
            .ok_or_else(|| ProbeError::driver(format!("no element matches {query}")))
    }

    fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        if self.unreachable.iter().any(|u| url.starts_with(u.as_str())) {
            return Err(ProbeError::navigation(url, "net::ERR_NAME_NOT_RESOLVED"));
        }
        let page = self
            .pages
            .iter()
            .find(|p| p.url == url)
            .or_else(|| {
                self.pages
                    .iter()
                    .filter(|p| url.starts_with(p.url.as_str()))
                    .max_by_key(|p| p.url.len())
            })
            .cloned();
        if let Some(page) = page {
            self.title = page.title;
            self.elements = page.elements.into_iter().collect();
        }
        self.url = url.to_string();
        self.history.truncate(self.history_index + usize::from(!self.history.is_empty()));
        self.history.push(url.to_string());
        self.history_index = self.history.len() - 1;
        Ok(())
    }
}

/// Mock driver for unit testing
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Create new mock driver on `about:blank`
    #[must_use]
    pub fn new() -> Self {
        let driver = Self::default();
        driver.lock().url = "about:blank".to_string();
        driver
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register or replace an element on the current page
    pub fn add_element(&self, key: impl Into<String>, element: MockElement) {
        self.lock().elements.insert(key.into(), element);
    }

    /// Remove an element from the current page
    pub fn remove_element(&self, key: &str) {
        self.lock().elements.remove(key);
    }

    /// Current state of an element
    #[must_use]
    pub fn element(&self, key: &str) -> Option<MockElement> {
        self.lock().elements.get(key).cloned()
    }

    /// Serve `page` when navigating to its URL
    pub fn register_page(&self, page: MockPage) {
        self.lock().pages.push(page);
    }

    /// Make navigation to URLs with this prefix fail
    pub fn set_unreachable(&self, url_prefix: impl Into<String>) {
        self.lock().unreachable.push(url_prefix.into());
    }

    /// Every operation on this query fails with a driver error
    pub fn fail_query(&self, key: impl Into<String>, message: impl Into<String>) {
        self.lock().failures.insert(key.into(), message.into());
    }

    /// Scripts containing `needle` evaluate to `value`
    pub fn set_script_result(&self, needle: impl Into<String>, value: serde_json::Value) {
        self.lock().scripts.push((needle.into(), value));
    }

    /// Load-state waits never complete
    pub fn stall_load_state(&self, stalled: bool) {
        self.lock().stalled_load = stalled;
    }

    /// Element waits hang for `stall` before answering, ignoring their timeout
    pub fn stall_element_waits(&self, stall: Option<Duration>) {
        self.lock().stalled_waits = stall;
    }

    /// Screenshots fail
    pub fn fail_screenshots(&self, fail: bool) {
        self.lock().fail_screenshots = fail;
    }

    /// Set the current URL without navigating
    pub fn set_url(&self, url: impl Into<String>) {
        self.lock().url = url.into();
    }

    /// Set document title
    pub fn set_title(&self, title: impl Into<String>) {
        self.lock().title = title.into();
    }

    /// Whether `close` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Screenshot paths written so far
    #[must_use]
    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.lock().screenshots.clone()
    }

    /// Get call history
    #[must_use]
    pub fn call_history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Check if a call starting with `prefix` was made
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock().call_history.iter().any(|c| c.starts_with(prefix))
    }

    /// Number of calls starting with `prefix`
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.lock()
            .call_history
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Forget recorded calls
    pub fn clear_history(&self) {
        self.lock().call_history.clear();
    }

    fn write_png(path: &Path) -> ProbeResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, MOCK_PNG)?;
        Ok(())
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn goto(&self, url: &str) -> ProbeResult<()> {
        let mut state = self.lock();
        state.record(format!("goto:{url}"));
        state.navigate(url)
    }

    async fn reload(&self) -> ProbeResult<()> {
        self.lock().record("reload".to_string());
        Ok(())
    }

    async fn go_back(&self) -> ProbeResult<()> {
        let mut state = self.lock();
        state.record("go_back".to_string());
        if state.history_index > 0 {
            state.history_index -= 1;
            state.url = state.history[state.history_index].clone();
        }
        Ok(())
    }

    async fn go_forward(&self) -> ProbeResult<()> {
        let mut state = self.lock();
        state.record("go_forward".to_string());
        if state.history_index + 1 < state.history.len() {
            state.history_index += 1;
            state.url = state.history[state.history_index].clone();
        }
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn title(&self) -> ProbeResult<String> {
        Ok(self.lock().title.clone())
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> ProbeResult<()> {
        let stalled = {
            let mut s = self.lock();
            s.record(format!("wait_for_load_state:{state}"));
            s.stalled_load
        };
        if stalled {
            tokio::time::sleep(timeout).await;
            return Err(ProbeError::Timeout {
                ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> ProbeResult<serde_json::Value> {
        let mut state = self.lock();
        state.record(format!("evaluate:{script}"));
        Ok(state
            .scripts
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map_or(serde_json::Value::Null, |(_, v)| v.clone()))
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> ProbeResult<()> {
        {
            let mut state = self.lock();
            state.record(format!("screenshot:{}:{full_page}", path.display()));
            if state.fail_screenshots {
                return Err(ProbeError::screenshot("capture disabled"));
            }
            state.screenshots.push(path.to_path_buf());
        }
        Self::write_png(path)
    }

    async fn wait_for(
        &self,
        query: &ElementQuery,
        state: ElementState,
        timeout: Duration,
    ) -> ProbeResult<()> {
        let (satisfied, stall) = {
            let mut s = self.lock();
            s.record(format!("wait_for:{query}:{state}:{}", timeout.as_millis()));
            s.check_failure(query)?;
            let satisfied = match s.lookup(query) {
                Some(element) => element.satisfies(state),
                None => matches!(state, ElementState::Hidden | ElementState::Detached),
            };
            (satisfied, s.stalled_waits)
        };
        if let Some(stall) = stall {
            tokio::time::sleep(stall).await;
        }
        if satisfied {
            return Ok(());
        }
        if stall.is_some() {
            return Err(ProbeError::Timeout {
                ms: timeout.as_millis() as u64,
            });
        }
        tokio::time::sleep(timeout).await;
        Err(ProbeError::Timeout {
            ms: timeout.as_millis() as u64,
        })
    }

    async fn count(&self, query: &ElementQuery) -> ProbeResult<usize> {
        let mut state = self.lock();
        state.record(format!("count:{query}"));
        state.check_failure(query)?;
        Ok(state.lookup(query).map_or(0, |e| e.count))
    }

    async fn is_visible(&self, query: &ElementQuery) -> ProbeResult<bool> {
        let mut state = self.lock();
        state.record(format!("is_visible:{query}"));
        state.check_failure(query)?;
        Ok(state.lookup(query).is_some_and(|e| e.satisfies(ElementState::Visible)))
    }

    async fn is_enabled(&self, query: &ElementQuery) -> ProbeResult<bool> {
        let mut state = self.lock();
        state.record(format!("is_enabled:{query}"));
        Ok(state.require(query)?.enabled)
    }

    async fn is_editable(&self, query: &ElementQuery) -> ProbeResult<bool> {
        let mut state = self.lock();
        state.record(format!("is_editable:{query}"));
        let element = state.require(query)?;
        Ok(element.enabled && element.editable)
    }

    async fn click(&self, query: &ElementQuery, options: ClickOptions) -> ProbeResult<()> {
        let mut state = self.lock();
        state.record(format!("click:{query}:{:?}:{}", options.button, options.click_count));
        let element = state.require(query)?;
        if !element.enabled {
            return Err(ProbeError::driver(format!("{query} is disabled")));
        }
        for (key, revealed) in element.reveals {
            state.elements.insert(key, revealed);
        }
        if let Some(url) = element.navigates_to {
            state.navigate(&url)?;
        }
        Ok(())
    }

    async fn fill(&self, query: &ElementQuery, text: &str) -> ProbeResult<()> {
        let mut state = self.lock();
        state.record(format!("fill:{query}:{text}"));
        let element = state.require(query)?;
        if !(element.enabled && element.editable) {
            return Err(ProbeError::driver(format!("{query} is not editable")));
        }
        if let Some(e) = state.lookup_mut(query) {
            e.value = text.to_string();
        }
        Ok(())
    }

    async fn type_text(
        &self,
        query: &ElementQuery,
        text: &str,
        delay: Duration,
    ) -> ProbeResult<()> {
        let mut state = self.lock();
        state.record(format!("type_text:{query}:{text}:{}", delay.as_millis()));
        state.require(query)?;
        if let Some(e) = state.lookup_mut(query) {
            e.value.push_str(text);
        }
        Ok(())
    }

    async fn clear(&self, query: &ElementQuery) -> ProbeResult<()> {
        let mut state = self.lock();
        state.record(format!("clear:{query}"));
        state.require(query)?;
        if let Some(e) = state.lookup_mut(query) {
            e.value.clear();
        }
        Ok(())
    }

    async fn select_option(&self, query: &ElementQuery, option: &SelectBy) -> ProbeResult<String> {
        let mut state = self.lock();
        state.record(format!("select_option:{query}:{option:?}"));
        let element = state.require(query)?;
        let chosen = match option {
            SelectBy::Value(v) => element.options.iter().find(|(value, _)| value == v),
            SelectBy::Label(l) => element.options.iter().find(|(_, label)| label == l),
            SelectBy::Index(i) => element.options.get(*i),
        }
        .map(|(value, _)| value.clone())
        .ok_or_else(|| ProbeError::driver(format!("no option {option:?} in {query}")))?;
        if let Some(e) = state.lookup_mut(query) {
            e.value.clone_from(&chosen);
        }
        Ok(chosen)
    }

    async fn set_checked(&self, query: &ElementQuery, checked: bool) -> ProbeResult<()> {
        let mut state = self.lock();
        state.record(format!("set_checked:{query}:{checked}"));
        state.require(query)?;
        if let Some(e) = state.lookup_mut(query) {
            e.checked = checked;
        }
        Ok(())
    }

    async fn hover(&self, query: &ElementQuery) -> ProbeResult<()> {
        let mut state = self.lock();
        state.record(format!("hover:{query}"));
        state.require(query).map(|_| ())
    }

    async fn text_content(&self, query: &ElementQuery) -> ProbeResult<Option<String>> {
        let mut state = self.lock();
        state.record(format!("text_content:{query}"));
        Ok(state.require(query)?.text)
    }

    async fn inner_text(&self, query: &ElementQuery) -> ProbeResult<String> {
        let mut state = self.lock();
        state.record(format!("inner_text:{query}"));
        let element = state.require(query)?;
        Ok(if element.visible {
            element.text.unwrap_or_default()
        } else {
            String::new()
        })
    }

    async fn attribute(&self, query: &ElementQuery, name: &str) -> ProbeResult<Option<String>> {
        let mut state = self.lock();
        state.record(format!("attribute:{query}:{name}"));
        Ok(state.require(query)?.attributes.get(name).cloned())
    }

    async fn input_value(&self, query: &ElementQuery) -> ProbeResult<String> {
        let mut state = self.lock();
        state.record(format!("input_value:{query}"));
        Ok(state.require(query)?.value)
    }

    async fn scroll_into_view(&self, query: &ElementQuery) -> ProbeResult<()> {
        let mut state = self.lock();
        state.record(format!("scroll_into_view:{query}"));
        state.require(query).map(|_| ())
    }

    async fn element_screenshot(&self, query: &ElementQuery, path: &Path) -> ProbeResult<()> {
        {
            let mut state = self.lock();
            state.record(format!("element_screenshot:{query}:{}", path.display()));
            state.require(query)?;
            if state.fail_screenshots {
                return Err(ProbeError::screenshot("capture disabled"));
            }
            state.screenshots.push(path.to_path_buf());
        }
        Self::write_png(path)
    }

    async fn close(&self) -> ProbeResult<()> {
        let mut state = self.lock();
        state.record("close".to_string());
        state.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn css(s: &str) -> ElementQuery {
        ElementQuery::css(s)
    }

    mod element_state_tests {
        use super::*;

        #[tokio::test]
        async fn test_visible_element_satisfies_visible_and_attached() {
            let mock = MockDriver::new();
            mock.add_element("css=button", MockElement::visible());
            let t = Duration::from_millis(10);
            mock.wait_for(&css("button"), ElementState::Visible, t).await.unwrap();
            mock.wait_for(&css("button"), ElementState::Attached, t).await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_missing_element_times_out_after_timeout() {
            let mock = MockDriver::new();
            let start = tokio::time::Instant::now();
            let err = mock
                .wait_for(&css("missing"), ElementState::Visible, Duration::from_millis(700))
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { ms: 700 }));
            assert!(start.elapsed() >= Duration::from_millis(700));
        }

        #[tokio::test]
        async fn test_missing_element_is_hidden_and_detached() {
            let mock = MockDriver::new();
            let t = Duration::from_millis(10);
            mock.wait_for(&css("gone"), ElementState::Hidden, t).await.unwrap();
            mock.wait_for(&css("gone"), ElementState::Detached, t).await.unwrap();
        }

        #[tokio::test]
        async fn test_stale_element_is_attached_with_zero_count() {
            let mock = MockDriver::new();
            mock.add_element("css=li", MockElement::stale());
            mock.wait_for(&css("li"), ElementState::Attached, Duration::from_millis(10))
                .await
                .unwrap();
            assert_eq!(mock.count(&css("li")).await.unwrap(), 0);
        }

        #[tokio::test]
        async fn test_nth_falls_back_to_base_entry() {
            let mock = MockDriver::new();
            mock.add_element("css=li", MockElement::visible().with_count(2).with_text("row"));
            assert_eq!(mock.count(&css("li").nth(1)).await.unwrap(), 1);
            assert_eq!(mock.count(&css("li").nth(2)).await.unwrap(), 0);
            assert_eq!(
                mock.text_content(&css("li").nth(0)).await.unwrap().as_deref(),
                Some("row")
            );
        }

        #[tokio::test]
        async fn test_injected_failure() {
            let mock = MockDriver::new();
            mock.fail_query("css=bad[", "SyntaxError: not a valid selector");
            let err = mock
                .wait_for(&css("bad["), ElementState::Visible, Duration::from_millis(10))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("SyntaxError"));
        }
    }

    mod interaction_tests {
        use super::*;

        #[tokio::test]
        async fn test_fill_and_read_back() {
            let mock = MockDriver::new();
            mock.add_element("css=input", MockElement::visible().with_value("old"));
            mock.fill(&css("input"), "shoes").await.unwrap();
            assert_eq!(mock.input_value(&css("input")).await.unwrap(), "shoes");
            mock.clear(&css("input")).await.unwrap();
            assert_eq!(mock.element("css=input").unwrap().value, "");
        }

        #[tokio::test]
        async fn test_fill_disabled_fails() {
            let mock = MockDriver::new();
            mock.add_element("css=input", MockElement::visible().disabled());
            assert!(mock.fill(&css("input"), "x").await.is_err());
        }

        #[tokio::test]
        async fn test_select_option() {
            let mock = MockDriver::new();
            mock.add_element(
                "css=select",
                MockElement::visible()
                    .with_option("", "Select")
                    .with_option("9", "US 9")
                    .with_option("10", "US 10"),
            );
            let q = css("select");
            let picked = mock.select_option(&q, &SelectBy::Label("US 10".into())).await;
            assert_eq!(picked.unwrap(), "10");
            assert_eq!(mock.select_option(&q, &SelectBy::Index(1)).await.unwrap(), "9");
            assert!(mock.select_option(&q, &SelectBy::Value("11".into())).await.is_err());
        }

        #[tokio::test]
        async fn test_click_navigates_and_reveals() {
            let mock = MockDriver::new();
            mock.register_page(
                MockPage::new("https://shop.test/cart")
                    .with_title("Cart")
                    .with_element("css=.cart", MockElement::visible()),
            );
            mock.add_element(
                "css=a.cart",
                MockElement::visible().navigates_to("https://shop.test/cart"),
            );
            mock.add_element(
                "css=button.add",
                MockElement::visible().reveals("text=Added to cart", MockElement::visible()),
            );
            mock.click(&css("button.add"), ClickOptions::default()).await.unwrap();
            assert!(mock.element("text=Added to cart").is_some());

            mock.click(&css("a.cart"), ClickOptions::default()).await.unwrap();
            assert_eq!(mock.current_url().await.unwrap(), "https://shop.test/cart");
            assert_eq!(mock.title().await.unwrap(), "Cart");
            assert!(mock.element("css=.cart").is_some());
            assert!(mock.element("css=a.cart").is_none());
        }

        #[tokio::test]
        async fn test_history() {
            let mock = MockDriver::new();
            mock.goto("https://a.test").await.unwrap();
            mock.goto("https://b.test").await.unwrap();
            mock.go_back().await.unwrap();
            assert_eq!(mock.current_url().await.unwrap(), "https://a.test");
            mock.go_forward().await.unwrap();
            assert_eq!(mock.current_url().await.unwrap(), "https://b.test");
        }

        #[tokio::test]
        async fn test_unreachable_navigation() {
            let mock = MockDriver::new();
            mock.set_unreachable("https://cart.shop.test");
            let err = mock.goto("https://cart.shop.test/").await.unwrap_err();
            assert!(matches!(err, ProbeError::Navigation { .. }));
        }

        #[tokio::test]
        async fn test_screenshot_writes_png() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("shots/page.png");
            let mock = MockDriver::new();
            mock.screenshot(&path, true).await.unwrap();
            assert_eq!(std::fs::read(&path).unwrap(), MOCK_PNG);
            assert_eq!(mock.screenshots(), vec![path]);
        }

        #[tokio::test]
        async fn test_script_results() {
            let mock = MockDriver::new();
            mock.set_script_result("document.readyState", serde_json::json!("complete"));
            assert_eq!(
                mock.evaluate("document.readyState").await.unwrap(),
                serde_json::json!("complete")
            );
            assert!(mock.evaluate("1 + 1").await.unwrap().is_null());
            assert_eq!(mock.call_count("evaluate:"), 2);
        }
    }
}
