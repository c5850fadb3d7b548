//! Element handle: a query bound to the driver of one page.

use super::{ClickOptions, ElementState, PageDriver, SelectBy};
use crate::locator::{to_scoped_query, ElementQuery, LocatorStrategy};
use crate::result::ProbeResult;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Opaque reference to located UI element(s).
///
/// Holds the query, not a DOM node: every call re-queries the live page, so
/// a handle stays as valid as the page state it was resolved against.
#[derive(Clone)]
pub struct Element {
    driver: Arc<dyn PageDriver>,
    query: ElementQuery,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element").field("query", &self.query.to_string()).finish()
    }
}

impl Element {
    /// Bind a query to a driver
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, query: ElementQuery) -> Self {
        Self { driver, query }
    }

    /// Underlying query
    #[must_use]
    pub const fn query(&self) -> &ElementQuery {
        &self.query
    }

    /// Driver this handle is bound to
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn PageDriver> {
        &self.driver
    }

    /// The `index`-th match
    #[must_use]
    pub fn nth(&self, index: usize) -> Self {
        Self::new(self.driver.clone(), self.query.nth(index))
    }

    /// The first match
    #[must_use]
    pub fn first(&self) -> Self {
        self.nth(0)
    }

    /// One handle per current match
    pub async fn all(&self) -> ProbeResult<Vec<Self>> {
        let count = self.count().await?;
        Ok((0..count).map(|i| self.nth(i)).collect())
    }

    /// Sub-query rooted at this element's first match
    pub fn locator(&self, strategy: &LocatorStrategy) -> ProbeResult<Self> {
        let query = to_scoped_query(strategy, &self.query)?;
        Ok(Self::new(self.driver.clone(), query))
    }

    /// Number of live matches
    pub async fn count(&self) -> ProbeResult<usize> {
        self.driver.count(&self.query).await
    }

    /// Wait for a state
    pub async fn wait_for(&self, state: ElementState, timeout: Duration) -> ProbeResult<()> {
        self.driver.wait_for(&self.query, state, timeout).await
    }

    /// Whether the first match is visible
    pub async fn is_visible(&self) -> ProbeResult<bool> {
        self.driver.is_visible(&self.query).await
    }

    /// Whether the first match is enabled
    pub async fn is_enabled(&self) -> ProbeResult<bool> {
        self.driver.is_enabled(&self.query).await
    }

    /// Whether the first match is editable
    pub async fn is_editable(&self) -> ProbeResult<bool> {
        self.driver.is_editable(&self.query).await
    }

    /// Click
    pub async fn click(&self) -> ProbeResult<()> {
        self.driver.click(&self.query, ClickOptions::default()).await
    }

    /// Double click
    pub async fn double_click(&self) -> ProbeResult<()> {
        self.driver.click(&self.query, ClickOptions::double()).await
    }

    /// Right click
    pub async fn right_click(&self) -> ProbeResult<()> {
        self.driver.click(&self.query, ClickOptions::right()).await
    }

    /// Replace input value
    pub async fn fill(&self, text: &str) -> ProbeResult<()> {
        self.driver.fill(&self.query, text).await
    }

    /// Type key by key with a delay between keys
    pub async fn type_text(&self, text: &str, delay: Duration) -> ProbeResult<()> {
        self.driver.type_text(&self.query, text, delay).await
    }

    /// Clear input
    pub async fn clear(&self) -> ProbeResult<()> {
        self.driver.clear(&self.query).await
    }

    /// Select an option
    pub async fn select_option(&self, option: &SelectBy) -> ProbeResult<String> {
        self.driver.select_option(&self.query, option).await
    }

    /// Check a checkbox
    pub async fn check(&self) -> ProbeResult<()> {
        self.driver.set_checked(&self.query, true).await
    }

    /// Uncheck a checkbox
    pub async fn uncheck(&self) -> ProbeResult<()> {
        self.driver.set_checked(&self.query, false).await
    }

    /// Hover
    pub async fn hover(&self) -> ProbeResult<()> {
        self.driver.hover(&self.query).await
    }

    /// `textContent`
    pub async fn text_content(&self) -> ProbeResult<Option<String>> {
        self.driver.text_content(&self.query).await
    }

    /// `innerText`
    pub async fn inner_text(&self) -> ProbeResult<String> {
        self.driver.inner_text(&self.query).await
    }

    /// Attribute value
    pub async fn attribute(&self, name: &str) -> ProbeResult<Option<String>> {
        self.driver.attribute(&self.query, name).await
    }

    /// Input value
    pub async fn input_value(&self) -> ProbeResult<String> {
        self.driver.input_value(&self.query).await
    }

    /// Scroll into view
    pub async fn scroll_into_view(&self) -> ProbeResult<()> {
        self.driver.scroll_into_view(&self.query).await
    }

    /// Screenshot of this element
    pub async fn screenshot(&self, path: &Path) -> ProbeResult<()> {
        self.driver.element_screenshot(&self.query, path).await
    }
}
