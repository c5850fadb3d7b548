//! PageDriver - Abstract Browser Automation Trait
//!
//! Everything Smartprobe does to a page goes through [`PageDriver`]. The
//! resolver only needs `wait_for` and `count`; page objects use the rest
//! through [`Element`] handles.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PageDriver (async trait)                                    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐     ┌───────────────────────────┐  │
//! │  │  ChromiumDriver      │     │  MockDriver               │  │
//! │  │  (feature `browser`) │     │  (scripted in-memory page)│  │
//! │  │  CDP via             │     │  call history, injected   │  │
//! │  │  chromiumoxide       │     │  failures, page routing   │  │
//! │  └──────────────────────┘     └───────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod element;
mod mock;

#[cfg(feature = "browser")]
mod cdp;

pub use element::Element;
pub use mock::{MockDriver, MockElement, MockPage};

#[cfg(feature = "browser")]
pub use cdp::{ChromiumDriver, ChromiumLauncher, CHROMIUM_FAMILY};

use crate::locator::ElementQuery;
use crate::result::ProbeResult;
use crate::wait::LoadState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Target state for [`PageDriver::wait_for`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    /// At least one match is rendered and visible
    Visible,
    /// At least one match is present in the DOM
    Attached,
    /// No match is visible (including no match at all)
    Hidden,
    /// No match is present in the DOM
    Detached,
}

impl ElementState {
    /// Lower-case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Attached => "attached",
            Self::Hidden => "hidden",
            Self::Detached => "detached",
        }
    }
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mouse button for clicks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    /// Primary button
    #[default]
    Left,
    /// Secondary button (context menu)
    Right,
    /// Wheel button
    Middle,
}

/// Click options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOptions {
    /// Button to press
    pub button: MouseButton,
    /// 1 for a click, 2 for a double click
    pub click_count: u32,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            button: MouseButton::Left,
            click_count: 1,
        }
    }
}

impl ClickOptions {
    /// Double click with the primary button
    #[must_use]
    pub const fn double() -> Self {
        Self {
            button: MouseButton::Left,
            click_count: 2,
        }
    }

    /// Single click with the secondary button
    #[must_use]
    pub const fn right() -> Self {
        Self {
            button: MouseButton::Right,
            click_count: 1,
        }
    }
}

/// How to pick an `<option>` in a `<select>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectBy {
    /// Match the option's `value`
    Value(String),
    /// Match the option's visible label
    Label(String),
    /// Pick by position
    Index(usize),
}

/// Abstract browser page.
///
/// Element operations act on the first match of the query unless noted.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to URL
    async fn goto(&self, url: &str) -> ProbeResult<()>;

    /// Reload the page
    async fn reload(&self) -> ProbeResult<()>;

    /// Go back in history
    async fn go_back(&self) -> ProbeResult<()>;

    /// Go forward in history
    async fn go_forward(&self) -> ProbeResult<()>;

    /// Get current URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Get document title
    async fn title(&self) -> ProbeResult<String>;

    /// Wait until the page reaches a load state
    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> ProbeResult<()>;

    /// Execute JavaScript in page context
    async fn evaluate(&self, script: &str) -> ProbeResult<serde_json::Value>;

    /// Write a PNG screenshot of the page
    async fn screenshot(&self, path: &Path, full_page: bool) -> ProbeResult<()>;

    /// Wait for the query to reach `state`, failing with
    /// [`ProbeError::Timeout`](crate::ProbeError::Timeout) on expiry
    async fn wait_for(
        &self,
        query: &ElementQuery,
        state: ElementState,
        timeout: Duration,
    ) -> ProbeResult<()>;

    /// Number of live matches
    async fn count(&self, query: &ElementQuery) -> ProbeResult<usize>;

    /// Whether the first match is visible
    async fn is_visible(&self, query: &ElementQuery) -> ProbeResult<bool>;

    /// Whether the first match is enabled
    async fn is_enabled(&self, query: &ElementQuery) -> ProbeResult<bool>;

    /// Whether the first match accepts input
    async fn is_editable(&self, query: &ElementQuery) -> ProbeResult<bool>;

    /// Click the first match
    async fn click(&self, query: &ElementQuery, options: ClickOptions) -> ProbeResult<()>;

    /// Replace the value of an input
    async fn fill(&self, query: &ElementQuery, text: &str) -> ProbeResult<()>;

    /// Type text key by key
    async fn type_text(&self, query: &ElementQuery, text: &str, delay: Duration) -> ProbeResult<()>;

    /// Clear an input
    async fn clear(&self, query: &ElementQuery) -> ProbeResult<()>;

    /// Select an option, returning the selected value
    async fn select_option(&self, query: &ElementQuery, option: &SelectBy) -> ProbeResult<String>;

    /// Check or uncheck a checkbox/radio
    async fn set_checked(&self, query: &ElementQuery, checked: bool) -> ProbeResult<()>;

    /// Hover over the first match
    async fn hover(&self, query: &ElementQuery) -> ProbeResult<()>;

    /// `textContent` of the first match
    async fn text_content(&self, query: &ElementQuery) -> ProbeResult<Option<String>>;

    /// Rendered `innerText` of the first match
    async fn inner_text(&self, query: &ElementQuery) -> ProbeResult<String>;

    /// Attribute value of the first match
    async fn attribute(&self, query: &ElementQuery, name: &str) -> ProbeResult<Option<String>>;

    /// Current value of an input
    async fn input_value(&self, query: &ElementQuery) -> ProbeResult<String>;

    /// Scroll the first match into view
    async fn scroll_into_view(&self, query: &ElementQuery) -> ProbeResult<()>;

    /// Write a PNG screenshot of the first match
    async fn element_screenshot(&self, query: &ElementQuery, path: &Path) -> ProbeResult<()>;

    /// Release the page and its browser
    async fn close(&self) -> ProbeResult<()> {
        Ok(())
    }
}
