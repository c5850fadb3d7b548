//! Smartprobe: browser end-to-end testing with self-healing locators
//!
//! A UI element is described once as a [`NamedLocator`]: a human-readable
//! name plus an ordered list of fallback strategies (structural path, style
//! selector, visible text, semantic role, ...). The [`LocatorResolver`] tries
//! them in order against a live page and returns the first element that shows
//! up, a full audit trail of every attempt, and optionally a failure
//! screenshot.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   SMARTPROBE Architecture                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Page       │    │ Locator    │    │ PageDriver │            │
//! │   │ Objects    │───►│ Resolver   │───►│ (CDP/mock) │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         │                 │                  ▲                  │
//! │         ▼                 ▼                  │                  │
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Waiter /   │    │ Screenshot │    │ Session    │            │
//! │   │ Retry      │    │ Manager    │    │ Factory    │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use smartprobe::NamedLocator;
//!
//! let cart = NamedLocator::new("Cart Icon")
//!     .add_css("a.gh-cart", "header cart link")
//!     .add_role("link[name=Cart]", "cart link by role");
//! assert_eq!(cart.strategies().len(), 2);
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod config;
pub mod data;
pub mod driver;
pub mod locator;
pub mod logging;
pub mod page;
mod result;
pub mod retry;
pub mod screenshot;
pub mod session;
pub mod wait;

pub use config::{CartVerificationPolicy, LocatorSettings, Settings};
pub use data::DataLoader;
pub use driver::{
    ClickOptions, Element, ElementState, MockDriver, MockElement, MockPage, PageDriver, SelectBy,
};
pub use locator::{
    AttemptOutcome, ElementQuery, LocatorResolver, LocatorStrategy, NamedLocator, ResolutionResult,
    StrategyKind,
};
pub use page::{BasePage, PageObject};
pub use result::{ProbeError, ProbeResult};
pub use retry::{RetryOutcome, RetryPolicy};
pub use screenshot::ScreenshotManager;
pub use session::{BrowserSession, Launcher, MockLauncher, SessionFactory};
pub use wait::{LoadState, UrlPattern, WaitCondition, WaitOptions, Waiter};

#[cfg(feature = "browser")]
pub use driver::{ChromiumDriver, ChromiumLauncher};
