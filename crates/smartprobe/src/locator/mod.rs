//! Smart locators: named, ordered fallback strategies and the engine that
//! resolves them against a live page.
//!
//! ```text
//! NamedLocator ──► to_query (adapter) ──► PageDriver::wait_for / count
//!      │                                          │
//!      └──────────── LocatorResolver ◄────────────┘
//!                          │
//!                          ▼
//!                  ResolutionResult { handle, attempts, artifact }
//! ```

mod outcome;
mod query;
mod resolver;
mod strategy;

pub use outcome::{AttemptOutcome, ResolutionResult};
pub use query::{to_query, to_scoped_query, ElementQuery, QueryTarget};
pub use resolver::{LocatorResolver, NO_ELEMENTS_FOUND};
pub use strategy::{LocatorStrategy, NamedLocator, StrategyKind, DEFAULT_LOCATOR_TIMEOUT_MS};
