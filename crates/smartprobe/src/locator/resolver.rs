//! Resolution engine.
//!
//! Tries a [`NamedLocator`]'s strategies in list order, at most
//! `max_locator_retries` of them, and stops at the first one whose query
//! reaches the target state within the locator timeout and has at least one
//! live match. Per-attempt failures are recorded, never raised.

use super::outcome::{AttemptOutcome, ResolutionResult};
use super::query::{to_query, to_scoped_query, ElementQuery};
use super::strategy::{LocatorStrategy, NamedLocator};
use crate::config::LocatorSettings;
use crate::driver::{Element, ElementState, PageDriver};
use crate::result::{ProbeError, ProbeResult};
use crate::screenshot::ScreenshotManager;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Message recorded when a wait succeeds but nothing matches
pub const NO_ELEMENTS_FOUND: &str = "No elements found";

/// Resolves named locators against one page
#[derive(Clone)]
pub struct LocatorResolver {
    driver: Arc<dyn PageDriver>,
    settings: LocatorSettings,
    screenshots: Option<Arc<ScreenshotManager>>,
}

impl fmt::Debug for LocatorResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocatorResolver")
            .field("settings", &self.settings)
            .field("screenshots", &self.screenshots)
            .finish_non_exhaustive()
    }
}

impl LocatorResolver {
    /// Resolver without a screenshot manager: failures never produce artifacts
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>, settings: LocatorSettings) -> Self {
        Self {
            driver,
            settings,
            screenshots: None,
        }
    }

    /// Capture failure artifacts through `manager` when enabled in settings
    #[must_use]
    pub fn with_screenshots(mut self, manager: Arc<ScreenshotManager>) -> Self {
        self.screenshots = Some(manager);
        self
    }

    /// Settings in effect
    #[must_use]
    pub const fn settings(&self) -> &LocatorSettings {
        &self.settings
    }

    /// Driver this resolver queries
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn PageDriver> {
        &self.driver
    }

    /// Empty locator carrying the configured default timeout
    #[must_use]
    pub fn locator(&self, name: impl Into<String>) -> NamedLocator {
        NamedLocator::new(name).with_timeout(self.settings.locator_timeout_ms)
    }

    /// Resolve with the locator's own timeout
    pub async fn resolve(
        &self,
        locator: &NamedLocator,
        wait_for_visible: bool,
    ) -> ResolutionResult {
        self.run(locator, None, wait_for_visible, locator.timeout_ms()).await
    }

    /// Resolve with a per-call timeout; the locator is left untouched
    pub async fn resolve_with_timeout(
        &self,
        locator: &NamedLocator,
        wait_for_visible: bool,
        timeout_ms: u64,
    ) -> ResolutionResult {
        self.run(locator, None, wait_for_visible, timeout_ms).await
    }

    /// Resolve with every query rooted at `scope`'s first match
    pub async fn resolve_within(
        &self,
        scope: &Element,
        locator: &NamedLocator,
        wait_for_visible: bool,
    ) -> ResolutionResult {
        self.run(locator, Some(scope.query()), wait_for_visible, locator.timeout_ms())
            .await
    }

    /// Resolve or fail with [`ProbeError::ElementNotFound`]
    pub async fn find_or_raise(
        &self,
        locator: &NamedLocator,
        wait_for_visible: bool,
    ) -> ProbeResult<Element> {
        Self::unwrap_handle(self.resolve(locator, wait_for_visible).await)
    }

    /// Scoped [`LocatorResolver::find_or_raise`]
    pub async fn find_within_or_raise(
        &self,
        scope: &Element,
        locator: &NamedLocator,
        wait_for_visible: bool,
    ) -> ProbeResult<Element> {
        Self::unwrap_handle(self.resolve_within(scope, locator, wait_for_visible).await)
    }

    /// Whether the locator resolves to an attached element within `timeout_ms`
    pub async fn is_present(&self, locator: &NamedLocator, timeout_ms: u64) -> bool {
        self.resolve_with_timeout(locator, false, timeout_ms).await.succeeded
    }

    /// Whether the locator resolves to a visible element within `timeout_ms`
    pub async fn is_visible(&self, locator: &NamedLocator, timeout_ms: u64) -> bool {
        self.resolve_with_timeout(locator, true, timeout_ms).await.succeeded
    }

    fn unwrap_handle(result: ResolutionResult) -> ProbeResult<Element> {
        let not_found = |result: ResolutionResult| ProbeError::ElementNotFound {
            name: result.locator_name,
            attempts: result.attempt_count,
            artifact: result.failure_artifact_path,
        };
        if !result.succeeded {
            return Err(not_found(result));
        }
        match result.handle {
            Some(handle) => Ok(handle),
            None => Err(not_found(result)),
        }
    }

    async fn run(
        &self,
        locator: &NamedLocator,
        scope: Option<&ElementQuery>,
        wait_for_visible: bool,
        timeout_ms: u64,
    ) -> ResolutionResult {
        let mut result = ResolutionResult::empty(locator.name());
        let strategies = locator.strategies();
        if strategies.is_empty() {
            error!("No strategies defined for locator '{}'", locator.name());
            return result;
        }

        let max_attempts = strategies.len().min(self.settings.max_locator_retries);
        let state = if wait_for_visible {
            ElementState::Visible
        } else {
            ElementState::Attached
        };
        let timeout = Duration::from_millis(timeout_ms);
        info!(
            "Resolving locator '{}' - {} strategies available, max {} attempts",
            locator.name(),
            strategies.len(),
            max_attempts
        );

        for (index, strategy) in strategies.iter().take(max_attempts).enumerate() {
            let attempt = index + 1;
            debug!(
                "Attempt {attempt}/{max_attempts}: trying {}='{}'",
                strategy.kind(),
                strategy.value()
            );
            let started = Instant::now();
            let outcome = self.attempt(strategy, scope, state, timeout).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            result.attempt_count = attempt;

            match outcome {
                Ok(query) => {
                    info!(
                        "Resolved '{}' on attempt {attempt} using {}",
                        locator.name(),
                        strategy.kind()
                    );
                    result
                        .attempts
                        .push(AttemptOutcome::success(strategy.clone(), attempt, elapsed_ms));
                    result.succeeded = true;
                    result.handle = Some(Element::new(self.driver.clone(), query));
                    result.winning_strategy = Some(strategy.clone());
                    return result;
                }
                Err(message) => {
                    warn!(
                        elapsed_ms,
                        "Attempt {attempt} FAILED for '{}': {strategy} - {message}",
                        locator.name()
                    );
                    result.attempts.push(AttemptOutcome::failure(
                        strategy.clone(),
                        attempt,
                        message,
                        elapsed_ms,
                    ));
                }
            }
        }

        warn!(
            "Locator '{}' could not be resolved after {max_attempts} attempts",
            locator.name()
        );
        result.failure_artifact_path = self.capture_artifact(locator.name()).await;
        result
    }

    /// One strategy: build the query, wait for `state`, require a live match
    async fn attempt(
        &self,
        strategy: &LocatorStrategy,
        scope: Option<&ElementQuery>,
        state: ElementState,
        timeout: Duration,
    ) -> Result<ElementQuery, String> {
        let query = match scope {
            Some(scope) => to_scoped_query(strategy, scope),
            None => to_query(strategy),
        }
        .map_err(|e| e.to_string())?;

        // The driver's own wait may overrun; the locator timeout is the hard cap.
        tokio::time::timeout(timeout, self.driver.wait_for(&query, state, timeout))
            .await
            .map_err(|_| {
                ProbeError::Timeout {
                    ms: timeout.as_millis() as u64,
                }
                .to_string()
            })?
            .map_err(|e| e.to_string())?;

        match self.driver.count(&query).await {
            Ok(0) => Err(NO_ELEMENTS_FOUND.to_string()),
            Ok(_) => Ok(query),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn capture_artifact(&self, locator_name: &str) -> Option<PathBuf> {
        if !self.settings.screenshot_on_failure {
            return None;
        }
        let manager = self.screenshots.as_ref()?;
        let path = manager.failure_path(locator_name);
        match manager.write_page(self.driver.as_ref(), &path, true).await {
            Ok(()) => {
                info!(path = %path.display(), "Failure screenshot saved for '{locator_name}'");
                Some(path)
            }
            Err(e) => {
                warn!("Could not capture failure screenshot for '{locator_name}': {e}");
                None
            }
        }
    }
}
