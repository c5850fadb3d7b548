//! Resolution result and per-attempt trace.

use super::strategy::LocatorStrategy;
use crate::driver::Element;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// The outcome of trying one strategy
#[derive(Debug, Clone, Serialize)]
pub struct AttemptOutcome {
    /// Strategy that was tried
    pub strategy: LocatorStrategy,
    /// 1-indexed position within the truncated strategy list
    pub attempt_number: usize,
    /// Whether this attempt produced a usable element
    pub succeeded: bool,
    /// Failure reason
    pub error_message: Option<String>,
    /// Time elapsed during this attempt
    pub elapsed_ms: u64,
    /// When the attempt finished
    pub timestamp: DateTime<Utc>,
}

impl AttemptOutcome {
    pub(crate) fn success(
        strategy: LocatorStrategy,
        attempt_number: usize,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            strategy,
            attempt_number,
            succeeded: true,
            error_message: None,
            elapsed_ms,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn failure(
        strategy: LocatorStrategy,
        attempt_number: usize,
        error_message: impl Into<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            strategy,
            attempt_number,
            succeeded: false,
            error_message: Some(error_message.into()),
            elapsed_ms,
            timestamp: Utc::now(),
        }
    }
}

/// Structured outcome of one resolution call.
///
/// `handle` and `winning_strategy` are present exactly when `succeeded`.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionResult {
    /// Name of the resolved locator
    pub locator_name: String,
    /// Whether any strategy succeeded
    pub succeeded: bool,
    /// Live element handle
    #[serde(skip)]
    pub handle: Option<Element>,
    /// Strategy that produced the handle
    pub winning_strategy: Option<LocatorStrategy>,
    /// Every attempt, in order
    pub attempts: Vec<AttemptOutcome>,
    /// Number of strategies tried
    pub attempt_count: usize,
    /// Screenshot captured when every attempt failed
    pub failure_artifact_path: Option<PathBuf>,
}

impl ResolutionResult {
    pub(crate) fn empty(locator_name: impl Into<String>) -> Self {
        Self {
            locator_name: locator_name.into(),
            succeeded: false,
            handle: None,
            winning_strategy: None,
            attempts: Vec::new(),
            attempt_count: 0,
            failure_artifact_path: None,
        }
    }

    /// Error messages of the failed attempts, in order
    #[must_use]
    pub fn failure_messages(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter_map(|a| a.error_message.as_deref())
            .collect()
    }

    /// Take the handle, leaving the trace behind
    #[must_use]
    pub fn into_handle(self) -> Option<Element> {
        self.handle
    }
}
