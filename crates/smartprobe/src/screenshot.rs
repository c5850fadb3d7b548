//! Screenshot capture and file naming.

use crate::driver::{Element, PageDriver};
use crate::result::{ProbeError, ProbeResult};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Prefix for test-failure captures
pub const FAILURE_PREFIX: &str = "FAILURE";

/// Keep ASCII alphanumerics, `_` and `-`; everything else becomes `_`
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Names and writes screenshots under one directory.
///
/// The counter belongs to this instance; two managers never share one.
#[derive(Debug)]
pub struct ScreenshotManager {
    dir: PathBuf,
    counter: AtomicU64,
}

impl ScreenshotManager {
    /// Manager writing into `dir` (created on first capture)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Output directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Captures named so far
    #[must_use]
    pub fn count(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Next file path: `{prefix_}{name}_{timestamp}_{counter}{_suffix}.png`
    pub fn next_path(&self, name: &str, prefix: Option<&str>, suffix: Option<&str>) -> PathBuf {
        let counter = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S_%6f");
        let mut file = String::new();
        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            file.push_str(&sanitize_name(prefix));
            file.push('_');
        }
        file.push_str(&sanitize_name(name));
        file.push_str(&format!("_{timestamp}_{counter}"));
        if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
            file.push('_');
            file.push_str(&sanitize_name(suffix));
        }
        file.push_str(".png");
        self.dir.join(file)
    }

    /// Artifact path for a locator that could not be resolved
    pub fn failure_path(&self, locator_name: &str) -> PathBuf {
        self.next_path(&format!("locator_failure_{locator_name}"), None, None)
    }

    /// Capture the page
    pub async fn capture_page(
        &self,
        driver: &dyn PageDriver,
        name: &str,
        full_page: bool,
    ) -> ProbeResult<PathBuf> {
        let path = self.next_path(name, None, None);
        self.write_page(driver, &path, full_page).await?;
        info!(path = %path.display(), "Screenshot captured");
        Ok(path)
    }

    /// Capture one element
    pub async fn capture_element(&self, element: &Element, name: &str) -> ProbeResult<PathBuf> {
        let path = self.next_path(name, Some("element"), None);
        self.ensure_dir()?;
        element.screenshot(&path).await?;
        info!(path = %path.display(), "Element screenshot captured");
        Ok(path)
    }

    /// Full-page capture for a failed test
    pub async fn capture_on_failure(
        &self,
        driver: &dyn PageDriver,
        test_name: &str,
    ) -> ProbeResult<PathBuf> {
        let path = self.next_path(test_name, Some(FAILURE_PREFIX), None);
        self.write_page(driver, &path, true).await?;
        warn!(test = test_name, path = %path.display(), "Failure screenshot captured");
        Ok(path)
    }

    /// Capture a numbered step of a flow
    pub async fn capture_step(
        &self,
        driver: &dyn PageDriver,
        step_number: u32,
        step_name: &str,
    ) -> ProbeResult<PathBuf> {
        let name = format!("step_{step_number:02}_{step_name}");
        self.capture_page(driver, &name, true).await
    }

    /// Write a full-page capture to an already named path
    pub async fn write_page(
        &self,
        driver: &dyn PageDriver,
        path: &Path,
        full_page: bool,
    ) -> ProbeResult<()> {
        self.ensure_dir()?;
        driver
            .screenshot(path, full_page)
            .await
            .map_err(|e| match e {
                ProbeError::Screenshot { .. } => e,
                other => ProbeError::screenshot(other.to_string()),
            })
    }

    /// Delete PNG files older than `max_age_days`; returns how many went
    pub fn cleanup_older_than(&self, max_age_days: u64) -> ProbeResult<usize> {
        if !self.dir.is_dir() {
            return Ok(0);
        }
        let max_age = Duration::from_secs(max_age_days.saturating_mul(24 * 60 * 60));
        let now = SystemTime::now();
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("png") {
                continue;
            }
            let modified = std::fs::metadata(&path)?.modified()?;
            let age = now.duration_since(modified).unwrap_or_default();
            if age > max_age {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        debug!(removed, dir = %self.dir.display(), "Old screenshots removed");
        Ok(removed)
    }

    fn ensure_dir(&self) -> ProbeResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            ProbeError::screenshot(format!("cannot create {}: {e}", self.dir.display()))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use crate::locator::ElementQuery;
    use std::sync::Arc;

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

    mod naming_tests {
        use super::*;

        #[test]
        fn test_sanitize() {
            assert_eq!(sanitize_name("Add to Cart/Button"), "Add_to_Cart_Button");
            assert_eq!(sanitize_name("search-results_2"), "search-results_2");
        }

        #[test]
        fn test_name_layout() {
            let manager = ScreenshotManager::new("shots");
            let name = file_name(&manager.next_path("cart page", Some("FAILURE"), Some("final")));
            assert!(name.starts_with("FAILURE_cart_page_"));
            assert!(name.ends_with("_1_final.png"));
            let re =
                regex::Regex::new(r"^FAILURE_cart_page_\d{8}_\d{6}_\d{6}_1_final\.png$").unwrap();
            assert!(re.is_match(&name), "{name}");
        }

        #[test]
        fn test_counter_is_per_instance() {
            let a = ScreenshotManager::new("a");
            let b = ScreenshotManager::new("b");
            a.next_path("x", None, None);
            a.next_path("x", None, None);
            assert!(file_name(&b.next_path("x", None, None)).ends_with("_1.png"));
            assert_eq!(a.count(), 2);
        }

        #[test]
        fn test_failure_path() {
            let manager = ScreenshotManager::new("shots");
            let name = file_name(&manager.failure_path("Search Button"));
            assert!(name.starts_with("locator_failure_Search_Button_"));
        }
    }

    mod capture_tests {
        use super::*;

        #[tokio::test]
        async fn test_capture_page_and_failure() {
            let dir = tempfile::tempdir().unwrap();
            let manager = ScreenshotManager::new(dir.path().join("shots"));
            let mock = MockDriver::new();
            let page = manager.capture_page(&mock, "home", false).await.unwrap();
            assert!(page.exists());
            let failure = manager.capture_on_failure(&mock, "checkout").await.unwrap();
            assert!(file_name(&failure).starts_with("FAILURE_checkout_"));
            assert!(mock.was_called(&format!("screenshot:{}:true", failure.display())));
        }

        #[tokio::test]
        async fn test_capture_step_and_element() {
            let dir = tempfile::tempdir().unwrap();
            let manager = ScreenshotManager::new(dir.path());
            let mock = Arc::new(MockDriver::new());
            mock.add_element("css=#logo", MockElement::visible());
            let step = manager.capture_step(mock.as_ref(), 3, "add to cart").await.unwrap();
            assert!(file_name(&step).starts_with("step_03_add_to_cart_"));
            let logo = Element::new(mock.clone(), ElementQuery::css("#logo"));
            let shot = manager.capture_element(&logo, "logo").await.unwrap();
            assert!(file_name(&shot).starts_with("element_logo_"));
        }

        #[tokio::test]
        async fn test_driver_failure_is_screenshot_error() {
            let dir = tempfile::tempdir().unwrap();
            let manager = ScreenshotManager::new(dir.path());
            let mock = MockDriver::new();
            mock.fail_screenshots(true);
            let err = manager.capture_page(&mock, "x", true).await.unwrap_err();
            assert!(matches!(err, ProbeError::Screenshot { .. }));
        }

        #[test]
        fn test_cleanup_keeps_recent_files() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("recent.png"), b"png").unwrap();
            std::fs::write(dir.path().join("notes.txt"), b"txt").unwrap();
            let manager = ScreenshotManager::new(dir.path());
            assert_eq!(manager.cleanup_older_than(7).unwrap(), 0);
            assert!(dir.path().join("recent.png").exists());
            let missing = ScreenshotManager::new(dir.path().join("missing"));
            assert_eq!(missing.cleanup_older_than(0).unwrap(), 0);
        }
    }
}
