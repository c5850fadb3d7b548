//! Framework settings.
//!
//! [`Settings`] is a plain value: load it once (YAML file, environment, or
//! defaults) and hand it to the session factory, resolvers and pages.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Browser names accepted in configuration
pub const SUPPORTED_BROWSERS: [&str; 7] = [
    "chromium",
    "chrome",
    "chrome-beta",
    "chrome-dev",
    "msedge",
    "firefox",
    "webkit",
];

// =============================================================================
// SECTIONS
// =============================================================================

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Browser name, see [`SUPPORTED_BROWSERS`]
    pub name: String,
    /// Run without a window
    pub headless: bool,
    /// Delay inserted after each driver operation
    pub slow_mo_ms: u64,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Default navigation/operation timeout
    pub timeout_ms: u64,
    /// Extra command-line arguments
    pub args: Vec<String>,
    /// Release channel, if any
    pub channel: Option<String>,
    /// Explicit browser binary
    pub executable_path: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            name: "chromium".to_string(),
            headless: true,
            slow_mo_ms: 0,
            viewport_width: 1920,
            viewport_height: 1080,
            timeout_ms: 30_000,
            args: Vec::new(),
            channel: None,
            executable_path: None,
        }
    }
}

/// Locator resolution settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorSettings {
    /// Cap on strategies tried per resolution
    pub max_locator_retries: usize,
    /// Timeout given to new locators
    pub locator_timeout_ms: u64,
    /// Capture a page screenshot when every strategy fails
    pub screenshot_on_failure: bool,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            max_locator_retries: 3,
            locator_timeout_ms: crate::locator::DEFAULT_LOCATOR_TIMEOUT_MS,
            screenshot_on_failure: true,
        }
    }
}

/// Wait settings, all in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    pub default_timeout_ms: u64,
    pub element_load_timeout_ms: u64,
    pub page_load_timeout_ms: u64,
    pub polling_interval_ms: u64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            default_timeout_ms: crate::wait::DEFAULT_WAIT_TIMEOUT_MS,
            element_load_timeout_ms: crate::wait::DEFAULT_ELEMENT_LOAD_TIMEOUT_MS,
            page_load_timeout_ms: crate::wait::DEFAULT_PAGE_LOAD_TIMEOUT_MS,
            polling_interval_ms: crate::wait::DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Retry/backoff settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    /// Seconds
    pub initial_delay: f64,
    /// Seconds
    pub max_delay: f64,
    pub backoff_multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: 1.0,
            max_delay: 10.0,
            backoff_multiplier: 2.0,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub data_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub screenshots_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub log_file: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            reports_dir: PathBuf::from("reports"),
            screenshots_dir: PathBuf::from("reports/screenshots"),
            logs_dir: PathBuf::from("logs"),
            log_file: "framework.log".to_string(),
        }
    }
}

/// Logging output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
    /// Also write to `logs_dir/log_file`
    pub file_output: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_output: true,
        }
    }
}

/// What an add-to-cart click means when the page shows neither a
/// confirmation nor an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CartVerificationPolicy {
    /// Count it as added and log a warning
    #[default]
    AssumeSuccess,
    /// Count it as failed
    RequireConfirmation,
}

impl FromStr for CartVerificationPolicy {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "assume-success" => Ok(Self::AssumeSuccess),
            "require-confirmation" => Ok(Self::RequireConfirmation),
            other => Err(ProbeError::config(format!("unknown cart verification policy '{other}'"))),
        }
    }
}

/// Cart behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CartSettings {
    pub verification: CartVerificationPolicy,
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Complete framework settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Site under test
    pub base_url: String,
    pub browser: BrowserSettings,
    pub locator: LocatorSettings,
    pub wait: WaitSettings,
    pub retry: RetrySettings,
    pub paths: PathSettings,
    pub logging: LogSettings,
    pub cart: CartSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "https://www.ebay.com".to_string(),
            browser: BrowserSettings::default(),
            locator: LocatorSettings::default(),
            wait: WaitSettings::default(),
            retry: RetrySettings::default(),
            paths: PathSettings::default(),
            logging: LogSettings::default(),
            cart: CartSettings::default(),
        }
    }
}

impl Settings {
    /// Defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a YAML file; missing keys take their defaults
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ProbeError::config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml(&text)
    }

    /// Parse YAML text
    pub fn from_yaml(text: &str) -> ProbeResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Defaults with `SMARTPROBE_*` environment overrides
    pub fn from_env() -> ProbeResult<Self> {
        let mut settings = Self::default();
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Apply overrides from a key lookup (the process environment in
    /// [`Settings::from_env`])
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ProbeResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SMARTPROBE_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("SMARTPROBE_BROWSER") {
            self.browser.name = v.trim().to_ascii_lowercase();
        }
        if let Some(v) = lookup("SMARTPROBE_HEADLESS") {
            self.browser.headless = parse_bool("SMARTPROBE_HEADLESS", &v)?;
        }
        if let Some(v) = lookup("SMARTPROBE_LOG_LEVEL") {
            self.logging.level = v.trim().to_ascii_lowercase();
        }
        if let Some(v) = lookup("SMARTPROBE_MAX_LOCATOR_RETRIES") {
            self.locator.max_locator_retries = parse_number("SMARTPROBE_MAX_LOCATOR_RETRIES", &v)?;
        }
        if let Some(v) = lookup("SMARTPROBE_LOCATOR_TIMEOUT_MS") {
            self.locator.locator_timeout_ms = parse_number("SMARTPROBE_LOCATOR_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("SMARTPROBE_SCREENSHOT_ON_FAILURE") {
            self.locator.screenshot_on_failure =
                parse_bool("SMARTPROBE_SCREENSHOT_ON_FAILURE", &v)?;
        }
        Ok(())
    }

    /// Reject settings the framework cannot run with
    pub fn validate(&self) -> ProbeResult<()> {
        if self.locator.max_locator_retries == 0 {
            return Err(ProbeError::config("locator.max_locator_retries must be at least 1"));
        }
        if self.locator.locator_timeout_ms == 0 {
            return Err(ProbeError::config("locator.locator_timeout_ms must be positive"));
        }
        if self.wait.default_timeout_ms == 0 || self.wait.page_load_timeout_ms == 0 {
            return Err(ProbeError::config("wait timeouts must be positive"));
        }
        if self.wait.polling_interval_ms == 0 {
            return Err(ProbeError::config("wait.polling_interval_ms must be positive"));
        }
        if self.browser.timeout_ms == 0 {
            return Err(ProbeError::config("browser.timeout_ms must be positive"));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(ProbeError::config("retry.backoff_multiplier must be >= 1.0"));
        }
        if self.retry.initial_delay < 0.0 || self.retry.max_delay < self.retry.initial_delay {
            return Err(ProbeError::config(
                "retry delays must satisfy 0 <= initial_delay <= max_delay",
            ));
        }
        if !SUPPORTED_BROWSERS.contains(&self.browser.name.as_str()) {
            return Err(ProbeError::config(format!(
                "unsupported browser '{}', expected one of: {}",
                self.browser.name,
                SUPPORTED_BROWSERS.join(", ")
            )));
        }
        Ok(())
    }

    /// Full path of the log file
    #[must_use]
    pub fn log_file_path(&self) -> PathBuf {
        self.paths.logs_dir.join(&self.paths.log_file)
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set browser name
    #[must_use]
    pub fn with_browser(mut self, name: impl Into<String>) -> Self {
        self.browser.name = name.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.browser.headless = headless;
        self
    }

    /// Set the per-resolution strategy cap
    #[must_use]
    pub const fn with_max_locator_retries(mut self, retries: usize) -> Self {
        self.locator.max_locator_retries = retries;
        self
    }

    /// Set the default locator timeout
    #[must_use]
    pub const fn with_locator_timeout(mut self, timeout_ms: u64) -> Self {
        self.locator.locator_timeout_ms = timeout_ms;
        self
    }

    /// Enable or disable failure screenshots
    #[must_use]
    pub const fn with_screenshot_on_failure(mut self, enabled: bool) -> Self {
        self.locator.screenshot_on_failure = enabled;
        self
    }

    /// Set the screenshot directory
    #[must_use]
    pub fn with_screenshots_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.screenshots_dir = dir.into();
        self
    }

    /// Set the data directory
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.data_dir = dir.into();
        self
    }

    /// Set the wait polling interval
    #[must_use]
    pub const fn with_polling_interval(mut self, interval_ms: u64) -> Self {
        self.wait.polling_interval_ms = interval_ms;
        self
    }

    /// Set the cart verification policy
    #[must_use]
    pub const fn with_cart_verification(mut self, policy: CartVerificationPolicy) -> Self {
        self.cart.verification = policy;
        self
    }
}

fn parse_bool(key: &str, value: &str) -> ProbeResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ProbeError::config(format!("{key}: expected a boolean, got '{other}'"))),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> ProbeResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ProbeError::config(format!("{key}: expected a number, got '{value}'")))
}
