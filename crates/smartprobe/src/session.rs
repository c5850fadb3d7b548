//! Browser sessions.
//!
//! A [`SessionFactory`] is an ordinary value owned by the caller. Each
//! [`BrowserSession`] it creates has its own driver and its own screenshot
//! counter; sessions share nothing mutable.

use crate::config::Settings;
use crate::driver::{MockDriver, PageDriver};
use crate::result::{ProbeError, ProbeResult};
use crate::screenshot::ScreenshotManager;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

// =============================================================================
// LAUNCHER
// =============================================================================

/// Produces a fresh page driver for a new session
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Start a browser (or stand-in) according to `settings`
    async fn launch(&self, settings: &Settings) -> ProbeResult<Arc<dyn PageDriver>>;
}

type MockSetup = Arc<dyn Fn(&MockDriver) + Send + Sync>;

/// Launches [`MockDriver`]s, optionally pre-populated
#[derive(Default)]
pub struct MockLauncher {
    setup: Option<MockSetup>,
    failure: Option<String>,
    launched: Mutex<Vec<Arc<MockDriver>>>,
}

impl fmt::Debug for MockLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockLauncher")
            .field("failure", &self.failure)
            .field("launched", &self.launched_count())
            .finish_non_exhaustive()
    }
}

impl MockLauncher {
    /// Launcher of blank mock pages
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `setup` on every new driver
    #[must_use]
    pub fn with_setup(mut self, setup: impl Fn(&MockDriver) + Send + Sync + 'static) -> Self {
        self.setup = Some(Arc::new(setup));
        self
    }

    /// Every launch fails with a session error
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Drivers launched so far
    #[must_use]
    pub fn launched(&self) -> Vec<Arc<MockDriver>> {
        self.launched.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn launched_count(&self) -> usize {
        self.launched.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl Launcher for MockLauncher {
    async fn launch(&self, _settings: &Settings) -> ProbeResult<Arc<dyn PageDriver>> {
        if let Some(message) = &self.failure {
            return Err(ProbeError::session(message.clone()));
        }
        let driver = Arc::new(MockDriver::new());
        if let Some(setup) = &self.setup {
            setup(&driver);
        }
        self.launched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(driver.clone());
        Ok(driver)
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// One browser page with its settings and screenshot manager
pub struct BrowserSession {
    id: String,
    browser: String,
    created_at: DateTime<Local>,
    driver: Arc<dyn PageDriver>,
    settings: Arc<Settings>,
    screenshots: Arc<ScreenshotManager>,
}

impl fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserSession")
            .field("id", &self.id)
            .field("browser", &self.browser)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl BrowserSession {
    /// Wrap an existing driver
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        driver: Arc<dyn PageDriver>,
        settings: Arc<Settings>,
    ) -> Self {
        let screenshots = Arc::new(ScreenshotManager::new(settings.paths.screenshots_dir.clone()));
        Self {
            id: id.into(),
            browser: settings.browser.name.clone(),
            created_at: Local::now(),
            driver,
            settings,
            screenshots,
        }
    }

    /// Session id, `{browser}_{YYYYmmdd_HHMMSS}_{counter}`
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Browser name
    #[must_use]
    pub fn browser(&self) -> &str {
        &self.browser
    }

    /// Creation time
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// Page driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn PageDriver> {
        &self.driver
    }

    /// Settings the session was created with
    #[must_use]
    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    /// Screenshot manager of this session
    #[must_use]
    pub fn screenshots(&self) -> &Arc<ScreenshotManager> {
        &self.screenshots
    }

    /// Close the underlying page/browser
    pub async fn close(&self) -> ProbeResult<()> {
        self.driver.close().await
    }
}

// =============================================================================
// FACTORY
// =============================================================================

/// Creates, tracks and closes sessions
pub struct SessionFactory {
    launcher: Arc<dyn Launcher>,
    settings: Arc<Settings>,
    sessions: Mutex<HashMap<String, Arc<BrowserSession>>>,
    counter: AtomicU64,
}

impl fmt::Debug for SessionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionFactory")
            .field("browser", &self.settings.browser.name)
            .field("active", &self.active_count())
            .finish_non_exhaustive()
    }
}

impl SessionFactory {
    /// Factory launching through `launcher`
    #[must_use]
    pub fn new(launcher: Arc<dyn Launcher>, settings: Settings) -> Self {
        Self {
            launcher,
            settings: Arc::new(settings),
            sessions: Mutex::new(HashMap::new()),
            counter: AtomicU64::new(0),
        }
    }

    /// Settings used for new sessions
    #[must_use]
    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<BrowserSession>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> String {
        let counter = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!(
            "{}_{}_{counter}",
            self.settings.browser.name,
            Local::now().format("%Y%m%d_%H%M%S")
        )
    }

    /// Launch and register a new session
    pub async fn create(&self) -> ProbeResult<Arc<BrowserSession>> {
        self.settings.validate()?;
        let driver = self.launcher.launch(&self.settings).await?;
        let session = Arc::new(BrowserSession::new(self.next_id(), driver, self.settings.clone()));
        info!(session = session.id(), browser = session.browser(), "Session created");
        self.sessions().insert(session.id().to_string(), session.clone());
        Ok(session)
    }

    /// Launch `count` sessions concurrently
    pub async fn create_parallel(&self, count: usize) -> ProbeResult<Vec<Arc<BrowserSession>>> {
        futures::future::try_join_all((0..count).map(|_| self.create())).await
    }

    /// Registered session by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<BrowserSession>> {
        self.sessions().get(id).cloned()
    }

    /// Ids of open sessions
    #[must_use]
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of open sessions
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.sessions().len()
    }

    /// Close and forget one session; `false` if the id is unknown
    pub async fn close(&self, id: &str) -> ProbeResult<bool> {
        let Some(session) = self.sessions().remove(id) else {
            return Ok(false);
        };
        session.close().await?;
        info!(session = id, "Session closed");
        Ok(true)
    }

    /// Close every session, reporting the first failure after trying all
    pub async fn close_all(&self) -> ProbeResult<usize> {
        let sessions: Vec<Arc<BrowserSession>> = self.sessions().drain().map(|(_, s)| s).collect();
        let mut first_error = None;
        for session in &sessions {
            if let Err(e) = session.close().await {
                warn!(session = session.id(), error = %e, "Session close failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(sessions.len()),
        }
    }

    /// Run `f` with a fresh session that is closed afterwards, whatever `f`
    /// returns
    pub async fn with_session<T, F, Fut>(&self, f: F) -> ProbeResult<T>
    where
        F: FnOnce(Arc<BrowserSession>) -> Fut,
        Fut: Future<Output = ProbeResult<T>>,
    {
        let session = self.create().await?;
        let id = session.id().to_string();
        let outcome = f(session).await;
        let closed = self.close(&id).await;
        match (outcome, closed) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Ok(value), Ok(_)) => Ok(value),
        }
    }
}
