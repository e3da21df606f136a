//! Browser session lifecycle.
//!
//! A [`Browser`] owns one driver session. The session is started lazily on
//! first use through a [`DriverFactory`], and `close`/`quit` end it so the
//! next call starts a fresh one. Page-level waits (document ready state,
//! outstanding jQuery requests) and alert handling live here as well.

use crate::config::FrameworkConfig;
use crate::driver::{Cookie, ScriptArg, SharedDriver};
use crate::error_handler::ErrorHandlers;
use crate::page_object::PageFactory;
use crate::result::{PagewrightError, PagewrightResult};
use crate::wait::{spin_wait, spin_wait_ensure_satisfied};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{error, info, warn};

const AJAX_SCRIPT: &str = "return (typeof($) === 'undefined') ? true : !$.active;";
const READY_STATE_SCRIPT: &str = "return document.readyState == 'complete'";

/// Poll interval of the page-level waits
const PAGE_POLL: Duration = Duration::from_millis(100);

/// How long `alert_message` waits for an alert to appear
pub const ALERT_TIMEOUT: Duration = Duration::from_secs(5);
const ALERT_POLL: Duration = Duration::from_secs(1);

// =============================================================================
// DRIVER FACTORY
// =============================================================================

/// Starts driver sessions for a [`Browser`]
pub trait DriverFactory: Send + Sync + fmt::Debug {
    fn start(&self, config: &FrameworkConfig) -> PagewrightResult<SharedDriver>;
}

/// Hands out one pre-built session, e.g. a [`MockDriver`](crate::mock::MockDriver)
#[derive(Debug, Clone)]
pub struct SharedDriverFactory {
    driver: SharedDriver,
}

impl SharedDriverFactory {
    #[must_use]
    pub fn new(driver: SharedDriver) -> Self {
        Self { driver }
    }
}

impl DriverFactory for SharedDriverFactory {
    fn start(&self, _config: &FrameworkConfig) -> PagewrightResult<SharedDriver> {
        Ok(Arc::clone(&self.driver))
    }
}

/// Launches Chromium over the DevTools protocol
#[cfg(feature = "browser")]
#[derive(Debug, Clone, Copy, Default)]
pub struct CdpDriverFactory;

#[cfg(feature = "browser")]
impl DriverFactory for CdpDriverFactory {
    fn start(&self, config: &FrameworkConfig) -> PagewrightResult<SharedDriver> {
        Ok(Arc::new(crate::cdp::CdpDriver::launch(config)?))
    }
}

// =============================================================================
// BROWSER
// =============================================================================

/// One browser session and the page-level operations on it
pub struct Browser {
    config: FrameworkConfig,
    factory: Arc<dyn DriverFactory>,
    driver: Mutex<Option<SharedDriver>>,
}

impl fmt::Debug for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Browser")
            .field("factory", &self.factory)
            .field("started", &self.is_started())
            .finish()
    }
}

impl Browser {
    #[must_use]
    pub fn new(config: FrameworkConfig, factory: Arc<dyn DriverFactory>) -> Self {
        Self {
            config,
            factory,
            driver: Mutex::new(None),
        }
    }

    /// Browser over an existing session
    #[must_use]
    pub fn with_driver(config: FrameworkConfig, driver: SharedDriver) -> Self {
        Self::new(config, Arc::new(SharedDriverFactory::new(driver)))
    }

    /// Chromium over CDP
    #[cfg(feature = "browser")]
    #[must_use]
    pub fn chromium(config: FrameworkConfig) -> Self {
        Self::new(config, Arc::new(CdpDriverFactory))
    }

    #[must_use]
    pub const fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    /// Whether a session is currently running
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The running session, started on first use
    pub fn driver(&self) -> PagewrightResult<SharedDriver> {
        let mut slot = self.driver.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(driver) = slot.as_ref() {
            return Ok(Arc::clone(driver));
        }
        info!(browser = ?self.config.browser, headless = self.config.headless, "Start");
        let driver = self.factory.start(&self.config)?;
        *slot = Some(Arc::clone(&driver));
        Ok(driver)
    }

    fn take_driver(&self) -> Option<SharedDriver> {
        self.driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Navigate to `url`; relative URLs are joined to `base_url`
    pub fn open(&self, url: &str) -> PagewrightResult<()> {
        let target = self.config.resolve_url(url);
        info!(url = %target, "Open");
        self.driver()?.navigate(&target)
    }

    pub fn current_url(&self) -> PagewrightResult<String> {
        self.driver()?.current_url()
    }

    pub fn title(&self) -> PagewrightResult<String> {
        self.driver()?.title()
    }

    pub fn back(&self) -> PagewrightResult<()> {
        self.driver()?.back()
    }

    pub fn refresh(&self) -> PagewrightResult<()> {
        self.driver()?.refresh()
    }

    /// Reload and wait until the page and its requests have settled
    pub fn refresh_page(&self) -> PagewrightResult<()> {
        self.refresh()?;
        self.wait_ready_state()?;
        self.wait_ajax(true)?;
        Ok(())
    }

    pub fn execute_js(
        &self,
        script: &str,
        args: &[ScriptArg],
    ) -> PagewrightResult<serde_json::Value> {
        self.driver()?.execute_script(script, args)
    }

    // =========================================================================
    // PAGE WAITS
    // =========================================================================

    fn script_is_true(driver: &SharedDriver, script: &str) -> bool {
        driver
            .execute_script(script, &[])
            .map(|value| value.as_bool() == Some(true))
            .unwrap_or(false)
    }

    /// Wait until jQuery reports no active requests.
    ///
    /// Pages without jQuery count as settled. Returns whether the wait
    /// succeeded; with `assert` set a timeout is an error instead.
    pub fn wait_ajax(&self, assert: bool) -> PagewrightResult<bool> {
        let driver = self.driver()?;
        let settled = spin_wait(
            || Self::script_is_true(&driver, AJAX_SCRIPT),
            self.config.ajax_timeout(),
            PAGE_POLL,
        );
        if settled {
            return Ok(true);
        }
        error!("Browser.wait_ajax() failed!");
        if assert {
            return Err(PagewrightError::Timeout {
                ms: self.config.ajax_timeout().as_millis() as u64,
                message: "Browser.wait_ajax() failed!".to_string(),
            });
        }
        Ok(false)
    }

    /// Wait until `document.readyState` is `complete`
    pub fn wait_ready_state(&self) -> PagewrightResult<()> {
        let driver = self.driver()?;
        spin_wait_ensure_satisfied(
            || Self::script_is_true(&driver, READY_STATE_SCRIPT),
            self.config.ready_state_timeout(),
            PAGE_POLL,
            "Browser.wait_ready_state() failed.",
        )
    }

    // =========================================================================
    // ALERTS
    // =========================================================================

    pub fn is_alert_present(&self) -> PagewrightResult<bool> {
        Ok(self.driver()?.alert_text().is_ok())
    }

    /// Text of the open alert, waiting up to [`ALERT_TIMEOUT`] for one
    pub fn alert_message(&self) -> PagewrightResult<String> {
        self.alert_message_within(ALERT_TIMEOUT)
    }

    pub fn alert_message_within(&self, timeout: Duration) -> PagewrightResult<String> {
        let driver = self.driver()?;
        spin_wait_ensure_satisfied(
            || driver.alert_text().is_ok(),
            timeout,
            ALERT_POLL.min(timeout.max(Duration::from_millis(1))),
            "Alert not appeared",
        )?;
        driver.alert_text()
    }

    /// Accept the open confirmation; a missing dialog is only logged
    pub fn accept_confirmation(&self) -> PagewrightResult<()> {
        let driver = self.driver()?;
        if let Err(err) = driver.accept_alert() {
            warn!("Error occurred while closing of modal dialog: {err}");
        }
        Ok(())
    }

    pub fn dismiss_confirmation(&self) -> PagewrightResult<()> {
        self.driver()?.dismiss_alert()
    }

    // =========================================================================
    // COOKIES AND WINDOWS
    // =========================================================================

    pub fn cookies(&self) -> PagewrightResult<Vec<Cookie>> {
        self.driver()?.cookies()
    }

    pub fn add_cookie(&self, cookie: Cookie) -> PagewrightResult<()> {
        self.driver()?.add_cookie(cookie)
    }

    pub fn delete_cookie(&self, name: &str) -> PagewrightResult<()> {
        self.driver()?.delete_cookie(name)
    }

    pub fn delete_all_cookies(&self) -> PagewrightResult<()> {
        self.driver()?.delete_all_cookies()
    }

    pub fn window_handles(&self) -> PagewrightResult<Vec<String>> {
        self.driver()?.window_handles()
    }

    pub fn current_window(&self) -> PagewrightResult<String> {
        self.driver()?.current_window()
    }

    pub fn switch_to_window(&self, handle: &str) -> PagewrightResult<()> {
        self.driver()?.switch_to_window(handle)
    }

    // =========================================================================
    // FILES
    // =========================================================================

    /// Write a PNG of the settled page to `path`
    pub fn save_screenshot(&self, path: impl AsRef<Path>) -> PagewrightResult<()> {
        self.wait_ready_state()?;
        let png = self.driver()?.screenshot_png()?;
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, png)?;
        info!(path = %path.display(), "Screenshot saved");
        Ok(())
    }

    /// Absolute downloads folder
    pub fn downloads_dir(&self) -> PagewrightResult<PathBuf> {
        let dir = &self.config.downloads_dir;
        if dir.is_absolute() {
            Ok(dir.clone())
        } else {
            Ok(std::env::current_dir()?.join(dir))
        }
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Close the current window and forget the session
    pub fn close(&self) -> PagewrightResult<()> {
        match self.take_driver() {
            Some(driver) => driver.close(),
            None => Ok(()),
        }
    }

    /// End the session; the next call starts a new one
    pub fn quit(&self) -> PagewrightResult<()> {
        match self.take_driver() {
            Some(driver) => {
                info!("Quit");
                driver.quit()
            }
            None => Ok(()),
        }
    }

    /// Page factory bound to this session with the configured locator
    /// settings
    pub fn page_factory(&self, handlers: ErrorHandlers) -> PagewrightResult<PageFactory> {
        Ok(PageFactory::new(self.driver()?)
            .with_settings(self.config.locator_settings())
            .with_handlers(handlers))
    }
}

impl Drop for Browser {
    fn drop(&mut self) {
        if let Err(err) = self.quit() {
            warn!(error = %err, "failed to quit browser");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::by::By;
    use crate::driver::WebDriver;
    use crate::mock::{Interaction, MockDriver, MockElement};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingFactory {
        started: AtomicUsize,
    }

    impl DriverFactory for CountingFactory {
        fn start(&self, _config: &FrameworkConfig) -> PagewrightResult<SharedDriver> {
            self.started.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MockDriver::new()))
        }
    }

    fn quick_config() -> FrameworkConfig {
        FrameworkConfig {
            ajax_timeout_secs: 0,
            ready_state_timeout_secs: 0,
            timeout_secs: 0,
            poll_interval_ms: 10,
            ..FrameworkConfig::default()
        }
    }

    fn browser() -> (Arc<MockDriver>, Browser) {
        let mock = Arc::new(MockDriver::new());
        let browser = Browser::with_driver(quick_config(), mock.clone());
        (mock, browser)
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn test_driver_starts_lazily_once() {
            let factory = Arc::new(CountingFactory::default());
            let browser = Browser::new(quick_config(), factory.clone());
            assert!(!browser.is_started());
            browser.driver().unwrap();
            browser.driver().unwrap();
            assert_eq!(factory.started.load(Ordering::SeqCst), 1);
            assert!(browser.is_started());
        }

        #[test]
        fn test_quit_allows_restart() {
            let factory = Arc::new(CountingFactory::default());
            let browser = Browser::new(quick_config(), factory.clone());
            browser.driver().unwrap();
            browser.quit().unwrap();
            assert!(!browser.is_started());
            browser.driver().unwrap();
            assert_eq!(factory.started.load(Ordering::SeqCst), 2);
        }

        #[test]
        fn test_close_and_quit_without_session_are_noops() {
            let factory = Arc::new(CountingFactory::default());
            let browser = Browser::new(quick_config(), factory.clone());
            browser.close().unwrap();
            browser.quit().unwrap();
            assert_eq!(factory.started.load(Ordering::SeqCst), 0);
        }

        #[test]
        fn test_drop_quits_session() {
            let (mock, browser) = browser();
            browser.driver().unwrap();
            drop(browser);
            assert!(mock.is_quit());
        }
    }

    mod navigation_tests {
        use super::*;

        #[test]
        fn test_open_joins_base_url() {
            let mock = Arc::new(MockDriver::new());
            let config = FrameworkConfig {
                base_url: Some("https://shop.test".to_string()),
                ..quick_config()
            };
            let browser = Browser::with_driver(config, mock.clone());
            browser.open("/cart").unwrap();
            assert_eq!(browser.current_url().unwrap(), "https://shop.test/cart");
        }

        #[test]
        fn test_refresh_page_waits_for_settled_page() {
            let (mock, browser) = browser();
            browser.open("https://shop.test/").unwrap();
            browser.refresh_page().unwrap();
            let interactions = mock.interactions();
            assert!(interactions.contains(&Interaction::Refresh));
            assert!(interactions
                .iter()
                .any(|i| matches!(i, Interaction::Script(s) if s.contains("readyState"))));
        }
    }

    mod wait_tests {
        use super::*;

        #[test]
        fn test_wait_ajax_succeeds_without_jquery_activity() {
            let (_, browser) = browser();
            assert!(browser.wait_ajax(true).unwrap());
        }

        #[test]
        fn test_wait_ajax_failure_only_errors_when_asserting() {
            let (mock, browser) = browser();
            mock.on_script("$.active", |_| Ok(serde_json::Value::Bool(false)));
            assert!(!browser.wait_ajax(false).unwrap());
            let err = browser.wait_ajax(true).unwrap_err();
            assert!(err.to_string().contains("Browser.wait_ajax() failed!"));
        }

        #[test]
        fn test_wait_ready_state_times_out() {
            let (mock, browser) = browser();
            mock.on_script("readyState", |_| Ok(serde_json::Value::Bool(false)));
            let err = browser.wait_ready_state().unwrap_err();
            assert!(matches!(err, PagewrightError::Timeout { .. }));
        }
    }

    mod alert_tests {
        use super::*;

        #[test]
        fn test_alert_message_and_accept() {
            let (mock, browser) = browser();
            mock.set_alert(Some("Delete item?"));
            assert!(browser.is_alert_present().unwrap());
            assert_eq!(browser.alert_message().unwrap(), "Delete item?");
            browser.accept_confirmation().unwrap();
            assert!(!browser.is_alert_present().unwrap());
        }

        #[test]
        fn test_accept_without_alert_is_logged_only() {
            let (_, browser) = browser();
            browser.accept_confirmation().unwrap();
        }

        #[test]
        fn test_alert_message_times_out() {
            let (_, browser) = browser();
            let err = browser
                .alert_message_within(Duration::from_millis(20))
                .unwrap_err();
            assert!(err.to_string().contains("Alert not appeared"));
        }

        #[test]
        fn test_dismiss_without_alert_fails() {
            let (_, browser) = browser();
            assert!(browser.dismiss_confirmation().is_err());
        }
    }

    mod misc_tests {
        use super::*;

        #[test]
        fn test_cookie_pass_through() {
            let (_, browser) = browser();
            browser.add_cookie(Cookie::new("session", "abc")).unwrap();
            assert_eq!(browser.cookies().unwrap().len(), 1);
            browser.delete_all_cookies().unwrap();
            assert!(browser.cookies().unwrap().is_empty());
        }

        #[test]
        fn test_save_screenshot_writes_png() {
            let (_, browser) = browser();
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("shots").join("page.png");
            browser.save_screenshot(&path).unwrap();
            let bytes = std::fs::read(&path).unwrap();
            assert_eq!(&bytes[..4], b"\x89PNG");
        }

        #[test]
        fn test_downloads_dir_is_absolute() {
            let (_, browser) = browser();
            let dir = browser.downloads_dir().unwrap();
            assert!(dir.is_absolute());
            assert!(dir.ends_with("DownloadedFiles"));
        }

        #[test]
        fn test_page_factory_uses_session() {
            let (mock, browser) = browser();
            mock.load(MockElement::new("button").id("go").text("Go"));
            let factory = browser.page_factory(ErrorHandlers::new()).unwrap();
            let driver = factory.driver();
            let found = crate::by::find_all(driver.as_ref(), None, &By::id("go")).unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(mock.text(&found[0]).unwrap(), "Go");
        }
    }
}
