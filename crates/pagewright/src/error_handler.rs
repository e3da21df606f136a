//! UI error handlers.
//!
//! A handler recognises a page state that blocks element lookup (an error
//! modal, an unexpected alert) and knows how to clear it. Locators consult
//! the handlers registered with their factory after a failed locate.

use crate::by::{self, By};
use crate::driver::SharedDriver;
use crate::result::PagewrightResult;
use crate::wait::spin_wait_ensure_satisfied;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default time a handler may spend clearing its error (10 seconds)
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause between handling attempts (1 second)
pub const DEFAULT_HANDLER_POLL: Duration = Duration::from_secs(1);

/// Detects and clears one kind of blocking UI error
pub trait ErrorHandler: Send + Sync + fmt::Debug {
    /// Name used in logs and timeout messages
    fn name(&self) -> &str;

    /// Whether the error is currently shown
    fn error_exists(&self) -> bool;

    /// One attempt at clearing the error
    fn try_handle(&self) -> PagewrightResult<()>;

    fn timeout(&self) -> Duration {
        DEFAULT_HANDLER_TIMEOUT
    }

    fn poll_interval(&self) -> Duration {
        DEFAULT_HANDLER_POLL
    }

    /// Clear the error if present, retrying until it is gone.
    ///
    /// Does nothing when no error is shown. Fails with
    /// [`PagewrightError::Timeout`](crate::PagewrightError::Timeout) when the
    /// error survives the handler's timeout.
    fn handle(&self) -> PagewrightResult<()> {
        if !self.error_exists() {
            return Ok(());
        }
        warn!(handler = self.name(), "UI error detected");
        spin_wait_ensure_satisfied(
            || {
                if let Err(err) = self.try_handle() {
                    debug!(handler = self.name(), error = %err, "handling attempt failed");
                }
                !self.error_exists()
            },
            self.timeout(),
            self.poll_interval(),
            &format!("{} could not clear the UI error", self.name()),
        )
    }
}

/// Ordered set of handlers shared by locator factories
#[derive(Debug, Clone, Default)]
pub struct ErrorHandlers {
    handlers: Vec<Arc<dyn ErrorHandler>>,
}

impl ErrorHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler (builder form)
    #[must_use]
    pub fn with(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn register(&mut self, handler: Arc<dyn ErrorHandler>) {
        self.handlers.push(handler);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ErrorHandler>> {
        self.handlers.iter()
    }

    /// Run every handler in registration order.
    ///
    /// Returns whether any handler saw its error. The first handler that
    /// fails to clear its error aborts the run.
    pub fn handle_all(&self) -> PagewrightResult<bool> {
        let mut triggered = false;
        for handler in &self.handlers {
            if handler.error_exists() {
                triggered = true;
            }
            handler.handle()?;
        }
        Ok(triggered)
    }
}

// =============================================================================
// BUILT-IN HANDLERS
// =============================================================================

/// Closes a visible modal dialog by clicking its close control
#[derive(Debug, Clone)]
pub struct ModalDismissHandler {
    driver: SharedDriver,
    modal: By,
    close: By,
    timeout: Duration,
    poll_interval: Duration,
}

impl ModalDismissHandler {
    /// `close` is searched inside the modal
    #[must_use]
    pub fn new(driver: SharedDriver, modal: By, close: By) -> Self {
        Self {
            driver,
            modal,
            close,
            timeout: DEFAULT_HANDLER_TIMEOUT,
            poll_interval: DEFAULT_HANDLER_POLL,
        }
    }

    #[must_use]
    pub const fn with_timing(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    fn visible_modal(&self) -> Option<crate::driver::ElementId> {
        by::find_all(self.driver.as_ref(), None, &self.modal)
            .ok()?
            .into_iter()
            .find(|id| self.driver.is_displayed(id).unwrap_or(false))
    }
}

impl ErrorHandler for ModalDismissHandler {
    fn name(&self) -> &str {
        "modal dialog"
    }

    fn error_exists(&self) -> bool {
        self.visible_modal().is_some()
    }

    fn try_handle(&self) -> PagewrightResult<()> {
        let Some(modal) = self.visible_modal() else {
            return Ok(());
        };
        if let Some(close) = by::find_all(self.driver.as_ref(), Some(&modal), &self.close)?
            .into_iter()
            .next()
        {
            self.driver.click(&close)?;
        }
        Ok(())
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

/// Accepts an unexpected JavaScript alert
#[derive(Debug, Clone)]
pub struct AlertDismissHandler {
    driver: SharedDriver,
    timeout: Duration,
    poll_interval: Duration,
}

impl AlertDismissHandler {
    #[must_use]
    pub fn new(driver: SharedDriver) -> Self {
        Self {
            driver,
            timeout: DEFAULT_HANDLER_TIMEOUT,
            poll_interval: DEFAULT_HANDLER_POLL,
        }
    }

    #[must_use]
    pub const fn with_timing(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }
}

impl ErrorHandler for AlertDismissHandler {
    fn name(&self) -> &str {
        "alert"
    }

    fn error_exists(&self) -> bool {
        self.driver.alert_text().is_ok()
    }

    fn try_handle(&self) -> PagewrightResult<()> {
        if let Ok(text) = self.driver.alert_text() {
            warn!(alert = %text, "accepting unexpected alert");
        }
        self.driver.accept_alert()
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::WebDriver;
    use crate::mock::{ClickEffect, MockDriver, MockElement};
    use crate::result::PagewrightError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const QUICK: Duration = Duration::from_millis(5);

    #[derive(Debug, Default)]
    struct Stubborn {
        attempts: AtomicUsize,
    }

    impl ErrorHandler for Stubborn {
        fn name(&self) -> &str {
            "stubborn"
        }

        fn error_exists(&self) -> bool {
            true
        }

        fn try_handle(&self) -> PagewrightResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(PagewrightError::driver("cannot close"))
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(30)
        }

        fn poll_interval(&self) -> Duration {
            QUICK
        }
    }

    mod handler_tests {
        use super::*;

        #[test]
        fn test_handle_times_out_when_error_persists() {
            let handler = Stubborn::default();
            let err = handler.handle().unwrap_err();
            assert!(matches!(err, PagewrightError::Timeout { .. }));
            assert!(err.to_string().contains("stubborn"));
            assert!(handler.attempts.load(Ordering::SeqCst) >= 2);
        }

        #[test]
        fn test_handle_all_without_errors() {
            let mock: SharedDriver = Arc::new(MockDriver::new());
            let handlers = ErrorHandlers::new()
                .with(Arc::new(AlertDismissHandler::new(mock).with_timing(QUICK, QUICK)));
            assert!(!handlers.handle_all().unwrap());
        }

        #[test]
        fn test_handle_all_propagates_failure() {
            let handlers = ErrorHandlers::new().with(Arc::new(Stubborn::default()));
            assert!(handlers.handle_all().is_err());
        }
    }

    mod builtin_tests {
        use super::*;

        #[test]
        fn test_alert_handler_accepts_alert() {
            let mock = Arc::new(MockDriver::new());
            mock.set_alert(Some("Session expired"));
            let driver: SharedDriver = mock.clone();
            let handler = AlertDismissHandler::new(driver).with_timing(QUICK, QUICK);
            assert!(handler.error_exists());
            handler.handle().unwrap();
            assert!(mock.alert_text().is_err());
        }

        #[test]
        fn test_modal_handler_clicks_close() {
            let mock = Arc::new(MockDriver::new());
            let modal = mock.load(
                MockElement::new("div")
                    .class("modal")
                    .child(MockElement::new("button").class("close").text("x")),
            );
            let close = mock.first(&By::css(".modal .close")).unwrap();
            mock.on_click(&close, ClickEffect::Hide(modal));

            let driver: SharedDriver = mock.clone();
            let handler =
                ModalDismissHandler::new(driver, By::class_name("modal"), By::class_name("close"))
                    .with_timing(Duration::from_millis(50), QUICK);
            let handlers = ErrorHandlers::new().with(Arc::new(handler));
            assert!(handlers.handle_all().unwrap());
            assert_eq!(mock.click_count(&close), 1);
        }
    }
}
