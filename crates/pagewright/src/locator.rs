//! Element locators.
//!
//! A locator pairs a search root with a selector. [`DefaultElementLocator`]
//! performs one search and can cache what it found; [`AjaxElementLocator`]
//! wraps it with polling and consults the registered error handlers before
//! giving up.

use crate::by::{self, By};
use crate::driver::SharedDriver;
use crate::element::{Element, ElementRef, WebElement};
use crate::error_handler::ErrorHandlers;
use crate::result::{PagewrightError, PagewrightResult};
use crate::wait::spin_wait;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Default locate timeout (30 seconds)
pub const DEFAULT_LOCATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default locate poll interval (250 ms)
pub const DEFAULT_LOCATE_POLL: Duration = Duration::from_millis(250);

// =============================================================================
// SEARCH ROOT
// =============================================================================

/// Where a locator searches
#[derive(Debug, Clone)]
pub enum SearchRoot {
    /// The whole document
    Document(SharedDriver),
    /// Descendants of an element, itself located on demand
    Element(ElementRef),
}

impl SearchRoot {
    /// Session behind this root
    #[must_use]
    pub fn driver(&self) -> SharedDriver {
        match self {
            Self::Document(driver) => Arc::clone(driver),
            Self::Element(element) => element.driver(),
        }
    }

    /// Search once for `by`
    pub fn find_elements(&self, by: &By) -> PagewrightResult<Vec<WebElement>> {
        match self {
            Self::Document(driver) => Ok(by::find_all(driver.as_ref(), None, by)?
                .into_iter()
                .map(|id| WebElement::new(Arc::clone(driver), id))
                .collect()),
            Self::Element(element) => element.resolve()?.find_elements(by),
        }
    }
}

// =============================================================================
// LOCATOR TRAIT
// =============================================================================

/// Resolves a selector to live elements on demand
pub trait ElementLocator: Send + Sync + fmt::Debug {
    /// One element, or a locate failure
    fn find_element(&self) -> PagewrightResult<WebElement>;

    /// Every matching element
    fn find_elements(&self) -> PagewrightResult<Vec<WebElement>>;

    /// Selector description for logs and errors
    fn describe(&self) -> String;

    /// Drop any cached resolution
    fn invalidate(&self);

    /// Session the locator searches in
    fn driver(&self) -> SharedDriver;

    /// Locator sharing this one's cache, with a different timeout and error
    /// handling switch
    fn with_timeout(&self, timeout: Duration, error_handling: bool) -> Arc<dyn ElementLocator>;
}

// =============================================================================
// DEFAULT LOCATOR
// =============================================================================

/// Single search against a root, with optional caching
#[derive(Debug, Clone)]
pub struct DefaultElementLocator {
    root: SearchRoot,
    by: By,
    cache: bool,
    cached_element: Arc<Mutex<Option<WebElement>>>,
    cached_list: Arc<Mutex<Option<Vec<WebElement>>>>,
}

impl DefaultElementLocator {
    #[must_use]
    pub fn new(root: SearchRoot, by: By) -> Self {
        Self {
            root,
            by,
            cache: false,
            cached_element: Arc::new(Mutex::new(None)),
            cached_list: Arc::new(Mutex::new(None)),
        }
    }

    /// Keep the first successful resolution
    #[must_use]
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub const fn by(&self) -> &By {
        &self.by
    }

    #[must_use]
    pub const fn is_cached(&self) -> bool {
        self.cache
    }
}

impl ElementLocator for DefaultElementLocator {
    fn find_element(&self) -> PagewrightResult<WebElement> {
        if self.cache {
            let cached = self
                .cached_element
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(element) = cached {
                return Ok(element);
            }
        }

        let element = self
            .root
            .find_elements(&self.by)?
            .into_iter()
            .next()
            .ok_or_else(|| PagewrightError::NotFound {
                selector: self.by.to_string(),
                timeout_ms: 0,
            })?;

        if self.cache {
            *self
                .cached_element
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(element.clone());
        }
        Ok(element)
    }

    fn find_elements(&self) -> PagewrightResult<Vec<WebElement>> {
        if self.cache {
            let cached = self
                .cached_list
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(elements) = cached {
                return Ok(elements);
            }
        }

        let elements = self.root.find_elements(&self.by)?;

        // An empty result is never cached: polling callers wait for it to fill.
        if self.cache && !elements.is_empty() {
            *self
                .cached_list
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(elements.clone());
        }
        Ok(elements)
    }

    fn describe(&self) -> String {
        self.by.to_string()
    }

    fn invalidate(&self) {
        *self
            .cached_element
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        *self
            .cached_list
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn driver(&self) -> SharedDriver {
        self.root.driver()
    }

    fn with_timeout(&self, timeout: Duration, error_handling: bool) -> Arc<dyn ElementLocator> {
        let settings = LocatorSettings::default()
            .with_timeout(timeout)
            .with_error_handling(error_handling);
        Arc::new(AjaxElementLocator::new(Arc::new(self.clone()), settings, ErrorHandlers::new()))
    }
}

// =============================================================================
// AJAX LOCATOR
// =============================================================================

/// Polling behaviour of an [`AjaxElementLocator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorSettings {
    /// How long to poll before giving up
    pub timeout: Duration,
    /// Pause between attempts
    pub poll_interval: Duration,
    /// Consult error handlers after a failed locate
    pub error_handling: bool,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOCATE_TIMEOUT,
            poll_interval: DEFAULT_LOCATE_POLL,
            error_handling: true,
        }
    }
}

impl LocatorSettings {
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub const fn with_error_handling(mut self, error_handling: bool) -> Self {
        self.error_handling = error_handling;
        self
    }
}

/// Predicate deciding whether a located element may be handed out
pub type UsabilityCheck = Arc<dyn Fn(&WebElement) -> PagewrightResult<bool> + Send + Sync>;

/// Locator that polls until its target shows up.
///
/// `find_element` polls until the search succeeds (and the element passes the
/// usability check) or the timeout elapses. A locate failure then runs every
/// error handler; if any of them found a UI error to handle, one more full
/// polling round is made, otherwise the original failure is returned.
///
/// `find_elements` polls until the list is non-empty and degrades to an
/// empty list instead of failing.
#[derive(Clone)]
pub struct AjaxElementLocator {
    inner: Arc<DefaultElementLocator>,
    settings: LocatorSettings,
    handlers: ErrorHandlers,
    usable: Option<UsabilityCheck>,
}

impl fmt::Debug for AjaxElementLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AjaxElementLocator")
            .field("by", &self.inner.by())
            .field("settings", &self.settings)
            .field("handlers", &self.handlers.len())
            .field("usable", &self.usable.is_some())
            .finish()
    }
}

impl AjaxElementLocator {
    #[must_use]
    pub fn new(
        inner: Arc<DefaultElementLocator>,
        settings: LocatorSettings,
        handlers: ErrorHandlers,
    ) -> Self {
        Self {
            inner,
            settings,
            handlers,
            usable: None,
        }
    }

    /// Reject located elements failing `check`
    #[must_use]
    pub fn with_usability_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&WebElement) -> PagewrightResult<bool> + Send + Sync + 'static,
    {
        self.usable = Some(Arc::new(check));
        self
    }

    /// Only hand out displayed elements
    #[must_use]
    pub fn displayed_only(self) -> Self {
        self.with_usability_check(WebElement::is_displayed)
    }

    #[must_use]
    pub const fn settings(&self) -> &LocatorSettings {
        &self.settings
    }

    fn try_element(&self) -> PagewrightResult<WebElement> {
        let element = self.inner.find_element()?;
        let Some(check) = &self.usable else {
            return Ok(element);
        };
        match check(&element) {
            Ok(true) => Ok(element),
            Ok(false) => Err(PagewrightError::Unusable {
                selector: self.describe(),
                reason: "rejected by usability check".to_string(),
            }),
            Err(err) => {
                if err.is_stale() {
                    self.inner.invalidate();
                }
                Err(err)
            }
        }
    }

    fn poll_element(&self) -> PagewrightResult<WebElement> {
        let mut found = None;
        let mut last_error = None;
        spin_wait(
            || match self.try_element() {
                Ok(element) => {
                    found = Some(element);
                    true
                }
                Err(err) => {
                    let keep_polling = err.is_locate_failure();
                    last_error = Some(err);
                    !keep_polling
                }
            },
            self.settings.timeout,
            self.settings.poll_interval,
        );

        if let Some(element) = found {
            return Ok(element);
        }
        Err(self.final_error(last_error))
    }

    fn poll_elements(&self) -> PagewrightResult<Vec<WebElement>> {
        let mut found = Vec::new();
        let mut last_error = None;
        spin_wait(
            || match self.inner.find_elements() {
                Ok(elements) if !elements.is_empty() => {
                    found = elements;
                    true
                }
                Ok(_) => false,
                Err(err) => {
                    let keep_polling = err.is_locate_failure();
                    last_error = Some(err);
                    !keep_polling
                }
            },
            self.settings.timeout,
            self.settings.poll_interval,
        );

        if found.is_empty() {
            Err(self.final_error(last_error))
        } else {
            Ok(found)
        }
    }

    fn final_error(&self, last_error: Option<PagewrightError>) -> PagewrightError {
        match last_error {
            None | Some(PagewrightError::NotFound { .. }) => PagewrightError::NotFound {
                selector: self.describe(),
                timeout_ms: self.settings.timeout.as_millis() as u64,
            },
            Some(err) => err,
        }
    }

    /// Run the error handlers; `true` when one of them had an error to handle
    fn recover(&self) -> PagewrightResult<bool> {
        if !self.settings.error_handling {
            return Ok(false);
        }
        let triggered = self.handlers.handle_all()?;
        if triggered {
            warn!(locator = %self.describe(), "UI error handled, locating once more");
        }
        Ok(triggered)
    }
}

impl ElementLocator for AjaxElementLocator {
    fn find_element(&self) -> PagewrightResult<WebElement> {
        match self.poll_element() {
            Err(err) if err.is_locate_failure() => {
                debug!(locator = %self.describe(), error = %err, "locate failed");
                if self.recover()? {
                    self.poll_element()
                } else {
                    Err(err)
                }
            }
            other => other,
        }
    }

    fn find_elements(&self) -> PagewrightResult<Vec<WebElement>> {
        match self.poll_elements() {
            Err(err) if err.is_locate_failure() => {
                if !self.recover()? {
                    return Ok(Vec::new());
                }
                match self.poll_elements() {
                    Err(err) if err.is_locate_failure() => Ok(Vec::new()),
                    other => other,
                }
            }
            other => other,
        }
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }

    fn invalidate(&self) {
        self.inner.invalidate();
    }

    fn driver(&self) -> SharedDriver {
        self.inner.driver()
    }

    fn with_timeout(&self, timeout: Duration, error_handling: bool) -> Arc<dyn ElementLocator> {
        let mut view = self.clone();
        view.settings = view
            .settings
            .with_timeout(timeout)
            .with_error_handling(error_handling);
        Arc::new(view)
    }
}

// =============================================================================
// INDEXED LOCATOR
// =============================================================================

/// The `index`-th member of another locator's list, re-resolved on each call
#[derive(Debug, Clone)]
pub struct IndexedElementLocator {
    list: Arc<dyn ElementLocator>,
    index: usize,
}

impl IndexedElementLocator {
    #[must_use]
    pub fn new(list: Arc<dyn ElementLocator>, index: usize) -> Self {
        Self { list, index }
    }
}

impl ElementLocator for IndexedElementLocator {
    fn find_element(&self) -> PagewrightResult<WebElement> {
        self.list
            .find_elements()?
            .into_iter()
            .nth(self.index)
            .ok_or_else(|| PagewrightError::NotFound {
                selector: self.describe(),
                timeout_ms: 0,
            })
    }

    fn find_elements(&self) -> PagewrightResult<Vec<WebElement>> {
        Ok(self.find_element().map(|e| vec![e]).unwrap_or_default())
    }

    fn describe(&self) -> String {
        format!("{}[{}]", self.list.describe(), self.index)
    }

    fn invalidate(&self) {
        self.list.invalidate();
    }

    fn driver(&self) -> SharedDriver {
        self.list.driver()
    }

    fn with_timeout(&self, timeout: Duration, error_handling: bool) -> Arc<dyn ElementLocator> {
        Arc::new(Self {
            list: self.list.with_timeout(timeout, error_handling),
            index: self.index,
        })
    }
}
