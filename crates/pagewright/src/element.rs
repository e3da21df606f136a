//! Element handles.
//!
//! [`WebElement`] is a concrete handle to one DOM node. [`LazyElement`] holds
//! a locator instead and resolves a fresh handle for every operation, so a
//! page object keeps working across reloads and DOM replacement.

use crate::by::{self, By};
use crate::driver::{ElementId, ScriptArg, SharedDriver};
use crate::locator::ElementLocator;
use crate::result::{PagewrightError, PagewrightResult};
use crate::wait::spin_wait_ensure_satisfied;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Shared, type-erased element
pub type ElementRef = Arc<dyn Element>;

/// Operations available on anything element-shaped
pub trait Element: Send + Sync + fmt::Debug {
    /// Resolve to a concrete handle
    fn resolve(&self) -> PagewrightResult<WebElement>;

    /// Session the element belongs to
    fn driver(&self) -> SharedDriver;

    /// Human readable description used in logs and errors
    fn describe(&self) -> String;

    fn click(&self) -> PagewrightResult<()>;
    fn clear(&self) -> PagewrightResult<()>;
    fn send_keys(&self, keys: &str) -> PagewrightResult<()>;
    fn submit(&self) -> PagewrightResult<()>;
    fn text(&self) -> PagewrightResult<String>;
    fn tag_name(&self) -> PagewrightResult<String>;
    fn attribute(&self, name: &str) -> PagewrightResult<Option<String>>;
    fn css_value(&self, property: &str) -> PagewrightResult<String>;
    fn is_displayed(&self) -> PagewrightResult<bool>;
    fn is_enabled(&self) -> PagewrightResult<bool>;
    fn is_selected(&self) -> PagewrightResult<bool>;

    /// Every descendant matching `by`
    fn find_elements(&self, by: &By) -> PagewrightResult<Vec<WebElement>>;

    /// First descendant matching `by`
    fn find_element(&self, by: &By) -> PagewrightResult<WebElement> {
        self.find_elements(by)?
            .into_iter()
            .next()
            .ok_or_else(|| PagewrightError::NotFound {
                selector: by.to_string(),
                timeout_ms: 0,
            })
    }

    /// A view of this element with a different locate timeout and error
    /// handling disabled. `None` for elements that do not locate lazily.
    fn with_timeout(&self, _timeout: Duration) -> Option<ElementRef> {
        None
    }
}

// =============================================================================
// WEB ELEMENT
// =============================================================================

/// Concrete handle to one DOM node
#[derive(Debug, Clone)]
pub struct WebElement {
    driver: SharedDriver,
    id: ElementId,
}

impl PartialEq for WebElement {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl WebElement {
    /// Wrap a driver handle
    #[must_use]
    pub fn new(driver: SharedDriver, id: ElementId) -> Self {
        Self { driver, id }
    }

    /// Driver-side id
    #[must_use]
    pub const fn id(&self) -> &ElementId {
        &self.id
    }

    /// Pass this element to a script as `arguments[n]`
    #[must_use]
    pub fn as_arg(&self) -> ScriptArg {
        ScriptArg::Element(self.id.clone())
    }
}

impl Element for WebElement {
    fn resolve(&self) -> PagewrightResult<WebElement> {
        Ok(self.clone())
    }

    fn driver(&self) -> SharedDriver {
        Arc::clone(&self.driver)
    }

    fn describe(&self) -> String {
        format!("element {}", self.id)
    }

    fn click(&self) -> PagewrightResult<()> {
        self.driver.click(&self.id)
    }

    fn clear(&self) -> PagewrightResult<()> {
        self.driver.clear(&self.id)
    }

    fn send_keys(&self, keys: &str) -> PagewrightResult<()> {
        self.driver.send_keys(&self.id, keys)
    }

    fn submit(&self) -> PagewrightResult<()> {
        self.driver.submit(&self.id)
    }

    fn text(&self) -> PagewrightResult<String> {
        self.driver.text(&self.id)
    }

    fn tag_name(&self) -> PagewrightResult<String> {
        self.driver.tag_name(&self.id)
    }

    fn attribute(&self, name: &str) -> PagewrightResult<Option<String>> {
        self.driver.attribute(&self.id, name)
    }

    fn css_value(&self, property: &str) -> PagewrightResult<String> {
        self.driver.css_value(&self.id, property)
    }

    fn is_displayed(&self) -> PagewrightResult<bool> {
        self.driver.is_displayed(&self.id)
    }

    fn is_enabled(&self) -> PagewrightResult<bool> {
        self.driver.is_enabled(&self.id)
    }

    fn is_selected(&self) -> PagewrightResult<bool> {
        self.driver.is_selected(&self.id)
    }

    fn find_elements(&self, by: &By) -> PagewrightResult<Vec<WebElement>> {
        Ok(by::find_all(self.driver.as_ref(), Some(&self.id), by)?
            .into_iter()
            .map(|id| WebElement::new(Arc::clone(&self.driver), id))
            .collect())
    }
}

// =============================================================================
// LAZY ELEMENT
// =============================================================================

/// Element that re-locates itself on every operation.
///
/// A stale handle (from a cached locator, or a node replaced between locate
/// and use) invalidates the locator cache and the operation is retried once
/// against a freshly located node.
#[derive(Clone)]
pub struct LazyElement {
    locator: Arc<dyn ElementLocator>,
    name: String,
}

impl fmt::Debug for LazyElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyElement")
            .field("name", &self.name)
            .field("locator", &self.locator.describe())
            .finish()
    }
}

impl LazyElement {
    /// Proxy for whatever `locator` finds
    #[must_use]
    pub fn new(locator: Arc<dyn ElementLocator>, name: impl Into<String>) -> Self {
        Self {
            locator,
            name: name.into(),
        }
    }

    /// Human name given at population time
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying locator
    #[must_use]
    pub fn locator(&self) -> &Arc<dyn ElementLocator> {
        &self.locator
    }

    fn live<T>(&self, op: impl Fn(&WebElement) -> PagewrightResult<T>) -> PagewrightResult<T> {
        let element = self.locator.find_element()?;
        match op(&element) {
            Err(err) if err.is_stale() => {
                debug!(element = %self.name, "stale handle, locating again");
                self.locator.invalidate();
                op(&self.locator.find_element()?)
            }
            other => other,
        }
    }
}

impl Element for LazyElement {
    fn resolve(&self) -> PagewrightResult<WebElement> {
        self.locator.find_element()
    }

    fn driver(&self) -> SharedDriver {
        self.locator.driver()
    }

    fn describe(&self) -> String {
        format!("'{}' ({})", self.name, self.locator.describe())
    }

    fn click(&self) -> PagewrightResult<()> {
        self.live(WebElement::click)
    }

    fn clear(&self) -> PagewrightResult<()> {
        self.live(WebElement::clear)
    }

    fn send_keys(&self, keys: &str) -> PagewrightResult<()> {
        self.live(|e| e.send_keys(keys))
    }

    fn submit(&self) -> PagewrightResult<()> {
        self.live(WebElement::submit)
    }

    fn text(&self) -> PagewrightResult<String> {
        self.live(WebElement::text)
    }

    fn tag_name(&self) -> PagewrightResult<String> {
        self.live(WebElement::tag_name)
    }

    fn attribute(&self, name: &str) -> PagewrightResult<Option<String>> {
        self.live(|e| e.attribute(name))
    }

    fn css_value(&self, property: &str) -> PagewrightResult<String> {
        self.live(|e| e.css_value(property))
    }

    fn is_displayed(&self) -> PagewrightResult<bool> {
        self.live(WebElement::is_displayed)
    }

    fn is_enabled(&self) -> PagewrightResult<bool> {
        self.live(WebElement::is_enabled)
    }

    fn is_selected(&self) -> PagewrightResult<bool> {
        self.live(WebElement::is_selected)
    }

    fn find_elements(&self, by: &By) -> PagewrightResult<Vec<WebElement>> {
        self.live(|e| e.find_elements(by))
    }

    fn with_timeout(&self, timeout: Duration) -> Option<ElementRef> {
        Some(Arc::new(Self {
            locator: self.locator.with_timeout(timeout, false),
            name: self.name.clone(),
        }))
    }
}

// =============================================================================
// LAZY ELEMENT LIST
// =============================================================================

/// List that re-locates all of its members on every call
#[derive(Clone)]
pub struct LazyElementList {
    locator: Arc<dyn ElementLocator>,
    name: String,
}

impl fmt::Debug for LazyElementList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyElementList")
            .field("name", &self.name)
            .field("locator", &self.locator.describe())
            .finish()
    }
}

impl LazyElementList {
    #[must_use]
    pub fn new(locator: Arc<dyn ElementLocator>, name: impl Into<String>) -> Self {
        Self {
            locator,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn locator(&self) -> &Arc<dyn ElementLocator> {
        &self.locator
    }

    /// Current members; empty when nothing matches
    pub fn elements(&self) -> PagewrightResult<Vec<WebElement>> {
        attached_members(self.locator.as_ref(), &self.name)
    }

    pub fn len(&self) -> PagewrightResult<usize> {
        Ok(self.elements()?.len())
    }

    pub fn is_empty(&self) -> PagewrightResult<bool> {
        Ok(self.elements()?.is_empty())
    }

    /// Member at `index`
    pub fn get(&self, index: usize) -> PagewrightResult<WebElement> {
        with_live_list(self.locator.as_ref(), &self.name, |elements| {
            let element = elements
                .get(index)
                .ok_or_else(|| PagewrightError::IndexOutOfRange {
                    what: self.name.clone(),
                    index,
                    len: elements.len(),
                })?;
            element.tag_name()?;
            Ok(element.clone())
        })
    }

    /// Visible text of every member
    pub fn texts(&self) -> PagewrightResult<Vec<String>> {
        with_live_list(self.locator.as_ref(), &self.name, |elements| {
            elements.iter().map(WebElement::text).collect()
        })
    }
}

/// Run `op` over the located members; a stale member drops the cached
/// resolution and the list is located once more
pub(crate) fn with_live_list<T>(
    locator: &dyn ElementLocator,
    name: &str,
    op: impl Fn(&[WebElement]) -> PagewrightResult<T>,
) -> PagewrightResult<T> {
    match op(&locator.find_elements()?) {
        Err(err) if err.is_stale() => {
            debug!(list = %name, "stale member, locating the list again");
            locator.invalidate();
            op(&locator.find_elements()?)
        }
        other => other,
    }
}

/// Located members, each confirmed to still be in the document
pub(crate) fn attached_members(
    locator: &dyn ElementLocator,
    name: &str,
) -> PagewrightResult<Vec<WebElement>> {
    with_live_list(locator, name, |elements| {
        for element in elements {
            element.tag_name()?;
        }
        Ok(elements.to_vec())
    })
}

// =============================================================================
// ELEMENT WAITS
// =============================================================================

/// Wait until `element` is no longer displayed or no longer attached
pub fn wait_for_disappear(
    element: &dyn Element,
    timeout: Duration,
    poll_interval: Duration,
) -> PagewrightResult<()> {
    let resolved = match element.resolve() {
        Ok(resolved) => resolved,
        Err(err) if err.is_locate_failure() => return Ok(()),
        Err(err) => return Err(err),
    };
    spin_wait_ensure_satisfied(
        || !resolved.is_displayed().unwrap_or(false),
        timeout,
        poll_interval,
        "Element is still displayed",
    )
}

/// Wait until the first element matching `by` is displayed
pub fn wait_visible(
    driver: &SharedDriver,
    by: &By,
    timeout: Duration,
    poll_interval: Duration,
) -> PagewrightResult<WebElement> {
    wait_for_match(
        driver,
        by,
        timeout,
        poll_interval,
        "visible",
        WebElement::is_displayed,
    )
}

/// Wait until the first element matching `by` is enabled
pub fn wait_enabled(
    driver: &SharedDriver,
    by: &By,
    timeout: Duration,
    poll_interval: Duration,
) -> PagewrightResult<WebElement> {
    wait_for_match(
        driver,
        by,
        timeout,
        poll_interval,
        "enabled",
        WebElement::is_enabled,
    )
}

fn wait_for_match(
    driver: &SharedDriver,
    by: &By,
    timeout: Duration,
    poll_interval: Duration,
    state: &str,
    check: fn(&WebElement) -> PagewrightResult<bool>,
) -> PagewrightResult<WebElement> {
    let mut found = None;
    spin_wait_ensure_satisfied(
        || {
            let first = by::find_all(driver.as_ref(), None, by)
                .ok()
                .and_then(|ids| ids.into_iter().next())
                .map(|id| WebElement::new(Arc::clone(driver), id));
            match first {
                Some(element) if check(&element).unwrap_or(false) => {
                    found = Some(element);
                    true
                }
                _ => false,
            }
        },
        timeout,
        poll_interval,
        &format!("Element {by} is not {state}"),
    )?;
    found.ok_or_else(|| PagewrightError::NotFound {
        selector: by.to_string(),
        timeout_ms: timeout.as_millis() as u64,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::WebDriver;
    use crate::locator::{DefaultElementLocator, SearchRoot};
    use crate::mock::{MockDriver, MockElement};

    fn setup() -> (Arc<MockDriver>, SharedDriver) {
        let mock = Arc::new(MockDriver::new());
        mock.load(
            MockElement::new("body")
                .child(MockElement::new("h1").id("title").text("Welcome"))
                .child(
                    MockElement::new("ul")
                        .id("items")
                        .child(MockElement::new("li").text("one"))
                        .child(MockElement::new("li").text("two")),
                ),
        );
        let shared: SharedDriver = mock.clone();
        (mock, shared)
    }

    fn lazy(driver: &SharedDriver, by: By, cache: bool) -> LazyElement {
        let locator = DefaultElementLocator::new(SearchRoot::Document(Arc::clone(driver)), by)
            .with_cache(cache);
        LazyElement::new(Arc::new(locator), "Title")
    }

    mod lazy_element_tests {
        use super::*;

        #[test]
        fn test_resolves_new_node_after_replacement() {
            let (mock, driver) = setup();
            let title = lazy(&driver, By::id("title"), false);
            let first = title.resolve().unwrap();
            assert_eq!(title.text().unwrap(), "Welcome");

            let goodbye = MockElement::new("h1").id("title").text("Goodbye");
            mock.replace(first.id(), goodbye).unwrap();

            let second = title.resolve().unwrap();
            assert_ne!(first, second);
            assert_eq!(title.text().unwrap(), "Goodbye");
        }

        #[test]
        fn test_cached_stale_handle_is_relocated_once() {
            let (mock, driver) = setup();
            let title = lazy(&driver, By::id("title"), true);
            let first = title.resolve().unwrap();
            mock.replace(first.id(), MockElement::new("h1").id("title").text("Fresh"))
                .unwrap();

            assert_eq!(title.text().unwrap(), "Fresh");
            assert_ne!(title.resolve().unwrap(), first);
        }

        #[test]
        fn test_cached_handle_is_reused() {
            let (mock, driver) = setup();
            let title = lazy(&driver, By::id("title"), true);
            title.text().unwrap();
            title.text().unwrap();
            assert_eq!(mock.find_count(), 1);
        }

        #[test]
        fn test_describe_contains_name_and_selector() {
            let (_, driver) = setup();
            let title = lazy(&driver, By::id("title"), false);
            let text = title.describe();
            assert!(text.contains("Title"));
            assert!(text.contains("By.id: title"));
        }

        #[test]
        fn test_web_element_has_no_timeout_view() {
            let (_, driver) = setup();
            let element = lazy(&driver, By::id("title"), false).resolve().unwrap();
            assert!(element.with_timeout(Duration::from_millis(1)).is_none());
        }
    }

    mod lazy_list_tests {
        use super::*;

        #[test]
        fn test_list_tracks_dom_changes() {
            let (mock, driver) = setup();
            let locator = DefaultElementLocator::new(
                SearchRoot::Document(Arc::clone(&driver)),
                By::css("#items li"),
            );
            let items = LazyElementList::new(Arc::new(locator), "Items");
            assert_eq!(items.texts().unwrap(), vec!["one", "two"]);

            let list = mock.first(&By::id("items")).unwrap();
            let three = MockElement::new("li").text("three");
            mock.append_to(&list, three).unwrap();
            assert_eq!(items.len().unwrap(), 3);
        }

        #[test]
        fn test_cached_list_recovers_from_replaced_member() {
            let (mock, driver) = setup();
            let locator = DefaultElementLocator::new(
                SearchRoot::Document(Arc::clone(&driver)),
                By::tag_name("li"),
            )
            .with_cache(true);
            let items = LazyElementList::new(Arc::new(locator), "Items");
            assert_eq!(items.texts().unwrap(), vec!["one", "two"]);

            let stale = items.get(0).unwrap();
            mock.replace(stale.id(), MockElement::new("li").text("uno"))
                .unwrap();

            assert_eq!(items.texts().unwrap(), vec!["uno", "two"]);
            assert_ne!(items.get(0).unwrap(), stale);
            assert_eq!(items.elements().unwrap().len(), 2);
        }

        #[test]
        fn test_cached_list_get_and_len_after_replace() {
            let (mock, driver) = setup();
            let locator = DefaultElementLocator::new(
                SearchRoot::Document(Arc::clone(&driver)),
                By::tag_name("li"),
            )
            .with_cache(true);
            let items = LazyElementList::new(Arc::new(locator), "Items");
            let second = items.get(1).unwrap();
            mock.replace(second.id(), MockElement::new("li").text("dos"))
                .unwrap();

            assert_eq!(items.len().unwrap(), 2);
            assert_eq!(items.get(1).unwrap().text().unwrap(), "dos");
        }

        #[test]
        fn test_get_out_of_range() {
            let (_, driver) = setup();
            let locator =
                DefaultElementLocator::new(SearchRoot::Document(driver), By::tag_name("li"));
            let items = LazyElementList::new(Arc::new(locator), "Items");
            let err = items.get(5).unwrap_err();
            assert!(matches!(err, PagewrightError::IndexOutOfRange { index: 5, .. }));
        }
    }

    mod wait_tests {
        use super::*;

        #[test]
        fn test_wait_for_disappear_on_hidden_element() {
            let (mock, driver) = setup();
            let title = lazy(&driver, By::id("title"), false);
            let id = title.resolve().unwrap().id().clone();
            mock.set_displayed(&id, false).unwrap();
            let (timeout, poll) = (Duration::from_millis(50), Duration::from_millis(10));
            wait_for_disappear(&title, timeout, poll).unwrap();
        }

        #[test]
        fn test_wait_visible_times_out() {
            let (mock, driver) = setup();
            let id = mock.first(&By::id("title")).unwrap();
            mock.set_displayed(&id, false).unwrap();
            let err = wait_visible(
                &driver,
                &By::id("title"),
                Duration::from_millis(30),
                Duration::from_millis(10),
            )
            .unwrap_err();
            assert!(matches!(err, PagewrightError::Timeout { .. }));
        }

        #[test]
        fn test_wait_enabled_returns_element() {
            let (_, driver) = setup();
            let element = wait_enabled(
                &driver,
                &By::id("title"),
                Duration::from_millis(30),
                Duration::from_millis(10),
            )
            .unwrap();
            assert_eq!(driver.tag_name(element.id()).unwrap(), "h1");
        }
    }
}
