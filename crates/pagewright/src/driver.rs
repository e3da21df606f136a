//! The WebDriver seam.
//!
//! Everything above this module talks to a browser session through the
//! [`WebDriver`] trait. Two implementations ship with the crate: the
//! in-memory [`MockDriver`](crate::mock::MockDriver) and, behind the
//! `browser` feature, the Chromium DevTools driver in [`crate::cdp`].

use crate::by::By;
use crate::result::PagewrightResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque handle to a DOM node inside a driver session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub String);

impl ElementId {
    /// Create a handle from a driver-specific id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Driver-specific id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Browser cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain, if restricted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Path, if restricted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Cookie {
    /// Create a session cookie
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }

    /// Restrict to a domain
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Restrict to a path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Argument passed to `execute_script`
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptArg {
    /// Plain JSON value
    Value(serde_json::Value),
    /// Element, visible to the script as a DOM node
    Element(ElementId),
}

impl From<serde_json::Value> for ScriptArg {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl From<ElementId> for ScriptArg {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

impl From<&str> for ScriptArg {
    fn from(value: &str) -> Self {
        Self::Value(serde_json::Value::String(value.to_string()))
    }
}

/// Special keys understood by `send_keys`
#[derive(Debug, Clone, Copy)]
pub struct Keys;

impl Keys {
    /// Backspace
    pub const BACKSPACE: &'static str = "\u{E003}";
    /// Tab
    pub const TAB: &'static str = "\u{E004}";
    /// Enter
    pub const ENTER: &'static str = "\u{E007}";
    /// Control modifier
    pub const CONTROL: &'static str = "\u{E009}";
    /// Delete
    pub const DELETE: &'static str = "\u{E017}";
}

/// A synchronous browser session.
///
/// Element operations on a handle whose node has been detached fail with
/// [`PagewrightError::StaleReference`](crate::PagewrightError::StaleReference).
/// `find_elements` is only ever called with primitive selectors; composite
/// ones are expanded by [`crate::by::find_all`].
pub trait WebDriver: Send + Sync + fmt::Debug {
    // Navigation
    fn navigate(&self, url: &str) -> PagewrightResult<()>;
    fn current_url(&self) -> PagewrightResult<String>;
    fn title(&self) -> PagewrightResult<String>;
    fn back(&self) -> PagewrightResult<()>;
    fn forward(&self) -> PagewrightResult<()>;
    fn refresh(&self) -> PagewrightResult<()>;

    // Search
    fn find_elements(&self, root: Option<&ElementId>, by: &By) -> PagewrightResult<Vec<ElementId>>;

    // Element operations
    fn click(&self, element: &ElementId) -> PagewrightResult<()>;
    fn clear(&self, element: &ElementId) -> PagewrightResult<()>;
    fn send_keys(&self, element: &ElementId, keys: &str) -> PagewrightResult<()>;
    fn submit(&self, element: &ElementId) -> PagewrightResult<()>;
    fn text(&self, element: &ElementId) -> PagewrightResult<String>;
    fn tag_name(&self, element: &ElementId) -> PagewrightResult<String>;
    fn attribute(&self, element: &ElementId, name: &str) -> PagewrightResult<Option<String>>;
    fn css_value(&self, element: &ElementId, property: &str) -> PagewrightResult<String>;
    fn is_displayed(&self, element: &ElementId) -> PagewrightResult<bool>;
    fn is_enabled(&self, element: &ElementId) -> PagewrightResult<bool>;
    fn is_selected(&self, element: &ElementId) -> PagewrightResult<bool>;

    // Scripts
    fn execute_script(&self, script: &str, args: &[ScriptArg])
        -> PagewrightResult<serde_json::Value>;

    // Cookies
    fn cookies(&self) -> PagewrightResult<Vec<Cookie>>;
    fn add_cookie(&self, cookie: Cookie) -> PagewrightResult<()>;
    fn delete_cookie(&self, name: &str) -> PagewrightResult<()>;
    fn delete_all_cookies(&self) -> PagewrightResult<()>;

    // Windows
    fn window_handles(&self) -> PagewrightResult<Vec<String>>;
    fn current_window(&self) -> PagewrightResult<String>;
    fn switch_to_window(&self, handle: &str) -> PagewrightResult<()>;

    // Alerts
    fn alert_text(&self) -> PagewrightResult<String>;
    fn accept_alert(&self) -> PagewrightResult<()>;
    fn dismiss_alert(&self) -> PagewrightResult<()>;

    /// PNG screenshot of the current viewport
    fn screenshot_png(&self) -> PagewrightResult<Vec<u8>>;

    /// Close the current window
    fn close(&self) -> PagewrightResult<()>;

    /// End the session
    fn quit(&self) -> PagewrightResult<()>;
}

/// Shared driver handle
pub type SharedDriver = Arc<dyn WebDriver>;
