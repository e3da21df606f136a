//! Typed element wrappers.
//!
//! Each wrapper holds one (usually lazy) element and its human name, and
//! exposes the operations that make sense for that kind of control. Actions
//! are logged at `info!` with the element's name.

mod button;
mod checkbox;
mod file_input;
mod form;
mod icon;
mod link;
mod radio;
mod select;
mod table;
mod text_block;
mod text_input;

pub use button::Button;
pub use checkbox::CheckBox;
pub use file_input::FileInput;
pub use form::Form;
pub use icon::Icon;
pub use link::Link;
pub use radio::Radio;
pub use select::Select;
pub use table::Table;
pub use text_block::TextBlock;
pub use text_input::TextInput;

use crate::element::{ElementRef, WebElement};
use crate::result::PagewrightResult;
use crate::wait::{spin_wait, try_action};
use std::fmt;
use std::time::Duration;
use tracing::info;

/// How long `is_enabled` waits for the element to become enabled
pub const ENABLED_TIMEOUT: Duration = Duration::from_secs(10);
const ENABLED_POLL: Duration = Duration::from_millis(250);

const KEYUP_SCRIPT: &str = "$(arguments[0]).keyup();";

/// Element plus human name, shared by every wrapper
#[derive(Debug, Clone)]
pub struct Typified {
    element: ElementRef,
    name: String,
}

impl Typified {
    #[must_use]
    pub fn new(element: ElementRef, name: impl Into<String>) -> Self {
        Self {
            element,
            name: name.into(),
        }
    }

    #[must_use]
    pub const fn element(&self) -> &ElementRef {
        &self.element
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Best-effort jQuery `keyup` so listeners notice typed text
    pub(crate) fn fire_keyup(&self) {
        let fired = try_action(|| {
            let resolved = self.element.resolve()?;
            self.element
                .driver()
                .execute_script(KEYUP_SCRIPT, &[resolved.as_arg()])
        });
        if !fired {
            tracing::debug!(element = %self.name, "keyup not fired");
        }
    }
}

/// Common surface of the typed wrappers
pub trait TypedElement: Send + Sync + fmt::Debug {
    /// Wrap `element` under `name`
    fn from_element(element: ElementRef, name: String) -> Self
    where
        Self: Sized;

    fn typified(&self) -> &Typified;

    fn name(&self) -> &str {
        self.typified().name()
    }

    fn element(&self) -> &ElementRef {
        self.typified().element()
    }

    /// Freshly located handle
    fn resolve(&self) -> PagewrightResult<WebElement> {
        self.element().resolve()
    }

    /// `false` on any failure, including a failed locate
    fn is_displayed(&self) -> bool {
        self.element().is_displayed().unwrap_or(false)
    }

    /// Displayed state, locating with `timeout` and no error handling
    fn displayed_with_timeout(&self, timeout: Duration) -> bool {
        match self.element().with_timeout(timeout) {
            Some(view) => view.is_displayed().unwrap_or(false),
            None => self.is_displayed(),
        }
    }

    /// Enabled state after waiting up to [`ENABLED_TIMEOUT`] for it
    fn is_enabled(&self) -> PagewrightResult<bool> {
        info!("Check if element {} enabled", self.name());
        spin_wait(
            || self.element().is_enabled().unwrap_or(false),
            ENABLED_TIMEOUT,
            ENABLED_POLL,
        );
        self.element().is_enabled()
    }

    /// Enabled unless the element carries a `disabled` class
    fn is_enabled_by_class(&self) -> PagewrightResult<bool> {
        Ok(!self
            .element()
            .attribute("class")?
            .unwrap_or_default()
            .split_whitespace()
            .any(|class| class == "disabled"))
    }

    fn is_selected(&self) -> PagewrightResult<bool> {
        self.element().is_selected()
    }

    fn value(&self) -> PagewrightResult<Option<String>> {
        self.element().attribute("value")
    }

    fn attribute(&self, name: &str) -> PagewrightResult<Option<String>> {
        self.element().attribute(name)
    }

    fn css_value(&self, property: &str) -> PagewrightResult<String> {
        self.element().css_value(property)
    }
}

/// Declare a wrapper struct around [`Typified`] that page objects can hold.
///
/// ```ignore
/// typed_element! {
///     /// Star rating widget
///     Rating
/// }
///
/// impl Rating {
///     pub fn stars(&self) -> PagewrightResult<usize> { ... }
/// }
/// ```
#[macro_export]
macro_rules! typed_element {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            inner: $crate::elements::Typified,
        }

        impl $crate::elements::TypedElement for $name {
            fn from_element(element: $crate::element::ElementRef, name: String) -> Self {
                Self {
                    inner: $crate::elements::Typified::new(element, name),
                }
            }

            fn typified(&self) -> &$crate::elements::Typified {
                &self.inner
            }
        }

        impl $crate::page_object::Decorate for $name {
            fn decorate(
                populator: &mut $crate::page_object::Populator<'_>,
                spec: &$crate::page_object::FieldSpec,
            ) -> $crate::result::PagewrightResult<Option<Self>> {
                Ok(Some(populator.typed(spec)))
            }
        }
    };
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::by::By;
    use crate::driver::SharedDriver;
    use crate::element::LazyElement;
    use crate::error_handler::ErrorHandlers;
    use crate::locator::{AjaxElementLocator, DefaultElementLocator, LocatorSettings, SearchRoot};
    use crate::mock::{MockDriver, MockElement};
    use std::sync::Arc;

    pub fn mock_with(document: MockElement) -> Arc<MockDriver> {
        let mock = Arc::new(MockDriver::new());
        mock.load(document);
        mock
    }

    /// Wrapper of type `T` over a lazy element found by `by`
    pub fn typed<T: TypedElement>(mock: &Arc<MockDriver>, by: By, name: &str) -> T {
        let driver: SharedDriver = mock.clone();
        let settings = LocatorSettings::default()
            .with_timeout(Duration::from_millis(30))
            .with_poll_interval(Duration::from_millis(5));
        let locator = AjaxElementLocator::new(
            Arc::new(DefaultElementLocator::new(SearchRoot::Document(driver), by)),
            settings,
            ErrorHandlers::new(),
        );
        let element = LazyElement::new(Arc::new(locator), name);
        T::from_element(Arc::new(element), name.to_string())
    }
}
