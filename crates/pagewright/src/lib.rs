//! Pagewright: page objects for browser UI tests
//!
//! Pagewright turns plain Rust structs into page objects whose members are
//! lazy, AJAX-aware element proxies. Every interaction re-locates its element,
//! so pages that re-render between steps never hand out stale references.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     PAGEWRIGHT Architecture                      │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐             │
//! │  │ Page object │   │ Lazy        │   │ Ajax        │   WebDriver │
//! │  │ (derive)    │──►│ elements    │──►│ locators    │──► (CDP or  │
//! │  │             │   │ + wrappers  │   │ + handlers  │     mock)   │
//! │  └─────────────┘   └─────────────┘   └─────────────┘             │
//! │  ┌─────────────┐   ┌─────────────┐                               │
//! │  │ Verify      │   │ Test data   │                               │
//! │  │ (soft)      │   │ + tokens    │                               │
//! │  └─────────────┘   └─────────────┘                               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pagewright::prelude::*;
//!
//! #[derive(PageObject)]
//! struct LoginPage {
//!     #[find(id = "user")]
//!     user: TextInput,
//!     #[find(css = "button[type=submit]", label = "Sign in")]
//!     submit: Button,
//! }
//!
//! let browser = Browser::chromium(FrameworkConfig::from_env()?);
//! browser.open("/login")?;
//! let page: LoginPage = browser.page_factory(ErrorHandlers::new())?.create()?;
//! page.user.send_keys("admin")?;
//! page.submit.click()?;
//! ```

#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

// Lets the derive macros name `::pagewright` from inside this crate's tests
extern crate self as pagewright;

pub mod browser;
pub mod by;
#[cfg(feature = "browser")]
pub mod cdp;
pub mod config;
pub mod context;
pub mod driver;
pub mod element;
pub mod elements;
pub mod error_handler;
pub mod locator;
pub mod mock;
pub mod page_object;
pub mod result;
pub mod test_data;
pub mod verify;
pub mod wait;

pub use browser::{Browser, DriverFactory, SharedDriverFactory};
pub use by::By;
#[cfg(feature = "browser")]
pub use cdp::CdpDriver;
pub use config::{BrowserKind, FrameworkConfig};
pub use context::{Outcome, TestContext, TestReport};
pub use driver::{Cookie, ElementId, Keys, ScriptArg, SharedDriver, WebDriver};
pub use element::{Element, ElementRef, LazyElement, LazyElementList, WebElement};
pub use error_handler::{AlertDismissHandler, ErrorHandler, ErrorHandlers, ModalDismissHandler};
pub use locator::{
    AjaxElementLocator, DefaultElementLocator, ElementLocator, IndexedElementLocator,
    LocatorSettings, SearchRoot,
};
pub use mock::{MockDriver, MockElement};
pub use page_object::{
    element_name, AjaxLocatorFactory, Component, ComponentList, Decorate, FieldSpec, PageFactory,
    PageObject, Populator, TypedList,
};
pub use result::{PagewrightError, PagewrightResult};
pub use test_data::{
    DirectoryStore, EmbeddedStore, FilesTestDataReader, JsonTestDataReader, PlaceholderEngine,
    ResourceStore,
};
pub use verify::{AggregateVerificationFailure, Verify, VerifyFailure};
pub use wait::{WaitOptions, WaitResult, Waiter};

#[cfg(feature = "derive")]
pub use pagewright_derive::{Component, PageObject};

/// Everything a page-object test usually needs
pub mod prelude {
    pub use super::browser::*;
    pub use super::by::By;
    pub use super::config::*;
    pub use super::context::*;
    pub use super::element::{Element, LazyElement, LazyElementList, WebElement};
    pub use super::elements::*;
    pub use super::error_handler::*;
    pub use super::page_object::*;
    pub use super::result::*;
    pub use super::test_data::{
        DirectoryStore, EmbeddedStore, FilesTestDataReader, JsonTestDataReader,
        PlaceholderEngine, TestDataRecord,
    };
    pub use super::verify::*;

    #[cfg(feature = "derive")]
    pub use pagewright_derive::{Component, PageObject};
}
