//! Page object population.
//!
//! A page object is a plain struct whose members are lazy elements, typed
//! element wrappers, lists of either, or nested components. Each member is
//! described by a [`FieldSpec`]; a [`Populator`] turns the spec into a lazily
//! locating member through an [`AjaxLocatorFactory`].
//!
//! Usually the [`PageObject`] and [`Component`] impls come from the derive
//! macros:
//!
//! ```ignore
//! #[derive(PageObject)]
//! struct SearchPage {
//!     #[find(css = "input.query")]
//!     query: TextInput,
//!     #[find(id = "go", label = "Search")]
//!     search: Button,
//!     results: Option<ResultsBlock>,
//! }
//!
//! let page: SearchPage = browser.page_factory(handlers)?.create()?;
//! ```
//!
//! Selector resolution: an explicit selector wins, then the component type's
//! default selector, then `IdOrName(field_name)` for elements and lists.
//! A component with neither is unresolvable: an `Option` member is left
//! `None`, any other member fails with
//! [`PagewrightError::Unresolvable`](crate::PagewrightError::Unresolvable).

use crate::by::By;
use crate::driver::SharedDriver;
use crate::element::{attached_members, ElementRef, LazyElement, LazyElementList};
use crate::elements::TypedElement;
use crate::error_handler::ErrorHandlers;
use crate::locator::{
    AjaxElementLocator, DefaultElementLocator, ElementLocator, IndexedElementLocator,
    LocatorSettings, SearchRoot,
};
use crate::result::{PagewrightError, PagewrightResult};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

// =============================================================================
// FIELD SPEC
// =============================================================================

/// Declared locating metadata of one page object member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: String,
    pub by: Option<By>,
    pub label: Option<String>,
    pub cache: bool,
    pub timeout: Option<Duration>,
}

impl FieldSpec {
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            by: None,
            label: None,
            cache: false,
            timeout: None,
        }
    }

    #[must_use]
    pub fn by(mut self, by: By) -> Self {
        self.by = Some(by);
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Keep the first resolution
    #[must_use]
    pub const fn cached(mut self) -> Self {
        self.cache = true;
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Human name: field label, then `type_label`, then the field name in
    /// Title Case
    #[must_use]
    pub fn display_name(&self, type_label: Option<&str>) -> String {
        self.label
            .clone()
            .or_else(|| type_label.map(str::to_string))
            .unwrap_or_else(|| element_name(&self.field))
    }

    fn selector_or_default(&self) -> By {
        self.by
            .clone()
            .unwrap_or_else(|| By::id_or_name(self.field.clone()))
    }
}

/// "search_button" and "searchButton" both become "Search Button"
#[must_use]
pub fn element_name(field: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in field.trim_start_matches("r#").chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// LOCATOR FACTORY
// =============================================================================

/// Builds polling locators against one search root
#[derive(Debug, Clone)]
pub struct AjaxLocatorFactory {
    root: SearchRoot,
    settings: LocatorSettings,
    handlers: ErrorHandlers,
}

impl AjaxLocatorFactory {
    #[must_use]
    pub fn new(root: SearchRoot, settings: LocatorSettings, handlers: ErrorHandlers) -> Self {
        Self {
            root,
            settings,
            handlers,
        }
    }

    /// Same settings and handlers, searching below `root`
    #[must_use]
    pub fn scoped(&self, root: ElementRef) -> Self {
        Self {
            root: SearchRoot::Element(root),
            settings: self.settings,
            handlers: self.handlers.clone(),
        }
    }

    #[must_use]
    pub const fn root(&self) -> &SearchRoot {
        &self.root
    }

    #[must_use]
    pub const fn settings(&self) -> &LocatorSettings {
        &self.settings
    }

    #[must_use]
    pub const fn handlers(&self) -> &ErrorHandlers {
        &self.handlers
    }

    /// Locator for `by`, honouring the member's cache flag and timeout
    #[must_use]
    pub fn locator(
        &self,
        by: By,
        cache: bool,
        timeout: Option<Duration>,
    ) -> Arc<dyn ElementLocator> {
        let inner = DefaultElementLocator::new(self.root.clone(), by).with_cache(cache);
        let settings = timeout.map_or(self.settings, |t| self.settings.with_timeout(t));
        Arc::new(AjaxElementLocator::new(Arc::new(inner), settings, self.handlers.clone()))
    }

    fn locator_for(&self, by: By, spec: &FieldSpec) -> Arc<dyn ElementLocator> {
        self.locator(by, spec.cache, spec.timeout)
    }
}

// =============================================================================
// POPULATION TRAITS
// =============================================================================

/// A page: a struct whose members are populated from one locator factory
pub trait PageObject: Sized {
    fn populate(populator: &mut Populator<'_>) -> PagewrightResult<Self>;

    /// Name used in logs
    fn page_name() -> String {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full).to_string()
    }
}

/// A composite element: populated below its own root element
pub trait Component: Sized {
    /// Selector used when the member does not declare one
    fn default_selector() -> Option<By> {
        None
    }

    /// Human name used when the member has no label
    fn label() -> Option<&'static str> {
        None
    }

    /// Build the component; `populator` searches below `root`
    fn from_root(root: LazyElement, populator: &mut Populator<'_>) -> PagewrightResult<Self>;
}

/// A member type the populator knows how to build.
///
/// `Ok(None)` means the member has no resolvable selector.
pub trait Decorate: Sized {
    fn decorate(populator: &mut Populator<'_>, spec: &FieldSpec) -> PagewrightResult<Option<Self>>;
}

impl<T: Decorate> Decorate for Option<T> {
    fn decorate(
        populator: &mut Populator<'_>,
        spec: &FieldSpec,
    ) -> PagewrightResult<Option<Self>> {
        Ok(Some(T::decorate(populator, spec)?))
    }
}

impl Decorate for LazyElement {
    fn decorate(
        populator: &mut Populator<'_>,
        spec: &FieldSpec,
    ) -> PagewrightResult<Option<Self>> {
        Ok(Some(populator.element(spec)))
    }
}

impl Decorate for LazyElementList {
    fn decorate(
        populator: &mut Populator<'_>,
        spec: &FieldSpec,
    ) -> PagewrightResult<Option<Self>> {
        Ok(Some(populator.elements(spec)))
    }
}

impl<T: TypedElement> Decorate for TypedList<T> {
    fn decorate(
        populator: &mut Populator<'_>,
        spec: &FieldSpec,
    ) -> PagewrightResult<Option<Self>> {
        Ok(Some(populator.typed_list(spec)))
    }
}

impl<C: Component> Decorate for ComponentList<C> {
    fn decorate(
        populator: &mut Populator<'_>,
        spec: &FieldSpec,
    ) -> PagewrightResult<Option<Self>> {
        Ok(populator.component_list(spec))
    }
}

// =============================================================================
// POPULATOR
// =============================================================================

/// Builds page object members from one locator factory
#[derive(Debug)]
pub struct Populator<'a> {
    factory: &'a AjaxLocatorFactory,
    unresolved: Vec<String>,
}

impl<'a> Populator<'a> {
    #[must_use]
    pub fn new(factory: &'a AjaxLocatorFactory) -> Self {
        Self {
            factory,
            unresolved: Vec::new(),
        }
    }

    #[must_use]
    pub const fn factory(&self) -> &AjaxLocatorFactory {
        self.factory
    }

    /// Members left unset so far, as dotted paths
    #[must_use]
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// Build one member of type `T`
    pub fn field<T: Decorate>(&mut self, spec: FieldSpec) -> PagewrightResult<T> {
        T::decorate(self, &spec)?.ok_or(PagewrightError::Unresolvable { field: spec.field })
    }

    pub fn element(&mut self, spec: &FieldSpec) -> LazyElement {
        let locator = self.factory.locator_for(spec.selector_or_default(), spec);
        LazyElement::new(locator, spec.display_name(None))
    }

    pub fn elements(&mut self, spec: &FieldSpec) -> LazyElementList {
        let locator = self.factory.locator_for(spec.selector_or_default(), spec);
        LazyElementList::new(locator, spec.display_name(None))
    }

    pub fn typed<T: TypedElement>(&mut self, spec: &FieldSpec) -> T {
        let element = self.element(spec);
        let name = element.name().to_string();
        T::from_element(Arc::new(element), name)
    }

    pub fn typed_list<T: TypedElement>(&mut self, spec: &FieldSpec) -> TypedList<T> {
        let locator = self.factory.locator_for(spec.selector_or_default(), spec);
        TypedList::new(locator, spec.display_name(None))
    }

    /// Nested component scoped to its own root; `None` without a selector
    pub fn component<C: Component>(&mut self, spec: &FieldSpec) -> PagewrightResult<Option<C>> {
        let Some(by) = spec.by.clone().or_else(C::default_selector) else {
            debug!(field = %spec.field, "component has no selector");
            self.unresolved.push(spec.field.clone());
            return Ok(None);
        };
        let root = LazyElement::new(
            self.factory.locator_for(by, spec),
            spec.display_name(C::label()),
        );
        let scoped = self.factory.scoped(Arc::new(root.clone()));
        let mut nested = Populator::new(&scoped);
        let component = C::from_root(root, &mut nested)?;
        self.unresolved.extend(
            nested
                .unresolved
                .into_iter()
                .map(|inner| format!("{}.{inner}", spec.field)),
        );
        Ok(Some(component))
    }

    pub fn component_list<C: Component>(&mut self, spec: &FieldSpec) -> Option<ComponentList<C>> {
        let Some(by) = spec.by.clone().or_else(C::default_selector) else {
            self.unresolved.push(spec.field.clone());
            return None;
        };
        Some(ComponentList::new(
            self.factory.locator_for(by, spec),
            self.factory.clone(),
            spec.display_name(C::label()),
        ))
    }
}

// =============================================================================
// LISTS
// =============================================================================

/// List of typed elements, re-resolved on every call
pub struct TypedList<T> {
    locator: Arc<dyn ElementLocator>,
    name: String,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Clone for TypedList<T> {
    fn clone(&self) -> Self {
        Self {
            locator: Arc::clone(&self.locator),
            name: self.name.clone(),
            _kind: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TypedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedList")
            .field("name", &self.name)
            .field("locator", &self.locator.describe())
            .finish()
    }
}

impl<T: TypedElement> TypedList<T> {
    #[must_use]
    pub fn new(locator: Arc<dyn ElementLocator>, name: impl Into<String>) -> Self {
        Self {
            locator,
            name: name.into(),
            _kind: PhantomData,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members currently matching; a stale cached list is located again
    pub fn len(&self) -> PagewrightResult<usize> {
        Ok(attached_members(self.locator.as_ref(), &self.name)?.len())
    }

    pub fn is_empty(&self) -> PagewrightResult<bool> {
        Ok(self.len()? == 0)
    }

    fn member(&self, index: usize) -> T {
        let name = format!("{} [{index}]", self.name);
        let locator = Arc::new(IndexedElementLocator::new(Arc::clone(&self.locator), index));
        T::from_element(Arc::new(LazyElement::new(locator, name.clone())), name)
    }

    /// One wrapper per element currently matching
    pub fn items(&self) -> PagewrightResult<Vec<T>> {
        Ok((0..self.len()?).map(|i| self.member(i)).collect())
    }

    pub fn get(&self, index: usize) -> PagewrightResult<T> {
        let len = self.len()?;
        if index >= len {
            return Err(PagewrightError::IndexOutOfRange {
                what: self.name.clone(),
                index,
                len,
            });
        }
        Ok(self.member(index))
    }
}

/// List of components, each rooted at one matching element
pub struct ComponentList<C> {
    locator: Arc<dyn ElementLocator>,
    factory: AjaxLocatorFactory,
    name: String,
    _kind: PhantomData<fn() -> C>,
}

impl<C> fmt::Debug for ComponentList<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentList")
            .field("name", &self.name)
            .field("locator", &self.locator.describe())
            .finish()
    }
}

impl<C: Component> ComponentList<C> {
    #[must_use]
    pub fn new(
        locator: Arc<dyn ElementLocator>,
        factory: AjaxLocatorFactory,
        name: impl Into<String>,
    ) -> Self {
        Self {
            locator,
            factory,
            name: name.into(),
            _kind: PhantomData,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members currently matching; a stale cached list is located again
    pub fn len(&self) -> PagewrightResult<usize> {
        Ok(attached_members(self.locator.as_ref(), &self.name)?.len())
    }

    pub fn is_empty(&self) -> PagewrightResult<bool> {
        Ok(self.len()? == 0)
    }

    fn member(&self, index: usize) -> PagewrightResult<C> {
        let locator = Arc::new(IndexedElementLocator::new(Arc::clone(&self.locator), index));
        let root = LazyElement::new(locator, format!("{} [{index}]", self.name));
        let scoped = self.factory.scoped(Arc::new(root.clone()));
        C::from_root(root, &mut Populator::new(&scoped))
    }

    /// Populate one component per element currently matching
    pub fn items(&self) -> PagewrightResult<Vec<C>> {
        (0..self.len()?).map(|i| self.member(i)).collect()
    }

    pub fn get(&self, index: usize) -> PagewrightResult<C> {
        let len = self.len()?;
        if index >= len {
            return Err(PagewrightError::IndexOutOfRange {
                what: self.name.clone(),
                index,
                len,
            });
        }
        self.member(index)
    }
}

// =============================================================================
// PAGE FACTORY
// =============================================================================

/// Creates page objects bound to one session
#[derive(Debug, Clone)]
pub struct PageFactory {
    driver: SharedDriver,
    settings: LocatorSettings,
    handlers: ErrorHandlers,
}

impl PageFactory {
    #[must_use]
    pub fn new(driver: SharedDriver) -> Self {
        Self {
            driver,
            settings: LocatorSettings::default(),
            handlers: ErrorHandlers::new(),
        }
    }

    #[must_use]
    pub const fn with_settings(mut self, settings: LocatorSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_handlers(mut self, handlers: ErrorHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    #[must_use]
    pub fn driver(&self) -> SharedDriver {
        Arc::clone(&self.driver)
    }

    /// Locator factory searching the whole document
    #[must_use]
    pub fn locator_factory(&self) -> AjaxLocatorFactory {
        AjaxLocatorFactory::new(
            SearchRoot::Document(Arc::clone(&self.driver)),
            self.settings,
            self.handlers.clone(),
        )
    }

    /// Populate a page searching the whole document
    pub fn create<P: PageObject>(&self) -> PagewrightResult<P> {
        Self::populate(&self.locator_factory())
    }

    /// Populate a page searching below `root`
    pub fn create_within<P: PageObject>(&self, root: ElementRef) -> PagewrightResult<P> {
        Self::populate(&self.locator_factory().scoped(root))
    }

    fn populate<P: PageObject>(factory: &AjaxLocatorFactory) -> PagewrightResult<P> {
        let mut populator = Populator::new(factory);
        let page = P::populate(&mut populator)?;
        if !populator.unresolved.is_empty() {
            warn!(
                page = %P::page_name(),
                members = ?populator.unresolved,
                "members without selector left unset"
            );
        }
        debug!(page = %P::page_name(), "page populated");
        Ok(page)
    }
}
