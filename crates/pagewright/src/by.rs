//! Selector strategies.

use crate::driver::{ElementId, WebDriver};
use crate::result::PagewrightResult;
use std::fmt;

/// How an element is looked up
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum By {
    /// `id` attribute
    Id(String),
    /// `name` attribute
    Name(String),
    /// Single class name
    ClassName(String),
    /// Tag name
    TagName(String),
    /// CSS selector
    Css(String),
    /// XPath expression
    XPath(String),
    /// Exact link text
    LinkText(String),
    /// Link text substring
    PartialLinkText(String),
    /// Elements whose id matches, followed by elements whose name matches
    IdOrName(String),
    /// Each selector searched within the results of the previous one
    Chained(Vec<By>),
}

impl By {
    /// Select by `id`
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }

    /// Select by `name`
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::Name(value.into())
    }

    /// Select by class name
    #[must_use]
    pub fn class_name(value: impl Into<String>) -> Self {
        Self::ClassName(value.into())
    }

    /// Select by tag name
    #[must_use]
    pub fn tag_name(value: impl Into<String>) -> Self {
        Self::TagName(value.into())
    }

    /// Select by CSS selector
    #[must_use]
    pub fn css(value: impl Into<String>) -> Self {
        Self::Css(value.into())
    }

    /// Select by XPath
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::XPath(value.into())
    }

    /// Select links by their exact text
    #[must_use]
    pub fn link_text(value: impl Into<String>) -> Self {
        Self::LinkText(value.into())
    }

    /// Select links whose text contains `value`
    #[must_use]
    pub fn partial_link_text(value: impl Into<String>) -> Self {
        Self::PartialLinkText(value.into())
    }

    /// Select by id, then by name
    #[must_use]
    pub fn id_or_name(value: impl Into<String>) -> Self {
        Self::IdOrName(value.into())
    }

    /// Chain selectors, each narrowing the previous
    #[must_use]
    pub fn chained(steps: impl IntoIterator<Item = By>) -> Self {
        Self::Chained(steps.into_iter().collect())
    }

    /// Whether a driver can evaluate this selector directly
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        !matches!(self, Self::IdOrName(_) | Self::Chained(_))
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(v) => write!(f, "By.id: {v}"),
            Self::Name(v) => write!(f, "By.name: {v}"),
            Self::ClassName(v) => write!(f, "By.className: {v}"),
            Self::TagName(v) => write!(f, "By.tagName: {v}"),
            Self::Css(v) => write!(f, "By.cssSelector: {v}"),
            Self::XPath(v) => write!(f, "By.xpath: {v}"),
            Self::LinkText(v) => write!(f, "By.linkText: {v}"),
            Self::PartialLinkText(v) => write!(f, "By.partialLinkText: {v}"),
            Self::IdOrName(v) => write!(f, "By.idOrName: {v}"),
            Self::Chained(steps) => {
                write!(f, "By.chained(")?;
                for (i, step) in steps.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{step}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Find every element matching `by` under `root` (the document when `None`).
///
/// Composite strategies are expanded here so drivers only ever see
/// primitive selectors.
pub fn find_all(
    driver: &dyn WebDriver,
    root: Option<&ElementId>,
    by: &By,
) -> PagewrightResult<Vec<ElementId>> {
    match by {
        By::IdOrName(value) => {
            let mut found = driver.find_elements(root, &By::Id(value.clone()))?;
            for id in driver.find_elements(root, &By::Name(value.clone()))? {
                if !found.contains(&id) {
                    found.push(id);
                }
            }
            Ok(found)
        }
        By::Chained(steps) => {
            let Some((first, rest)) = steps.split_first() else {
                return Ok(Vec::new());
            };
            let mut current = find_all(driver, root, first)?;
            for step in rest {
                let mut next = Vec::new();
                for parent in &current {
                    for id in find_all(driver, Some(parent), step)? {
                        if !next.contains(&id) {
                            next.push(id);
                        }
                    }
                }
                current = next;
            }
            Ok(current)
        }
        primitive => driver.find_elements(root, primitive),
    }
}
