use super::TypedElement;
use crate::by::{self, By};
use crate::element::{Element, WebElement};
use crate::result::{PagewrightError, PagewrightResult};
use std::sync::Arc;
use tracing::info;

crate::typed_element! {
    /// Radio button group, addressed through any one of its buttons
    Radio
}

impl Radio {
    /// Every radio in the document sharing this button's `name`
    pub fn buttons(&self) -> PagewrightResult<Vec<WebElement>> {
        let selector = match self.element().attribute("name")? {
            Some(name) => By::css(format!("input[type=\"radio\"][name=\"{name}\"]")),
            None => By::css("input[type=\"radio\"]"),
        };
        let driver = self.element().driver();
        Ok(by::find_all(driver.as_ref(), None, &selector)?
            .into_iter()
            .map(|id| WebElement::new(Arc::clone(&driver), id))
            .collect())
    }

    pub fn selected_button(&self) -> PagewrightResult<WebElement> {
        for button in self.buttons()? {
            if button.is_selected()? {
                return Ok(button);
            }
        }
        Err(PagewrightError::no_match("radio button", "selected state"))
    }

    pub fn has_selected_button(&self) -> PagewrightResult<bool> {
        for button in self.buttons()? {
            if button.is_selected()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Select the button whose `value` matches, ignoring case
    pub fn select_by_value(&self, value: &str) -> PagewrightResult<()> {
        info!(
            "Select the radio button from the group '{}' by value '{value}'",
            self.name()
        );
        for button in self.buttons()? {
            let matches = button
                .attribute("value")?
                .is_some_and(|v| v.eq_ignore_ascii_case(value));
            if matches {
                return Self::select_button(&button);
            }
        }
        Err(PagewrightError::no_match("radio button", format!("value: {value}")))
    }

    /// Select the `index`-th button; nothing is clicked when out of range
    pub fn select_by_index(&self, index: usize) -> PagewrightResult<()> {
        info!(
            "Select the radio button from the group '{}' by index '{index}'",
            self.name()
        );
        let buttons = self.buttons()?;
        Self::verify_index(index, buttons.len())?;
        Self::select_button(&buttons[index])
    }

    pub fn is_button_by_index_selected(&self, index: usize) -> PagewrightResult<bool> {
        let buttons = self.buttons()?;
        Self::verify_index(index, buttons.len())?;
        buttons[index].is_selected()
    }

    fn verify_index(index: usize, len: usize) -> PagewrightResult<()> {
        if index >= len {
            return Err(PagewrightError::IndexOutOfRange {
                what: "radio button".to_string(),
                index,
                len,
            });
        }
        Ok(())
    }

    fn select_button(button: &WebElement) -> PagewrightResult<()> {
        if !button.is_selected()? {
            button.click()?;
        }
        Ok(())
    }
}
