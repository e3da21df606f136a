use super::TypedElement;
use crate::by::{self, By};
use crate::element::{Element, WebElement};
use crate::result::PagewrightResult;
use std::sync::Arc;
use tracing::info;

crate::typed_element! {
    /// Checkbox input
    CheckBox
}

impl CheckBox {
    /// The `label` whose `for` names this checkbox
    pub fn label(&self) -> PagewrightResult<Option<WebElement>> {
        let Some(id) = self.element().attribute("id")?.filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        let driver = self.element().driver();
        let selector = By::css(format!("label[for=\"{id}\"]"));
        Ok(by::find_all(driver.as_ref(), None, &selector)?
            .into_iter()
            .next()
            .map(|label| WebElement::new(Arc::clone(&driver), label)))
    }

    pub fn label_text(&self) -> PagewrightResult<Option<String>> {
        self.label()?.map(|label| label.text()).transpose()
    }

    /// Check, clicking only when unchecked
    pub fn select(&self) -> PagewrightResult<()> {
        if !self.is_selected()? {
            info!("Check the checkbox '{}'", self.name());
            self.element().click()?;
        }
        Ok(())
    }

    /// Uncheck, clicking only when checked
    pub fn deselect(&self) -> PagewrightResult<()> {
        if self.is_selected()? {
            info!("Uncheck the checkbox '{}'", self.name());
            self.element().click()?;
        }
        Ok(())
    }

    pub fn set(&self, checked: bool) -> PagewrightResult<()> {
        if checked {
            self.select()
        } else {
            self.deselect()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::elements::test_support::{mock_with, typed};
    use crate::mock::MockElement;

    fn terms() -> (Arc<crate::mock::MockDriver>, CheckBox) {
        let label = MockElement::new("label")
            .attr("for", "terms")
            .text("I agree");
        let mock = mock_with(
            MockElement::new("form")
                .child(MockElement::input("checkbox").id("terms"))
                .child(label),
        );
        let checkbox = typed(&mock, By::id("terms"), "Terms");
        (mock, checkbox)
    }

    #[test]
    fn test_select_clicks_once() {
        let (mock, checkbox) = terms();
        checkbox.select().unwrap();
        checkbox.select().unwrap();
        assert!(checkbox.is_selected().unwrap());
        assert_eq!(mock.click_count(&mock.first(&By::id("terms")).unwrap()), 1);
    }

    #[test]
    fn test_set_false_unchecks() {
        let (_, checkbox) = terms();
        checkbox.set(true).unwrap();
        checkbox.set(false).unwrap();
        assert!(!checkbox.is_selected().unwrap());
    }

    #[test]
    fn test_label_text() {
        let (_, checkbox) = terms();
        assert_eq!(checkbox.label_text().unwrap().as_deref(), Some("I agree"));
    }

    #[test]
    fn test_label_missing() {
        let mock = mock_with(MockElement::input("checkbox").name("x"));
        let checkbox: CheckBox = typed(&mock, By::name("x"), "X");
        assert!(checkbox.label_text().unwrap().is_none());
    }
}
