use super::TypedElement;
use crate::browser::Browser;
use crate::result::PagewrightResult;
use tracing::info;

crate::typed_element! {
    /// Clickable button
    Button
}

impl Button {
    pub fn text(&self) -> PagewrightResult<String> {
        self.element().text()
    }

    pub fn click(&self) -> PagewrightResult<()> {
        info!("Click the button '{}'", self.name());
        self.element().click()
    }

    /// Click, then wait until the page's AJAX requests are done
    pub fn click_and_wait_ajax(&self, browser: &Browser) -> PagewrightResult<()> {
        self.click()?;
        browser.wait_ajax(true)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::by::By;
    use crate::config::FrameworkConfig;
    use crate::elements::test_support::{mock_with, typed};
    use crate::mock::{Interaction, MockElement};

    #[test]
    fn test_click_and_text() {
        let mock = mock_with(MockElement::new("button").id("save").text("Save"));
        let button: Button = typed(&mock, By::id("save"), "Save");
        assert_eq!(button.text().unwrap(), "Save");
        button.click().unwrap();
        assert_eq!(mock.click_count(&mock.first(&By::id("save")).unwrap()), 1);
    }

    #[test]
    fn test_click_and_wait_ajax_checks_jquery() {
        let mock = mock_with(MockElement::new("button").id("save").text("Save"));
        let browser = Browser::with_driver(FrameworkConfig::default(), mock.clone());
        let button: Button = typed(&mock, By::id("save"), "Save");
        button.click_and_wait_ajax(&browser).unwrap();
        let interactions = mock.interactions();
        assert!(matches!(interactions.first(), Some(Interaction::Click(_))));
        let polled_ajax =
            |i: &Interaction| matches!(i, Interaction::Script(s) if s.contains("$.active"));
        assert!(interactions.iter().any(polled_ajax));
    }

    #[test]
    fn test_click_missing_button_fails() {
        let mock = mock_with(MockElement::new("div"));
        let button: Button = typed(&mock, By::id("save"), "Save");
        assert!(button.click().unwrap_err().is_locate_failure());
    }
}
