use super::TypedElement;
use crate::browser::Browser;
use crate::result::PagewrightResult;
use tracing::info;

crate::typed_element! {
    /// Hyperlink
    Link
}

impl Link {
    pub fn text(&self) -> PagewrightResult<String> {
        self.element().text()
    }

    /// The `href` attribute
    pub fn reference(&self) -> PagewrightResult<Option<String>> {
        self.element().attribute("href")
    }

    pub fn click(&self) -> PagewrightResult<()> {
        info!("Click the link '{}'", self.name());
        self.element().click()
    }

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
    use crate::elements::test_support::{mock_with, typed};
    use crate::mock::MockElement;

    #[test]
    fn test_reference_and_text() {
        let mock = mock_with(
            MockElement::new("a")
                .attr("href", "/orders")
                .text("My orders"),
        );
        let link: Link = typed(&mock, By::link_text("My orders"), "Orders");
        assert_eq!(link.reference().unwrap().as_deref(), Some("/orders"));
        assert_eq!(link.text().unwrap(), "My orders");
        link.click().unwrap();
    }
}
