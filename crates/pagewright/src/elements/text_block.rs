use super::TypedElement;
use crate::result::{PagewrightError, PagewrightResult};
use tracing::info;

crate::typed_element! {
    /// Read-only text: labels, spans, read-only inputs
    TextBlock
}

impl TextBlock {
    /// `textContent` when non-empty, else `value`, else the visible text
    pub fn text(&self) -> PagewrightResult<String> {
        let element = self.element();
        if let Some(content) = element.attribute("textContent")?.filter(|c| !c.is_empty()) {
            return Ok(content);
        }
        match element.attribute("value")? {
            Some(value) => Ok(value),
            None => element.text(),
        }
    }

    /// Type into the block and fail if that changed its text
    pub fn send_keys_not_allowed(&self, keys: &str) -> PagewrightResult<()> {
        let initial = self.text()?;
        info!("Type '{keys}' to input '{}'", self.name());
        self.element().send_keys(keys)?;
        self.inner.fire_keyup();
        let current = self.text()?;
        if current != initial {
            return Err(PagewrightError::invalid_argument(format!(
                "The text of element {} was changed from '{initial}' to '{current}'",
                self.name()
            )));
        }
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
    fn test_text_prefers_text_content() {
        let mock = mock_with(MockElement::new("span").id("total").text("42.00"));
        let total: TextBlock = typed(&mock, By::id("total"), "Total");
        assert_eq!(total.text().unwrap(), "42.00");
    }

    #[test]
    fn test_text_falls_back_to_value() {
        let mock = mock_with(MockElement::new("input").id("ro").attr("value", "fixed"));
        let block: TextBlock = typed(&mock, By::id("ro"), "Read only");
        assert_eq!(block.text().unwrap(), "fixed");
    }

    #[test]
    fn test_send_keys_not_allowed_on_read_only_block() {
        let mock = mock_with(MockElement::new("span").id("total").text("42.00"));
        let total: TextBlock = typed(&mock, By::id("total"), "Total");
        total.send_keys_not_allowed("abc").unwrap();
    }

    #[test]
    fn test_send_keys_not_allowed_fails_on_editable_input() {
        let mock = mock_with(MockElement::new("input").id("name").attr("value", "Ann"));
        let name: TextBlock = typed(&mock, By::id("name"), "Name");
        let err = name.send_keys_not_allowed("e").unwrap_err();
        assert!(err.to_string().contains("was changed from 'Ann' to 'Anne'"));
    }
}
