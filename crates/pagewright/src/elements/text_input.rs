use super::TypedElement;
use crate::driver::Keys;
use crate::result::PagewrightResult;
use tracing::info;

crate::typed_element! {
    /// Text field or textarea.
    ///
    /// Typing operations fire a jQuery `keyup` afterwards so pages that
    /// validate on key events see the new text.
    TextInput
}

impl TextInput {
    /// Entered text: a textarea's text, otherwise the `value` (or "")
    pub fn text(&self) -> PagewrightResult<String> {
        let element = self.element();
        if element.tag_name()? == "textarea" {
            return element.text();
        }
        Ok(element.attribute("value")?.unwrap_or_default())
    }

    pub fn clear(&self) -> PagewrightResult<()> {
        info!("Clear input '{}'", self.name());
        self.element().clear()
    }

    /// Press Backspace once per entered character
    pub fn clear_using_backspace(&self) -> PagewrightResult<()> {
        info!("Clear input '{}' with Backspace", self.name());
        self.press_per_char(Keys::BACKSPACE)
    }

    pub fn send_keys(&self, keys: &str) -> PagewrightResult<()> {
        info!("Type '{keys}' to input '{}'", self.name());
        self.element().send_keys(keys)?;
        self.inner.fire_keyup();
        Ok(())
    }

    pub fn clear_and_send_keys(&self, keys: &str) -> PagewrightResult<()> {
        info!("Clear text and type '{keys}' to input '{}'", self.name());
        let element = self.element();
        element.clear()?;
        if !self.text()?.is_empty() {
            element.clear()?;
        }
        element.send_keys(keys)?;
        self.inner.fire_keyup();
        Ok(())
    }

    pub fn clear_using_backspace_and_send_keys(&self, keys: &str) -> PagewrightResult<()> {
        self.clear_using_key_and_send_keys(keys, Keys::BACKSPACE, "Backspace")
    }

    pub fn clear_using_delete_and_send_keys(&self, keys: &str) -> PagewrightResult<()> {
        self.clear_using_key_and_send_keys(keys, Keys::DELETE, "Delete")
    }

    /// Clear only when there is text, then type `key`
    pub fn clear_and_send_one_key(&self, key: &str) -> PagewrightResult<()> {
        info!("Clear text and type '{key}' to input '{}'", self.name());
        let element = self.element();
        if !self.text()?.is_empty() {
            element.clear()?;
        }
        element.send_keys(key)?;
        self.inner.fire_keyup();
        Ok(())
    }

    /// Select all and delete with the keyboard so the field keeps focus
    pub fn clear_and_send_keys_without_focus_lost(&self, keys: &str) -> PagewrightResult<()> {
        info!("Replace text with '{keys}' in input '{}'", self.name());
        let element = self.element();
        element.send_keys(&format!("{}a", Keys::CONTROL))?;
        element.send_keys(Keys::BACKSPACE)?;
        element.send_keys(keys)
    }

    fn press_per_char(&self, key: &str) -> PagewrightResult<()> {
        let count = self.text()?.chars().count();
        let element = self.element();
        for _ in 0..count {
            element.send_keys(key)?;
        }
        Ok(())
    }

    fn clear_using_key_and_send_keys(
        &self,
        keys: &str,
        key: &str,
        key_name: &str,
    ) -> PagewrightResult<()> {
        info!(
            "Clear text with {key_name} and type '{keys}' to input '{}'",
            self.name()
        );
        self.press_per_char(key)?;
        self.element().clear()?;
        self.element().send_keys(keys)?;
        self.inner.fire_keyup();
        Ok(())
    }
}
