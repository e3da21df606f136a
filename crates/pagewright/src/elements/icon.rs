use super::TypedElement;
use crate::element::Element;
use crate::result::PagewrightResult;
use tracing::info;

crate::typed_element! {
    /// Clickable icon
    Icon
}

impl Icon {
    pub fn click(&self) -> PagewrightResult<()> {
        info!("Click the icon '{}'", self.name());
        self.element().click()
    }

    /// Click through `element.click()` in the page, bypassing overlays
    pub fn click_using_js(&self) -> PagewrightResult<()> {
        info!("Click the icon '{}'", self.name());
        let resolved = self.element().resolve()?;
        resolved
            .driver()
            .execute_script("arguments[0].click()", &[resolved.as_arg()])?;
        Ok(())
    }
}
