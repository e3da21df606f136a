use super::TypedElement;
use crate::by::By;
use crate::element::{Element, WebElement};
use crate::result::{PagewrightError, PagewrightResult};
use tracing::info;

crate::typed_element! {
    /// Drop-down or multi-select list
    Select
}

impl Select {
    pub fn is_multiple(&self) -> PagewrightResult<bool> {
        Ok(self
            .element()
            .attribute("multiple")?
            .is_some_and(|m| m != "false"))
    }

    pub fn options(&self) -> PagewrightResult<Vec<WebElement>> {
        self.element().find_elements(&By::tag_name("option"))
    }

    pub fn all_selected_options(&self) -> PagewrightResult<Vec<WebElement>> {
        let mut selected = Vec::new();
        for option in self.options()? {
            if option.is_selected()? {
                selected.push(option);
            }
        }
        Ok(selected)
    }

    /// First selected option
    pub fn selected_option(&self) -> PagewrightResult<WebElement> {
        self.all_selected_options()?
            .into_iter()
            .next()
            .ok_or_else(|| PagewrightError::no_match("option", "selected state"))
    }

    pub fn has_selected_option(&self) -> PagewrightResult<bool> {
        Ok(!self.all_selected_options()?.is_empty())
    }

    pub fn select_by_text(&self, text: &str) -> PagewrightResult<()> {
        info!(
            "Select the option from element '{}' by text '{text}'",
            self.name()
        );
        self.select_matching(&format!("text: {text}"), |option| {
            Ok(option.text()?.trim() == text.trim())
        })
    }

    /// Select the first option whose text contains `text`
    pub fn select_by_partial_text(&self, text: &str) -> PagewrightResult<()> {
        info!(
            "Select the option from element '{}' by partial text '{text}'",
            self.name()
        );
        for option in self.options()? {
            if option.text()?.contains(text) {
                return Self::set_selected(&option, true);
            }
        }
        Err(PagewrightError::no_match("option", format!("partial text: {text}")))
    }

    pub fn select_by_index(&self, index: usize) -> PagewrightResult<()> {
        info!(
            "Select the option from element '{}' by index '{index}'",
            self.name()
        );
        let option = self.option_at(index)?;
        Self::set_selected(&option, true)
    }

    pub fn select_by_value(&self, value: &str) -> PagewrightResult<()> {
        info!(
            "Select the option from element '{}' by value '{value}'",
            self.name()
        );
        self.select_matching(&format!("value: {value}"), |option| {
            Ok(option.attribute("value")?.as_deref() == Some(value))
        })
    }

    pub fn deselect_all(&self) -> PagewrightResult<()> {
        self.ensure_multiple()?;
        for option in self.options()? {
            Self::set_selected(&option, false)?;
        }
        Ok(())
    }

    pub fn deselect_by_text(&self, text: &str) -> PagewrightResult<()> {
        info!(
            "Deselect the option from element '{}' by text '{text}'",
            self.name()
        );
        self.deselect_matching(|option| Ok(option.text()?.trim() == text.trim()))
    }

    pub fn deselect_by_index(&self, index: usize) -> PagewrightResult<()> {
        info!(
            "Deselect the option from element '{}' by index '{index}'",
            self.name()
        );
        self.ensure_multiple()?;
        let option = self.option_at(index)?;
        Self::set_selected(&option, false)
    }

    pub fn deselect_by_value(&self, value: &str) -> PagewrightResult<()> {
        info!(
            "Deselect the option from element '{}' by value '{value}'",
            self.name()
        );
        self.deselect_matching(|option| Ok(option.attribute("value")?.as_deref() == Some(value)))
    }

    fn option_at(&self, index: usize) -> PagewrightResult<WebElement> {
        let mut options = self.options()?;
        if index >= options.len() {
            return Err(PagewrightError::IndexOutOfRange {
                what: format!("option of '{}'", self.name()),
                index,
                len: options.len(),
            });
        }
        Ok(options.swap_remove(index))
    }

    /// Select every match in a multi-select, the first one otherwise
    fn select_matching<F>(&self, criterion: &str, matches: F) -> PagewrightResult<()>
    where
        F: Fn(&WebElement) -> PagewrightResult<bool>,
    {
        let multiple = self.is_multiple()?;
        let mut matched = false;
        for option in self.options()? {
            if matches(&option)? {
                Self::set_selected(&option, true)?;
                matched = true;
                if !multiple {
                    break;
                }
            }
        }
        if matched {
            Ok(())
        } else {
            Err(PagewrightError::no_match("option", criterion))
        }
    }

    fn deselect_matching<F>(&self, matches: F) -> PagewrightResult<()>
    where
        F: Fn(&WebElement) -> PagewrightResult<bool>,
    {
        self.ensure_multiple()?;
        for option in self.options()? {
            if matches(&option)? {
                Self::set_selected(&option, false)?;
            }
        }
        Ok(())
    }

    fn ensure_multiple(&self) -> PagewrightResult<()> {
        if self.is_multiple()? {
            Ok(())
        } else {
            Err(PagewrightError::invalid_argument(
                "You may only deselect options of a multi-select",
            ))
        }
    }

    fn set_selected(option: &WebElement, selected: bool) -> PagewrightResult<()> {
        if option.is_selected()? != selected {
            option.click()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::elements::test_support::{mock_with, typed};
    use crate::mock::MockElement;

    fn option(value: &str, text: &str) -> MockElement {
        MockElement::new("option").attr("value", value).text(text)
    }

    fn country() -> Select {
        let mock = mock_with(
            MockElement::new("select")
                .id("country")
                .child(option("de", "Germany"))
                .child(option("fr", "France"))
                .child(option("nz", "New Zealand")),
        );
        typed(&mock, By::id("country"), "Country")
    }

    fn toppings() -> Select {
        let mock = mock_with(
            MockElement::new("select")
                .id("toppings")
                .attr("multiple", "multiple")
                .child(option("ham", "Ham"))
                .child(option("olive", "Olives").selected())
                .child(option("egg", "Egg")),
        );
        typed(&mock, By::id("toppings"), "Toppings")
    }

    fn selected_texts(select: &Select) -> Vec<String> {
        select
            .all_selected_options()
            .unwrap()
            .iter()
            .map(|o| o.text().unwrap())
            .collect()
    }

    mod single_tests {
        use super::*;

        #[test]
        fn test_select_by_text_and_value() {
            let select = country();
            assert!(!select.is_multiple().unwrap());
            select.select_by_text("France").unwrap();
            assert_eq!(select.selected_option().unwrap().text().unwrap(), "France");
            select.select_by_value("nz").unwrap();
            assert_eq!(selected_texts(&select), vec!["New Zealand"]);
        }

        #[test]
        fn test_select_by_partial_text() {
            let select = country();
            select.select_by_partial_text("Zeal").unwrap();
            assert_eq!(selected_texts(&select), vec!["New Zealand"]);
        }

        #[test]
        fn test_select_by_index_bounds() {
            let select = country();
            select.select_by_index(0).unwrap();
            assert_eq!(selected_texts(&select), vec!["Germany"]);
            assert!(matches!(
                select.select_by_index(9),
                Err(PagewrightError::IndexOutOfRange { index: 9, .. })
            ));
        }

        #[test]
        fn test_unknown_text() {
            let select = country();
            assert!(matches!(
                select.select_by_text("Atlantis"),
                Err(PagewrightError::NoMatch { .. })
            ));
            assert!(!select.has_selected_option().unwrap());
        }

        #[test]
        fn test_deselect_requires_multiple() {
            let select = country();
            assert!(matches!(
                select.deselect_all(),
                Err(PagewrightError::InvalidArgument { .. })
            ));
        }
    }

    mod multiple_tests {
        use super::*;

        #[test]
        fn test_select_accumulates() {
            let select = toppings();
            assert!(select.is_multiple().unwrap());
            select.select_by_value("ham").unwrap();
            assert_eq!(selected_texts(&select), vec!["Ham", "Olives"]);
        }

        #[test]
        fn test_deselect_variants() {
            let select = toppings();
            select.select_by_index(2).unwrap();
            select.deselect_by_text("Olives").unwrap();
            assert_eq!(selected_texts(&select), vec!["Egg"]);
            select.deselect_by_value("egg").unwrap();
            assert!(!select.has_selected_option().unwrap());
            select.select_by_text("Ham").unwrap();
            select.deselect_by_index(0).unwrap();
            assert!(!select.has_selected_option().unwrap());
        }

        #[test]
        fn test_deselect_all() {
            let select = toppings();
            select.select_by_text("Egg").unwrap();
            select.deselect_all().unwrap();
            assert!(select.all_selected_options().unwrap().is_empty());
        }
    }
}
