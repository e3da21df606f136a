use super::{CheckBox, Radio, Select, TypedElement};
use crate::by::By;
use crate::element::{Element, WebElement};
use crate::result::{PagewrightError, PagewrightResult};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

const TEXT_LIKE_TYPES: &[&str] = &["text", "password", "email", "search", "tel", "url", "number"];

crate::typed_element! {
    /// Form whose controls are filled by their `name`
    Form
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl Form {
    /// Fill the control named by each key.
    ///
    /// Keys without a matching control and `null` values are skipped.
    /// Checkboxes take `true`/`false`; radios and selects are chosen by
    /// value; text-like inputs and textareas are typed into.
    pub fn fill(&self, data: &Map<String, Value>) -> PagewrightResult<()> {
        info!("Fill the form '{}'", self.name());
        for (key, value) in data {
            let Some(text) = value_text(value) else {
                continue;
            };
            match self.control(key)? {
                Some(control) => self.fill_control(key, control, &text)?,
                None => debug!(form = %self.name(), field = %key, "no control with this name"),
            }
        }
        Ok(())
    }

    pub fn submit(&self) -> PagewrightResult<()> {
        info!("Submit the form '{}'", self.name());
        self.element().submit()
    }

    fn control(&self, name: &str) -> PagewrightResult<Option<WebElement>> {
        Ok(self
            .element()
            .find_elements(&By::name(name))?
            .into_iter()
            .next())
    }

    fn fill_control(&self, key: &str, control: WebElement, text: &str) -> PagewrightResult<()> {
        match control.tag_name()?.as_str() {
            "input" => {
                let kind = control.attribute("type")?.map(|t| t.to_ascii_lowercase());
                match kind.as_deref() {
                    None => control.send_keys(text),
                    Some(t) if TEXT_LIKE_TYPES.contains(&t) => control.send_keys(text),
                    Some("checkbox") => {
                        let checked = text.trim().parse::<bool>().map_err(|_| {
                            PagewrightError::invalid_argument(format!(
                                "'{text}' is not a boolean for checkbox '{key}'"
                            ))
                        })?;
                        Self::typed::<CheckBox>(control, key).set(checked)
                    }
                    Some("radio") => Self::typed::<Radio>(control, key).select_by_value(text),
                    Some(other) => {
                        debug!(field = %key, kind = %other, "input type not fillable");
                        Ok(())
                    }
                }
            }
            "select" => Self::typed::<Select>(control, key).select_by_value(text),
            "textarea" => control.send_keys(text),
            _ => Ok(()),
        }
    }

    fn typed<T: TypedElement>(control: WebElement, key: &str) -> T {
        T::from_element(Arc::new(control), key.to_string())
    }
}
