//! In-memory WebDriver for tests.
//!
//! `MockDriver` keeps a small DOM arena behind a mutex. Documents are built
//! from [`MockElement`] trees and can be mutated while a test runs; nodes that
//! are replaced or removed become stale exactly like detached nodes in a real
//! browser. CSS support covers type, universal, `#id`, `.class`, `[attr]` and
//! `[attr=value]` selectors joined by descendant or child combinators, plus
//! selector lists.

use crate::by::{self, By};
use crate::driver::{Cookie, ElementId, Keys, ScriptArg, WebDriver};
use crate::result::{PagewrightError, PagewrightResult};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const ID_PREFIX: &str = "mock-";
const DOCUMENT: usize = 0;
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

// =============================================================================
// ELEMENT BUILDER
// =============================================================================

/// Declarative description of a mock DOM subtree
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<MockElement>,
    hidden: bool,
    disabled: bool,
    selected: bool,
}

impl MockElement {
    /// Element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// `<input type="{kind}">`
    #[must_use]
    pub fn input(kind: &str) -> Self {
        Self::new("input").attr("type", kind)
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.attrs.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name, value));
        }
        self
    }

    /// Shorthand for the `id` attribute
    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Shorthand for the `class` attribute
    #[must_use]
    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    /// Shorthand for the `name` attribute
    #[must_use]
    pub fn name(self, name: impl Into<String>) -> Self {
        self.attr("name", name)
    }

    /// Shorthand for the `value` attribute
    #[must_use]
    pub fn value(self, value: impl Into<String>) -> Self {
        self.attr("value", value)
    }

    /// Own text content
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: MockElement) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = MockElement>) -> Self {
        self.children.extend(children);
        self
    }

    /// Render the element invisible
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Disable the element
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Mark a checkbox, radio button or option as selected
    #[must_use]
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }
}

// =============================================================================
// RECORDED STATE
// =============================================================================

/// An interaction recorded by the mock driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// `navigate(url)`
    Navigate(String),
    /// `refresh()`
    Refresh,
    /// `click(element)`
    Click(ElementId),
    /// `clear(element)`
    Clear(ElementId),
    /// `send_keys(element, keys)`
    SendKeys(ElementId, String),
    /// `submit(element)`
    Submit(ElementId),
    /// `execute_script(script, ..)`
    Script(String),
    /// `accept_alert()`
    AcceptAlert,
    /// `dismiss_alert()`
    DismissAlert,
}

/// Side effect triggered by clicking an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    /// Hide another element
    Hide(ElementId),
    /// Show another element
    Show(ElementId),
    /// Detach another element
    Remove(ElementId),
    /// Open an alert with the given text
    OpenAlert(String),
}

type ScriptResponder = Arc<dyn Fn(&[ScriptArg]) -> PagewrightResult<Value> + Send + Sync>;

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    value: String,
    children: Vec<usize>,
    parent: Option<usize>,
    attached: bool,
    displayed: bool,
    enabled: bool,
    selected: bool,
}

impl Node {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn input_type(&self) -> &str {
        self.attr("type").unwrap_or("text")
    }

    fn is_input_of(&self, kind: &str) -> bool {
        self.tag == "input" && self.input_type().eq_ignore_ascii_case(kind)
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    fn is_editable(&self) -> bool {
        self.tag == "textarea" || self.tag == "input"
    }
}

struct MockState {
    nodes: Vec<Node>,
    url: String,
    title: String,
    history: Vec<String>,
    history_pos: usize,
    alert: Option<String>,
    cookies: Vec<Cookie>,
    windows: Vec<String>,
    current_window: usize,
    scripts: Vec<(String, ScriptResponder)>,
    click_effects: Vec<(ElementId, ClickEffect)>,
    interactions: Vec<Interaction>,
    find_count: usize,
    quit: bool,
}

impl MockState {
    fn new() -> Self {
        let document = Node {
            tag: "#document".to_string(),
            attrs: Vec::new(),
            text: String::new(),
            value: String::new(),
            children: Vec::new(),
            parent: None,
            attached: true,
            displayed: true,
            enabled: true,
            selected: false,
        };
        let always_true: ScriptResponder = Arc::new(|_| Ok(Value::Bool(true)));
        Self {
            nodes: vec![document],
            url: "about:blank".to_string(),
            title: String::new(),
            history: vec!["about:blank".to_string()],
            history_pos: 0,
            alert: None,
            cookies: Vec::new(),
            windows: vec!["window-1".to_string()],
            current_window: 0,
            scripts: vec![
                ("document.readyState".to_string(), Arc::clone(&always_true)),
                ("$.active".to_string(), always_true),
            ],
            click_effects: Vec::new(),
            interactions: Vec::new(),
            find_count: 0,
            quit: false,
        }
    }

    fn insert(&mut self, parent: usize, element: MockElement) -> usize {
        let idx = self.nodes.len();
        let has = |name: &str| element.attrs.iter().any(|(k, _)| k == name);
        let value = element
            .attrs
            .iter()
            .find(|(k, _)| k == "value")
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| {
                if element.tag == "textarea" {
                    element.text.clone()
                } else {
                    String::new()
                }
            });
        let node = Node {
            selected: element.selected || has("checked") || has("selected"),
            enabled: !(element.disabled || has("disabled")),
            displayed: !element.hidden,
            tag: element.tag,
            attrs: element.attrs,
            text: element.text,
            value,
            children: Vec::new(),
            parent: Some(parent),
            attached: true,
        };
        self.nodes.push(node);
        for child in element.children {
            let child_idx = self.insert(idx, child);
            self.nodes[idx].children.push(child_idx);
        }
        idx
    }

    fn detach(&mut self, idx: usize) {
        self.nodes[idx].attached = false;
        let children = self.nodes[idx].children.clone();
        for child in children {
            self.detach(child);
        }
    }

    fn unlink(&mut self, idx: usize) -> Option<(usize, usize)> {
        let parent = self.nodes[idx].parent?;
        let position = self.nodes[parent].children.iter().position(|&c| c == idx)?;
        self.nodes[parent].children.remove(position);
        Some((parent, position))
    }

    fn node(&self, id: &ElementId) -> PagewrightResult<usize> {
        let idx = id
            .as_str()
            .strip_prefix(ID_PREFIX)
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|&n| n != DOCUMENT && n < self.nodes.len())
            .ok_or_else(|| PagewrightError::stale(id.as_str()))?;
        if self.nodes[idx].attached {
            Ok(idx)
        } else {
            Err(PagewrightError::stale(id.as_str()))
        }
    }

    fn descendants(&self, idx: usize, out: &mut Vec<usize>) {
        for &child in &self.nodes[idx].children {
            out.push(child);
            self.descendants(child, out);
        }
    }

    fn is_displayed(&self, idx: usize) -> bool {
        let mut current = Some(idx);
        while let Some(i) = current {
            let node = &self.nodes[i];
            if !node.displayed || node.is_input_of("hidden") {
                return false;
            }
            current = node.parent;
        }
        true
    }

    fn collect_text(&self, idx: usize, visible_only: bool) -> String {
        if visible_only && !self.is_displayed(idx) {
            return String::new();
        }
        let node = &self.nodes[idx];
        let mut parts = Vec::new();
        if !node.text.trim().is_empty() {
            parts.push(node.text.trim().to_string());
        }
        for &child in &node.children {
            let text = self.collect_text(child, visible_only);
            if !text.is_empty() {
                parts.push(text);
            }
        }
        parts.join(" ")
    }

    fn ancestor_with_tag(&self, idx: usize, tag: &str) -> Option<usize> {
        let mut current = self.nodes[idx].parent;
        while let Some(i) = current {
            if self.nodes[i].tag == tag {
                return Some(i);
            }
            current = self.nodes[i].parent;
        }
        None
    }

    fn matches(&self, idx: usize, by: &By, css: Option<&[css::Complex]>) -> PagewrightResult<bool> {
        let node = &self.nodes[idx];
        Ok(match by {
            By::Id(v) => node.attr("id") == Some(v.as_str()),
            By::Name(v) => node.attr("name") == Some(v.as_str()),
            By::ClassName(v) => node.has_class(v),
            By::TagName(v) => node.tag.eq_ignore_ascii_case(v),
            By::LinkText(v) => node.tag == "a" && self.collect_text(idx, true) == v.trim(),
            By::PartialLinkText(v) => node.tag == "a" && self.collect_text(idx, true).contains(v),
            By::Css(_) => css.unwrap_or_default().iter().any(|complex| {
                !complex.is_empty() && self.matches_complex(idx, complex, complex.len() - 1)
            }),
            By::XPath(_) => {
                return Err(PagewrightError::InvalidSelector {
                    selector: by.to_string(),
                    message: "XPath is not supported by the mock driver".to_string(),
                })
            }
            By::IdOrName(_) | By::Chained(_) => {
                return Err(PagewrightError::InvalidSelector {
                    selector: by.to_string(),
                    message: "composite selector reached the driver".to_string(),
                })
            }
        })
    }

    fn matches_complex(
        &self,
        idx: usize,
        complex: &[(css::Combinator, css::Compound)],
        at: usize,
    ) -> bool {
        let (combinator, compound) = &complex[at];
        if !css::matches_compound(&self.nodes[idx], compound) {
            return false;
        }
        if at == 0 {
            return true;
        }
        let mut parent = self.nodes[idx].parent.filter(|&p| p != DOCUMENT);
        match combinator {
            css::Combinator::Child => {
                parent.is_some_and(|p| self.matches_complex(p, complex, at - 1))
            }
            css::Combinator::Descendant => {
                while let Some(p) = parent {
                    if self.matches_complex(p, complex, at - 1) {
                        return true;
                    }
                    parent = self.nodes[p].parent.filter(|&p| p != DOCUMENT);
                }
                false
            }
        }
    }

    fn apply_click(&mut self, idx: usize) {
        if !self.nodes[idx].enabled {
            return;
        }
        if self.nodes[idx].is_input_of("checkbox") {
            self.nodes[idx].selected = !self.nodes[idx].selected;
        } else if self.nodes[idx].is_input_of("radio") {
            let group = self.nodes[idx].attr("name").map(str::to_string);
            if let Some(group) = group {
                for i in 1..self.nodes.len() {
                    let node = &self.nodes[i];
                    if node.attached
                        && node.is_input_of("radio")
                        && node.attr("name") == Some(group.as_str())
                    {
                        self.nodes[i].selected = false;
                    }
                }
            }
            self.nodes[idx].selected = true;
        } else if self.nodes[idx].tag == "option" {
            match self.ancestor_with_tag(idx, "select") {
                Some(select) if self.nodes[select].attr("multiple").is_some() => {
                    self.nodes[idx].selected = !self.nodes[idx].selected;
                }
                Some(select) => {
                    let mut options = Vec::new();
                    self.descendants(select, &mut options);
                    for option in options {
                        if self.nodes[option].tag == "option" {
                            self.nodes[option].selected = option == idx;
                        }
                    }
                }
                None => self.nodes[idx].selected = true,
            }
        }
    }

    fn apply_effect(&mut self, effect: &ClickEffect) {
        match effect {
            ClickEffect::Hide(id) | ClickEffect::Show(id) => {
                if let Ok(idx) = self.node(id) {
                    self.nodes[idx].displayed = matches!(effect, ClickEffect::Show(_));
                }
            }
            ClickEffect::Remove(id) => {
                if let Ok(idx) = self.node(id) {
                    self.unlink(idx);
                    self.detach(idx);
                }
            }
            ClickEffect::OpenAlert(text) => self.alert = Some(text.clone()),
        }
    }

    fn type_keys(&mut self, idx: usize, keys: &str) {
        let backspace = first_char(Keys::BACKSPACE);
        let delete = first_char(Keys::DELETE);
        let control = first_char(Keys::CONTROL);
        let node = &mut self.nodes[idx];
        let mut control_down = false;
        let mut all_selected = false;
        for c in keys.chars() {
            if c == control {
                control_down = true;
            } else if control_down && c.eq_ignore_ascii_case(&'a') {
                all_selected = true;
                control_down = false;
            } else if c == backspace || c == delete {
                if all_selected {
                    node.value.clear();
                    all_selected = false;
                } else if c == backspace {
                    node.value.pop();
                }
            } else {
                if all_selected {
                    node.value.clear();
                    all_selected = false;
                }
                control_down = false;
                node.value.push(c);
            }
        }
    }
}

fn first_char(key: &str) -> char {
    key.chars().next().unwrap_or_default()
}

fn element_id(idx: usize) -> ElementId {
    ElementId(format!("{ID_PREFIX}{idx}"))
}

// =============================================================================
// DRIVER
// =============================================================================

/// Deterministic in-memory [`WebDriver`]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MockDriver")
            .field("url", &state.url)
            .field("nodes", &state.nodes.len())
            .field("interactions", &state.interactions.len())
            .finish_non_exhaustive()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Empty document at `about:blank`
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session(&self) -> PagewrightResult<MutexGuard<'_, MockState>> {
        let state = self.lock();
        if state.quit {
            return Err(PagewrightError::driver("session has been quit"));
        }
        Ok(state)
    }

    /// Replace the whole document; every previous node goes stale
    pub fn load(&self, root: MockElement) -> ElementId {
        let mut state = self.lock();
        let old = std::mem::take(&mut state.nodes[DOCUMENT].children);
        for idx in old {
            state.detach(idx);
        }
        let idx = state.insert(DOCUMENT, root);
        state.nodes[DOCUMENT].children.push(idx);
        element_id(idx)
    }

    /// Append a subtree to the document
    pub fn append(&self, element: MockElement) -> ElementId {
        let mut state = self.lock();
        let idx = state.insert(DOCUMENT, element);
        state.nodes[DOCUMENT].children.push(idx);
        element_id(idx)
    }

    /// Append a subtree under `parent`
    pub fn append_to(
        &self,
        parent: &ElementId,
        element: MockElement,
    ) -> PagewrightResult<ElementId> {
        let mut state = self.lock();
        let parent = state.node(parent)?;
        let idx = state.insert(parent, element);
        state.nodes[parent].children.push(idx);
        Ok(element_id(idx))
    }

    /// Swap a node for a new subtree at the same position
    pub fn replace(&self, target: &ElementId, element: MockElement) -> PagewrightResult<ElementId> {
        let mut state = self.lock();
        let old = state.node(target)?;
        let (parent, position) = state
            .unlink(old)
            .ok_or_else(|| PagewrightError::stale(target.as_str()))?;
        state.detach(old);
        let idx = state.insert(parent, element);
        state.nodes[parent].children.insert(position, idx);
        Ok(element_id(idx))
    }

    /// Detach a node from the document
    pub fn remove(&self, target: &ElementId) -> PagewrightResult<()> {
        let mut state = self.lock();
        let idx = state.node(target)?;
        state.unlink(idx);
        state.detach(idx);
        Ok(())
    }

    /// First element matching `by`, without recording a search
    pub fn first(&self, by: &By) -> PagewrightResult<ElementId> {
        let before = self.lock().find_count;
        let found = by::find_all(self, None, by);
        self.lock().find_count = before;
        found?
            .into_iter()
            .next()
            .ok_or_else(|| PagewrightError::NotFound {
                selector: by.to_string(),
                timeout_ms: 0,
            })
    }

    /// Set or overwrite an attribute
    pub fn set_attribute(
        &self,
        target: &ElementId,
        name: &str,
        value: &str,
    ) -> PagewrightResult<()> {
        let mut state = self.lock();
        let idx = state.node(target)?;
        let node = &mut state.nodes[idx];
        if name == "value" {
            node.value = value.to_string();
        }
        if let Some(slot) = node.attrs.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value.to_string();
        } else {
            node.attrs.push((name.to_string(), value.to_string()));
        }
        Ok(())
    }

    /// Replace a node's own text
    pub fn set_text(&self, target: &ElementId, text: &str) -> PagewrightResult<()> {
        let mut state = self.lock();
        let idx = state.node(target)?;
        state.nodes[idx].text = text.to_string();
        Ok(())
    }

    /// Show or hide a node
    pub fn set_displayed(&self, target: &ElementId, displayed: bool) -> PagewrightResult<()> {
        let mut state = self.lock();
        let idx = state.node(target)?;
        state.nodes[idx].displayed = displayed;
        Ok(())
    }

    /// Enable or disable a node
    pub fn set_enabled(&self, target: &ElementId, enabled: bool) -> PagewrightResult<()> {
        let mut state = self.lock();
        let idx = state.node(target)?;
        state.nodes[idx].enabled = enabled;
        Ok(())
    }

    /// Current editable value of an input or textarea
    pub fn value(&self, target: &ElementId) -> PagewrightResult<String> {
        let state = self.lock();
        let idx = state.node(target)?;
        Ok(state.nodes[idx].value.clone())
    }

    /// Open or close an alert
    pub fn set_alert(&self, text: Option<&str>) {
        self.lock().alert = text.map(str::to_string);
    }

    /// Set the page title
    pub fn set_title(&self, title: &str) {
        self.lock().title = title.to_string();
    }

    /// Open another window handle
    pub fn open_window(&self, handle: &str) {
        self.lock().windows.push(handle.to_string());
    }

    /// Answer scripts containing `pattern`; later registrations win
    pub fn on_script<F>(&self, pattern: &str, responder: F)
    where
        F: Fn(&[ScriptArg]) -> PagewrightResult<Value> + Send + Sync + 'static,
    {
        let responder: ScriptResponder = Arc::new(responder);
        self.lock().scripts.push((pattern.to_string(), responder));
    }

    /// Trigger `effect` whenever `target` is clicked
    pub fn on_click(&self, target: &ElementId, effect: ClickEffect) {
        self.lock().click_effects.push((target.clone(), effect));
    }

    /// Every recorded interaction, oldest first
    pub fn interactions(&self) -> Vec<Interaction> {
        self.lock().interactions.clone()
    }

    /// Forget recorded interactions
    pub fn clear_interactions(&self) {
        self.lock().interactions.clear();
    }

    /// Number of clicks recorded on `target`
    pub fn click_count(&self, target: &ElementId) -> usize {
        self.lock()
            .interactions
            .iter()
            .filter(|i| matches!(i, Interaction::Click(id) if id == target))
            .count()
    }

    /// Total number of element searches performed
    pub fn find_count(&self) -> usize {
        self.lock().find_count
    }

    /// Whether `quit` has been called
    pub fn is_quit(&self) -> bool {
        self.lock().quit
    }

    fn with_node<T>(
        &self,
        element: &ElementId,
        f: impl FnOnce(&MockState, usize) -> T,
    ) -> PagewrightResult<T> {
        let state = self.session()?;
        let idx = state.node(element)?;
        Ok(f(&state, idx))
    }

    fn interactable(state: &MockState, idx: usize, element: &ElementId) -> PagewrightResult<()> {
        if state.is_displayed(idx) {
            Ok(())
        } else {
            Err(PagewrightError::Unusable {
                selector: element.to_string(),
                reason: "element not interactable".to_string(),
            })
        }
    }
}

impl WebDriver for MockDriver {
    fn navigate(&self, url: &str) -> PagewrightResult<()> {
        let mut state = self.session()?;
        let pos = state.history_pos + 1;
        state.history.truncate(pos);
        state.history.push(url.to_string());
        state.history_pos = pos;
        state.url = url.to_string();
        state
            .interactions
            .push(Interaction::Navigate(url.to_string()));
        Ok(())
    }

    fn current_url(&self) -> PagewrightResult<String> {
        Ok(self.session()?.url.clone())
    }

    fn title(&self) -> PagewrightResult<String> {
        Ok(self.session()?.title.clone())
    }

    fn back(&self) -> PagewrightResult<()> {
        let mut state = self.session()?;
        if state.history_pos > 0 {
            state.history_pos -= 1;
            state.url = state.history[state.history_pos].clone();
        }
        Ok(())
    }

    fn forward(&self) -> PagewrightResult<()> {
        let mut state = self.session()?;
        if state.history_pos + 1 < state.history.len() {
            state.history_pos += 1;
            state.url = state.history[state.history_pos].clone();
        }
        Ok(())
    }

    fn refresh(&self) -> PagewrightResult<()> {
        self.session()?.interactions.push(Interaction::Refresh);
        Ok(())
    }

    fn find_elements(&self, root: Option<&ElementId>, by: &By) -> PagewrightResult<Vec<ElementId>> {
        if !by.is_primitive() {
            return by::find_all(self, root, by);
        }
        let mut state = self.session()?;
        state.find_count += 1;
        let root = match root {
            Some(id) => state.node(id)?,
            None => DOCUMENT,
        };
        let css = match by {
            By::Css(selector) => Some(css::parse(selector).map_err(|message| {
                PagewrightError::InvalidSelector {
                    selector: by.to_string(),
                    message,
                }
            })?),
            _ => None,
        };
        let mut candidates = Vec::new();
        state.descendants(root, &mut candidates);
        let mut found = Vec::new();
        for idx in candidates {
            if state.matches(idx, by, css.as_deref())? {
                found.push(element_id(idx));
            }
        }
        Ok(found)
    }

    fn click(&self, element: &ElementId) -> PagewrightResult<()> {
        let mut state = self.session()?;
        let idx = state.node(element)?;
        Self::interactable(&state, idx, element)?;
        state.interactions.push(Interaction::Click(element.clone()));
        state.apply_click(idx);
        let effects: Vec<ClickEffect> = state
            .click_effects
            .iter()
            .filter(|(id, _)| id == element)
            .map(|(_, effect)| effect.clone())
            .collect();
        for effect in &effects {
            state.apply_effect(effect);
        }
        Ok(())
    }

    fn clear(&self, element: &ElementId) -> PagewrightResult<()> {
        let mut state = self.session()?;
        let idx = state.node(element)?;
        Self::interactable(&state, idx, element)?;
        state.interactions.push(Interaction::Clear(element.clone()));
        if state.nodes[idx].is_editable() && state.nodes[idx].enabled {
            state.nodes[idx].value.clear();
        }
        Ok(())
    }

    fn send_keys(&self, element: &ElementId, keys: &str) -> PagewrightResult<()> {
        let mut state = self.session()?;
        let idx = state.node(element)?;
        Self::interactable(&state, idx, element)?;
        state
            .interactions
            .push(Interaction::SendKeys(element.clone(), keys.to_string()));
        if state.nodes[idx].is_editable() && state.nodes[idx].enabled {
            state.type_keys(idx, keys);
        }
        Ok(())
    }

    fn submit(&self, element: &ElementId) -> PagewrightResult<()> {
        let mut state = self.session()?;
        state.node(element)?;
        state
            .interactions
            .push(Interaction::Submit(element.clone()));
        Ok(())
    }

    fn text(&self, element: &ElementId) -> PagewrightResult<String> {
        self.with_node(element, |state, idx| state.collect_text(idx, true))
    }

    fn tag_name(&self, element: &ElementId) -> PagewrightResult<String> {
        self.with_node(element, |state, idx| state.nodes[idx].tag.clone())
    }

    fn attribute(&self, element: &ElementId, name: &str) -> PagewrightResult<Option<String>> {
        self.with_node(element, |state, idx| {
            let node = &state.nodes[idx];
            match name {
                "value" if node.is_editable() => Some(node.value.clone()),
                "value" if node.tag == "option" => Some(
                    node.attr("value")
                        .map_or_else(|| state.collect_text(idx, false), str::to_string),
                ),
                "textContent" | "innerText" => Some(state.collect_text(idx, false)),
                "checked" | "selected" => node.selected.then(|| "true".to_string()),
                "disabled" => (!node.enabled).then(|| "true".to_string()),
                "multiple" | "readonly" | "required" => {
                    node.attr(name).map(|_| "true".to_string())
                }
                _ => node.attr(name).map(str::to_string),
            }
        })
    }

    fn css_value(&self, element: &ElementId, property: &str) -> PagewrightResult<String> {
        self.with_node(element, |state, idx| {
            if property == "display" && !state.nodes[idx].displayed {
                return "none".to_string();
            }
            state.nodes[idx]
                .attr("style")
                .and_then(|style| {
                    style.split(';').find_map(|decl| {
                        let (key, value) = decl.split_once(':')?;
                        (key.trim() == property).then(|| value.trim().to_string())
                    })
                })
                .unwrap_or_default()
        })
    }

    fn is_displayed(&self, element: &ElementId) -> PagewrightResult<bool> {
        self.with_node(element, |state, idx| state.is_displayed(idx))
    }

    fn is_enabled(&self, element: &ElementId) -> PagewrightResult<bool> {
        self.with_node(element, |state, idx| state.nodes[idx].enabled)
    }

    fn is_selected(&self, element: &ElementId) -> PagewrightResult<bool> {
        self.with_node(element, |state, idx| state.nodes[idx].selected)
    }

    fn execute_script(&self, script: &str, args: &[ScriptArg]) -> PagewrightResult<Value> {
        let responder = {
            let mut state = self.session()?;
            for arg in args {
                if let ScriptArg::Element(id) = arg {
                    state.node(id)?;
                }
            }
            state
                .interactions
                .push(Interaction::Script(script.to_string()));
            state
                .scripts
                .iter()
                .rev()
                .find(|(pattern, _)| script.contains(pattern.as_str()))
                .map(|(_, responder)| Arc::clone(responder))
        };
        match responder {
            Some(responder) => responder(args),
            None => Ok(Value::Null),
        }
    }

    fn cookies(&self) -> PagewrightResult<Vec<Cookie>> {
        Ok(self.session()?.cookies.clone())
    }

    fn add_cookie(&self, cookie: Cookie) -> PagewrightResult<()> {
        let mut state = self.session()?;
        state.cookies.retain(|c| c.name != cookie.name);
        state.cookies.push(cookie);
        Ok(())
    }

    fn delete_cookie(&self, name: &str) -> PagewrightResult<()> {
        self.session()?.cookies.retain(|c| c.name != name);
        Ok(())
    }

    fn delete_all_cookies(&self) -> PagewrightResult<()> {
        self.session()?.cookies.clear();
        Ok(())
    }

    fn window_handles(&self) -> PagewrightResult<Vec<String>> {
        Ok(self.session()?.windows.clone())
    }

    fn current_window(&self) -> PagewrightResult<String> {
        let state = self.session()?;
        state
            .windows
            .get(state.current_window)
            .cloned()
            .ok_or_else(|| PagewrightError::driver("no window is open"))
    }

    fn switch_to_window(&self, handle: &str) -> PagewrightResult<()> {
        let mut state = self.session()?;
        let Some(pos) = state.windows.iter().position(|w| w == handle) else {
            return Err(PagewrightError::driver(format!("no such window: {handle}")));
        };
        state.current_window = pos;
        Ok(())
    }

    fn alert_text(&self) -> PagewrightResult<String> {
        self.session()?
            .alert
            .clone()
            .ok_or(PagewrightError::NoAlertPresent)
    }

    fn accept_alert(&self) -> PagewrightResult<()> {
        let mut state = self.session()?;
        state.alert.take().ok_or(PagewrightError::NoAlertPresent)?;
        state.interactions.push(Interaction::AcceptAlert);
        Ok(())
    }

    fn dismiss_alert(&self) -> PagewrightResult<()> {
        let mut state = self.session()?;
        state.alert.take().ok_or(PagewrightError::NoAlertPresent)?;
        state.interactions.push(Interaction::DismissAlert);
        Ok(())
    }

    fn screenshot_png(&self) -> PagewrightResult<Vec<u8>> {
        let _state = self.session()?;
        Ok(PNG_SIGNATURE.to_vec())
    }

    fn close(&self) -> PagewrightResult<()> {
        let mut state = self.session()?;
        let current = state.current_window;
        if current < state.windows.len() {
            state.windows.remove(current);
        }
        state.current_window = 0;
        if state.windows.is_empty() {
            state.quit = true;
        }
        Ok(())
    }

    fn quit(&self) -> PagewrightResult<()> {
        self.lock().quit = true;
        Ok(())
    }
}

// =============================================================================
// CSS SUBSET
// =============================================================================

mod css {
    use super::Node;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(super) enum Combinator {
        Descendant,
        Child,
    }

    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub(super) struct Compound {
        tag: Option<String>,
        id: Option<String>,
        classes: Vec<String>,
        attrs: Vec<(String, Option<String>)>,
    }

    pub(super) type Complex = Vec<(Combinator, Compound)>;

    pub(super) fn parse(selector: &str) -> Result<Vec<Complex>, String> {
        split_outside_brackets(selector, ',')
            .iter()
            .map(|part| parse_complex(part.trim()))
            .collect()
    }

    fn split_outside_brackets(input: &str, separator: char) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        for c in input.chars() {
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
                current.push(c);
                continue;
            }
            match c {
                '"' | '\'' => {
                    quote = Some(c);
                    current.push(c);
                }
                '[' => {
                    depth += 1;
                    current.push(c);
                }
                ']' => {
                    depth = depth.saturating_sub(1);
                    current.push(c);
                }
                c if c == separator && depth == 0 => parts.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
        parts.push(current);
        parts
    }

    fn parse_complex(input: &str) -> Result<Complex, String> {
        let mut parts = Vec::new();
        let mut pending = Combinator::Descendant;
        let mut current = String::new();
        let mut in_brackets = false;

        let mut flush = |current: &mut String, pending: &mut Combinator| -> Result<(), String> {
            if !current.is_empty() {
                parts.push((*pending, parse_compound(current)?));
                current.clear();
                *pending = Combinator::Descendant;
            }
            Ok(())
        };

        for c in input.chars() {
            if in_brackets {
                if c == ']' {
                    in_brackets = false;
                }
                current.push(c);
            } else if c == '[' {
                in_brackets = true;
                current.push(c);
            } else if c.is_whitespace() {
                flush(&mut current, &mut pending)?;
            } else if c == '>' {
                flush(&mut current, &mut pending)?;
                pending = Combinator::Child;
            } else {
                current.push(c);
            }
        }
        let dangling = current.is_empty() && pending == Combinator::Child;
        flush(&mut current, &mut pending)?;

        if parts.is_empty() {
            return Err("empty selector".to_string());
        }
        if dangling || parts[0].0 == Combinator::Child {
            return Err("dangling '>' combinator".to_string());
        }
        Ok(parts)
    }

    fn is_ident_char(c: char) -> bool {
        c.is_alphanumeric() || c == '-' || c == '_'
    }

    fn read_ident(chars: &[char], i: &mut usize) -> String {
        let start = *i;
        while *i < chars.len() && is_ident_char(chars[*i]) {
            *i += 1;
        }
        chars[start..*i].iter().collect()
    }

    fn parse_compound(input: &str) -> Result<Compound, String> {
        let chars: Vec<char> = input.chars().collect();
        let mut compound = Compound::default();
        let mut i = 0;

        if chars.first() == Some(&'*') {
            i = 1;
        } else {
            let tag = read_ident(&chars, &mut i);
            if !tag.is_empty() {
                compound.tag = Some(tag.to_ascii_lowercase());
            }
        }

        while i < chars.len() {
            match chars[i] {
                '#' => {
                    i += 1;
                    let id = read_ident(&chars, &mut i);
                    if id.is_empty() {
                        return Err(format!("missing id in '{input}'"));
                    }
                    compound.id = Some(id);
                }
                '.' => {
                    i += 1;
                    let class = read_ident(&chars, &mut i);
                    if class.is_empty() {
                        return Err(format!("missing class in '{input}'"));
                    }
                    compound.classes.push(class);
                }
                '[' => {
                    let close = chars[i..]
                        .iter()
                        .position(|&c| c == ']')
                        .ok_or_else(|| format!("unterminated attribute in '{input}'"))?;
                    let body: String = chars[i + 1..i + close].iter().collect();
                    compound.attrs.push(parse_attribute(&body)?);
                    i += close + 1;
                }
                other => return Err(format!("unsupported token '{other}' in '{input}'")),
            }
        }
        Ok(compound)
    }

    fn parse_attribute(body: &str) -> Result<(String, Option<String>), String> {
        match body.split_once('=') {
            None => Ok((body.trim().to_string(), None)),
            Some((name, value)) => {
                let name = name.trim();
                if name.ends_with(['~', '|', '^', '$', '*']) {
                    return Err(format!("unsupported attribute operator in '[{body}]'"));
                }
                let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                Ok((name.to_string(), Some(value.to_string())))
            }
        }
    }

    pub(super) fn matches_compound(node: &Node, compound: &Compound) -> bool {
        if let Some(tag) = &compound.tag {
            if !node.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &compound.id {
            if node.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !compound.classes.iter().all(|c| node.has_class(c)) {
            return false;
        }
        compound.attrs.iter().all(|(name, value)| match value {
            None => node.attr(name).is_some(),
            Some(v) => node.attr(name) == Some(v.as_str()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn login_page() -> MockDriver {
        let driver = MockDriver::new();
        driver.load(
            MockElement::new("body").child(
                MockElement::new("form")
                    .id("login")
                    .child(MockElement::new("input").name("user").value("bob"))
                    .child(MockElement::input("checkbox").id("remember"))
                    .child(MockElement::new("button").class("btn primary").text("Go"))
                    .child(MockElement::new("div").class("error").text("Oops").hidden()),
            ),
        );
        driver
    }

    mod css_tests {
        use super::*;

        fn count(driver: &MockDriver, css: &str) -> usize {
            driver.find_elements(None, &By::css(css)).unwrap().len()
        }

        #[test]
        fn test_css_descendant_and_child() {
            let driver = login_page();
            assert_eq!(count(&driver, "body input"), 2);
            assert_eq!(count(&driver, "body > input"), 0);
            assert_eq!(count(&driver, "form>input"), 2);
        }

        #[test]
        fn test_css_classes_and_attributes() {
            let driver = login_page();
            assert_eq!(count(&driver, "button.btn.primary"), 1);
            assert_eq!(count(&driver, "input[type=\"checkbox\"]"), 1);
            assert_eq!(count(&driver, "[name]"), 1);
        }

        #[test]
        fn test_css_selector_list() {
            let driver = login_page();
            let found = driver
                .find_elements(None, &By::css("#remember, button"))
                .unwrap();
            assert_eq!(found.len(), 2);
        }

        #[test]
        fn test_invalid_css_reports_selector() {
            let driver = login_page();
            let err = driver.find_elements(None, &By::css("a:hover")).unwrap_err();
            assert!(matches!(err, PagewrightError::InvalidSelector { .. }));
            let err = driver.find_elements(None, &By::css("a >")).unwrap_err();
            assert!(matches!(err, PagewrightError::InvalidSelector { .. }));
        }

        #[test]
        fn test_xpath_unsupported() {
            let driver = login_page();
            assert!(driver.find_elements(None, &By::xpath("//a")).is_err());
        }
    }

    mod dom_tests {
        use super::*;

        #[test]
        fn test_replaced_node_goes_stale() {
            let driver = login_page();
            let button = driver.first(&By::tag_name("button")).unwrap();
            let fresh = driver
                .replace(&button, MockElement::new("button").text("Log in"))
                .unwrap();
            assert!(driver.text(&button).unwrap_err().is_stale());
            assert_eq!(driver.text(&fresh).unwrap(), "Log in");
        }

        #[test]
        fn test_load_detaches_previous_document() {
            let driver = login_page();
            let form = driver.first(&By::id("login")).unwrap();
            driver.load(MockElement::new("body"));
            assert!(driver.is_displayed(&form).unwrap_err().is_stale());
        }

        #[test]
        fn test_hidden_text_is_empty_but_text_content_is_not() {
            let driver = login_page();
            let error = driver.first(&By::class_name("error")).unwrap();
            assert_eq!(driver.text(&error).unwrap(), "");
            assert_eq!(
                driver.attribute(&error, "textContent").unwrap().as_deref(),
                Some("Oops")
            );
            assert!(!driver.is_displayed(&error).unwrap());
        }

        #[test]
        fn test_first_does_not_count_as_search() {
            let driver = login_page();
            driver.first(&By::id("login")).unwrap();
            assert_eq!(driver.find_count(), 0);
        }
    }

    mod interaction_tests {
        use super::*;

        #[test]
        fn test_checkbox_toggles() {
            let driver = login_page();
            let remember = driver.first(&By::id("remember")).unwrap();
            driver.click(&remember).unwrap();
            assert!(driver.is_selected(&remember).unwrap());
            driver.click(&remember).unwrap();
            assert!(!driver.is_selected(&remember).unwrap());
            assert_eq!(driver.click_count(&remember), 2);
        }

        #[test]
        fn test_send_keys_edits_value() {
            let driver = login_page();
            let user = driver.first(&By::name("user")).unwrap();
            driver.send_keys(&user, "by").unwrap();
            assert_eq!(driver.value(&user).unwrap(), "bobby");
            driver.send_keys(&user, Keys::BACKSPACE).unwrap();
            assert_eq!(driver.value(&user).unwrap(), "bobb");
            driver
                .send_keys(&user, &format!("{}a{}", Keys::CONTROL, Keys::DELETE))
                .unwrap();
            assert_eq!(driver.value(&user).unwrap(), "");
        }

        #[test]
        fn test_hidden_element_is_not_interactable() {
            let driver = login_page();
            let error = driver.first(&By::class_name("error")).unwrap();
            let err = driver.click(&error).unwrap_err();
            assert!(matches!(err, PagewrightError::Unusable { .. }));
        }

        #[test]
        fn test_click_effect_hides_target() {
            let driver = login_page();
            let button = driver.first(&By::tag_name("button")).unwrap();
            let form = driver.first(&By::id("login")).unwrap();
            driver.on_click(&button, ClickEffect::Hide(form.clone()));
            driver.click(&button).unwrap();
            assert!(!driver.is_displayed(&form).unwrap());
        }

        #[test]
        fn test_alerts() {
            let driver = MockDriver::new();
            assert!(matches!(driver.alert_text(), Err(PagewrightError::NoAlertPresent)));
            driver.set_alert(Some("Saved"));
            assert_eq!(driver.alert_text().unwrap(), "Saved");
            driver.accept_alert().unwrap();
            assert!(driver.accept_alert().is_err());
        }

        #[test]
        fn test_script_responders() {
            let driver = MockDriver::new();
            let run = |script: &str| driver.execute_script(script, &[]).unwrap();
            assert_eq!(
                run("return document.readyState == 'complete';"),
                Value::Bool(true)
            );
            driver.on_script("$.active", |_| Ok(Value::Bool(false)));
            assert_eq!(run("return !$.active;"), Value::Bool(false));
            assert_eq!(run("return 1;"), Value::Null);
        }

        #[test]
        fn test_history_navigation() {
            let driver = MockDriver::new();
            driver.navigate("https://a.test/").unwrap();
            driver.navigate("https://b.test/").unwrap();
            driver.back().unwrap();
            assert_eq!(driver.current_url().unwrap(), "https://a.test/");
            driver.forward().unwrap();
            assert_eq!(driver.current_url().unwrap(), "https://b.test/");
        }

        #[test]
        fn test_quit_ends_session() {
            let driver = MockDriver::new();
            driver.quit().unwrap();
            assert!(driver.current_url().is_err());
            assert!(driver.is_quit());
        }
    }
}
