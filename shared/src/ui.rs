//! Class-based show/hide state for the on-screen info elements.
//!
//! Each element carries a list of class tokens. The client maps tokens to
//! presentation, e.g. [`FADE_OUT`] starts the fade of the intro box.

use std::collections::BTreeMap;

/// The intro info box shown until the first key press.
pub const INFOBOX_INTRO: &str = "infoboxIntro";

pub const FADE_OUT: &str = "fade-out";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Element {
    classes: Vec<String>,
    /// Classes restored by a resetting `add_class`.
    base: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    elements: BTreeMap<&'static str, Element>,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        let mut elements = BTreeMap::new();
        elements.insert(INFOBOX_INTRO, Element::default());
        Self { elements }
    }

    /// Register an element whose classes are reset to `base`.
    pub fn with_element(mut self, name: &'static str, base: &[&str]) -> Self {
        let base: Vec<String> = base.iter().map(|c| c.to_string()).collect();
        self.elements.insert(
            name,
            Element {
                classes: base.clone(),
                base,
            },
        );
        self
    }

    /// Append `class` to `element`. With `reset` the element first drops back to its
    /// base classes. Unknown elements are ignored.
    pub fn add_class(&mut self, element: &str, class: &str, reset: bool) {
        let Some(el) = self.elements.get_mut(element) else {
            log::warn!("ui element {element} does not exist");
            return;
        };
        if reset {
            el.classes.clone_from(&el.base);
        }
        el.classes.push(class.to_string());
    }

    /// Remove every occurrence of `class` from `element`.
    pub fn remove_class(&mut self, element: &str, class: &str) {
        if let Some(el) = self.elements.get_mut(element) {
            el.classes.retain(|c| !c.eq_ignore_ascii_case(class));
        }
    }

    pub fn has_class(&self, element: &str, class: &str) -> bool {
        self.elements
            .get(element)
            .is_some_and(|el| el.classes.iter().any(|c| c == class))
    }

    /// Start fading `element` out. Repeated calls do nothing.
    pub fn fade_out(&mut self, element: &str) {
        if !self.has_class(element, FADE_OUT) {
            self.add_class(element, FADE_OUT, false);
        }
    }

    /// Space separated class list, as it would appear on a DOM element.
    pub fn class_name(&self, element: &str) -> Option<String> {
        self.elements.get(element).map(|el| el.classes.join(" "))
    }
}
