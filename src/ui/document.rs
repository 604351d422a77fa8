//! Minimal element tree
//!
//! Just enough of a DOM for the page controllers: elements with a tag, an
//! optional id, a class list, text content and a parent. Lookups accept a
//! small selector language (`tag`, `#id`, `.class`, compounds such as
//! `div.dot.active`, and descendant chains such as `.carousel-dots .dot`).
//!
//! Every class or text change that actually alters an element is counted,
//! so tests can assert that an operation touched nothing.

use std::fmt;

use crate::error::{AuraError, Result};

/// Handle to an element of a `Document`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    text: String,
    parent: Option<ElementId>,
}

/// One compound selector: optional tag, optional id, any number of classes
#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(text: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let mut rest = text;

        let tag_end = rest.find(&['#', '.'][..]).unwrap_or(rest.len());
        if tag_end > 0 {
            compound.tag = Some(rest[..tag_end].to_string());
        }
        rest = &rest[tag_end..];

        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(&['#', '.'][..]).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return None;
            }
            match marker {
                '#' if compound.id.is_none() => compound.id = Some(name.to_string()),
                '.' => compound.classes.push(name.to_string()),
                _ => return None,
            }
            rest = &body[end..];
        }
        Some(compound)
    }

    fn matches(&self, element: &Element) -> bool {
        self.tag.as_deref().map_or(true, |t| t == element.tag)
            && self
                .id
                .as_deref()
                .map_or(true, |id| element.id.as_deref() == Some(id))
            && self
                .classes
                .iter()
                .all(|c| element.classes.iter().any(|ec| ec == c))
    }
}

/// A descendant chain of compounds, outermost first
#[derive(Debug, Clone, PartialEq)]
struct Selector(Vec<Compound>);

impl Selector {
    fn parse(text: &str) -> Option<Self> {
        let compounds = text
            .split_whitespace()
            .map(Compound::parse)
            .collect::<Option<Vec<_>>>()?;
        if compounds.is_empty() {
            None
        } else {
            Some(Selector(compounds))
        }
    }
}

/// An ordered tree of elements
///
/// # Example
/// ```
/// use aura::ui::Document;
///
/// let mut doc = Document::new();
/// let list = doc.append(None, "div", None, &["carousel-dots"]);
/// let dot = doc.append(Some(list), "span", None, &["dot", "active"]);
/// assert_eq!(doc.query_selector(".carousel-dots .dot.active"), Some(dot));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: Vec<Element>,
    mutations: u64,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element after every existing one
    pub fn append(
        &mut self,
        parent: Option<ElementId>,
        tag: &str,
        id: Option<&str>,
        classes: &[&str],
    ) -> ElementId {
        self.elements.push(Element {
            tag: tag.to_string(),
            id: id.map(str::to_string),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            text: String::new(),
            parent,
        });
        ElementId(self.elements.len() - 1)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element with the given id attribute
    pub fn get_element_by_id(&self, id: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|e| e.id.as_deref() == Some(id))
            .map(ElementId)
    }

    /// Every element matching `selector`, in document order
    ///
    /// A malformed selector matches nothing.
    pub fn query_selector_all(&self, selector: &str) -> Vec<ElementId> {
        let Some(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        (0..self.elements.len())
            .map(ElementId)
            .filter(|&id| self.matches(id, &selector))
            .collect()
    }

    /// First element matching `selector`
    pub fn query_selector(&self, selector: &str) -> Option<ElementId> {
        self.query_selector_all(selector).into_iter().next()
    }

    /// First element matching `selector`, or `MissingElement`
    pub fn require(&self, selector: &str) -> Result<ElementId> {
        self.query_selector(selector)
            .ok_or_else(|| AuraError::MissingElement {
                selector: selector.to_string(),
            })
    }

    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.elements[element.0].classes.iter().any(|c| c == class)
    }

    /// Class list of an element
    pub fn classes(&self, element: ElementId) -> &[String] {
        &self.elements[element.0].classes
    }

    /// Add a class; returns whether the element changed
    pub fn add_class(&mut self, element: ElementId, class: &str) -> bool {
        if self.has_class(element, class) {
            return false;
        }
        self.elements[element.0].classes.push(class.to_string());
        self.mutations += 1;
        true
    }

    /// Remove a class; returns whether the element changed
    pub fn remove_class(&mut self, element: ElementId, class: &str) -> bool {
        let classes = &mut self.elements[element.0].classes;
        let before = classes.len();
        classes.retain(|c| c != class);
        let changed = classes.len() != before;
        if changed {
            self.mutations += 1;
        }
        changed
    }

    /// Add the class when `on`, remove it otherwise
    pub fn set_class(&mut self, element: ElementId, class: &str, on: bool) -> bool {
        if on {
            self.add_class(element, class)
        } else {
            self.remove_class(element, class)
        }
    }

    pub fn text(&self, element: ElementId) -> &str {
        &self.elements[element.0].text
    }

    /// Replace the text content; returns whether it changed
    pub fn set_text(&mut self, element: ElementId, text: &str) -> bool {
        let current = &mut self.elements[element.0].text;
        if current == text {
            return false;
        }
        *current = text.to_string();
        self.mutations += 1;
        true
    }

    /// Total number of effective changes made so far
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    pub fn reset_mutation_count(&mut self) {
        self.mutations = 0;
    }

    fn matches(&self, id: ElementId, selector: &Selector) -> bool {
        let Some((last, ancestors)) = selector.0.split_last() else {
            return false;
        };
        if !last.matches(&self.elements[id.0]) {
            return false;
        }

        // Greedy nearest-ancestor matching is exact for descendant chains
        let mut remaining = ancestors.iter().rev();
        let mut pending = remaining.next();
        let mut cursor = self.elements[id.0].parent;
        while let (Some(compound), Some(parent)) = (pending, cursor) {
            if compound.matches(&self.elements[parent.0]) {
                pending = remaining.next();
            }
            cursor = self.elements[parent.0].parent;
        }
        pending.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn sample() -> (Document, Vec<ElementId>) {
        let mut doc = Document::new();
        let player = doc.append(None, "div", Some("musicPlayer"), &["music-player"]);
        let play = doc.append(Some(player), "svg", None, &["play-icon"]);
        let pause = doc.append(Some(player), "svg", None, &["pause-icon", "hidden"]);
        let dots = doc.append(None, "div", None, &["carousel-dots"]);
        let dot0 = doc.append(Some(dots), "button", None, &["dot", "active"]);
        let dot1 = doc.append(Some(dots), "button", None, &["dot"]);
        let stray = doc.append(None, "button", None, &["dot"]);
        (doc, vec![player, play, pause, dots, dot0, dot1, stray])
    }

    #[test_case("#musicPlayer", &[0] ; "by id")]
    #[test_case(".dot", &[4, 5, 6] ; "by class")]
    #[test_case("button.dot.active", &[4] ; "compound")]
    #[test_case(".carousel-dots .dot", &[4, 5] ; "descendant")]
    #[test_case("#musicPlayer svg", &[1, 2] ; "descendant by tag")]
    #[test_case(".missing", &[] ; "no match")]
    #[test_case("..", &[] ; "malformed")]
    fn test_query_selector_all(selector: &str, expected: &[usize]) {
        let (doc, ids) = sample();
        let expected: Vec<ElementId> = expected.iter().map(|&i| ids[i]).collect();
        assert_eq!(doc.query_selector_all(selector), expected);
    }

    #[test]
    fn test_require_reports_missing_selector() {
        let (doc, _) = sample();
        let err = doc.require(".zen-carousel").unwrap_err();
        assert_eq!(err.to_string(), "Missing page element: .zen-carousel");
    }

    #[test]
    fn test_mutations_count_only_real_changes() {
        let (mut doc, ids) = sample();
        let pause = ids[2];
        assert!(!doc.add_class(pause, "hidden"));
        assert_eq!(doc.mutation_count(), 0);

        assert!(doc.remove_class(pause, "hidden"));
        assert!(!doc.remove_class(pause, "hidden"));
        assert!(doc.set_text(pause, "Pause"));
        assert!(!doc.set_text(pause, "Pause"));
        assert_eq!(doc.mutation_count(), 2);
        assert_eq!(doc.text(pause), "Pause");
        assert_eq!(doc.classes(pause), &["pause-icon".to_string()]);
    }

    #[test]
    fn test_get_element_by_id() {
        let (doc, ids) = sample();
        assert_eq!(doc.get_element_by_id("musicPlayer"), Some(ids[0]));
        assert_eq!(doc.get_element_by_id("musicBtn"), None);
    }
}
