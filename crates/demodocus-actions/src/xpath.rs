//! Shared DOM-walking helper for candidate-element discovery (§4.4).
//!
//! Every concrete action needs to find elements on the current page and
//! name them the same way the core template engine names them internally
//! (`demodocus_core::template::tree::Arena::xpaths`), so that edges
//! recorded by different actions and the states a concrete
//! `InterfaceAccess` observes agree on what "the same element" means.
//! That assignment is private to `demodocus-core`, so this is an
//! independent implementation of the identical scheme: a node's xpath is
//! its ancestors' tag names (each decorated with its position among
//! same-tag siblings one level up) followed by this node's own,
//! undecorated tag name.

use scraper::{ElementRef, Html};
use std::collections::{BTreeMap, HashMap};

/// A flattened, owned snapshot of one element: enough for an action to
/// decide whether it's a candidate without borrowing from the parsed
/// document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSnapshot {
    /// This element's xpath, in the scheme described above.
    pub xpath: String,
    /// Lowercase tag name.
    pub tag: String,
    /// Attributes, lowercase-keyed, `class` included as a plain attribute.
    pub attrs: BTreeMap<String, String>,
    /// Direct and descendant visible text, whitespace-collapsed.
    pub text: String,
}

impl ElementSnapshot {
    /// An attribute's value, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Whether `name` is present, regardless of value.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// The element's space-separated `class` values.
    pub fn classes(&self) -> Vec<&str> {
        self.attr("class").map(|c| c.split_whitespace().collect()).unwrap_or_default()
    }

    /// Whether the element is disabled via the boolean `disabled` attribute
    /// or `aria-disabled="true"`.
    pub fn is_disabled(&self) -> bool {
        self.has_attr("disabled") || self.attr("aria-disabled") == Some("true")
    }
}

/// Walk `html`'s element tree in document order, assigning each element an
/// xpath.
pub fn collect_elements(html: &str) -> Vec<ElementSnapshot> {
    let document = Html::parse_document(html);
    let mut out = Vec::new();
    walk(document.root_element(), "", &mut out);
    out
}

/// Find a previously collected element by its xpath.
pub fn find<'a>(elements: &'a [ElementSnapshot], xpath: &str) -> Option<&'a ElementSnapshot> {
    elements.iter().find(|e| e.xpath == xpath)
}

fn walk(el: ElementRef<'_>, prefix: &str, out: &mut Vec<ElementSnapshot>) {
    let tag = el.value().name().to_ascii_lowercase();
    let path = format!("{prefix}/{tag}");

    let attrs = el
        .value()
        .attrs()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
        .collect::<BTreeMap<_, _>>();
    let text = el
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    out.push(ElementSnapshot { xpath: path.clone(), tag: tag.clone(), attrs, text });

    let mut seen_counts: HashMap<String, usize> = HashMap::new();
    for child in el.children().filter_map(ElementRef::wrap) {
        let child_tag = child.value().name().to_ascii_lowercase();
        let count = seen_counts.entry(child_tag).or_insert(0);
        *count += 1;
        let child_prefix = format!("{path}[{count}]");
        walk(child, &child_prefix, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_xpaths_matching_the_core_template_scheme() {
        let html = "<html><body><button>A</button><button>B</button></body></html>";
        let elements = collect_elements(html);
        let buttons: Vec<_> = elements.iter().filter(|e| e.tag == "button").collect();
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[0].xpath, "/html/body[1]/button");
        assert_eq!(buttons[1].xpath, "/html/body[2]/button");
    }

    #[test]
    fn captures_attributes_and_text() {
        let html = r#"<html><body><a href="/x" class="nav">hi  there</a></body></html>"#;
        let elements = collect_elements(html);
        let a = elements.iter().find(|e| e.tag == "a").unwrap();
        assert_eq!(a.attr("href"), Some("/x"));
        assert_eq!(a.classes(), vec!["nav"]);
        assert_eq!(a.text, "hi there");
    }

    #[test]
    fn disabled_detection_covers_boolean_and_aria() {
        let html = r#"<html><body><button disabled>A</button><button aria-disabled="true">B</button><button>C</button></body></html>"#;
        let elements = collect_elements(html);
        let buttons: Vec<_> = elements.iter().filter(|e| e.tag == "button").collect();
        assert!(buttons[0].is_disabled());
        assert!(buttons[1].is_disabled());
        assert!(!buttons[2].is_disabled());
    }
}
