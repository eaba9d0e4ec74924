//! Ingestion and a small mutable arena tree used by the template engine.
//!
//! `scraper`/`ego-tree` give us an immutable parsed DOM; the merge algorithm
//! in [`super::HtmlTemplate`] needs to mutate node flags and drain/backlog
//! children in place, so on ingress we copy the parsed tree into a flat
//! `Vec`-backed arena ([`TemplateNode`] + indices) that is cheap to walk
//! with explicit cursors.

use scraper::{Html, Selector};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Tags stripped entirely on ingress: never contribute content or noise to
/// the template (comments are dropped by the parser already).
const NOISY_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// A single element node in the template arena.
#[derive(Debug, Clone)]
pub struct TemplateNode {
    /// Lowercase tag name.
    pub tag: String,
    /// Attributes other than `class`, keyed by name. A value may be a
    /// `||`-separated union when the attribute is unstable.
    pub attrs: BTreeMap<String, String>,
    /// Attribute names whose value is allowed to vary across loads.
    pub unstable_attributes: HashSet<String>,
    /// The element's `class` attribute, split into a set.
    pub classes: HashSet<String>,
    /// Direct text content of this element (not descendants'); may be a
    /// `||`-separated union when `unstable_text` is set.
    pub text: String,
    /// Whether `text` is allowed to vary across loads.
    pub unstable_text: bool,
    /// Whether this whole subtree may appear, disappear, or reorder.
    pub unstable_element: bool,
    /// Whether the interface considers this subtree reachable; unreachable
    /// subtrees are opaque to matching (they never disagree).
    pub reachable: bool,
    /// Indices of child nodes in the owning arena, in document order.
    pub children: Vec<usize>,
}

impl TemplateNode {
    /// Whether the `class` set is allowed to vary. Class instability rides
    /// on the same `unstable_attributes` marker set as named attributes,
    /// under the pseudo-name `"class"`.
    pub fn class_unstable(&self) -> bool {
        self.unstable_attributes.contains("class")
    }

    fn leaf(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            unstable_attributes: HashSet::new(),
            classes: HashSet::new(),
            text: String::new(),
            unstable_text: false,
            unstable_element: false,
            reachable: true,
            children: Vec::new(),
        }
    }
}

/// A flat, index-addressed tree of [`TemplateNode`]s.
#[derive(Debug, Clone)]
pub struct Arena {
    pub(crate) nodes: Vec<TemplateNode>,
    pub(crate) root: usize,
}

impl Arena {
    /// Parse a raw HTML string into a normalized arena.
    ///
    /// Normalization (§4.2 "Stability checks on ingress"): strip comments
    /// (dropped by the parser), scripts/styles/noisy tags, absolute-ize
    /// relative `href`/`src` links is left to the interface layer (it knows
    /// the page URL); here we collapse whitespace runs and guarantee an
    /// `<html><body>` wrapper exists.
    pub fn parse(raw: &str) -> Self {
        let document = Html::parse_document(raw);
        #[allow(clippy::unwrap_used)]
        let html_selector = Selector::parse("html").unwrap();
        let html_ref = document.select(&html_selector).next();

        let mut nodes = Vec::new();
        let root = if let Some(html_el) = html_ref {
            build_from_element(html_el, &mut nodes)
        } else {
            // No <html> wrapper: synthesize one around whatever the parser
            // produced at the document root.
            let wrapper = nodes.len();
            nodes.push(TemplateNode::leaf("html"));
            let body = nodes.len();
            nodes.push(TemplateNode::leaf("body"));
            nodes[wrapper].children.push(body);
            for child in document.root_element().children() {
                if let Some(el) = scraper::ElementRef::wrap(child) {
                    let idx = build_from_element(el, &mut nodes);
                    nodes[body].children.push(idx);
                }
            }
            wrapper
        };

        let mut arena = Self { nodes, root };
        ensure_body_wrapper(&mut arena);
        arena
    }

    /// Render this arena back to a normalized HTML string (used for the
    /// "template equal-by-string to either" idempotence check and for
    /// comparator stages that want plain text).
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        render_node(self, self.root, &mut out);
        out
    }

    /// xpath of every node, in document order, keyed by node index.
    pub fn xpaths(&self) -> HashMap<usize, String> {
        let mut map = HashMap::new();
        assign_xpaths(self, self.root, "", &mut map);
        map
    }

    /// Count how many times each class name appears across the whole tree
    /// (used to test "globally unique" class correspondence).
    pub fn class_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for node in &self.nodes {
            for class in &node.classes {
                *counts.entry(class.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Count how many times each `(attr_name, value)` pair appears across
    /// the whole tree, excluding `class` and the instability markers.
    pub fn attr_counts(&self) -> HashMap<(String, String), usize> {
        let mut counts = HashMap::new();
        for node in &self.nodes {
            for (k, v) in &node.attrs {
                *counts.entry((k.clone(), v.clone())).or_insert(0) += 1;
            }
        }
        counts
    }
}

fn build_from_element(el: scraper::ElementRef, nodes: &mut Vec<TemplateNode>) -> usize {
    let tag = el.value().name().to_lowercase();
    if NOISY_TAGS.contains(&tag.as_str()) {
        // Shouldn't be called for noisy tags directly, but guard anyway.
    }

    let mut node = TemplateNode::leaf(&tag);
    for (name, value) in el.value().attrs() {
        if name.eq_ignore_ascii_case("class") {
            node.classes = value.split_whitespace().map(|c| c.to_string()).collect();
        } else {
            node.attrs.insert(name.to_lowercase(), value.to_string());
        }
    }

    let idx = nodes.len();
    nodes.push(node);

    let mut direct_text = String::new();
    for child in el.children() {
        if let Some(child_el) = scraper::ElementRef::wrap(child) {
            let child_tag = child_el.value().name().to_lowercase();
            if NOISY_TAGS.contains(&child_tag.as_str()) {
                continue;
            }
            let child_idx = build_from_element(child_el, nodes);
            nodes[idx].children.push(child_idx);
        } else if let Some(text) = child.value().as_text() {
            direct_text.push_str(text);
        }
    }
    nodes[idx].text = collapse_whitespace(&direct_text);
    idx
}

fn ensure_body_wrapper(arena: &mut Arena) {
    let root = arena.root;
    let has_body = arena.nodes[root]
        .children
        .iter()
        .any(|&c| arena.nodes[c].tag == "body");
    if arena.nodes[root].tag == "html" && !has_body {
        let orphans = std::mem::take(&mut arena.nodes[root].children);
        let (head, rest): (Vec<usize>, Vec<usize>) = orphans
            .into_iter()
            .partition(|&c| arena.nodes[c].tag == "head");
        let body_idx = arena.nodes.len();
        arena.nodes.push(TemplateNode::leaf("body"));
        arena.nodes[body_idx].children = rest;
        let mut children = head;
        children.push(body_idx);
        arena.nodes[root].children = children;
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn assign_xpaths(arena: &Arena, idx: usize, prefix: &str, out: &mut HashMap<usize, String>) {
    let node = &arena.nodes[idx];
    let path = format!("{}/{}", prefix, node.tag);
    out.insert(idx, path.clone());

    let mut seen_counts: HashMap<String, usize> = HashMap::new();
    for &child in &node.children {
        let child_tag = arena.nodes[child].tag.clone();
        let count = seen_counts.entry(child_tag).or_insert(0);
        *count += 1;
        let child_prefix = format!("{}[{}]", path, count);
        assign_xpaths(arena, child, &child_prefix, out);
    }
}

fn render_node(arena: &Arena, idx: usize, out: &mut String) {
    let node = &arena.nodes[idx];
    out.push('<');
    out.push_str(&node.tag);
    if !node.classes.is_empty() {
        let mut classes: Vec<&String> = node.classes.iter().collect();
        classes.sort();
        out.push_str(&format!(
            " class=\"{}\"",
            classes.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(" ")
        ));
    }
    for (k, v) in &node.attrs {
        out.push_str(&format!(" {}=\"{}\"", k, v));
    }
    out.push('>');
    out.push_str(&node.text);
    for &child in &node.children {
        render_node(arena, child, out);
    }
    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
}

/// A compact structural skeleton (tag names and nesting only) used by the
/// comparator pipeline's structural stage.
pub fn tag_skeleton(raw: &str) -> String {
    let arena = Arena::parse(raw);
    let mut out = String::new();
    skeleton_node(&arena, arena.root, &mut out);
    out
}

fn skeleton_node(arena: &Arena, idx: usize, out: &mut String) {
    let node = &arena.nodes[idx];
    out.push('(');
    out.push_str(&node.tag);
    for &child in &node.children {
        skeleton_node(arena, child, out);
    }
    out.push(')');
}

/// Concatenated, document-order visible text used by the comparator
/// pipeline's textual stage.
pub fn visible_text(raw: &str) -> String {
    let arena = Arena::parse(raw);
    let mut out = String::new();
    text_node(&arena, arena.root, &mut out);
    collapse_whitespace(&out)
}

fn text_node(arena: &Arena, idx: usize, out: &mut String) {
    let node = &arena.nodes[idx];
    out.push(' ');
    out.push_str(&node.text);
    for &child in &node.children {
        text_node(arena, child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ensures_html_and_body_wrappers() {
        let arena = Arena::parse("<div>hi</div>");
        assert_eq!(arena.nodes[arena.root].tag, "html");
        let body = arena.nodes[arena.root]
            .children
            .iter()
            .find(|&&c| arena.nodes[c].tag == "body")
            .copied();
        assert!(body.is_some());
    }

    #[test]
    fn noisy_tags_are_stripped() {
        let arena = Arena::parse("<html><body><script>evil()</script><p>hi</p></body></html>");
        let body = arena.nodes[arena.root].children[0];
        assert_eq!(arena.nodes[body].children.len(), 1);
        assert_eq!(arena.nodes[arena.nodes[body].children[0]].tag, "p");
    }

    #[test]
    fn whitespace_is_collapsed() {
        let arena = Arena::parse("<html><body><p>a   \n  b</p></body></html>");
        let body = arena.nodes[arena.root].children[0];
        let p = arena.nodes[body].children[0];
        assert_eq!(arena.nodes[p].text, "a b");
    }

    #[test]
    fn identical_documents_have_equal_skeletons() {
        let a = tag_skeleton("<html><body><div><p>x</p></div></body></html>");
        let b = tag_skeleton("<html><body><div><p>y</p></div></body></html>");
        assert_eq!(a, b);
    }
}
