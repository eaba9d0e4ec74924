//! C2: the HTML template engine (§4.2).
//!
//! An [`HtmlTemplate`] merges multiple observed DOM snapshots of "the same"
//! page into a tree annotated with three orthogonal instability markers
//! (text, attributes, whole-subtree), and can later test whether a new DOM
//! still matches that template, tolerating only the variation it has
//! already observed.

pub mod stability;
pub mod tree;

use crate::error::{Result, TemplateError};
use std::collections::{HashMap, HashSet};
use tree::{Arena, TemplateNode};

/// A merged template tree over one or more observed DOM snapshots.
#[derive(Debug, Clone)]
pub struct HtmlTemplate {
    tree: Arena,
    /// Every raw source string merged into this template, for the ADD
    /// no-op idempotence property.
    merged_sources: HashSet<String>,
    unstable_xpaths: HashSet<String>,
}

impl HtmlTemplate {
    /// Build a template from a single DOM snapshot.
    pub fn from_html(raw: &str) -> Self {
        let tree = Arena::parse(raw);
        let mut merged_sources = HashSet::new();
        merged_sources.insert(raw.to_string());
        let mut template = Self {
            tree,
            merged_sources,
            unstable_xpaths: HashSet::new(),
        };
        template.recompute_unstable_xpaths();
        template
    }

    /// Render the template's current tree back to HTML (used for the
    /// "equal-by-string" idempotence checks and for persisting template
    /// dumps).
    pub fn to_html(&self) -> String {
        self.tree.to_html()
    }

    /// The flattened set of xpaths anywhere marked unstable (text,
    /// attributes, or whole subtree).
    pub fn unstable_xpaths(&self) -> &HashSet<String> {
        &self.unstable_xpaths
    }

    /// ADD: merge a new raw DOM into this template. A no-op if `raw` was
    /// already merged in (idempotence property in §8).
    pub fn add_html(&mut self, raw: &str) {
        if self.merged_sources.contains(raw) {
            return;
        }
        let other = Arena::parse(raw);
        self.merge_in(&other, false);
        self.merged_sources.insert(raw.to_string());
        self.recompute_unstable_xpaths();
    }

    /// ADD: merge another template's tree into this one (used when
    /// combining snapshot templates during stability waiting).
    pub fn add_template(&mut self, other: &HtmlTemplate) {
        for src in &other.merged_sources {
            if !self.merged_sources.contains(src) {
                self.merge_in(&other.tree, false);
                self.merged_sources.insert(src.clone());
            }
        }
        self.recompute_unstable_xpaths();
    }

    /// MATCH: whether a new raw DOM matches this template (§4.2 "Match
    /// walk"). Never mutates the template.
    pub fn matches_html(&self, raw: &str) -> bool {
        self.find_disagreement(raw).is_none()
    }

    /// Like [`Self::matches_html`] but returns the first disagreement
    /// encountered, for diagnostics.
    pub fn find_disagreement(&self, raw: &str) -> Option<TemplateError> {
        let other = Arena::parse(raw);
        let a_xpaths = self.tree.xpaths();
        let b_xpaths = other.xpaths();
        match_node(
            &self.tree,
            self.tree.root,
            &other,
            other.root,
            &a_xpaths,
            &b_xpaths,
        )
        .err()
    }

    /// UPDATE: produce a new template that preserves every instability
    /// marker already present and otherwise takes content from `raw`
    /// (§4.2 "UPDATE"). The result matches `raw` and keeps every xpath
    /// that was unstable in `self` unstable in the result (§8, invariant 6).
    pub fn get_updated_template(&self, raw: &str) -> HtmlTemplate {
        let mut updated = HtmlTemplate::from_html(raw);
        // Re-merge self's tree in overwrite mode: instability markers from
        // `self` survive, but content is taken from `updated` (built from
        // `raw`) wherever there's no existing instability.
        let self_as_other = self.tree.clone();
        updated.merge_in(&self_as_other, true);
        updated.merged_sources = self.merged_sources.clone();
        updated.merged_sources.insert(raw.to_string());
        updated.recompute_unstable_xpaths();
        updated
    }

    fn recompute_unstable_xpaths(&mut self) {
        self.unstable_xpaths = collect_unstable_xpaths(&self.tree);
    }

    /// Merge `other`'s tree into `self`'s tree in place, either unioning
    /// (overwrite=false, the ADD path) or overwriting non-unstable content
    /// from `other` (overwrite=true, the UPDATE path).
    fn merge_in(&mut self, other: &Arena, overwrite: bool) {
        let a_class_counts = self.tree.class_counts();
        let a_attr_counts = self.tree.attr_counts();
        let b_class_counts = other.class_counts();
        let b_attr_counts = other.attr_counts();
        let ctx = MergeCtx {
            a_class_counts,
            a_attr_counts,
            b_class_counts,
            b_attr_counts,
            overwrite,
        };
        merge_node(&mut self.tree, self.tree.root, other, other.root, &ctx);
    }
}

fn collect_unstable_xpaths(tree: &Arena) -> HashSet<String> {
    let xpaths = tree.xpaths();
    let mut out = HashSet::new();
    for (idx, node) in tree.nodes.iter().enumerate() {
        if node.unstable_text || node.unstable_element || !node.unstable_attributes.is_empty() {
            if let Some(xp) = xpaths.get(&idx) {
                out.insert(xp.clone());
            }
        }
    }
    out
}

struct MergeCtx {
    a_class_counts: HashMap<String, usize>,
    a_attr_counts: HashMap<(String, String), usize>,
    b_class_counts: HashMap<String, usize>,
    b_attr_counts: HashMap<(String, String), usize>,
    overwrite: bool,
}

/// Element correspondence per §4.2: same tag, plus shared id, shared
/// globally-unique class, shared globally-unique attribute, or absence of
/// disqualifying class differences.
fn corresponds(a: &TemplateNode, b: &TemplateNode, ctx: &MergeCtx) -> bool {
    if a.tag != b.tag {
        return false;
    }
    if !a.reachable || !b.reachable {
        return true;
    }
    if let (Some(a_id), Some(b_id)) = (a.attrs.get("id"), b.attrs.get("id")) {
        if a_id == b_id {
            return true;
        }
    }
    for class in &a.classes {
        if b.classes.contains(class)
            && ctx.a_class_counts.get(class).copied().unwrap_or(0) == 1
            && ctx.b_class_counts.get(class).copied().unwrap_or(0) == 1
        {
            return true;
        }
    }
    for (k, v) in &a.attrs {
        if let Some(bv) = b.attrs.get(k) {
            if bv == v {
                let key = (k.clone(), v.clone());
                if ctx.a_attr_counts.get(&key).copied().unwrap_or(0) == 1
                    && ctx.b_attr_counts.get(&key).copied().unwrap_or(0) == 1
                {
                    return true;
                }
            }
        }
    }
    if !a.classes.is_empty() && !b.classes.is_empty() && a.classes.is_disjoint(&b.classes) {
        return false;
    }
    true
}

/// Merge two corresponding nodes: attributes, text, classes, then children.
fn merge_node(a: &mut Arena, a_idx: usize, b: &Arena, b_idx: usize, ctx: &MergeCtx) {
    merge_attrs(a, a_idx, b, b_idx, ctx.overwrite);
    merge_classes(a, a_idx, b, b_idx, ctx.overwrite);
    merge_text(a, a_idx, b, b_idx, ctx.overwrite);

    let a_children = a.nodes[a_idx].children.clone();
    let b_children = b.nodes[b_idx].children.clone();
    let merged = merge_children(a, &a_children, b, b_idx, &b_children, ctx);
    a.nodes[a_idx].children = merged;
}

fn merge_attrs(a: &mut Arena, a_idx: usize, b: &Arena, b_idx: usize, overwrite: bool) {
    let b_attrs = b.nodes[b_idx].attrs.clone();
    for (k, v) in b_attrs {
        let a_node = &mut a.nodes[a_idx];
        match a_node.attrs.get(&k).cloned() {
            Some(av) if av == v => {
                // Equal: keep as-is.
            }
            Some(av) => {
                if !overwrite {
                    let mut values: Vec<&str> = av.split("||").collect();
                    if !values.contains(&v.as_str()) {
                        values.push(&v);
                    }
                    a_node.attrs.insert(k.clone(), values.join("||"));
                    a_node.unstable_attributes.insert(k);
                } else if !a_node.unstable_attributes.contains(&k) {
                    a_node.attrs.insert(k, v);
                }
            }
            None => {
                a_node.attrs.insert(k.clone(), v);
                if !overwrite {
                    a_node.unstable_attributes.insert(k);
                }
            }
        }
    }
    if overwrite {
        let b_keys: HashSet<String> = b.nodes[b_idx].attrs.keys().cloned().collect();
        let a_node = &mut a.nodes[a_idx];
        let stale: Vec<String> = a_node
            .attrs
            .keys()
            .filter(|k| !b_keys.contains(*k) && !a_node.unstable_attributes.contains(*k))
            .cloned()
            .collect();
        for k in stale {
            a_node.attrs.remove(&k);
        }
    }
}

fn merge_classes(a: &mut Arena, a_idx: usize, b: &Arena, b_idx: usize, overwrite: bool) {
    let b_classes = b.nodes[b_idx].classes.clone();
    let a_node = &mut a.nodes[a_idx];
    if a_node.classes != b_classes {
        if overwrite && !a_node.class_unstable() {
            a_node.classes = b_classes;
        } else {
            a_node.classes = a_node.classes.union(&b_classes).cloned().collect();
            a_node.unstable_attributes.insert("class".to_string());
        }
    }
}

fn merge_text(a: &mut Arena, a_idx: usize, b: &Arena, b_idx: usize, overwrite: bool) {
    let b_text = b.nodes[b_idx].text.clone();
    let a_node = &mut a.nodes[a_idx];
    if a_node.text != b_text {
        if overwrite && !a_node.unstable_text {
            a_node.text = b_text;
        } else {
            let mut values: Vec<&str> = a_node.text.split("||").collect();
            if !values.contains(&b_text.as_str()) {
                values.push(&b_text);
            }
            a_node.text = values.join("||");
            a_node.unstable_text = true;
        }
    }
}

/// Two-cursor children merge with backlogs (§4.2 "Children merge").
fn merge_children(
    a: &mut Arena,
    a_children: &[usize],
    b: &Arena,
    b_root: usize,
    b_children: &[usize],
    ctx: &MergeCtx,
) -> Vec<usize> {
    let mut result = Vec::new();
    let mut i = 0usize;
    let mut j = 0usize;
    let mut backlog_a: Vec<usize> = Vec::new();
    let mut backlog_b: Vec<usize> = Vec::new();
    let _ = b_root;

    while i < a_children.len() && j < b_children.len() {
        let ai = a_children[i];
        let bj = b_children[j];
        if corresponds(&a.nodes[ai], &b.nodes[bj], ctx) {
            merge_node(a, ai, b, bj, ctx);
            result.push(ai);
            i += 1;
            j += 1;
            continue;
        }

        // Try matching the a-side pointer against the b backlog.
        if let Some(pos) = backlog_b.iter().position(|&bb| corresponds(&a.nodes[ai], &b.nodes[bb], ctx)) {
            let bb = backlog_b.remove(pos);
            merge_node(a, ai, b, bb, ctx);
            result.push(ai);
            i += 1;
            continue;
        }
        // Try matching the b-side pointer against the a backlog.
        if let Some(pos) = backlog_a.iter().position(|&aa| corresponds(&a.nodes[aa], &b.nodes[bj], ctx)) {
            let aa = backlog_a.remove(pos);
            merge_node(a, aa, b, bj, ctx);
            result.push(aa);
            j += 1;
            continue;
        }

        // No match: skip one child, preferring the side whose index lags,
        // then the longer list, then side 1 (a).
        let skip_a = if i < j {
            true
        } else if j < i {
            false
        } else {
            a_children.len() >= b_children.len()
        };

        if skip_a {
            a.nodes[ai].unstable_element = true;
            backlog_a.push(ai);
            result.push(ai);
            i += 1;
        } else {
            b_into_a_clone(a, b, bj, ctx, &mut result, &mut backlog_b);
            j += 1;
        }
    }

    // Drain remaining a children against the b backlog.
    while i < a_children.len() {
        let ai = a_children[i];
        if let Some(pos) = backlog_b.iter().position(|&bb| corresponds(&a.nodes[ai], &b.nodes[bb], ctx)) {
            let bb = backlog_b.remove(pos);
            merge_node(a, ai, b, bb, ctx);
        } else {
            a.nodes[ai].unstable_element = true;
        }
        result.push(ai);
        i += 1;
    }
    // Drain remaining b children against the a backlog, else insert as new.
    while j < b_children.len() {
        let bj = b_children[j];
        if let Some(pos) = backlog_a.iter().position(|&aa| corresponds(&a.nodes[aa], &b.nodes[bj], ctx)) {
            let aa = backlog_a.remove(pos);
            merge_node(a, aa, b, bj, ctx);
        } else {
            b_into_a_clone(a, b, bj, ctx, &mut result, &mut backlog_b);
        }
        j += 1;
    }

    // Leftover a-backlog entries that never found a match: in overwrite
    // mode a non-unstable leftover vanished in the new DOM and is dropped;
    // otherwise (and always for already-unstable ones) it stays, already
    // marked unstable_element above.
    if ctx.overwrite {
        let dead: HashSet<usize> = backlog_a
            .into_iter()
            .filter(|&aa| a.nodes[aa].unstable_element)
            .collect();
        result.retain(|idx| !dead.contains(idx));
    }

    result
}

/// Clone a subtree from `b` into `a`'s arena (a child that has no
/// correspondence on the a side), marking it unstable, and append it to
/// `result`/track it in `backlog_b` for later matching.
fn b_into_a_clone(
    a: &mut Arena,
    b: &Arena,
    b_idx: usize,
    ctx: &MergeCtx,
    result: &mut Vec<usize>,
    backlog_b: &mut Vec<usize>,
) {
    let _ = ctx;
    let new_idx = clone_subtree(a, b, b_idx);
    a.nodes[new_idx].unstable_element = true;
    result.push(new_idx);
    backlog_b.push(b_idx);
}

fn clone_subtree(a: &mut Arena, b: &Arena, b_idx: usize) -> usize {
    let node = b.nodes[b_idx].clone();
    let children = node.children.clone();
    let mut new_node = node;
    new_node.children = Vec::new();
    let new_idx = a.nodes.len();
    a.nodes.push(new_node);
    let mut new_children = Vec::with_capacity(children.len());
    for child in children {
        new_children.push(clone_subtree(a, b, child));
    }
    a.nodes[new_idx].children = new_children;
    new_idx
}

/// Match walk (§4.2 "Match walk"): same correspondence rules, never
/// mutates, returns the first disagreement found.
fn match_node(
    a: &Arena,
    a_idx: usize,
    b: &Arena,
    b_idx: usize,
    a_xpaths: &HashMap<usize, String>,
    b_xpaths: &HashMap<usize, String>,
) -> Result<()> {
    let a_node = &a.nodes[a_idx];
    let b_node = &b.nodes[b_idx];
    let xpath = a_xpaths.get(&a_idx).cloned().unwrap_or_default();

    if !a_node.reachable || !b_node.reachable {
        return Ok(());
    }

    if a_node.tag != b_node.tag {
        return Err(TemplateError::TagMismatch {
            xpath,
            expected: a_node.tag.clone(),
            found: b_node.tag.clone(),
        }
        .into());
    }

    if !a_node.class_unstable() {
        if a_node.classes != b_node.classes {
            return Err(TemplateError::AttributeValueDiffers {
                xpath: xpath.clone(),
                attr: "class".to_string(),
                expected: join_sorted(&a_node.classes),
                found: join_sorted(&b_node.classes),
            }
            .into());
        }
    }

    for (k, v) in &a_node.attrs {
        if k == "class" {
            continue;
        }
        if a_node.unstable_attributes.contains(k) {
            continue;
        }
        match b_node.attrs.get(k) {
            None => {
                return Err(TemplateError::MissingAttribute {
                    xpath: xpath.clone(),
                    attr: k.clone(),
                }
                .into())
            }
            Some(bv) if bv != v => {
                return Err(TemplateError::AttributeValueDiffers {
                    xpath: xpath.clone(),
                    attr: k.clone(),
                    expected: v.clone(),
                    found: bv.clone(),
                }
                .into())
            }
            Some(_) => {}
        }
    }

    if !a_node.unstable_text && a_node.text != b_node.text {
        return Err(TemplateError::TextDiffers {
            xpath: xpath.clone(),
            expected: a_node.text.clone(),
            found: b_node.text.clone(),
        }
        .into());
    }

    match_children(a, &a_node.children, b, &b_node.children, a_xpaths, b_xpaths, &xpath)
}

fn match_children(
    a: &Arena,
    a_children: &[usize],
    b: &Arena,
    b_children: &[usize],
    a_xpaths: &HashMap<usize, String>,
    b_xpaths: &HashMap<usize, String>,
    parent_xpath: &str,
) -> Result<()> {
    let ctx_counts = (
        a.class_counts(),
        a.attr_counts(),
        b.class_counts(),
        b.attr_counts(),
    );
    let ctx = MergeCtx {
        a_class_counts: ctx_counts.0,
        a_attr_counts: ctx_counts.1,
        b_class_counts: ctx_counts.2,
        b_attr_counts: ctx_counts.3,
        overwrite: false,
    };

    let mut i = 0usize;
    let mut j = 0usize;
    let mut backlog_a: Vec<usize> = Vec::new();
    let mut backlog_b: Vec<usize> = Vec::new();

    while i < a_children.len() && j < b_children.len() {
        let ai = a_children[i];
        let bj = b_children[j];
        if corresponds(&a.nodes[ai], &b.nodes[bj], &ctx) {
            match_node(a, ai, b, bj, a_xpaths, b_xpaths)?;
            i += 1;
            j += 1;
            continue;
        }
        if let Some(pos) = backlog_b.iter().position(|&bb| corresponds(&a.nodes[ai], &b.nodes[bb], &ctx)) {
            let bb = backlog_b.remove(pos);
            match_node(a, ai, b, bb, a_xpaths, b_xpaths)?;
            i += 1;
            continue;
        }
        if let Some(pos) = backlog_a.iter().position(|&aa| corresponds(&a.nodes[aa], &b.nodes[bj], &ctx)) {
            let aa = backlog_a.remove(pos);
            match_node(a, aa, b, bj, a_xpaths, b_xpaths)?;
            j += 1;
            continue;
        }

        let a_unstable = a.nodes[ai].unstable_element;
        let b_unstable = b.nodes[bj].unstable_element;
        if a_unstable || b_unstable {
            // Tolerate insertion/deletion/reorder only when one side has
            // already been observed to vary here (§4.2 "Match walk":
            // "when neither pointed child corresponds and neither is
            // unstable, return disagreement").
            let skip_a = i <= j;
            if skip_a {
                backlog_a.push(ai);
                i += 1;
            } else {
                backlog_b.push(bj);
                j += 1;
            }
            continue;
        }

        return Err(TemplateError::NoCorrespondence {
            xpath: b_xpaths.get(&bj).cloned().unwrap_or_else(|| parent_xpath.to_string()),
        }
        .into());
    }

    while i < a_children.len() {
        let ai = a_children[i];
        if let Some(pos) = backlog_b.iter().position(|&bb| corresponds(&a.nodes[ai], &b.nodes[bb], &ctx)) {
            let bb = backlog_b.remove(pos);
            match_node(a, ai, b, bb, a_xpaths, b_xpaths)?;
        } else if !a.nodes[ai].unstable_element {
            return Err(TemplateError::NoCorrespondence {
                xpath: a_xpaths.get(&ai).cloned().unwrap_or_else(|| parent_xpath.to_string()),
            }
            .into());
        }
        i += 1;
    }
    while j < b_children.len() {
        let bj = b_children[j];
        if let Some(pos) = backlog_a.iter().position(|&aa| corresponds(&a.nodes[aa], &b.nodes[bj], &ctx)) {
            let aa = backlog_a.remove(pos);
            match_node(a, aa, b, bj, a_xpaths, b_xpaths)?;
        } else if !b.nodes[bj].unstable_element {
            // Genuinely new content the template never saw and never
            // marked unstable: a disagreement, not a tolerated insertion.
            return Err(TemplateError::NoCorrespondence {
                xpath: b_xpaths.get(&bj).cloned().unwrap_or_else(|| parent_xpath.to_string()),
            }
            .into());
        }
        j += 1;
    }

    Ok(())
}

fn join_sorted(set: &HashSet<String>) -> String {
    let mut v: Vec<&String> = set.iter().collect();
    v.sort();
    v.into_iter().cloned().collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_documents_match() {
        let html = "<html><body><div id=\"a\"><p>hi</p></div></body></html>";
        let t = HtmlTemplate::from_html(html);
        assert!(t.matches_html(html));
    }

    #[test]
    fn add_html_is_idempotent_for_same_source() {
        let html = "<html><body><p>hi</p></body></html>";
        let mut t = HtmlTemplate::from_html(html);
        let before = t.to_html();
        t.add_html(html);
        assert_eq!(before, t.to_html());
    }

    #[test]
    fn varying_text_becomes_unstable_and_still_matches_both() {
        let a = "<html><body><time>10:00</time></body></html>";
        let b = "<html><body><time>10:05</time></body></html>";
        let mut t = HtmlTemplate::from_html(a);
        t.add_html(b);
        assert!(t.matches_html(a));
        assert!(t.matches_html(b));
        assert_eq!(t.unstable_xpaths().len(), 1);
    }

    #[test]
    fn mismatched_required_text_fails_to_match() {
        let a = "<html><body><p id=\"x\">hello</p></body></html>";
        let b = "<html><body><p id=\"x\">goodbye</p></body></html>";
        let t = HtmlTemplate::from_html(a);
        assert!(!t.matches_html(b));
    }

    #[test]
    fn tag_mismatch_is_a_disagreement() {
        let a = "<html><body><p id=\"x\">hello</p></body></html>";
        let b = "<html><body><div id=\"x\">hello</div></body></html>";
        let t = HtmlTemplate::from_html(a);
        assert!(matches!(
            t.find_disagreement(b),
            Some(TemplateError::TagMismatch { .. }) | Some(TemplateError::NoCorrespondence { .. })
        ));
    }

    #[test]
    fn genuinely_new_never_before_seen_content_is_a_disagreement() {
        let a = "<html><body><p>Static</p></body></html>";
        let b = "<html><body><p>Static</p><div>Totally new content</div></body></html>";
        let t = HtmlTemplate::from_html(a);
        assert!(!t.matches_html(b));
        assert!(matches!(t.find_disagreement(b), Some(TemplateError::NoCorrespondence { .. })));
    }

    #[test]
    fn inserted_and_deleted_children_tolerated_when_pattern_seen_before() {
        let a = "<html><body><ul><li id=\"1\">a</li></ul></body></html>";
        let b = "<html><body><ul><li id=\"1\">a</li><li id=\"2\">b</li></ul></body></html>";
        let mut t = HtmlTemplate::from_html(a);
        t.add_html(b);
        assert!(t.matches_html(a));
        assert!(t.matches_html(b));
    }

    #[test]
    fn update_preserves_existing_instability_and_matches_new_dom() {
        let a = "<html><body><time>10:00</time><p>static</p></body></html>";
        let b = "<html><body><time>10:05</time><p>static</p></body></html>";
        let t = HtmlTemplate::from_html(a);
        let c = "<html><body><time>11:00</time><p>static</p></body></html>";
        let updated = t.get_updated_template(c);
        assert!(updated.matches_html(c));
        let _ = b;
    }
}
