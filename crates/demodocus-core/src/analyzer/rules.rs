//! Rule evaluators (§4.10 "Rule evaluators (extensible)").
//!
//! Each rule inspects a state's incoming/outgoing edges (plus whatever
//! `BuildData`/focus information is available) and returns zero or more
//! [`Violation`]s. The set here is the base rule pack named in the spec;
//! more can be added without touching the analyzer driver, since each rule
//! is just a function over a [`RuleContext`].

use super::focus::FocusFinding;
use super::violation::{ElementLocator, Level, Violation};
use crate::graph::{Edge, State};
use crate::web::WebStateData;
use std::sync::Arc;

/// Minimum target size, in CSS pixels, for a pointer target (§4.10).
pub const MIN_TARGET_SIZE: f64 = 44.0;
/// Tags exempt from the minimum target size rule when nested in a
/// paragraph — inline anchors flow with surrounding text.
pub const INLINE_TARGET_EXCEPTIONS: [&str; 1] = ["a"];
/// Minimum contrast ratio for normal-sized text (§4.10).
pub const MIN_TEXT_CONTRAST: f64 = 4.5;
/// Minimum contrast ratio for large text (≥ 18pt).
pub const MIN_TEXT_CONTRAST_LARGE: f64 = 3.0;
/// The point size at which the relaxed contrast threshold applies.
pub const LARGE_TEXT_POINT_SIZE: f64 = 18.0;

/// Everything one rule needs about a state to evaluate, gathered once per
/// state by the analyzer driver.
pub struct RuleContext<'a> {
    pub state: &'a Arc<State<WebStateData>>,
    pub incoming: &'a [Arc<Edge>],
    pub outgoing: &'a [Arc<Edge>],
    pub focus: Option<&'a FocusFinding>,
    pub build_user: &'a str,
    pub next_group_id: &'a dyn Fn() -> u64,
}

fn locator_for_edge(edge: &Edge, build_user: &str) -> ElementLocator {
    let build_data = edge.metrics_for(build_user).and_then(|m| m.build_data);
    let (width, height) = build_data.as_ref().and_then(|b| b.captured_size()).unwrap_or((0.0, 0.0));
    let tag = build_data
        .as_ref()
        .and_then(|b| b.captured_tag_name())
        .unwrap_or("")
        .to_string();
    let text = build_data.as_ref().and_then(|b| b.captured_text()).unwrap_or("").to_string();
    ElementLocator {
        x: 0.0,
        y: 0.0,
        width,
        height,
        xpath: edge.element().to_string(),
        text,
        tag,
    }
}

/// Minimum target size: an interactive element smaller than
/// `MIN_TARGET_SIZE` in either dimension, unless it's an inline anchor.
pub fn minimum_target_size(ctx: &RuleContext) -> Vec<Violation> {
    let mut out = Vec::new();
    for edge in ctx.outgoing {
        let Some(build_data) = edge.metrics_for(ctx.build_user).and_then(|m| m.build_data) else {
            continue;
        };
        let Some((width, height)) = build_data.captured_size() else { continue };
        let tag = build_data.captured_tag_name().unwrap_or("");
        if INLINE_TARGET_EXCEPTIONS.contains(&tag) {
            continue;
        }
        if width < MIN_TARGET_SIZE || height < MIN_TARGET_SIZE {
            out.push(Violation::Atomic {
                level: Level::Warning,
                category: "target-size".to_string(),
                element: locator_for_edge(edge, ctx.build_user),
                replay: vec![edge.element().to_string(), edge.action().to_string()],
                code: "SC-2.5.5".to_string(),
                group_id: (ctx.next_group_id)(),
            });
        }
    }
    out
}

/// Keyboard operability: a state reachable only via a mouse-only action —
/// every incoming edge's action is claimed by at least one mouse ability
/// but none by a keyboard ability.
pub fn keyboard_operability(ctx: &RuleContext, is_keyboard_action: impl Fn(&str) -> bool) -> Vec<Violation> {
    if ctx.incoming.is_empty() {
        return Vec::new();
    }
    let reachable_by_keyboard = ctx.incoming.iter().any(|e| is_keyboard_action(e.action()));
    if reachable_by_keyboard {
        return Vec::new();
    }
    ctx.incoming
        .iter()
        .map(|edge| Violation::Atomic {
            level: Level::Error,
            category: "keyboard-operability".to_string(),
            element: locator_for_edge(edge, ctx.build_user),
            replay: vec![edge.element().to_string(), edge.action().to_string()],
            code: "SC-2.1.1".to_string(),
            group_id: (ctx.next_group_id)(),
        })
        .collect()
}

/// Focus order: any keyboard trap found during tab-order generation.
pub fn focus_order(ctx: &RuleContext) -> Vec<Violation> {
    let Some(focus) = ctx.focus else { return Vec::new() };
    focus
        .keyboard_traps
        .iter()
        .map(|element| Violation::Atomic {
            level: Level::Error,
            category: "focus-order".to_string(),
            element: ElementLocator {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
                xpath: element.clone(),
                text: String::new(),
                tag: String::new(),
            },
            replay: vec![element.clone()],
            code: "SC-2.4.3".to_string(),
            group_id: (ctx.next_group_id)(),
        })
        .collect()
}

/// Focus visibility: any element whose focus indicator was judged
/// insufficient during focus analysis.
pub fn focus_visibility(ctx: &RuleContext) -> Vec<Violation> {
    let Some(focus) = ctx.focus else { return Vec::new() };
    focus
        .insufficient_indicator
        .iter()
        .map(|element| Violation::Atomic {
            level: Level::Warning,
            category: "focus-visibility".to_string(),
            element: ElementLocator {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
                xpath: element.clone(),
                text: String::new(),
                tag: String::new(),
            },
            replay: vec![element.clone()],
            code: "SC-2.4.7".to_string(),
            group_id: (ctx.next_group_id)(),
        })
        .collect()
}

/// Minimum text contrast: 4.5:1 normally, relaxed to 3:1 for text at or
/// above 18pt.
pub fn minimum_text_contrast(ctx: &RuleContext) -> Vec<Violation> {
    let mut out = Vec::new();
    for edge in ctx.outgoing {
        let Some(build_data) = edge.metrics_for(ctx.build_user).and_then(|m| m.build_data) else {
            continue;
        };
        let Some(contrast) = build_data.captured_contrast_ratio() else { continue };
        let threshold = match build_data.captured_font_size() {
            Some(size) if size >= LARGE_TEXT_POINT_SIZE => MIN_TEXT_CONTRAST_LARGE,
            _ => MIN_TEXT_CONTRAST,
        };
        if contrast < threshold {
            out.push(Violation::Atomic {
                level: Level::Error,
                category: "text-contrast".to_string(),
                element: locator_for_edge(edge, ctx.build_user),
                replay: vec![edge.element().to_string(), edge.action().to_string()],
                code: "SC-1.4.3".to_string(),
                group_id: (ctx.next_group_id)(),
            });
        }
    }
    out
}

/// Run the full base rule pack against one state.
pub fn run_base_rules(ctx: &RuleContext, is_keyboard_action: impl Fn(&str) -> bool) -> Vec<Violation> {
    let mut out = Vec::new();
    out.extend(minimum_target_size(ctx));
    out.extend(keyboard_operability(ctx, is_keyboard_action));
    out.extend(focus_order(ctx));
    out.extend(focus_visibility(ctx));
    out.extend(minimum_text_contrast(ctx));
    out
}
