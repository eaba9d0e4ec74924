//! Focus analysis (§4.10 "Focus analysis (per state)").

use crate::interface::TabOrder;

/// Minimum acceptable contrast ratio between an element's focused and
/// unfocused style for its focus indicator to count as sufficient (§4.10).
pub const MIN_FOCUS_INDICATOR_CONTRAST: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct InvalidTabOrderEntry {
    pub element: String,
    pub next_element: String,
}

#[derive(Debug, Clone)]
pub struct FocusFinding {
    pub invalid_order: Vec<InvalidTabOrderEntry>,
    pub insufficient_indicator: Vec<String>,
    pub keyboard_traps: Vec<String>,
}

/// Flag tab-order anomalies for one state's precomputed [`TabOrder`]
/// (§4.10): entries whose tab index increases while screen position
/// regresses in both axes, focus indicators whose style barely changes
/// between focused/unfocused, and elements the order already flagged as
/// traps during generation.
pub fn analyze_focus(tab_order: &TabOrder, style_contrast: impl Fn(&str, &str) -> f64) -> FocusFinding {
    let mut invalid_order = Vec::new();
    for window in tab_order.ordered.windows(2) {
        let [current, next] = window else { continue };
        let (Some(cur_style), Some(next_style)) = (tab_order.styles.get(current), tab_order.styles.get(next)) else {
            continue;
        };
        if next_style.x < cur_style.x && next_style.y < cur_style.y {
            invalid_order.push(InvalidTabOrderEntry {
                element: current.clone(),
                next_element: next.clone(),
            });
        }
    }

    let mut insufficient_indicator = Vec::new();
    for (element, style) in &tab_order.styles {
        if style.focused_style == style.unfocused_style {
            insufficient_indicator.push(element.clone());
            continue;
        }
        let contrast = style_contrast(&style.focused_style, &style.unfocused_style);
        if contrast < MIN_FOCUS_INDICATOR_CONTRAST {
            insufficient_indicator.push(element.clone());
        }
    }
    insufficient_indicator.sort();

    let mut keyboard_traps: Vec<String> = tab_order.traps.iter().cloned().collect();
    keyboard_traps.sort();

    FocusFinding {
        invalid_order,
        insufficient_indicator,
        keyboard_traps,
    }
}

/// A crude style-string contrast proxy: the fraction of characters that
/// differ between the two style summaries, scaled into a contrast-like
/// range. Real contrast measurement on the underlying colors lives on
/// `ElementMeasurement::measure_contrast_ratio`; this is a fallback for
/// when only the raw style strings are available (e.g. post-crawl replay).
pub fn style_string_contrast_proxy(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let max_len = a_chars.len().max(b_chars.len()).max(1);
    let differing = a_chars
        .iter()
        .zip(b_chars.iter())
        .filter(|(x, y)| x != y)
        .count()
        + a_chars.len().abs_diff(b_chars.len());
    1.0 + 20.0 * (differing as f64 / max_len as f64)
}
