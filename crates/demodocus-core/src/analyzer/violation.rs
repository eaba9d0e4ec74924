//! `Violation` records (§6 "Element map (violations) output").

use crate::graph::StateId;
use serde::Serialize;

/// Bounding box plus identifying metadata for the offending element,
/// embedded in every atomic violation.
#[derive(Debug, Clone, Serialize)]
pub struct ElementLocator {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub xpath: String,
    pub text: String,
    pub tag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Warning,
    Error,
}

/// One rule's finding, serialized for the element-map JSON output.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Violation {
    Atomic {
        level: Level,
        category: String,
        element: ElementLocator,
        replay: Vec<String>,
        code: String,
        group_id: u64,
    },
    Composite {
        level: Level,
        element: ElementLocator,
        num_issues: usize,
        state_link: StateId,
        group_id: u64,
    },
}

impl Violation {
    pub fn level(&self) -> Level {
        match self {
            Violation::Atomic { level, .. } => *level,
            Violation::Composite { level, .. } => *level,
        }
    }

    pub fn category(&self) -> &str {
        match self {
            Violation::Atomic { category, .. } => category,
            Violation::Composite { .. } => "composite",
        }
    }
}

/// Per-state violation record: which edge (`src`, `element`, `action`) led
/// here, and the violations attached to this state (§4.10 output shape).
#[derive(Debug, Clone, Serialize)]
pub struct StateViolations {
    pub src: Option<StateId>,
    pub violations: Vec<Violation>,
}
