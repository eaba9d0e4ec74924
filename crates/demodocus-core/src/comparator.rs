//! C1: the comparator pipeline that decides state equality (§4.1).
//!
//! A [`Comparator`] is a pure predicate over two state representations. A
//! [`Pipeline`] runs a sequence of them with short-circuit flags, so cheap,
//! imprecise comparators (string equality) can short-circuit before paying
//! for expensive, precise ones (structural/textual DOM diffing).

use crate::error::{Error, Result};
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Short-circuit policy for one pipeline stage.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StageFlags: u8 {
        /// Return early with `true` if this stage evaluates to `true`.
        const STOP_IF_TRUE = 0b01;
        /// Return early with `false` if this stage evaluates to `false`.
        const STOP_IF_FALSE = 0b10;
    }
}

impl StageFlags {
    /// No short-circuit behavior (the last stage's flags are never
    /// consulted, but stages built without one still need a default).
    pub const NONE: StageFlags = StageFlags::empty();
}

/// A pure comparison function over two state-data string representations
/// (e.g. serialized DOM, or a structural/textual digest of it).
pub trait Comparator: Send + Sync {
    /// Stable identity used in error messages and logs.
    fn name(&self) -> &str;

    /// Compare two representations of "the same conceptual page". Returns
    /// `Err` only on an internal failure of the comparator itself (not a
    /// mismatch, which is a normal `Ok(false)`).
    fn compare(&self, a: &str, b: &str) -> Result<bool>;
}

/// One stage of a [`Pipeline`]: a comparator plus its short-circuit flags.
pub struct Stage {
    comparator: Box<dyn Comparator>,
    flags: StageFlags,
}

impl Stage {
    /// Build a stage from a comparator and its short-circuit flags.
    pub fn new(comparator: Box<dyn Comparator>, flags: StageFlags) -> Self {
        Self { comparator, flags }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("comparator", &self.comparator.name())
            .field("flags", &self.flags)
            .finish()
    }
}

/// An ordered sequence of comparator stages defining state equality (§4.1).
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Build a pipeline from stages. An empty pipeline is rejected: it is a
    /// configuration error to have no notion of state equality at all.
    pub fn new(stages: Vec<Stage>) -> Result<Self> {
        if stages.is_empty() {
            return Err(Error::Config(
                "comparator pipeline must have at least one stage".to_string(),
            ));
        }
        Ok(Self { stages })
    }

    /// Evaluate the pipeline against two representations.
    ///
    /// Iterates stages in order. The result of the *last* stage is always
    /// the value returned when execution reaches it (whether or not its
    /// flags would suggest otherwise, per the open question in §9: a
    /// trailing `STOP_IF_*` flag is a no-op, not an error). Earlier stages
    /// only short-circuit when their matching flag is set.
    pub fn compare(&self, a: &str, b: &str) -> Result<bool> {
        let last = self.stages.len() - 1;
        for (i, stage) in self.stages.iter().enumerate() {
            let result = stage
                .comparator
                .compare(a, b)
                .map_err(|_| Error::Comparator(stage.comparator.name().to_string()))?;

            if i == last {
                return Ok(result);
            }
            if result && stage.flags.contains(StageFlags::STOP_IF_TRUE) {
                return Ok(true);
            }
            if !result && stage.flags.contains(StageFlags::STOP_IF_FALSE) {
                return Ok(false);
            }
        }
        unreachable!("loop always returns on the last stage")
    }
}

/// Strict string equality after squashing whitespace runs and semicolons,
/// the cheapest and first stage of the default pipeline.
pub struct StrictStringComparator;

impl Comparator for StrictStringComparator {
    fn name(&self) -> &str {
        "strict_string"
    }

    fn compare(&self, a: &str, b: &str) -> Result<bool> {
        Ok(normalize(a) == normalize(b))
    }
}

fn normalize(s: &str) -> String {
    let squashed_ws = s.split_whitespace().collect::<Vec<_>>().join(" ");
    squashed_ws.replace(';', "")
}

/// Structural comparator: parses both sides as HTML and compares the tag
/// skeleton (tag names and nesting) ignoring text and attributes.
pub struct StructuralComparator;

impl Comparator for StructuralComparator {
    fn name(&self) -> &str {
        "structural"
    }

    fn compare(&self, a: &str, b: &str) -> Result<bool> {
        let skeleton_a = crate::template::tree::tag_skeleton(a);
        let skeleton_b = crate::template::tree::tag_skeleton(b);
        Ok(skeleton_a == skeleton_b)
    }
}

/// Textual comparator: parses both sides as HTML and compares the
/// concatenated, whitespace-normalized visible text.
pub struct TextualComparator;

impl Comparator for TextualComparator {
    fn name(&self) -> &str {
        "textual"
    }

    fn compare(&self, a: &str, b: &str) -> Result<bool> {
        let text_a = crate::template::tree::visible_text(a);
        let text_b = crate::template::tree::visible_text(b);
        Ok(normalize(&text_a) == normalize(&text_b))
    }
}

/// The default three-stage pipeline described in §4.1: strict string
/// equality (stop if equal), then structural (stop if different), then
/// textual (last stage, always decisive).
pub fn default_pipeline() -> Pipeline {
    #[allow(clippy::expect_used)]
    Pipeline::new(vec![
        Stage::new(Box::new(StrictStringComparator), StageFlags::STOP_IF_TRUE),
        Stage::new(Box::new(StructuralComparator), StageFlags::STOP_IF_FALSE),
        Stage::new(Box::new(TextualComparator), StageFlags::NONE),
    ])
    .expect("default pipeline is never empty")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysTrue;
    impl Comparator for AlwaysTrue {
        fn name(&self) -> &str {
            "always_true"
        }
        fn compare(&self, _a: &str, _b: &str) -> Result<bool> {
            Ok(true)
        }
    }

    struct AlwaysFalse;
    impl Comparator for AlwaysFalse {
        fn name(&self) -> &str {
            "always_false"
        }
        fn compare(&self, _a: &str, _b: &str) -> Result<bool> {
            Ok(false)
        }
    }

    struct AlwaysErr;
    impl Comparator for AlwaysErr {
        fn name(&self) -> &str {
            "always_err"
        }
        fn compare(&self, _a: &str, _b: &str) -> Result<bool> {
            Err(Error::Config("boom".into()))
        }
    }

    #[test]
    fn empty_pipeline_is_a_config_error() {
        assert!(Pipeline::new(vec![]).is_err());
    }

    #[test]
    fn single_stage_returns_its_own_result_regardless_of_flags() {
        let p = Pipeline::new(vec![Stage::new(Box::new(AlwaysFalse), StageFlags::STOP_IF_TRUE)])
            .unwrap();
        assert!(!p.compare("a", "b").unwrap());
    }

    #[test]
    fn stop_if_true_short_circuits() {
        let p = Pipeline::new(vec![
            Stage::new(Box::new(AlwaysTrue), StageFlags::STOP_IF_TRUE),
            Stage::new(Box::new(AlwaysFalse), StageFlags::NONE),
        ])
        .unwrap();
        assert!(p.compare("a", "b").unwrap());
    }

    #[test]
    fn stop_if_false_short_circuits() {
        let p = Pipeline::new(vec![
            Stage::new(Box::new(AlwaysFalse), StageFlags::STOP_IF_FALSE),
            Stage::new(Box::new(AlwaysTrue), StageFlags::NONE),
        ])
        .unwrap();
        assert!(!p.compare("a", "b").unwrap());
    }

    #[test]
    fn non_short_circuiting_stage_falls_through_to_last() {
        let p = Pipeline::new(vec![
            Stage::new(Box::new(AlwaysTrue), StageFlags::NONE),
            Stage::new(Box::new(AlwaysFalse), StageFlags::NONE),
        ])
        .unwrap();
        assert!(!p.compare("a", "b").unwrap());
    }

    #[test]
    fn comparator_error_surfaces_as_comparator_error() {
        let p = Pipeline::new(vec![Stage::new(Box::new(AlwaysErr), StageFlags::NONE)]).unwrap();
        let err = p.compare("a", "b").unwrap_err();
        assert!(matches!(err, Error::Comparator(name) if name == "always_err"));
    }

    #[test]
    fn default_pipeline_treats_identical_strings_as_equal() {
        let p = default_pipeline();
        assert!(p.compare("<html><body>hi</body></html>", "<html><body>hi</body></html>").unwrap());
    }

    #[test]
    fn default_pipeline_squashes_whitespace_and_semicolons() {
        let p = default_pipeline();
        assert!(p
            .compare("<p>a;  b</p>", "<p>a   b;</p>")
            .unwrap());
    }
}
