//! C5: ability and `UserModel` scoring (§4.5).
//!
//! Scoring never performs a side-effecting interface operation, only
//! queries — it must be safe to call during a simulated re-crawl, where the
//! `InterfaceAccess` passed in may be backed by already-captured
//! `BuildData` rather than a live session.

use crate::build_data::BuildData;
use crate::error::Result;
use crate::interface::InterfaceAccess;
use std::fmt;
use std::sync::Arc;

/// Which axis (or axes) of a score to compute. Perceive, navigate, act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Axes(u8);

impl Axes {
    pub const PCV: Axes = Axes(0b001);
    pub const NAV: Axes = Axes(0b010);
    pub const ACT: Axes = Axes(0b100);
    pub const ALL: Axes = Axes(0b111);

    pub fn contains(self, other: Axes) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Axes {
    type Output = Axes;
    fn bitor(self, rhs: Axes) -> Axes {
        Axes(self.0 | rhs.0)
    }
}

/// The outcome of a `UserModel::score` call (§4.5).
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreResult {
    /// The combined score returned to callers; `0.0` means "cannot do
    /// this at all".
    pub combined: f64,
    pub pcv: f64,
    pub nav: f64,
    pub act: f64,
}

/// A single interaction capability a `UserModel` can be built from. Default
/// method bodies return `0.0`/`false` so a concrete ability only needs to
/// override the axes it actually contributes to.
pub trait UserAbility: fmt::Debug + Send + Sync {
    /// Identity, used in logs and GML `users` fields.
    fn name(&self) -> &str;

    /// Whether this ability can perform `action_name` at all (independent
    /// of any particular element). Abilities that only perceive or
    /// navigate return `false`.
    fn claims_action(&self, action_name: &str) -> bool {
        let _ = action_name;
        false
    }

    /// `[0, 1]` score for perceiving `element` (e.g. contrast/size checks).
    fn score_perceive(&self, build: &mut BuildData, access: &dyn InterfaceAccess, element: &str) -> Result<f64> {
        let _ = (build, access, element);
        Ok(0.0)
    }

    /// `[0, 1]` score for navigating (focusing/pointing) to `element`.
    fn score_navigate(&self, build: &mut BuildData, access: &dyn InterfaceAccess, element: &str) -> Result<f64> {
        let _ = (build, access, element);
        Ok(0.0)
    }

    /// `[0, 1]` score for performing `action_name` on `element`, given this
    /// ability already claims the action.
    fn score_act(
        &self,
        build: &mut BuildData,
        access: &dyn InterfaceAccess,
        element: &str,
        action_name: &str,
    ) -> Result<f64> {
        let _ = (build, access, element, action_name);
        Ok(0.0)
    }

    /// Short human-readable description for reports.
    fn describe(&self) -> String {
        self.name().to_string()
    }
}

/// A named bundle of abilities approximating one user class's interaction
/// profile (§4.5). Its effective action set is the union of its abilities'.
#[derive(Debug, Clone)]
pub struct UserModel {
    name: String,
    abilities: Vec<Arc<dyn UserAbility>>,
}

impl UserModel {
    pub fn new(name: impl Into<String>, abilities: Vec<Arc<dyn UserAbility>>) -> Self {
        Self {
            name: name.into(),
            abilities,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abilities(&self) -> &[Arc<dyn UserAbility>] {
        &self.abilities
    }

    /// Whether any ability of this user claims `action_name`.
    pub fn claims_action(&self, action_name: &str) -> bool {
        self.abilities.iter().any(|a| a.claims_action(action_name))
    }

    /// Score `element` for the requested `axes` (§4.5 algorithm):
    /// - If `ACT` is requested and no ability claims `action`, short-circuit
    ///   to an all-zero result.
    /// - Perceive is the max over abilities; if it is `0.0`, short-circuit.
    /// - If both `NAV` and `ACT` are requested, they are computed jointly so
    ///   the winning nav score comes from the best *act-capable* ability.
    /// - Otherwise each requested axis is the max over abilities.
    pub fn score(
        &self,
        axes: Axes,
        build: &mut BuildData,
        access: &dyn InterfaceAccess,
        element: &str,
        action: Option<&str>,
    ) -> Result<ScoreResult> {
        if axes.contains(Axes::ACT) {
            let action_name = action.unwrap_or_default();
            if !self.claims_action(action_name) {
                return Ok(ScoreResult::default());
            }
        }

        let pcv = if axes.contains(Axes::PCV) {
            self.max_over(|a| a.score_perceive(build, access, element))?
        } else {
            1.0
        };
        if axes.contains(Axes::PCV) && pcv <= 0.0 {
            return Ok(ScoreResult { pcv, ..Default::default() });
        }

        if axes.contains(Axes::NAV) && axes.contains(Axes::ACT) {
            let action_name = action.unwrap_or_default();
            let mut best: Option<(f64, f64)> = None;
            for ability in &self.abilities {
                if !ability.claims_action(action_name) {
                    continue;
                }
                let nav = ability.score_navigate(build, access, element)?;
                let act = ability.score_act(build, access, element, action_name)?;
                let candidate = (nav, act);
                best = Some(match best {
                    Some(prev) if prev.0 >= candidate.0 => prev,
                    _ => candidate,
                });
            }
            let (nav, act) = best.unwrap_or((0.0, 0.0));
            let combined = pcv * nav * act;
            return Ok(ScoreResult { combined, pcv, nav, act });
        }

        let nav = if axes.contains(Axes::NAV) {
            self.max_over(|a| a.score_navigate(build, access, element))?
        } else {
            1.0
        };
        let act = if axes.contains(Axes::ACT) {
            let action_name = action.unwrap_or_default();
            self.max_over(|a| {
                if a.claims_action(action_name) {
                    a.score_act(build, access, element, action_name)
                } else {
                    Ok(0.0)
                }
            })?
        } else {
            1.0
        };

        Ok(ScoreResult {
            combined: pcv * nav * act,
            pcv,
            nav,
            act,
        })
    }

    fn max_over(&self, mut f: impl FnMut(&Arc<dyn UserAbility>) -> Result<f64>) -> Result<f64> {
        let mut max = 0.0_f64;
        for ability in &self.abilities {
            max = max.max(f(ability)?);
        }
        Ok(max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct AlwaysOne;
    impl UserAbility for AlwaysOne {
        fn name(&self) -> &str {
            "always-one"
        }
        fn claims_action(&self, _action_name: &str) -> bool {
            true
        }
        fn score_perceive(&self, _b: &mut BuildData, _a: &dyn InterfaceAccess, _e: &str) -> Result<f64> {
            Ok(1.0)
        }
        fn score_navigate(&self, _b: &mut BuildData, _a: &dyn InterfaceAccess, _e: &str) -> Result<f64> {
            Ok(1.0)
        }
        fn score_act(&self, _b: &mut BuildData, _a: &dyn InterfaceAccess, _e: &str, _action: &str) -> Result<f64> {
            Ok(1.0)
        }
    }

    #[derive(Debug)]
    struct ClaimsNothing;
    impl UserAbility for ClaimsNothing {
        fn name(&self) -> &str {
            "claims-nothing"
        }
    }

    struct NoMeasurement;
    impl crate::interface::ElementMeasurement for NoMeasurement {
        fn measure_foreground_color(&self, _e: &str) -> Result<String> {
            Ok(String::new())
        }
        fn measure_background_color(&self, _e: &str) -> Result<String> {
            Ok(String::new())
        }
        fn measure_contrast_ratio(&self, _e: &str) -> Result<f64> {
            Ok(0.0)
        }
        fn measure_size(&self, _e: &str) -> Result<(f64, f64)> {
            Ok((0.0, 0.0))
        }
        fn measure_font_size(&self, _e: &str) -> Result<f64> {
            Ok(0.0)
        }
        fn measure_position(&self, _e: &str) -> Result<(f64, f64)> {
            Ok((0.0, 0.0))
        }
        fn measure_pixel_distance_from_prior_focus(&self, _e: &str) -> Result<f64> {
            Ok(0.0)
        }
        fn measure_tab_distance_from_prior_focus(&self, _e: &str) -> Result<i64> {
            Ok(0)
        }
        fn measure_tag_name(&self, _e: &str) -> Result<String> {
            Ok(String::new())
        }
        fn measure_text(&self, _e: &str) -> Result<String> {
            Ok(String::new())
        }
        fn measure_descriptor_tags(&self, _e: &str) -> Result<std::collections::HashSet<String>> {
            Ok(Default::default())
        }
    }
    impl InterfaceAccess for NoMeasurement {
        fn load(&mut self, _entry_point: &str) -> Result<bool> {
            Ok(true)
        }
        fn state_data(&mut self) -> Result<crate::web::state::WebStateData> {
            unimplemented!()
        }
        fn set_state(&mut self, _state: &crate::web::state::WebStateData) -> Result<bool> {
            Ok(true)
        }
        fn set_state_direct(&mut self, _state: &crate::web::state::WebStateData) -> Result<bool> {
            Ok(true)
        }
        fn is_state_valid(&mut self) -> Result<bool> {
            Ok(true)
        }
        fn actions(&self) -> Vec<Arc<dyn crate::action::Action>> {
            Vec::new()
        }
        fn perform_action_on_element(
            &mut self,
            _user: &UserModel,
            _action_name: &str,
            _element: &str,
        ) -> Result<crate::graph::EdgeMetrics> {
            unimplemented!()
        }
        fn set_field_value(&mut self, _element: &str, _value: &str) -> Result<()> {
            Ok(())
        }
        fn generate_tab_order(&mut self, _context: Option<&str>) -> Result<crate::interface::TabOrder> {
            unimplemented!()
        }
        fn reset(&mut self) -> Result<()> {
            Ok(())
        }
        fn shutdown(&mut self) {}
    }

    #[test]
    fn act_axis_short_circuits_when_no_ability_claims_action() {
        let user = UserModel::new("nobody", vec![Arc::new(ClaimsNothing)]);
        let mut build = BuildData::default();
        let access = NoMeasurement;
        let result = user.score(Axes::ALL, &mut build, &access, "/html/body/button", Some("click")).unwrap();
        assert_eq!(result.combined, 0.0);
    }

    #[test]
    fn full_ability_scores_one_on_every_axis() {
        let user = UserModel::new("omni", vec![Arc::new(AlwaysOne)]);
        let mut build = BuildData::default();
        let access = NoMeasurement;
        let result = user.score(Axes::ALL, &mut build, &access, "/html/body/button", Some("click")).unwrap();
        assert_eq!(result.combined, 1.0);
    }

    #[test]
    fn pcv_only_short_circuits_without_touching_nav_or_act() {
        let user = UserModel::new("omni", vec![Arc::new(AlwaysOne)]);
        let mut build = BuildData::default();
        let access = NoMeasurement;
        let result = user.score(Axes::PCV, &mut build, &access, "/html/body/button", None).unwrap();
        assert_eq!(result.pcv, 1.0);
    }
}
