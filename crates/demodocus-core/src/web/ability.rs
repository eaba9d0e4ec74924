//! Concrete user abilities for the web specialization (§4.5).
//!
//! These live under `web` rather than the excluded concrete browser driver
//! because they are part of the web data-model specialization — they
//! interpret measurements (`BuildData`) that only make sense for rendered
//! HTML pages.

use crate::ability::UserAbility;
use crate::build_data::BuildData;
use crate::error::Result;
use crate::interface::InterfaceAccess;

/// Action names `MouseAbility` claims. Kept as a constant so
/// `demodocus-actions`'s mouse-click action and this ability agree on the
/// name without a crate dependency in either direction.
pub const MOUSE_CLICK_ACTION: &str = "mouse_click";
/// Prefix shared by every key-press action. `demodocus-actions` names each
/// key-specific instance `key_press:<key>` (e.g. `key_press:tab`,
/// `key_press:enter`) so the action registry interns them as distinct
/// actions while `KeyboardAbility` still claims all of them.
pub const KEY_PRESS_PREFIX: &str = "key_press:";
pub const FORM_FILL_ACTION: &str = "form_fill";

/// Tags exempted from the minimum-size perceive check (§4.5 `VisionAbility`,
/// §4.10 minimum-target-size rule: inline anchors inside running text).
const INLINE_SIZE_EXCEPTIONS: &[&str] = &["li", "ul"];

/// Pointer-based navigation, modeled on Fitts's law.
#[derive(Debug, Default)]
pub struct MouseAbility;

impl UserAbility for MouseAbility {
    fn name(&self) -> &str {
        "mouse"
    }

    fn claims_action(&self, action_name: &str) -> bool {
        action_name == MOUSE_CLICK_ACTION
    }

    fn score_navigate(&self, build: &mut BuildData, access: &dyn InterfaceAccess, element: &str) -> Result<f64> {
        const NAV_SCALE: f64 = 5.0;
        const MAX_WIDTH: f64 = 100.0;

        let pixel_dist = build.pixel_distance_from_prior_focus(access, element)?;
        let width = build.width(access, element)?;
        let fitts = NAV_SCALE - (1.0 + pixel_dist / width.min(MAX_WIDTH)).log2();
        if fitts <= 0.0 {
            return Ok(0.0);
        }
        Ok((fitts / NAV_SCALE).clamp(1e-6, 1.0))
    }

    fn score_act(&self, _build: &mut BuildData, _access: &dyn InterfaceAccess, _element: &str, action_name: &str) -> Result<f64> {
        Ok(if self.claims_action(action_name) { 1.0 } else { 0.0 })
    }
}

/// Keyboard-only navigation via tab order distance.
#[derive(Debug, Default)]
pub struct KeyboardAbility;

impl UserAbility for KeyboardAbility {
    fn name(&self) -> &str {
        "keyboard"
    }

    fn claims_action(&self, action_name: &str) -> bool {
        action_name.starts_with(KEY_PRESS_PREFIX) || action_name == FORM_FILL_ACTION
    }

    fn score_navigate(&self, build: &mut BuildData, access: &dyn InterfaceAccess, element: &str) -> Result<f64> {
        const NAV_SCALE: f64 = 4.0;

        let tab_dist = build.tab_distance_from_prior_focus(access, element)?;
        if tab_dist < 0 {
            return Ok(0.0);
        }
        if tab_dist == 0 {
            return Ok(1.0);
        }
        let raw = (NAV_SCALE - (tab_dist as f64).log2()) / NAV_SCALE;
        Ok(raw.clamp(1e-6, 1.0))
    }

    fn score_act(&self, _build: &mut BuildData, _access: &dyn InterfaceAccess, _element: &str, action_name: &str) -> Result<f64> {
        Ok(if self.claims_action(action_name) { 1.0 } else { 0.0 })
    }
}

/// Sighted perception: contrast and minimum target size.
#[derive(Debug, Default)]
pub struct VisionAbility;

impl UserAbility for VisionAbility {
    fn name(&self) -> &str {
        "vision"
    }

    fn score_perceive(&self, build: &mut BuildData, access: &dyn InterfaceAccess, element: &str) -> Result<f64> {
        let contrast = build.contrast_ratio(access, element)?;
        let font_size = build.font_size(access, element)?;
        let threshold = if font_size < 18.0 { 4.5 } else { 3.0 };
        let contrast_multiplier = if contrast >= threshold { 1.0 } else { 0.0 };

        let tag = build.tag_name(access, element)?;
        let width = build.width(access, element)?;
        let height = build.height(access, element)?;
        let size_multiplier = if INLINE_SIZE_EXCEPTIONS.contains(&tag.as_str()) || (width >= 44.0 && height >= 44.0) {
            1.0
        } else {
            0.0
        };

        Ok(size_multiplier * contrast_multiplier)
    }
}

/// The build user: perceives, navigates, and acts on everything. Used to
/// discover the full graph (`BUILD_USER`).
#[derive(Debug, Default)]
pub struct OmniAbility;

impl UserAbility for OmniAbility {
    fn name(&self) -> &str {
        "omni"
    }

    fn claims_action(&self, _action_name: &str) -> bool {
        true
    }

    fn score_perceive(&self, _build: &mut BuildData, _access: &dyn InterfaceAccess, _element: &str) -> Result<f64> {
        Ok(1.0)
    }

    fn score_navigate(&self, _build: &mut BuildData, _access: &dyn InterfaceAccess, _element: &str) -> Result<f64> {
        Ok(1.0)
    }

    fn score_act(&self, _build: &mut BuildData, _access: &dyn InterfaceAccess, _element: &str, _action_name: &str) -> Result<f64> {
        Ok(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{Axes, UserModel};
    use std::collections::HashSet as StdHashSet;
    use std::sync::Arc;

    #[derive(Default)]
    struct Fixture {
        pixel_dist: f64,
        tab_dist: i64,
        width: f64,
        height: f64,
        contrast: f64,
        font_size: f64,
        tag: String,
    }

    impl crate::interface::ElementMeasurement for Fixture {
        fn measure_foreground_color(&self, _e: &str) -> Result<String> {
            Ok(String::new())
        }
        fn measure_background_color(&self, _e: &str) -> Result<String> {
            Ok(String::new())
        }
        fn measure_contrast_ratio(&self, _e: &str) -> Result<f64> {
            Ok(self.contrast)
        }
        fn measure_size(&self, _e: &str) -> Result<(f64, f64)> {
            Ok((self.width, self.height))
        }
        fn measure_font_size(&self, _e: &str) -> Result<f64> {
            Ok(self.font_size)
        }
        fn measure_position(&self, _e: &str) -> Result<(f64, f64)> {
            Ok((0.0, 0.0))
        }
        fn measure_pixel_distance_from_prior_focus(&self, _e: &str) -> Result<f64> {
            Ok(self.pixel_dist)
        }
        fn measure_tab_distance_from_prior_focus(&self, _e: &str) -> Result<i64> {
            Ok(self.tab_dist)
        }
        fn measure_tag_name(&self, _e: &str) -> Result<String> {
            Ok(self.tag.clone())
        }
        fn measure_text(&self, _e: &str) -> Result<String> {
            Ok(String::new())
        }
        fn measure_descriptor_tags(&self, _e: &str) -> Result<StdHashSet<String>> {
            Ok(Default::default())
        }
    }
    impl InterfaceAccess for Fixture {
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
    fn mouse_ability_scores_zero_far_outside_target() {
        let fixture = Fixture {
            pixel_dist: 100_000.0,
            width: 10.0,
            ..Default::default()
        };
        let mouse = MouseAbility;
        let mut build = BuildData::default();
        let score = mouse.score_navigate(&mut build, &fixture, "/html/body/button").unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn keyboard_ability_scores_one_at_zero_distance() {
        let fixture = Fixture { tab_dist: 0, ..Default::default() };
        let keyboard = KeyboardAbility;
        let mut build = BuildData::default();
        let score = keyboard.score_navigate(&mut build, &fixture, "/html/body/button").unwrap();
        assert_eq!(score, 1.0);
    }

    #[test]
    fn keyboard_ability_scores_zero_when_unreachable() {
        let fixture = Fixture { tab_dist: -1, ..Default::default() };
        let keyboard = KeyboardAbility;
        let mut build = BuildData::default();
        let score = keyboard.score_navigate(&mut build, &fixture, "/html/body/button").unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn vision_ability_requires_both_contrast_and_size() {
        let fixture = Fixture {
            contrast: 5.0,
            font_size: 12.0,
            width: 50.0,
            height: 50.0,
            tag: "button".into(),
            ..Default::default()
        };
        let vision = VisionAbility;
        let mut build = BuildData::default();
        let score = vision.score_perceive(&mut build, &fixture, "/html/body/button").unwrap();
        assert_eq!(score, 1.0);
    }

    #[test]
    fn vision_ability_exempts_list_tags_from_size_check() {
        let fixture = Fixture {
            contrast: 5.0,
            font_size: 12.0,
            width: 1.0,
            height: 1.0,
            tag: "li".into(),
            ..Default::default()
        };
        let vision = VisionAbility;
        let mut build = BuildData::default();
        let score = vision.score_perceive(&mut build, &fixture, "/html/body/li").unwrap();
        assert_eq!(score, 1.0);
    }

    #[test]
    fn omni_user_model_scores_one_on_every_axis() {
        let user = UserModel::new("build", vec![Arc::new(OmniAbility)]);
        let fixture = Fixture::default();
        let mut build = BuildData::default();
        let result = user
            .score(Axes::ALL, &mut build, &fixture, "/html/body/button", Some("anything"))
            .unwrap();
        assert_eq!(result.combined, 1.0);
    }
}
