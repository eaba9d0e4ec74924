//! Minimal `InterfaceAccess` fixture shared by this crate's unit tests.
//! Only `state_data` is exercised by action candidate-discovery tests; every
//! other method is an unreachable stub.

use demodocus_core::ability::UserModel;
use demodocus_core::error::Result;
use demodocus_core::graph::EdgeMetrics;
use demodocus_core::interface::{ElementMeasurement, InterfaceAccess, TabOrder};
use demodocus_core::web::WebStateData;
use demodocus_core::Action;
use std::collections::HashSet;
use std::sync::Arc;

pub(crate) struct DomFixture(pub String);

impl ElementMeasurement for DomFixture {
    fn measure_foreground_color(&self, _element: &str) -> Result<String> {
        unimplemented!("not exercised by action candidate-discovery tests")
    }
    fn measure_background_color(&self, _element: &str) -> Result<String> {
        unimplemented!("not exercised by action candidate-discovery tests")
    }
    fn measure_contrast_ratio(&self, _element: &str) -> Result<f64> {
        unimplemented!("not exercised by action candidate-discovery tests")
    }
    fn measure_size(&self, _element: &str) -> Result<(f64, f64)> {
        unimplemented!("not exercised by action candidate-discovery tests")
    }
    fn measure_font_size(&self, _element: &str) -> Result<f64> {
        unimplemented!("not exercised by action candidate-discovery tests")
    }
    fn measure_position(&self, _element: &str) -> Result<(f64, f64)> {
        unimplemented!("not exercised by action candidate-discovery tests")
    }
    fn measure_pixel_distance_from_prior_focus(&self, _element: &str) -> Result<f64> {
        unimplemented!("not exercised by action candidate-discovery tests")
    }
    fn measure_tab_distance_from_prior_focus(&self, _element: &str) -> Result<i64> {
        unimplemented!("not exercised by action candidate-discovery tests")
    }
    fn measure_tag_name(&self, _element: &str) -> Result<String> {
        unimplemented!("not exercised by action candidate-discovery tests")
    }
    fn measure_text(&self, _element: &str) -> Result<String> {
        unimplemented!("not exercised by action candidate-discovery tests")
    }
    fn measure_descriptor_tags(&self, _element: &str) -> Result<HashSet<String>> {
        unimplemented!("not exercised by action candidate-discovery tests")
    }
}

impl InterfaceAccess for DomFixture {
    fn load(&mut self, _entry_point: &str) -> Result<bool> {
        Ok(true)
    }

    fn state_data(&mut self) -> Result<WebStateData> {
        Ok(WebStateData::new("https://example.test/", self.0.clone()))
    }

    fn set_state(&mut self, _state: &WebStateData) -> Result<bool> {
        Ok(true)
    }

    fn set_state_direct(&mut self, _state: &WebStateData) -> Result<bool> {
        Ok(true)
    }

    fn is_state_valid(&mut self) -> Result<bool> {
        Ok(true)
    }

    fn actions(&self) -> Vec<Arc<dyn Action>> {
        Vec::new()
    }

    fn perform_action_on_element(&mut self, _user: &UserModel, _action_name: &str, _element: &str) -> Result<EdgeMetrics> {
        unimplemented!("not exercised by action candidate-discovery tests")
    }

    fn set_field_value(&mut self, _element: &str, _value: &str) -> Result<()> {
        unimplemented!("not exercised by action candidate-discovery tests")
    }

    fn generate_tab_order(&mut self, _context: Option<&str>) -> Result<TabOrder> {
        unimplemented!("not exercised by action candidate-discovery tests")
    }

    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) {}
}
