//! C6: the build-data cache (§4.6).
//!
//! `BuildData` is a lazy map of interface measurements about one
//! `(state, action, element)`. Each field is captured from the interface on
//! first access and memoized; the whole thing is a closed enum of
//! measurement kinds rather than anything reflective, per §9 "Lazy build
//! data".

use crate::interface::ElementMeasurement;
use std::collections::HashSet;

/// One measurement kind `BuildData` can lazily capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementKind {
    /// CSS foreground (text) color.
    ForegroundColor,
    /// CSS background color.
    BackgroundColor,
    /// WCAG contrast ratio between foreground and background.
    ContrastRatio,
    /// Rendered height in pixels.
    Height,
    /// Rendered width in pixels.
    Width,
    /// Rendered font size in points.
    FontSize,
    /// Pixel X position.
    PixelX,
    /// Pixel Y position.
    PixelY,
    /// Pixel distance from the element focused just before this action.
    PixelDistanceFromPriorFocus,
    /// Tab-order distance from the element focused just before this action.
    TabDistanceFromPriorFocus,
    /// Lowercase tag name.
    TagName,
    /// Visible text content.
    Text,
    /// ARIA/role descriptor tags (e.g. `button`, `link`, `heading`).
    DescriptorTags,
}

/// Interface measurements about one `(state, action, element)`, captured
/// exactly once during the build pass and consumed read-only by simulated
/// users (§4.6).
#[derive(Debug, Clone, Default)]
pub struct BuildData {
    foreground_color: Option<String>,
    background_color: Option<String>,
    contrast_ratio: Option<f64>,
    height: Option<f64>,
    width: Option<f64>,
    font_size: Option<f64>,
    pixel_x: Option<f64>,
    pixel_y: Option<f64>,
    pixel_distance_from_prior_focus: Option<f64>,
    tab_distance_from_prior_focus: Option<i64>,
    tag_name: Option<String>,
    text: Option<String>,
    descriptor_tags: Option<HashSet<String>>,
    /// Set by `capture_all`; a simulated re-crawl rejects any edge whose
    /// `BuildData` has this false (§4.6, §4.9).
    is_captured: bool,
}

impl BuildData {
    /// Whether `capture_all` has been run on this instance.
    pub fn is_captured(&self) -> bool {
        self.is_captured
    }

    /// Force all measurement kinds to be captured, memoizing each, and
    /// flip `is_captured`.
    pub fn capture_all(&mut self, access: &dyn ElementMeasurement, element: &str) -> crate::error::Result<()> {
        self.foreground_color(access, element)?;
        self.background_color(access, element)?;
        self.contrast_ratio(access, element)?;
        self.height(access, element)?;
        self.width(access, element)?;
        self.font_size(access, element)?;
        self.pixel_x(access, element)?;
        self.pixel_y(access, element)?;
        self.pixel_distance_from_prior_focus(access, element)?;
        self.tab_distance_from_prior_focus(access, element)?;
        self.tag_name(access, element)?;
        self.text(access, element)?;
        self.descriptor_tags(access, element)?;
        self.is_captured = true;
        Ok(())
    }

    /// Foreground color, capturing on first access.
    pub fn foreground_color(&mut self, access: &dyn ElementMeasurement, element: &str) -> crate::error::Result<String> {
        if self.foreground_color.is_none() {
            self.foreground_color = Some(access.measure_foreground_color(element)?);
        }
        #[allow(clippy::unwrap_used)]
        Ok(self.foreground_color.clone().unwrap())
    }

    /// Background color, capturing on first access.
    pub fn background_color(&mut self, access: &dyn ElementMeasurement, element: &str) -> crate::error::Result<String> {
        if self.background_color.is_none() {
            self.background_color = Some(access.measure_background_color(element)?);
        }
        #[allow(clippy::unwrap_used)]
        Ok(self.background_color.clone().unwrap())
    }

    /// Contrast ratio, capturing on first access.
    pub fn contrast_ratio(&mut self, access: &dyn ElementMeasurement, element: &str) -> crate::error::Result<f64> {
        if self.contrast_ratio.is_none() {
            self.contrast_ratio = Some(access.measure_contrast_ratio(element)?);
        }
        #[allow(clippy::unwrap_used)]
        Ok(self.contrast_ratio.unwrap())
    }

    /// Rendered height, capturing on first access.
    pub fn height(&mut self, access: &dyn ElementMeasurement, element: &str) -> crate::error::Result<f64> {
        if self.height.is_none() {
            let (_, h) = access.measure_size(element)?;
            self.height = Some(h);
        }
        #[allow(clippy::unwrap_used)]
        Ok(self.height.unwrap())
    }

    /// Rendered width, capturing on first access.
    pub fn width(&mut self, access: &dyn ElementMeasurement, element: &str) -> crate::error::Result<f64> {
        if self.width.is_none() {
            let (w, _) = access.measure_size(element)?;
            self.width = Some(w);
        }
        #[allow(clippy::unwrap_used)]
        Ok(self.width.unwrap())
    }

    /// Font size, capturing on first access.
    pub fn font_size(&mut self, access: &dyn ElementMeasurement, element: &str) -> crate::error::Result<f64> {
        if self.font_size.is_none() {
            self.font_size = Some(access.measure_font_size(element)?);
        }
        #[allow(clippy::unwrap_used)]
        Ok(self.font_size.unwrap())
    }

    /// Pixel X position, capturing on first access.
    pub fn pixel_x(&mut self, access: &dyn ElementMeasurement, element: &str) -> crate::error::Result<f64> {
        if self.pixel_x.is_none() {
            let (x, _) = access.measure_position(element)?;
            self.pixel_x = Some(x);
        }
        #[allow(clippy::unwrap_used)]
        Ok(self.pixel_x.unwrap())
    }

    /// Pixel Y position, capturing on first access.
    pub fn pixel_y(&mut self, access: &dyn ElementMeasurement, element: &str) -> crate::error::Result<f64> {
        if self.pixel_y.is_none() {
            let (_, y) = access.measure_position(element)?;
            self.pixel_y = Some(y);
        }
        #[allow(clippy::unwrap_used)]
        Ok(self.pixel_y.unwrap())
    }

    /// Pixel distance from the previously focused element, capturing on
    /// first access.
    pub fn pixel_distance_from_prior_focus(
        &mut self,
        access: &dyn ElementMeasurement,
        element: &str,
    ) -> crate::error::Result<f64> {
        if self.pixel_distance_from_prior_focus.is_none() {
            self.pixel_distance_from_prior_focus = Some(access.measure_pixel_distance_from_prior_focus(element)?);
        }
        #[allow(clippy::unwrap_used)]
        Ok(self.pixel_distance_from_prior_focus.unwrap())
    }

    /// Tab-order distance from the previously focused element, capturing on
    /// first access.
    pub fn tab_distance_from_prior_focus(
        &mut self,
        access: &dyn ElementMeasurement,
        element: &str,
    ) -> crate::error::Result<i64> {
        if self.tab_distance_from_prior_focus.is_none() {
            self.tab_distance_from_prior_focus = Some(access.measure_tab_distance_from_prior_focus(element)?);
        }
        #[allow(clippy::unwrap_used)]
        Ok(self.tab_distance_from_prior_focus.unwrap())
    }

    /// Tag name, capturing on first access.
    pub fn tag_name(&mut self, access: &dyn ElementMeasurement, element: &str) -> crate::error::Result<String> {
        if self.tag_name.is_none() {
            self.tag_name = Some(access.measure_tag_name(element)?);
        }
        #[allow(clippy::unwrap_used)]
        Ok(self.tag_name.clone().unwrap())
    }

    /// Visible text, capturing on first access.
    pub fn text(&mut self, access: &dyn ElementMeasurement, element: &str) -> crate::error::Result<String> {
        if self.text.is_none() {
            self.text = Some(access.measure_text(element)?);
        }
        #[allow(clippy::unwrap_used)]
        Ok(self.text.clone().unwrap())
    }

    /// Descriptor tag set, capturing on first access.
    pub fn descriptor_tags(
        &mut self,
        access: &dyn ElementMeasurement,
        element: &str,
    ) -> crate::error::Result<HashSet<String>> {
        if self.descriptor_tags.is_none() {
            self.descriptor_tags = Some(access.measure_descriptor_tags(element)?);
        }
        #[allow(clippy::unwrap_used)]
        Ok(self.descriptor_tags.clone().unwrap())
    }

    /// Already-captured contrast ratio, if any, without forcing capture.
    /// Used by the analyzer's rule evaluators, which run after the crawl
    /// and have no live interface to fall back on.
    pub fn captured_contrast_ratio(&self) -> Option<f64> {
        self.contrast_ratio
    }

    /// Already-captured `(width, height)`, if both were captured.
    pub fn captured_size(&self) -> Option<(f64, f64)> {
        Some((self.width?, self.height?))
    }

    /// Already-captured font size, if any.
    pub fn captured_font_size(&self) -> Option<f64> {
        self.font_size
    }

    /// Already-captured tag name, if any.
    pub fn captured_tag_name(&self) -> Option<&str> {
        self.tag_name.as_deref()
    }

    /// Already-captured visible text, if any.
    pub fn captured_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Already-memoized values, read-only, used by downstream consumers
    /// (e.g. GML export) without forcing capture.
    pub fn memoized(&self) -> Vec<(MeasurementKind, String)> {
        let mut out = Vec::new();
        if let Some(v) = &self.foreground_color {
            out.push((MeasurementKind::ForegroundColor, v.clone()));
        }
        if let Some(v) = &self.background_color {
            out.push((MeasurementKind::BackgroundColor, v.clone()));
        }
        if let Some(v) = self.contrast_ratio {
            out.push((MeasurementKind::ContrastRatio, v.to_string()));
        }
        if let Some(v) = self.height {
            out.push((MeasurementKind::Height, v.to_string()));
        }
        if let Some(v) = self.width {
            out.push((MeasurementKind::Width, v.to_string()));
        }
        if let Some(v) = self.font_size {
            out.push((MeasurementKind::FontSize, v.to_string()));
        }
        if let Some(v) = self.pixel_x {
            out.push((MeasurementKind::PixelX, v.to_string()));
        }
        if let Some(v) = self.pixel_y {
            out.push((MeasurementKind::PixelY, v.to_string()));
        }
        if let Some(v) = self.pixel_distance_from_prior_focus {
            out.push((MeasurementKind::PixelDistanceFromPriorFocus, v.to_string()));
        }
        if let Some(v) = self.tab_distance_from_prior_focus {
            out.push((MeasurementKind::TabDistanceFromPriorFocus, v.to_string()));
        }
        if let Some(v) = &self.tag_name {
            out.push((MeasurementKind::TagName, v.clone()));
        }
        if let Some(v) = &self.text {
            out.push((MeasurementKind::Text, v.clone()));
        }
        if let Some(v) = &self.descriptor_tags {
            let mut tags: Vec<&String> = v.iter().collect();
            tags.sort();
            let joined = tags.into_iter().cloned().collect::<Vec<_>>().join(",");
            out.push((MeasurementKind::DescriptorTags, joined));
        }
        out
    }
}
