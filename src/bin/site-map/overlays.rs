//! Overlay visibility settings and drawing functions for facility markers.

use crate::colors;
use crate::constants::MARKER_RADIUS;
use eframe::egui;
use serde::{Deserialize, Serialize};
use site_map::focus::{MarkerAppearance, MarkerFocus};
use site_map::projection::MarkerProjector;
use site_map::{Facility, FacilityCategory, SiteMap};

/// Controls visibility of marker labels and each facility category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayVisibility {
    pub labels: bool,
    pub police_stations: bool,
    pub headquarters: bool,
    pub traffic: bool,
    pub training: bool,
    pub infrastructure: bool,
    pub residential: bool,
}

impl Default for OverlayVisibility {
    fn default() -> Self {
        Self {
            labels: true,
            police_stations: true,
            headquarters: true,
            traffic: true,
            training: true,
            infrastructure: true,
            residential: true,
        }
    }
}

impl OverlayVisibility {
    pub fn category_mut(&mut self, category: FacilityCategory) -> &mut bool {
        match category {
            FacilityCategory::PoliceStation => &mut self.police_stations,
            FacilityCategory::Headquarters => &mut self.headquarters,
            FacilityCategory::Traffic => &mut self.traffic,
            FacilityCategory::Training => &mut self.training,
            FacilityCategory::Infrastructure => &mut self.infrastructure,
            FacilityCategory::Residential => &mut self.residential,
        }
    }

    pub fn shows(&self, facility: &Facility) -> bool {
        match facility.category {
            FacilityCategory::PoliceStation => self.police_stations,
            FacilityCategory::Headquarters => self.headquarters,
            FacilityCategory::Traffic => self.traffic,
            FacilityCategory::Training => self.training,
            FacilityCategory::Infrastructure => self.infrastructure,
            FacilityCategory::Residential => self.residential,
        }
    }
}

/// Everything the marker layer needs for one frame.
pub struct MarkerLayer<'a> {
    pub site: &'a SiteMap,
    pub projector: &'a MarkerProjector,
    pub focus: &'a MarkerFocus,
    pub overlays: OverlayVisibility,
    /// Current view scale, used to size markers and labels
    pub scale: f32,
}

/// Scales the RGB channels of `color`, keeping alpha.
fn adjust(color: egui::Color32, appearance: MarkerAppearance) -> egui::Color32 {
    let [r, g, b, _] = color.to_array();
    let channel = |c: u8| (c as f32 * appearance.brightness).clamp(0.0, 255.0) as u8;
    egui::Color32::from_rgb(channel(r), channel(g), channel(b)).gamma_multiply(appearance.opacity)
}

/// Draws facility markers, hovered marker last so it stays on top.
pub fn draw_markers(painter: &egui::Painter, container: egui::Rect, layer: &MarkerLayer<'_>) {
    if !layer.projector.is_ready() {
        return;
    }

    let radius_base = (MARKER_RADIUS * layer.scale.sqrt()).clamp(5.0, 16.0);
    let hovered = layer.focus.hovered();

    let mut visible: Vec<_> = layer
        .projector
        .project_all(layer.site)
        .filter(|(facility, _)| layer.overlays.shows(facility))
        .map(|(facility, offset)| (facility, container.min + offset.to_vec2()))
        .filter(|(_, pos)| container.expand(20.0).contains(*pos))
        .collect();
    visible.sort_by_key(|(facility, _)| Some(facility.id.as_str()) == hovered);

    for (facility, pos) in visible {
        let appearance = layer.focus.appearance(&facility.id);
        let radius = radius_base * appearance.scale;

        if appearance.selected {
            painter.circle_stroke(
                pos,
                radius + 4.0,
                egui::Stroke::new(2.5, colors::SELECTION_RING),
            );
        }

        painter.circle(
            pos,
            radius,
            adjust(colors::category_fill(facility.category), appearance),
            egui::Stroke::new(2.0, adjust(colors::status_stroke(facility.status), appearance)),
        );

        let show_label = layer.overlays.labels || Some(facility.id.as_str()) == hovered;
        if show_label {
            draw_label(
                painter,
                pos + egui::vec2(0.0, -radius - 4.0),
                &facility.name.en,
                layer.scale,
                appearance,
            );
        }
    }
}

/// Draws a shadowed name label anchored at its bottom centre.
fn draw_label(
    painter: &egui::Painter,
    pos: egui::Pos2,
    text: &str,
    scale: f32,
    appearance: MarkerAppearance,
) {
    let font_size = (13.0 * scale.sqrt()).clamp(10.0, 18.0) * appearance.scale.min(1.1);
    let font_id = egui::FontId::proportional(font_size);

    // Shadow
    painter.text(
        pos + egui::vec2(1.0, 1.0),
        egui::Align2::CENTER_BOTTOM,
        text,
        font_id.clone(),
        colors::LABEL_SHADOW.gamma_multiply(appearance.opacity),
    );

    // Main text
    painter.text(
        pos,
        egui::Align2::CENTER_BOTTOM,
        text,
        font_id,
        colors::LABEL_TEXT.gamma_multiply(appearance.opacity),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use site_map::{FacilityStatus, LocalizedName, MarkerPosition};

    #[test]
    fn hidden_categories_are_filtered() {
        let mut overlays = OverlayVisibility::default();
        *overlays.category_mut(FacilityCategory::Traffic) = false;

        let facility = Facility {
            id: "traffic-patrols".to_string(),
            name: LocalizedName::new("Traffic", "المرور"),
            position: MarkerPosition::Percent { x: 1.0, y: 1.0 },
            category: FacilityCategory::Traffic,
            status: FacilityStatus::Operational,
        };
        assert!(!overlays.shows(&facility));

        *overlays.category_mut(FacilityCategory::Traffic) = true;
        assert!(overlays.shows(&facility));
    }

    #[test]
    fn dimming_scales_brightness_and_alpha() {
        let dimmed = MarkerAppearance {
            opacity: 0.5,
            scale: 1.0,
            brightness: 0.5,
            selected: false,
        };
        let color = adjust(egui::Color32::from_rgb(200, 100, 50), dimmed);
        assert!(color.a() < 255);
        assert!(color.r() < 200 && color.g() < 100);
    }
}
