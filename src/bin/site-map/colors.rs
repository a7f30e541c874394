//! Color constants for facility markers and UI elements.

use eframe::egui::Color32;
use site_map::{FacilityCategory, FacilityStatus};

// Marker fills per category
pub const POLICE_STATION_FILL: Color32 = Color32::from_rgb(30, 110, 220);
pub const HEADQUARTERS_FILL: Color32 = Color32::from_rgb(200, 40, 50);
pub const TRAFFIC_FILL: Color32 = Color32::from_rgb(255, 165, 0);
pub const TRAINING_FILL: Color32 = Color32::from_rgb(50, 170, 90);
pub const INFRASTRUCTURE_FILL: Color32 = Color32::from_rgb(140, 90, 200);
pub const RESIDENTIAL_FILL: Color32 = Color32::from_rgb(0, 170, 170);

// Marker outline per status
pub const OPERATIONAL_STROKE: Color32 = Color32::from_rgb(255, 255, 255);
pub const CONSTRUCTION_STROKE: Color32 = Color32::from_rgb(255, 215, 0);
pub const PLANNED_STROKE: Color32 = Color32::from_rgb(160, 160, 160);
pub const MAINTENANCE_STROKE: Color32 = Color32::from_rgb(255, 99, 71);

pub const SELECTION_RING: Color32 = Color32::from_rgb(255, 255, 255);

// Text colors
pub const LABEL_TEXT: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 230);
pub const LABEL_SHADOW: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 180);

pub fn category_fill(category: FacilityCategory) -> Color32 {
    match category {
        FacilityCategory::PoliceStation => POLICE_STATION_FILL,
        FacilityCategory::Headquarters => HEADQUARTERS_FILL,
        FacilityCategory::Traffic => TRAFFIC_FILL,
        FacilityCategory::Training => TRAINING_FILL,
        FacilityCategory::Infrastructure => INFRASTRUCTURE_FILL,
        FacilityCategory::Residential => RESIDENTIAL_FILL,
    }
}

pub fn status_stroke(status: FacilityStatus) -> Color32 {
    match status {
        FacilityStatus::Operational => OPERATIONAL_STROKE,
        FacilityStatus::UnderConstruction => CONSTRUCTION_STROKE,
        FacilityStatus::Planned => PLANNED_STROKE,
        FacilityStatus::Maintenance => MAINTENANCE_STROKE,
    }
}
