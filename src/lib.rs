use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub mod events;
pub mod feed;
pub mod focus;
pub mod projection;
pub mod route;
pub mod viewport;

/// Identifier of a facility marker, unique within its site.
pub type FacilityId = String;

/// Root type for the sites data file
pub type SiteMaps = Vec<SiteMap>;

/// Errors raised while validating site data or parsing routes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SiteError {
    #[error("site '{site}': invalid zoom range (min {min}, default {default}, max {max})")]
    InvalidZoomRange {
        site: String,
        min: f32,
        default: f32,
        max: f32,
    },
    #[error("site '{site}': facility '{id}' is outside the reference image")]
    OutOfBounds { site: String, id: FacilityId },
    #[error("site '{site}': duplicate facility id '{id}'")]
    DuplicateFacility { site: String, id: FacilityId },
    #[error("site '{0}': reference size must be non-zero")]
    EmptyReferenceSize(String),
    #[error("invalid route: {0}")]
    InvalidRoute(String),
}

/// A name in both English and Arabic.
///
/// The app displays `en`; `ar` travels with detail routes and feed data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub en: String,
    pub ar: String,
}

impl LocalizedName {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }
}

/// A position expressed as a percentage (0-100) of the reference image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPos {
    pub x: f32,
    pub y: f32,
}

impl NormalizedPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_within_image(&self) -> bool {
        (0.0..=100.0).contains(&self.x) && (0.0..=100.0).contains(&self.y)
    }
}

/// Marker coordinates as authored in the site data.
///
/// Some marker sets were captured as pixel offsets in the full-resolution
/// reference image, others as percentages. Both resolve to a
/// [`NormalizedPos`] against the site's `reference_size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MarkerPosition {
    Percent { x: f32, y: f32 },
    ReferencePixels { x: f32, y: f32 },
}

impl MarkerPosition {
    pub fn normalize(&self, reference_size: [u32; 2]) -> NormalizedPos {
        match *self {
            MarkerPosition::Percent { x, y } => NormalizedPos::new(x, y),
            MarkerPosition::ReferencePixels { x, y } => NormalizedPos::new(
                x / reference_size[0] as f32 * 100.0,
                y / reference_size[1] as f32 * 100.0,
            ),
        }
    }
}

/// Kind of facility a marker represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacilityCategory {
    PoliceStation,
    Headquarters,
    Traffic,
    Training,
    Infrastructure,
    Residential,
}

impl FacilityCategory {
    pub const ALL: [FacilityCategory; 6] = [
        FacilityCategory::PoliceStation,
        FacilityCategory::Headquarters,
        FacilityCategory::Traffic,
        FacilityCategory::Training,
        FacilityCategory::Infrastructure,
        FacilityCategory::Residential,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FacilityCategory::PoliceStation => "Police Stations",
            FacilityCategory::Headquarters => "Headquarters",
            FacilityCategory::Traffic => "Traffic",
            FacilityCategory::Training => "Training",
            FacilityCategory::Infrastructure => "Infrastructure",
            FacilityCategory::Residential => "Residential",
        }
    }
}

/// Project status of a facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacilityStatus {
    Operational,
    UnderConstruction,
    Planned,
    Maintenance,
}

impl FacilityStatus {
    pub fn label(self) -> &'static str {
        match self {
            FacilityStatus::Operational => "Operational",
            FacilityStatus::UnderConstruction => "Under construction",
            FacilityStatus::Planned => "Planned",
            FacilityStatus::Maintenance => "Maintenance",
        }
    }
}

/// A facility or project marker placed over a site map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub id: FacilityId,
    pub name: LocalizedName,
    pub position: MarkerPosition,
    pub category: FacilityCategory,
    pub status: FacilityStatus,
}

/// Zoom limits and step sizes for one site map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomSettings {
    pub min: f32,
    pub max: f32,
    pub default: f32,
    /// Scale change per stepper button or keyboard press
    pub step: f32,
    /// Scale change per wheel notch
    pub wheel_step: f32,
}

impl ZoomSettings {
    pub fn clamp(&self, scale: f32) -> f32 {
        scale.clamp(self.min, self.max)
    }
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            min: 0.2,
            max: 3.0,
            default: 1.0,
            step: 0.2,
            wheel_step: 0.1,
        }
    }
}

/// A satellite reference image with its facility markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteMap {
    /// Stable key used in routes and settings (e.g., "abu-dhabi")
    pub key: String,
    pub name: LocalizedName,
    /// Path of the raster inside the embedded assets
    pub image_path: String,
    /// Logical full-resolution size of the reference image [width, height]
    pub reference_size: [u32; 2],
    #[serde(default)]
    pub zoom: ZoomSettings,
    #[serde(default)]
    pub markers: Vec<Facility>,
}

impl SiteMap {
    pub fn facility(&self, id: &str) -> Option<&Facility> {
        self.markers.iter().find(|facility| facility.id == id)
    }

    /// Normalized position of a facility against this site's reference size.
    pub fn normalized(&self, facility: &Facility) -> NormalizedPos {
        facility.position.normalize(self.reference_size)
    }

    /// Checks zoom limits, coordinate ranges and id uniqueness.
    pub fn validate(&self) -> Result<(), SiteError> {
        let zoom = &self.zoom;
        if !(zoom.min > 0.0 && zoom.min <= zoom.default && zoom.default <= zoom.max) {
            return Err(SiteError::InvalidZoomRange {
                site: self.key.clone(),
                min: zoom.min,
                default: zoom.default,
                max: zoom.max,
            });
        }

        if self.reference_size.contains(&0) {
            return Err(SiteError::EmptyReferenceSize(self.key.clone()));
        }

        self.validate_markers(&self.markers)
    }

    /// Validates a marker set against this site without modifying it.
    pub fn validate_markers(&self, markers: &[Facility]) -> Result<(), SiteError> {
        let mut seen = HashSet::new();
        for facility in markers {
            if !seen.insert(facility.id.as_str()) {
                return Err(SiteError::DuplicateFacility {
                    site: self.key.clone(),
                    id: facility.id.clone(),
                });
            }
            if !self.normalized(facility).is_within_image() {
                return Err(SiteError::OutOfBounds {
                    site: self.key.clone(),
                    id: facility.id.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn facility(id: &str, position: MarkerPosition) -> Facility {
        Facility {
            id: id.to_string(),
            name: LocalizedName::new(format!("Facility {id}"), "منشأة"),
            position,
            category: FacilityCategory::PoliceStation,
            status: FacilityStatus::Operational,
        }
    }

    fn site(markers: Vec<Facility>) -> SiteMap {
        SiteMap {
            key: "abu-dhabi".to_string(),
            name: LocalizedName::new("Abu Dhabi", "أبوظبي"),
            image_path: "maps/abu-dhabi.png".to_string(),
            reference_size: [2370, 2370],
            zoom: ZoomSettings {
                default: 0.4,
                ..ZoomSettings::default()
            },
            markers,
        }
    }

    #[test]
    fn reference_pixels_normalize_against_reference_size() {
        let pos = MarkerPosition::ReferencePixels {
            x: 1185.0,
            y: 592.5,
        };
        let normalized = pos.normalize([2370, 2370]);
        assert!((normalized.x - 50.0).abs() < 1e-4);
        assert!((normalized.y - 25.0).abs() < 1e-4);
    }

    #[test]
    fn percent_positions_pass_through() {
        let pos = MarkerPosition::Percent { x: 12.5, y: 80.0 };
        assert_eq!(pos.normalize([100, 50]), NormalizedPos::new(12.5, 80.0));
    }

    #[test]
    fn validate_accepts_well_formed_site() {
        let site = site(vec![
            facility("a", MarkerPosition::Percent { x: 0.0, y: 100.0 }),
            facility("b", MarkerPosition::ReferencePixels { x: 2370.0, y: 0.0 }),
        ]);
        assert_eq!(site.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let site = site(vec![
            facility("a", MarkerPosition::Percent { x: 10.0, y: 10.0 }),
            facility("a", MarkerPosition::Percent { x: 20.0, y: 20.0 }),
        ]);
        assert!(matches!(
            site.validate(),
            Err(SiteError::DuplicateFacility { id, .. }) if id == "a"
        ));
    }

    #[test]
    fn validate_rejects_markers_outside_image() {
        let site = site(vec![facility(
            "far",
            MarkerPosition::ReferencePixels {
                x: 2400.0,
                y: 10.0,
            },
        )]);
        assert!(matches!(site.validate(), Err(SiteError::OutOfBounds { .. })));
    }

    #[test]
    fn validate_rejects_default_outside_zoom_range() {
        let mut site = site(Vec::new());
        site.zoom.default = 5.0;
        assert!(matches!(
            site.validate(),
            Err(SiteError::InvalidZoomRange { .. })
        ));
    }
}
