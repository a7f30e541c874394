//! Coordinate-to-pixel projection for markers placed over a reference image.

use crate::{Facility, NormalizedPos, SiteMap};
use eframe::egui::{Pos2, Rect, Vec2, pos2};

/// Where the reference image is currently rendered, relative to its container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageLayout {
    /// Rendered image rectangle in screen coordinates
    pub image: Rect,
    /// Container (viewport) rectangle in screen coordinates
    pub container: Rect,
}

impl ImageLayout {
    pub fn new(image: Rect, container: Rect) -> Self {
        Self { image, container }
    }

    /// Offset of the image's top-left corner inside the container.
    pub fn image_offset(&self) -> Vec2 {
        self.image.min - self.container.min
    }
}

/// Projects normalized marker positions into container pixel offsets.
///
/// Until the reference image has loaded there is no layout; the projector
/// then reports itself as not ready and every projection is `(0, 0)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerProjector {
    layout: Option<ImageLayout>,
}

impl MarkerProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a projector for an image that has finished loading.
    pub fn ready(layout: ImageLayout) -> Self {
        Self {
            layout: Some(layout),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.layout.is_some()
    }

    /// Records the latest rendered layout. Called every frame after the
    /// image rect is known so positions never go stale across resize or zoom.
    pub fn update(&mut self, layout: ImageLayout) {
        self.layout = Some(layout);
    }

    /// Drops the layout, e.g. when switching to a site whose image is loading.
    pub fn invalidate(&mut self) {
        self.layout = None;
    }

    /// Returns the `{ left, top }` pixel offset of `pos` inside the container.
    pub fn project(&self, pos: NormalizedPos) -> Pos2 {
        let Some(layout) = self.layout else {
            return Pos2::ZERO;
        };
        let offset = layout.image_offset();
        let size = layout.image.size();
        pos2(
            offset.x + pos.x / 100.0 * size.x,
            offset.y + pos.y / 100.0 * size.y,
        )
    }

    /// Maps a container offset back to a normalized image position.
    pub fn unproject(&self, offset: Pos2) -> Option<NormalizedPos> {
        let layout = self.layout?;
        let size = layout.image.size();
        if size.x <= 0.0 || size.y <= 0.0 {
            return None;
        }
        let local = offset - layout.image_offset();
        Some(NormalizedPos::new(
            local.x / size.x * 100.0,
            local.y / size.y * 100.0,
        ))
    }

    /// Projects every marker of `site`. Empty while the image is not ready.
    pub fn project_all<'a>(
        &self,
        site: &'a SiteMap,
    ) -> impl Iterator<Item = (&'a Facility, Pos2)> + use<'a> {
        let projector = *self;
        site.markers
            .iter()
            .filter(move |_| projector.is_ready())
            .map(move |facility| (facility, projector.project(site.normalized(facility))))
    }

    /// Finds the marker closest to `offset` within `radius` pixels among
    /// those accepted by `visible`.
    pub fn hit_test<'a>(
        &self,
        site: &'a SiteMap,
        offset: Pos2,
        radius: f32,
        visible: impl Fn(&Facility) -> bool,
    ) -> Option<&'a Facility> {
        self.project_all(site)
            .filter(|&(facility, _)| visible(facility))
            .map(|(facility, pos)| (facility, pos.distance(offset)))
            .filter(|(_, distance)| *distance <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(facility, _)| facility)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        FacilityCategory, FacilityStatus, LocalizedName, MarkerPosition, ZoomSettings,
    };
    use eframe::egui::vec2;

    fn layout(image_min: Pos2, image_size: Vec2) -> ImageLayout {
        ImageLayout::new(
            Rect::from_min_size(image_min, image_size),
            Rect::from_min_size(Pos2::ZERO, vec2(1200.0, 900.0)),
        )
    }

    fn site_with(markers: &[(&str, f32, f32)]) -> SiteMap {
        SiteMap {
            key: "al-ain".to_string(),
            name: LocalizedName::new("Al Ain", "العين"),
            image_path: "maps/al-ain.png".to_string(),
            reference_size: [1000, 1000],
            zoom: ZoomSettings::default(),
            markers: markers
                .iter()
                .map(|(id, x, y)| Facility {
                    id: id.to_string(),
                    name: LocalizedName::new(*id, *id),
                    position: MarkerPosition::Percent { x: *x, y: *y },
                    category: FacilityCategory::Infrastructure,
                    status: FacilityStatus::Planned,
                })
                .collect(),
        }
    }

    #[test]
    fn centre_of_square_image_projects_to_half_size() {
        let projector = MarkerProjector::ready(layout(Pos2::ZERO, vec2(1000.0, 1000.0)));
        assert_eq!(
            projector.project(NormalizedPos::new(50.0, 50.0)),
            pos2(500.0, 500.0)
        );
    }

    #[test]
    fn projection_includes_letterbox_offset() {
        let projector = MarkerProjector::ready(layout(pos2(100.0, 0.0), vec2(900.0, 900.0)));
        assert_eq!(
            projector.project(NormalizedPos::new(0.0, 100.0)),
            pos2(100.0, 900.0)
        );
    }

    #[test]
    fn container_origin_is_subtracted() {
        let layout = ImageLayout::new(
            Rect::from_min_size(pos2(250.0, 130.0), vec2(400.0, 200.0)),
            Rect::from_min_size(pos2(200.0, 100.0), vec2(800.0, 600.0)),
        );
        let projector = MarkerProjector::ready(layout);
        assert_eq!(
            projector.project(NormalizedPos::new(25.0, 50.0)),
            pos2(150.0, 130.0)
        );
    }

    #[test]
    fn unloaded_image_yields_degenerate_offsets() {
        let projector = MarkerProjector::new();
        assert!(!projector.is_ready());
        assert_eq!(projector.project(NormalizedPos::new(75.0, 20.0)), Pos2::ZERO);
        let site = site_with(&[("a", 10.0, 10.0)]);
        assert_eq!(projector.project_all(&site).count(), 0);
        assert!(projector.hit_test(&site, Pos2::ZERO, 50.0, |_| true).is_none());
    }

    #[test]
    fn projected_points_stay_inside_image() {
        let image_min = pos2(-340.0, 57.5);
        let image_size = vec2(2370.0 * 0.4, 1777.0 * 0.4);
        let projector = MarkerProjector::ready(layout(image_min, image_size));
        // Container sits at the origin, so offsets are screen positions.
        let bounds = Rect::from_min_size(image_min, image_size);

        for xi in 0..=20 {
            for yi in 0..=20 {
                let pos = NormalizedPos::new(xi as f32 * 5.0, yi as f32 * 5.0);
                let screen = projector.project(pos);
                assert!(
                    bounds.expand(1e-3).contains(screen),
                    "{pos:?} projected to {screen:?} outside {bounds:?}"
                );
            }
        }
    }

    #[test]
    fn recomputes_after_layout_change() {
        let mut projector = MarkerProjector::ready(layout(Pos2::ZERO, vec2(1000.0, 1000.0)));
        let pos = NormalizedPos::new(50.0, 50.0);
        assert_eq!(projector.project(pos), pos2(500.0, 500.0));

        projector.update(layout(pos2(20.0, 40.0), vec2(2000.0, 2000.0)));
        assert_eq!(projector.project(pos), pos2(1020.0, 1040.0));

        projector.invalidate();
        assert_eq!(projector.project(pos), Pos2::ZERO);
    }

    #[test]
    fn unproject_inverts_project() {
        let projector = MarkerProjector::ready(layout(pos2(30.0, 10.0), vec2(800.0, 400.0)));
        let pos = NormalizedPos::new(62.5, 12.5);
        let back = projector.unproject(projector.project(pos)).unwrap();
        assert!((back.x - pos.x).abs() < 1e-3);
        assert!((back.y - pos.y).abs() < 1e-3);
    }

    #[test]
    fn hit_test_picks_nearest_marker_within_radius() {
        let site = site_with(&[("north", 50.0, 10.0), ("centre", 50.0, 50.0), ("near", 52.0, 50.0)]);
        let projector = MarkerProjector::ready(layout(Pos2::ZERO, vec2(1000.0, 1000.0)));

        let hit = projector.hit_test(&site, pos2(505.0, 500.0), 12.0, |_| true);
        assert_eq!(hit.map(|f| f.id.as_str()), Some("centre"));

        let hit = projector.hit_test(&site, pos2(518.0, 501.0), 12.0, |_| true);
        assert_eq!(hit.map(|f| f.id.as_str()), Some("near"));

        assert!(projector.hit_test(&site, pos2(500.0, 300.0), 12.0, |_| true).is_none());
    }

    #[test]
    fn hidden_markers_do_not_shadow_visible_ones() {
        let site = site_with(&[("hidden", 50.0, 50.0), ("shown", 51.0, 50.0)]);
        let projector = MarkerProjector::ready(layout(Pos2::ZERO, vec2(1000.0, 1000.0)));
        let pointer = pos2(501.0, 500.0);

        let nearest = projector.hit_test(&site, pointer, 14.0, |_| true);
        assert_eq!(nearest.map(|f| f.id.as_str()), Some("hidden"));

        let visible = projector.hit_test(&site, pointer, 14.0, |f| f.id != "hidden");
        assert_eq!(visible.map(|f| f.id.as_str()), Some("shown"));
    }
}
