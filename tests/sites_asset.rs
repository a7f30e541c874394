use site_map::projection::{ImageLayout, MarkerProjector};
use site_map::viewport::{ViewAction, ViewState};
use site_map::{SiteMap, SiteMaps};
use eframe::egui::{Rect, pos2, vec2};
use std::collections::HashSet;

const SITES_RON: &str = include_str!("../assets/sites.ron");

fn sites() -> SiteMaps {
    ron::from_str(SITES_RON).expect("embedded sites.ron should parse")
}

fn site<'a>(sites: &'a SiteMaps, key: &str) -> &'a SiteMap {
    sites
        .iter()
        .find(|site| site.key == key)
        .unwrap_or_else(|| panic!("missing site {key}"))
}

#[test]
fn embedded_sites_are_valid() {
    let sites = sites();
    assert!(!sites.is_empty());
    for site in &sites {
        site.validate()
            .unwrap_or_else(|err| panic!("{} failed validation: {err}", site.key));
        assert!(!site.markers.is_empty(), "{} has no markers", site.key);
    }

    let keys: HashSet<_> = sites.iter().map(|site| site.key.as_str()).collect();
    assert_eq!(keys.len(), sites.len(), "site keys must be unique");
}

#[test]
fn embedded_rasters_exist() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
    for site in sites() {
        assert!(
            root.join(&site.image_path).is_file(),
            "{} points at missing raster {}",
            site.key,
            site.image_path
        );
    }
}

#[test]
fn abu_dhabi_resets_to_its_default_zoom() {
    let sites = sites();
    let abu_dhabi = site(&sites, "abu-dhabi");
    assert_eq!(abu_dhabi.reference_size, [2370, 2370]);
    assert_eq!(abu_dhabi.zoom.default, 0.4);

    let reference = vec2(2370.0, 2370.0);
    let viewport = vec2(1200.0, 800.0);
    let view = ViewState::new(&abu_dhabi.zoom, reference, viewport)
        .reduce(&abu_dhabi.zoom, ViewAction::ZoomIn { viewport })
        .reduce(&abu_dhabi.zoom, ViewAction::Pan(vec2(120.0, -40.0)))
        .reduce(
            &abu_dhabi.zoom,
            ViewAction::Reset {
                reference_size: reference,
                viewport,
            },
        );
    assert_eq!(view.scale, 0.4);
}

#[test]
fn every_marker_projects_inside_the_rendered_image() {
    for site in sites() {
        let image = Rect::from_min_size(pos2(37.0, 12.0), vec2(948.0, 711.0));
        let container = Rect::from_min_size(pos2(0.0, 0.0), vec2(1024.0, 768.0));
        let projector = MarkerProjector::ready(ImageLayout::new(image, container));

        for (facility, offset) in projector.project_all(&site) {
            let local = Rect::from_min_size(image.min - container.min.to_vec2(), image.size());
            assert!(
                local.expand(1e-3).contains(offset),
                "{}/{} projected outside the image: {offset:?}",
                site.key,
                facility.id
            );
        }
    }
}
