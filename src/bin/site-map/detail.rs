//! Facility detail page shown when a detail route is open.

use crate::SiteMapApp;
use crate::colors;
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use egui_toast::{Toast, ToastKind, ToastOptions};
use site_map::Facility;
use site_map::events::SiteEvent;
use site_map::route::DetailRoute;

const ROW_HEIGHT: f32 = 22.0;

impl SiteMapApp {
    /// Renders the detail page for `route`.
    ///
    /// The facility may have disappeared after a feed refresh; the page then
    /// falls back to the names carried by the route.
    pub fn show_detail_page(&mut self, ui: &mut egui::Ui, route: &DetailRoute) {
        let site = self.sites.iter().find(|site| site.key == route.site).cloned();
        let facility = site
            .as_ref()
            .and_then(|site| site.facility(&route.facility))
            .cloned();

        ui.horizontal(|ui| {
            if ui.button("← Back to map").clicked() {
                self.route = None;
            }
            ui.separator();
            ui.monospace(route.to_string());
        });
        ui.add_space(8.0);

        ui.heading(&route.name.en);
        ui.add_space(8.0);

        let Some(facility) = facility else {
            ui.colored_label(
                egui::Color32::YELLOW,
                "This facility is not part of the current site data.",
            );
            return;
        };

        self.show_detail_table(ui, route, &facility, site.as_ref().map(|site| site.normalized(&facility)));
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            if ui.button("Show on map").clicked() {
                self.bus.publish(SiteEvent::ZoomToMarker(facility.id.clone()));
            }

            if let Some(base) = self.settings.detail_base_url()
                && ui.button("Open in browser").clicked()
            {
                let result = route
                    .external_url(base)
                    .map_err(|err| err.to_string())
                    .and_then(|url| {
                        log::info!("Opening {url}");
                        open::that(url.as_str()).map_err(|err| err.to_string())
                    });
                if let Err(err) = result {
                    log::warn!("Failed to open facility page: {err}");
                    self.toasts.add(Toast {
                        kind: ToastKind::Error,
                        text: format!("Could not open facility page: {err}").into(),
                        options: ToastOptions::default()
                            .duration_in_seconds(6.0)
                            .show_icon(true),
                        ..Default::default()
                    });
                }
            }
        });
    }

    fn show_detail_table(
        &self,
        ui: &mut egui::Ui,
        route: &DetailRoute,
        facility: &Facility,
        position: Option<site_map::NormalizedPos>,
    ) {
        let site_name = self
            .sites
            .iter()
            .find(|site| site.key == route.site)
            .map(|site| site.name.en.clone())
            .unwrap_or_else(|| route.site.clone());

        let mut rows: Vec<(&str, String)> = vec![
            ("Site", site_name),
            ("Facility id", facility.id.clone()),
            ("Category", facility.category.label().to_string()),
            ("Status", facility.status.label().to_string()),
        ];
        if let Some(pos) = position {
            rows.push(("Position", format!("{:.1}% × {:.1}%", pos.x, pos.y)));
        }

        TableBuilder::new(ui)
            .striped(true)
            .column(Column::exact(120.0))
            .column(Column::remainder())
            .body(|mut body| {
                for (key, value) in rows {
                    body.row(ROW_HEIGHT, |mut row| {
                        row.col(|ui| {
                            ui.strong(key);
                        });
                        row.col(|ui| {
                            if key == "Category" {
                                ui.colored_label(colors::category_fill(facility.category), value);
                            } else if key == "Status" {
                                ui.colored_label(colors::status_stroke(facility.status), value);
                            } else {
                                ui.label(value);
                            }
                        });
                    });
                }
            });
    }
}
