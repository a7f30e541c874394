//! UI rendering methods for the site map application.

use crate::SiteMapApp;
use crate::assets::AssetLoadState;
use crate::colors;
use crate::constants::{HIT_RADIUS, SIDEBAR_WIDTH};
use crate::overlays::{MarkerLayer, draw_markers};
use crate::reference_size;
use eframe::egui;
use site_map::events::SiteEvent;
use site_map::feed::DataSource;
use site_map::focus::FocusAction;
use site_map::projection::ImageLayout;
use site_map::viewport::ViewAction;
use site_map::{FacilityCategory, SiteMap};
use std::time::Instant;

impl SiteMapApp {
    /// Handles keyboard shortcuts for zoom, fullscreen and overlay toggles.
    pub fn handle_keyboard_input(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }

        let (zoom_in, zoom_out, reset, fullscreen, labels, escape) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals),
                i.key_pressed(egui::Key::Minus),
                i.key_pressed(egui::Key::Num0),
                i.key_pressed(egui::Key::F) || i.key_pressed(egui::Key::F11),
                i.key_pressed(egui::Key::L),
                i.key_pressed(egui::Key::Escape),
            )
        });

        if let Some(viewport) = self.viewport_size {
            if zoom_in {
                self.dispatch(ViewAction::ZoomIn { viewport });
            }
            if zoom_out {
                self.dispatch(ViewAction::ZoomOut { viewport });
            }
        }
        if reset {
            self.reset_view();
        }
        if fullscreen {
            self.toggle_fullscreen(ctx);
        }
        if labels {
            self.settings.overlays.labels = !self.settings.overlays.labels;
        }
        if escape {
            if self.route.is_some() {
                self.route = None;
            } else {
                self.focus.apply(FocusAction::ClearSelection);
            }
        }
    }

    /// Renders the bottom status bar with controls hint, pointer readout and data source.
    pub fn show_status_bar(&self, ctx: &egui::Context, selected_site: Option<&SiteMap>) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Scroll: Zoom | Drag: Pan | +/-: Zoom | 0: Reset | F: Fullscreen | L: Labels");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    match self.data_source {
                        DataSource::Live => {
                            ui.colored_label(egui::Color32::LIGHT_GREEN, "Live data");
                        }
                        DataSource::Demo => {
                            let label = ui.colored_label(egui::Color32::GRAY, "Demo data");
                            if let Some(err) = &self.feed_error {
                                label.on_hover_text(err);
                            }
                        }
                    }
                    ui.separator();
                    ui.label(format!("{:.0}%", self.view.scale * 100.0));
                    if let Some(pos) = self.pointer_pos.filter(|pos| pos.is_within_image())
                        && selected_site.is_some()
                    {
                        ui.separator();
                        ui.monospace(format!("x {:5.1}%  y {:5.1}%", pos.x, pos.y));
                    }
                });
            });
        });
    }

    /// Renders the left sidebar panel.
    pub fn show_sidebar(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("sidebar")
            .exact_width(SIDEBAR_WIDTH)
            .resizable(false)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.show_sidebar_content(ui);
                });
            });
    }

    /// Renders the sidebar content: site selector, overlay toggles, directory and settings.
    fn show_sidebar_content(&mut self, ui: &mut egui::Ui) {
        ui.add_space(4.0);

        // Sites section
        ui.strong("Sites");
        ui.separator();

        if self.sites.is_empty() {
            ui.label("No sites loaded");
        } else {
            let mut clicked = None;
            for (idx, site) in self.sites.iter().enumerate() {
                if ui
                    .selectable_label(self.selected_site == idx, &site.name.en)
                    .clicked()
                {
                    clicked = Some(idx);
                }
            }
            if let Some(idx) = clicked {
                self.select_site(idx);
            }
        }

        ui.add_space(12.0);

        // Overlays section
        ui.strong("Overlays");
        ui.separator();

        Self::overlay_toggle(
            ui,
            &mut self.settings.overlays.labels,
            "Labels",
            egui::Color32::WHITE,
        );
        for category in FacilityCategory::ALL {
            Self::overlay_toggle(
                ui,
                self.settings.overlays.category_mut(category),
                category.label(),
                colors::category_fill(category),
            );
        }

        ui.add_space(12.0);

        self.show_directory(ui);

        ui.add_space(12.0);

        ui.collapsing("Settings", |ui| {
            ui.label("Live feed URL");
            let feed_changed = ui
                .text_edit_singleline(&mut self.settings.feed_url)
                .lost_focus();
            let current = self.feed.as_ref().map(|feed| feed.url().to_string());
            if feed_changed && current.as_deref() != self.settings.feed_url() {
                self.restart_feed(ui.ctx());
            }
            ui.label("Dashboard base URL");
            ui.text_edit_singleline(&mut self.settings.detail_base_url);
        });
    }

    /// Renders the facility directory for the selected site.
    ///
    /// Hovering a row publishes `ProjectHover`; clicking publishes `ZoomToMarker`.
    fn show_directory(&mut self, ui: &mut egui::Ui) {
        ui.strong("Facilities");
        ui.separator();

        let Some(site) = self.selected_site().cloned() else {
            return;
        };
        let mut hovered_row = None;
        let mut zoom_to = None;
        let mut open = None;

        for facility in site
            .markers
            .iter()
            .filter(|facility| self.settings.overlays.shows(facility))
        {
            let highlighted = self.directory_highlight.as_deref() == Some(facility.id.as_str())
                || self.focus.selected() == Some(facility.id.as_str());

            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                ui.painter()
                    .circle_filled(rect.center(), 4.5, colors::category_fill(facility.category));

                let response = ui
                    .selectable_label(highlighted, &facility.name.en)
                    .on_hover_text(facility.status.label());
                if response.hovered() {
                    hovered_row = Some(facility.id.clone());
                }
                if response.clicked() {
                    zoom_to = Some(facility.id.clone());
                }
                if response.double_clicked() {
                    open = Some(facility.id.clone());
                }
                if highlighted && self.directory_highlight.as_deref() == Some(facility.id.as_str()) {
                    response.scroll_to_me(None);
                }
            });
        }

        if hovered_row != self.directory_hovered {
            self.bus.publish(SiteEvent::ProjectHover(hovered_row.clone()));
            self.directory_hovered = hovered_row;
        }
        if let Some(id) = zoom_to {
            self.bus.publish(SiteEvent::ZoomToMarker(id));
        }
        if let Some(id) = open {
            self.open_facility(&id);
        }
    }

    /// Renders a circle-style overlay toggle.
    fn overlay_toggle(ui: &mut egui::Ui, value: &mut bool, label: &str, color: egui::Color32) {
        ui.horizontal(|ui| {
            ui.checkbox(value, "");
            let (rect, icon_response) =
                ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::click());
            let center = rect.center();
            ui.painter().circle_filled(center, 5.0, color);
            ui.painter()
                .circle_stroke(center, 5.0, egui::Stroke::new(1.0, egui::Color32::GRAY));
            let label_response = ui
                .label(label)
                .interact(egui::Sense::click())
                .on_hover_cursor(egui::CursorIcon::PointingHand);
            if icon_response.clicked() || label_response.clicked() {
                *value = !*value;
            }
        });
    }

    /// Renders the central panel: the detail page when a route is open, the map otherwise.
    pub fn show_central_panel(&mut self, ctx: &egui::Context, selected_site: Option<SiteMap>) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(route) = self.route.clone() {
                self.leave_map();
                self.show_detail_page(ui, &route);
                return;
            }

            let Some(site) = selected_site else {
                self.leave_map();
                ui.centered_and_justified(|ui| {
                    ui.label("No site data.\nRun `cargo run --bin import_sites` to generate assets.");
                });
                return;
            };

            let panel_rect = ui.max_rect();
            self.show_map(ui, &site);
            self.show_zoom_controls(ctx, panel_rect, &site);
        });
    }

    /// Renders the floating zoom controls panel.
    fn show_zoom_controls(&mut self, ctx: &egui::Context, panel_rect: egui::Rect, site: &SiteMap) {
        let Some(viewport) = self.viewport_size else {
            return;
        };

        let margin = 12.0;
        let panel_width = 250.0;
        let panel_height = 36.0;

        let anchor_pos = egui::pos2(
            panel_rect.right() - panel_width - margin,
            panel_rect.bottom() - panel_height - margin,
        );

        egui::Area::new(egui::Id::new("zoom_controls"))
            .fixed_pos(anchor_pos)
            .interactable(true)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(ui.style().visuals.window_fill.gamma_multiply(0.95))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            if ui.button("−").on_hover_text("Zoom out (-)").clicked() {
                                self.dispatch(ViewAction::ZoomOut { viewport });
                            }

                            let mut scale = self.view.scale;
                            let slider = ui.add(
                                egui::Slider::new(&mut scale, site.zoom.min..=site.zoom.max)
                                    .logarithmic(true)
                                    .show_value(false),
                            );
                            if slider.changed() {
                                self.dispatch(ViewAction::SetScale { scale, viewport });
                            }

                            if ui.button("+").on_hover_text("Zoom in (+)").clicked() {
                                self.dispatch(ViewAction::ZoomIn { viewport });
                            }
                            if ui.button("Reset").on_hover_text("Reset view (0)").clicked() {
                                self.reset_view();
                            }
                            let icon = if self.view.fullscreen { "🗗" } else { "⛶" };
                            if ui.button(icon).on_hover_text("Fullscreen (F)").clicked() {
                                self.toggle_fullscreen(ctx);
                            }
                        });
                    });
            });
    }

    /// Renders the map image and facility markers.
    fn show_map(&mut self, ui: &mut egui::Ui, site: &SiteMap) {
        let image_path = &site.image_path;

        // Check loading state - errors are shown via toasts
        match self.asset_cache.get(image_path) {
            Some(AssetLoadState::Loading(_)) | None => {
                self.projector.invalidate();
                self.leave_map();
                ui.centered_and_justified(|ui| ui.spinner());
                return;
            }
            Some(AssetLoadState::Error(msg)) => {
                let msg = msg.clone();
                self.projector.invalidate();
                self.leave_map();
                ui.centered_and_justified(|ui| {
                    ui.label(format!("Failed to load map: {msg}"));
                });
                return;
            }
            Some(AssetLoadState::Ready(_)) => {}
        }

        let Some(texture_id) = self.get_texture(image_path).map(|texture| texture.id()) else {
            self.projector.invalidate();
            self.leave_map();
            ui.label("Failed to create texture");
            return;
        };

        let (viewport_rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        self.viewport_size = Some(viewport_rect.size());

        // The site passed in can lag one frame behind a sidebar switch; only
        // the site the reset was requested for may consume it.
        if self.pending_reset.as_deref() == Some(site.key.as_str()) {
            self.pending_reset = None;
            let view = self.view.reduce(
                &site.zoom,
                ViewAction::Reset {
                    reference_size: reference_size(site),
                    viewport: viewport_rect.size(),
                },
            );
            self.view = view;
            self.animation.snap(view.transform(), Instant::now());
        }

        self.handle_scroll_zoom(ui, viewport_rect, site);

        // Handle drag panning
        if response.dragged() {
            self.dispatch(ViewAction::Pan(response.drag_delta()));
        }

        let shown = self.animation.sample(Instant::now());
        let map_rect = shown.image_rect(viewport_rect, reference_size(site));
        self.projector.update(ImageLayout::new(map_rect, viewport_rect));

        ui.set_clip_rect(viewport_rect);

        // Draw map image
        ui.painter().image(
            texture_id,
            map_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        self.update_map_hover(&response, viewport_rect, site);

        draw_markers(
            ui.painter(),
            viewport_rect,
            &MarkerLayer {
                site,
                projector: &self.projector,
                focus: &self.focus,
                overlays: self.settings.overlays,
                scale: shown.scale,
            },
        );
    }

    /// Hit-tests the pointer against markers, publishing hover changes and handling clicks.
    fn update_map_hover(&mut self, response: &egui::Response, viewport_rect: egui::Rect, site: &SiteMap) {
        let pointer = response
            .hover_pos()
            .map(|pos| (pos - viewport_rect.min).to_pos2());
        self.pointer_pos = pointer.and_then(|offset| self.projector.unproject(offset));

        let overlays = self.settings.overlays;
        let hit = pointer.and_then(|offset| {
            self.projector
                .hit_test(site, offset, HIT_RADIUS, |facility| overlays.shows(facility))
                .map(|facility| facility.id.clone())
        });

        let on_map = pointer.is_some();
        if on_map || self.pointer_on_map {
            let previous = std::mem::replace(&mut self.map_hovered, hit.clone());
            let changed = match (hit.clone(), previous) {
                (Some(id), _) => self.focus.apply(FocusAction::Hover(id)),
                (None, Some(left)) => self.focus.apply(FocusAction::Unhover(left)),
                (None, None) => false,
            };
            if changed {
                self.bus
                    .publish(SiteEvent::MarkerHovered(self.focus.hovered().map(str::to_string)));
            }
        }
        self.pointer_on_map = on_map;

        if hit.is_some() {
            response.ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        if response.clicked()
            && let Some(id) = hit
        {
            self.open_facility(&id);
        }
    }

    /// Handles scroll wheel zoom, zooming towards the mouse position.
    fn handle_scroll_zoom(&mut self, ui: &mut egui::Ui, viewport_rect: egui::Rect, site: &SiteMap) {
        let hover_pos = ui.input(|i| i.pointer.hover_pos());
        let scroll_delta = ui.input(|i| i.raw_scroll_delta.y);

        if scroll_delta == 0.0 {
            return;
        }
        let Some(hover) = hover_pos.filter(|p| viewport_rect.contains(*p)) else {
            return;
        };

        let delta = site.zoom.wheel_step * scroll_delta.signum();
        self.dispatch(ViewAction::Wheel {
            delta,
            anchor: (hover - viewport_rect.min).to_pos2(),
            at: Instant::now(),
        });
    }

    /// Forgets pointer state while the map is not drawn, so directory hover
    /// applies and a later return to the map starts clean.
    fn leave_map(&mut self) {
        self.pointer_on_map = false;
        self.pointer_pos = None;
        if let Some(left) = self.map_hovered.take()
            && self.focus.apply(FocusAction::Unhover(left))
        {
            self.bus.publish(SiteEvent::MarkerHovered(None));
        }
    }
}
