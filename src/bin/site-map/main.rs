#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod assets;
mod colors;
mod constants;
mod detail;
mod feed;
mod overlays;
mod settings;
mod ui;

use assets::{AssetLoadState, load_and_decode_image, load_embedded_sites, load_sites};
use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use feed::{FeedPoller, FeedUpdate};
use settings::Settings;
use site_map::events::{EventBus, SiteEvent, Subscription};
use site_map::feed::{DataSource, merge_feed};
use site_map::focus::{FocusAction, MarkerFocus};
use site_map::projection::MarkerProjector;
use site_map::route::DetailRoute;
use site_map::viewport::{Transition, TransformAnimation, ViewAction, ViewState, ZOOM_SETTLE_DELAY};
use site_map::{FacilityId, NormalizedPos, SiteMap, SiteMaps};
use std::collections::HashMap;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Instant;

/// Main application state for the site map dashboard.
pub struct SiteMapApp {
    /// Sites currently displayed (demo data, possibly merged with the feed)
    sites: SiteMaps,
    /// Sites as loaded from assets; the fallback whenever the feed fails
    demo_sites: SiteMaps,
    data_source: DataSource,
    selected_site: usize,
    view: ViewState,
    animation: TransformAnimation,
    /// Size of the map viewport in the last frame
    viewport_size: Option<egui::Vec2>,
    /// Key of the site to recentre once its viewport size is known
    pending_reset: Option<String>,
    projector: MarkerProjector,
    focus: MarkerFocus,
    /// Whether the pointer was over the map in the previous frame
    pointer_on_map: bool,
    /// Marker under the map pointer in the previous frame
    map_hovered: Option<FacilityId>,
    /// Pointer position over the map image, for the status bar readout
    pointer_pos: Option<NormalizedPos>,
    bus: EventBus,
    map_events: Subscription,
    directory_events: Subscription,
    /// Directory row mirrored from map hover
    directory_highlight: Option<FacilityId>,
    /// Directory row under the pointer in the previous frame
    directory_hovered: Option<FacilityId>,
    route: Option<DetailRoute>,
    settings: Settings,
    asset_cache: HashMap<String, AssetLoadState>,
    texture_cache: HashMap<String, TextureHandle>,
    toasts: Toasts,
    feed: Option<FeedPoller>,
    /// Last feed failure, cleared by the next successful fetch
    feed_error: Option<String>,
}

impl SiteMapApp {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut toasts = Toasts::new()
            .anchor(egui::Align2::RIGHT_TOP, (-10.0, 10.0))
            .direction(egui::Direction::TopDown);

        let settings = Settings::load(cc.storage);

        let sites = match load_sites() {
            Ok(sites) => sites,
            Err(err) => {
                toasts.add(Toast {
                    kind: ToastKind::Error,
                    text: err.to_string().into(),
                    options: ToastOptions::default()
                        .duration_in_seconds(10.0)
                        .show_icon(true),
                    ..Default::default()
                });
                load_embedded_sites().unwrap_or_else(|err| {
                    log::error!("Embedded site data unusable: {err}");
                    Vec::new()
                })
            }
        };

        let mut asset_cache = HashMap::new();

        // Preload all site images in background threads
        for site in &sites {
            if asset_cache.contains_key(&site.image_path) {
                continue;
            }
            let (tx, rx) = mpsc::channel();
            let ctx = cc.egui_ctx.clone();
            let asset_path = site.image_path.clone();

            thread::spawn(move || {
                let result = load_and_decode_image(&asset_path);
                let _ = tx.send(result);
                ctx.request_repaint();
            });

            asset_cache.insert(site.image_path.clone(), AssetLoadState::Loading(rx));
        }

        let selected_site = settings
            .selected_site
            .as_deref()
            .and_then(|key| sites.iter().position(|site| site.key == key))
            .unwrap_or(0);

        let feed = settings
            .feed_url()
            .map(|url| FeedPoller::spawn(url.to_string(), cc.egui_ctx.clone()));
        if feed.is_none() {
            log::info!("No marker feed configured - showing demo data");
        }

        let mut bus = EventBus::new();
        let map_events = bus.subscribe();
        let directory_events = bus.subscribe();

        let zoom = sites
            .get(selected_site)
            .map(|site| site.zoom)
            .unwrap_or_default();
        let view = ViewState::new(&zoom, egui::Vec2::ZERO, egui::Vec2::ZERO);

        let pending_reset = sites.get(selected_site).map(|site| site.key.clone());

        Self {
            demo_sites: sites.clone(),
            sites,
            data_source: DataSource::Demo,
            selected_site,
            view,
            animation: TransformAnimation::new(view.transform(), Instant::now()),
            viewport_size: None,
            pending_reset,
            projector: MarkerProjector::new(),
            focus: MarkerFocus::default(),
            pointer_on_map: false,
            map_hovered: None,
            pointer_pos: None,
            bus,
            map_events,
            directory_events,
            directory_highlight: None,
            directory_hovered: None,
            route: None,
            settings,
            asset_cache,
            texture_cache: HashMap::new(),
            toasts,
            feed,
            feed_error: None,
        }
    }

    fn selected_site(&self) -> Option<&SiteMap> {
        self.sites.get(self.selected_site)
    }

    /// Polls all loading assets and creates textures for ready ones.
    fn poll_all_assets(&mut self, ctx: &egui::Context) {
        let mut updates: Vec<(String, AssetLoadState)> = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        for (path, state) in &mut self.asset_cache {
            if let AssetLoadState::Loading(rx) = state {
                match rx.try_recv() {
                    Ok(Ok(decoded)) => {
                        log::debug!("Decoded {path} ({}x{})", decoded.width, decoded.height);
                        updates.push((path.clone(), AssetLoadState::Ready(decoded)));
                    }
                    Ok(Err(err)) => {
                        let msg = format!("{}: {}", path, err);
                        errors.push(msg.clone());
                        updates.push((path.clone(), AssetLoadState::Error(msg)));
                    }
                    Err(mpsc::TryRecvError::Disconnected) => {
                        let msg = format!("{}: channel disconnected", path);
                        errors.push(msg.clone());
                        updates.push((path.clone(), AssetLoadState::Error(msg)));
                    }
                    Err(mpsc::TryRecvError::Empty) => {}
                }
            }
        }

        for (path, new_state) in updates {
            self.asset_cache.insert(path, new_state);
        }

        // Show toasts for any errors that occurred
        for err in errors {
            log::error!("{err}");
            self.toasts.add(Toast {
                kind: ToastKind::Error,
                text: err.into(),
                options: ToastOptions::default()
                    .duration_in_seconds(8.0)
                    .show_icon(true),
                ..Default::default()
            });
        }

        // Create textures for ready assets
        let ready_paths: Vec<_> = self
            .asset_cache
            .iter()
            .filter(|(path, state)| {
                matches!(state, AssetLoadState::Ready(_)) && !self.texture_cache.contains_key(*path)
            })
            .map(|(path, _)| path.clone())
            .collect();

        for path in ready_paths {
            if let Some(AssetLoadState::Ready(decoded)) = self.asset_cache.get(&path) {
                let image = ColorImage::from_rgba_unmultiplied(
                    [decoded.width as usize, decoded.height as usize],
                    &decoded.pixels,
                );
                let texture = ctx.load_texture(&path, image, TextureOptions::LINEAR);
                self.texture_cache.insert(path, texture);
            }
        }
    }

    fn get_texture(&self, path: &str) -> Option<&TextureHandle> {
        self.texture_cache.get(path)
    }

    /// Runs a view action through the reducer and retargets the animation.
    fn dispatch(&mut self, action: ViewAction) {
        let Some(zoom) = self.selected_site().map(|site| site.zoom) else {
            return;
        };

        let next = self.view.reduce(&zoom, action);
        if next == self.view {
            return;
        }

        let now = Instant::now();
        if next.transform() != self.view.transform() {
            match action {
                ViewAction::Pan(_) => self.animation.snap(next.transform(), now),
                _ => self
                    .animation
                    .retarget(next.transform(), Transition::for_state(&next), now),
            }
            log::debug!("View transform: {}", next.transform());
        }
        self.view = next;
    }

    fn reset_view(&mut self) {
        let Some(site) = self.selected_site() else {
            return;
        };
        let Some(viewport) = self.viewport_size else {
            self.pending_reset = Some(site.key.clone());
            return;
        };
        let reference_size = reference_size(site);
        self.dispatch(ViewAction::Reset {
            reference_size,
            viewport,
        });
    }

    /// Switches to another site and schedules a recentre.
    fn select_site(&mut self, index: usize) {
        if index == self.selected_site {
            return;
        }
        self.selected_site = index;
        self.pending_reset = self.selected_site().map(|site| site.key.clone());
        self.projector.invalidate();
        self.focus = MarkerFocus::default();
        self.map_hovered = None;
        self.directory_highlight = None;
        self.route = None;
        if let Some(site) = self.selected_site() {
            log::info!("Selected site {}", site.key);
            self.settings.selected_site = Some(site.key.clone());
        }
    }

    fn toggle_fullscreen(&self, ctx: &egui::Context) {
        ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(!self.view.fullscreen));
    }

    /// Mirrors the window's real fullscreen state into the view.
    fn sync_fullscreen(&mut self, ctx: &egui::Context) {
        let fullscreen = ctx.input(|i| i.viewport().fullscreen.unwrap_or(false));
        if fullscreen != self.view.fullscreen {
            self.dispatch(ViewAction::FullscreenChanged(fullscreen));
        }
    }

    /// Navigates to the detail route of a facility on the current site.
    fn open_facility(&mut self, id: &str) {
        let Some(site) = self.selected_site() else {
            return;
        };
        let Some(facility) = site.facility(id) else {
            return;
        };
        let route = DetailRoute::for_facility(site, facility);
        log::info!("Navigating to {route}");
        self.focus.apply(FocusAction::Select(id.to_string()));
        self.route = Some(route);
    }

    /// Centres the map on a facility, zooming in past the site default.
    fn zoom_to_facility(&mut self, id: &str) {
        let Some(site) = self.selected_site() else {
            return;
        };
        let Some(facility) = site.facility(id) else {
            return;
        };
        let Some(viewport) = self.viewport_size else {
            return;
        };
        let action = ViewAction::FocusOn {
            target: site.normalized(facility),
            scale: Some(
                self.view
                    .scale
                    .max(site.zoom.default * constants::FOCUS_ZOOM_FACTOR),
            ),
            reference_size: reference_size(site),
            viewport,
        };
        self.focus.apply(FocusAction::Select(id.to_string()));
        self.route = None;
        self.dispatch(action);
    }

    /// Delivers pending bus events to the map and directory.
    fn pump_events(&mut self) {
        for event in self.map_events.latest() {
            match event {
                SiteEvent::ProjectHover(id) if !self.pointer_on_map => {
                    self.focus.hover(id.as_deref());
                }
                SiteEvent::ZoomToMarker(id) => self.zoom_to_facility(&id),
                _ => {}
            }
        }

        for event in self.directory_events.latest() {
            if let SiteEvent::MarkerHovered(id) = event {
                self.directory_highlight = id;
            }
        }
    }

    /// Applies the newest feed result, falling back to demo data on failure.
    fn poll_feed(&mut self) {
        let Some(update) = self.feed.as_ref().and_then(FeedPoller::poll) else {
            return;
        };

        let previous = self.data_source;
        match update {
            FeedUpdate::Payload(payload) => {
                let (merged, report) = merge_feed(&self.demo_sites, payload);
                for (site, reason) in &report.skipped {
                    log::warn!("Feed entry for '{site}' skipped: {reason}");
                }
                log::debug!("Feed updated sites: {:?}", report.updated);
                self.sites = merged;
                self.data_source = DataSource::Live;
                if previous != DataSource::Live {
                    self.toasts.add(Toast {
                        kind: ToastKind::Success,
                        text: "Live facility data connected".into(),
                        options: ToastOptions::default().duration_in_seconds(4.0),
                        ..Default::default()
                    });
                }
            }
            FeedUpdate::Failed(message) => {
                self.sites = self.demo_sites.clone();
                self.data_source = DataSource::Demo;
                if self.feed_error.is_none() {
                    self.toasts.add(Toast {
                        kind: ToastKind::Warning,
                        text: format!("Live data unavailable, showing demo data: {message}").into(),
                        options: ToastOptions::default()
                            .duration_in_seconds(8.0)
                            .show_icon(true),
                        ..Default::default()
                    });
                }
                self.feed_error = Some(message);
                return;
            }
        }
        self.feed_error = None;
    }

    /// (Re)starts the feed poller after the URL setting changed.
    fn restart_feed(&mut self, ctx: &egui::Context) {
        self.feed = self
            .settings
            .feed_url()
            .map(|url| FeedPoller::spawn(url.to_string(), ctx.clone()));
        self.feed_error = None;
        if self.feed.is_none() {
            self.sites = self.demo_sites.clone();
            self.data_source = DataSource::Demo;
        }
    }
}

fn reference_size(site: &SiteMap) -> egui::Vec2 {
    egui::vec2(site.reference_size[0] as f32, site.reference_size[1] as f32)
}

impl eframe::App for SiteMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_all_assets(ctx);
        self.poll_feed();
        self.sync_fullscreen(ctx);
        self.pump_events();
        self.handle_keyboard_input(ctx);

        let now = Instant::now();
        self.dispatch(ViewAction::Tick(now));

        self.show_status_bar(ctx, self.selected_site());
        self.show_sidebar(ctx);

        // After the sidebar, which may switch sites
        let selected_site = self.selected_site().cloned();
        self.show_central_panel(ctx, selected_site);

        if self.animation.is_running(now) {
            ctx.request_repaint();
        } else if self.view.is_zooming() {
            ctx.request_repaint_after(ZOOM_SETTLE_DELAY);
        }

        // Show toasts
        self.toasts.show(ctx);
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.settings);
    }
}

fn load_icon() -> Option<egui::IconData> {
    let icon_bytes = include_bytes!("../../../assets/site-map-icon.ico");
    let icon_dir = ico::IconDir::read(std::io::Cursor::new(icon_bytes))
        .inspect_err(|err| log::warn!("Failed to read icon: {err}"))
        .ok()?;
    let entry = icon_dir.entries().iter().max_by_key(|entry| entry.width())?;
    let image = entry
        .decode()
        .inspect_err(|err| log::warn!("Failed to decode icon: {err}"))
        .ok()?;
    Some(egui::IconData {
        rgba: image.rgba_data().to_vec(),
        width: image.width(),
        height: image.height(),
    })
}

fn main() -> eframe::Result {
    env_logger::init();

    let mut viewport = egui::ViewportBuilder::default().with_inner_size([1280.0, 720.0]);
    if let Some(icon) = load_icon() {
        viewport = viewport.with_icon(Arc::new(icon));
    }

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Site Map",
        options,
        Box::new(|cc| Ok(Box::new(SiteMapApp::new(cc)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::App as _;
    use std::time::Duration;

    fn frame_input() -> egui::RawInput {
        egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(1280.0, 720.0),
            )),
            ..Default::default()
        }
    }

    fn test_app(ctx: &egui::Context) -> SiteMapApp {
        let cc = eframe::CreationContext::_new_kittest(ctx.clone());
        let mut app = SiteMapApp::new(&cc);
        app.feed = None;
        app
    }

    fn run_frame(app: &mut SiteMapApp, ctx: &egui::Context) {
        let mut frame = eframe::Frame::_new_kittest();
        let _ = ctx.run(frame_input(), |ctx| app.update(ctx, &mut frame));
    }

    fn site_index(app: &SiteMapApp, key: &str) -> usize {
        app.sites
            .iter()
            .position(|site| site.key == key)
            .unwrap_or_else(|| panic!("missing site {key}"))
    }

    fn wait_for_textures(app: &mut SiteMapApp, ctx: &egui::Context) {
        for _ in 0..500 {
            run_frame(app, ctx);
            if app
                .sites
                .iter()
                .all(|site| app.texture_cache.contains_key(&site.image_path))
            {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("site rasters did not load");
    }

    #[test]
    fn sidebar_switch_recentres_the_newly_selected_site() {
        let ctx = egui::Context::default();
        let mut app = test_app(&ctx);
        let abu_dhabi = site_index(&app, "abu-dhabi");
        let al_ain = site_index(&app, "al-ain");

        app.select_site(abu_dhabi);
        wait_for_textures(&mut app, &ctx);
        assert_eq!(app.view.scale, 0.4);

        // A sidebar click lands while the central panel still holds the old site
        let _ = ctx.run(frame_input(), |ctx| {
            let stale = app.selected_site().cloned();
            app.select_site(al_ain);
            app.show_central_panel(ctx, stale);
        });

        for _ in 0..5 {
            run_frame(&mut app, &ctx);
        }

        let zoom = app.sites[al_ain].zoom;
        assert_eq!(app.view.scale, 0.6);
        assert!((zoom.min..=zoom.max).contains(&app.view.scale));
        assert_eq!(app.pending_reset, None);
    }

    #[test]
    fn directory_hover_applies_while_detail_page_is_open() {
        let ctx = egui::Context::default();
        let mut app = test_app(&ctx);
        let site = app.selected_site().cloned().expect("embedded sites");
        let facility = site.markers[0].clone();

        app.pointer_on_map = true;
        app.route = Some(DetailRoute::for_facility(&site, &facility));
        run_frame(&mut app, &ctx);
        assert!(!app.pointer_on_map);
        assert_eq!(app.pointer_pos, None);

        app.bus
            .publish(SiteEvent::ProjectHover(Some(facility.id.clone())));
        app.pump_events();
        assert_eq!(app.focus.hovered(), Some(facility.id.as_str()));
    }

    #[test]
    fn leaving_the_map_clears_its_hover() {
        let ctx = egui::Context::default();
        let mut app = test_app(&ctx);
        let site = app.selected_site().cloned().expect("embedded sites");
        let facility = site.markers[0].clone();

        app.pointer_on_map = true;
        app.map_hovered = Some(facility.id.clone());
        app.focus.apply(FocusAction::Hover(facility.id.clone()));
        app.route = Some(DetailRoute::for_facility(&site, &facility));
        run_frame(&mut app, &ctx);

        assert_eq!(app.map_hovered, None);
        assert_eq!(app.focus.hovered(), None);
    }
}
