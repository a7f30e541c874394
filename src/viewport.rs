//! Zoom and pan state for the map viewport, expressed as a reducer.
//!
//! All coordinates here are relative to the viewport's top-left corner.
//! `translate` is the offset of the scaled reference image inside the
//! viewport, so the rendered image rect is `translate + reference * scale`.

use crate::{NormalizedPos, ZoomSettings};
use eframe::egui::{Pos2, Rect, Vec2};
use std::fmt;
use std::time::{Duration, Instant};

/// How long after the last wheel event the view counts as actively zooming.
pub const ZOOM_SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Viewport zoom/pan state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub scale: f32,
    pub translate: Vec2,
    /// Mirror of the window's fullscreen state
    pub fullscreen: bool,
    settle_at: Option<Instant>,
}

/// User interactions that change the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewAction {
    /// Stepper button or keyboard zoom in, anchored at the viewport centre
    ZoomIn { viewport: Vec2 },
    /// Stepper button or keyboard zoom out, anchored at the viewport centre
    ZoomOut { viewport: Vec2 },
    /// One wheel event; `delta` is in scale units, `anchor` in viewport coordinates
    Wheel {
        delta: f32,
        anchor: Pos2,
        at: Instant,
    },
    /// Absolute scale from the slider, anchored at the viewport centre
    SetScale { scale: f32, viewport: Vec2 },
    Pan(Vec2),
    /// Centre the viewport on a marker, optionally changing scale
    FocusOn {
        target: NormalizedPos,
        scale: Option<f32>,
        reference_size: Vec2,
        viewport: Vec2,
    },
    /// Restore the default scale and centre the image
    Reset { reference_size: Vec2, viewport: Vec2 },
    /// Frame clock, used to settle the wheel debounce
    Tick(Instant),
    FullscreenChanged(bool),
}

impl ViewState {
    /// Initial state: default scale with the image centred in the viewport.
    pub fn new(zoom: &ZoomSettings, reference_size: Vec2, viewport: Vec2) -> Self {
        Self {
            scale: zoom.default,
            translate: centred_offset(reference_size * zoom.default, viewport),
            fullscreen: false,
            settle_at: None,
        }
    }

    /// True while wheel events are arriving faster than the settle delay.
    pub fn is_zooming(&self) -> bool {
        self.settle_at.is_some()
    }

    pub fn transform(&self) -> ViewTransform {
        ViewTransform {
            translate: self.translate,
            scale: self.scale,
        }
    }

    /// Applies one action and returns the next state.
    pub fn reduce(self, zoom: &ZoomSettings, action: ViewAction) -> Self {
        match action {
            ViewAction::ZoomIn { viewport } => {
                self.zoom_about(zoom, viewport * 0.5, self.scale + zoom.step)
            }
            ViewAction::ZoomOut { viewport } => {
                self.zoom_about(zoom, viewport * 0.5, self.scale - zoom.step)
            }
            ViewAction::SetScale { scale, viewport } => {
                self.zoom_about(zoom, viewport * 0.5, scale)
            }
            ViewAction::Wheel { delta, anchor, at } => Self {
                settle_at: Some(at + ZOOM_SETTLE_DELAY),
                ..self.zoom_about(zoom, anchor.to_vec2(), self.scale + delta)
            },
            ViewAction::Pan(delta) => Self {
                translate: self.translate + delta,
                ..self
            },
            ViewAction::FocusOn {
                target,
                scale,
                reference_size,
                viewport,
            } => {
                let scale = zoom.clamp(scale.unwrap_or(self.scale));
                let target_px = Vec2::new(
                    reference_size.x * target.x / 100.0,
                    reference_size.y * target.y / 100.0,
                );
                Self {
                    scale,
                    translate: viewport * 0.5 - target_px * scale,
                    ..self
                }
            }
            ViewAction::Reset {
                reference_size,
                viewport,
            } => Self {
                fullscreen: self.fullscreen,
                ..Self::new(zoom, reference_size, viewport)
            },
            ViewAction::Tick(now) => match self.settle_at {
                Some(deadline) if now >= deadline => Self {
                    settle_at: None,
                    ..self
                },
                _ => self,
            },
            ViewAction::FullscreenChanged(fullscreen) => Self { fullscreen, ..self },
        }
    }

    /// Sets a clamped scale, keeping the content under `anchor` fixed.
    fn zoom_about(self, zoom: &ZoomSettings, anchor: Vec2, scale: f32) -> Self {
        let scale = zoom.clamp(scale);
        let ratio = scale / self.scale;
        Self {
            scale,
            translate: anchor - (anchor - self.translate) * ratio,
            ..self
        }
    }
}

/// Offset that centres content of `content` size inside `viewport`.
pub fn centred_offset(content: Vec2, viewport: Vec2) -> Vec2 {
    (viewport - content) * 0.5
}

/// Translate + scale pair derived from [`ViewState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl ViewTransform {
    /// Rendered rect of the reference image inside `viewport_rect`.
    pub fn image_rect(&self, viewport_rect: Rect, reference_size: Vec2) -> Rect {
        Rect::from_min_size(
            viewport_rect.min + self.translate,
            reference_size * self.scale,
        )
    }

    pub fn lerp(&self, other: &ViewTransform, t: f32) -> ViewTransform {
        ViewTransform {
            translate: self.translate + (other.translate - self.translate) * t,
            scale: self.scale + (other.scale - self.scale) * t,
        }
    }
}

impl fmt::Display for ViewTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate({:.1}px, {:.1}px) scale({:.3})",
            self.translate.x, self.translate.y, self.scale
        )
    }
}

/// Timing curve used when the displayed transform follows the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Short linear curve while wheel events are streaming in
    Fast,
    /// Material-style ease for discrete changes
    Smooth,
}

impl Transition {
    pub fn for_state(state: &ViewState) -> Self {
        if state.is_zooming() {
            Transition::Fast
        } else {
            Transition::Smooth
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            Transition::Fast => Duration::from_millis(100),
            Transition::Smooth => Duration::from_millis(300),
        }
    }

    /// Maps linear progress `t` in [0, 1] to eased progress.
    pub fn ease(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Transition::Fast => t,
            Transition::Smooth => cubic_bezier(0.4, 0.0, 0.2, 1.0, t),
        }
    }
}

/// Evaluates a CSS cubic-bezier timing function at progress `x`.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    fn component(p1: f32, p2: f32, s: f32) -> f32 {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
    }

    // x(s) is monotonic for control points in [0, 1]; bisect for s.
    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    for _ in 0..32 {
        let mid = (lo + hi) * 0.5;
        if component(x1, x2, mid) < x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    component(y1, y2, (lo + hi) * 0.5)
}

/// Eases the displayed transform toward the latest target.
#[derive(Debug, Clone, Copy)]
pub struct TransformAnimation {
    from: ViewTransform,
    to: ViewTransform,
    start: Instant,
    transition: Transition,
}

impl TransformAnimation {
    pub fn new(initial: ViewTransform, now: Instant) -> Self {
        Self {
            from: initial,
            to: initial,
            start: now,
            transition: Transition::Smooth,
        }
    }

    /// Starts easing from the current sample toward `target`.
    pub fn retarget(&mut self, target: ViewTransform, transition: Transition, now: Instant) {
        if target == self.to {
            return;
        }
        self.from = self.sample(now);
        self.to = target;
        self.start = now;
        self.transition = transition;
    }

    /// Jumps to `target` without easing (used while dragging).
    pub fn snap(&mut self, target: ViewTransform, now: Instant) {
        self.from = target;
        self.to = target;
        self.start = now;
    }

    pub fn sample(&self, now: Instant) -> ViewTransform {
        let duration = self.transition.duration().as_secs_f32();
        let elapsed = now.saturating_duration_since(self.start).as_secs_f32();
        let progress = elapsed / duration;
        if progress >= 1.0 {
            return self.to;
        }
        self.from.lerp(&self.to, self.transition.ease(progress))
    }

    pub fn is_running(&self, now: Instant) -> bool {
        self.from != self.to && now.saturating_duration_since(self.start) < self.transition.duration()
    }
}
