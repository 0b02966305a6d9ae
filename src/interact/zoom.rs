//! Viewport zoom and pan.

use super::anim::{Lerp, Tween};
use crate::measure::Bounds;

/// Screen = content * k + (x, y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn new(k: f64, x: f64, y: f64) -> Self {
        Self { k, x, y }
    }

    pub fn apply(&self, (cx, cy): (f64, f64)) -> (f64, f64) {
        (cx * self.k + self.x, cy * self.k + self.y)
    }

    pub fn invert(&self, (sx, sy): (f64, f64)) -> (f64, f64) {
        ((sx - self.x) / self.k, (sy - self.y) / self.k)
    }

    /// SVG `transform` attribute value.
    pub fn to_svg(&self) -> String {
        format!("translate({},{}) scale({})", self.x, self.y, self.k)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Lerp for Transform {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Transform::new(
            self.k.lerp(&to.k, t),
            self.x.lerp(&to.x, t),
            self.y.lerp(&to.y, t),
        )
    }
}

/// How the host measured a wheel delta (`WheelEvent.deltaMode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelMode {
    Pixel,
    Line,
    Page,
}

impl WheelMode {
    pub fn from_dom(mode: u32) -> Self {
        match mode {
            1 => WheelMode::Line,
            2 => WheelMode::Page,
            _ => WheelMode::Pixel,
        }
    }

    fn factor(self) -> f64 {
        match self {
            WheelMode::Pixel => 0.002,
            WheelMode::Line => 0.05,
            WheelMode::Page => 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ZoomConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub step: f64,
    pub button_ms: f64,
    pub pan_ms: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.2,
            max_scale: 3.0,
            step: 1.2,
            button_ms: 200.0,
            pan_ms: 450.0,
        }
    }
}

/// Current transform of the canvas plus an optional running transition.
#[derive(Debug, Clone)]
pub struct ZoomController {
    config: ZoomConfig,
    transform: Transform,
    viewport: (f64, f64),
    anim: Option<Tween<Transform>>,
}

impl ZoomController {
    pub fn new(config: ZoomConfig, width: f64, height: f64) -> Self {
        Self {
            config,
            transform: Transform::IDENTITY,
            viewport: (width.max(1.0), height.max(1.0)),
            anim: None,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = (width.max(1.0), height.max(1.0));
    }

    pub fn is_animating(&self) -> bool {
        self.anim.is_some()
    }

    fn clamp_scale(&self, k: f64) -> f64 {
        k.clamp(self.config.min_scale, self.config.max_scale)
    }

    /// Jump to `t` (scale clamped), cancelling any transition.
    pub fn set_transform(&mut self, t: Transform) {
        self.anim = None;
        self.transform = Transform::new(self.clamp_scale(t.k), t.x, t.y);
    }

    fn transition_to(&mut self, t: Transform, now: f64, duration: f64) {
        let target = Transform::new(self.clamp_scale(t.k), t.x, t.y);
        self.anim = Some(Tween::new(self.transform, target, now, duration));
    }

    /// Transform scaled to `k` keeping screen point `p` fixed.
    fn scaled_about(&self, k: f64, p: (f64, f64)) -> Transform {
        let k = self.clamp_scale(k);
        let (cx, cy) = self.transform.invert(p);
        Transform::new(k, p.0 - cx * k, p.1 - cy * k)
    }

    /// Wheel zoom about the pointer, applied immediately.
    pub fn wheel(&mut self, delta_y: f64, mode: WheelMode, ctrl: bool, px: f64, py: f64) {
        let boost = if ctrl { 10.0 } else { 1.0 };
        let k = self.transform.k * 2f64.powf(-delta_y * mode.factor() * boost);
        let t = self.scaled_about(k, (px, py));
        self.set_transform(t);
    }

    /// Animated zoom about the viewport center.
    pub fn zoom_by(&mut self, factor: f64, now: f64) {
        let center = (self.viewport.0 / 2.0, self.viewport.1 / 2.0);
        let t = self.scaled_about(self.transform.k * factor, center);
        self.transition_to(t, now, self.config.button_ms);
    }

    pub fn zoom_in(&mut self, now: f64) {
        self.zoom_by(self.config.step, now);
    }

    pub fn zoom_out(&mut self, now: f64) {
        self.zoom_by(1.0 / self.config.step, now);
    }

    pub fn reset(&mut self) {
        self.set_transform(Transform::IDENTITY);
    }

    /// Translate by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let t = self.transform;
        self.set_transform(Transform::new(t.k, t.x + dx, t.y + dy));
    }

    /// Scale and center `bounds` inside the viewport minus `padding` on every
    /// side and `reserved_bottom` below.
    pub fn fit_to_bounds(&mut self, bounds: &Bounds, padding: f64, reserved_bottom: f64) {
        let (vw, vh) = self.viewport;
        let content_w = bounds.width().max(1.0);
        let content_h = bounds.height().max(1.0);
        let view_w = (vw - padding * 2.0).max(1.0);
        let view_h = (vh - padding * 2.0 - reserved_bottom).max(1.0);

        let k = self.clamp_scale((view_w / content_w).min(view_h / content_h));
        let x = (vw - content_w * k) / 2.0 - bounds.min_x * k;
        let y = ((vh - reserved_bottom) - content_h * k) / 2.0 - bounds.min_y * k;
        self.set_transform(Transform::new(k, x, y));
    }

    /// Put content point `(x, y)` at the viewport center, at `scale` or the
    /// current scale.
    pub fn pan_to_point(&mut self, x: f64, y: f64, scale: Option<f64>, animate: Option<(f64, f64)>) {
        let k = self.clamp_scale(scale.unwrap_or(self.transform.k));
        let t = Transform::new(k, self.viewport.0 / 2.0 - x * k, self.viewport.1 / 2.0 - y * k);
        match animate {
            Some((now, duration)) => self.transition_to(t, now, duration),
            None => self.set_transform(t),
        }
    }

    /// Animated pan using the configured pan duration.
    pub fn pan_to(&mut self, x: f64, y: f64, now: f64) {
        let duration = self.config.pan_ms;
        self.pan_to_point(x, y, None, Some((now, duration)));
    }

    /// Content point under the viewport center.
    pub fn current_center(&self) -> (f64, f64) {
        self.transform
            .invert((self.viewport.0 / 2.0, self.viewport.1 / 2.0))
    }

    /// Advance a running transition. Returns true when the transform changed.
    pub fn tick(&mut self, now: f64) -> bool {
        let Some(anim) = &self.anim else {
            return false;
        };
        self.transform = anim.sample(now);
        if anim.is_done(now) {
            self.anim = None;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn controller() -> ZoomController {
        ZoomController::new(ZoomConfig::default(), 800.0, 600.0)
    }

    #[test]
    fn test_wheel_keeps_pointer_fixed() {
        let mut z = controller();
        let before = z.transform().invert((300.0, 200.0));
        z.wheel(-100.0, WheelMode::Pixel, false, 300.0, 200.0);
        let t = z.transform();
        assert!(close(t.k, 2f64.powf(0.2)));
        let after = t.invert((300.0, 200.0));
        assert!(close(before.0, after.0) && close(before.1, after.1));
    }

    #[test]
    fn test_scale_clamped() {
        let mut z = controller();
        z.wheel(-10_000.0, WheelMode::Pixel, true, 0.0, 0.0);
        assert_eq!(z.transform().k, 3.0);
        z.wheel(10.0, WheelMode::Page, false, 0.0, 0.0);
        assert_eq!(z.transform().k, 0.2);
        z.set_transform(Transform::new(50.0, 0.0, 0.0));
        assert_eq!(z.transform().k, 3.0);
    }

    #[test]
    fn test_zoom_in_animates_about_center() {
        let mut z = controller();
        z.zoom_in(0.0);
        assert!(z.is_animating());
        assert!(z.tick(100.0));
        assert!(z.tick(200.0));
        assert!(!z.is_animating());
        let t = z.transform();
        assert!(close(t.k, 1.2));
        let c = z.current_center();
        assert!(close(c.0, 400.0) && close(c.1, 300.0));
        assert!(!z.tick(300.0));
    }

    #[test]
    fn test_fit_to_bounds() {
        let mut z = controller();
        let b = Bounds {
            min_x: 200.0,
            min_y: 200.0,
            max_x: 1640.0,
            max_y: 920.0,
        };
        z.fit_to_bounds(&b, 40.0, 0.0);
        let t = z.transform();
        assert!(close(t.k, 0.5));
        // content centered horizontally
        let (left, _) = t.apply((b.min_x, b.min_y));
        let (right, _) = t.apply((b.max_x, b.max_y));
        assert!(close(left, 800.0 - right));

        // tiny content is capped at the max scale
        let tiny = Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 10.0,
            max_y: 10.0,
        };
        z.fit_to_bounds(&tiny, 40.0, 24.0);
        assert_eq!(z.transform().k, 3.0);
    }

    #[test]
    fn test_pan_to_point_centers() {
        let mut z = controller();
        z.set_transform(Transform::new(1.5, -40.0, 12.0));
        z.pan_to_point(700.0, 450.0, None, None);
        let c = z.current_center();
        assert!(close(c.0, 700.0) && close(c.1, 450.0));
        assert_eq!(z.transform().k, 1.5);

        z.pan_to(100.0, 100.0, 0.0);
        z.tick(450.0);
        let c = z.current_center();
        assert!(close(c.0, 100.0) && close(c.1, 100.0));
    }

    #[test]
    fn test_pan_by_and_reset() {
        let mut z = controller();
        z.pan_by(10.0, -5.0);
        assert_eq!(z.transform(), Transform::new(1.0, 10.0, -5.0));
        assert_eq!(z.transform().to_svg(), "translate(10,-5) scale(1)");
        z.reset();
        assert_eq!(z.transform(), Transform::IDENTITY);
    }
}
