use serde::{Deserialize, Serialize};

use crate::{config::CameraConfig, surface::Point};

/// Drawable area in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }

    /// Whether `point` lies inside the viewport grown by `margin` on every side.
    pub fn contains_with_margin(&self, point: Point, margin: f32) -> bool {
        point.x >= -margin
            && point.x <= self.width + margin
            && point.y >= -margin
            && point.y <= self.height + margin
    }
}

/// Result of projecting a world point onto the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub scale: f32,
    pub position: Point,
    pub size: f32,
}

/// Forward-moving viewpoint. Only `z` advances; `x` and `y` stay at the origin
/// but take part in the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    speed: f32,
    min_speed: f32,
    max_speed: f32,
    fov: f32,
    pub auto_move: bool,
    scroll_sensitivity: f32,
}

impl Camera {
    /// Smallest `fov + z` the projection will divide by.
    const MIN_DEPTH_DENOMINATOR: f32 = 1e-3;

    pub fn new(config: &CameraConfig) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            speed: config.initial_speed.max(config.min_speed).min(config.max_speed),
            min_speed: config.min_speed,
            max_speed: config.max_speed,
            fov: config.fov,
            auto_move: config.auto_move,
            scroll_sensitivity: config.scroll_sensitivity,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(self.min_speed).min(self.max_speed);
    }

    /// Moves the camera forward by one tick when auto-move is on.
    pub fn advance(&mut self) {
        if self.auto_move {
            self.z += self.speed;
        }
    }

    /// Applies a raw wheel delta. Positive deltas (scrolling down) slow down.
    pub fn apply_scroll(&mut self, delta: f32) {
        self.set_speed(self.speed - delta * self.scroll_sensitivity);
    }

    /// Perspective scale for a point at depth `z`.
    ///
    /// Depths at or behind `-fov` would flip or blow up the projection, so the
    /// denominator is floored at a small positive value.
    pub fn perspective_scale(&self, z: f32) -> f32 {
        self.fov / (self.fov + z).max(Self::MIN_DEPTH_DENOMINATOR)
    }

    pub fn project(&self, x: f32, y: f32, z: f32, size: f32, viewport: &Viewport) -> Projection {
        let scale = self.perspective_scale(z);
        let center = viewport.center();
        Projection {
            scale,
            position: Point::new(
                (x - self.x) * scale + center.x,
                (y - self.y) * scale + center.y,
            ),
            size: size * scale * 2.0,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_only_when_auto_moving() {
        let mut camera = Camera::default();
        camera.advance();
        assert_eq!(camera.z, 2.0);

        camera.auto_move = false;
        camera.advance();
        assert_eq!(camera.z, 2.0);
    }

    #[test]
    fn large_upward_scroll_clamps_to_max_speed() {
        let mut camera = Camera::default();
        assert_eq!(camera.speed(), 2.0);
        camera.apply_scroll(-1000.0);
        assert_eq!(camera.speed(), 5.0);
    }

    #[test]
    fn downward_scroll_clamps_to_min_speed() {
        let mut camera = Camera::default();
        camera.apply_scroll(100.0);
        assert!((camera.speed() - 1.7).abs() < 1e-5);
        camera.apply_scroll(10_000.0);
        assert_eq!(camera.speed(), 0.5);
    }

    #[test]
    fn projects_around_screen_center() {
        let camera = Camera::default();
        let viewport = Viewport::new(800.0, 600.0);

        let near = camera.project(100.0, -50.0, 0.0, 1.0, &viewport);
        assert_eq!(near.scale, 1.0);
        assert_eq!(near.position, Point::new(500.0, 250.0));
        assert_eq!(near.size, 2.0);

        let far = camera.project(100.0, -50.0, 200.0, 1.0, &viewport);
        assert_eq!(far.scale, 0.5);
        assert_eq!(far.position, Point::new(450.0, 275.0));
        assert_eq!(far.size, 1.0);
    }

    #[test]
    fn degenerate_depths_stay_finite() {
        let camera = Camera::default();
        assert!(camera.perspective_scale(-200.0).is_finite());
        assert!(camera.perspective_scale(-5000.0) > 0.0);
    }

    #[test]
    fn viewport_margin_check() {
        let viewport = Viewport::new(100.0, 100.0);
        assert!(viewport.contains_with_margin(Point::new(-10.0, 50.0), 20.0));
        assert!(!viewport.contains_with_margin(Point::new(-30.0, 50.0), 20.0));
        assert!(viewport.contains_with_margin(Point::new(120.0, 120.0), 20.0));
    }
}
