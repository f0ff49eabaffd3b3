use serde::{Deserialize, Serialize};

use crate::{
    camera::{Camera, Projection, Viewport},
    config::StarConfig,
    random::SceneRng,
    render::LayerDrawStats,
    surface::{BlendMode, CircleFill, Color, ColorStop, Paint, Surface},
    Result,
};

/// Depth at which stars are born.
pub const FAR_PLANE: f32 = 3000.0;

/// Deepest depth a respawned star may take, keeping `z` strictly below the
/// far plane.
const LAST_DEPTH: f32 = FAR_PLANE - 1e-3;

/// Side of the square stars are scattered over.
const FIELD_SPAN: f32 = 4000.0;

/// Depth below which stars start fading towards black.
const FADE_IN_DEPTH: f32 = 1000.0;

/// Background star. Recycled in place, never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub size: f32,
    pub speed: f32,
    /// Depth layer in `1..=5`; deeper layers drift faster.
    pub layer: u8,
    pub opacity: f32,
    pub hue: f32,
    /// Size class the star was created with (1.0 or 0.5).
    pub size_multiplier: f32,
}

impl Star {
    pub fn random(rng: &mut SceneRng, size_multiplier: f32) -> Self {
        let layer = rng.int_inclusive(1, 5) as u8;
        let speed = rng.range(0.02, 0.07) * (f32::from(layer) / 5.0);
        Self {
            x: rng.centered(FIELD_SPAN),
            y: rng.centered(FIELD_SPAN),
            z: rng.range(0.0, FAR_PLANE),
            size: rng.range(0.5, 2.0) * size_multiplier,
            speed,
            layer,
            opacity: rng.range(0.3, 1.0),
            hue: rng.range(200.0, 240.0),
            size_multiplier,
        }
    }

    pub fn update(&mut self, rng: &mut SceneRng) {
        self.z -= self.speed * 10.0;
        if self.z < 0.0 {
            self.respawn(rng);
        }
    }

    /// Sends the star back to the far plane with a fresh position, size and
    /// opacity. Layer and hue are kept.
    fn respawn(&mut self, rng: &mut SceneRng) {
        self.x = rng.centered(FIELD_SPAN);
        self.y = rng.centered(FIELD_SPAN);
        self.z = (FAR_PLANE + self.z).clamp(0.0, LAST_DEPTH);
        self.size = rng.range(0.5, 2.0) * self.size_multiplier;
        self.opacity = rng.range(0.3, 1.0);
    }

    /// Opacity after the distance fade-in.
    pub fn visible_alpha(&self) -> f32 {
        self.opacity * (self.z / FADE_IN_DEPTH).min(1.0)
    }

    fn draw(&self, surface: &mut dyn Surface, projection: &Projection) -> Result<()> {
        let alpha = self.visible_alpha();
        let glow_radius = projection.size * 1.5;
        surface.fill_circle(&CircleFill {
            center: projection.position,
            radius: glow_radius,
            paint: Paint::RadialGradient {
                center: projection.position,
                inner_radius: 0.0,
                outer_radius: glow_radius,
                stops: vec![
                    ColorStop::new(0.0, Color::hsla(self.hue, 1.0, 0.8, alpha)),
                    ColorStop::new(0.5, Color::hsla(self.hue, 1.0, 0.7, alpha * 0.7)),
                    ColorStop::new(1.0, Color::hsla(self.hue, 1.0, 0.5, 0.0)),
                ],
            },
            blend: BlendMode::Lighter,
        })?;
        surface.fill_circle(&CircleFill {
            center: projection.position,
            radius: projection.size * 0.5,
            paint: Paint::Solid(Color::WHITE.with_alpha(alpha * 0.8)),
            blend: BlendMode::Lighter,
        })
    }
}

/// Fixed-size pool of background stars.
#[derive(Debug, Clone, Default)]
pub struct StarField {
    stars: Vec<Star>,
}

impl StarField {
    pub fn new(config: &StarConfig, rng: &mut SceneRng) -> Self {
        let mut stars = Vec::with_capacity(config.pool_size());
        stars.extend((0..config.max_stars).map(|_| Star::random(rng, 1.0)));
        stars.extend((0..config.max_stars / 2).map(|_| Star::random(rng, 0.5)));
        Self { stars }
    }

    pub fn from_stars(stars: Vec<Star>) -> Self {
        Self { stars }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn update(&mut self, rng: &mut SceneRng) {
        for star in &mut self.stars {
            star.update(rng);
        }
    }

    /// Draws far-to-near. A star the surface rejects is logged and skipped;
    /// the rest of the layer still draws.
    pub fn draw(
        &self,
        surface: &mut dyn Surface,
        camera: &Camera,
        viewport: &Viewport,
    ) -> LayerDrawStats {
        let mut sorted: Vec<&Star> = self.stars.iter().collect();
        sorted.sort_by(|a, b| b.z.total_cmp(&a.z));

        let mut stats = LayerDrawStats::default();
        for star in sorted {
            let projection = camera.project(star.x, star.y, star.z, star.size, viewport);
            if !viewport.contains_with_margin(projection.position, projection.size) {
                continue;
            }
            match star.draw(surface, &projection) {
                Ok(()) => stats.drawn += 1,
                Err(err) => {
                    stats.failed += 1;
                    tracing::warn!(error = %err, z = star.z, "skipping star this frame");
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DrawCommand, RecordingSurface};

    fn star_at(x: f32, y: f32, z: f32, speed: f32) -> Star {
        Star {
            x,
            y,
            z,
            size: 1.0,
            speed,
            layer: 3,
            opacity: 1.0,
            hue: 220.0,
            size_multiplier: 1.0,
        }
    }

    #[test]
    fn pool_holds_both_size_classes() {
        let mut rng = SceneRng::seeded(11);
        let field = StarField::new(&StarConfig { max_stars: 10 }, &mut rng);
        assert_eq!(field.len(), 15);
        assert!(field.stars()[10..].iter().all(|s| s.size < 1.0));
        assert!(field
            .stars()
            .iter()
            .all(|s| (1..=5).contains(&s.layer) && (200.0..240.0).contains(&s.hue)));
    }

    #[test]
    fn far_plane_star_moves_by_ten_times_speed() {
        let mut rng = SceneRng::seeded(1);
        let mut star = star_at(0.0, 0.0, 3000.0, 0.05);
        star.update(&mut rng);
        assert!((star.z - 2999.5).abs() < 1e-3);
    }

    #[test]
    fn depth_stays_in_range_over_many_ticks() {
        let mut rng = SceneRng::seeded(42);
        let mut field = StarField::new(&StarConfig::default(), &mut rng);
        for _ in 0..5_000 {
            field.update(&mut rng);
            assert!(field.stars().iter().all(|s| s.z >= 0.0 && s.z < FAR_PLANE));
        }
    }

    #[test]
    fn respawn_keeps_layer_and_hue() {
        let mut rng = SceneRng::seeded(9);
        let mut star = star_at(10.0, 10.0, 0.1, 0.07);
        star.layer = 5;
        star.hue = 233.0;
        star.update(&mut rng);

        assert!(star.z > 2999.0 && star.z < FAR_PLANE);
        assert_eq!(star.layer, 5);
        assert_eq!(star.hue, 233.0);
        assert!((-2000.0..2000.0).contains(&star.x));
        assert!((0.3..1.0).contains(&star.opacity));
    }

    #[test]
    fn small_stars_respawn_small() {
        let mut rng = SceneRng::seeded(12);
        for _ in 0..100 {
            let mut star = star_at(0.0, 0.0, 0.1, 0.07);
            star.size_multiplier = 0.5;
            star.update(&mut rng);
            assert!((0.25..1.0).contains(&star.size));
        }
    }

    #[test]
    fn distant_stars_fade_in() {
        let near = star_at(0.0, 0.0, 500.0, 0.0);
        let far = star_at(0.0, 0.0, 2500.0, 0.0);
        assert_eq!(near.visible_alpha(), 0.5);
        assert_eq!(far.visible_alpha(), 1.0);
    }

    #[test]
    fn draws_far_to_near_and_culls_offscreen() {
        let field = StarField::from_stars(vec![
            star_at(0.0, 0.0, 100.0, 0.0),
            star_at(0.0, 0.0, 2000.0, 0.0),
            star_at(1_000_000.0, 0.0, 10.0, 0.0),
        ]);
        let mut surface = RecordingSurface::new();
        let stats = field.draw(&mut surface, &Camera::default(), &Viewport::new(800.0, 600.0));
        assert_eq!(stats, LayerDrawStats { drawn: 2, failed: 0 });

        let radii: Vec<f32> = surface
            .commands()
            .iter()
            .filter_map(|command| match command {
                DrawCommand::FillCircle(circle) => Some(circle.radius),
                _ => None,
            })
            .collect();
        assert_eq!(radii.len(), 4);
        // Glow of the far star comes first and is the smaller one.
        assert!(radii[0] < radii[2]);
    }

    #[test]
    fn rejected_star_does_not_hide_the_rest_of_the_layer() {
        let field = StarField::from_stars(
            (0..10)
                .map(|i| star_at(i as f32 * 10.0, 0.0, 500.0 + i as f32, 0.0))
                .collect(),
        );
        let mut surface = RecordingSurface::new();
        surface.fail_circles(1);

        let stats = field.draw(&mut surface, &Camera::default(), &Viewport::new(800.0, 600.0));
        assert_eq!(stats, LayerDrawStats { drawn: 9, failed: 1 });
        let circles = surface
            .commands()
            .iter()
            .filter(|command| matches!(command, DrawCommand::FillCircle(_)))
            .count();
        assert_eq!(circles, 18);
    }
}
