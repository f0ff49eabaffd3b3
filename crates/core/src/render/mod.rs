use serde::{Deserialize, Serialize};

use crate::{
    assets::AssetProvider,
    camera::Viewport,
    emblems::EmblemDrawStats,
    random::SceneRng,
    scene::Scene,
    surface::{Color, ColorStop, Paint, Point, Rect, Surface},
    Result,
};

const NOISE_CHANCE: f32 = 0.1;
const NOISE_DOTS: usize = 10;
const STATS_LOG_CHANCE: f32 = 0.01;

/// Tally of one star or streak pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDrawStats {
    pub drawn: usize,
    pub failed: usize,
}

/// What ended up on screen in one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameReport {
    pub stars: LayerDrawStats,
    pub streaks: LayerDrawStats,
    pub emblems: EmblemDrawStats,
    pub noise: bool,
}

/// Paints a scene onto a surface: background, stars, streaks, emblems, then
/// the vignette. Reads the scene, never mutates it.
#[derive(Debug, Clone)]
pub struct Compositor {
    rng: SceneRng,
}

impl Compositor {
    pub fn new(rng: SceneRng) -> Self {
        Self { rng }
    }

    /// Draws one frame. Only a failure to clear or paint the background is
    /// returned; a rejected star, streak or emblem is logged and skipped.
    pub fn render(
        &mut self,
        scene: &Scene,
        surface: &mut dyn Surface,
        assets: &dyn AssetProvider,
    ) -> Result<FrameReport> {
        let viewport = scene.viewport();
        let mut report = FrameReport::default();

        surface.clear()?;
        surface.fill_rect(full_frame(&viewport), &background(&viewport))?;

        if self.rng.unit() > 1.0 - NOISE_CHANCE {
            report.noise = true;
            if let Err(err) = self.scatter_noise(surface, &viewport) {
                tracing::warn!(error = %err, "noise layer failed");
            }
        }

        report.stars = scene.stars().draw(surface, scene.camera(), &viewport);
        report.streaks = scene.streaks().draw(surface);
        report.emblems = scene
            .emblems()
            .draw(surface, scene.camera(), &viewport, assets);

        if let Err(err) = surface.fill_rect(full_frame(&viewport), &vignette(&viewport)) {
            tracing::warn!(error = %err, "vignette failed");
        }

        if self.rng.chance(STATS_LOG_CHANCE) {
            tracing::debug!(
                images = report.emblems.images,
                texts = report.emblems.texts,
                stars = report.stars.drawn,
                streaks = report.streaks.drawn,
                "frame drawn"
            );
        }
        Ok(report)
    }

    fn scatter_noise(&mut self, surface: &mut dyn Surface, viewport: &Viewport) -> Result<()> {
        let paint = Paint::Solid(Color::rgba8(255, 255, 255, 0.01));
        for _ in 0..NOISE_DOTS {
            let x = self.rng.unit() * viewport.width;
            let y = self.rng.unit() * viewport.height;
            surface.fill_rect(Rect::new(x, y, 1.0, 1.0), &paint)?;
        }
        Ok(())
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(SceneRng::from_entropy())
    }
}

fn full_frame(viewport: &Viewport) -> Rect {
    Rect::new(0.0, 0.0, viewport.width, viewport.height)
}

/// Dark blue-black vertical gradient.
fn background(viewport: &Viewport) -> Paint {
    Paint::LinearGradient {
        from: Point::ORIGIN,
        to: Point::new(0.0, viewport.height),
        stops: vec![
            ColorStop::new(0.0, Color::rgba8(5, 10, 20, 1.0)),
            ColorStop::new(1.0, Color::rgba8(2, 5, 15, 1.0)),
        ],
    }
}

fn vignette(viewport: &Viewport) -> Paint {
    Paint::RadialGradient {
        center: viewport.center(),
        inner_radius: viewport.height * 0.4,
        outer_radius: viewport.height * 0.8,
        stops: vec![
            ColorStop::new(0.0, Color::rgba8(0, 0, 0, 0.0)),
            ColorStop::new(1.0, Color::rgba8(0, 0, 0, 0.7)),
        ],
    }
}
