//! Floating phrases and photos drifting towards the camera.
//!
//! Emblems are never created or destroyed after start-up. Once one passes far
//! enough behind the camera it is recycled in place: pushed back into the
//! distance at a new position with its alpha reset for a fade-in.

use serde::{Deserialize, Serialize};

use crate::{
    assets::{AssetProvider, ImageHandle},
    camera::{Camera, Viewport},
    config::EmblemConfig,
    random::SceneRng,
    surface::{
        BlendMode, CircleFill, Color, Font, ImageDraw, Paint, Point, Shadow, Surface, TextAlign,
        TextDraw,
    },
    Result, StarflightError,
};

/// Per-tick depth advance of image emblems, as a fraction of camera speed.
pub const IMAGE_DRIFT: f32 = 0.505;
/// Per-tick depth advance of text emblems, as a fraction of camera speed.
pub const TEXT_DRIFT: f32 = 0.507 * 1.12;
/// Images turn at half their nominal rotation speed.
const ROTATION_DAMPING: f32 = 0.5;

/// Depth behind the camera at which an emblem is recycled.
pub const RECYCLE_DEPTH: f32 = -300.0;
const NEAR_BAND: f32 = 300.0;
const FAR_BAND: f32 = 1500.0;
const FAR_FADE_SPAN: f32 = 500.0;
const APPROACH_SPAN: f32 = 200.0;
const MAX_APPROACH_SCALE: f32 = 1.5;

const RECYCLE_MIN_DEPTH: f32 = 1000.0;
const RECYCLE_MAX_DEPTH: f32 = 2500.0;
const RECYCLE_SPAN_X: f32 = 1500.0;
const RECYCLE_SPAN_Y: f32 = 1000.0;

/// Far edge of the depth range phrases are seeded in at start-up.
const NEAR_SEED_DEPTH: f32 = 1000.0;

/// Distance at which an emblem is drawn at its natural size.
const REFERENCE_DEPTH: f32 = 500.0;
const CULL_MARGIN: f32 = 200.0;
const MIN_DRAW_ALPHA: f32 = 0.05;
const MIN_FONT_SIZE: f32 = 12.0;
const FONT_FAMILY: &str = "Orbitron, sans-serif";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEmblem {
    pub text: String,
    /// Base font size before distance scaling.
    pub size: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEmblem {
    pub image: ImageHandle,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EmblemKind {
    Text(TextEmblem),
    Image(ImageEmblem),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emblem {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub scale: f32,
    pub alpha: f32,
    pub kind: EmblemKind,
}

/// Alpha and scale an emblem takes at depth `z`.
///
/// Fades in from far away, holds full visibility mid-range, pulses brighter
/// and larger as it nears the camera plane and fades out behind it.
pub fn depth_band(z: f32) -> (f32, f32) {
    let distance = z.abs();
    if distance < NEAR_BAND {
        let mut alpha = ((NEAR_BAND - distance) / APPROACH_SPAN).min(1.0);
        let scale = (1.0 + (NEAR_BAND - distance) / NEAR_BAND).min(MAX_APPROACH_SCALE);
        if z < 0.0 {
            alpha = (1.0 - z.abs() / NEAR_BAND).max(0.0);
        }
        (alpha, scale)
    } else if distance <= FAR_BAND {
        (1.0, 1.0)
    } else {
        ((1.0 - (distance - FAR_BAND) / FAR_FADE_SPAN).max(0.0), 1.0)
    }
}

impl Emblem {
    pub fn text(phrases: &[String], palette: &[Color], rng: &mut SceneRng) -> Self {
        let text = rng.pick(phrases).cloned().unwrap_or_default();
        Self {
            x: rng.centered(2000.0),
            y: rng.centered(2000.0),
            z: rng.range(1000.0, 3000.0),
            scale: 1.0,
            alpha: 0.0,
            kind: EmblemKind::Text(TextEmblem {
                text,
                size: rng.range(10.0, 20.0),
                color: pick_color(palette, rng),
            }),
        }
    }

    /// A phrase placed somewhere over the screen and within the first thousand
    /// units of depth, so it is visible from the opening frame.
    pub fn near_phrase(text: &str, viewport: &Viewport, rng: &mut SceneRng) -> Self {
        Self {
            x: rng.range(0.0, viewport.width),
            y: rng.range(0.0, viewport.height),
            z: rng.range(0.0, NEAR_SEED_DEPTH),
            scale: 1.0,
            alpha: 0.0,
            kind: EmblemKind::Text(TextEmblem {
                text: text.to_string(),
                size: rng.range(10.0, 20.0),
                color: Color::WHITE,
            }),
        }
    }

    /// Builds an image emblem from a random ready image, or `None` when no
    /// image is ready.
    pub fn image(ready: &[ImageHandle], palette: &[Color], rng: &mut SceneRng) -> Option<Self> {
        let image = rng.pick(ready)?.clone();
        let size = rng.range(100.0, 200.0);
        let height = size * image.aspect_ratio();
        Some(Self {
            x: rng.centered(3000.0),
            y: rng.centered(2000.0),
            z: rng.range(1000.0, 3000.0),
            scale: 1.0,
            alpha: 0.0,
            kind: EmblemKind::Image(ImageEmblem {
                image,
                width: size,
                height,
                rotation: rng.range(0.0, std::f32::consts::TAU),
                rotation_speed: rng.centered(0.01),
                color: pick_color(palette, rng),
            }),
        })
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, EmblemKind::Image(_))
    }

    /// Advances the emblem by one tick at the given camera speed.
    pub fn update(&mut self, camera_speed: f32, assets: &dyn AssetProvider, rng: &mut SceneRng) {
        match &mut self.kind {
            EmblemKind::Image(image) => {
                self.z -= camera_speed * IMAGE_DRIFT;
                image.rotation += image.rotation_speed * ROTATION_DAMPING;
            }
            EmblemKind::Text(_) => {
                self.z -= camera_speed * TEXT_DRIFT;
            }
        }

        if self.z < RECYCLE_DEPTH {
            self.recycle(assets, rng);
        } else {
            let (alpha, scale) = depth_band(self.z);
            self.alpha = alpha;
            self.scale = scale;
        }
    }

    fn recycle(&mut self, assets: &dyn AssetProvider, rng: &mut SceneRng) {
        self.z = rng.range(RECYCLE_MIN_DEPTH, RECYCLE_MAX_DEPTH);
        self.x = rng.centered(RECYCLE_SPAN_X);
        self.y = rng.centered(RECYCLE_SPAN_Y);
        if let EmblemKind::Image(image) = &mut self.kind {
            if let Some(next) = rng.pick(&assets.ready_images()) {
                image.image = next.clone();
            }
        }
        self.alpha = 0.0;
        tracing::trace!(z = self.z, image = self.is_image(), "emblem recycled");
    }

    /// Distance scale combined with the approach pulse.
    pub fn screen_scale(&self) -> f32 {
        (REFERENCE_DEPTH / self.z.max(1.0)).min(MAX_APPROACH_SCALE) * self.scale
    }

    /// Alpha used for drawing, floored so emblems never flicker out entirely.
    pub fn draw_alpha(&self) -> f32 {
        (self.alpha * 0.9).min(1.0).max(MIN_DRAW_ALPHA)
    }

    fn validate(&self) -> Result<()> {
        let finite = [self.x, self.y, self.z, self.scale, self.alpha]
            .iter()
            .all(|value| value.is_finite());
        if !finite {
            return Err(StarflightError::MalformedEmblem(format!(
                "non-finite position or scale at ({}, {}, {})",
                self.x, self.y, self.z
            )));
        }
        match &self.kind {
            EmblemKind::Image(image) if !(image.width > 0.0 && image.height > 0.0) => {
                Err(StarflightError::MalformedEmblem(format!(
                    "image `{}` has size {}x{}",
                    image.image.source, image.width, image.height
                )))
            }
            EmblemKind::Text(text) if text.text.is_empty() => {
                Err(StarflightError::MalformedEmblem("empty phrase".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn draw(
        &self,
        surface: &mut dyn Surface,
        camera: &Camera,
        viewport: &Viewport,
        assets: &dyn AssetProvider,
    ) -> Result<DrawOutcome> {
        self.validate()?;

        let scale = self.screen_scale();
        let alpha = self.draw_alpha();
        let center = viewport.center();
        let position = Point::new(
            (self.x - camera.x) * scale + center.x,
            (self.y - camera.y) * scale + center.y,
        );
        if !viewport.contains_with_margin(position, CULL_MARGIN) {
            return Ok(DrawOutcome::Culled);
        }

        match &self.kind {
            EmblemKind::Image(image) => {
                if !assets.is_ready(image.image.id) {
                    return Ok(DrawOutcome::NotReady);
                }
                let image_scale = scale * 0.8;
                let width = image.width * image_scale;
                let height = image.height * image_scale;
                let short_side = width.min(height);
                surface.draw_image(&ImageDraw {
                    image: image.image.id,
                    center: position,
                    width,
                    height,
                    rotation: image.rotation,
                    alpha,
                    clip_radius: short_side * 0.5,
                    shadow: Some(Shadow {
                        color: Color::rgba(0.0, 0.0, 0.0, 0.5),
                        blur: 10.0 * scale,
                    }),
                })?;
                surface.fill_circle(&CircleFill {
                    center: position,
                    radius: short_side * 0.55,
                    paint: Paint::Solid(Color::rgba(1.0, 1.0, 1.0, 0.1 * alpha)),
                    blend: BlendMode::DestinationOver,
                })?;
                Ok(DrawOutcome::Image)
            }
            EmblemKind::Text(text) => {
                surface.fill_text(&TextDraw {
                    text: text.text.clone(),
                    position,
                    font: Font {
                        family: FONT_FAMILY.to_string(),
                        size: (text.size * scale * 0.8).max(MIN_FONT_SIZE),
                        bold: true,
                    },
                    color: Color::WHITE.with_alpha(alpha),
                    align: TextAlign::Center,
                    shadow: Some(Shadow {
                        color: Color::rgba(0.0, 0.0, 0.0, 0.8),
                        blur: 5.0,
                    }),
                })?;
                Ok(DrawOutcome::Text)
            }
        }
    }
}

fn pick_color(palette: &[Color], rng: &mut SceneRng) -> Color {
    rng.pick(palette).copied().unwrap_or(Color::WHITE)
}

enum DrawOutcome {
    Image,
    Text,
    Culled,
    NotReady,
}

/// Tally of one emblem pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmblemDrawStats {
    pub images: usize,
    pub texts: usize,
    pub culled: usize,
    pub not_ready: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct EmblemStore {
    emblems: Vec<Emblem>,
    phrases: Vec<String>,
    palette: Vec<Color>,
}

impl EmblemStore {
    /// Seeds one near emblem per phrase when `seed_all_phrases` is set, then
    /// creates `phrase_count` distant phrases and up to `max_floating_images`
    /// image emblems from whatever is ready right now.
    pub fn new(
        config: &EmblemConfig,
        viewport: &Viewport,
        assets: &dyn AssetProvider,
        rng: &mut SceneRng,
    ) -> Result<Self> {
        let palette = config
            .palette
            .iter()
            .map(|raw| Color::from_hex(raw))
            .collect::<Result<Vec<_>>>()?;
        let mut store = Self {
            emblems: Vec::new(),
            phrases: config.phrases.clone(),
            palette,
        };

        if config.seed_all_phrases {
            for phrase in &config.phrases {
                store.emblems.push(Emblem::near_phrase(phrase, viewport, rng));
            }
        }
        for _ in 0..config.phrase_count {
            store.spawn_text(rng);
        }

        let ready = assets.ready_images().len();
        if ready == 0 {
            tracing::warn!("no images ready; emblems will be text only");
        }
        for _ in 0..config.max_floating_images.min(ready) {
            store.spawn_image(assets, rng);
        }
        Ok(store)
    }

    pub fn from_emblems(emblems: Vec<Emblem>) -> Self {
        Self {
            emblems,
            phrases: Vec::new(),
            palette: Vec::new(),
        }
    }

    pub fn emblems(&self) -> &[Emblem] {
        &self.emblems
    }

    pub fn len(&self) -> usize {
        self.emblems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emblems.is_empty()
    }

    pub fn image_count(&self) -> usize {
        self.emblems.iter().filter(|emblem| emblem.is_image()).count()
    }

    pub fn spawn_text(&mut self, rng: &mut SceneRng) -> &Emblem {
        let emblem = Emblem::text(&self.phrases, &self.palette, rng);
        self.emblems.push(emblem);
        &self.emblems[self.emblems.len() - 1]
    }

    /// Adds an image emblem; returns `None` without touching the store when
    /// no image is ready.
    pub fn spawn_image(
        &mut self,
        assets: &dyn AssetProvider,
        rng: &mut SceneRng,
    ) -> Option<&Emblem> {
        let emblem = Emblem::image(&assets.ready_images(), &self.palette, rng)?;
        self.emblems.push(emblem);
        self.emblems.last()
    }

    pub fn update(&mut self, camera_speed: f32, assets: &dyn AssetProvider, rng: &mut SceneRng) {
        for emblem in &mut self.emblems {
            emblem.update(camera_speed, assets, rng);
        }
    }

    /// Draws far-to-near. A failing emblem is logged and skipped; the rest of
    /// the pass carries on.
    pub fn draw(
        &self,
        surface: &mut dyn Surface,
        camera: &Camera,
        viewport: &Viewport,
        assets: &dyn AssetProvider,
    ) -> EmblemDrawStats {
        let mut sorted: Vec<&Emblem> = self.emblems.iter().collect();
        sorted.sort_by(|a, b| b.z.total_cmp(&a.z));

        let mut stats = EmblemDrawStats::default();
        for emblem in sorted {
            match emblem.draw(surface, camera, viewport, assets) {
                Ok(DrawOutcome::Image) => stats.images += 1,
                Ok(DrawOutcome::Text) => stats.texts += 1,
                Ok(DrawOutcome::Culled) => stats.culled += 1,
                Ok(DrawOutcome::NotReady) => stats.not_ready += 1,
                Err(err) => {
                    stats.failed += 1;
                    tracing::warn!(error = %err, z = emblem.z, "skipping emblem this frame");
                }
            }
        }
        stats
    }
}
