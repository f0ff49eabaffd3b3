//! Immediate-mode 2D drawing interface the compositor paints onto.
//!
//! The host supplies the concrete surface (a canvas, a software rasteriser,
//! or [`RecordingSurface`](crate::RecordingSurface) in tests). Every call is
//! fallible so a single bad draw can be skipped without aborting the frame.

use serde::{Deserialize, Serialize};

use crate::{assets::ImageId, Result, StarflightError};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Straight (non-premultiplied) RGBA colour with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Builds a colour from 8-bit channels and a float alpha.
    pub fn rgba8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::rgba(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            a.clamp(0.0, 1.0),
        )
    }

    /// Hue in degrees, saturation and lightness as fractions.
    pub fn hsla(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 360.0;
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);
        let a = alpha.clamp(0.0, 1.0);
        if s == 0.0 {
            return Self::rgba(l, l, l, a);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self::rgba(
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
            a,
        )
    }

    /// Parses `#rrggbb`.
    pub fn from_hex(raw: &str) -> Result<Self> {
        let digits = raw.strip_prefix('#').unwrap_or(raw);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(StarflightError::msg(format!("invalid hex colour `{raw}`")));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| StarflightError::msg(format!("invalid hex colour `{raw}`")))
        };
        Ok(Self::rgba8(channel(0..2)?, channel(2..4)?, channel(4..6)?, 1.0))
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: alpha.clamp(0.0, 1.0),
            ..self
        }
    }
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Color,
}

impl ColorStop {
    pub fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Paint {
    Solid(Color),
    LinearGradient {
        from: Point,
        to: Point,
        stops: Vec<ColorStop>,
    },
    RadialGradient {
        center: Point,
        inner_radius: f32,
        outer_radius: f32,
        stops: Vec<ColorStop>,
    },
}

/// How a fill is combined with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    SourceOver,
    /// Additive blending.
    Lighter,
    /// Paints underneath existing pixels.
    DestinationOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub color: Color,
    pub blur: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub family: String,
    pub size: f32,
    pub bold: bool,
}

/// A filled circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleFill {
    pub center: Point,
    pub radius: f32,
    pub paint: Paint,
    pub blend: BlendMode,
}

/// Text blit anchored at `position` (vertically centred).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDraw {
    pub text: String,
    pub position: Point,
    pub font: Font,
    pub color: Color,
    pub align: TextAlign,
    pub shadow: Option<Shadow>,
}

/// Image blit centred on `center`, rotated by `rotation` radians and clipped
/// to a circle of `clip_radius` around the centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDraw {
    pub image: ImageId,
    pub center: Point,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub alpha: f32,
    pub clip_radius: f32,
    pub shadow: Option<Shadow>,
}

pub trait Surface {
    /// Wipes the whole surface.
    fn clear(&mut self) -> Result<()>;

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) -> Result<()>;

    fn fill_circle(&mut self, circle: &CircleFill) -> Result<()>;

    fn stroke_line(&mut self, from: Point, to: Point, width: f32, color: Color) -> Result<()>;

    fn draw_image(&mut self, image: &ImageDraw) -> Result<()>;

    fn fill_text(&mut self, text: &TextDraw) -> Result<()>;
}
