use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    assets::ImageId,
    surface::{CircleFill, Color, ImageDraw, Paint, Point, Rect, Surface, TextDraw},
    Result, StarflightError,
};

/// One call made against a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    Clear,
    FillRect {
        rect: Rect,
        paint: Paint,
    },
    FillCircle(CircleFill),
    StrokeLine {
        from: Point,
        to: Point,
        width: f32,
        color: Color,
    },
    DrawImage(ImageDraw),
    FillText(TextDraw),
}

/// Serialisable list of draw calls for a single frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameRecording {
    pub frame: u64,
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCommand>,
}

impl FrameRecording {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Headless surface that records every call instead of rasterising it.
///
/// Draws of images registered through [`fail_image`](Self::fail_image) are
/// rejected, as are the next circles counted by
/// [`fail_circles`](Self::fail_circles). This lets callers exercise per-entity
/// error handling.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    failing_images: HashSet<ImageId>,
    failing_circles: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_image(&mut self, id: ImageId) {
        self.failing_images.insert(id);
    }

    /// Rejects the next `count` circle fills.
    pub fn fail_circles(&mut self, count: usize) {
        self.failing_circles = count;
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Hands out the recorded calls and starts a fresh list.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn into_recording(self, frame: u64, width: f32, height: f32) -> FrameRecording {
        FrameRecording {
            frame,
            width,
            height,
            commands: self.commands,
        }
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self) -> Result<()> {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) -> Result<()> {
        self.commands.push(DrawCommand::FillRect {
            rect,
            paint: paint.clone(),
        });
        Ok(())
    }

    fn fill_circle(&mut self, circle: &CircleFill) -> Result<()> {
        if self.failing_circles > 0 {
            self.failing_circles -= 1;
            return Err(StarflightError::Draw("circle rejected by surface".to_string()));
        }
        self.commands.push(DrawCommand::FillCircle(circle.clone()));
        Ok(())
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f32, color: Color) -> Result<()> {
        self.commands.push(DrawCommand::StrokeLine {
            from,
            to,
            width,
            color,
        });
        Ok(())
    }

    fn draw_image(&mut self, image: &ImageDraw) -> Result<()> {
        if self.failing_images.contains(&image.image) {
            return Err(StarflightError::Draw(format!(
                "image {} rejected by surface",
                image.image.0
            )));
        }
        self.commands.push(DrawCommand::DrawImage(image.clone()));
        Ok(())
    }

    fn fill_text(&mut self, text: &TextDraw) -> Result<()> {
        self.commands.push(DrawCommand::FillText(text.clone()));
        Ok(())
    }
}
