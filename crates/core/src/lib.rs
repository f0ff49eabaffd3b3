//! Core library for the Starflight animation.
//!
//! A camera flies forward through a field of stars while shooting-star
//! streaks cross the view and phrases and photos drift past. Each module owns
//! one subsystem (particles, assets, compositing, frame pacing) and talks to
//! the host only through the [`Surface`] drawing trait and the
//! [`AssetProvider`] readiness query, so the whole simulation runs headless.

pub mod assets;
pub mod camera;
pub mod config;
pub mod emblems;
pub mod error;
pub mod random;
pub mod record;
pub mod render;
pub mod scene;
pub mod stars;
pub mod streaks;
pub mod surface;
pub mod timeline;

pub use assets::{
    AssetLoader, AssetProvider, AssetStore, ImageHandle, ImageId, ImageMeta, LoadState,
};
pub use camera::{Camera, Projection, Viewport};
pub use config::{
    AssetConfig, CameraConfig, EmblemConfig, SceneConfig, StarConfig, StreakConfig,
};
pub use emblems::{Emblem, EmblemDrawStats, EmblemKind, EmblemStore};
pub use error::{Result, StarflightError};
pub use random::SceneRng;
pub use record::{DrawCommand, FrameRecording, RecordingSurface};
pub use render::{Compositor, FrameReport, LayerDrawStats};
pub use scene::Scene;
pub use stars::{Star, StarField};
pub use streaks::{Streak, StreakStore};
pub use surface::{Color, Paint, Point, Rect, Surface};
pub use timeline::{FrameClock, FrameDriver, FrameStats, StopHandle};
