use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Result, StarflightError};

/// Top-level configuration structure for a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub stars: StarConfig,
    pub streaks: StreakConfig,
    pub emblems: EmblemConfig,
    pub assets: AssetConfig,
}

impl SceneConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        let camera = &self.camera;
        if !(camera.fov > 0.0) {
            return Err(invalid("camera.fov must be positive"));
        }
        if !(camera.min_speed > 0.0) || camera.min_speed > camera.max_speed {
            return Err(invalid(
                "camera speed limits must satisfy 0 < min_speed <= max_speed",
            ));
        }
        if camera.initial_speed < camera.min_speed || camera.initial_speed > camera.max_speed {
            return Err(invalid("camera.initial_speed must lie within the speed limits"));
        }
        if !(0.0..=1.0).contains(&self.streaks.spawn_chance) {
            return Err(invalid("streaks.spawn_chance must lie in [0, 1]"));
        }
        if self.emblems.phrases.is_empty() {
            return Err(invalid("emblems.phrases must not be empty"));
        }
        if self.emblems.palette.is_empty() {
            return Err(invalid("emblems.palette must not be empty"));
        }
        if self.assets.load_timeout_ms == 0 {
            return Err(invalid("assets.load_timeout_ms must be positive"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> StarflightError {
    StarflightError::InvalidConfig(message.to_string())
}

/// Camera motion and projection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub initial_speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub fov: f32,
    pub auto_move: bool,
    /// Speed change per raw wheel unit. Scrolling down slows the flight.
    pub scroll_sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            initial_speed: 2.0,
            min_speed: 0.5,
            max_speed: 5.0,
            fov: 200.0,
            auto_move: true,
            scroll_sensitivity: 0.003,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarConfig {
    /// Number of full-size stars. Half as many half-size stars are added.
    pub max_stars: usize,
}

impl Default for StarConfig {
    fn default() -> Self {
        Self { max_stars: 300 }
    }
}

impl StarConfig {
    pub fn pool_size(&self) -> usize {
        self.max_stars + self.max_stars / 2
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakConfig {
    pub spawn_chance: f32,
    /// When set, no streak spawns while this many are alive.
    pub hard_cap: Option<usize>,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            spawn_chance: 0.02,
            hard_cap: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmblemConfig {
    /// Start with one emblem per phrase scattered over the screen close to the
    /// camera, on top of the `phrase_count` distant ones.
    pub seed_all_phrases: bool,
    pub phrase_count: usize,
    pub max_floating_images: usize,
    pub phrases: Vec<String>,
    /// Hex colours (`#rrggbb`) assigned to emblems at creation.
    pub palette: Vec<String>,
}

impl Default for EmblemConfig {
    fn default() -> Self {
        Self {
            seed_all_phrases: true,
            phrase_count: 5,
            max_floating_images: 3,
            phrases: DEFAULT_PHRASES.iter().map(|p| p.to_string()).collect(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub image_paths: Vec<String>,
    pub load_timeout_ms: u64,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            image_paths: (1..=9).map(|i| format!("img/img{i}.jpg")).collect(),
            load_timeout_ms: 5_000,
        }
    }
}

const DEFAULT_PALETTE: [&str; 5] = ["#ff3366", "#33ccff", "#ffcc33", "#99ff33", "#cc33ff"];

const DEFAULT_PHRASES: [&str; 34] = [
    "Te Amo",
    "My Love",
    "Eres preciosa",
    "Me encantas",
    "Amor de mi vida",
    "Por siempre juntos",
    "Eres mi todo",
    "Mi razón de ser",
    "Eres increíble",
    "Mi vida eres tú",
    "Universo en tus ojos",
    "Estrellas vivas",
    "Océanos claros",
    "Luz que hipnotiza",
    "Espejo de mi alma",
    "Te amo",
    "Eres mi todo",
    "Mi razón",
    "Siempre tú",
    "Mi vida",
    "Mi sol",
    "Amor eterno",
    "Contigo siempre",
    "Te pienso",
    "Mi corazón",
    "Te extraño",
    "Mi destino",
    "Eres magia",
    "Mi refugio",
    "Te siento",
    "Eres luz",
    "Sueño contigo",
    "Mi cielo",
    "Nuestro amor",
];
