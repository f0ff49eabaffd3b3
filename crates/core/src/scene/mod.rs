use crate::{
    assets::AssetProvider,
    camera::{Camera, Viewport},
    config::SceneConfig,
    emblems::EmblemStore,
    random::SceneRng,
    stars::StarField,
    streaks::StreakStore,
    Result, StarflightError,
};

/// Everything the simulation owns: the camera, the three particle stores and
/// the random source driving them.
#[derive(Debug, Clone)]
pub struct Scene {
    camera: Camera,
    viewport: Viewport,
    stars: StarField,
    streaks: StreakStore,
    emblems: EmblemStore,
    rng: SceneRng,
    ticks: u64,
}

impl Scene {
    pub fn new(
        config: &SceneConfig,
        viewport: Viewport,
        assets: &dyn AssetProvider,
        mut rng: SceneRng,
    ) -> Result<Self> {
        config.validate()?;
        check_viewport(viewport)?;

        let stars = StarField::new(&config.stars, &mut rng);
        let emblems = EmblemStore::new(&config.emblems, &viewport, assets, &mut rng)?;
        tracing::info!(
            stars = stars.len(),
            emblems = emblems.len(),
            images = emblems.image_count(),
            "scene initialised"
        );

        Ok(Self {
            camera: Camera::new(&config.camera),
            viewport,
            stars,
            streaks: StreakStore::new(&config.streaks),
            emblems,
            rng,
            ticks: 0,
        })
    }

    /// Advances the camera and every store by one tick.
    pub fn tick(&mut self, assets: &dyn AssetProvider) {
        self.camera.advance();
        self.stars.update(&mut self.rng);
        let expired = self.streaks.update(&self.viewport, &mut self.rng);
        self.emblems.update(self.camera.speed(), assets, &mut self.rng);
        self.ticks += 1;
        if expired > 0 {
            tracing::trace!(expired, tick = self.ticks, "streaks faded out");
        }
    }

    /// Updates the viewport only; particle state is left untouched.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<()> {
        let viewport = Viewport::new(width, height);
        check_viewport(viewport)?;
        self.viewport = viewport;
        tracing::debug!(width, height, "viewport resized");
        Ok(())
    }

    /// Applies a raw wheel delta to the camera speed.
    pub fn adjust_speed(&mut self, delta: f32) {
        self.camera.apply_scroll(delta);
        tracing::debug!(speed = self.camera.speed(), "camera speed changed");
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn stars(&self) -> &StarField {
        &self.stars
    }

    pub fn streaks(&self) -> &StreakStore {
        &self.streaks
    }

    pub fn emblems(&self) -> &EmblemStore {
        &self.emblems
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

fn check_viewport(viewport: Viewport) -> Result<()> {
    let valid = |side: f32| side.is_finite() && side > 0.0;
    if valid(viewport.width) && valid(viewport.height) {
        Ok(())
    } else {
        Err(StarflightError::msg(format!(
            "viewport must be positive, got {}x{}",
            viewport.width, viewport.height
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetStore, ImageMeta};

    fn scene(seed: u64, assets: &AssetStore) -> Scene {
        Scene::new(
            &SceneConfig::default(),
            Viewport::new(1280.0, 720.0),
            assets,
            SceneRng::seeded(seed),
        )
        .unwrap()
    }

    #[test]
    fn starts_with_full_pools() {
        let assets = AssetStore::from_ready([("a.jpg", ImageMeta { width: 8, height: 8 })]);
        let scene = scene(1, &assets);
        assert_eq!(scene.stars().len(), 450);
        assert!(scene.streaks().is_empty());
        assert_eq!(scene.emblems().len(), 34 + 5 + 1);
        assert_eq!(scene.emblems().image_count(), 1);
    }

    #[test]
    fn same_seed_gives_same_trajectory() {
        let assets = AssetStore::new();
        let mut a = scene(99, &assets);
        let mut b = scene(99, &assets);
        for _ in 0..300 {
            a.tick(&assets);
            b.tick(&assets);
        }
        assert_eq!(a.stars().stars(), b.stars().stars());
        assert_eq!(a.streaks().streaks(), b.streaks().streaks());
        assert_eq!(a.emblems().emblems(), b.emblems().emblems());
        assert_eq!(a.ticks(), 300);
    }

    #[test]
    fn camera_advances_each_tick() {
        let assets = AssetStore::new();
        let mut scene = scene(2, &assets);
        scene.tick(&assets);
        scene.tick(&assets);
        assert_eq!(scene.camera().z, 4.0);
    }

    #[test]
    fn resize_round_trip_leaves_particles_alone() {
        let assets = AssetStore::new();
        let mut scene = scene(5, &assets);
        for _ in 0..20 {
            scene.tick(&assets);
        }
        let stars = scene.stars().stars().to_vec();
        let streaks = scene.streaks().streaks().to_vec();
        let emblems = scene.emblems().emblems().to_vec();

        scene.resize(640.0, 480.0).unwrap();
        assert_eq!(scene.viewport(), Viewport::new(640.0, 480.0));
        scene.resize(1280.0, 720.0).unwrap();

        assert_eq!(scene.viewport(), Viewport::new(1280.0, 720.0));
        assert_eq!(scene.stars().stars(), stars.as_slice());
        assert_eq!(scene.streaks().streaks(), streaks.as_slice());
        assert_eq!(scene.emblems().emblems(), emblems.as_slice());
    }

    #[test]
    fn rejects_degenerate_viewports() {
        let assets = AssetStore::new();
        let mut scene = scene(5, &assets);
        assert!(scene.resize(0.0, 100.0).is_err());
        assert_eq!(scene.viewport(), Viewport::new(1280.0, 720.0));
    }

    #[test]
    fn scroll_speed_is_clamped() {
        let assets = AssetStore::new();
        let mut scene = scene(3, &assets);
        scene.adjust_speed(-1000.0);
        assert_eq!(scene.camera().speed(), 5.0);
    }

    #[test]
    fn emblems_stay_in_recycle_range() {
        let assets = AssetStore::new();
        let mut scene = scene(17, &assets);
        scene.adjust_speed(-1000.0);
        for _ in 0..3_000 {
            scene.tick(&assets);
            for emblem in scene.emblems().emblems() {
                assert!(emblem.z >= -300.0);
                assert!((0.0..=1.0).contains(&emblem.alpha));
            }
        }
    }
}
