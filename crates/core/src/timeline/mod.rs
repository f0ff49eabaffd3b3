use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

use crate::{
    assets::AssetProvider,
    render::{Compositor, FrameReport},
    scene::Scene,
    surface::Surface,
    Result,
};

#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    pub time_seconds: f32,
    pub frames: u64,
}

impl FrameClock {
    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
        self.frames = 0;
    }

    pub fn advance(&mut self, delta: f32) {
        self.time_seconds = (self.time_seconds + delta).max(0.0);
        self.frames += 1;
    }
}

/// Cloneable flag that makes a running [`FrameDriver`] return before its next
/// frame.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Aggregate over a run of frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    pub frames: u64,
    pub failed_frames: u64,
    /// Stars, streaks and emblems the surface rejected.
    pub failed_draws: u64,
    pub peak_streaks: usize,
    pub noisy_frames: u64,
}

impl FrameStats {
    fn record(&mut self, report: &FrameReport) {
        self.frames += 1;
        self.failed_draws +=
            (report.stars.failed + report.streaks.failed + report.emblems.failed) as u64;
        self.peak_streaks = self.peak_streaks.max(report.streaks.drawn);
        if report.noise {
            self.noisy_frames += 1;
        }
    }
}

/// Runs the tick-then-render loop at a fixed cadence.
#[derive(Debug)]
pub struct FrameDriver {
    interval: Duration,
    clock: FrameClock,
    stop: StopHandle,
}

impl FrameDriver {
    /// A zero interval runs frames back to back.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            clock: FrameClock::default(),
            stop: StopHandle::new(),
        }
    }

    pub fn with_fps(fps: u32) -> Self {
        if fps == 0 {
            return Self::new(Duration::ZERO);
        }
        Self::new(Duration::from_secs(1) / fps)
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One simulation tick followed by one render.
    pub fn step(
        &mut self,
        scene: &mut Scene,
        compositor: &mut Compositor,
        surface: &mut dyn Surface,
        assets: &dyn AssetProvider,
    ) -> Result<FrameReport> {
        scene.tick(assets);
        let report = compositor.render(scene, surface, assets)?;
        self.clock.advance(self.interval.as_secs_f32());
        Ok(report)
    }

    /// Loops until stopped or until `max_frames` frames have run. A frame
    /// that fails to render is logged and the loop carries on.
    pub fn run(
        &mut self,
        scene: &mut Scene,
        compositor: &mut Compositor,
        surface: &mut dyn Surface,
        assets: &dyn AssetProvider,
        max_frames: Option<u64>,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            ?max_frames,
            "frame loop started"
        );

        loop {
            if self.stop.is_stopped() {
                tracing::info!(frames = stats.frames, "frame loop stopped");
                break;
            }
            if max_frames.is_some_and(|limit| stats.frames + stats.failed_frames >= limit) {
                break;
            }

            let started = Instant::now();
            match self.step(scene, compositor, surface, assets) {
                Ok(report) => stats.record(&report),
                Err(err) => {
                    stats.failed_frames += 1;
                    tracing::warn!(error = %err, "frame failed to render");
                }
            }

            let spent = started.elapsed();
            if spent < self.interval {
                thread::sleep(self.interval - spent);
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::AssetStore, camera::Viewport, config::SceneConfig, random::SceneRng,
        record::RecordingSurface, StarflightError,
    };

    fn scene(assets: &AssetStore) -> Scene {
        Scene::new(
            &SceneConfig::default(),
            Viewport::new(320.0, 240.0),
            assets,
            SceneRng::seeded(4),
        )
        .unwrap()
    }

    #[test]
    fn clock_counts_frames() {
        let mut clock = FrameClock::default();
        clock.advance(0.5);
        clock.advance(0.25);
        assert_eq!(clock.frames, 2);
        assert_eq!(clock.time_seconds, 0.75);
        clock.reset();
        assert_eq!(clock.frames, 0);
    }

    #[test]
    fn runs_the_requested_number_of_frames() {
        let assets = AssetStore::new();
        let mut scene = scene(&assets);
        let mut driver = FrameDriver::new(Duration::ZERO);
        let stats = driver.run(
            &mut scene,
            &mut Compositor::new(SceneRng::seeded(0)),
            &mut RecordingSurface::new(),
            &assets,
            Some(25),
        );
        assert_eq!(stats.frames, 25);
        assert_eq!(scene.ticks(), 25);
        assert_eq!(driver.clock().frames, 25);
    }

    #[test]
    fn stop_handle_ends_an_unbounded_loop() {
        let assets = AssetStore::new();
        let mut scene = scene(&assets);
        let mut driver = FrameDriver::new(Duration::from_millis(1));
        let stop = driver.stop_handle();

        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            stop.stop();
        });
        let stats = driver.run(
            &mut scene,
            &mut Compositor::new(SceneRng::seeded(0)),
            &mut RecordingSurface::new(),
            &assets,
            None,
        );
        stopper.join().unwrap();
        assert!(stats.frames > 0);
    }

    #[test]
    fn stopping_before_start_runs_nothing() {
        let assets = AssetStore::new();
        let mut scene = scene(&assets);
        let mut driver = FrameDriver::with_fps(60);
        driver.stop_handle().stop();
        let stats = driver.run(
            &mut scene,
            &mut Compositor::new(SceneRng::seeded(0)),
            &mut RecordingSurface::new(),
            &assets,
            None,
        );
        assert_eq!(stats.frames, 0);
        assert_eq!(scene.ticks(), 0);
    }

    struct BrokenSurface;

    impl Surface for BrokenSurface {
        fn clear(&mut self) -> Result<()> {
            Err(StarflightError::Draw("surface lost".to_string()))
        }
        fn fill_rect(&mut self, _: crate::surface::Rect, _: &crate::surface::Paint) -> Result<()> {
            Ok(())
        }
        fn fill_circle(&mut self, _: &crate::surface::CircleFill) -> Result<()> {
            Ok(())
        }
        fn stroke_line(
            &mut self,
            _: crate::surface::Point,
            _: crate::surface::Point,
            _: f32,
            _: crate::surface::Color,
        ) -> Result<()> {
            Ok(())
        }
        fn draw_image(&mut self, _: &crate::surface::ImageDraw) -> Result<()> {
            Ok(())
        }
        fn fill_text(&mut self, _: &crate::surface::TextDraw) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_frames_do_not_stop_the_loop() {
        let assets = AssetStore::new();
        let mut scene = scene(&assets);
        let mut driver = FrameDriver::new(Duration::ZERO);
        let stats = driver.run(
            &mut scene,
            &mut Compositor::new(SceneRng::seeded(0)),
            &mut BrokenSurface,
            &assets,
            Some(5),
        );
        assert_eq!(stats.failed_frames, 5);
        assert_eq!(stats.frames, 0);
        assert_eq!(scene.ticks(), 5);
    }
}
