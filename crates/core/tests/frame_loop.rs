use std::time::Duration;

use starflight_core::{
    AssetStore, Compositor, DrawCommand, FrameDriver, FrameRecording, ImageMeta, RecordingSurface,
    Scene, SceneConfig, SceneRng, Viewport,
};

fn photo_assets() -> AssetStore {
    AssetStore::from_ready([
        ("img/img1.jpg", ImageMeta { width: 640, height: 480 }),
        ("img/img2.jpg", ImageMeta { width: 480, height: 640 }),
    ])
}

#[test]
fn long_headless_run_keeps_every_store_in_bounds() {
    let assets = photo_assets();
    let config = SceneConfig::default();
    let mut scene = Scene::new(
        &config,
        Viewport::new(1280.0, 720.0),
        &assets,
        SceneRng::seeded(2024),
    )
    .unwrap();
    scene.adjust_speed(-1000.0);

    let mut compositor = Compositor::new(SceneRng::seeded(7));
    let mut surface = RecordingSurface::new();
    let mut driver = FrameDriver::new(Duration::ZERO);
    let stats = driver.run(&mut scene, &mut compositor, &mut surface, &assets, Some(1_500));

    assert_eq!(stats.frames, 1_500);
    assert_eq!(stats.failed_frames, 0);
    assert!(stats.peak_streaks > 0);

    assert_eq!(scene.stars().len(), config.stars.pool_size());
    for star in scene.stars().stars() {
        assert!((0.0..3000.0).contains(&star.z));
    }
    for emblem in scene.emblems().emblems() {
        assert!(emblem.z >= -300.0);
    }
    assert_eq!(scene.emblems().image_count(), 2);
}

#[test]
fn last_frame_recording_survives_json() {
    let assets = photo_assets();
    let mut scene = Scene::new(
        &SceneConfig::default(),
        Viewport::new(800.0, 600.0),
        &assets,
        SceneRng::seeded(5),
    )
    .unwrap();
    let mut compositor = Compositor::new(SceneRng::seeded(6));
    let mut surface = RecordingSurface::new();
    let mut driver = FrameDriver::new(Duration::ZERO);
    driver.run(&mut scene, &mut compositor, &mut surface, &assets, Some(60));

    let recording = surface.into_recording(scene.ticks(), 800.0, 600.0);
    assert_eq!(recording.commands.first(), Some(&DrawCommand::Clear));
    assert_eq!(recording.frame, 60);

    let parsed = FrameRecording::from_json_str(&recording.to_json_pretty().unwrap()).unwrap();
    assert_eq!(parsed, recording);
}

#[test]
fn same_seeds_draw_the_same_frame() {
    let assets = photo_assets();
    let run = || {
        let mut scene = Scene::new(
            &SceneConfig::default(),
            Viewport::new(640.0, 480.0),
            &assets,
            SceneRng::seeded(11),
        )
        .unwrap();
        let mut compositor = Compositor::new(SceneRng::seeded(12));
        let mut surface = RecordingSurface::new();
        FrameDriver::new(Duration::ZERO).run(
            &mut scene,
            &mut compositor,
            &mut surface,
            &assets,
            Some(200),
        );
        surface.take_commands()
    };
    assert_eq!(run(), run());
}
