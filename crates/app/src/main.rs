use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use starflight_core::{
    AssetLoader, AssetStore, Compositor, FrameDriver, ImageMeta, RecordingSurface, Scene,
    SceneConfig, SceneRng, StarflightError, Viewport,
};
use tracing_subscriber::EnvFilter;

fn main() -> starflight_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            frames,
            fps,
            output,
            scene,
        } => run_render(&scene, frames, fps, &output),
        Commands::Simulate {
            ticks,
            log_every,
            scene,
        } => run_simulate(&scene, ticks, log_every),
    }
}

fn run_render(
    args: &SceneArgs,
    frames: u64,
    fps: u32,
    output: &PathBuf,
) -> starflight_core::Result<()> {
    tracing::info!(frames, fps, ?output, "rendering headless frames");

    let (mut scene, assets) = build_scene(args)?;
    let mut compositor = Compositor::new(rng_for(args.seed.map(|seed| seed ^ 0x5eed)));
    let mut surface = RecordingSurface::new();
    let mut driver = FrameDriver::with_fps(fps);

    let stats = driver.run(&mut scene, &mut compositor, &mut surface, &assets, Some(frames));
    tracing::info!(
        frames = stats.frames,
        failed = stats.failed_frames,
        failed_draws = stats.failed_draws,
        peak_streaks = stats.peak_streaks,
        "render finished"
    );

    let viewport = scene.viewport();
    let recording = surface.into_recording(scene.ticks(), viewport.width, viewport.height);
    std::fs::write(output, recording.to_json_pretty()?)?;
    tracing::info!(commands = recording.commands.len(), ?output, "last frame written");
    Ok(())
}

fn run_simulate(args: &SceneArgs, ticks: u64, log_every: u64) -> starflight_core::Result<()> {
    tracing::info!(ticks, "simulating without drawing");

    let (mut scene, assets) = build_scene(args)?;
    for _ in 0..ticks {
        scene.tick(&assets);
        if log_every > 0 && scene.ticks() % log_every == 0 {
            tracing::info!(
                tick = scene.ticks(),
                camera_z = scene.camera().z,
                stars = scene.stars().len(),
                streaks = scene.streaks().len(),
                emblems = scene.emblems().len(),
                "scene state"
            );
        }
    }
    tracing::info!(
        ticks = scene.ticks(),
        streaks = scene.streaks().len(),
        "simulation finished"
    );
    Ok(())
}

fn build_scene(args: &SceneArgs) -> starflight_core::Result<(Scene, AssetStore)> {
    let config = match &args.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };

    let assets = if args.images {
        load_images(&config)
    } else {
        AssetStore::new()
    };

    let mut scene = Scene::new(
        &config,
        Viewport::new(args.width, args.height),
        &assets,
        rng_for(args.seed),
    )?;
    if let Some(delta) = args.scroll {
        scene.adjust_speed(delta);
    }
    Ok((scene, assets))
}

fn load_images(config: &SceneConfig) -> AssetStore {
    let loader = AssetLoader::new(|path| {
        image::image_dimensions(path)
            .map(|(width, height)| ImageMeta { width, height })
            .map_err(|err| StarflightError::asset(path.display().to_string(), err.to_string()))
    })
    .with_timeout(Duration::from_millis(config.assets.load_timeout_ms));
    loader.load_all(config.assets.image_paths.as_slice())
}

fn rng_for(seed: Option<u64>) -> SceneRng {
    match seed {
        Some(seed) => SceneRng::seeded(seed),
        None => SceneRng::from_entropy(),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Starfield flight animation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run frames against a recording surface and save the last one as JSON.
    Render {
        /// Number of frames to run.
        #[arg(short, long, default_value_t = 120)]
        frames: u64,
        /// Frame rate to pace the loop at; 0 runs unthrottled.
        #[arg(long, default_value_t = 0)]
        fps: u32,
        /// Where the recorded frame is written.
        #[arg(short, long, default_value = "frame.json")]
        output: PathBuf,
        #[command(flatten)]
        scene: SceneArgs,
    },
    /// Advance the simulation without drawing and log store sizes.
    Simulate {
        /// Number of ticks to run.
        #[arg(short, long, default_value_t = 600)]
        ticks: u64,
        /// Log scene state every N ticks; 0 only logs the summary.
        #[arg(long, default_value_t = 60)]
        log_every: u64,
        #[command(flatten)]
        scene: SceneArgs,
    },
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// JSON scene configuration; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 1280.0)]
    width: f32,
    #[arg(long, default_value_t = 720.0)]
    height: f32,
    /// Load the configured photos before starting.
    #[arg(long)]
    images: bool,
    /// One wheel delta applied to the camera speed before the first frame.
    #[arg(long, allow_hyphen_values = true)]
    scroll: Option<f32>,
}
