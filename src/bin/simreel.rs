use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use simreel::{
    ArmModel, CpuRasterizer, FfmpegSink, FfmpegSinkOpts, OverlaySeries, RecordOpts, ReelConfig,
    ReplayRenderer, SimData,
};

#[derive(Parser, Debug)]
#[command(name = "simreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the initial and final state of a run as PNGs.
    Screenshot(ScreenshotArgs),
    /// Simulate, then render an annotated MP4 (requires `ffmpeg` on PATH).
    Record(RecordArgs),
}

/// Settings shared by every subcommand. Flags override the config file.
#[derive(Args, Debug)]
struct RunArgs {
    /// Model JSON.
    #[arg(long)]
    model: PathBuf,

    /// Run config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file stem (defaults to the model name).
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    camera: Option<String>,

    #[arg(long)]
    keyframe: Option<String>,

    /// Simulated seconds.
    #[arg(long)]
    duration: Option<f64>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,
}

#[derive(Args, Debug)]
struct ScreenshotArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Directory for the PNGs.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RecordArgs {
    #[command(flatten)]
    run: RunArgs,

    #[arg(long)]
    fps: Option<u32>,

    /// Output MP4 path (defaults to `<video_dir>/<name>.mp4`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Series JSON to plot instead of the configured probe.
    #[arg(long)]
    series: Option<PathBuf>,

    /// Disable the time caption and the plot.
    #[arg(long)]
    no_overlay: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Screenshot(args) => cmd_screenshot(args),
        Command::Record(args) => cmd_record(args),
    }
}

fn load(run: &RunArgs) -> anyhow::Result<(ArmModel, ReelConfig)> {
    let model = ArmModel::from_path(&run.model)
        .with_context(|| format!("load model '{}'", run.model.display()))?;

    let mut cfg = match &run.config {
        Some(path) => ReelConfig::from_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => ReelConfig::default(),
    };
    if let Some(v) = &run.name {
        cfg.name = Some(v.clone());
    }
    if let Some(v) = &run.camera {
        cfg.camera = v.clone();
    }
    if let Some(v) = &run.keyframe {
        cfg.keyframe = Some(v.clone());
    }
    if let Some(v) = run.duration {
        cfg.duration = v;
    }
    if let Some(v) = run.width {
        cfg.width = v;
    }
    if let Some(v) = run.height {
        cfg.height = v;
    }
    Ok((model, cfg))
}

fn initial_data(model: &ArmModel, cfg: &ReelConfig) -> anyhow::Result<SimData> {
    let mut data = SimData::new(model);
    if let Some(k) = &cfg.keyframe {
        data.reset_keyframe(model, k)?;
    }
    data.forward(model);
    Ok(data)
}

fn cmd_screenshot(args: ScreenshotArgs) -> anyhow::Result<()> {
    let (model, mut cfg) = load(&args.run)?;
    if let Some(dir) = args.out_dir {
        cfg.screenshot_dir = dir;
    }
    cfg.validate()?;

    let mut data = initial_data(&model, &cfg)?;
    let raster = CpuRasterizer::new(&model, cfg.canvas()?)?;
    let mut renderer = ReplayRenderer::new(&model, Box::new(raster), cfg.camera.as_str())?;
    let stem = cfg.stem(&model.name).to_string();

    let initial = data.capture_state(0);
    let frame = renderer.render_state(&initial)?;
    let initial_path = cfg.screenshot_path(&format!("{stem}_initial"));
    simreel::save_png(&frame, &initial_path)?;
    log_probe(&model, &cfg, &data);

    simreel::advance(&model, &mut data, cfg.duration)?;
    let last = data.capture_state(1);
    let frame = renderer.render_state(&last)?;
    let final_path = cfg.screenshot_path(&format!("{stem}_final"));
    simreel::save_png(&frame, &final_path)?;
    log_probe(&model, &cfg, &data);

    eprintln!("wrote {}", initial_path.display());
    eprintln!("wrote {}", final_path.display());
    Ok(())
}

fn log_probe(model: &ArmModel, cfg: &ReelConfig, data: &SimData) {
    let Some(probe) = &cfg.probe else {
        return;
    };
    match data.body_position(model, &probe.body) {
        Some(p) => tracing::info!(
            body = %probe.body,
            x = p.x,
            y = p.y,
            time = data.time(),
            "probe body position"
        ),
        None => tracing::warn!(body = %probe.body, "probe body not found in model"),
    }
}

fn cmd_record(args: RecordArgs) -> anyhow::Result<()> {
    let (model, mut cfg) = load(&args.run)?;
    if let Some(v) = args.fps {
        cfg.fps = v;
    }
    if let Some(v) = args.series {
        cfg.series_path = Some(v);
    }
    if args.no_overlay {
        cfg.overlay.time_text = false;
        cfg.overlay.plot = false;
    }
    cfg.validate()?;
    let fps = cfg.fps()?;

    let mut data = initial_data(&model, &cfg)?;
    let opts = RecordOpts {
        fps,
        duration: cfg.duration,
        probe: if cfg.series_path.is_some() {
            None
        } else {
            cfg.probe.clone()
        },
    };
    let mut recording = simreel::record(&model, &mut data, &opts)?;
    if let Some(path) = &cfg.series_path {
        recording.series = Some(OverlaySeries::from_path(path)?);
    }

    let out_path = args
        .out
        .unwrap_or_else(|| cfg.video_path(cfg.stem(&model.name)));
    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        out_path: out_path.clone(),
        overwrite: true,
        bg_rgba: cfg.video_background,
    });
    let raster = CpuRasterizer::new(&model, cfg.canvas()?)?;
    let stats = simreel::render_to_video(
        &model,
        &recording,
        Box::new(raster),
        &cfg.camera,
        &cfg.overlay,
        fps,
        &mut sink,
    )?;

    eprintln!(
        "wrote {} ({} frames + {} pause)",
        out_path.display(),
        stats.frames_in,
        stats.pause_frames
    );
    Ok(())
}
