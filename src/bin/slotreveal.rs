use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use slotreveal::{
    CpuCapture, Elapsed, ExportOpts, FontBook, Fps, GifEncoder, ImageStore, Project,
    RevealSession, compose, encode_png, end_time_ms, lock_time_ms, sample_times,
};

#[derive(Parser, Debug)]
#[command(name = "slotreveal", version, about = "Slot-machine logo reveal renderer")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one frame as a PNG.
    Frame(FrameArgs),
    /// Render the resting frame as `<slug>-snapshot.png`.
    Snapshot(OutputArgs),
    /// Sweep the timeline into `<slug>-intro.gif`.
    Export(ExportArgs),
    /// Print the lock schedule and export timing as JSON.
    Timeline(TimelineArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Project JSON (settings, assets, mappings).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory image paths are relative to. Defaults to the project file's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Font directory. Falls back to `SLOTREVEAL_FONT_DIR`.
    #[arg(long)]
    fonts: Option<PathBuf>,

    /// Capture scale relative to 1920x1080.
    #[arg(long, default_value_t = 0.5)]
    scale: f64,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Timeline time in milliseconds. Omit for the resting frame.
    #[arg(long)]
    t: Option<f64>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct OutputArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output directory.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    output: OutputArgs,

    /// Frames per second of the sweep.
    #[arg(long, default_value_t = 10)]
    fps: u32,
}

#[derive(Args, Debug)]
struct TimelineArgs {
    /// Project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[arg(long, default_value_t = 10)]
    fps: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Snapshot(args) => cmd_snapshot(args),
        Command::Export(args) => cmd_export(args),
        Command::Timeline(args) => cmd_timeline(args),
    }
}

fn load_project(path: &Path) -> anyhow::Result<Project> {
    Project::from_path(path).with_context(|| format!("load project '{}'", path.display()))
}

fn make_capture(input: &InputArgs, project: &Project) -> anyhow::Result<CpuCapture> {
    let root = match &input.assets {
        Some(dir) => dir.clone(),
        None => input
            .in_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
    };
    let images = ImageStore::prepare(
        &project.assets,
        project.settings.scene.background_image.as_deref(),
        &root,
    );
    let fonts = FontBook::discover(input.fonts.as_deref()).context("load fonts")?;
    Ok(CpuCapture::new(images, fonts))
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir).with_context(|| format!("create '{}'", dir.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let project = load_project(&args.input.in_path)?;
    let mut capture = make_capture(&args.input, &project)?;
    let elapsed = args.t.map_or(Elapsed::Stopped, Elapsed::At);
    let frame = compose(
        elapsed,
        &project.settings,
        &project.assets,
        &project.mappings,
    );
    let raster = capture
        .render(&frame, args.input.scale)
        .context("render frame")?;
    write_file(&args.out, &encode_png(&raster)?)
}

fn cmd_snapshot(args: OutputArgs) -> anyhow::Result<()> {
    let project = load_project(&args.input.in_path)?;
    let mut capture = make_capture(&args.input, &project)?;
    let mut session = RevealSession::new(project);
    let raster = session
        .snapshot(&mut capture, args.input.scale)
        .context("capture snapshot")?;
    write_file(
        &args.out_dir.join(session.snapshot_file_name()),
        &encode_png(&raster)?,
    )
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let input = &args.output.input;
    let project = load_project(&input.in_path)?;
    let mut capture = make_capture(input, &project)?;
    let mut encoder = GifEncoder::default();
    let opts = ExportOpts {
        fps: Fps::new(args.fps, 1)?,
        scale: input.scale,
    };
    let mut session = RevealSession::new(project);
    let artifact = session
        .export_sequence(&mut capture, &mut encoder, opts)
        .context("export sequence")?;
    write_file(&args.output.out_dir.join(&artifact.file_name), &artifact.bytes)
}

fn cmd_timeline(args: TimelineArgs) -> anyhow::Result<()> {
    let project = load_project(&args.in_path)?;
    let fps = Fps::new(args.fps, 1)?;
    let s = &project.settings;
    let end = end_time_ms(s, &project.mappings);
    let chars: Vec<serde_json::Value> = s
        .text
        .chars()
        .enumerate()
        .map(|(i, ch)| {
            serde_json::json!({
                "index": i,
                "ch": ch.to_string(),
                "lockTimeMs": lock_time_ms(i, project.mappings.get(i), &s.motion),
            })
        })
        .collect();
    let out = serde_json::json!({
        "endMs": end,
        "fps": args.fps,
        "frames": sample_times(end, fps)?.len(),
        "chars": chars,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
