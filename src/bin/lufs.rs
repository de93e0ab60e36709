use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lufs",
    version,
    about = "Deterministic artwork, canvas and catalog code from audio"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate artwork, canvas and catalog record for an audio file.
    Generate(GenerateArgs),
    /// Print the content fingerprint of a file.
    Fingerprint(FingerprintArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Input audio file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Spectrogram saturation in [0, 2]; invalid values fall back to 1.0.
    #[arg(long)]
    saturation: Option<String>,

    /// Output root (default: `id_<base>_<ext>_sat<S>` next to the input).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Canvas frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Canvas loop length in seconds.
    #[arg(long)]
    duration: Option<u32>,

    /// Skip MP4 output even when ffmpeg is available.
    #[arg(long, default_value_t = false)]
    no_video: bool,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Abort the run once this many seconds have passed.
    #[arg(long)]
    timeout_secs: Option<f64>,

    /// JSON config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the run report as JSON on stdout.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct FingerprintArgs {
    /// Input file.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Fingerprint(args) => cmd_fingerprint(args),
    }
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => lufs::PipelineConfig::from_json_file(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => lufs::PipelineConfig::default(),
    };

    if let Some(text) = &args.saturation {
        let (saturation, warning) = lufs::Saturation::parse_lenient(text);
        if let Some(w) = warning {
            tracing::warn!("{w}");
        }
        config.saturation = saturation;
    }
    if let Some(out) = args.out {
        config.out_dir = Some(out);
    }
    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    if let Some(duration) = args.duration {
        config.duration_secs = duration;
    }
    if args.no_video {
        config.formats.video = false;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    if args.timeout_secs.is_some() {
        config.timeout_secs = args.timeout_secs;
    }

    let pipeline = lufs::Pipeline::new(config).context("invalid configuration")?;
    let report = pipeline
        .run(&args.in_path)
        .with_context(|| format!("generate from '{}'", args.in_path.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("serialize run report")?;
        println!("{json}");
        return Ok(());
    }

    let a = &report.artifacts;
    println!("catalog code: {}", report.catalog.catalog_code);
    println!("hash:         {}", report.fingerprint.hash);
    println!("artwork:      {}", a.artwork.display());
    println!("canvas png:   {}", a.canvas_static.display());
    println!("canvas gif:   {}", a.canvas_gif.display());
    match &a.canvas_mp4 {
        Some(p) => println!("canvas mp4:   {}", p.display()),
        None => println!("canvas mp4:   (skipped)"),
    }
    println!("catalog:      {}", a.catalog.display());
    for w in &report.warnings {
        println!("warning: {w}");
    }
    Ok(())
}

fn cmd_fingerprint(args: FingerprintArgs) -> anyhow::Result<()> {
    let fp = lufs::Fingerprint::from_path(&args.in_path)
        .with_context(|| format!("fingerprint '{}'", args.in_path.display()))?;
    println!("hash: {}", fp.hash);
    println!("seed: {:#018x}", fp.seed);
    println!("catalog_code: {}", fp.catalog_code);
    Ok(())
}
