#![deny(warnings)]

use anyhow::Context;
use base64::Engine as _;
use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use moodscope_core::catalog::EmotionCatalog;
use moodscope_core::config::{
    resolve_background, resolve_model_path, resolve_optional_path, resolve_plot_bounds,
    AnalysisWindow, DecoderKind, EngineConfig, Env, StdEnv, DEFAULT_ANALYSIS_SECS,
    DEFAULT_SAMPLE_RATE_HZ, ENV_AROUSAL_MODEL, ENV_BACKGROUND, ENV_CATALOG, ENV_VALENCE_MODEL,
};
use moodscope_core::decode::decoder_for;
use moodscope_core::emotion::{EmotionCard, MoodPoint};
use moodscope_core::features::{FeatureExtractor, FeatureVector, FEATURE_NAMES};
use moodscope_core::visualize::{encode_png, render_base_map};
use moodscope_core::{AnalysisOutcome, MoodEngine, MoodReport, NoMoodReason};
use serde::Serialize;
use std::collections::HashSet;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

const AUDIO_EXTENSIONS: [&str; 7] = ["mp3", "wav", "flac", "ogg", "m4a", "aac", "mp4"];
const MIN_BASE_MAP_SIZE: u32 = 200;

#[derive(Parser, Debug)]
#[command(name = "moodscope")]
#[command(about = "Music mood inference: valence/arousal scores, emotions and emotion-space plots")]
struct Cli {
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze audio files and print one JSON line per file.
    Analyze(AnalyzeArgs),
    /// Dump the feature vector of every audio file into a CSV table.
    Extract(ExtractArgs),
    /// Draw the default emotion-space background and print its plot bounds.
    RenderBase(RenderBaseArgs),
}

#[derive(Args, Debug)]
struct WindowArgs {
    /// Seconds analyzed from the start of each clip.
    #[arg(long, default_value_t = DEFAULT_ANALYSIS_SECS)]
    duration_secs: u32,

    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE_HZ)]
    sample_rate: u32,

    /// `symphonia` or `ffmpeg`.
    #[arg(long, default_value = "symphonia")]
    decoder: String,
}

#[derive(Args, Debug)]
struct EngineArgs {
    #[arg(long)]
    valence_model: Option<PathBuf>,

    #[arg(long)]
    arousal_model: Option<PathBuf>,

    #[arg(long)]
    background: Option<PathBuf>,

    /// Plot rectangle inside the background, `left,right,top,bottom` in pixels.
    #[arg(long)]
    plot_bounds: Option<String>,

    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(flatten)]
    window: WindowArgs,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Write `<stem>.png` for every detected mood into this directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Put the base64 PNG into the JSON line.
    #[arg(long)]
    embed_image: bool,

    /// Files analyzed concurrently (defaults to the number of cores).
    #[arg(long)]
    jobs: Option<usize>,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Audio files or directories (searched recursively).
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    #[arg(long)]
    output: PathBuf,

    /// Append to `--output`, skipping song ids it already holds.
    #[arg(long)]
    resume: bool,

    #[command(flatten)]
    window: WindowArgs,
}

#[derive(Args, Debug)]
struct RenderBaseArgs {
    #[arg(long)]
    output: PathBuf,

    #[arg(long, default_value_t = 1200)]
    width: u32,

    #[arg(long, default_value_t = 1200)]
    height: u32,

    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let env = StdEnv;
    match cli.command {
        Command::Analyze(args) => run_analyze(args, &env).await,
        Command::Extract(args) => run_extract(args).await,
        Command::RenderBase(args) => run_render_base(args, &env),
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn build_window(args: &WindowArgs) -> anyhow::Result<(AnalysisWindow, DecoderKind)> {
    let window = AnalysisWindow::new(args.duration_secs, args.sample_rate)?;
    let decoder = args.decoder.parse::<DecoderKind>()?;
    Ok((window, decoder))
}

fn build_engine_config(args: EngineArgs, env: &impl Env) -> anyhow::Result<EngineConfig> {
    let valence_model = resolve_model_path(args.valence_model, "valence", ENV_VALENCE_MODEL, env)?;
    let arousal_model = resolve_model_path(args.arousal_model, "arousal", ENV_AROUSAL_MODEL, env)?;
    let bounds = resolve_plot_bounds(args.plot_bounds, env)?;
    let background = resolve_background(
        resolve_optional_path(args.background, ENV_BACKGROUND, env),
        bounds,
    )?;
    let (window, decoder) = build_window(&args.window)?;

    Ok(EngineConfig {
        valence_model,
        arousal_model,
        background,
        catalog: resolve_optional_path(args.catalog, ENV_CATALOG, env),
        window,
        decoder,
    })
}

fn resolve_jobs(jobs: Option<usize>) -> usize {
    jobs.filter(|&n| n > 0).unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    })
}

#[derive(Serialize, Debug)]
struct ReportLine {
    file: String,
    #[serde(flatten)]
    body: ReportBody,
}

#[derive(Serialize, Debug)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ReportBody {
    Detected {
        mood: MoodPoint,
        emotions: Vec<EmotionCard>,
        #[serde(skip_serializing_if = "Option::is_none")]
        image_path: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        image_png_base64: Option<String>,
    },
    NoMood {
        reason: NoMoodReason,
    },
    Error {
        error: String,
    },
}

async fn run_analyze(args: AnalyzeArgs, env: &impl Env) -> anyhow::Result<()> {
    let config = build_engine_config(args.engine, env)?;
    let engine = MoodEngine::from_config(&config).context("engine startup failed")?;
    if let Some(dir) = &args.out_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("cannot create {}", dir.display()))?;
    }

    let jobs = resolve_jobs(args.jobs);
    tracing::info!(files = args.files.len(), jobs, "analyzing");
    let permits = Arc::new(Semaphore::new(jobs));

    let mut tasks = Vec::with_capacity(args.files.len());
    for path in args.files {
        let engine = engine.clone();
        let permits = Arc::clone(&permits);
        let task_path = path.clone();
        let handle = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            analyze_file(&engine, &task_path).await
        });
        tasks.push((path, handle));
    }

    for (path, handle) in tasks {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(anyhow::anyhow!("analysis task failed: {e}")),
        };
        let body = match outcome {
            Ok(outcome) => {
                report_body(&path, outcome, args.out_dir.as_deref(), args.embed_image).await
            }
            Err(e) => Err(e),
        }
        .unwrap_or_else(|e| {
            tracing::warn!(file = %path.display(), error = %e, "analysis failed");
            ReportBody::Error {
                error: format!("{e:#}"),
            }
        });
        let line = ReportLine {
            file: path.display().to_string(),
            body,
        };
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}

async fn analyze_file(engine: &MoodEngine, path: &Path) -> anyhow::Result<AnalysisOutcome> {
    let audio = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let outcome = engine.analyze(Bytes::from(audio)).await?;
    tracing::info!(
        file = %path.display(),
        detected = matches!(outcome, AnalysisOutcome::Detected(_)),
        "file analyzed"
    );
    Ok(outcome)
}

async fn report_body(
    path: &Path,
    outcome: AnalysisOutcome,
    out_dir: Option<&Path>,
    embed_image: bool,
) -> anyhow::Result<ReportBody> {
    let MoodReport {
        mood,
        emotions,
        image_png,
    } = match outcome {
        AnalysisOutcome::Detected(report) => report,
        AnalysisOutcome::NoMood(reason) => return Ok(ReportBody::NoMood { reason }),
    };

    let image_path = match out_dir {
        Some(dir) => {
            let target = dir.join(format!("{}.png", file_stem(path)));
            tokio::fs::write(&target, &image_png)
                .await
                .with_context(|| format!("cannot write {}", target.display()))?;
            Some(target.display().to_string())
        }
        None => None,
    };
    let image_png_base64 =
        embed_image.then(|| base64::engine::general_purpose::STANDARD.encode(&image_png));

    Ok(ReportBody::Detected {
        mood,
        emotions,
        image_path,
        image_png_base64,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Explicit files are taken as-is; directories contribute their audio files
/// in file-name order.
fn collect_audio_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        for entry in WalkDir::new(root).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() && is_audio_file(entry.path()) => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(root = %root.display(), error = %e, "skipping entry"),
            }
        }
    }
    files
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

fn csv_header() -> String {
    std::iter::once("song_id")
        .chain(FEATURE_NAMES.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_row(song_id: &str, features: &FeatureVector) -> String {
    let mut row = csv_field(song_id);
    for value in features.as_slice() {
        row.push(',');
        row.push_str(&value.to_string());
    }
    row
}

/// First column of a CSV line, unquoted.
fn first_csv_field(line: &str) -> String {
    let Some(rest) = line.strip_prefix('"') else {
        return line.split(',').next().unwrap_or_default().to_owned();
    };
    let mut field = String::new();
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                field.push('"');
                chars.next();
            } else {
                break;
            }
        } else {
            field.push(c);
        }
    }
    field
}

/// Song ids already present in an existing feature table.
fn parse_done_ids(csv: &str) -> HashSet<String> {
    csv.lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(first_csv_field)
        .collect()
}

async fn run_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let (window, kind) = build_window(&args.window)?;
    let decoder = decoder_for(kind)
        .with_context(|| format!("decoder {kind:?} is not available in this build"))?;
    let extractor = Arc::new(FeatureExtractor::new(window.sample_rate));

    let existing = if args.resume && args.output.exists() {
        std::fs::read_to_string(&args.output)
            .with_context(|| format!("cannot read {}", args.output.display()))?
    } else {
        String::new()
    };
    let done = parse_done_ids(&existing);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(args.resume)
        .truncate(!args.resume)
        .open(&args.output)
        .with_context(|| format!("cannot open {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);
    if existing.trim().is_empty() {
        writeln!(writer, "{}", csv_header())?;
        writer.flush()?;
    }

    let files = collect_audio_files(&args.paths);
    tracing::info!(files = files.len(), already_done = done.len(), "extracting features");

    let (mut written, mut skipped, mut failed) = (0usize, 0usize, 0usize);
    for path in files {
        let song_id = file_stem(&path);
        if done.contains(&song_id) {
            skipped += 1;
            continue;
        }
        match extract_file(decoder.as_ref(), &extractor, window, &path).await {
            Ok(features) => {
                writeln!(writer, "{}", csv_row(&song_id, &features))?;
                writer.flush()?;
                written += 1;
                tracing::debug!(song_id = %song_id, "features written");
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(file = %path.display(), error = %format!("{e:#}"), "skipping clip");
            }
        }
    }

    tracing::info!(written, skipped, failed, output = %args.output.display(), "extraction done");
    Ok(())
}

async fn extract_file(
    decoder: &dyn moodscope_core::decode::AudioDecoder,
    extractor: &Arc<FeatureExtractor>,
    window: AnalysisWindow,
    path: &Path,
) -> anyhow::Result<FeatureVector> {
    let audio = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let clip = decoder.decode(Bytes::from(audio), window).await?;
    let extractor = Arc::clone(extractor);
    let features = tokio::task::spawn_blocking(move || extractor.extract(&clip.samples))
        .await
        .context("feature worker failed")??;
    Ok(features)
}

fn run_render_base(args: RenderBaseArgs, env: &impl Env) -> anyhow::Result<()> {
    if args.width < MIN_BASE_MAP_SIZE || args.height < MIN_BASE_MAP_SIZE {
        anyhow::bail!(
            "base map must be at least {MIN_BASE_MAP_SIZE}x{MIN_BASE_MAP_SIZE} pixels, got {}x{}",
            args.width,
            args.height
        );
    }
    let catalog = match resolve_optional_path(args.catalog, ENV_CATALOG, env) {
        Some(path) => EmotionCatalog::from_json_path(&path)?,
        None => EmotionCatalog::builtin(),
    };

    let map = render_base_map(&catalog, args.width, args.height);
    let png = encode_png(&map.image)?;
    std::fs::write(&args.output, png)
        .with_context(|| format!("cannot write {}", args.output.display()))?;

    let b = map.bounds;
    tracing::info!(output = %args.output.display(), "base map written");
    println!("{},{},{},{}", b.left, b.right, b.top, b.bottom);
    Ok(())
}
