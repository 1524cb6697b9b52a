mod replay;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use spot_proto::event::{BoxMsg, FrameEvent, SampleKind};
use spot_render::{overlay, ImageSurface, RenderConfig};
use spot_sched::drive::{drive, StopReason};
use spot_sched::{Sample, ScheduleConfig, Session, TickReport};
use spot_vision::{DetectionPipeline, VisionConfig};

use replay::{RepeatSource, ReplayConfig, ReplayPredictor};

#[derive(Debug, Parser)]
#[command(name = "spot", version, about = "spotlight - detection post-processing and frame scheduling")]
struct Cli {
    #[arg(long)]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the configuration.
    Doctor,
    /// Post-process one recorded prediction tensor (JSON array) and print the best detection.
    Detect {
        #[arg(long)]
        predictions: PathBuf,
    },
    /// Drive a session against recorded tensors (one JSON array per line).
    Replay {
        #[arg(long)]
        predictions: PathBuf,
        /// Stop after this many ticks (default: until Ctrl-C).
        #[arg(long)]
        ticks: Option<u64>,
        /// Write the last rendered canvas as PNG.
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Use this image as the camera frame instead of a grey canvas.
        #[arg(long)]
        still: Option<PathBuf>,
    },
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct Config {
    vision: VisionConfig,
    schedule: ScheduleConfig,
    render: RenderConfig,
    replay: ReplayConfig,
}

fn load_config(path: &Path) -> Result<Config> {
    let s = std::fs::read_to_string(path).context("read config")?;
    toml::from_str(&s).context("parse config toml")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Detect { predictions } => detect(&cfg, &predictions)?,
        Command::Replay { predictions, ticks, snapshot, still } => {
            replay_cmd(&cfg, &predictions, ticks, snapshot.as_deref(), still.as_deref()).await?
        }
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");
    spot_vision::doctor::check_vision(&cfg.vision)?;
    spot_sched::doctor::check_schedule(&cfg.schedule)?;
    anyhow::ensure!(
        cfg.render.canvas_width > 0 && cfg.render.canvas_height > 0,
        "render canvas must be non-empty"
    );
    if cfg.schedule.refresh_ms < cfg.replay.latency_ms / cfg.schedule.process_every_n_frames as u64 {
        warn!("doctor: replay latency exceeds the sampling interval; expect skipped samples");
    }
    info!("doctor: OK");
    println!("doctor: OK");
    Ok(())
}

fn detect(cfg: &Config, predictions: &Path) -> Result<()> {
    let text = std::fs::read_to_string(predictions)
        .with_context(|| format!("read predictions {}", predictions.display()))?;
    let raw: Vec<f32> = serde_json::from_str(&text).context("parse prediction array")?;

    let pipeline = DetectionPipeline::new(cfg.vision.clone());
    let clusters = pipeline.clusters(&raw);
    info!("detect: {} values -> {} clusters", raw.len(), clusters.len());

    let best = pipeline.run(&raw);
    println!("{}", serde_json::to_string(&best)?);
    Ok(())
}

async fn replay_cmd(
    cfg: &Config,
    predictions: &Path,
    ticks: Option<u64>,
    snapshot: Option<&Path>,
    still: Option<&Path>,
) -> Result<()> {
    let predictor = ReplayPredictor::from_file(predictions, Duration::from_millis(cfg.replay.latency_ms))?;
    info!("replay: loaded {} tensors from {}", predictor.tensor_count(), predictions.display());

    let mut source = RepeatSource::new(&cfg.replay, still, ticks)?;
    let mut surface = ImageSurface::new(&cfg.render);
    let mut session = Session::new(cfg.vision.clone(), cfg.schedule.clone(), predictor);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("replay: ctrl-c handler unavailable: {:#}", e);
            std::future::pending::<()>().await;
        }
    };

    let render = cfg.render.clone();
    let reason = drive(&mut session, &mut source, &mut surface, shutdown, |r| {
        let ev = frame_event(r, &render);
        match serde_json::to_string(&ev) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("replay: encode event: {}", e),
        }
    })
    .await;

    let stats = session.stats();
    info!(
        "replay: {} ticks, {} inferences, {} skipped busy, {} failed, {} empty",
        stats.ticks, stats.dispatched, stats.skipped_busy, stats.failed, stats.empty
    );
    if reason == StopReason::Shutdown {
        info!("replay: interrupted");
    }

    if let Some(path) = snapshot {
        surface.save(path)?;
    }
    Ok(())
}

fn frame_event(r: &TickReport, render: &RenderConfig) -> FrameEvent {
    FrameEvent {
        ts_unix_ms: (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64,
        tick: r.tick,
        sample: match r.sample {
            Sample::Dispatched => SampleKind::Inferred,
            Sample::NotSampled => SampleKind::Reused,
            Sample::SkippedBusy => SampleKind::Busy,
        },
        fresh: r.fresh,
        detection: r.rendered.map(|d| BoxMsg {
            x: d.bbox.x,
            y: d.bbox.y,
            w: d.bbox.w,
            h: d.bbox.h,
            confidence: d.confidence,
            class_id: d.class_id,
        }),
        screen: r.rendered.map(|d| {
            let b = overlay(&d, render.canvas_width, render.canvas_height);
            [b.left, b.top, b.width, b.height]
        }),
    }
}
