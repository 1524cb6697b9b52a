use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use spot_sched::{FrameSource, Predictor};
use spot_vision::frame::{Frame, ModelInput};

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Simulated inference latency.
    pub latency_ms: u64,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { latency_ms: 30, frame_width: 640, frame_height: 480 }
    }
}

/// Plays back recorded tensors, one JSON array per line, cycling at the end.
/// A `null` line replays an inference failure.
#[derive(Debug)]
pub struct ReplayPredictor {
    tensors: Vec<Option<Vec<f32>>>,
    cursor: AtomicUsize,
    latency: Duration,
}

impl ReplayPredictor {
    pub fn from_file(path: &Path, latency: Duration) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("read predictions {}", path.display()))?;
        let mut tensors = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() { continue; }
            let t: Option<Vec<f32>> = serde_json::from_str(line)
                .with_context(|| format!("parse {} line {}", path.display(), n + 1))?;
            tensors.push(t);
        }
        anyhow::ensure!(!tensors.is_empty(), "no predictions in {}", path.display());
        Ok(Self { tensors, cursor: AtomicUsize::new(0), latency })
    }

    pub fn tensor_count(&self) -> usize { self.tensors.len() }
}

impl Predictor for ReplayPredictor {
    async fn predict(&self, input: ModelInput) -> Result<Vec<f32>> {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.tensors.len();
        debug!("replay: tensor #{} for {}x{} input", i, input.size, input.size);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.tensors[i].clone().context("replayed inference failure")
    }
}

/// Repeats one frame, either a still image or a flat grey canvas.
pub struct RepeatSource {
    frame: Frame,
    left: Option<u64>,
}

impl RepeatSource {
    pub fn new(cfg: &ReplayConfig, still: Option<&Path>, ticks: Option<u64>) -> Result<Self> {
        let frame = match still {
            Some(p) => {
                let img = image::open(p).with_context(|| format!("open still {}", p.display()))?;
                Frame::from_image(img)?
            }
            None => Frame::solid(cfg.frame_width, cfg.frame_height, [64, 64, 64])?,
        };
        Ok(Self { frame, left: ticks })
    }
}

impl FrameSource for RepeatSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.left.as_mut() {
            Some(0) => Ok(None),
            Some(n) => { *n -= 1; Ok(Some(self.frame.clone())) }
            None => Ok(Some(self.frame.clone())),
        }
    }
}
