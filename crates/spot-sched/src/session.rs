use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use spot_render::{overlay, Surface};
use spot_vision::frame::{prepare_input, Frame};
use spot_vision::smoother::TemporalSmoother;
use spot_vision::{Detection, DetectionPipeline, VisionConfig};

use crate::cadence::Cadence;
use crate::inference::{Outcome, Poll, Predictor, SingleFlight};
use crate::ScheduleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// Off-cadence tick; the cached detection is reused.
    NotSampled,
    /// Inference launched for this tick's frame.
    Dispatched,
    /// On-cadence, but the previous inference is still running.
    SkippedBusy,
}

#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub sample: Sample,
    /// A finished inference was applied at the start of this tick.
    pub fresh: bool,
    pub rendered: Option<Detection>,
}

#[derive(Debug, Clone)]
pub enum TickOutcome {
    Idle,
    Active(TickReport),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub ticks: u64,
    pub dispatched: u64,
    pub skipped_busy: u64,
    pub failed: u64,
    pub empty: u64,
    pub stale_dropped: u64,
}

/// One camera session: cadence, single-flight inference, cached detection and
/// smoothing history. Nothing is shared between sessions.
pub struct Session<P: Predictor> {
    cfg: ScheduleConfig,
    pipeline: DetectionPipeline,
    predictor: Arc<P>,

    state: State,
    cadence: Cadence,
    flight: SingleFlight,
    generation: u64,

    last: Option<Detection>,
    smoother: TemporalSmoother,
    failures: u32,
    stats: SessionStats,
}

impl<P: Predictor> Session<P> {
    pub fn new(vision: VisionConfig, cfg: ScheduleConfig, predictor: P) -> Self {
        Self {
            cadence: Cadence::new(cfg.process_every_n_frames),
            smoother: TemporalSmoother::new(cfg.history_capacity),
            pipeline: DetectionPipeline::new(vision),
            predictor: Arc::new(predictor),
            state: State::Idle,
            flight: SingleFlight::default(),
            generation: 0,
            last: None,
            failures: 0,
            stats: SessionStats::default(),
            cfg,
        }
    }

    pub fn state(&self) -> State { self.state }
    pub fn last_detection(&self) -> Option<&Detection> { self.last.as_ref() }
    pub fn stats(&self) -> SessionStats { self.stats }
    pub fn is_busy(&self) -> bool { self.flight.is_busy() }
    pub fn predictor(&self) -> &P { &self.predictor }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_millis(self.cfg.refresh_ms.max(1))
    }

    pub fn start(&mut self) {
        if self.state == State::Active { return; }
        self.state = State::Active;
        info!(
            "sched: session started (gen={}, every_n={}, history={})",
            self.generation, self.cadence.every_n(), self.cfg.history_capacity
        );
    }

    /// Back to idle: cancels any in-flight inference and drops cached state.
    pub fn stop(&mut self) {
        if self.state == State::Idle { return; }
        self.state = State::Idle;
        self.generation += 1;
        self.flight.cancel();
        self.cadence.reset();
        self.clear_cached();
        self.failures = 0;
        info!("sched: session stopped after {} ticks", self.stats.ticks);
    }

    /// One display refresh: draw the frame, maybe launch inference, draw the
    /// current detection.
    pub fn tick<S: Surface>(&mut self, frame: &Frame, surface: &mut S) -> TickOutcome {
        if self.state == State::Idle { return TickOutcome::Idle; }

        let fresh = match self.flight.poll() {
            Poll::Ready(outcome) => self.apply(outcome),
            Poll::Idle | Poll::Pending => false,
        };

        surface.draw_frame(frame);

        let tick = self.cadence.frame_counter();
        let sample = if !self.cadence.tick_should_infer() {
            Sample::NotSampled
        } else if self.flight.is_busy() {
            self.stats.skipped_busy += 1;
            Sample::SkippedBusy
        } else {
            self.dispatch(frame);
            Sample::Dispatched
        };
        debug!("sched: tick={} sample={:?} fresh={}", tick, sample, fresh);

        if let Some(d) = self.last.as_ref() {
            let (w, h) = surface.canvas_size();
            surface.draw_box(&overlay(d, w, h));
        }
        surface.present();
        self.stats.ticks += 1;

        TickOutcome::Active(TickReport { tick, sample, fresh, rendered: self.last })
    }

    /// Waits for the outstanding inference, if any, and applies it.
    pub async fn settle(&mut self) -> bool {
        match self.flight.wait().await {
            Some(outcome) => self.apply(outcome),
            None => false,
        }
    }

    fn dispatch(&mut self, frame: &Frame) {
        let predictor = Arc::clone(&self.predictor);
        let frame = frame.clone();
        let size = self.pipeline.config().model_input_size;
        self.flight.launch(self.generation, async move {
            let input = prepare_input(&frame, size)?;
            predictor.predict(input).await
        });
        self.stats.dispatched += 1;
    }

    fn apply(&mut self, (generation, res): Outcome) -> bool {
        if generation != self.generation || self.state == State::Idle {
            self.stats.stale_dropped += 1;
            debug!("sched: dropping result from gen={} (now gen={})", generation, self.generation);
            return false;
        }

        let raw = match res {
            Ok(raw) => raw,
            Err(e) => {
                self.failures += 1;
                self.stats.failed += 1;
                warn!("sched: inference failed ({} in a row): {:#}", self.failures, e);
                if self.failures > self.cfg.failure_grace_ticks {
                    self.clear_cached();
                }
                return true;
            }
        };
        self.failures = 0;

        match self.pipeline.run(&raw) {
            Some(d) => self.last = Some(self.smoother.update(d)),
            None => {
                self.stats.empty += 1;
                self.clear_cached();
            }
        }
        true
    }

    fn clear_cached(&mut self) {
        self.last = None;
        self.smoother.reset();
    }
}
