use std::future::Future;

use anyhow::Context;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use spot_render::Surface;

use crate::{FrameSource, Predictor, Session, TickOutcome, TickReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    SourceExhausted,
}

/// Runs the session at its refresh period until `shutdown` resolves or the
/// source runs dry. The session is started on entry and stopped on exit.
/// A frame that fails to read is skipped; only `Ok(None)` ends the stream.
///
/// When the source ends the last in-flight inference is allowed to land;
/// on shutdown it is discarded.
pub async fn drive<P, Src, Surf, Sd>(
    session: &mut Session<P>,
    source: &mut Src,
    surface: &mut Surf,
    shutdown: Sd,
    mut on_tick: impl FnMut(&TickReport),
) -> StopReason
where
    P: Predictor,
    Src: FrameSource,
    Surf: Surface,
    Sd: Future<Output = ()>,
{
    let mut refresh = tokio::time::interval(session.refresh_period());
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    session.start();
    let mut frame_errors = 0u64;
    let reason = loop {
        tokio::select! {
            _ = &mut shutdown => break StopReason::Shutdown,
            _ = refresh.tick() => {
                let frame = match source.next_frame().context("read frame") {
                    Ok(Some(f)) => f,
                    Ok(None) => break StopReason::SourceExhausted,
                    Err(e) => {
                        frame_errors += 1;
                        warn!("sched: frame read failed: {:#}", e);
                        continue;
                    }
                };
                if let TickOutcome::Active(report) = session.tick(&frame, surface) {
                    on_tick(&report);
                }
            }
        }
    };

    if reason == StopReason::SourceExhausted && session.settle().await {
        info!("sched: applied final inference before stopping");
    }
    session.stop();
    info!(
        "sched: drive loop ended ({:?}) frame_errors={} stats={:?}",
        reason, frame_errors, session.stats()
    );
    reason
}
